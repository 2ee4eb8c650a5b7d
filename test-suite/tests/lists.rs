// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use xml_mapper::de::StackElement;
use xml_mapper::from_str;
use xml_mapper_derive::Deserialize;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Default, Deserialize, Eq, PartialEq)]
struct Child {
    x: i32,
}

#[derive(Debug, Default, Deserialize, Eq, PartialEq)]
struct Parent {
    children: Vec<Child>,
}

#[derive(Debug, Default, Deserialize, Eq, PartialEq)]
struct InnerItem {
    first: String,
    second: String,
}

/// A list of `InnerItem`s which also has fields of its own.
#[derive(Debug, Default, Deserialize, Eq, PartialEq)]
struct MyItemsList {
    name: String,
    count: i32,

    #[xml_mapper(items)]
    items: Vec<InnerItem>,
}

#[derive(Debug, Default, Deserialize, Eq, PartialEq)]
struct ItemsHolder {
    title: String,
    my_items_list: MyItemsList,
}

#[derive(Debug, Default, Deserialize, Eq, PartialEq)]
struct Strings {
    names: Vec<String>,
    numbers: Vec<i32>,
}

fn children(xs: &[i32]) -> Vec<Child> {
    xs.iter().map(|&x| Child { x }).collect()
}

fn item(first: &str, second: &str) -> InnerItem {
    InnerItem {
        first: first.to_owned(),
        second: second.to_owned(),
    }
}

#[test]
fn inline_list() {
    init();
    let p: Parent = from_str(r#"<Parent><Child x="1"/><Child x="2"/></Parent>"#).unwrap();
    assert_eq!(p.children, children(&[1, 2]));
}

#[test]
fn inline_list_document_order() {
    init();
    let p: Parent = from_str(
        r#"<Parent><Child X="3"/><Other/><Child X="1"/><Child X="2"/></Parent>"#,
    )
    .unwrap();
    assert_eq!(p.children, children(&[3, 1, 2]));
}

#[test]
fn inline_list_beneath_wrapper() {
    init();
    let p: Parent = from_str(
        r#"<Parent><Group><Child X="1"/><Child X="2"/></Group></Parent>"#,
    )
    .unwrap();
    assert_eq!(p.children, children(&[1, 2]));
}

#[test]
fn container_list() {
    init();
    let p: Parent = from_str(
        r#"
        <Parent>
            <Children>
                <Child X="1"/>
                <Child X="2"/>
            </Children>
        </Parent>
        "#,
    )
    .unwrap();
    assert_eq!(p.children, children(&[1, 2]));
}

#[test]
fn empty_list() {
    init();
    let p: Parent = from_str("<Parent/>").unwrap();
    assert!(p.children.is_empty());
}

#[test]
fn primitive_lists() {
    init();
    let s: Strings = from_str(
        r#"
        <Strings>
            <String>a</String>
            <String>b</String>
            <Numbers><n>1</n><n>2</n><n>3</n></Numbers>
        </Strings>
        "#,
    )
    .unwrap();
    assert_eq!(s.names, ["a", "b"]);
    assert_eq!(s.numbers, [1, 2, 3]);
}

#[test]
fn top_level_list() {
    init();
    let items: Vec<InnerItem> = from_str(
        r#"<InnerItems><InnerItem First="a" Second="b"/><InnerItem First="c" Second="d"/></InnerItems>"#,
    )
    .unwrap();
    assert_eq!(items, [item("a", "b"), item("c", "d")]);

    // Item names are matched with the same spellings as field names.
    let items: Vec<InnerItem> =
        from_str(r#"<items><innerItem first="a"/><innerItem first="c"/></items>"#).unwrap();
    assert_eq!(items, [item("a", ""), item("c", "")]);

    let items: Vec<InnerItem> =
        from_str(r#"<items><inner_item first="a"/></items>"#).unwrap();
    assert_eq!(items, [item("a", "")]);
}

#[test]
fn top_level_list_derived() {
    init();
    let list: MyItemsList = from_str(
        r#"
        <MyItemsList Name="list" Count="2">
            <InnerItem First="a" Second="b"/>
            <InnerItem First="c" Second="d"/>
        </MyItemsList>
        "#,
    )
    .unwrap();
    assert_eq!(
        list,
        MyItemsList {
            name: "list".to_owned(),
            count: 2,
            items: vec![item("a", "b"), item("c", "d")],
        }
    );
}

#[test]
fn nested_list_derived() {
    init();
    let holder: ItemsHolder = from_str(
        r#"
        <ItemsHolder Title="t">
            <MyItemsList Name="inner" Count="1">
                <InnerItem First="a" Second="b"/>
            </MyItemsList>
        </ItemsHolder>
        "#,
    )
    .unwrap();
    assert_eq!(
        holder,
        ItemsHolder {
            title: "t".to_owned(),
            my_items_list: MyItemsList {
                name: "inner".to_owned(),
                count: 1,
                items: vec![item("a", "b")],
            },
        }
    );
}

#[test]
fn nested_list_derived_camel_case_container() {
    init();
    let holder: ItemsHolder = from_str(
        r#"<ItemsHolder Title="t"><myItemsList Name="inner" Count="1"><InnerItem First="a"/></myItemsList></ItemsHolder>"#,
    )
    .unwrap();
    assert_eq!(
        holder.my_items_list,
        MyItemsList {
            name: "inner".to_owned(),
            count: 1,
            items: vec![item("a", "")],
        }
    );
}

#[test]
fn item_error_stack() {
    init();
    let e = from_str::<Vec<Child>>(r#"<Children><Child X="1"/><Child X="z"/></Children>"#)
        .unwrap_err();
    assert!(e.is_conversion());
    assert_eq!(
        e.stack(),
        &[
            StackElement {
                name: "Children".to_owned(),
                index: None,
            },
            StackElement {
                name: "Child".to_owned(),
                index: Some(1),
            },
            StackElement {
                name: "X".to_owned(),
                index: None,
            },
        ]
    );
    assert!(e.to_string().contains("   1: Child[1]\n"), "{}", e);
}

#[test]
fn primitive_item_error_names_field() {
    init();
    let e = from_str::<Strings>("<Strings><Numbers><n>1</n><n>x</n></Numbers></Strings>")
        .unwrap_err();
    assert!(e.is_conversion());
    assert_eq!(e.field(), Some("Numbers"));
    assert_eq!(e.text(), Some("x"));
    assert_eq!(
        e.stack().last(),
        Some(&StackElement {
            name: "n".to_owned(),
            index: Some(1),
        })
    );
}
