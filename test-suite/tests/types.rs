// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use uuid::Uuid;
use xml_mapper::de::{ErrorKind, StackElement, Uri};
use xml_mapper::{from_str, Culture, DateOrder, Deserializer, MappingConfig};
use xml_mapper_derive::{Deserialize, ParseText};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Copy, Clone, Debug, Default, Eq, ParseText, PartialEq)]
enum MyEnum {
    #[default]
    One,
    Two,
    Three,

    #[xml_mapper(rename = "first-choice")]
    FirstChoice,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
struct ItemWithTypes {
    integer: i32,
    long: i64,
    flag: bool,
    nullable_bool: Option<bool>,
    empty_nullable_bool: Option<bool>,
    missing_nullable_bool: Option<bool>,
    my_enum: MyEnum,
    nullable_enum: Option<MyEnum>,
    double: f64,
    decimal: Decimal,
    uri: Uri,
    date: NaiveDateTime,
    date_offset: DateTime<FixedOffset>,
    guid: Uuid,
    time_span: Duration,
    initial: char,
}

fn expected() -> ItemWithTypes {
    ItemWithTypes {
        integer: 1,
        long: 3000,
        flag: true,
        nullable_bool: Some(false),
        empty_nullable_bool: None,
        missing_nullable_bool: None,
        my_enum: MyEnum::Two,
        nullable_enum: Some(MyEnum::Three),
        double: 1.1,
        decimal: Decimal::new(49, 1),
        uri: Uri::Absolute("http://google.com/".parse().unwrap()),
        date: NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap(),
        date_offset: DateTime::parse_from_rfc3339("2021-03-04T05:06:07+02:00").unwrap(),
        guid: Uuid::parse_str("936da01f-9abd-4d9d-80c7-02af85c822a8").unwrap(),
        time_span: Duration::minutes(90),
        initial: 'x',
    }
}

#[test]
fn attributes() {
    init();
    let item: ItemWithTypes = from_str(
        r#"
        <ItemWithTypes
            Integer="1"
            Long="3000"
            Flag="true"
            NullableBool="false"
            EmptyNullableBool=""
            MyEnum="two"
            NullableEnum="THREE"
            Double="1.1"
            Decimal="4.9"
            Uri="http://google.com"
            Date="2021-03-04T05:06:07"
            DateOffset="2021-03-04T05:06:07+02:00"
            Guid="936DA01F-9ABD-4D9D-80C7-02AF85C822A8"
            TimeSpan="PT1H30M"
            Initial="x"/>
        "#,
    )
    .unwrap();
    assert_eq!(item, expected());
    assert!(item.uri.is_absolute());
}

#[test]
fn elements() {
    init();
    let item: ItemWithTypes = from_str(
        r#"
        <ItemWithTypes>
            <Integer> 1 </Integer>
            <Long>3000</Long>
            <Flag>TRUE</Flag>
            <NullableBool>0</NullableBool>
            <MyEnum>Two</MyEnum>
            <NullableEnum> three </NullableEnum>
            <Double>1.1</Double>
            <Decimal>4.9</Decimal>
            <Uri>http://google.com</Uri>
            <Date>2021-03-04 05:06:07</Date>
            <DateOffset>2021-03-04T05:06:07+02:00</DateOffset>
            <Guid>936da01f-9abd-4d9d-80c7-02af85c822a8</Guid>
            <TimeSpan>PT90M</TimeSpan>
            <Initial>x</Initial>
        </ItemWithTypes>
        "#,
    )
    .unwrap();
    assert_eq!(item, expected());
}

#[test]
fn defaults_when_absent() {
    init();
    let item: ItemWithTypes = from_str("<ItemWithTypes/>").unwrap();
    assert_eq!(item, ItemWithTypes::default());
    assert_eq!(item.my_enum, MyEnum::One);
    assert_eq!(item.nullable_bool, None);
}

#[test]
fn enum_rename() {
    init();
    let item: ItemWithTypes = from_str(r#"<i MyEnum="First-Choice"/>"#).unwrap();
    assert_eq!(item.my_enum, MyEnum::FirstChoice);
}

#[test]
fn relative_uri() {
    init();
    let item: ItemWithTypes = from_str(r#"<i Uri="images/logo.png"/>"#).unwrap();
    assert_eq!(item.uri, Uri::Relative("images/logo.png".to_owned()));
    assert!(!item.uri.is_absolute());
}

#[test]
fn offsetless_date_offset_is_utc() {
    init();
    let item: ItemWithTypes = from_str(r#"<i DateOffset="2021-03-04T05:06:07"/>"#).unwrap();
    assert_eq!(
        item.date_offset,
        DateTime::parse_from_rfc3339("2021-03-04T05:06:07Z").unwrap()
    );
}

#[test]
fn empty_guid_is_nil() {
    init();
    let item: ItemWithTypes = from_str(r#"<i Guid=""/>"#).unwrap();
    assert_eq!(item.guid, Uuid::nil());
}

#[test]
fn bad_enum() {
    init();
    let e = from_str::<ItemWithTypes>(r#"<i MyEnum="Four"/>"#).unwrap_err();
    assert!(e.is_conversion());
    assert_eq!(e.field(), Some("MyEnum"));
    assert_eq!(e.text(), Some("Four"));
    let msg = e.to_string();
    assert!(msg.contains("no such MyEnum variant"), "{}", msg);
}

#[test]
fn bad_values() {
    init();
    for (xml, field) in [
        (r#"<i Integer="abc"/>"#, "Integer"),
        (r#"<i Long="1.5"/>"#, "Long"),
        (r#"<i Long="3,000"/>"#, "Long"),
        (r#"<i Flag="yes"/>"#, "Flag"),
        (r#"<i NullableBool="maybe"/>"#, "NullableBool"),
        (r#"<i Double="x"/>"#, "Double"),
        (r#"<i Decimal="4..9"/>"#, "Decimal"),
        (r#"<i Date="not a date"/>"#, "Date"),
        (r#"<i DateOffset="yesterday"/>"#, "DateOffset"),
        (r#"<i Guid="1234"/>"#, "Guid"),
        (r#"<i TimeSpan="1:30"/>"#, "TimeSpan"),
        (r#"<i Initial="xy"/>"#, "Initial"),
    ] {
        let e = from_str::<ItemWithTypes>(xml).unwrap_err();
        assert_matches!(e.kind(), ErrorKind::Conversion { .. }, "{}", xml);
        assert_eq!(e.field(), Some(field), "{}", xml);
    }
}

#[derive(Debug, Default, Deserialize, PartialEq)]
struct Numbers {
    integer: i32,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
struct Holder {
    inner: Numbers,
}

#[test]
fn error_stack() {
    init();
    let e = from_str::<Holder>(r#"<Outer><Inner Integer="abc"/></Outer>"#).unwrap_err();
    let names: Vec<&str> = e.stack().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Outer", "Inner", "Integer"]);
    assert_eq!(
        e.stack()[2],
        StackElement {
            name: "Integer".to_owned(),
            index: None,
        }
    );
    let msg = e.to_string();
    assert!(msg.contains("   2: Integer\n   1: Inner\n   0: Outer\n"), "{}", msg);
}

#[test]
fn culture() {
    init();
    let d = Deserializer::with_config(MappingConfig::new().with_culture(Culture::new(
        ',',
        '.',
        DateOrder::DayMonthYear,
        '.',
    )));
    let item: ItemWithTypes = d
        .deserialize(Some(r#"<i Double="1.234,5" Decimal="4,9" Date="19.10.2026"/>"#))
        .unwrap();
    assert_eq!(item.double, 1234.5);
    assert_eq!(item.decimal, Decimal::new(49, 1));
    assert_eq!(
        item.date,
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    );
}

#[test]
fn invariant_culture_dates() {
    init();
    let item: ItemWithTypes = from_str(r#"<i Date="10/19/2026 13:45:00"/>"#).unwrap();
    assert_eq!(
        item.date,
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap()
    );
}

#[test]
fn date_format() {
    init();
    let d = Deserializer::with_config(MappingConfig::new().with_date_format("%d/%m/%Y %H.%M"));
    let item: ItemWithTypes = d
        .deserialize(Some(r#"<i Date="19/10/2026 13.45"/>"#))
        .unwrap();
    assert_eq!(
        item.date,
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap()
    );

    // The general formats aren't consulted when a format is configured.
    let e = d
        .deserialize::<ItemWithTypes>(Some(r#"<i Date="2021-03-04T05:06:07"/>"#))
        .unwrap_err();
    assert_eq!(e.field(), Some("Date"));

    let d = Deserializer::with_config(MappingConfig::new().with_date_format("%Y%m%d"));
    let item: ItemWithTypes = d.deserialize(Some(r#"<i Date="20261019"/>"#)).unwrap();
    assert_eq!(item.date.date(), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
}
