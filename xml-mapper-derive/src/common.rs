// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::cell::RefCell;

use heck::AsPascalCase;
use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use syn::{ext::IdentExt, DeriveInput, Fields, Lit, LitStr, Meta, MetaNameValue, NestedMeta};

// See serde/serde_derive/src/internals/attr.rs and yaserde_derive/src/common/field.rs

/// Accumulates compiler errors. Similar to `serde_derive`'s `Ctxt`.
pub(crate) struct Errors(RefCell<Option<Vec<syn::Error>>>);

impl Errors {
    pub(crate) fn new() -> Self {
        Errors(RefCell::new(Some(Vec::new())))
    }

    pub(crate) fn push(&self, err: syn::Error) {
        self.0.borrow_mut().as_mut().unwrap().push(err);
    }

    pub(crate) fn take_compile_errors(&self) -> TokenStream {
        let errors = self
            .0
            .borrow_mut()
            .take()
            .unwrap()
            .into_iter()
            .map(syn::Error::into_compile_error);
        quote! {
            #(#errors)*
        }
    }
}

impl Drop for Errors {
    fn drop(&mut self) {
        if self.0.borrow().is_some() {
            panic!("Errors dropped without take_compile_errors call");
        }
    }
}

/// Rejects generic types, which can't be described by a single static descriptor.
pub(crate) fn check_no_generics(errors: &Errors, input: &DeriveInput) -> Result<(), ()> {
    if input.generics.params.is_empty() {
        return Ok(());
    }
    errors.push(syn::Error::new_spanned(
        &input.generics,
        "xml_mapper derives don't support generic types",
    ));
    Err(())
}

/// Common description of a unit-only `enum` parsed from text by variant name.
pub(crate) struct TextEnum<'a> {
    pub(crate) input: &'a DeriveInput,

    /// The name reported in errors and used for type-name lookups.
    pub(crate) name: String,
    pub(crate) variants: Vec<TextVariant<'a>>,
}

pub(crate) struct TextVariant<'a> {
    pub(crate) ident: &'a syn::Ident,

    /// The variant's text, lowercased for case-insensitive matching.
    pub(crate) lowercase_text: String,
}

impl<'a> TextEnum<'a> {
    pub(crate) fn new(errors: &Errors, input: &'a DeriveInput, enum_: &'a syn::DataEnum) -> Self {
        let name = TypeAttr::new(errors, input).name;
        let mut variants: Vec<TextVariant<'a>> = Vec::with_capacity(enum_.variants.len());
        for v in &enum_.variants {
            let mut text = v.ident.unraw().to_string();
            for item in get_meta_items(errors, &v.attrs) {
                match &item {
                    NestedMeta::Meta(Meta::NameValue(nv @ MetaNameValue { path, .. }))
                        if path.is_ident("rename") =>
                    {
                        with_lit_str(errors, nv, &mut |l| text = l.value());
                    }
                    i => errors.push(syn::Error::new_spanned(i, "item not understood")),
                }
            }
            if !matches!(v.fields, Fields::Unit) {
                errors.push(syn::Error::new_spanned(
                    &v.ident,
                    "text enum variants should have no fields",
                ));
                continue;
            }
            let lowercase_text = text.to_lowercase();
            if let Some(prev) = variants.iter().find(|p| p.lowercase_text == lowercase_text) {
                errors.push(syn::Error::new_spanned(
                    &v.ident,
                    format!(
                        "variant text {:?} matches {} when compared case-insensitively",
                        text, prev.ident
                    ),
                ));
                continue;
            }
            variants.push(TextVariant {
                ident: &v.ident,
                lowercase_text,
            });
        }
        TextEnum {
            input,
            name,
            variants,
        }
    }
}

/// Parsed top-level attributes for a type.
pub(crate) struct TypeAttr {
    /// The type's name: its identifier, or the `rename` value.
    pub(crate) name: String,
}

impl TypeAttr {
    pub(crate) fn new(errors: &Errors, input: &DeriveInput) -> Self {
        let mut name = input.ident.unraw().to_string();
        for item in get_meta_items(errors, &input.attrs) {
            match &item {
                NestedMeta::Meta(Meta::NameValue(nv @ MetaNameValue { path, .. }))
                    if path.is_ident("rename") =>
                {
                    with_lit_str(errors, nv, &mut |l| name = l.value());
                }
                i => errors.push(syn::Error::new_spanned(i, "item not understood")),
            }
        }
        TypeAttr { name }
    }
}

/// Common description of a `struct` mapped field-by-field.
pub(crate) struct RecordStruct<'a> {
    pub(crate) input: &'a DeriveInput,
    pub(crate) attr: TypeAttr,
    pub(crate) fields: Vec<RecordField<'a>>,

    /// Index within `fields` of the `#[xml_mapper(items)]` field, if any.
    pub(crate) items_pos: Option<usize>,
}

impl<'a> RecordStruct<'a> {
    pub(crate) fn new(
        errors: &Errors,
        input: &'a DeriveInput,
        struct_: &'a syn::DataStruct,
    ) -> Result<Self, ()> {
        let attr = TypeAttr::new(errors, input);
        let fields: Vec<_> = match struct_.fields {
            Fields::Named(ref fields) => fields
                .named
                .iter()
                .flat_map(|f| RecordField::new(errors, f))
                .collect(),
            _ => {
                errors.push(syn::Error::new_spanned(
                    &input.ident,
                    "#[derive(xml_mapper::Deserialize)] only supports structs with named fields",
                ));
                return Err(());
            }
        };
        let mut items_pos = None;
        for (i, f) in fields.iter().enumerate() {
            if matches!(f.mode, FieldMode::Items) {
                if items_pos.is_some() {
                    errors.push(syn::Error::new_spanned(
                        f.ident,
                        "more than one field marked with #[xml_mapper(items)]",
                    ));
                    return Err(());
                }
                items_pos = Some(i);
            }
        }
        Ok(RecordStruct {
            input,
            attr,
            fields,
            items_pos,
        })
    }

    /// Returns the fields listed in the type's descriptor, in declaration order.
    pub(crate) fn mapped_fields(&self) -> impl Iterator<Item = &RecordField<'a>> {
        self.fields
            .iter()
            .filter(|f| matches!(f.mode, FieldMode::Mapped { .. }))
    }
}

const XML_MAPPER: &str = "xml_mapper";

// Stolen from serde/serde_derive/src/internals/attr.rs.
pub(crate) fn get_meta_items(errors: &Errors, attrs: &[syn::Attribute]) -> Vec<NestedMeta> {
    let mut out = Vec::new();
    for attr in attrs {
        if !attr.path.is_ident(XML_MAPPER) {
            continue;
        }

        match attr.parse_meta() {
            Ok(Meta::List(meta)) => out.extend(meta.nested.into_iter()),
            Ok(other) => errors.push(syn::Error::new_spanned(
                other,
                "expected #[xml_mapper(...)]",
            )),
            Err(err) => errors.push(err),
        }
    }
    out
}

/// Mode for a field within a `RecordStruct`.
#[derive(Clone, Debug)]
pub(crate) enum FieldMode {
    /// Looked up by name.
    Mapped {
        /// The declared name: the PascalCase form of the identifier.
        name: String,

        /// The override name, tried first.
        rename: Option<String>,
    },

    /// Never written.
    Skip,

    /// A nested record whose fields are mapped against the same element.
    Flatten,

    /// The sequence of a list-derived record.
    Items,
}

/// Field within a `RecordStruct`.
pub(crate) struct RecordField<'a> {
    pub(crate) inner: &'a syn::Field,
    pub(crate) ident: &'a syn::Ident,
    pub(crate) mode: FieldMode,
}

impl<'a> RecordField<'a> {
    /// For use by `RecordStruct::new` only.
    fn new(errors: &Errors, inner: &'a syn::Field) -> Result<Self, ()> {
        let ident = inner.ident.as_ref().expect("struct fields should be named");
        let mut flatten = false;
        let mut items = false;
        let mut skip = false;
        let mut rename = None;
        for item in get_meta_items(errors, &inner.attrs) {
            match &item {
                NestedMeta::Meta(Meta::Path(p)) if p.is_ident("flatten") => flatten = true,
                NestedMeta::Meta(Meta::Path(p)) if p.is_ident("items") => items = true,
                NestedMeta::Meta(Meta::Path(p)) if p.is_ident("skip") => skip = true,
                NestedMeta::Meta(Meta::NameValue(nv @ MetaNameValue { path, .. }))
                    if path.is_ident("rename") =>
                {
                    with_lit_str(errors, nv, &mut |l| rename = Some(l.value()));
                }
                i => errors.push(syn::Error::new_spanned(i, "item not understood")),
            }
        }
        if rename.is_some() && (flatten || items || skip) {
            errors.push(syn::Error::new_spanned(
                inner,
                "rename only applies to mapped fields",
            ));
            return Err(());
        }
        let mode = match (flatten, items, skip) {
            (false, false, false) => FieldMode::Mapped {
                name: AsPascalCase(ident.unraw().to_string()).to_string(),
                rename,
            },
            (true, false, false) => FieldMode::Flatten,
            (false, true, false) => FieldMode::Items,
            (false, false, true) => FieldMode::Skip,
            _ => {
                errors.push(syn::Error::new_spanned(
                    inner,
                    "flatten, items, and skip are mutually exclusive",
                ));
                return Err(());
            }
        };
        Ok(RecordField { inner, ident, mode })
    }
}

pub(crate) fn with_lit_str(
    errors: &Errors,
    name_value: &MetaNameValue,
    f: &mut dyn FnMut(&LitStr),
) {
    if let Lit::Str(s) = &name_value.lit {
        f(s);
    } else {
        errors.push(syn::Error::new_spanned(
            &name_value.lit,
            format!(
                "{:?} expects a string literal",
                name_value.path.to_token_stream()
            ),
        ));
    }
}
