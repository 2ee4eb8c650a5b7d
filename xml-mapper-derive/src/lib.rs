// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Derive macros for `xml-mapper`.
//!
//! *   `#[derive(Deserialize)]` on a struct with named fields implements
//!     `xml_mapper::de::Record` and `xml_mapper::de::Deserialize`. Field
//!     attributes: `#[xml_mapper(rename = "...")]`, `#[xml_mapper(skip)]`,
//!     `#[xml_mapper(flatten)]`, and `#[xml_mapper(items)]` (which makes the
//!     struct a list-derived record). The struct also needs `Default`.
//! *   `#[derive(ParseText)]` on a unit-only enum implements
//!     `xml_mapper::de::ParseText` and `xml_mapper::de::Deserialize`,
//!     matching variant names case-insensitively. Variants accept
//!     `#[xml_mapper(rename = "...")]`.

mod common;
mod deserialize;
mod parse;

use common::Errors;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

fn derive(
    input: proc_macro::TokenStream,
    f: fn(&Errors, syn::DeriveInput) -> Result<proc_macro2::TokenStream, ()>,
) -> proc_macro::TokenStream {
    let errors = Errors::new();
    let input = parse_macro_input!(input as DeriveInput);
    let out = f(&errors, input).unwrap_or_default();
    let errors = errors.take_compile_errors();
    proc_macro::TokenStream::from(quote! {
        const _: () = {
            #errors
            #out
        };
    })
}

#[proc_macro_derive(Deserialize, attributes(xml_mapper))]
pub fn derive_deserialize(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    derive(input, deserialize::derive)
}

#[proc_macro_derive(ParseText, attributes(xml_mapper))]
pub fn derive_parse_text(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    derive(input, parse::derive)
}
