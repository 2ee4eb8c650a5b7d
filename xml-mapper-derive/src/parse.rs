// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logic to derive the [`xml_mapper::de::ParseText`] trait for unit-only enums.

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::Data;

use crate::common::{check_no_generics, Errors, TextEnum};

fn do_enum(enum_: &TextEnum) -> TokenStream {
    let ident = &enum_.input.ident;
    let name = &enum_.name;
    let match_arms: Vec<TokenStream> = enum_
        .variants
        .iter()
        .map(|v| {
            let vident = v.ident;
            let text = &v.lowercase_text;
            quote_spanned! { vident.span() => #text => Ok(Self::#vident) }
        })
        .collect();
    quote! {
        impl ::xml_mapper::de::ParseText for #ident {
            fn parse(
                text: &str,
                _config: &::xml_mapper::MappingConfig,
            ) -> Result<Self, ::xml_mapper::BoxedStdError> {
                let text = ::xml_mapper::de::collapse_whitespace(text);
                match text.to_lowercase().as_str() {
                    #(#match_arms,)*
                    t => Err(::xml_mapper::de::no_such_variant(#name, t)),
                }
            }
        }

        impl ::xml_mapper::de::Deserialize for #ident {
            fn kind() -> ::xml_mapper::value::FieldKind {
                ::xml_mapper::value::FieldKind::Enum(#name)
            }

            fn from_text(
                text: &str,
                mapper: &::xml_mapper::de::Mapper<'_>,
            ) -> Result<Self, ::xml_mapper::BoxedStdError> {
                <Self as ::xml_mapper::de::ParseText>::parse(text, mapper.config())
            }

            fn from_element(
                element: &::xml_mapper::dom::Element,
                mapper: &::xml_mapper::de::Mapper<'_>,
            ) -> Result<Self, ::xml_mapper::de::Error> {
                mapper.parse_element_text(element)
            }
        }
    }
}

pub(crate) fn derive(errors: &Errors, input: syn::DeriveInput) -> Result<TokenStream, ()> {
    check_no_generics(errors, &input)?;
    match input.data {
        Data::Enum(ref data) => {
            let enum_ = TextEnum::new(errors, &input, data);
            Ok(do_enum(&enum_))
        }
        _ => {
            errors.push(syn::Error::new_spanned(
                &input.ident,
                "only unit-only enums support #[derive(ParseText)]",
            ));
            Err(())
        }
    }
}
