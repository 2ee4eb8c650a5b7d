// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logic to derive the [`xml_mapper::de::Deserialize`] trait for structs.

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::{spanned::Spanned, Data};

use crate::common::{check_no_generics, Errors, FieldMode, RecordStruct};

/// Returns the `FieldDescriptor` expressions, in declaration order.
fn field_descriptors(struct_: &RecordStruct) -> Vec<TokenStream> {
    struct_
        .mapped_fields()
        .map(|field| {
            let span = field.inner.span();
            let ty = &field.inner.ty;
            let (name, rename) = match &field.mode {
                FieldMode::Mapped { name, rename } => (name, rename),
                _ => unreachable!(),
            };
            let rename = match rename {
                Some(r) => quote! { Some(#r) },
                None => quote! { None },
            };
            quote_spanned! {span=>
                ::xml_mapper::value::FieldDescriptor {
                    name: #name,
                    rename: #rename,
                    kind: <#ty as ::xml_mapper::de::Deserialize>::kind(),
                }
            }
        })
        .collect()
}

/// Returns the statements of `map_fields`.
///
/// Mapped fields index into the descriptor in the same order
/// `field_descriptors` produced them.
fn map_field_statements(struct_: &RecordStruct) -> Vec<TokenStream> {
    let mut pos = 0usize;
    struct_
        .fields
        .iter()
        .filter_map(|field| {
            let span = field.inner.span();
            let ident = field.ident;
            match field.mode {
                FieldMode::Mapped { .. } => {
                    let p = pos;
                    pos += 1;
                    Some(quote_spanned! {span=>
                        fields.map_field(&mut self.#ident, &descriptor.fields[#p], element)?;
                    })
                }
                FieldMode::Flatten => Some(quote_spanned! {span=>
                    fields.map_flattened(&mut self.#ident, element)?;
                }),
                FieldMode::Skip | FieldMode::Items => None,
            }
        })
        .collect()
}

fn do_struct(struct_: &RecordStruct) -> TokenStream {
    let ident = &struct_.input.ident;
    let name = &struct_.attr.name;
    let descriptors = field_descriptors(struct_);
    let statements = map_field_statements(struct_);
    let unused = if statements.is_empty() {
        quote! { let _ = (descriptor, fields, element); }
    } else if descriptors.is_empty() {
        quote! { let _ = descriptor; }
    } else {
        TokenStream::new()
    };

    let deserialize_impl = match struct_.items_pos {
        None => quote! {
            impl ::xml_mapper::de::Deserialize for #ident {
                fn kind() -> ::xml_mapper::value::FieldKind {
                    ::xml_mapper::value::FieldKind::Nested(#name)
                }

                fn from_element(
                    element: &::xml_mapper::dom::Element,
                    mapper: &::xml_mapper::de::Mapper<'_>,
                ) -> Result<Self, ::xml_mapper::de::Error> {
                    mapper.map_record(element)
                }
            }
        },
        Some(p) => {
            let items = &struct_.fields[p];
            let items_ident = items.ident;
            let items_ty = &items.inner.ty;
            let span = items.inner.span();
            let item_kind = quote_spanned! {span=>
                <<#items_ty as ::xml_mapper::de::ListItems>::Item as ::xml_mapper::de::Deserialize>::kind
            };
            quote! {
                impl ::xml_mapper::de::Deserialize for #ident {
                    fn kind() -> ::xml_mapper::value::FieldKind {
                        ::xml_mapper::value::FieldKind::ListDerived {
                            type_name: #name,
                            item: #item_kind,
                        }
                    }

                    fn from_element(
                        element: &::xml_mapper::dom::Element,
                        mapper: &::xml_mapper::de::Mapper<'_>,
                    ) -> Result<Self, ::xml_mapper::de::Error> {
                        mapper.list_derivative(element, element.local_name())
                    }

                    fn from_items(
                        items: &[&::xml_mapper::dom::Element],
                        container: &::xml_mapper::dom::Element,
                        mapper: &::xml_mapper::de::Mapper<'_>,
                    ) -> Result<Self, ::xml_mapper::de::Error> {
                        let mut value = <Self as ::std::default::Default>::default();
                        value.#items_ident = mapper.materialize_list(items)?;
                        mapper.populate(&mut value, container)?;
                        Ok(value)
                    }
                }
            }
        }
    };

    quote! {
        impl ::xml_mapper::de::Record for #ident {
            fn describe() -> ::xml_mapper::value::TypeDescriptor {
                ::xml_mapper::value::TypeDescriptor {
                    name: #name,
                    fields: vec![#(#descriptors,)*],
                }
            }

            fn map_fields(
                &mut self,
                descriptor: &::xml_mapper::value::TypeDescriptor,
                fields: &::xml_mapper::de::FieldMapper<'_>,
                element: &::xml_mapper::dom::Element,
            ) -> Result<(), ::xml_mapper::de::Error> {
                #unused
                #(#statements)*
                Ok(())
            }
        }

        #deserialize_impl
    }
}

pub(crate) fn derive(errors: &Errors, input: syn::DeriveInput) -> Result<TokenStream, ()> {
    check_no_generics(errors, &input)?;
    match input.data {
        Data::Struct(ref data) => {
            let struct_ = RecordStruct::new(errors, &input, data)?;
            Ok(do_struct(&struct_))
        }
        Data::Enum(_) => {
            errors.push(syn::Error::new_spanned(
                &input.ident,
                "enums should use #[derive(xml_mapper_derive::ParseText)]",
            ));
            Err(())
        }
        Data::Union(_) => {
            errors.push(syn::Error::new_spanned(
                &input.ident,
                "unions are unsupported",
            ));
            Err(())
        }
    }
}
