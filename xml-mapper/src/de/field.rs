// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-field lookup and conversion.

use log::trace;

use super::list::container_items;
use super::{Deserialize, Error, Mapper, Record, Source};
use crate::dom::Element;
use crate::value::{FieldDescriptor, FieldKind};

/// Maps individual fields of a record; passed to [`Record::map_fields`].
pub struct FieldMapper<'m> {
    mapper: &'m Mapper<'m>,
}

impl<'m> FieldMapper<'m> {
    pub(super) fn new(mapper: &'m Mapper<'m>) -> Self {
        Self { mapper }
    }

    pub fn mapper(&self) -> &'m Mapper<'m> {
        self.mapper
    }

    /// Locates the value for `field` within `element` and stores it in `slot`.
    ///
    /// If nothing matches, `slot` is left untouched.
    pub fn map_field<F: Deserialize>(
        &self,
        slot: &mut F,
        field: &FieldDescriptor,
        element: &Element,
    ) -> Result<(), Error> {
        self.mapper.with_frame(field.name, None, || {
            if let Some(value) = self.convert::<F>(field, element)? {
                *slot = value;
            }
            Ok(())
        })
    }

    /// Maps a flattened record's fields against the same element as its parent.
    pub fn map_flattened<R: Record>(&self, slot: &mut R, element: &Element) -> Result<(), Error> {
        self.mapper.populate(slot, element)
    }

    fn convert<F: Deserialize>(
        &self,
        field: &FieldDescriptor,
        element: &Element,
    ) -> Result<Option<F>, Error> {
        let kind = field.kind.non_nullable();
        let source = match self.mapper.resolver().find(element, field.name, field.rename) {
            Some(s) => s,
            None => {
                if let FieldKind::List(item) = kind {
                    return self.inline_list(item, element);
                }
                trace!("{}: no value", field.name);
                return Ok(None);
            }
        };
        match kind {
            FieldKind::Primitive(_) | FieldKind::Enum(_) | FieldKind::Nullable(_) => {
                let text = source.text();
                F::from_text(&text, self.mapper)
                    .map(Some)
                    .map_err(|e| self.mapper.conversion_error(&text, e))
            }
            FieldKind::List(_) => match source {
                Source::Element(container) => {
                    F::from_items(&container_items(container), container, self.mapper).map(Some)
                }
                Source::Attribute(_) => Ok(None),
            },
            FieldKind::ListDerived { .. } => match source {
                Source::Element(container) => {
                    self.mapper.list_within(element, container).map(Some)
                }
                Source::Attribute(_) => self.mapper.list_derivative(element, field.name).map(Some),
            },
            FieldKind::Nested(_) => match source {
                Source::Element(e) => F::from_element(e, self.mapper).map(Some),
                Source::Attribute(_) => Ok(None),
            },
        }
    }

    /// Looks for items of a list field which aren't wrapped in a container
    /// element named after the field.
    fn inline_list<F: Deserialize>(
        &self,
        item: &FieldKind,
        element: &Element,
    ) -> Result<Option<F>, Error> {
        let item_name = item.type_name();
        let first = match self.mapper.resolver().element(element, item_name, None) {
            Some(e) => e,
            None => return Ok(None),
        };

        // `first` is `element` itself when the item type is named `Value`.
        let parent = match element.parent_of(first) {
            Some(p) => p,
            None => return Ok(None),
        };
        let siblings = parent.children_named(first.name());
        trace!(
            "inline list: {} <{}> items in <{}>",
            siblings.len(),
            first.name(),
            parent.name()
        );
        F::from_items(&siblings, parent, self.mapper).map(Some)
    }
}
