// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovery and construction of lists.

use log::trace;

use super::{Deserialize, Error, Mapper};
use crate::dom::Element;
use crate::naming::{camel_case, lowercase, matches_sanitized};
use crate::value::FieldKind;

/// Returns the items of a list container: its children sharing the first child's name.
pub(super) fn container_items(container: &Element) -> Vec<&Element> {
    match container.children().next() {
        Some(first) => container.children_named(first.name()),
        None => Vec::new(),
    }
}

impl<'a> Mapper<'a> {
    /// Converts each of `items`, in order.
    pub fn materialize_list<T: Deserialize>(&self, items: &[&Element]) -> Result<Vec<T>, Error> {
        items
            .iter()
            .enumerate()
            .map(|(i, &e)| self.with_frame(e.local_name(), Some(i), || T::from_element(e, self)))
            .collect()
    }

    /// Builds a list type `T` from the items found anywhere beneath `root`.
    ///
    /// Items are the descendants named after the item type, trying the same
    /// spellings as field names. A list-derived record's own fields are
    /// mapped against `root`'s child named `prop_name`, or `root` itself if
    /// there is no such child.
    ///
    /// Non-list types are simply mapped from that same element.
    pub fn list_derivative<T: Deserialize>(&self, root: &Element, prop_name: &str) -> Result<T, Error> {
        let container = root.child(self.namespaced(prop_name)).unwrap_or(root);
        self.list_within(root, container)
    }

    /// Like [`Mapper::list_derivative`], with an already-located `container`.
    ///
    /// Non-list types are mapped from `container`.
    pub fn list_within<T: Deserialize>(&self, root: &Element, container: &Element) -> Result<T, Error> {
        let kind = T::kind();
        let item = match kind.non_nullable() {
            FieldKind::List(item) => (**item).clone(),
            FieldKind::ListDerived { item, .. } => item(),
            _ => return T::from_element(container, self),
        };
        let items = self.discover_items(root, item.type_name());
        T::from_items(&items, container, self)
    }

    fn discover_items<'e>(&self, root: &'e Element, item_name: &str) -> Vec<&'e Element> {
        let lower = lowercase(item_name);
        let camel = camel_case(item_name);
        for candidate in [item_name, lower.as_str(), camel.as_str()] {
            let name = self.namespaced(candidate);
            let found: Vec<_> = root.descendants().filter(|d| d.name() == name).collect();
            if !found.is_empty() {
                trace!("found {} <{}> items", found.len(), name);
                return found;
            }
        }
        for target in [item_name, lower.as_str()] {
            let found: Vec<_> = root
                .descendants()
                .filter(|d| matches_sanitized(d.local_name(), target))
                .collect();
            if !found.is_empty() {
                trace!("found {} items resembling {}", found.len(), target);
                return found;
            }
        }
        trace!("no {} items under <{}>", item_name, root.name());
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::{DescriptorCache, MappingConfig};

    #[test]
    fn container_items_share_first_name() {
        let doc = Document::parse(&b"<l><a>1</a><b>2</b><a>3</a></l>"[..]).unwrap();
        let items: Vec<_> = container_items(doc.root())
            .into_iter()
            .map(Element::text)
            .collect();
        assert_eq!(items, ["1", "3"]);
        let doc = Document::parse(&b"<l/>"[..]).unwrap();
        assert!(container_items(doc.root()).is_empty());
    }

    #[test]
    fn discovery_strategies() {
        let config = MappingConfig::default();
        let cache = DescriptorCache::new();
        let mapper = Mapper::new(&config, &cache);
        let doc = Document::parse(
            &b"<r><innerItem>1</innerItem><x><innerItem>2</innerItem></x><inner_item>3</inner_item></r>"[..],
        )
        .unwrap();
        let found: Vec<_> = mapper
            .discover_items(doc.root(), "InnerItem")
            .into_iter()
            .map(Element::text)
            .collect();
        assert_eq!(found, ["1", "2"]);

        let found: Vec<_> = mapper
            .discover_items(doc.root(), "innerItem")
            .into_iter()
            .map(Element::text)
            .collect();
        assert_eq!(found, ["1", "2"]);

        let doc = Document::parse(&b"<r><Inner-Item>1</Inner-Item></r>"[..]).unwrap();
        assert_eq!(mapper.discover_items(doc.root(), "InnerItem").len(), 1);
        assert!(mapper.discover_items(doc.root(), "Other").is_empty());
    }

    #[test]
    fn materialize_in_document_order() {
        let config = MappingConfig::default();
        let cache = DescriptorCache::new();
        let mapper = Mapper::new(&config, &cache);
        let doc = Document::parse(&b"<l><i>3</i><i>1</i><i>2</i></l>"[..]).unwrap();
        let v: Vec<u8> = mapper
            .materialize_list(&container_items(doc.root()))
            .unwrap();
        assert_eq!(v, [3, 1, 2]);

        let doc = Document::parse(&b"<l><i>3</i><i>x</i></l>"[..]).unwrap();
        let e = mapper
            .materialize_list::<u8>(&container_items(doc.root()))
            .unwrap_err();
        assert_eq!(e.stack()[0].index, Some(1));
        assert_eq!(e.text(), Some("x"));
    }
}
