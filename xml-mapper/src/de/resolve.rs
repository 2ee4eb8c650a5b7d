// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Matching of declared names against the elements and attributes of a document.

use log::trace;

use crate::dom::{Attribute, Element};
use crate::naming::{camel_case, lowercase, matches_sanitized};
use crate::ExpandedNameRef;

/// Where a field's value was found.
#[derive(Copy, Clone, Debug)]
pub enum Source<'e> {
    Element(&'e Element),
    Attribute(&'e Attribute),
}

impl<'e> Source<'e> {
    /// Returns the attribute value or the element's text.
    pub fn text(&self) -> std::borrow::Cow<'e, str> {
        match self {
            Source::Element(e) => e.text().into(),
            Source::Attribute(a) => a.value().into(),
        }
    }
}

/// Finds elements and attributes for a declared name, trying progressively
/// looser spellings. The first match wins.
#[derive(Copy, Clone, Debug)]
pub struct NameResolver<'a> {
    namespace: &'a str,
}

impl<'a> NameResolver<'a> {
    /// Creates a resolver qualifying all names with `namespace` (or none).
    pub fn new(namespace: Option<&'a str>) -> Self {
        Self {
            namespace: namespace.unwrap_or(""),
        }
    }

    fn name<'n>(&self, local_name: &'n str) -> ExpandedNameRef<'n>
    where
        'a: 'n,
    {
        ExpandedNameRef::new(self.namespace, local_name)
    }

    /// Finds the element for `name` within `container`.
    ///
    /// Tries, in order: `rename`; the exact, lowercase, and camelCase forms
    /// of `name` among direct children; `container` itself if `name` is
    /// `Value`; then the shallowest descendant whose local name, ignoring
    /// `_` and `-`, equals `name` or its lowercase form.
    pub fn element<'e>(
        &self,
        container: &'e Element,
        name: &str,
        rename: Option<&str>,
    ) -> Option<&'e Element> {
        let found = self.element_inner(container, name, rename);
        trace!(
            "element {} in <{}>: {}",
            name,
            container.name(),
            if found.is_some() { "found" } else { "not found" }
        );
        found
    }

    fn element_inner<'e>(
        &self,
        container: &'e Element,
        name: &str,
        rename: Option<&str>,
    ) -> Option<&'e Element> {
        if let Some(rename) = rename {
            if let Some(e) = container.child(self.name(rename)) {
                return Some(e);
            }
        }
        let lower = lowercase(name);
        let camel = camel_case(name);
        for candidate in [name, lower.as_str(), camel.as_str()] {
            if let Some(e) = container.child(self.name(candidate)) {
                return Some(e);
            }
        }
        if name == "Value" {
            return Some(container);
        }
        container
            .descendants_by_depth()
            .find(|d| matches_sanitized(d.local_name(), name))
            .or_else(|| {
                container
                    .descendants_by_depth()
                    .find(|d| matches_sanitized(d.local_name(), &lower))
            })
    }

    /// Finds the attribute for `name` on `container`.
    ///
    /// Tries `rename`, then the exact, lowercase, and camelCase forms of
    /// `name`, then any attribute whose local name, ignoring `_` and `-`,
    /// equals `name` or its lowercase form.
    pub fn attribute<'e>(
        &self,
        container: &'e Element,
        name: &str,
        rename: Option<&str>,
    ) -> Option<&'e Attribute> {
        let found = self.attribute_inner(container, name, rename);
        trace!(
            "attribute {} on <{}>: {}",
            name,
            container.name(),
            if found.is_some() { "found" } else { "not found" }
        );
        found
    }

    fn attribute_inner<'e>(
        &self,
        container: &'e Element,
        name: &str,
        rename: Option<&str>,
    ) -> Option<&'e Attribute> {
        if let Some(rename) = rename {
            if let Some(a) = container.attribute(self.name(rename)) {
                return Some(a);
            }
        }
        let lower = lowercase(name);
        let camel = camel_case(name);
        for candidate in [name, lower.as_str(), camel.as_str()] {
            if let Some(a) = container.attribute(self.name(candidate)) {
                return Some(a);
            }
        }
        let attrs = container.attributes();
        attrs
            .iter()
            .find(|a| matches_sanitized(a.name().local_name, name))
            .or_else(|| {
                attrs
                    .iter()
                    .find(|a| matches_sanitized(a.name().local_name, &lower))
            })
    }

    /// Finds the value for `name`: an element if one matches, else an attribute.
    ///
    /// A matched element with no content and no attributes counts as absent,
    /// and then attributes are not consulted.
    pub fn find<'e>(
        &self,
        container: &'e Element,
        name: &str,
        rename: Option<&str>,
    ) -> Option<Source<'e>> {
        match self.element(container, name, rename) {
            Some(e) if e.is_empty() => None,
            Some(e) => Some(Source::Element(e)),
            None => self
                .attribute(container, name, rename)
                .map(Source::Attribute),
        }
    }
}
