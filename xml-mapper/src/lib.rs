// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lenient mapping of XML documents onto static Rust types.
//!
//! Fields are matched to elements and attributes by name, trying a cascade of
//! spellings (exact, lowercase, camelCase, `_`/`-`-insensitive descendants) so
//! that one Rust type can read documents produced with different naming
//! conventions.
//!
//! ```rust
//! use xml_mapper_derive::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct InnerItem {
//!     first: String,
//!     second: String,
//! }
//!
//! let item: InnerItem = xml_mapper::from_str(r#"<item first="Hello" Second="World"/>"#).unwrap();
//! assert_eq!(item.first, "Hello");
//! assert_eq!(item.second, "World");
//! ```

pub mod config;
pub mod de;
pub mod dom;
pub mod naming;
pub mod value;

pub use config::{Culture, DateOrder, MappingConfig};
pub use de::{from_str, read, Deserializer};
pub use value::DescriptorCache;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A reference to an "expanded name": namespace and local name.
///
/// See [Namespaces in XML 1.1 (Second Edition) section 2.1: Basic
/// Concepts](https://www.w3.org/TR/2006/REC-xml-names11-20060816/#concepts).
///
/// An empty `namespace` means the name is not in any namespace.
///
/// The owned version is called [`ExpandedName`].
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ExpandedNameRef<'a> {
    pub namespace: &'a str,
    pub local_name: &'a str,
}

impl<'a> ExpandedNameRef<'a> {
    pub fn new(namespace: &'a str, local_name: &'a str) -> Self {
        Self {
            namespace,
            local_name,
        }
    }
}

impl<'a> std::fmt::Display for ExpandedNameRef<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local_name)
        }
    }
}

/// An owned version of an "expanded name": namespace and local name.
///
/// See [Namespaces in XML 1.1 (Second Edition) section 2.1: Basic
/// Concepts](https://www.w3.org/TR/2006/REC-xml-names11-20060816/#concepts).
///
/// The borrowed version is called [`ExpandedNameRef`].
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ExpandedName {
    pub namespace: String,
    pub local_name: String,
}

impl ExpandedName {
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }

    /// Returns a name with no namespace.
    pub fn local(local_name: impl Into<String>) -> Self {
        Self::new(String::new(), local_name)
    }

    fn from_xml_name(name: &xml::name::OwnedName) -> Self {
        Self {
            namespace: match name.namespace {
                // Work around xml-rs's erroneous lack of builtin
                // xmlns:xml="http://www.w3.org/XML/1998/namespace" mapping.
                None if name.prefix.as_deref() == Some("xml") => XML_NS.to_owned(),
                None => String::new(),
                Some(ref ns) => ns.clone(),
            },
            local_name: name.local_name.clone(),
        }
    }

    pub fn as_ref(&self) -> ExpandedNameRef {
        ExpandedNameRef {
            namespace: &self.namespace,
            local_name: &self.local_name,
        }
    }
}

impl std::fmt::Display for ExpandedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.as_ref(), f)
    }
}

/// Shorthand for `Box<dyn std::error::Error + Send + Sync + 'static>`.
pub type BoxedStdError = Box<dyn std::error::Error + Send + Sync + 'static>;
