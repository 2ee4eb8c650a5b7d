// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Type descriptions consumed by the mapper.
//!
//! A [`TypeDescriptor`] lists the mappable fields of a record type in
//! declaration order, along with each field's [`FieldKind`]. Descriptors are
//! produced by `#[derive(Deserialize)]` and memoized in a [`DescriptorCache`].

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use log::trace;
use parking_lot::RwLock;

use crate::de::Record;

/// A text-convertible type, as far as the mapper is concerned.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum PrimitiveKind {
    Bool,
    Char,

    /// Any of the fixed-width integer types.
    Integer,
    Float,

    /// [`rust_decimal::Decimal`].
    Decimal,
    String,

    /// [`crate::de::Uri`].
    Uri,

    /// [`chrono::NaiveDateTime`] or [`chrono::NaiveDate`].
    DateTime,

    /// [`chrono::DateTime<chrono::FixedOffset>`].
    DateTimeOffset,

    /// [`uuid::Uuid`].
    Guid,

    /// [`chrono::Duration`].
    TimeSpan,
}

impl PrimitiveKind {
    pub fn type_name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "Boolean",
            PrimitiveKind::Char => "Char",
            PrimitiveKind::Integer => "Integer",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Decimal => "Decimal",
            PrimitiveKind::String => "String",
            PrimitiveKind::Uri => "Uri",
            PrimitiveKind::DateTime => "DateTime",
            PrimitiveKind::DateTimeOffset => "DateTimeOffset",
            PrimitiveKind::Guid => "Guid",
            PrimitiveKind::TimeSpan => "TimeSpan",
        }
    }
}

/// How a field's value is located and converted.
#[derive(Clone, Debug)]
pub enum FieldKind {
    Primitive(PrimitiveKind),

    /// A unit-only enum parsed by variant name; holds the enum's name.
    Enum(&'static str),

    /// `Option<T>`.
    Nullable(Box<FieldKind>),

    /// `Vec<T>`.
    List(Box<FieldKind>),

    /// A record which is also a sequence of items.
    ///
    /// `item` is a function so that a type may (indirectly) contain itself.
    ListDerived {
        type_name: &'static str,
        item: fn() -> FieldKind,
    },

    /// A record type; holds its name.
    Nested(&'static str),
}

impl FieldKind {
    /// Returns the name used when looking up values of this kind by type, as
    /// in inline list detection.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Primitive(p) => p.type_name(),
            FieldKind::Enum(name) | FieldKind::Nested(name) => *name,
            FieldKind::Nullable(inner) => inner.type_name(),
            FieldKind::List(_) => "List",
            FieldKind::ListDerived { type_name, .. } => *type_name,
        }
    }

    /// Returns true for kinds whose values come from a single piece of text.
    pub fn is_text(&self) -> bool {
        match self {
            FieldKind::Primitive(_) | FieldKind::Enum(_) => true,
            FieldKind::Nullable(inner) => inner.is_text(),
            FieldKind::List(_) | FieldKind::ListDerived { .. } | FieldKind::Nested(_) => false,
        }
    }

    /// Returns true for `List` and `ListDerived`.
    pub fn is_list(&self) -> bool {
        matches!(self, FieldKind::List(_) | FieldKind::ListDerived { .. })
    }

    /// Strips any `Nullable` wrappers.
    pub fn non_nullable(&self) -> &FieldKind {
        let mut kind = self;
        while let FieldKind::Nullable(inner) = kind {
            kind = &**inner;
        }
        kind
    }
}

impl PartialEq for FieldKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldKind::Primitive(a), FieldKind::Primitive(b)) => a == b,
            (FieldKind::Enum(a), FieldKind::Enum(b)) => a == b,
            (FieldKind::Nullable(a), FieldKind::Nullable(b)) => a == b,
            (FieldKind::List(a), FieldKind::List(b)) => a == b,
            (
                FieldKind::ListDerived {
                    type_name: a,
                    item: a_item,
                },
                FieldKind::ListDerived {
                    type_name: b,
                    item: b_item,
                },
            ) => a == b && a_item() == b_item(),
            (FieldKind::Nested(a), FieldKind::Nested(b)) => a == b,
            _ => false,
        }
    }
}

/// A single mappable field of a record.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    /// The declared name, e.g. `FirstProperty` for a field `first_property`.
    pub name: &'static str,

    /// An override name from `#[xml_mapper(rename = "...")]`, tried before all others.
    pub rename: Option<&'static str>,

    pub kind: FieldKind,
}

/// The mappable fields of a record type, in declaration order.
///
/// Skipped and flattened fields are not listed.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDescriptor {
    pub name: &'static str,
    pub fields: Vec<FieldDescriptor>,
}

/// Memoizes [`TypeDescriptor`]s by type.
///
/// Safe to share between threads; see [`crate::Deserializer::with_cache`].
#[derive(Debug, Default)]
pub struct DescriptorCache {
    map: RwLock<HashMap<TypeId, Arc<TypeDescriptor>>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the descriptor for `T`, building it on first use.
    pub fn get<T: Record + 'static>(&self) -> Arc<TypeDescriptor> {
        let id = TypeId::of::<T>();
        if let Some(d) = self.map.read().get(&id) {
            return d.clone();
        }

        // Built without the lock held. If another thread raced, the first
        // insertion wins.
        let built = Arc::new(T::describe());
        trace!(
            "describing {}: {} fields",
            built.name,
            built.fields.len()
        );
        self.map.write().entry(id).or_insert(built).clone()
    }

    /// Returns the number of cached descriptors.
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}
