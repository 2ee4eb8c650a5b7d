// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deserialization from XML to Rust types.
//!
//! [`Deserializer::deserialize`] parses a document into a [`Document`], picks
//! the element to map, and hands it to the target type's [`Deserialize`] impl.
//! Record types (usually via `#[derive(Deserialize)]`) map each of their
//! fields through a [`FieldMapper`], which locates values with a
//! [`NameResolver`] and converts them according to the field's [`FieldKind`].

use std::cell::RefCell;
use std::sync::Arc;

use log::debug;

use crate::config::MappingConfig;
use crate::dom::{Document, Element};
use crate::value::{DescriptorCache, FieldKind, PrimitiveKind, TypeDescriptor};
use crate::{BoxedStdError, ExpandedNameRef};

mod field;
mod list;
mod resolve;
mod text;

pub use field::FieldMapper;
pub use resolve::{NameResolver, Source};
#[doc(hidden)]
pub use text::no_such_variant;
pub use text::{collapse_whitespace, ParseText, Uri};

/// A single frame of the mapping stack; see [`Error::stack`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StackElement {
    /// The field's declared name, or the element's local name for the root and list items.
    pub name: String,

    /// The position within the enclosing list, for list items.
    pub index: Option<usize>,
}

impl std::fmt::Display for StackElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{}]", &self.name, i),
            None => f.write_str(&self.name),
        }
    }
}

/// An error encountered while deserializing.
///
/// This type's `Display` impl will show the error encountered and the stack
/// of fields being mapped at the time. E.g.:
///
/// ```text
/// can't convert "abc" for Integer: invalid digit found in string
///
/// field stack:
///    2: Integer
///    1: InnerItem[0]
///    0: ItemWithInners
/// ```
///
/// Cloning an `Error` is cheap.
#[derive(Clone, Debug)]
pub struct Error(Arc<ErrorInner>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }

    /// Returns the stack of fields as of when this error occurred.
    ///
    /// `stack()[0]` is the root element; `stack.last()` is the innermost field.
    pub fn stack(&self) -> &[StackElement] {
        &self.0.stack
    }

    /// Returns true if the input was not well-formed XML or could not be read.
    pub fn is_parse(&self) -> bool {
        matches!(self.0.kind, ErrorKind::Xml(_) | ErrorKind::Io(_))
    }

    /// Returns true if a value was found but could not be converted to its field's type.
    pub fn is_conversion(&self) -> bool {
        matches!(self.0.kind, ErrorKind::Conversion { .. })
    }

    /// For conversion errors, returns the name of the field being converted.
    ///
    /// For an item of a list field, this is the list field's name.
    pub fn field(&self) -> Option<&str> {
        match &self.0.kind {
            ErrorKind::Conversion { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }

    /// For conversion errors, returns the text which failed to convert.
    pub fn text(&self) -> Option<&str> {
        match &self.0.kind {
            ErrorKind::Conversion { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }

    fn xml(e: xml::reader::Error) -> Self {
        Error(Arc::new(ErrorInner {
            kind: ErrorKind::Xml(e),
            stack: Vec::new(),
        }))
    }

    fn io(e: std::io::Error) -> Self {
        Error(Arc::new(ErrorInner {
            kind: ErrorKind::Io(e),
            stack: Vec::new(),
        }))
    }

    fn conversion(stack: &[StackElement], text: &str, source: BoxedStdError) -> Self {
        Error(Arc::new(ErrorInner {
            kind: ErrorKind::Conversion {
                field: stack
                    .iter()
                    .rev()
                    .find(|s| s.index.is_none())
                    .map(|s| s.name.clone())
                    .unwrap_or_default(),
                text: text.to_owned(),
                source,
            },
            stack: stack.to_vec(),
        }))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = &*self.0;
        std::fmt::Display::fmt(&inner.kind, f)?;
        if !inner.stack.is_empty() {
            write!(f, "\n\nfield stack:\n")?;
            for (i, frame) in inner.stack.iter().enumerate().rev() {
                writeln!(f, "{:4x}: {}", i, frame)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.0.kind)
    }
}

/// Information about an error, which should be enclosed in an `Arc` to make cloning cheap.
#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    stack: Vec<StackElement>,
}

#[derive(Debug)]
pub enum ErrorKind {
    /// A syntax error produced by `xml-rs`.
    Xml(xml::reader::Error),

    /// A failure reading the input.
    Io(std::io::Error),

    /// A value was found but could not be converted.
    Conversion {
        field: String,
        text: String,
        source: BoxedStdError,
    },
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Xml(e) => std::fmt::Display::fmt(e, f),
            ErrorKind::Io(e) => std::fmt::Display::fmt(e, f),
            ErrorKind::Conversion {
                field,
                text,
                source,
            } => write!(f, "can't convert {:?} for {}: {}", text, field, source),
        }
    }
}

impl std::error::Error for ErrorKind {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            // xml::reader::Error doesn't implement source so skip over it when
            // there's an underlying error.
            ErrorKind::Xml(e) => match e.kind() {
                xml::reader::ErrorKind::Io(io) => Some(io),
                xml::reader::ErrorKind::Utf8(utf) => Some(utf),
                _ => Some(e),
            },
            ErrorKind::Io(e) => Some(e),
            ErrorKind::Conversion { source, .. } => Some(source.as_ref()),
        }
    }
}

/// A type which can be mapped from XML.
///
/// Implemented here for primitives, `Option<T>`, and `Vec<T>`; by
/// `#[derive(Deserialize)]` for structs; and by `#[derive(ParseText)]` for
/// unit-only enums.
pub trait Deserialize: Sized {
    /// Describes how values of this type are located and converted.
    fn kind() -> FieldKind;

    /// Converts the text of an attribute or element.
    ///
    /// The default implementation fails; only text kinds override it.
    fn from_text(text: &str, mapper: &Mapper<'_>) -> Result<Self, BoxedStdError> {
        let _ = (text, mapper);
        Err(text::simple(format!(
            "{} can't be converted from text",
            Self::kind().type_name()
        )))
    }

    /// Converts a whole element.
    fn from_element(element: &Element, mapper: &Mapper<'_>) -> Result<Self, Error>;

    /// Builds a list from already-discovered items.
    ///
    /// `container` is the element the list's own fields (if any) are mapped
    /// against. The default implementation fails; only list kinds override it.
    fn from_items(
        items: &[&Element],
        container: &Element,
        mapper: &Mapper<'_>,
    ) -> Result<Self, Error> {
        let _ = items;
        Err(mapper.conversion_error(
            &container.text(),
            text::simple(format!("{} is not a list type", Self::kind().type_name())),
        ))
    }
}

/// A struct whose fields are mapped by name.
pub trait Record: Default + 'static {
    /// Lists the mappable fields, in declaration order.
    fn describe() -> TypeDescriptor;

    /// Maps each field described by `descriptor` (which came from
    /// [`Record::describe`]) against `element`.
    fn map_fields(
        &mut self,
        descriptor: &TypeDescriptor,
        fields: &FieldMapper<'_>,
        element: &Element,
    ) -> Result<(), Error>;
}

/// A sequence type usable as the items of a list-derived record.
pub trait ListItems {
    type Item: Deserialize;
}

impl<T: Deserialize> ListItems for Vec<T> {
    type Item = T;
}

macro_rules! deserialize_primitive {
    ( $kind:ident => $($t:ty),* ) => {
        $(
            impl Deserialize for $t {
                fn kind() -> FieldKind {
                    FieldKind::Primitive(PrimitiveKind::$kind)
                }

                fn from_text(text: &str, mapper: &Mapper<'_>) -> Result<Self, BoxedStdError> {
                    <$t as ParseText>::parse(text, mapper.config())
                }

                fn from_element(element: &Element, mapper: &Mapper<'_>) -> Result<Self, Error> {
                    mapper.parse_element_text(element)
                }
            }
        )*
    }
}

deserialize_primitive!(Bool => bool);
deserialize_primitive!(Char => char);
deserialize_primitive!(
    Integer => i8, u8, i16, u16, i32, u32, i64, u64, i128, u128, isize, usize
);
deserialize_primitive!(Float => f32, f64);
deserialize_primitive!(Decimal => rust_decimal::Decimal);
deserialize_primitive!(String => String);
deserialize_primitive!(Uri => Uri);
deserialize_primitive!(DateTime => chrono::NaiveDateTime, chrono::NaiveDate);
deserialize_primitive!(DateTimeOffset => chrono::DateTime<chrono::FixedOffset>);
deserialize_primitive!(Guid => uuid::Uuid);
deserialize_primitive!(TimeSpan => chrono::Duration);

impl<T: Deserialize> Deserialize for Option<T> {
    fn kind() -> FieldKind {
        FieldKind::Nullable(Box::new(T::kind()))
    }

    /// Empty text is `None`.
    fn from_text(text: &str, mapper: &Mapper<'_>) -> Result<Self, BoxedStdError> {
        if text.is_empty() {
            return Ok(None);
        }
        T::from_text(text, mapper).map(Some)
    }

    fn from_element(element: &Element, mapper: &Mapper<'_>) -> Result<Self, Error> {
        if T::kind().is_text() {
            return mapper.parse_element_text(element);
        }
        T::from_element(element, mapper).map(Some)
    }

    fn from_items(
        items: &[&Element],
        container: &Element,
        mapper: &Mapper<'_>,
    ) -> Result<Self, Error> {
        T::from_items(items, container, mapper).map(Some)
    }
}

impl<T: Deserialize> Deserialize for Vec<T> {
    fn kind() -> FieldKind {
        FieldKind::List(Box::new(T::kind()))
    }

    /// Treats `element` as a list container.
    fn from_element(element: &Element, mapper: &Mapper<'_>) -> Result<Self, Error> {
        mapper.materialize_list(&list::container_items(element))
    }

    fn from_items(
        items: &[&Element],
        _container: &Element,
        mapper: &Mapper<'_>,
    ) -> Result<Self, Error> {
        mapper.materialize_list(items)
    }
}

/// State for a single [`Deserializer::deserialize`] call.
///
/// Passed to [`Deserialize`] and [`Record`] impls.
pub struct Mapper<'a> {
    config: &'a MappingConfig,
    cache: &'a DescriptorCache,
    stack: RefCell<Vec<StackElement>>,
}

impl<'a> Mapper<'a> {
    fn new(config: &'a MappingConfig, cache: &'a DescriptorCache) -> Self {
        Self {
            config,
            cache,
            stack: RefCell::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &'a MappingConfig {
        self.config
    }

    pub fn resolver(&self) -> NameResolver<'a> {
        NameResolver::new(self.config.namespace())
    }

    /// Qualifies `local_name` with the configured namespace, if any.
    pub fn namespaced<'n>(&self, local_name: &'n str) -> ExpandedNameRef<'n>
    where
        'a: 'n,
    {
        ExpandedNameRef::new(self.config.namespace().unwrap_or(""), local_name)
    }

    /// Creates a `T::default()` and maps its fields against `element`.
    pub fn map_record<T: Record>(&self, element: &Element) -> Result<T, Error> {
        let mut value = T::default();
        self.populate(&mut value, element)?;
        Ok(value)
    }

    /// Maps the fields of an existing record against `element`.
    ///
    /// Fields with no matching value keep their current contents.
    pub fn populate<T: Record>(&self, value: &mut T, element: &Element) -> Result<(), Error> {
        let descriptor = self.cache.get::<T>();
        value.map_fields(&descriptor, &FieldMapper::new(self), element)
    }

    /// Converts the text content of `element`.
    pub fn parse_element_text<T: Deserialize>(&self, element: &Element) -> Result<T, Error> {
        let text = element.text();
        T::from_text(&text, self).map_err(|e| self.conversion_error(&text, e))
    }

    /// Returns a conversion error for the current field.
    pub fn conversion_error(&self, text: &str, source: BoxedStdError) -> Error {
        Error::conversion(&self.stack.borrow(), text, source)
    }

    /// Runs `f` with a frame pushed onto the error stack.
    pub(crate) fn with_frame<R>(
        &self,
        name: &str,
        index: Option<usize>,
        f: impl FnOnce() -> Result<R, Error>,
    ) -> Result<R, Error> {
        self.stack.borrow_mut().push(StackElement {
            name: name.to_owned(),
            index,
        });
        let result = f();
        self.stack.borrow_mut().pop();
        result
    }
}

/// Maps XML documents onto types, with a given configuration.
///
/// A `Deserializer` may be reused and shared between threads. Each call is
/// independent apart from the [`DescriptorCache`].
#[derive(Clone, Debug, Default)]
pub struct Deserializer {
    config: MappingConfig,
    cache: Arc<DescriptorCache>,
}

impl Deserializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MappingConfig) -> Self {
        Self {
            config,
            cache: Arc::default(),
        }
    }

    /// Uses `cache` rather than a private cache, so that several
    /// deserializers describe each type only once.
    pub fn with_cache(mut self, cache: Arc<DescriptorCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<DescriptorCache> {
        &self.cache
    }

    /// Maps the given document onto a new `T`.
    ///
    /// Missing or empty input returns `T::default()`.
    pub fn deserialize<T: Deserialize + Default>(&self, text: Option<&str>) -> Result<T, Error> {
        let text = match text {
            Some(t) if !t.is_empty() => t,
            _ => {
                debug!("no input; returning default");
                return Ok(T::default());
            }
        };
        let mut doc = Document::parse(text.as_bytes()).map_err(Error::xml)?;
        if self.config.namespace().is_none() {
            debug!("no namespace configured; stripping namespaces");
            doc.strip_namespaces();
        }

        let mapper = Mapper::new(&self.config, &self.cache);
        let root = match self.config.root_element() {
            None => doc.root(),
            Some(name) => match doc.root().child(mapper.namespaced(name)) {
                Some(e) => e,
                None => {
                    debug!(
                        "root element {} not found under <{}>; returning default",
                        name,
                        doc.root().name()
                    );
                    return Ok(T::default());
                }
            },
        };
        debug!("mapping <{}>", root.name());
        mapper.with_frame(root.local_name(), None, || {
            if T::kind().non_nullable().is_list() {
                debug!("<{}> maps to a list", root.name());
                mapper.list_derivative(root, root.local_name())
            } else {
                T::from_element(root, &mapper)
            }
        })
    }

    /// Reads a whole document from `source` and maps it onto a new `T`.
    pub fn read<T: Deserialize + Default, R: std::io::Read>(
        &self,
        mut source: R,
    ) -> Result<T, Error> {
        let mut text = String::new();
        source.read_to_string(&mut text).map_err(Error::io)?;
        self.deserialize(Some(&text))
    }
}

/// Maps the given document with the default configuration.
///
/// This is simply `Deserializer::new().deserialize(Some(source))`; it's common
/// enough to merit a convenience method.
pub fn from_str<T: Deserialize + Default>(source: &str) -> Result<T, Error> {
    Deserializer::new().deserialize(Some(source))
}

/// Reads and maps a document with the default configuration.
///
/// See [`from_str`].
pub fn read<T: Deserialize + Default, R: std::io::Read>(source: R) -> Result<T, Error> {
    Deserializer::new().read(source)
}
