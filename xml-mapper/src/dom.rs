// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! An owned, read-only XML tree.
//!
//! The mapper works on a fully parsed document rather than an event stream
//! because its name heuristics look ahead (descendant scans, sibling lists).

use log::trace;
use xml::reader::XmlEvent;

use crate::{ExpandedName, ExpandedNameRef};

/// A parsed document. Owns its element tree.
#[derive(Clone, Debug)]
pub struct Document {
    root: Element,
}

/// A node within an [`Element`].
#[derive(Clone, Debug)]
pub enum Node {
    Element(Element),

    /// Character data, from either text or CDATA sections.
    Text(String),
}

#[derive(Clone, Debug)]
pub struct Attribute {
    name: ExpandedName,
    prefix: Option<String>,
    value: String,
}

impl Attribute {
    pub fn name(&self) -> ExpandedNameRef {
        self.name.as_ref()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true for `xmlns="..."` and `xmlns:foo="..."`.
    pub fn is_namespace_declaration(&self) -> bool {
        match self.prefix.as_deref() {
            Some("xmlns") => true,
            None => self.name.local_name == "xmlns" && self.name.namespace.is_empty(),
            _ => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Element {
    name: ExpandedName,
    attributes: Vec<Attribute>,
    nodes: Vec<Node>,
}

impl Element {
    pub fn name(&self) -> ExpandedNameRef {
        self.name.as_ref()
    }

    pub fn local_name(&self) -> &str {
        &self.name.local_name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Iterates over direct child elements, in document order.
    pub fn children(&self) -> impl Iterator<Item = &Element> + '_ {
        self.nodes.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Returns the first direct child with exactly this name.
    pub fn child(&self, name: ExpandedNameRef) -> Option<&Element> {
        self.children().find(|c| c.name() == name)
    }

    /// Returns all direct children with exactly this name.
    pub fn children_named(&self, name: ExpandedNameRef<'_>) -> Vec<&Element> {
        self.children().filter(|c| c.name() == name).collect()
    }

    pub fn attribute(&self, name: ExpandedNameRef) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    pub fn has_children(&self) -> bool {
        self.children().next().is_some()
    }

    /// Returns true if the element has neither attributes nor content, as in `<foo/>`.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.attributes.is_empty()
    }

    /// Returns the concatenation of all descendant text, in document order.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.append_text(&mut out);
        out
    }

    fn append_text(&self, out: &mut String) {
        for n in &self.nodes {
            match n {
                Node::Element(e) => e.append_text(out),
                Node::Text(t) => out.push_str(t),
            }
        }
    }

    /// Iterates over all descendants (not including `self`) in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![Box::new(self.children())],
        }
    }

    /// Iterates over all descendants in order of increasing depth; document order within a depth.
    pub fn descendants_by_depth(&self) -> impl Iterator<Item = &Element> + '_ {
        let mut level: Vec<&Element> = self.children().collect();
        std::iter::from_fn(move || {
            if level.is_empty() {
                return None;
            }
            let next = level.iter().flat_map(|&e| e.children()).collect();
            Some(std::mem::replace(&mut level, next))
        })
        .flatten()
    }

    /// Returns the element within this subtree (possibly `self`) whose direct child is `target`.
    pub fn parent_of(&self, target: &Element) -> Option<&Element> {
        if self.children().any(|c| std::ptr::eq(c, target)) {
            return Some(self);
        }
        self.children().find_map(|c| c.parent_of(target))
    }

    /// Removes namespaces from this element's subtree, including namespace
    /// declaration attributes.
    fn strip_namespaces(&mut self) {
        self.name.namespace.clear();
        self.attributes.retain(|a| !a.is_namespace_declaration());
        for a in &mut self.attributes {
            a.name.namespace.clear();
            a.prefix = None;
        }
        for n in &mut self.nodes {
            if let Node::Element(e) = n {
                e.strip_namespaces();
            }
        }
    }
}

/// Depth-first, document-order iterator returned by [`Element::descendants`].
pub struct Descendants<'a> {
    stack: Vec<Box<dyn Iterator<Item = &'a Element> + 'a>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<&'a Element> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(e) => {
                    self.stack.push(Box::new(e.children()));
                    return Some(e);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

impl Document {
    /// Parses a complete document.
    pub fn parse<R: std::io::Read>(source: R) -> Result<Self, xml::reader::Error> {
        let mut reader = xml::ParserConfig::new()
            .allow_multiple_root_elements(false)
            .create_reader(source);
        let mut stack: Vec<Element> = Vec::new();
        loop {
            match reader.next()? {
                XmlEvent::StartElement {
                    name, attributes, ..
                } => {
                    trace!("Starting {}, new depth {}", &name, stack.len() + 1);
                    stack.push(Element {
                        name: ExpandedName::from_xml_name(&name),
                        attributes: attributes
                            .into_iter()
                            .map(|a| Attribute {
                                name: ExpandedName::from_xml_name(&a.name),
                                prefix: a.name.prefix,
                                value: a.value,
                            })
                            .collect(),
                        nodes: Vec::new(),
                    });
                }
                XmlEvent::EndElement { name } => {
                    trace!("Ending {}, new depth {}", &name, stack.len() - 1);

                    // xml-rs guarantees start/end elements are balanced.
                    let Some(element) = stack.pop() else { continue };
                    match stack.last_mut() {
                        Some(parent) => parent.nodes.push(Node::Element(element)),
                        None => {
                            // The reader still validates the rest of the
                            // document (trailing garbage, a second root).
                            finish(&mut reader)?;
                            return Ok(Document { root: element });
                        }
                    }
                }
                XmlEvent::Characters(s) | XmlEvent::CData(s) => {
                    if let Some(top) = stack.last_mut() {
                        top.nodes.push(Node::Text(s));
                    }
                }
                XmlEvent::EndDocument => unreachable!("EndDocument before root element ended"),

                // Declarations, comments, processing instructions, and
                // whitespace-only text.
                _ => {}
            }
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Removes all namespaces and namespace declarations from the document.
    pub fn strip_namespaces(&mut self) {
        self.root.strip_namespaces();
    }
}

fn finish<R: std::io::Read>(reader: &mut xml::reader::EventReader<R>) -> Result<(), xml::reader::Error> {
    loop {
        if let XmlEvent::EndDocument = reader.next()? {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Document {
        Document::parse(s.as_bytes()).unwrap()
    }

    #[test]
    fn bad_xml() {
        Document::parse(&b"argh"[..]).unwrap_err();
        Document::parse(&b"<Unclosed"[..]).unwrap_err();
        Document::parse(&b"<a></b>"[..]).unwrap_err();
        Document::parse(&b"<a/><b/>"[..]).unwrap_err();
    }

    #[test]
    fn text_concatenates_descendants() {
        let doc = parse("<a>one<b>two<![CDATA[three]]></b>four</a>");
        assert_eq!(doc.root().text(), "onetwothreefour");
    }

    #[test]
    fn whitespace_only_text_is_dropped() {
        let doc = parse("<a>\n  <b/>\n</a>");
        assert_eq!(doc.root().nodes().len(), 1);
        assert!(doc.root().children().next().unwrap().is_empty());
    }

    #[test]
    fn descendant_orders() {
        let doc = parse("<r><a><c/></a><b/></r>");
        let dfs: Vec<_> = doc.root().descendants().map(|e| e.local_name()).collect();
        assert_eq!(dfs, ["a", "c", "b"]);
        let bfs: Vec<_> = doc
            .root()
            .descendants_by_depth()
            .map(|e| e.local_name())
            .collect();
        assert_eq!(bfs, ["a", "b", "c"]);
    }

    #[test]
    fn parent_of() {
        let doc = parse("<r><a><c/></a><b/></r>");
        let c = doc.root().descendants().find(|e| e.local_name() == "c").unwrap();
        assert_eq!(doc.root().parent_of(c).unwrap().local_name(), "a");
        assert!(doc.root().parent_of(doc.root()).is_none());
    }

    #[test]
    fn strip_namespaces() {
        let mut doc = parse(
            r#"<r xmlns="http://example.com/a" xmlns:b="http://example.com/b" b:attr="1"><b:child/></r>"#,
        );
        assert_eq!(doc.root().name().namespace, "http://example.com/a");
        doc.strip_namespaces();
        let root = doc.root();
        assert_eq!(root.name(), ExpandedNameRef::new("", "r"));
        assert_eq!(root.attributes().len(), 1);
        assert_eq!(root.attributes()[0].name(), ExpandedNameRef::new("", "attr"));
        assert!(root.child(ExpandedNameRef::new("", "child")).is_some());
    }
}
