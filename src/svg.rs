//! A small owned XML element tree for SVG documents.
//!
//! Documents are parsed with `roxmltree` and copied into [`Element`] values so
//! they can be mutated: dots removed, a logo subtree appended, attributes
//! rewritten. Namespace prefixes are not global state; the writer takes them
//! from a [`WriterConfig`].

use std::fmt::Write as _;

use crate::error::{Error, Result};

/// The SVG namespace.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
/// The XLink namespace used by `href` attributes in older SVG files.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
/// The reserved `xml:` namespace. Never declared.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A namespace-qualified element or attribute name.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
    /// Prefix seen in the source document, used when the writer has no opinion.
    pub prefix: Option<String>,
}

impl QName {
    /// A name in the SVG namespace.
    pub fn svg(local: &str) -> Self {
        Self {
            namespace: Some(SVG_NS.to_string()),
            local: local.to_string(),
            prefix: None,
        }
    }

    /// A name with no namespace, as unprefixed attributes are.
    pub fn local(local: &str) -> Self {
        Self {
            namespace: None,
            local: local.to_string(),
            prefix: None,
        }
    }

    fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.namespace.as_deref() == namespace && self.local == local
    }
}

/// Child of an element.
#[derive(Clone, PartialEq, Debug)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with ordered attributes and children.
#[derive(Clone, PartialEq, Debug)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<(QName, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Parses an XML document and returns its root element.
    ///
    /// Comments and processing instructions are dropped.
    pub fn parse(text: &str) -> Result<Element> {
        let mut options = roxmltree::ParsingOptions::default();
        options.allow_dtd = true;
        let doc = roxmltree::Document::parse_with_options(text, options)
            .map_err(|e| Error::Asset(format!("Invalid XML: {}", e)))?;
        Ok(Self::from_node(doc.root_element()))
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Element {
        let tag = node.tag_name();
        let name = QName {
            namespace: tag.namespace().map(str::to_string),
            local: tag.name().to_string(),
            prefix: tag
                .namespace()
                .and_then(|uri| node.lookup_prefix(uri))
                .map(str::to_string),
        };

        let attributes = node
            .attributes()
            .map(|attr| {
                let qname = QName {
                    namespace: attr.namespace().map(str::to_string),
                    local: attr.name().to_string(),
                    prefix: attr
                        .namespace()
                        .and_then(|uri| node.lookup_prefix(uri))
                        .map(str::to_string),
                };
                (qname, attr.value().to_string())
            })
            .collect();

        let children = node
            .children()
            .filter_map(|child| {
                if child.is_element() {
                    Some(Node::Element(Self::from_node(child)))
                } else if child.is_text() {
                    child.text().map(|t| Node::Text(t.to_string()))
                } else {
                    None
                }
            })
            .collect();

        Element {
            name,
            attributes,
            children,
        }
    }

    /// Value of the unqualified attribute `name`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(qname, _)| qname.is(None, name))
            .map(|(_, value)| value.as_str())
    }

    /// Sets the unqualified attribute `name`, keeping its position if it exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(qname, _)| qname.is(None, name)) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((QName::local(name), value)),
        }
    }

    /// Builder form of [`Element::set_attr`].
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Whether this element is `<local>` in the SVG namespace.
    pub fn is_svg(&self, local: &str) -> bool {
        self.name.is(Some(SVG_NS), local)
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Direct element children.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First direct child that is `<local>` in the SVG namespace.
    pub fn find_svg_child(&self, local: &str) -> Option<&Element> {
        self.elements().find(|element| element.is_svg(local))
    }

    /// Keeps only the direct element children for which `keep` returns true.
    ///
    /// Returns the number of elements removed. Text nodes are untouched.
    pub fn retain_elements<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Element) -> bool,
    {
        let before = self.children.len();
        self.children.retain(|node| match node {
            Node::Element(element) => keep(element),
            Node::Text(_) => true,
        });
        before - self.children.len()
    }

    /// Serializes this element as the document root.
    pub fn to_xml(&self, config: &WriterConfig) -> String {
        let prefixes = config.assign_prefixes(self);
        let mut out = String::new();
        if config.xml_declaration {
            out.push_str("<?xml version='1.0' encoding='utf-8'?>\n");
        }
        write_element(&mut out, self, &prefixes, true);
        out
    }
}

/// Serialization settings for [`Element::to_xml`].
///
/// The default namespace is written without a prefix; every other namespace
/// in use is declared once on the root element.
#[derive(Clone, Debug)]
pub struct WriterConfig {
    pub xml_declaration: bool,
    pub default_namespace: Option<String>,
    pub prefixes: Vec<(String, String)>,
}

impl WriterConfig {
    /// Full SVG documents: XML declaration, SVG as default namespace.
    pub fn svg() -> Self {
        Self {
            xml_declaration: true,
            default_namespace: Some(SVG_NS.to_string()),
            prefixes: vec![("xlink".to_string(), XLINK_NS.to_string())],
        }
    }

    /// Same as [`WriterConfig::svg`] without the XML declaration.
    pub fn fragment() -> Self {
        Self {
            xml_declaration: false,
            ..Self::svg()
        }
    }

    /// Registers `prefix` for `uri`.
    pub fn with_prefix(mut self, prefix: &str, uri: &str) -> Self {
        self.prefixes.push((prefix.to_string(), uri.to_string()));
        self
    }

    fn assign_prefixes(&self, root: &Element) -> Prefixes {
        let mut used = Vec::new();
        collect_namespaces(root, &mut used);

        let mut prefixes = Prefixes {
            default: None,
            named: Vec::new(),
        };
        let mut generated = 0;
        for (uri, hint) in used {
            if uri == XML_NS {
                continue;
            }
            if self.default_namespace.as_deref() == Some(uri.as_str()) {
                prefixes.default = Some(uri);
                continue;
            }
            let registered = self
                .prefixes
                .iter()
                .find(|(_, u)| *u == uri)
                .map(|(p, _)| p.clone());
            let prefix = registered
                .or_else(|| hint.filter(|h| !prefixes.named.iter().any(|(p, _)| p == h)))
                .unwrap_or_else(|| loop {
                    let candidate = format!("ns{}", generated);
                    generated += 1;
                    if !prefixes.named.iter().any(|(p, _)| *p == candidate) {
                        break candidate;
                    }
                });
            prefixes.named.push((prefix, uri));
        }
        prefixes
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self::svg()
    }
}

struct Prefixes {
    default: Option<String>,
    named: Vec<(String, String)>,
}

impl Prefixes {
    fn element_prefix(&self, name: &QName) -> Option<&str> {
        let uri = name.namespace.as_deref()?;
        if self.default.as_deref() == Some(uri) {
            return None;
        }
        self.lookup(uri)
    }

    fn attribute_prefix(&self, name: &QName) -> Option<&str> {
        let uri = name.namespace.as_deref()?;
        if uri == XML_NS {
            return Some("xml");
        }
        self.lookup(uri)
    }

    fn lookup(&self, uri: &str) -> Option<&str> {
        self.named
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
    }
}

fn collect_namespaces(element: &Element, used: &mut Vec<(String, Option<String>)>) {
    let names = std::iter::once(&element.name).chain(element.attributes.iter().map(|(n, _)| n));
    for name in names {
        if let Some(uri) = &name.namespace {
            if !used.iter().any(|(u, _)| u == uri) {
                used.push((uri.clone(), name.prefix.clone()));
            }
        }
    }
    for child in element.elements() {
        collect_namespaces(child, used);
    }
}

fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}

fn write_element(out: &mut String, element: &Element, prefixes: &Prefixes, root: bool) {
    let tag = qualified(prefixes.element_prefix(&element.name), &element.name.local);
    out.push('<');
    out.push_str(&tag);

    if root {
        if let Some(uri) = &prefixes.default {
            let _ = write!(out, " xmlns=\"{}\"", escape(uri, true));
        }
        for (prefix, uri) in &prefixes.named {
            let _ = write!(out, " xmlns:{}=\"{}\"", prefix, escape(uri, true));
        }
    }

    for (name, value) in &element.attributes {
        let name = qualified(prefixes.attribute_prefix(name), &name.local);
        let _ = write!(out, " {}=\"{}\"", name, escape(value, true));
    }

    if element.children.is_empty() {
        out.push_str(" />");
        return;
    }

    out.push('>');
    for child in &element.children {
        match child {
            Node::Element(child) => write_element(out, child, prefixes, false),
            Node::Text(text) => out.push_str(&escape(text, false)),
        }
    }
    let _ = write!(out, "</{}>", tag);
}

fn escape(input: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\n' if attribute => out.push_str("&#10;"),
            _ => out.push(c),
        }
    }
    out
}
