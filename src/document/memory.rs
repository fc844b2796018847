//! Arena-backed document used off-browser and in tests.

use std::fmt::Write as _;

use cssparser::{Delimiter, ParseError, Parser, ParserInput};

use crate::document::HostDocument;
use crate::markup::{self, Markup};

mod selector;

/// Handle to a node in a [`MemoryDocument`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
enum NodeKind {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Raw(String),
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// In-memory document tree with an `<html><body></body></html>` skeleton.
///
/// Detached nodes stay in the arena; handles to them remain valid but are no
/// longer reachable from the root.
#[derive(Clone, Debug)]
pub struct MemoryDocument {
    nodes: Vec<NodeData>,
    root: NodeId,
    body: NodeId,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        let mut document = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
        };
        let root = document.create_element("html");
        let body = document.create_element("body");
        document.append_child(&root, &body);
        document.root = root;
        document.body = body;
        document
    }

    /// Returns the `<body>` element.
    pub fn body_node(&self) -> NodeId {
        self.body
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_owned()))
    }

    /// Appends `child` to `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(*parent);
        self.nodes[parent.0].children.push(*child);
    }

    /// Returns the element's tag name, or `None` for non-element nodes.
    pub fn tag(&self, node: &NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    /// Returns the value of an attribute.
    pub fn attribute(&self, node: &NodeId, name: &str) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(existing, _)| existing == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// Sets an attribute on an element. Non-element nodes are ignored.
    pub fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[node.0].kind {
            match attributes.iter_mut().find(|(existing, _)| existing == name) {
                Some((_, slot)) => *slot = value.to_owned(),
                None => attributes.push((name.to_owned(), value.to_owned())),
            }
        }
    }

    /// Returns the value of a single inline style property.
    pub fn style_property(&self, node: &NodeId, property: &str) -> Option<String> {
        let style = self.attribute(node, "style")?;
        parse_declarations(style)
            .into_iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value)
    }

    /// Returns the node's children.
    pub fn children(&self, node: &NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Returns the node's parent, if attached.
    pub fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Serializes the children of `node`.
    pub fn inner_html(&self, node: &NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serializes `node` together with its children.
    pub fn outer_html(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    /// Serializes the whole document.
    pub fn to_html(&self) -> String {
        format!("<!DOCTYPE html>{}", self.outer_html(&self.root))
    }

    /// Returns every attached element matching the CSS `selector`, in
    /// document order. An invalid selector matches nothing.
    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        selector::select(self, selector)
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn detach(&mut self, node: &NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| child != node);
        }
    }

    /// Pre-order traversal including `node` itself.
    fn descendants(&self, node: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![*node];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(&current).iter().rev().copied());
        }
        out
    }

    fn materialize(&mut self, parent: &NodeId, markup: &Markup) {
        let node = match markup {
            Markup::Element(element) => {
                let node = self.create_element(element.tag());
                for (name, value) in element.attributes() {
                    self.set_attribute(&node, name, value);
                }
                for child in element.children() {
                    self.materialize(&node, child);
                }
                node
            }
            Markup::Text(text) => self.create_text(text),
            Markup::Raw(html) => self.push(NodeKind::Raw(html.clone())),
        };
        self.append_child(parent, &node);
    }

    fn write_node(&self, node: &NodeId, out: &mut String) {
        match &self.nodes[node.0].kind {
            NodeKind::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    let _ = write!(out, " {}='{}'", name, markup::escape(value, true));
                }
                if markup::is_void(tag) {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for child in self.children(node) {
                    self.write_node(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
            NodeKind::Text(text) => out.push_str(&markup::escape(text, false)),
            NodeKind::Raw(html) => out.push_str(html),
        }
    }
}

impl HostDocument for MemoryDocument {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.query_selector_all(selector).into_iter().next()
    }

    fn class_name(&self, node: &NodeId) -> String {
        self.attribute(node, "class").unwrap_or_default().to_owned()
    }

    fn set_class_name(&mut self, node: &NodeId, class_name: &str) {
        self.set_attribute(node, "class", class_name);
    }

    fn set_style_property(&mut self, node: &NodeId, property: &str, value: &str) {
        let mut declarations = parse_declarations(self.attribute(node, "style").unwrap_or_default());
        match declarations.iter_mut().find(|(name, _)| name == property) {
            Some((_, slot)) => *slot = value.to_owned(),
            None => declarations.push((property.to_owned(), value.to_owned())),
        }
        let style = declarations
            .iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(node, "style", &style);
    }

    fn replace_children(&mut self, node: &NodeId, markup: &Markup) {
        let previous = std::mem::take(&mut self.nodes[node.0].children);
        for child in previous {
            self.nodes[child.0].parent = None;
        }
        self.materialize(node, markup);
    }

    fn first_element_by_tag(&self, node: &NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(node)
            .into_iter()
            .skip(1)
            .find(|candidate| self.tag(candidate).map_or(false, |found| found.eq_ignore_ascii_case(tag)))
    }
}

/// Splits an inline style into `(property, value)` pairs.
///
/// Values keep their original text, so strings and `url()` tokens containing
/// `;` survive. Malformed declarations are dropped.
fn parse_declarations(style: &str) -> Vec<(String, String)> {
    let mut input = ParserInput::new(style);
    let mut parser = Parser::new(&mut input);
    let mut declarations = Vec::new();
    while !parser.is_exhausted() {
        if let Some(declaration) = parse_declaration(&mut parser) {
            declarations.push(declaration);
        }
    }
    declarations
}

/// Consumes one declaration and its terminating `;`.
fn parse_declaration(parser: &mut Parser<'_, '_>) -> Option<(String, String)> {
    parser.skip_whitespace();
    let name = parser
        .try_parse(|parser| parser.expect_ident().map(|name| name.to_ascii_lowercase()))
        .ok();
    let has_colon = name.is_some() && parser.try_parse(|parser| parser.expect_colon()).is_ok();

    let start = parser.position();
    let value = parser
        .parse_until_before(Delimiter::Semicolon, |parser| {
            while parser.next().is_ok() {}
            Ok::<_, ParseError<()>>(parser.slice_from(start).trim().to_owned())
        })
        .unwrap_or_default();
    let _ = parser.try_parse(|parser| parser.expect_semicolon());

    match name {
        Some(name) if has_colon && !value.is_empty() => Some((name, value)),
        _ => None,
    }
}
