//! Host document abstraction and target resolution.

mod memory;

pub use memory::{MemoryDocument, NodeId};

use crate::markup::Markup;

/// Mutable document tree the embed pipeline writes into.
///
/// Backends only need the handful of operations used to place a viewer:
/// lookup, class and style mutation, and wholesale replacement of a node's
/// children.
pub trait HostDocument {
    /// Handle to a node owned by the document.
    type Node: Clone + PartialEq + std::fmt::Debug;

    /// Returns the document body, if the document has one.
    fn body(&self) -> Option<Self::Node>;

    /// Returns the first element matching `selector`.
    ///
    /// Invalid selectors match nothing.
    fn query_selector(&self, selector: &str) -> Option<Self::Node>;

    /// Returns the node's `class` attribute, empty when unset.
    fn class_name(&self, node: &Self::Node) -> String;

    /// Replaces the node's `class` attribute.
    fn set_class_name(&mut self, node: &Self::Node, class_name: &str);

    /// Sets a single inline style property.
    fn set_style_property(&mut self, node: &Self::Node, property: &str, value: &str);

    /// Replaces every child of `node` with `markup`.
    fn replace_children(&mut self, node: &Self::Node, markup: &Markup);

    /// Returns the first descendant element of `node` with the given tag.
    fn first_element_by_tag(&self, node: &Self::Node, tag: &str) -> Option<Self::Node>;
}

/// Where the viewer should be placed.
#[derive(Clone, Debug, PartialEq)]
pub enum Target<'a, N> {
    /// The document body, filled edge to edge.
    Body,
    /// The first element matching a CSS selector.
    Selector(&'a str),
    /// A wrapped collection of elements; the first one is used.
    Collection(Vec<N>),
    /// A node the caller already holds.
    Node(N),
}

impl<N> Default for Target<'_, N> {
    fn default() -> Self {
        Self::Body
    }
}

impl<'a, N> From<&'a str> for Target<'a, N> {
    fn from(selector: &'a str) -> Self {
        Self::Selector(selector)
    }
}

impl<'a, N> Target<'a, N> {
    /// Resolves the target against `document`.
    pub fn resolve<D>(&self, document: &D) -> Option<N>
    where
        D: HostDocument<Node = N>,
        N: Clone + PartialEq + std::fmt::Debug,
    {
        match self {
            Self::Body => document.body(),
            Self::Selector(selector) => document.query_selector(selector),
            Self::Collection(nodes) => nodes.first().cloned(),
            Self::Node(node) => Some(node.clone()),
        }
    }

    /// Returns the selector text when the target was given as one.
    pub fn selector(&self) -> Option<&'a str> {
        match self {
            Self::Selector(selector) => Some(*selector),
            _ => None,
        }
    }
}

/// Adds `class` to the node's class list unless it is already present.
pub fn append_class<D>(document: &mut D, node: &D::Node, class: &str)
where
    D: HostDocument + ?Sized,
{
    let current = document.class_name(node);
    let mut classes: Vec<&str> = current.split_whitespace().collect();
    if classes.contains(&class) {
        return;
    }
    classes.push(class);
    let updated = classes.join(" ");
    document.set_class_name(node, &updated);
}
