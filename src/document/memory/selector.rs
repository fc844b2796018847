//! `selectors` glue so [`MemoryDocument`] answers full CSS selector queries.

use std::fmt;

use cssparser::{CowRcStr, Parser, ParserInput, SourceLocation, ToCss};
use log::debug;
use selectors::attr::{AttrSelectorOperation, AttrSelectorOperator, CaseSensitivity, NamespaceConstraint};
use selectors::matching::{
    matches_selector, ElementSelectorFlags, IgnoreNthChildForInvalidation, MatchingContext,
    MatchingMode, NeedsSelectorFlags, QuirksMode,
};
use selectors::parser::{ParseRelative, SelectorList, SelectorParseErrorKind};
use selectors::{NthIndexCache, OpaqueElement};

use super::{MemoryDocument, NodeId, NodeKind};

/// Returns every attached element matching `selector`, in document order.
///
/// Invalid selectors and pseudo-classes that depend on user interaction match
/// nothing.
pub(super) fn select(document: &MemoryDocument, selector: &str) -> Vec<NodeId> {
    let mut input = ParserInput::new(selector);
    let mut parser = Parser::new(&mut input);
    let list = match SelectorList::<MemorySelectors>::parse(&SelectorParser, &mut parser, ParseRelative::No) {
        Ok(list) => list,
        Err(err) => {
            debug!("ignoring selector '{selector}': {:?}", err.kind);
            return Vec::new();
        }
    };

    let mut nth_index_cache = NthIndexCache::default();
    let mut context = MatchingContext::new(
        MatchingMode::Normal,
        None,
        &mut nth_index_cache,
        QuirksMode::NoQuirks,
        NeedsSelectorFlags::No,
        IgnoreNthChildForInvalidation::No,
    );

    document
        .descendants(&document.root)
        .into_iter()
        .filter(|node| {
            let element = ElementRef::new(document, *node);
            element.is_element()
                && list
                    .0
                    .iter()
                    .any(|selector| matches_selector(selector, 0, None, &element, &mut context))
        })
        .collect()
}

/// Element view of a [`NodeId`] for selector matching.
#[derive(Clone, Copy)]
struct ElementRef<'a> {
    document: &'a MemoryDocument,
    node: NodeId,
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

impl<'a> ElementRef<'a> {
    fn new(document: &'a MemoryDocument, node: NodeId) -> Self {
        Self { document, node }
    }

    fn wrap(&self, node: NodeId) -> Self {
        Self::new(self.document, node)
    }

    fn tag(&self) -> Option<&'a str> {
        self.document.tag(&self.node)
    }

    fn attribute(&self, name: &str) -> Option<&'a str> {
        self.document.attribute(&self.node, name)
    }

    fn is_element(&self) -> bool {
        self.tag().is_some()
    }

    /// Children of this node's parent, including this node.
    fn siblings(&self) -> &'a [NodeId] {
        self.document
            .parent(&self.node)
            .map(|parent| self.document.children(&parent))
            .unwrap_or_default()
    }

    fn position_among_siblings(&self) -> Option<(usize, &'a [NodeId])> {
        let siblings = self.siblings();
        let position = siblings.iter().position(|sibling| *sibling == self.node)?;
        Some((position, siblings))
    }
}

impl selectors::Element for ElementRef<'_> {
    type Impl = MemorySelectors;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(&self.document.nodes[self.node.0])
    }

    fn parent_element(&self) -> Option<Self> {
        self.document
            .parent(&self.node)
            .map(|parent| self.wrap(parent))
            .filter(|parent| parent.is_element())
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let (position, siblings) = self.position_among_siblings()?;
        siblings[..position]
            .iter()
            .rev()
            .map(|sibling| self.wrap(*sibling))
            .find(|sibling| sibling.is_element())
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let (position, siblings) = self.position_among_siblings()?;
        siblings[position + 1..]
            .iter()
            .map(|sibling| self.wrap(*sibling))
            .find(|sibling| sibling.is_element())
    }

    fn first_element_child(&self) -> Option<Self> {
        self.document
            .children(&self.node)
            .iter()
            .map(|child| self.wrap(*child))
            .find(|child| child.is_element())
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, local_name: &str) -> bool {
        self.tag() == Some(local_name)
    }

    fn has_namespace(&self, _ns: &()) -> bool {
        true
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.tag() == other.tag()
    }

    fn attr_matches(
        &self,
        _ns: &NamespaceConstraint<&()>,
        local_name: &CssString,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        let Some(actual) = self.attribute(&local_name.0) else {
            return false;
        };

        match operation {
            AttrSelectorOperation::Exists => true,
            AttrSelectorOperation::WithValue {
                operator,
                case_sensitivity,
                value,
            } => {
                let (actual, expected) = match case_sensitivity {
                    CaseSensitivity::CaseSensitive => (actual.to_owned(), value.0.clone()),
                    CaseSensitivity::AsciiCaseInsensitive => {
                        (actual.to_ascii_lowercase(), value.0.to_ascii_lowercase())
                    }
                };
                match operator {
                    AttrSelectorOperator::Equal => actual == expected,
                    AttrSelectorOperator::Includes => {
                        actual.split_whitespace().any(|part| part == expected)
                    }
                    AttrSelectorOperator::DashMatch => {
                        actual == expected || actual.starts_with(&format!("{expected}-"))
                    }
                    AttrSelectorOperator::Prefix => {
                        !expected.is_empty() && actual.starts_with(&expected)
                    }
                    AttrSelectorOperator::Suffix => {
                        !expected.is_empty() && actual.ends_with(&expected)
                    }
                    AttrSelectorOperator::Substring => {
                        !expected.is_empty() && actual.contains(&expected)
                    }
                }
            }
        }
    }

    fn match_non_ts_pseudo_class(
        &self,
        pseudo_class: &UnsupportedPseudo,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match *pseudo_class {}
    }

    fn match_pseudo_element(
        &self,
        pseudo_element: &UnsupportedPseudo,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match *pseudo_element {}
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        matches!(self.tag(), Some("a" | "area")) && self.attribute("href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        self.tag() == Some("slot")
    }

    fn has_id(&self, id: &CssString, case_sensitivity: CaseSensitivity) -> bool {
        self.attribute("id").map_or(false, |found| match case_sensitivity {
            CaseSensitivity::CaseSensitive => found == id.0,
            CaseSensitivity::AsciiCaseInsensitive => found.eq_ignore_ascii_case(&id.0),
        })
    }

    fn has_class(&self, name: &CssString, case_sensitivity: CaseSensitivity) -> bool {
        self.attribute("class").map_or(false, |classes| {
            classes.split_whitespace().any(|class| match case_sensitivity {
                CaseSensitivity::CaseSensitive => class == name.0,
                CaseSensitivity::AsciiCaseInsensitive => class.eq_ignore_ascii_case(&name.0),
            })
        })
    }

    fn imported_part(&self, _name: &CssString) -> Option<CssString> {
        None
    }

    fn is_part(&self, _name: &CssString) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.document
            .children(&self.node)
            .iter()
            .all(|child| match &self.document.nodes[child.0].kind {
                NodeKind::Element { .. } => false,
                NodeKind::Text(text) | NodeKind::Raw(text) => text.is_empty(),
            })
    }

    fn is_root(&self) -> bool {
        self.node == self.document.root
    }
}

/// Owned string used for every identifier and attribute value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
struct CssString(String);

impl From<&str> for CssString {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl std::borrow::Borrow<str> for CssString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl ToCss for CssString {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        cssparser::serialize_string(&self.0, dest)
    }
}

#[derive(Clone, Copy, Debug)]
struct MemorySelectors;

impl selectors::SelectorImpl for MemorySelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = CssString;
    type Identifier = CssString;
    type LocalName = CssString;
    type NamespacePrefix = CssString;
    type NamespaceUrl = ();
    type BorrowedLocalName = str;
    type BorrowedNamespaceUrl = ();
    type NonTSPseudoClass = UnsupportedPseudo;
    type PseudoElement = UnsupportedPseudo;
}

/// Interaction-state pseudo-classes and pseudo-elements never apply to a
/// static document, so none can be constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
enum UnsupportedPseudo {}

impl selectors::parser::NonTSPseudoClass for UnsupportedPseudo {
    type Impl = MemorySelectors;

    fn is_active_or_hover(&self) -> bool {
        match *self {}
    }

    fn is_user_action_state(&self) -> bool {
        match *self {}
    }
}

impl selectors::parser::PseudoElement for UnsupportedPseudo {
    type Impl = MemorySelectors;
}

impl ToCss for UnsupportedPseudo {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

struct SelectorParser;

impl<'i> selectors::parser::Parser<'i> for SelectorParser {
    type Impl = MemorySelectors;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_non_ts_pseudo_class(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<UnsupportedPseudo, cssparser::ParseError<'i, SelectorParseErrorKind<'i>>> {
        Err(location.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name)))
    }

    fn parse_pseudo_element(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<UnsupportedPseudo, cssparser::ParseError<'i, SelectorParseErrorKind<'i>>> {
        Err(location.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name)))
    }

    fn parse_non_ts_functional_pseudo_class<'t>(
        &self,
        name: CowRcStr<'i>,
        parser: &mut Parser<'i, 't>,
    ) -> Result<UnsupportedPseudo, cssparser::ParseError<'i, SelectorParseErrorKind<'i>>> {
        Err(parser.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name)))
    }

    fn default_namespace(&self) -> Option<()> {
        None
    }

    fn namespace_for_prefix(&self, _prefix: &CssString) -> Option<()> {
        None
    }
}
