//! Typed AST wrappers over the untyped rowan CST.
//!
//! These are thin views: each struct wraps a [`SyntaxNode`] and exposes the
//! children the semantic layer cares about. They make no validity promises -
//! a malformed element still wraps, with the missing pieces surfacing as
//! `None`.

use text_size::TextRange;

use super::syntax_kind::SyntaxKind;
use super::{SyntaxNode, SyntaxToken};

/// Find the first direct child token of the given kind.
#[inline]
fn find_token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == kind)
}

/// The `DOCUMENT` root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument(SyntaxNode);

impl XmlDocument {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        (node.kind() == SyntaxKind::DOCUMENT).then_some(Self(node))
    }

    pub fn syntax(&self) -> &SyntaxNode {
        &self.0
    }

    /// Top-level elements (usually exactly one for a project file).
    pub fn elements(&self) -> impl Iterator<Item = XmlElement> + '_ {
        self.0.children().filter_map(XmlElement::cast)
    }

    /// The document's root element, if there is one.
    pub fn root_element(&self) -> Option<XmlElement> {
        self.elements().next()
    }
}

/// An `ELEMENT` or `EMPTY_ELEMENT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement(SyntaxNode);

impl XmlElement {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        matches!(
            node.kind(),
            SyntaxKind::ELEMENT | SyntaxKind::EMPTY_ELEMENT
        )
        .then_some(Self(node))
    }

    pub fn syntax(&self) -> &SyntaxNode {
        &self.0
    }

    pub fn range(&self) -> TextRange {
        self.0.text_range()
    }

    /// Whether this is a self-closing `<Foo />`.
    pub fn is_self_closing(&self) -> bool {
        self.0.kind() == SyntaxKind::EMPTY_ELEMENT
    }

    /// The tag carrying the element's name and attributes: the `START_TAG`
    /// child for a content element, the element node itself when
    /// self-closing.
    pub fn tag(&self) -> XmlTag {
        if self.is_self_closing() {
            return XmlTag(self.0.clone());
        }
        self.0
            .children()
            .find(|c| c.kind() == SyntaxKind::START_TAG)
            .map(XmlTag)
            // A start tag always exists for parsed elements; a stray end
            // tag wrapped as an element has none, so fall back to self.
            .unwrap_or_else(|| XmlTag(self.0.clone()))
    }

    /// The `END_TAG` child, when the element has one.
    pub fn end_tag(&self) -> Option<XmlTag> {
        self.0
            .children()
            .find(|c| c.kind() == SyntaxKind::END_TAG)
            .map(XmlTag)
    }

    /// The element's name token.
    pub fn name_token(&self) -> Option<SyntaxToken> {
        self.tag().name_token()
    }

    /// The element's attributes, in document order.
    pub fn attributes(&self) -> impl Iterator<Item = XmlAttribute> {
        self.tag().0.children().filter_map(XmlAttribute::cast)
    }

    /// Child elements and text chunks between the start and end tags, in
    /// document order. Empty for self-closing elements.
    pub fn content(&self) -> impl Iterator<Item = XmlContent> + '_ {
        self.0
            .children_with_tokens()
            .filter_map(|child| match child {
                rowan::NodeOrToken::Node(node) => XmlElement::cast(node).map(XmlContent::Element),
                rowan::NodeOrToken::Token(token) if token.kind() == SyntaxKind::TEXT_CHUNK => {
                    Some(XmlContent::Text(token))
                }
                _ => None,
            })
    }
}

/// One content item of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlContent {
    Element(XmlElement),
    Text(SyntaxToken),
}

/// A `START_TAG`, `END_TAG`, or the tag face of an `EMPTY_ELEMENT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlTag(SyntaxNode);

impl XmlTag {
    pub fn syntax(&self) -> &SyntaxNode {
        &self.0
    }

    pub fn range(&self) -> TextRange {
        self.0.text_range()
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        find_token(&self.0, SyntaxKind::NAME)
    }
}

/// An `ATTRIBUTE` node: `Name = "value"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute(SyntaxNode);

impl XmlAttribute {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        (node.kind() == SyntaxKind::ATTRIBUTE).then_some(Self(node))
    }

    pub fn syntax(&self) -> &SyntaxNode {
        &self.0
    }

    pub fn range(&self) -> TextRange {
        self.0.text_range()
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        find_token(&self.0, SyntaxKind::NAME)
    }

    /// The quoted value token, quotes included.
    pub fn value_token(&self) -> Option<SyntaxToken> {
        find_token(&self.0, SyntaxKind::QUOTED)
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::*;

    fn document(input: &str) -> XmlDocument {
        XmlDocument::cast(parse(input).syntax()).unwrap()
    }

    #[test]
    fn root_element_and_name() {
        let doc = document("<Project ToolsVersion=\"15.0\"><Target Name=\"Build\"/></Project>");
        let root = doc.root_element().unwrap();

        assert_eq!(root.name_token().unwrap().text(), "Project");
        assert!(!root.is_self_closing());
    }

    #[test]
    fn attributes_in_document_order() {
        let doc = document(r#"<Import Project="a.props" Condition="false" />"#);
        let import = doc.root_element().unwrap();

        let names: Vec<_> = import
            .attributes()
            .filter_map(|a| a.name_token())
            .map(|t| t.text().to_string())
            .collect();
        assert_eq!(names, vec!["Project", "Condition"]);
    }

    #[test]
    fn content_interleaves_text_and_elements() {
        let doc = document("<A>one<B/>two</A>");
        let a = doc.root_element().unwrap();

        let shapes: Vec<_> = a
            .content()
            .map(|c| match c {
                XmlContent::Element(_) => "element",
                XmlContent::Text(_) => "text",
            })
            .collect();
        assert_eq!(shapes, vec!["text", "element", "text"]);
    }

    #[test]
    fn missing_name_is_none() {
        let doc = document("<>");
        let broken = doc.root_element().unwrap();
        assert!(broken.name_token().is_none());
    }
}
