//! Semantic node arena and typed handles.
//!
//! Every node lives in the [`SemanticModel`]'s arena and is addressed by
//! [`NodeId`]; cross-references (parent, siblings, children) are ids, never
//! owning pointers, so the cyclic reference structure of an XML document
//! stays acyclic in memory. A model is immutable once built.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::path::{PathSegment, XmlPath};

/// Index of a node in a [`SemanticModel`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Well-known kinds of semantic nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Attribute,
    Text,
    /// Non-significant whitespace, synthesized between content nodes.
    Whitespace,
}

/// How an element was written, including the recovered-from-error shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementForm {
    /// `<Foo>...</Foo>`
    Content,
    /// `<Foo />`
    SelfClosing,
    /// Malformed markup, carried in the model so position queries still
    /// land on something.
    Invalid(ElementRecovery),
}

/// Why an element is invalid. The variants are matched in this priority
/// order during classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRecovery {
    /// A completely empty angle-bracket pair, `<>`.
    EmptyTagPair,
    /// A start tag that never closes, `<Foo` (or a bare `<`).
    UnterminatedStartTag,
    /// The element's closing tag has no name (`</>`), or is missing
    /// entirely.
    MissingEndTagName,
    /// Anything else the parser salvaged.
    Malformed,
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub(crate) name: SmolStr,
    pub(crate) form: ElementForm,
    pub(crate) name_range: Option<TextRange>,
    pub(crate) start_tag_range: TextRange,
    pub(crate) end_tag_range: Option<TextRange>,
    /// The region after the name where attributes live (may be empty).
    pub(crate) attributes_range: TextRange,
    /// Between the start and end tags; `None` when the element cannot have
    /// content.
    pub(crate) content_range: Option<TextRange>,
    pub(crate) attributes: Vec<NodeId>,
    pub(crate) content: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub(crate) struct AttributeData {
    pub(crate) name: SmolStr,
    pub(crate) value: SmolStr,
    pub(crate) name_range: TextRange,
    /// Excludes the quote delimiters.
    pub(crate) value_range: TextRange,
    pub(crate) valid: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum NodePayload {
    Element(ElementData),
    Attribute(AttributeData),
    Text(SmolStr),
    Whitespace,
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) range: TextRange,
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) payload: NodePayload,
}

/// The semantic node graph for one version of one document.
///
/// Built by [`build_model`](super::build_model); immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct SemanticModel {
    pub(crate) nodes: Vec<NodeData>,
    /// All node ids sorted by (range.start, range.end): document order.
    pub(crate) ordered: Vec<NodeId>,
    /// The document's root element, when the text has one.
    pub(crate) root: Option<NodeId>,
}

impl SemanticModel {
    /// Typed handle for a node id.
    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node { model: self, id }
    }

    /// The document's root element.
    pub fn root(&self) -> Option<Element<'_>> {
        self.root.map(|id| Element {
            node: self.node(id),
        })
    }

    /// All nodes in document order (sorted by range start, then end).
    pub fn nodes(&self) -> impl Iterator<Item = Node<'_>> {
        self.ordered.iter().map(|&id| self.node(id))
    }

    /// Number of nodes in the model.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

/// A borrowed view of one semantic node.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    pub(crate) model: &'a SemanticModel,
    pub(crate) id: NodeId,
}

impl<'a> Node<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        match &self.data().payload {
            NodePayload::Element(_) => NodeKind::Element,
            NodePayload::Attribute(_) => NodeKind::Attribute,
            NodePayload::Text(_) => NodeKind::Text,
            NodePayload::Whitespace => NodeKind::Whitespace,
        }
    }

    /// The node's name: element/attribute name, `#text`, or `#whitespace`.
    pub fn name(&self) -> &'a str {
        match &self.data().payload {
            NodePayload::Element(element) => element.name.as_str(),
            NodePayload::Attribute(attribute) => attribute.name.as_str(),
            NodePayload::Text(_) => "#text",
            NodePayload::Whitespace => "#whitespace",
        }
    }

    pub fn range(&self) -> TextRange {
        self.data().range
    }

    /// Whether the node represents well-formed markup.
    pub fn is_valid(&self) -> bool {
        match &self.data().payload {
            NodePayload::Element(element) => !matches!(element.form, ElementForm::Invalid(_)),
            NodePayload::Attribute(attribute) => attribute.valid,
            NodePayload::Text(_) | NodePayload::Whitespace => true,
        }
    }

    pub fn next_sibling(&self) -> Option<Node<'a>> {
        self.data().next_sibling.map(|id| self.model.node(id))
    }

    pub fn prev_sibling(&self) -> Option<Node<'a>> {
        self.data().prev_sibling.map(|id| self.model.node(id))
    }

    /// The element that owns this node: the parent element for elements,
    /// the containing element for everything else.
    pub fn parent_element(&self) -> Option<Element<'a>> {
        let parent = self.data().parent?;
        self.model.node(parent).as_element()
    }

    pub fn as_element(&self) -> Option<Element<'a>> {
        matches!(self.data().payload, NodePayload::Element(_)).then_some(Element { node: *self })
    }

    pub fn as_attribute(&self) -> Option<Attribute<'a>> {
        matches!(self.data().payload, NodePayload::Attribute(_))
            .then_some(Attribute { node: *self })
    }

    /// Text content, for text nodes.
    pub fn text(&self) -> Option<&'a str> {
        match &self.data().payload {
            NodePayload::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// The node's path through the document.
    ///
    /// Elements extend their parent's path with their own name (the root
    /// element's path is absolute); attributes, text, and whitespace extend
    /// their element's path with [`Node::name`].
    pub fn path(&self) -> XmlPath {
        let base = match self.parent_element() {
            Some(parent) => parent.node.path(),
            None => XmlPath::root(),
        };
        base.append_segment(PathSegment::named(self.name()))
    }

    fn data(&self) -> &'a NodeData {
        self.model.data(self.id)
    }
}

/// A borrowed view of an element node.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    pub(crate) node: Node<'a>,
}

impl<'a> Element<'a> {
    pub fn id(&self) -> NodeId {
        self.node.id
    }

    pub fn node(&self) -> Node<'a> {
        self.node
    }

    pub fn name(&self) -> &'a str {
        self.node.name()
    }

    /// The element name's namespace prefix (if any).
    pub fn prefix(&self) -> Option<&'a str> {
        let name = self.name();
        name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn range(&self) -> TextRange {
        self.node.range()
    }

    pub fn form(&self) -> ElementForm {
        self.data().form
    }

    pub fn is_valid(&self) -> bool {
        self.node.is_valid()
    }

    /// Whether this element can hold content (i.e. was written with
    /// separate start and end tags and parsed cleanly).
    pub fn has_content(&self) -> bool {
        matches!(self.data().form, ElementForm::Content)
    }

    pub fn is_self_closing(&self) -> bool {
        matches!(self.data().form, ElementForm::SelfClosing)
    }

    pub fn name_range(&self) -> Option<TextRange> {
        self.data().name_range
    }

    pub fn start_tag_range(&self) -> TextRange {
        self.data().start_tag_range
    }

    pub fn end_tag_range(&self) -> Option<TextRange> {
        self.data().end_tag_range
    }

    /// The in-tag region where attributes live.
    pub fn attributes_range(&self) -> TextRange {
        self.data().attributes_range
    }

    /// The region between start and end tags, for content elements.
    pub fn content_range(&self) -> Option<TextRange> {
        self.data().content_range
    }

    pub fn parent_element(&self) -> Option<Element<'a>> {
        self.node.parent_element()
    }

    /// The element's attributes, in document order.
    pub fn attributes(&self) -> impl Iterator<Item = Attribute<'a>> + use<'a> {
        let model = self.node.model;
        self.data()
            .attributes
            .iter()
            .map(move |&id| Attribute {
                node: model.node(id),
            })
    }

    /// The first attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<Attribute<'a>> {
        self.attributes().find(|a| a.name() == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// The element's content (child elements, text, whitespace), in
    /// document order.
    pub fn content(&self) -> impl Iterator<Item = Node<'a>> + use<'a> {
        let model = self.node.model;
        self.data().content.iter().map(move |&id| model.node(id))
    }

    /// Child elements, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = Element<'a>> + use<'a> {
        self.content().filter_map(|node| node.as_element())
    }

    /// The first child element with the given name.
    pub fn child_element(&self, name: &str) -> Option<Element<'a>> {
        self.child_elements().find(|e| e.name() == name)
    }

    pub fn path(&self) -> XmlPath {
        self.node.path()
    }

    fn data(&self) -> &'a ElementData {
        match &self.node.model.data(self.node.id).payload {
            NodePayload::Element(data) => data,
            _ => unreachable!("Element handle over a non-element node"),
        }
    }
}

/// A borrowed view of an attribute node.
#[derive(Debug, Clone, Copy)]
pub struct Attribute<'a> {
    pub(crate) node: Node<'a>,
}

impl<'a> Attribute<'a> {
    pub fn id(&self) -> NodeId {
        self.node.id
    }

    pub fn node(&self) -> Node<'a> {
        self.node
    }

    pub fn name(&self) -> &'a str {
        self.node.name()
    }

    /// The attribute name's namespace prefix (if any).
    pub fn prefix(&self) -> Option<&'a str> {
        self.name().split_once(':').map(|(prefix, _)| prefix)
    }

    /// Whether this attribute declares a namespace (`xmlns` or `xmlns:x`).
    pub fn is_namespace(&self) -> bool {
        self.name() == "xmlns" || self.prefix() == Some("xmlns")
    }

    pub fn value(&self) -> &'a str {
        self.data().value.as_str()
    }

    pub fn range(&self) -> TextRange {
        self.node.range()
    }

    pub fn name_range(&self) -> TextRange {
        self.data().name_range
    }

    /// The value's range, excluding the quote delimiters.
    pub fn value_range(&self) -> TextRange {
        self.data().value_range
    }

    pub fn is_valid(&self) -> bool {
        self.data().valid
    }

    /// The element that owns this attribute.
    pub fn element(&self) -> Option<Element<'a>> {
        self.node.parent_element()
    }

    pub fn path(&self) -> XmlPath {
        self.node.path()
    }

    /// Whether the given offset sits inside the attribute's value.
    ///
    /// The position immediately after the last value character (still
    /// inside the quotes) counts as inside.
    pub fn value_contains(&self, offset: TextSize) -> bool {
        let range = self.value_range();
        offset >= range.start() && offset <= range.end()
    }

    fn data(&self) -> &'a AttributeData {
        match &self.node.model.data(self.node.id).payload {
            NodePayload::Attribute(data) => data,
            _ => unreachable!("Attribute handle over a non-attribute node"),
        }
    }
}
