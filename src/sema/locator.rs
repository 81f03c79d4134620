//! Position → node lookup over the semantic model.
//!
//! [`XmlLocator`] answers "what is at this text position" for every
//! downstream feature. A lookup returns the innermost node covering the
//! position together with a [`LocationFlags`] classification of the
//! position's anatomy (on a name, inside a value, between attributes, …)
//! that consumers branch on exhaustively.

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use text_size::{TextRange, TextSize};
use tracing::debug;

use super::node::{Attribute, Element, ElementForm, Node, NodeId, NodeKind, SemanticModel};
use super::path::XmlPath;

bitflags! {
    /// Flags describing a location in the XML.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LocationFlags: u16 {
        /// Position is on an element.
        const ELEMENT = 1 << 0;
        /// Position is within an element's opening tag.
        const OPENING_TAG = 1 << 1;
        /// Position is within an element's closing tag.
        const CLOSING_TAG = 1 << 2;
        /// Position is on an attribute.
        const ATTRIBUTE = 1 << 3;
        /// Position is within an element's attributes region (but not
        /// necessarily on a specific attribute).
        const ATTRIBUTES = 1 << 4;
        /// Position is on a name.
        const NAME = 1 << 5;
        /// Position is on element content / an attribute value.
        const VALUE = 1 << 6;
        /// Position is on text.
        const TEXT = 1 << 7;
        /// Position is on whitespace.
        const WHITESPACE = 1 << 8;
        /// The element at the position has no content.
        const EMPTY = 1 << 9;
        /// The node at the position does not represent valid XML.
        const INVALID = 1 << 10;
    }
}

/// The result of inspecting a position in the XML.
#[derive(Debug, Clone, Copy)]
pub struct XmlLocation<'a> {
    node: Node<'a>,
    offset: TextSize,
    flags: LocationFlags,
}

impl<'a> XmlLocation<'a> {
    /// The innermost node at the inspected position.
    pub fn node(&self) -> Node<'a> {
        self.node
    }

    /// The inspected offset.
    pub fn offset(&self) -> TextSize {
        self.offset
    }

    pub fn flags(&self) -> LocationFlags {
        self.flags
    }

    /// The element at or owning the position.
    pub fn element(&self) -> Option<Element<'a>> {
        match self.node.kind() {
            NodeKind::Element => self.node.as_element(),
            _ => self.node.parent_element(),
        }
    }

    /// The attribute at the position, if the position is on one.
    pub fn attribute(&self) -> Option<Attribute<'a>> {
        self.node.as_attribute()
    }

    // =========================================================================
    // Predicates (consumers branch on these exhaustively)
    // =========================================================================

    pub fn is_element(&self) -> bool {
        self.flags.contains(LocationFlags::ELEMENT)
    }

    /// On an element's name, inside its opening tag.
    pub fn is_element_name(&self) -> bool {
        self.flags
            .contains(LocationFlags::ELEMENT | LocationFlags::NAME)
    }

    /// Inside an element's content region (text, whitespace, or the gap
    /// between tags).
    pub fn is_element_content(&self) -> bool {
        self.flags.contains(LocationFlags::ELEMENT | LocationFlags::VALUE)
            && !self.flags.contains(LocationFlags::ATTRIBUTE)
    }

    pub fn is_attribute(&self) -> bool {
        self.flags.contains(LocationFlags::ATTRIBUTE)
    }

    pub fn is_attribute_name(&self) -> bool {
        self.flags
            .contains(LocationFlags::ATTRIBUTE | LocationFlags::NAME)
    }

    pub fn is_attribute_value(&self) -> bool {
        self.flags
            .contains(LocationFlags::ATTRIBUTE | LocationFlags::VALUE)
    }

    /// Inside the attributes region of a tag, but not on any attribute -
    /// the place where a new attribute could be typed.
    pub fn is_attributes_area(&self) -> bool {
        self.flags.contains(LocationFlags::ATTRIBUTES)
            && !self.flags.contains(LocationFlags::ATTRIBUTE)
    }

    pub fn is_text(&self) -> bool {
        self.flags.contains(LocationFlags::TEXT)
    }

    pub fn is_whitespace(&self) -> bool {
        self.flags.contains(LocationFlags::WHITESPACE)
    }

    pub fn is_empty_element(&self) -> bool {
        self.flags.contains(LocationFlags::EMPTY)
    }

    pub fn is_invalid(&self) -> bool {
        self.flags.contains(LocationFlags::INVALID)
    }

    /// Whether the node at the position matches the given path pattern
    /// (relative patterns match at any depth).
    pub fn path_ends_with(&self, pattern: &XmlPath) -> bool {
        self.node.path().ends_with(pattern)
    }

    /// Whether the node at the position has the given path as a parent
    /// (relative patterns match at any depth).
    pub fn has_parent_path(&self, pattern: &XmlPath) -> bool {
        let path = self.node.path();
        if pattern.is_relative() {
            match path.parent() {
                Some(parent) => parent.ends_with(pattern),
                None => false,
            }
        } else {
            path.is_child_of(pattern)
        }
    }
}

/// A facility for looking up semantic nodes by text position.
pub struct XmlLocator {
    model: SemanticModel,
    /// Node ranges in (start, end) order: document order.
    ordered_ranges: Vec<(TextRange, NodeId)>,
    /// Exact-match fast path: node by starting offset.
    by_start: FxHashMap<TextSize, NodeId>,
}

impl XmlLocator {
    /// Build a locator over a finished model.
    pub fn new(model: SemanticModel) -> Self {
        let ordered_ranges: Vec<(TextRange, NodeId)> = model
            .ordered
            .iter()
            .map(|&id| (model.data(id).range, id))
            .collect();

        let mut by_start = FxHashMap::default();
        for &(range, id) in &ordered_ranges {
            // First registration wins; nodes rarely share a start, and the
            // range scan below still finds the others.
            by_start.entry(range.start()).or_insert(id);
        }

        Self {
            model,
            ordered_ranges,
            by_start,
        }
    }

    /// The underlying model.
    pub fn model(&self) -> &SemanticModel {
        &self.model
    }

    /// All nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = Node<'_>> {
        self.model.nodes()
    }

    /// Find the innermost node at the given offset.
    ///
    /// Node ranges are closed at both ends for this purpose: a node still
    /// matches at the position immediately after its last character.
    pub fn find_node(&self, offset: TextSize) -> Option<Node<'_>> {
        // Short-circuit: a node starting exactly here.
        if let Some(&id) = self.by_start.get(&offset) {
            return Some(self.model.node(id));
        }

        // Walk backwards from the last range starting at or before the
        // offset; the first containing range found is the innermost (the
        // ordering is (start, end), so later = deeper or further right).
        let upper = self
            .ordered_ranges
            .partition_point(|(range, _)| range.start() <= offset);

        for &(range, id) in self.ordered_ranges[..upper].iter().rev() {
            if range.start() <= offset && offset <= range.end() {
                return Some(self.model.node(id));
            }
        }

        None
    }

    /// Inspect the given offset: find the innermost node and classify the
    /// position's anatomy.
    ///
    /// Boundary rule (intentional asymmetry, kept for behavioral
    /// compatibility): when the offset sits exactly on the seamless
    /// boundary between a node's end and its next sibling's start, the
    /// *next* sibling is selected: interactive queries are biased toward
    /// what the user is about to type.
    pub fn inspect(&self, offset: TextSize) -> Option<XmlLocation<'_>> {
        let mut node = self.find_node(offset)?;

        if let Some(next_sibling) = node.next_sibling() {
            if offset == node.range().end() && offset == next_sibling.range().start() {
                debug!(
                    from = ?node.range(),
                    to = ?next_sibling.range(),
                    "inspect moves to next sibling across seamless boundary"
                );
                node = next_sibling;
            }
        }

        let flags = self.classify(node, offset);

        Some(XmlLocation {
            node,
            offset,
            flags,
        })
    }

    /// Determine [`LocationFlags`] for a node at an offset.
    fn classify(&self, node: Node<'_>, offset: TextSize) -> LocationFlags {
        let mut flags = LocationFlags::empty();
        if !node.is_valid() {
            flags |= LocationFlags::INVALID;
        }

        match node.kind() {
            NodeKind::Element => {
                flags |= LocationFlags::ELEMENT;
                let element = node.as_element().expect("kind checked");

                if let Some(name_range) = element.name_range() {
                    if contains_half_open(name_range, offset) {
                        flags |= LocationFlags::NAME;
                    }
                }
                if contains_half_open(element.attributes_range(), offset) {
                    flags |= LocationFlags::ATTRIBUTES;
                }

                match element.form() {
                    ElementForm::SelfClosing => {
                        flags |= LocationFlags::EMPTY;
                    }
                    ElementForm::Content => {
                        if contains_half_open(element.start_tag_range(), offset) {
                            flags |= LocationFlags::OPENING_TAG;
                        }
                        if let Some(end_tag_range) = element.end_tag_range() {
                            if contains_half_open(end_tag_range, offset) {
                                flags |= LocationFlags::CLOSING_TAG;
                            }
                        }
                        if let Some(content_range) = element.content_range() {
                            if offset >= content_range.start() && offset <= content_range.end() {
                                flags |= LocationFlags::VALUE;
                            }
                        }
                    }
                    ElementForm::Invalid(_) => {}
                }
            }
            NodeKind::Attribute => {
                flags |= LocationFlags::ATTRIBUTE;
                let attribute = node.as_attribute().expect("kind checked");

                if contains_half_open(attribute.name_range(), offset) {
                    flags |= LocationFlags::NAME;
                }
                if attribute.is_valid() && attribute.value_contains(offset) {
                    flags |= LocationFlags::VALUE;
                }
                // The position also sits in the owning element's
                // attributes region.
                flags |= LocationFlags::ATTRIBUTES;
            }
            NodeKind::Text => {
                flags |= LocationFlags::TEXT | LocationFlags::ELEMENT | LocationFlags::VALUE;
            }
            NodeKind::Whitespace => {
                flags |= LocationFlags::WHITESPACE | LocationFlags::ELEMENT | LocationFlags::VALUE;
            }
        }

        flags
    }
}

/// Half-open containment (`start <= offset < end`), used for name spans so
/// the position just past a name no longer counts as "on" it.
fn contains_half_open(range: TextRange, offset: TextSize) -> bool {
    range.start() <= offset && offset < range.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::build_model;
    use crate::xml::parse;

    fn locator(input: &str) -> XmlLocator {
        XmlLocator::new(build_model(&parse(input)))
    }

    fn offset_of(haystack: &str, needle: &str) -> TextSize {
        TextSize::from(haystack.find(needle).expect("needle present") as u32)
    }

    #[test]
    fn total_coverage_inside_document() {
        let input = "<Project><ItemGroup><Compile Include=\"a.cs\" /></ItemGroup></Project>";
        let locator = locator(input);

        for offset in 1..input.len() as u32 {
            let offset = TextSize::from(offset);
            let node = locator.find_node(offset);
            assert!(node.is_some(), "no node at offset {offset:?}");
        }
    }

    #[test]
    fn innermost_node_wins() {
        let input = "<Project><ItemGroup><Compile Include=\"a.cs\" /></ItemGroup></Project>";
        let locator = locator(input);

        let in_include_value = offset_of(input, "a.cs");
        let location = locator.inspect(in_include_value).unwrap();
        assert_eq!(location.node().name(), "Include");
        assert!(location.is_attribute_value());
    }

    #[test]
    fn element_name_classification() {
        let input = "<Project><ItemGroup /></Project>";
        let locator = locator(input);

        let on_name = offset_of(input, "ItemGroup");
        let location = locator.inspect(on_name).unwrap();
        assert!(location.is_element_name());
        assert!(location.is_empty_element());
    }

    #[test]
    fn opening_and_closing_tag_classification() {
        let input = "<Project>x</Project>";
        let locator = locator(input);

        let opening = locator.inspect(offset_of(input, "Project")).unwrap();
        assert!(opening.flags().contains(LocationFlags::OPENING_TAG));

        let closing = locator
            .inspect(offset_of(input, "/Project") + TextSize::from(1))
            .unwrap();
        assert!(closing.flags().contains(LocationFlags::CLOSING_TAG));
    }

    #[test]
    fn attributes_area_between_attributes() {
        let input = r#"<Compile Include="a.cs"  Exclude="b.cs" />"#;
        let locator = locator(input);

        // The second space between the two attributes: inside the tag's
        // attribute region but on no attribute.
        let gap = offset_of(input, r#" Exclude"#);
        let location = locator.inspect(gap).unwrap();
        assert!(location.is_attributes_area(), "flags: {:?}", location.flags());
    }

    #[test]
    fn whitespace_and_text_classification() {
        let input = "<A>\n  <B/>hello</A>";
        let locator = locator(input);

        let in_whitespace = offset_of(input, "\n") + TextSize::from(1);
        let location = locator.inspect(in_whitespace).unwrap();
        assert!(location.is_whitespace());
        assert!(location.is_element_content());

        let in_text = offset_of(input, "hello") + TextSize::from(2);
        let location = locator.inspect(in_text).unwrap();
        assert!(location.is_text());
    }

    #[test]
    fn seamless_boundary_prefers_next_sibling() {
        let input = "<A>one<B/>two</A>";
        let locator = locator(input);

        // "one" ends exactly where <B/> starts: the boundary belongs to B.
        let boundary = offset_of(input, "<B/>");
        let location = locator.inspect(boundary).unwrap();
        assert_eq!(location.node().name(), "B");

        // <B/> ends exactly where "two" starts.
        let boundary = offset_of(input, "two");
        let location = locator.inspect(boundary).unwrap();
        assert_eq!(location.node().kind(), NodeKind::Text);
    }

    #[test]
    fn invalid_node_flag() {
        let locator = locator("<Project><ItemGroup></Project>");

        let location = locator.inspect(TextSize::from(12)).unwrap();
        assert_eq!(location.node().name(), "ItemGroup");
        assert!(location.is_invalid());
    }

    #[test]
    fn exact_start_fast_path() {
        let input = "<A><B/></A>";
        let locator = locator(input);

        let b_start = offset_of(input, "<B/>");
        let node = locator.find_node(b_start).unwrap();
        assert_eq!(node.name(), "B");
    }

    #[test]
    fn path_predicates() {
        let input = "<Project><ItemGroup><Compile Include=\"a\"/></ItemGroup></Project>";
        let locator = locator(input);

        let location = locator.inspect(offset_of(input, "Compile")).unwrap();
        assert!(location.path_ends_with(&XmlPath::parse("ItemGroup/*")));
        assert!(location.has_parent_path(&XmlPath::parse("ItemGroup")));
        assert!(location.has_parent_path(&XmlPath::parse("/Project/ItemGroup")));
        assert!(!location.has_parent_path(&XmlPath::parse("PropertyGroup")));
    }
}
