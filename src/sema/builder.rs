//! Semantic model construction.
//!
//! One depth-first visit over the raw CST with an explicit stack of open
//! elements, followed by three finishing passes: whitespace inference,
//! document-order sort, and sibling linking. The builder is total: any
//! tree the [`xml`](crate::xml) parser can produce becomes a model, with
//! malformed markup represented as invalid-variant nodes rather than
//! errors.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::xml::{Parse, SyntaxKind, XmlContent, XmlDocument, XmlElement};

use super::node::{
    AttributeData, ElementData, ElementForm, ElementRecovery, NodeData, NodeId, NodePayload,
    SemanticModel,
};

/// Build a semantic model from a parsed document.
pub fn build_model(parse: &Parse) -> SemanticModel {
    let mut builder = ModelBuilder::default();

    if let Some(document) = XmlDocument::cast(parse.syntax()) {
        for element in document.elements() {
            builder.visit_element(&element, None);
        }
    }

    builder.finish()
}

#[derive(Default)]
struct ModelBuilder {
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
}

impl ModelBuilder {
    fn finish(mut self) -> SemanticModel {
        self.infer_whitespace();

        let mut ordered: Vec<NodeId> = (0..self.nodes.len() as u32).map(NodeId).collect();
        ordered.sort_by_key(|id| {
            let range = self.nodes[id.index()].range;
            (range.start(), range.end())
        });

        self.connect_siblings();

        SemanticModel {
            nodes: self.nodes,
            ordered,
            root: self.root,
        }
    }

    fn alloc(&mut self, range: TextRange, parent: Option<NodeId>, payload: NodePayload) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            range,
            parent,
            prev_sibling: None,
            next_sibling: None,
            payload,
        });
        id
    }

    // =========================================================================
    // Primary visit
    // =========================================================================

    fn visit_element(&mut self, element: &XmlElement, parent: Option<NodeId>) {
        let element_range = element.range();
        let tag = element.tag();
        let start_tag_range = tag.range();
        let name_token = element.name_token();
        let name = name_token
            .as_ref()
            .map(|t| SmolStr::new(t.text()))
            .unwrap_or_default();
        let name_range = name_token.as_ref().map(|t| t.text_range());
        let end_tag = element.end_tag();
        let end_tag_range = end_tag.as_ref().map(|t| t.range());
        let end_tag_named = end_tag
            .as_ref()
            .is_some_and(|t| t.name_token().is_some());

        // The attributes region: everything inside the tag after the name.
        let attributes_range = {
            let start = name_range.map(TextRange::end).unwrap_or_else(|| {
                (start_tag_range.start() + TextSize::from(1)).min(start_tag_range.end())
            });
            let end = start_tag_range.end() - closer_width(element);
            if start <= end {
                TextRange::new(start, end)
            } else {
                start_tag_range
            }
        };

        // All the ways an XML element can go wrong, in priority order.
        let form = if element.is_self_closing() {
            if name.is_empty() {
                ElementForm::Invalid(ElementRecovery::Malformed)
            } else {
                ElementForm::SelfClosing
            }
        } else if name.is_empty() {
            if start_tag_range.len() == TextSize::from(2) {
                // `<>` and nothing else in the tag.
                ElementForm::Invalid(ElementRecovery::EmptyTagPair)
            } else if end_tag.is_none() {
                ElementForm::Invalid(ElementRecovery::UnterminatedStartTag)
            } else {
                ElementForm::Invalid(ElementRecovery::Malformed)
            }
        } else if end_tag.is_none() && !start_tag_closed(element) {
            ElementForm::Invalid(ElementRecovery::UnterminatedStartTag)
        } else if !end_tag_named {
            // `<Foo>` paired with `</>`, or never closed at all.
            ElementForm::Invalid(ElementRecovery::MissingEndTagName)
        } else {
            ElementForm::Content
        };

        // Invalid elements answer position queries with their best-effort
        // range: the start tag for shapes that never got further.
        let range = match form {
            ElementForm::Invalid(
                ElementRecovery::EmptyTagPair
                | ElementRecovery::UnterminatedStartTag
                | ElementRecovery::MissingEndTagName,
            ) => start_tag_range,
            _ => element_range,
        };

        let content_range = match (form, end_tag_range) {
            (ElementForm::Content, Some(end_tag_range))
                if start_tag_range.end() <= end_tag_range.start() =>
            {
                Some(TextRange::new(start_tag_range.end(), end_tag_range.start()))
            }
            _ => None,
        };

        let id = self.alloc(
            range,
            parent,
            NodePayload::Element(ElementData {
                name,
                form,
                name_range,
                start_tag_range,
                end_tag_range,
                attributes_range,
                content_range,
                attributes: Vec::new(),
                content: Vec::new(),
            }),
        );

        if self.root.is_none() {
            self.root = Some(id);
        }

        // Only well-formed content elements own a content list; children of
        // invalid elements still enter the model with parent links.
        if let Some(parent_id) = parent {
            if self.element_has_content_form(parent_id) {
                self.push_content(parent_id, id);
            }
        }

        for attribute in element.attributes() {
            self.visit_attribute(&attribute, id);
        }

        for content in element.content() {
            match content {
                XmlContent::Element(child) => self.visit_element(&child, Some(id)),
                XmlContent::Text(token) => {
                    if token.kind() == SyntaxKind::TEXT_CHUNK {
                        let text_id = self.alloc(
                            token.text_range(),
                            Some(id),
                            NodePayload::Text(SmolStr::new(token.text())),
                        );
                        self.push_content(id, text_id);
                    }
                }
            }
        }
    }

    fn visit_attribute(&mut self, attribute: &crate::xml::XmlAttribute, element: NodeId) {
        let attribute_range = attribute.range();
        let name_token = attribute.name_token();
        let value_token = attribute.value_token();

        let name = name_token
            .as_ref()
            .map(|t| SmolStr::new(t.text()))
            .unwrap_or_default();
        let name_range = name_token
            .as_ref()
            .map(|t| t.text_range())
            .unwrap_or(attribute_range);

        // Trim the quote delimiters off the value range; a value too short
        // to hold both quotes (or one that never closed) collapses to the
        // name range.
        let (value, value_range, value_ok) = match &value_token {
            Some(token) if is_closed_quote(token.text()) => {
                let range = token.text_range();
                let trimmed = TextRange::new(
                    range.start() + TextSize::from(1),
                    range.end() - TextSize::from(1),
                );
                let text = token.text();
                let inner = &text[1..text.len() - 1];
                // A zero-width value is degenerate: the attribute survives
                // but is flagged invalid.
                (SmolStr::new(inner), trimmed, !inner.is_empty())
            }
            _ => (SmolStr::default(), name_range, false),
        };

        let valid = !name.is_empty() && value_ok && name_range != attribute_range;

        let id = self.alloc(
            attribute_range,
            Some(element),
            NodePayload::Attribute(AttributeData {
                name,
                value,
                name_range,
                value_range,
                valid,
            }),
        );

        if let NodePayload::Element(data) = &mut self.nodes[element.index()].payload {
            data.attributes.push(id);
        }
    }

    fn element_has_content_form(&self, id: NodeId) -> bool {
        matches!(
            &self.nodes[id.index()].payload,
            NodePayload::Element(ElementData {
                form: ElementForm::Content,
                ..
            })
        )
    }

    fn push_content(&mut self, element: NodeId, child: NodeId) {
        if let NodePayload::Element(data) = &mut self.nodes[element.index()].payload {
            data.content.push(child);
        }
    }

    // =========================================================================
    // Finishing passes
    // =========================================================================

    /// Find the spaces between content nodes and synthesize whitespace
    /// nodes for them. The raw tree does not expose this granularity: the
    /// gaps (which may also cover comments) are what is left between the
    /// ranges of adjacent content.
    fn infer_whitespace(&mut self) {
        let elements: Vec<NodeId> = (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(|id| self.element_has_content_form(*id))
            .collect();

        for element_id in elements {
            let NodePayload::Element(data) = &self.nodes[element_id.index()].payload else {
                continue;
            };
            let Some(content_range) = data.content_range else {
                continue;
            };
            let old_content = data.content.clone();

            let mut new_content: Vec<NodeId> = Vec::with_capacity(old_content.len());
            let mut end_of_node = content_range.start();

            for child in old_content {
                let child_start = self.nodes[child.index()].range.start();
                if child_start > end_of_node {
                    let whitespace = self.alloc(
                        TextRange::new(end_of_node, child_start),
                        Some(element_id),
                        NodePayload::Whitespace,
                    );
                    new_content.push(whitespace);
                }
                end_of_node = end_of_node.max(self.nodes[child.index()].range.end());
                new_content.push(child);
            }

            // Any trailing whitespace before the closing tag?
            if content_range.end() > end_of_node {
                let whitespace = self.alloc(
                    TextRange::new(end_of_node, content_range.end()),
                    Some(element_id),
                    NodePayload::Whitespace,
                );
                new_content.push(whitespace);
            }

            if let NodePayload::Element(data) = &mut self.nodes[element_id.index()].payload {
                data.content = new_content;
            }
        }
    }

    /// Connect sibling nodes, separately along each element's attribute
    /// chain and its content chain.
    fn connect_siblings(&mut self) {
        let elements: Vec<NodeId> = (0..self.nodes.len() as u32)
            .map(NodeId)
            .filter(|id| matches!(self.nodes[id.index()].payload, NodePayload::Element(_)))
            .collect();

        for element_id in elements {
            let NodePayload::Element(data) = &self.nodes[element_id.index()].payload else {
                continue;
            };
            let attribute_chain = data.attributes.clone();
            let content_chain = data.content.clone();

            self.link_chain(&attribute_chain);
            self.link_chain(&content_chain);
        }
    }

    fn link_chain(&mut self, chain: &[NodeId]) {
        let mut previous: Option<NodeId> = None;
        for &next in chain {
            self.nodes[next.index()].prev_sibling = previous;
            if let Some(previous) = previous {
                self.nodes[previous.index()].next_sibling = Some(next);
            }
            previous = Some(next);
        }
    }
}

/// Width of the token that closes the element's tag (`>` or `/>`), or zero
/// when the tag never closed.
fn closer_width(element: &XmlElement) -> TextSize {
    if !start_tag_closed(element) {
        TextSize::from(0)
    } else if element.is_self_closing() {
        TextSize::from(2)
    } else {
        TextSize::from(1)
    }
}

/// Whether the quoted token has a matching close quote.
fn is_closed_quote(text: &str) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) => open == close,
        _ => false,
    }
}

/// Whether the element's start tag actually reached its `>`.
fn start_tag_closed(element: &XmlElement) -> bool {
    element
        .tag()
        .syntax()
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .any(|t| matches!(t.kind(), SyntaxKind::GT | SyntaxKind::SLASH_GT))
}
