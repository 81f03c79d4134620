//! Recovering recursive-descent parser for MSBuild project XML
//!
//! Builds a rowan GreenNode tree from tokens. The tree is lossless and the
//! parser never fails: any input: including text that is mid-edit: yields
//! a `DOCUMENT` node spanning the full source, with malformed regions
//! represented as recoverable shapes (unterminated start tags, name-less
//! tags, attribute fragments) plus a [`SyntaxError`] for each.

use rowan::{GreenNode, GreenNodeBuilder};
use text_size::{TextRange, TextSize};

use super::lexer::{Token, tokenize};
use super::syntax_kind::SyntaxKind;

/// Parse result containing the green tree and any errors
#[derive(Debug, Clone)]
pub struct Parse {
    pub green: GreenNode,
    pub errors: Vec<SyntaxError>,
}

impl Parse {
    /// Get the root syntax node
    pub fn syntax(&self) -> super::SyntaxNode {
        super::SyntaxNode::new_root(self.green.clone())
    }

    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A syntax error with location and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// Parse XML source text into a CST
pub fn parse(input: &str) -> Parse {
    let tokens = tokenize(input);
    let mut parser = Parser::new(&tokens, TextSize::of(input));
    parser.parse_document();
    parser.finish()
}

/// The parser state
struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<SyntaxError>,
    /// Names of elements whose start tag is open, outermost first.
    open_elements: Vec<String>,
    eof: TextSize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token<'a>], eof: TextSize) -> Self {
        Self {
            tokens,
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            open_elements: Vec::new(),
            eof,
        }
    }

    fn finish(self) -> Parse {
        Parse {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> Option<SyntaxKind> {
        self.current().map(|t| t.kind)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current_kind() == Some(kind)
    }

    fn nth_kind(&self, n: usize) -> Option<SyntaxKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn current_offset(&self) -> TextSize {
        self.current().map(|t| t.offset).unwrap_or(self.eof)
    }

    /// Add the current token to the tree and advance.
    fn bump(&mut self) {
        if let Some(token) = self.tokens.get(self.pos) {
            self.builder.token(token.kind.into(), token.text);
            self.pos += 1;
        }
    }

    fn error(&mut self, message: impl Into<String>, range: TextRange) {
        self.errors.push(SyntaxError::new(message, range));
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let offset = self.current_offset();
        self.error(message, TextRange::empty(offset));
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    fn parse_document(&mut self) {
        self.builder.start_node(SyntaxKind::DOCUMENT.into());

        while let Some(kind) = self.current_kind() {
            match kind {
                SyntaxKind::LT => self.parse_element(),
                SyntaxKind::LT_SLASH => {
                    // An end tag with no matching element; keep it in the
                    // tree as a name-less element shape.
                    self.error_here("end tag without a matching start tag");
                    self.builder.start_node(SyntaxKind::ELEMENT.into());
                    self.parse_end_tag();
                    self.builder.finish_node();
                }
                _ => self.bump(),
            }
        }

        self.builder.finish_node();
    }

    /// Parse one element, starting at `<`.
    ///
    /// The tag tokens are parsed first; only once the tag closes (or fails
    /// to) do we know whether this is a self-closing `EMPTY_ELEMENT`, an
    /// `ELEMENT` with content, or an unterminated fragment.
    fn parse_element(&mut self) {
        let checkpoint = self.builder.checkpoint();
        let tag_start = self.current_offset();

        self.bump(); // `<`

        let name = if self.at(SyntaxKind::NAME) {
            let name = self.current().map(|t| t.text.to_string());
            self.bump();
            name
        } else {
            None
        };

        // Attributes and stray tokens until the tag resolves.
        let closing = loop {
            match self.current_kind() {
                Some(SyntaxKind::WHITESPACE) => self.bump(),
                Some(SyntaxKind::NAME) => self.parse_attribute(),
                Some(kind @ (SyntaxKind::EQ | SyntaxKind::QUOTED | SyntaxKind::ERROR_TOKEN)) => {
                    // An attribute fragment with no name; keep the bytes.
                    let token_range = self
                        .current()
                        .map(|t| TextRange::new(t.offset, t.end()))
                        .unwrap_or_else(|| TextRange::empty(self.eof));
                    self.error(
                        match kind {
                            SyntaxKind::ERROR_TOKEN => "unexpected character in tag",
                            _ => "attribute value without a name",
                        },
                        token_range,
                    );
                    self.bump();
                }
                Some(kind @ (SyntaxKind::GT | SyntaxKind::SLASH_GT)) => {
                    self.bump();
                    break Some(kind);
                }
                // A new tag opens before this one closed, or input ended.
                Some(SyntaxKind::LT | SyntaxKind::LT_SLASH) | None => break None,
                Some(_) => self.bump(),
            }
        };

        match closing {
            Some(SyntaxKind::SLASH_GT) => {
                // `<Foo ... />`
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::EMPTY_ELEMENT.into());
                if name.is_none() {
                    self.error(
                        "self-closing tag has no name",
                        TextRange::new(tag_start, self.current_offset()),
                    );
                }
                self.builder.finish_node();
            }
            Some(_) => {
                // `<Foo ...>`: wrap the tag, then parse content until the
                // element's end tag (or a recovery point).
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::START_TAG.into());
                self.builder.finish_node();
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::ELEMENT.into());

                self.open_elements.push(name.clone().unwrap_or_default());
                if name.is_none() {
                    self.error(
                        "tag has no name",
                        TextRange::new(tag_start, self.current_offset()),
                    );
                }

                self.parse_content();
                self.open_elements.pop();

                self.builder.finish_node();
            }
            None => {
                // Unterminated start tag: `<Foo` (or a bare `<`).
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::START_TAG.into());
                self.builder.finish_node();
                self.builder
                    .start_node_at(checkpoint, SyntaxKind::ELEMENT.into());
                self.builder.finish_node();
                self.error(
                    "start tag is never closed",
                    TextRange::new(tag_start, self.current_offset()),
                );
            }
        }
    }

    /// Parse element content up to and including the end tag.
    fn parse_content(&mut self) {
        loop {
            match self.current_kind() {
                Some(SyntaxKind::LT) => self.parse_element(),
                Some(SyntaxKind::LT_SLASH) => {
                    match self.end_tag_disposition() {
                        EndTagDisposition::Consume => {
                            self.parse_end_tag();
                            return;
                        }
                        EndTagDisposition::CloseWithoutConsuming => {
                            // The end tag belongs to an ancestor; this
                            // element is missing its own.
                            self.error_here("element is missing its end tag");
                            return;
                        }
                    }
                }
                Some(_) => self.bump(),
                None => {
                    self.error(
                        "element is never closed",
                        TextRange::empty(self.eof),
                    );
                    return;
                }
            }
        }
    }

    /// Decide whether the end tag at the current position closes the
    /// innermost element.
    ///
    /// A matching or name-less (`</>`) end tag is consumed here; an end tag
    /// naming an *ancestor* element closes the innermost element implicitly
    /// and is left for that ancestor to consume.
    fn end_tag_disposition(&self) -> EndTagDisposition {
        let mut n = 1;
        while self.nth_kind(n) == Some(SyntaxKind::WHITESPACE) {
            n += 1;
        }
        let Some(SyntaxKind::NAME) = self.nth_kind(n) else {
            return EndTagDisposition::Consume;
        };
        let end_name = self.tokens[self.pos + n].text;

        let innermost = self.open_elements.last().map(String::as_str);
        if innermost == Some(end_name) {
            return EndTagDisposition::Consume;
        }

        let names_ancestor = self.open_elements[..self.open_elements.len().saturating_sub(1)]
            .iter()
            .any(|open| open == end_name);
        if names_ancestor {
            EndTagDisposition::CloseWithoutConsuming
        } else {
            // Unknown name; attach it here so the bytes stay inside the
            // innermost element and it gets flagged invalid downstream.
            EndTagDisposition::Consume
        }
    }

    /// Parse `</Name >` (name optional), starting at `</`.
    fn parse_end_tag(&mut self) {
        let start = self.current_offset();
        self.builder.start_node(SyntaxKind::END_TAG.into());
        self.bump(); // `</`

        let mut has_name = false;
        loop {
            match self.current_kind() {
                Some(SyntaxKind::WHITESPACE) => self.bump(),
                Some(SyntaxKind::NAME) if !has_name => {
                    has_name = true;
                    self.bump();
                }
                Some(SyntaxKind::GT) => {
                    self.bump();
                    break;
                }
                Some(SyntaxKind::LT | SyntaxKind::LT_SLASH) | None => {
                    self.error(
                        "end tag is never closed",
                        TextRange::new(start, self.current_offset()),
                    );
                    break;
                }
                Some(_) => {
                    self.bump();
                }
            }
        }

        if !has_name {
            self.error(
                "end tag has no name",
                TextRange::new(start, self.current_offset()),
            );
        }

        self.builder.finish_node();
    }

    /// Parse `Name = "value"` inside a tag, starting at the name.
    ///
    /// Inter-token whitespace is pulled into the attribute node only when
    /// the attribute actually continues afterwards, so an attribute's range
    /// never includes trailing space.
    fn parse_attribute(&mut self) {
        self.builder.start_node(SyntaxKind::ATTRIBUTE.into());
        self.bump(); // name

        if self.continues_with(SyntaxKind::EQ) {
            self.bump_whitespace();
            self.bump(); // `=`

            if self.continues_with(SyntaxKind::QUOTED) {
                self.bump_whitespace();
                self.bump(); // value
            } else {
                self.error_here("attribute has no value");
            }
        } else {
            self.error_here("attribute has no value");
        }

        self.builder.finish_node();
    }

    /// Whether, after optional whitespace, the next token is `kind`.
    fn continues_with(&self, kind: SyntaxKind) -> bool {
        let mut n = 0;
        while self.nth_kind(n) == Some(SyntaxKind::WHITESPACE) {
            n += 1;
        }
        self.nth_kind(n) == Some(kind)
    }

    fn bump_whitespace(&mut self) {
        while self.at(SyntaxKind::WHITESPACE) {
            self.bump();
        }
    }
}

enum EndTagDisposition {
    Consume,
    CloseWithoutConsuming,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump(input: &str) -> String {
        format!("{:#?}", parse(input).syntax())
    }

    #[test]
    fn parse_well_formed_document() {
        let parse = parse("<Project>\n  <PropertyGroup />\n</Project>");
        assert!(parse.ok(), "unexpected errors: {:?}", parse.errors);

        let root = parse.syntax();
        assert_eq!(root.kind(), SyntaxKind::DOCUMENT);
        assert_eq!(
            u32::from(root.text_range().len()),
            "<Project>\n  <PropertyGroup />\n</Project>".len() as u32
        );
    }

    #[test]
    fn tree_is_lossless() {
        let input = "<A b=\"1\"> text <C/> more </A> junk";
        assert_eq!(parse(input).syntax().text().to_string(), input);
    }

    #[test]
    fn malformed_tree_is_lossless() {
        for input in [
            "<",
            "<>",
            "</>",
            "<Foo",
            "<Foo bar",
            "<Foo bar=",
            "<Foo bar='x",
            "<Foo><Bar></Foo>",
            "<Foo></Bar></Foo>",
            "<a><b><c></b></a>",
            "text only",
            "<Foo <Bar/>",
        ] {
            assert_eq!(
                parse(input).syntax().text().to_string(),
                input,
                "lost bytes for {input:?}"
            );
        }
    }

    #[test]
    fn empty_element_node_kind() {
        let root = parse("<Foo />").syntax();
        let element = root.first_child().unwrap();
        assert_eq!(element.kind(), SyntaxKind::EMPTY_ELEMENT);
    }

    #[test]
    fn element_with_content_has_start_and_end_tags() {
        let root = parse("<Foo>bar</Foo>").syntax();
        let element = root.first_child().unwrap();
        assert_eq!(element.kind(), SyntaxKind::ELEMENT);

        let kinds: Vec<_> = element.children().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec![SyntaxKind::START_TAG, SyntaxKind::END_TAG]);
    }

    #[test]
    fn unterminated_start_tag_recovers() {
        let parse = parse("<Foo <Bar/>");
        assert!(!parse.ok());

        let root = parse.syntax();
        let kinds: Vec<_> = root.children().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![SyntaxKind::ELEMENT, SyntaxKind::EMPTY_ELEMENT],
            "tree: {}",
            dump("<Foo <Bar/>")
        );
    }

    #[test]
    fn unclosed_element_reports_error() {
        let parse = parse("<Project><ItemGroup></Project>");
        assert!(
            parse
                .errors
                .iter()
                .any(|e| e.message.contains("missing its end tag"))
        );
    }

    #[test]
    fn nameless_end_tag_attaches_to_innermost() {
        let root = parse("<Foo></>").syntax();
        let element = root.first_child().unwrap();
        assert_eq!(element.kind(), SyntaxKind::ELEMENT);
        assert!(
            element
                .children()
                .any(|c| c.kind() == SyntaxKind::END_TAG)
        );
    }

    #[test]
    fn attribute_nodes() {
        let root = parse(r#"<A one="1" two = "2"/>"#).syntax();
        let element = root.first_child().unwrap();
        let attributes: Vec<_> = element
            .children()
            .filter(|c| c.kind() == SyntaxKind::ATTRIBUTE)
            .collect();
        assert_eq!(attributes.len(), 2);

        // Ranges never include trailing whitespace.
        assert_eq!(attributes[0].text().to_string(), r#"one="1""#);
        assert_eq!(attributes[1].text().to_string(), r#"two = "2""#);
    }
}
