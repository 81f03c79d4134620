//! Recursive-descent parser for MSBuild expressions.
//!
//! Two entry points:
//! - [`parse_expression`]: the condition grammar (comparisons, `And` /
//!   `Or` / `Not`, groups, references, quoted strings, symbols). Failure
//!   is a structured [`ExprError`] carrying the failure offset and the
//!   grammar expectations at that point; "does not parse" is a normal
//!   negative outcome for callers.
//! - [`parse_simple_list`]: semicolon-delimited lists. Total: any text
//!   is a list; items keep their padding, separators are first-class
//!   nodes, and empty slots become zero-width virtual items.
//!
//! Missing names inside `$()`, `@()`, and `%()` become virtual symbol
//! nodes so completion has an insertion point to anchor to.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use thiserror::Error;

use super::node::{
    CompareOp, ExprId, ExprKind, ExprNodeData, ExprTree, FunctionKind, LogicalOp,
};

/// A structured parse failure: where it happened and what the grammar
/// would have accepted there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected:?} at offset {offset:?}")]
pub struct ExprError {
    /// Byte offset of the failure within the parsed text.
    pub offset: TextSize,
    /// The set of grammar expectations at the failure point.
    pub expected: Vec<&'static str>,
}

/// Parse a condition expression.
pub fn parse_expression(text: &str) -> Result<ExprTree, ExprError> {
    let mut parser = Parser::new(text);
    parser.skip_whitespace();
    let root = parser.parse_or()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(parser.error(&["end of input"]));
    }

    let mut tree = ExprTree {
        nodes: parser.nodes,
        root,
    };
    tree.connect_relationships();
    Ok(tree)
}

/// Parse a semicolon-delimited list. Never fails: any text is a list.
pub fn parse_simple_list(text: &str) -> ExprTree {
    let mut nodes = Vec::new();
    let mut children = Vec::new();

    let len = TextSize::of(text);
    let mut pos = 0usize;

    loop {
        let remainder = &text[pos..];
        let segment_len = remainder.find(';').unwrap_or(remainder.len());
        let segment_start = TextSize::from(pos as u32);
        let segment_end = TextSize::from((pos + segment_len) as u32);

        let item = if segment_len == 0 {
            alloc(
                &mut nodes,
                ExprKind::EmptyItem,
                TextRange::empty(segment_start),
                true,
                Vec::new(),
            )
        } else {
            alloc(
                &mut nodes,
                ExprKind::ListItem {
                    value: SmolStr::new(&remainder[..segment_len]),
                },
                TextRange::new(segment_start, segment_end),
                false,
                Vec::new(),
            )
        };
        children.push(item);

        pos += segment_len;
        if pos >= text.len() {
            break;
        }

        // The separator glyph itself.
        let separator_start = TextSize::from(pos as u32);
        let separator = alloc(
            &mut nodes,
            ExprKind::ListSeparator {
                separator_offset: 0,
            },
            TextRange::new(separator_start, separator_start + TextSize::from(1)),
            false,
            Vec::new(),
        );
        children.push(separator);
        pos += 1;

        if pos == text.len() {
            // A trailing separator leaves a virtual empty slot behind it.
            let empty = alloc(
                &mut nodes,
                ExprKind::EmptyItem,
                TextRange::empty(len),
                true,
                Vec::new(),
            );
            children.push(empty);
            break;
        }
    }

    let root = alloc(
        &mut nodes,
        ExprKind::SimpleList,
        TextRange::new(TextSize::from(0), len),
        false,
        children,
    );

    let mut tree = ExprTree { nodes, root };
    tree.connect_relationships();
    tree
}

fn alloc(
    nodes: &mut Vec<ExprNodeData>,
    kind: ExprKind,
    range: TextRange,
    is_virtual: bool,
    children: Vec<ExprId>,
) -> ExprId {
    let id = ExprId(nodes.len() as u32);
    nodes.push(ExprNodeData {
        kind,
        range,
        is_virtual,
        parent: None,
        prev_sibling: None,
        next_sibling: None,
        children,
    });
    id
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    nodes: Vec<ExprNodeData>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            nodes: Vec::new(),
        }
    }

    // =========================================================================
    // Input inspection
    // =========================================================================

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.text[self.pos..].starts_with(prefix)
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, prefix: &str) -> bool {
        if self.starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.bump();
        }
    }

    fn offset(&self) -> TextSize {
        TextSize::from(self.pos as u32)
    }

    fn error(&self, expected: &[&'static str]) -> ExprError {
        ExprError {
            offset: self.offset(),
            expected: expected.to_vec(),
        }
    }

    fn alloc(
        &mut self,
        kind: ExprKind,
        range: TextRange,
        is_virtual: bool,
        children: Vec<ExprId>,
    ) -> ExprId {
        alloc(&mut self.nodes, kind, range, is_virtual, children)
    }

    fn range_of(&self, id: ExprId) -> TextRange {
        self.nodes[id.index()].range
    }

    /// Consume an identifier matching `keyword` case-insensitively, when
    /// it is a whole word.
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let identifier = self.peek_identifier();
        if identifier.eq_ignore_ascii_case(keyword) && !identifier.is_empty() {
            self.pos += identifier.len();
            true
        } else {
            false
        }
    }

    /// The identifier starting at the current position, or `""`.
    fn peek_identifier(&self) -> &'a str {
        let rest = &self.text[self.pos..];
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if is_symbol_start(c) => {}
            _ => return "",
        }
        let end = chars
            .find(|&(_, c)| !is_symbol_continue(c))
            .map(|(index, _)| index)
            .unwrap_or(rest.len());
        &rest[..end]
    }

    // =========================================================================
    // Condition grammar (precedence: Or < And < Not < compare < operand)
    // =========================================================================

    fn parse_or(&mut self) -> Result<ExprId, ExprError> {
        let mut left = self.parse_and()?;
        loop {
            let saved = self.pos;
            self.skip_whitespace();
            if self.eat_keyword("Or") {
                self.skip_whitespace();
                let right = self.parse_and()?;
                let range =
                    TextRange::new(self.range_of(left).start(), self.range_of(right).end());
                left = self.alloc(
                    ExprKind::Logical { op: LogicalOp::Or },
                    range,
                    false,
                    vec![left, right],
                );
            } else {
                self.pos = saved;
                return Ok(left);
            }
        }
    }

    fn parse_and(&mut self) -> Result<ExprId, ExprError> {
        let mut left = self.parse_unary()?;
        loop {
            let saved = self.pos;
            self.skip_whitespace();
            if self.eat_keyword("And") {
                self.skip_whitespace();
                let right = self.parse_unary()?;
                let range =
                    TextRange::new(self.range_of(left).start(), self.range_of(right).end());
                left = self.alloc(
                    ExprKind::Logical { op: LogicalOp::And },
                    range,
                    false,
                    vec![left, right],
                );
            } else {
                self.pos = saved;
                return Ok(left);
            }
        }
    }

    fn parse_unary(&mut self) -> Result<ExprId, ExprError> {
        self.skip_whitespace();
        let start = self.offset();
        if self.eat_keyword("Not") {
            self.skip_whitespace();
            let operand = self.parse_unary()?;
            let range = TextRange::new(start, self.range_of(operand).end());
            return Ok(self.alloc(
                ExprKind::Logical { op: LogicalOp::Not },
                range,
                false,
                vec![operand],
            ));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<ExprId, ExprError> {
        let left = self.parse_operand()?;

        let saved = self.pos;
        self.skip_whitespace();
        let op = if self.eat("==") {
            CompareOp::Equality
        } else if self.eat("!=") {
            CompareOp::Inequality
        } else {
            self.pos = saved;
            return Ok(left);
        };

        self.skip_whitespace();
        let right = self.parse_operand()?;
        let range = TextRange::new(self.range_of(left).start(), self.range_of(right).end());
        Ok(self.alloc(ExprKind::Compare { op }, range, false, vec![left, right]))
    }

    fn parse_operand(&mut self) -> Result<ExprId, ExprError> {
        self.skip_whitespace();
        match self.peek() {
            Some('(') => self.parse_group(),
            Some('$') => self.parse_evaluation(),
            Some('@') => self.parse_item_group(),
            Some('%') => self.parse_metadata(),
            Some('\'') => self.parse_quoted_string(),
            Some(c) if is_symbol_start(c) => self.parse_symbol_or_call(),
            _ => Err(self.error(&[
                "'('",
                "'$('",
                "'@('",
                "'%('",
                "a quoted string",
                "a symbol",
            ])),
        }
    }

    fn parse_group(&mut self) -> Result<ExprId, ExprError> {
        let start = self.offset();
        self.bump(); // `(`
        self.skip_whitespace();
        let inner = self.parse_or()?;
        self.skip_whitespace();
        if !self.eat(")") {
            return Err(self.error(&["')'"]));
        }
        let range = TextRange::new(start, self.offset());
        Ok(self.alloc(ExprKind::Group, range, false, vec![inner]))
    }

    // =========================================================================
    // References
    // =========================================================================

    /// `$(Name)`, `$(Name())`, `$(Receiver.Method(...))`,
    /// `$([Static.Type]::Method(...))`. `$()` yields a virtual symbol.
    fn parse_evaluation(&mut self) -> Result<ExprId, ExprError> {
        let start = self.offset();
        self.bump(); // `$`
        if !self.eat("(") {
            return Err(self.error(&["'('"]));
        }
        self.skip_whitespace();

        let child = match self.peek() {
            Some(')') | None => {
                // An empty reference: a valid insertion point.
                let at = self.offset();
                self.alloc(
                    ExprKind::Symbol {
                        name: SmolStr::default(),
                    },
                    TextRange::empty(at),
                    true,
                    Vec::new(),
                )
            }
            Some('[') => self.parse_static_function_call()?,
            Some(c) if is_symbol_start(c) => self.parse_symbol_or_call()?,
            _ => return Err(self.error(&["a property name", "')'"])),
        };

        self.skip_whitespace();
        if !self.eat(")") {
            return Err(self.error(&["')'"]));
        }
        let range = TextRange::new(start, self.offset());
        Ok(self.alloc(ExprKind::Evaluation, range, false, vec![child]))
    }

    /// `[Static.Type]::Method(args)`
    fn parse_static_function_call(&mut self) -> Result<ExprId, ExprError> {
        let start = self.offset();
        self.bump(); // `[`
        let type_name = self.parse_dotted_name()?;
        if !self.eat("]") {
            return Err(self.error(&["']'"]));
        }
        let type_range = TextRange::new(start, self.offset());
        let receiver = self.alloc(
            ExprKind::Symbol { name: type_name },
            type_range,
            false,
            Vec::new(),
        );

        if !self.eat("::") {
            return Err(self.error(&["'::'"]));
        }
        let method = self.parse_identifier(&["a method name"])?;

        let mut children = vec![receiver];
        children.extend(self.parse_arguments()?);

        let range = TextRange::new(start, self.offset());
        Ok(self.alloc(
            ExprKind::FunctionCall {
                name: method,
                function: FunctionKind::Static,
            },
            range,
            false,
            children,
        ))
    }

    /// A symbol, a global call `Name(args)`, or an instance call
    /// `Receiver.Method(args)`.
    fn parse_symbol_or_call(&mut self) -> Result<ExprId, ExprError> {
        let start = self.offset();
        let name = self.parse_identifier(&["a symbol"])?;
        let symbol_range = TextRange::new(start, self.offset());

        if self.starts_with("(") {
            let children = self.parse_arguments()?;
            let range = TextRange::new(start, self.offset());
            return Ok(self.alloc(
                ExprKind::FunctionCall {
                    name,
                    function: FunctionKind::Global,
                },
                range,
                false,
                children,
            ));
        }

        if self.starts_with(".") {
            // Inside `$()` a dotted name must be a method call; a bare
            // `$(Foo.Bar)` does not parse.
            let receiver = self.alloc(
                ExprKind::Symbol { name },
                symbol_range,
                false,
                Vec::new(),
            );
            self.bump(); // `.`
            let method = self.parse_identifier(&["a method name"])?;
            if !self.starts_with("(") {
                return Err(self.error(&["'('"]));
            }
            let mut children = vec![receiver];
            children.extend(self.parse_arguments()?);
            let range = TextRange::new(start, self.offset());
            return Ok(self.alloc(
                ExprKind::FunctionCall {
                    name: method,
                    function: FunctionKind::Instance,
                },
                range,
                false,
                children,
            ));
        }

        Ok(self.alloc(ExprKind::Symbol { name }, symbol_range, false, Vec::new()))
    }

    /// `(arg, arg, ...)`: arguments are quoted strings, nested
    /// references, or symbols.
    fn parse_arguments(&mut self) -> Result<Vec<ExprId>, ExprError> {
        if !self.eat("(") {
            return Err(self.error(&["'('"]));
        }
        let mut arguments = Vec::new();

        self.skip_whitespace();
        if self.eat(")") {
            return Ok(arguments);
        }

        loop {
            self.skip_whitespace();
            let argument = match self.peek() {
                Some('\'') => self.parse_quoted_string()?,
                Some('$') => self.parse_evaluation()?,
                Some(c) if is_symbol_start(c) => self.parse_symbol(),
                _ => return Err(self.error(&["an argument", "')'"])),
            };
            arguments.push(argument);

            self.skip_whitespace();
            if self.eat(",") {
                continue;
            }
            if self.eat(")") {
                return Ok(arguments);
            }
            return Err(self.error(&["','", "')'"]));
        }
    }

    /// `@(Type)`, `@(Type->'transform')`, `@(Type->'transform', 'sep')`.
    /// `@()` yields a virtual symbol.
    fn parse_item_group(&mut self) -> Result<ExprId, ExprError> {
        let start = self.offset();
        self.bump(); // `@`
        if !self.eat("(") {
            return Err(self.error(&["'('"]));
        }
        self.skip_whitespace();

        let mut children = Vec::new();
        children.push(match self.peek() {
            Some(')') | None => {
                let at = self.offset();
                self.alloc(
                    ExprKind::Symbol {
                        name: SmolStr::default(),
                    },
                    TextRange::empty(at),
                    true,
                    Vec::new(),
                )
            }
            Some(c) if is_symbol_start(c) => self.parse_symbol(),
            _ => return Err(self.error(&["an item type", "')'"])),
        });

        self.skip_whitespace();
        if self.eat("->") {
            self.skip_whitespace();
            if self.peek() != Some('\'') {
                return Err(self.error(&["a quoted transform"]));
            }
            children.push(self.parse_quoted_string()?);

            self.skip_whitespace();
            if self.eat(",") {
                self.skip_whitespace();
                if self.peek() != Some('\'') {
                    return Err(self.error(&["a quoted separator"]));
                }
                children.push(self.parse_quoted_string()?);
                self.skip_whitespace();
            }
        }

        if !self.eat(")") {
            return Err(self.error(&["'->'", "','", "')'"]));
        }
        let range = TextRange::new(start, self.offset());
        Ok(self.alloc(ExprKind::ItemGroup, range, false, children))
    }

    /// `%(Name)` or `%(Type.Name)`. Empty slots become virtual symbols.
    fn parse_metadata(&mut self) -> Result<ExprId, ExprError> {
        let start = self.offset();
        self.bump(); // `%`
        if !self.eat("(") {
            return Err(self.error(&["'('"]));
        }
        self.skip_whitespace();

        let mut children = Vec::new();
        children.push(match self.peek() {
            Some(')') | None => {
                let at = self.offset();
                self.alloc(
                    ExprKind::Symbol {
                        name: SmolStr::default(),
                    },
                    TextRange::empty(at),
                    true,
                    Vec::new(),
                )
            }
            Some(c) if is_symbol_start(c) => self.parse_symbol(),
            _ => return Err(self.error(&["a metadata name", "')'"])),
        });

        self.skip_whitespace();
        if self.eat(".") {
            self.skip_whitespace();
            let name = match self.peek() {
                Some(c) if is_symbol_start(c) => self.parse_symbol(),
                _ => {
                    // `%(Foo.)`: the name is yet to be typed.
                    let at = self.offset();
                    self.alloc(
                        ExprKind::Symbol {
                            name: SmolStr::default(),
                        },
                        TextRange::empty(at),
                        true,
                        Vec::new(),
                    )
                }
            };
            children.push(name);
            self.skip_whitespace();
        }

        if !self.eat(")") {
            return Err(self.error(&["')'"]));
        }
        let range = TextRange::new(start, self.offset());
        Ok(self.alloc(ExprKind::Metadata, range, false, children))
    }

    /// `'...'` with embedded `$()` / `@()` / `%()` references.
    fn parse_quoted_string(&mut self) -> Result<ExprId, ExprError> {
        let start = self.offset();
        self.bump(); // `'`
        let mut children = Vec::new();

        loop {
            if self.at_end() {
                return Err(self.error(&["'''"]));
            }
            if self.eat("'") {
                break;
            }
            if self.starts_with("$(") {
                children.push(self.parse_evaluation()?);
                continue;
            }
            if self.starts_with("@(") {
                children.push(self.parse_item_group()?);
                continue;
            }
            if self.starts_with("%(") {
                children.push(self.parse_metadata()?);
                continue;
            }

            // A literal run up to the next quote or embedded reference.
            let run_start = self.offset();
            while let Some(c) = self.peek() {
                if c == '\''
                    || self.starts_with("$(")
                    || self.starts_with("@(")
                    || self.starts_with("%(")
                {
                    break;
                }
                self.bump();
            }
            let range = TextRange::new(run_start, self.offset());
            let text = &self.text[usize::from(run_start)..usize::from(self.offset())];
            children.push(self.alloc(
                ExprKind::StringContent {
                    text: SmolStr::new(text),
                },
                range,
                false,
                Vec::new(),
            ));
        }

        let range = TextRange::new(start, self.offset());
        Ok(self.alloc(ExprKind::QuotedString, range, false, children))
    }

    // =========================================================================
    // Terminals
    // =========================================================================

    fn parse_symbol(&mut self) -> ExprId {
        let start = self.offset();
        let identifier = self.peek_identifier();
        let name = SmolStr::new(identifier);
        self.pos += identifier.len();
        let range = TextRange::new(start, self.offset());
        self.alloc(ExprKind::Symbol { name }, range, false, Vec::new())
    }

    fn parse_identifier(&mut self, expected: &[&'static str]) -> Result<SmolStr, ExprError> {
        let identifier = self.peek_identifier();
        if identifier.is_empty() {
            return Err(self.error(expected));
        }
        let name = SmolStr::new(identifier);
        self.pos += identifier.len();
        Ok(name)
    }

    /// A dotted name like `Foo.Bar`, used for static type references.
    fn parse_dotted_name(&mut self) -> Result<SmolStr, ExprError> {
        let start = self.pos;
        self.parse_identifier(&["a type name"])?;
        while self.starts_with(".") {
            self.bump();
            self.parse_identifier(&["a type name"])?;
        }
        Ok(SmolStr::new(&self.text[start..self.pos]))
    }
}

fn is_symbol_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

fn is_symbol_continue(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_continue(c)
}

#[cfg(test)]
mod tests {
    use super::super::node::{ExprNode, FunctionKind};
    use super::*;

    fn parse(text: &str) -> ExprTree {
        parse_expression(text).unwrap_or_else(|e| panic!("{text:?} failed to parse: {e}"))
    }

    fn kind_name(node: &ExprNode<'_>) -> &'static str {
        match node.kind() {
            ExprKind::SimpleList => "list",
            ExprKind::ListItem { .. } => "item",
            ExprKind::ListSeparator { .. } => "separator",
            ExprKind::EmptyItem => "empty",
            ExprKind::Evaluation => "evaluation",
            ExprKind::ItemGroup => "item-group",
            ExprKind::Metadata => "metadata",
            ExprKind::QuotedString => "quoted",
            ExprKind::StringContent { .. } => "content",
            ExprKind::Symbol { .. } => "symbol",
            ExprKind::FunctionCall { .. } => "call",
            ExprKind::Compare { .. } => "compare",
            ExprKind::Logical { .. } => "logical",
            ExprKind::Group => "group",
        }
    }

    // =========================================================================
    // Property references
    // =========================================================================

    #[test]
    fn property_reference_spans_whole_text() {
        let tree = parse("$(Foo)");
        let root = tree.root();

        assert!(matches!(root.kind(), ExprKind::Evaluation));
        assert_eq!(root.range(), TextRange::new(0.into(), 6.into()));
        assert_eq!(root.name(), Some("Foo"));
        assert!(root.is_valid());
    }

    #[test]
    fn property_reference_tolerates_padding() {
        for text in ["$( Foo )", "$( Foo)", "$(Foo )"] {
            let tree = parse(text);
            assert_eq!(tree.root().name(), Some("Foo"), "for {text:?}");
        }
    }

    #[test]
    fn empty_property_reference_has_virtual_symbol() {
        let tree = parse("$()");
        let root = tree.root();
        let symbol = root.children().next().unwrap();

        assert!(symbol.is_virtual());
        assert_eq!(symbol.range(), TextRange::empty(2.into()));
        assert!(!root.is_valid());
    }

    #[test]
    fn property_function_calls() {
        let global = parse("$( Foo('Bar') )");
        let ExprKind::FunctionCall { name, function } =
            global.root().children().next().unwrap().kind()
        else {
            panic!("expected a function call");
        };
        assert_eq!(name.as_str(), "Foo");
        assert_eq!(*function, FunctionKind::Global);

        let instance = parse("$(Foo.Bar('Baz'))");
        let ExprKind::FunctionCall { name, function } =
            instance.root().children().next().unwrap().kind()
        else {
            panic!("expected a function call");
        };
        assert_eq!(name.as_str(), "Bar");
        assert_eq!(*function, FunctionKind::Instance);

        let static_call = parse("$([Foo.Bar]::Baz('Bonk'))");
        let ExprKind::FunctionCall { name, function } =
            static_call.root().children().next().unwrap().kind()
        else {
            panic!("expected a function call");
        };
        assert_eq!(name.as_str(), "Baz");
        assert_eq!(*function, FunctionKind::Static);
    }

    #[test]
    fn bad_property_references_fail_structurally() {
        for text in ["$(1Foo)", "$(Foo.Bar)"] {
            let error = parse_expression(text).unwrap_err();
            assert!(!error.expected.is_empty(), "for {text:?}");
        }
    }

    // =========================================================================
    // Item groups and metadata
    // =========================================================================

    #[test]
    fn item_group_reference() {
        for text in ["@(Foo)", "@( Foo )", "@( Foo)", "@(Foo )"] {
            let tree = parse(text);
            let root = tree.root();
            assert!(matches!(root.kind(), ExprKind::ItemGroup), "for {text:?}");
            assert_eq!(root.name(), Some("Foo"), "for {text:?}");
        }
    }

    #[test]
    fn empty_item_group_is_virtual_and_invalid() {
        let tree = parse("@()");
        let root = tree.root();
        assert!(root.children().next().unwrap().is_virtual());
        assert!(!root.is_valid());
    }

    #[test]
    fn item_group_transform_with_nested_metadata() {
        let tree = parse("@(Foo->'%(Bar)')");
        let root = tree.root();

        assert!(matches!(root.kind(), ExprKind::ItemGroup));
        assert_eq!(root.name(), Some("Foo"));

        let metadata = root
            .descendants()
            .find(|n| matches!(n.kind(), ExprKind::Metadata))
            .expect("nested metadata reference");
        assert_eq!(metadata.name(), Some("Bar"));
    }

    #[test]
    fn item_group_transform_with_separator() {
        let tree = parse("@(Foo->'%(Bar)', ';')");
        let root = tree.root();

        let quoted: Vec<_> = root
            .children()
            .filter(|c| matches!(c.kind(), ExprKind::QuotedString))
            .collect();
        assert_eq!(quoted.len(), 2);
    }

    #[test]
    fn bad_item_groups_fail() {
        for text in ["@(1Foo)", "@(Foo.Bar)", "@(Foo->)"] {
            assert!(parse_expression(text).is_err(), "{text:?} should fail");
        }
    }

    #[test]
    fn metadata_references() {
        let unqualified = parse("%(Foo)");
        assert_eq!(unqualified.root().name(), Some("Foo"));
        assert_eq!(unqualified.root().item_type(), None);

        let qualified = parse("%( Foo.Bar )");
        assert_eq!(qualified.root().name(), Some("Bar"));
        assert_eq!(qualified.root().item_type(), Some("Foo"));
    }

    #[test]
    fn metadata_with_trailing_dot_has_virtual_name() {
        let tree = parse("%(Foo.)");
        let root = tree.root();
        assert_eq!(root.item_type(), Some("Foo"));
        let last = root.children().last().unwrap();
        assert!(last.is_virtual());
        assert!(!root.is_valid());
    }

    // =========================================================================
    // Conditions
    // =========================================================================

    #[test]
    fn root_kind_classification() {
        let cases = [
            ("ABC", "symbol"),
            ("'ABC'", "quoted"),
            ("$(ABC)", "evaluation"),
            ("Not ABC", "logical"),
            ("ABC And DEF", "logical"),
            ("'ABC' != 'DEF'", "compare"),
            ("(Not ABC)", "group"),
            ("ABC And (Not (DEF Or GHI))", "logical"),
        ];
        for (text, expected) in cases {
            let tree = parse(text);
            assert_eq!(kind_name(&tree.root()), expected, "for {text:?}");
        }
    }

    #[test]
    fn comparison_operands_and_operator() {
        let tree = parse("'$(Configuration)' == 'Debug'");
        let root = tree.root();
        let ExprKind::Compare { op } = root.kind() else {
            panic!("expected a comparison");
        };
        assert_eq!(*op, CompareOp::Equality);

        let children: Vec<_> = root.children().collect();
        assert_eq!(children.len(), 2);
        assert!(matches!(children[0].kind(), ExprKind::QuotedString));

        // The embedded property reference is reachable from the left side.
        let embedded = children[0]
            .children()
            .find(|c| matches!(c.kind(), ExprKind::Evaluation))
            .expect("embedded evaluation");
        assert_eq!(embedded.name(), Some("Configuration"));
    }

    #[test]
    fn inequality_without_spaces() {
        let tree = parse("'ABC'!='DEF'Or'GHI'=='JKL'");
        let ExprKind::Logical { op } = tree.root().kind() else {
            panic!("expected a logical expression");
        };
        assert_eq!(*op, LogicalOp::Or);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let tree = parse("ABC and DEF or Not GHI");
        assert!(matches!(
            tree.root().kind(),
            ExprKind::Logical { op: LogicalOp::Or }
        ));
    }

    #[test]
    fn unterminated_quoted_string_fails_with_offset() {
        let error = parse_expression("'ABC").unwrap_err();
        assert_eq!(error.offset, TextSize::from(4));
    }

    #[test]
    fn trailing_garbage_is_an_error() {
        let error = parse_expression("ABC )").unwrap_err();
        assert_eq!(error.expected, vec!["end of input"]);
    }

    #[test]
    fn error_display_is_informative() {
        let error = parse_expression("$(").unwrap_err();
        let message = error.to_string();
        assert!(message.contains("offset"), "message: {message}");
    }

    // =========================================================================
    // Relationships and positional queries
    // =========================================================================

    #[test]
    fn relationships_are_connected() {
        let tree = parse("'A' == 'B'");
        let root = tree.root();
        let children: Vec<_> = root.children().collect();

        assert_eq!(children[0].parent().map(|p| p.id()), Some(root.id()));
        assert_eq!(
            children[0].next_sibling().map(|n| n.id()),
            Some(children[1].id())
        );
        assert_eq!(
            children[1].prev_sibling().map(|n| n.id()),
            Some(children[0].id())
        );
    }

    #[test]
    fn find_deepest_node_narrows_to_leaf() {
        let text = "@(Foo->'%(Bar)')";
        let tree = parse(text);
        let offset = TextSize::from(text.find("Bar").unwrap() as u32 + 1);

        let deepest = tree.root().find_deepest_node_at(offset).unwrap();
        assert!(matches!(deepest.kind(), ExprKind::Symbol { .. }));
        assert_eq!(deepest.name(), Some("Bar"));
    }

    #[test]
    fn find_deepest_node_returns_self_when_no_child_covers() {
        let tree = parse("$(Foo)");
        let root = tree.root();
        // Offset 1 is on `(`: inside the evaluation, on no child.
        let node = root.find_deepest_node_at(TextSize::from(1)).unwrap();
        assert_eq!(node.id(), root.id());
        // Outside the root entirely.
        assert!(root.find_deepest_node_at(TextSize::from(40)).is_none());
    }

    #[test]
    fn virtual_nodes_match_only_their_exact_offset() {
        let tree = parse("$()");
        let root = tree.root();

        let at_insertion_point = root.find_deepest_node_at(TextSize::from(2)).unwrap();
        assert!(at_insertion_point.is_virtual());

        let elsewhere = root.find_deepest_node_at(TextSize::from(1)).unwrap();
        assert!(!elsewhere.is_virtual());
    }

    // =========================================================================
    // Simple lists
    // =========================================================================

    #[test]
    fn list_items_and_separators_are_first_class() {
        let tree = parse_simple_list("A;B;C");
        let kinds: Vec<&str> = tree.root().children().map(|c| kind_name(&c)).collect();
        assert_eq!(
            kinds,
            vec!["item", "separator", "item", "separator", "item"]
        );
    }

    #[test]
    fn list_items_keep_padding() {
        let tree = parse_simple_list(" A ; B");
        let values: Vec<String> = tree
            .root()
            .children()
            .filter_map(|c| match c.kind() {
                ExprKind::ListItem { value } => Some(value.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![" A ", " B"]);
    }

    #[test]
    fn empty_segments_become_virtual_items() {
        let tree = parse_simple_list(";A;;B;");
        let kinds: Vec<&str> = tree.root().children().map(|c| kind_name(&c)).collect();
        assert_eq!(
            kinds,
            vec![
                "empty", "separator", "item", "separator", "empty", "separator", "item",
                "separator", "empty"
            ]
        );

        for child in tree.root().children() {
            if matches!(child.kind(), ExprKind::EmptyItem) {
                assert!(child.is_virtual());
                assert!(child.range().is_empty());
            }
        }
    }

    #[test]
    fn list_tie_break_at_separator() {
        let text = "A;B;C";
        let tree = parse_simple_list(text);
        let list = tree.root();

        // On the first `;` (offset 1): the preceding item.
        let item = list.find_item_at(TextSize::from(1)).unwrap();
        assert_eq!(item.kind(), &ExprKind::ListItem { value: "A".into() });

        // Immediately after it (offset 2): the following item.
        let item = list.find_item_at(TextSize::from(2)).unwrap();
        assert_eq!(item.kind(), &ExprKind::ListItem { value: "B".into() });
    }

    #[test]
    fn list_find_item_inside_item() {
        let text = "ABC;DEF";
        let tree = parse_simple_list(text);
        let list = tree.root();

        let item = list.find_item_at(TextSize::from(3)).unwrap();
        assert_eq!(item.kind(), &ExprKind::ListItem { value: "ABC".into() });
        let item = list.find_item_at(TextSize::from(4)).unwrap();
        assert_eq!(item.kind(), &ExprKind::ListItem { value: "DEF".into() });
    }

    #[test]
    fn whole_text_is_one_item_without_separators() {
        let tree = parse_simple_list("OnlyItem");
        let children: Vec<_> = tree.root().children().collect();
        assert_eq!(children.len(), 1);
        assert_eq!(
            children[0].kind(),
            &ExprKind::ListItem {
                value: "OnlyItem".into()
            }
        );
    }
}
