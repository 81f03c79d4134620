//! Expression AST: arena, node kinds, and positional queries.
//!
//! Nodes live in an [`ExprTree`] arena addressed by [`ExprId`]; parent and
//! sibling references are ids assigned by a relationship pass after
//! parsing. Offsets are absolute within the parsed text.
//!
//! A node can be *virtual*: a zero-width placeholder marking a valid
//! insertion point with no corresponding source text (e.g. the missing
//! name in `$()`). Virtual nodes match position queries ONLY by exact
//! equality with their start offset: they have no extent, so the usual
//! half-open interval test would never (or wrongly) match them.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

/// Index of a node in an [`ExprTree`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub(crate) u32);

impl ExprId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Comparison operators recognized in condition expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `==`
    Equality,
    /// `!=`
    Inequality,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equality => "==",
            Self::Inequality => "!=",
        }
    }
}

/// Logical operators recognized in condition expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

/// How a function is invoked inside a property reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// `$(Exists(...))`
    Global,
    /// `$(Foo.Bar(...))`
    Instance,
    /// `$([Static.Type]::Method(...))`
    Static,
}

/// Well-known kinds of expression nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    /// A semicolon-delimited list; children are items and separators.
    SimpleList,
    /// One list item; the value is the segment text as written.
    ListItem { value: SmolStr },
    /// A list separator; the glyph's offset within the node is
    /// `separator_offset` (zero unless padding is absorbed).
    ListSeparator { separator_offset: u32 },
    /// A zero-width placeholder for an empty list slot.
    EmptyItem,
    /// A property reference `$(...)`; one child (symbol or function call).
    Evaluation,
    /// An item-group reference `@(...)`; children: type symbol, then the
    /// optional transform and separator quoted strings.
    ItemGroup,
    /// An item-metadata reference `%(...)`; children: optional item-type
    /// symbol, then the metadata name symbol.
    Metadata,
    /// A single-quoted string; children interleave literal runs with
    /// embedded references.
    QuotedString,
    /// A literal run inside a quoted string.
    StringContent { text: SmolStr },
    /// A bare (possibly dotted) name.
    Symbol { name: SmolStr },
    /// A function call inside a property reference.
    FunctionCall {
        name: SmolStr,
        function: FunctionKind,
    },
    /// A comparison; children: left and right operands.
    Compare { op: CompareOp },
    /// A logical combination; one child for `Not`, two for `And`/`Or`.
    Logical { op: LogicalOp },
    /// A parenthesized sub-expression; one child.
    Group,
}

#[derive(Debug, Clone)]
pub(crate) struct ExprNodeData {
    pub(crate) kind: ExprKind,
    pub(crate) range: TextRange,
    pub(crate) is_virtual: bool,
    pub(crate) parent: Option<ExprId>,
    pub(crate) prev_sibling: Option<ExprId>,
    pub(crate) next_sibling: Option<ExprId>,
    pub(crate) children: Vec<ExprId>,
}

/// A parsed expression tree.
#[derive(Debug, Clone)]
pub struct ExprTree {
    pub(crate) nodes: Vec<ExprNodeData>,
    pub(crate) root: ExprId,
}

impl ExprTree {
    /// The tree's root node.
    pub fn root(&self) -> ExprNode<'_> {
        self.node(self.root)
    }

    /// Typed handle for a node id.
    pub fn node(&self, id: ExprId) -> ExprNode<'_> {
        ExprNode { tree: self, id }
    }

    /// Assign parent and sibling links throughout the tree. Called once by
    /// the parser after construction.
    pub(crate) fn connect_relationships(&mut self) {
        let mut stack = vec![self.root];
        while let Some(parent) = stack.pop() {
            let children = self.nodes[parent.index()].children.clone();
            let mut previous: Option<ExprId> = None;
            for &child in &children {
                let data = &mut self.nodes[child.index()];
                data.parent = Some(parent);
                data.prev_sibling = previous;
                if let Some(previous) = previous {
                    self.nodes[previous.index()].next_sibling = Some(child);
                }
                previous = Some(child);
                stack.push(child);
            }
        }
    }
}

/// A borrowed view of one expression node.
#[derive(Debug, Clone, Copy)]
pub struct ExprNode<'a> {
    tree: &'a ExprTree,
    id: ExprId,
}

impl<'a> ExprNode<'a> {
    pub fn id(&self) -> ExprId {
        self.id
    }

    pub fn kind(&self) -> &'a ExprKind {
        &self.data().kind
    }

    /// Absolute range within the parsed text.
    pub fn range(&self) -> TextRange {
        self.data().range
    }

    pub fn start(&self) -> TextSize {
        self.data().range.start()
    }

    pub fn end(&self) -> TextSize {
        self.data().range.end()
    }

    /// Whether this node is a zero-width insertion-point placeholder.
    pub fn is_virtual(&self) -> bool {
        self.data().is_virtual
    }

    /// Whether the expression at this node is complete.
    ///
    /// Structurally recovered shapes (a reference missing its name, a
    /// metadata reference with an empty name) parse but are not valid.
    pub fn is_valid(&self) -> bool {
        match self.kind() {
            ExprKind::Evaluation => {
                self.children().count() == 1 && self.children().all(|c| !c.is_virtual())
            }
            ExprKind::ItemGroup | ExprKind::Metadata => self
                .name()
                .is_some_and(|name| !name.trim().is_empty()),
            _ => !self.is_virtual(),
        }
    }

    /// The referenced name, for nodes that carry one: the symbol's name,
    /// the item-group's type, the metadata name, the function name.
    pub fn name(&self) -> Option<&'a str> {
        match self.kind() {
            ExprKind::Symbol { name } => Some(name.as_str()),
            ExprKind::FunctionCall { name, .. } => Some(name.as_str()),
            ExprKind::ItemGroup => self
                .children()
                .find_map(|c| match c.kind() {
                    ExprKind::Symbol { name } => Some(name.as_str()),
                    _ => None,
                }),
            ExprKind::Metadata => {
                let symbols: Vec<&str> = self
                    .children()
                    .filter_map(|c| match c.kind() {
                        ExprKind::Symbol { name } => Some(name.as_str()),
                        _ => None,
                    })
                    .collect();
                symbols.last().copied()
            }
            ExprKind::Evaluation => self.children().next().and_then(|c| c.name()),
            _ => None,
        }
    }

    /// The item type of a metadata reference (`%(Type.Name)`), when given.
    pub fn item_type(&self) -> Option<&'a str> {
        match self.kind() {
            ExprKind::Metadata => {
                let symbols: Vec<&str> = self
                    .children()
                    .filter_map(|c| match c.kind() {
                        ExprKind::Symbol { name } => Some(name.as_str()),
                        _ => None,
                    })
                    .collect();
                if symbols.len() > 1 {
                    Some(symbols[0])
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn parent(&self) -> Option<ExprNode<'a>> {
        self.data().parent.map(|id| self.tree.node(id))
    }

    pub fn next_sibling(&self) -> Option<ExprNode<'a>> {
        self.data().next_sibling.map(|id| self.tree.node(id))
    }

    pub fn prev_sibling(&self) -> Option<ExprNode<'a>> {
        self.data().prev_sibling.map(|id| self.tree.node(id))
    }

    pub fn children(&self) -> impl Iterator<Item = ExprNode<'a>> + use<'a> {
        let tree = self.tree;
        self.data().children.iter().map(move |&id| tree.node(id))
    }

    /// Ancestor nodes, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = ExprNode<'a>> + use<'a> {
        let mut current = *self;
        std::iter::from_fn(move || {
            let parent = current.parent()?;
            current = parent;
            Some(parent)
        })
    }

    /// Descendant nodes, depth-first.
    pub fn descendants(&self) -> impl Iterator<Item = ExprNode<'a>> + use<'a> {
        let tree = self.tree;
        let mut stack: Vec<ExprId> = self.data().children.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let node = tree.node(id);
            stack.extend(tree.nodes[id.index()].children.iter().rev());
            Some(node)
        })
    }

    /// Find the most-deeply-nested node at the given offset, recursively
    /// narrowing from this node to the nearest covering child.
    ///
    /// Returns `None` only when the offset lies outside this node; inside,
    /// it always returns at least the node it was called on. Virtual
    /// children match only by exact equality with their start offset.
    pub fn find_deepest_node_at(&self, offset: TextSize) -> Option<ExprNode<'a>> {
        if offset < self.start() || offset > self.end() {
            return None;
        }

        let covering_child = self.children().find(|child| {
            if child.is_virtual() {
                return offset == child.start();
            }
            !child.range().is_empty() && child.start() <= offset && offset < child.end()
        });

        match covering_child {
            Some(child) => child.find_deepest_node_at(offset).or(Some(*self)),
            None => Some(*self),
        }
    }

    /// Find the list item at (or closest to) the given offset within a
    /// simple list.
    ///
    /// The tie-break at separators is load-bearing for completion: a
    /// position on or before a separator glyph selects the *preceding*
    /// item (that is what an edit there replaces); a position strictly
    /// after it selects the *following* item.
    pub fn find_item_at(&self, offset: TextSize) -> Option<ExprNode<'a>> {
        if !matches!(self.kind(), ExprKind::SimpleList) {
            return None;
        }
        if offset < self.start() || offset > self.end() {
            return None;
        }

        let last_starting_before = self
            .children()
            .filter(|child| child.start() <= offset)
            .last()?;

        match last_starting_before.kind() {
            ExprKind::ListItem { .. } | ExprKind::EmptyItem => Some(last_starting_before),
            ExprKind::ListSeparator { separator_offset } => {
                let separator_position =
                    last_starting_before.start() + TextSize::from(*separator_offset);
                if offset <= separator_position {
                    last_starting_before.prev_sibling()
                } else {
                    last_starting_before.next_sibling()
                }
            }
            _ => None,
        }
    }

    fn data(&self) -> &'a ExprNodeData {
        &self.tree.nodes[self.id.index()]
    }
}
