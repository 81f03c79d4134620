//! Raw XML syntax layer.
//!
//! This module provides a lossless, error-tolerant parser for MSBuild
//! project XML using:
//! - **logos** for fast lexing (separate content-mode and tag-mode token
//!   sets, switched with `morph`)
//! - **rowan** for the CST (Concrete Syntax Tree)
//!
//! The tree is lossless: every byte of the input, including whitespace and
//! malformed fragments, ends up in the tree, so byte offsets in the CST are
//! byte offsets in the source. Parsing NEVER fails: any input, including
//! text mid-edit (unterminated tags, missing names, stray `<`), produces a
//! `DOCUMENT` node covering the full text plus a list of recoverable
//! [`SyntaxError`]s.
//!
//! The semantic layer ([`crate::sema`]) consumes this tree; nothing above
//! it touches tokens directly.

mod ast;
mod lexer;
#[allow(clippy::module_inception)]
mod parser;
mod syntax_kind;

pub use ast::{XmlAttribute, XmlContent, XmlDocument, XmlElement, XmlTag};
pub use lexer::{Token, tokenize};
pub use parser::{Parse, SyntaxError, parse};
pub use syntax_kind::{SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, XmlLanguage};

/// Re-export rowan types for convenience
pub use rowan::GreenNode;
