//! The MSBuild expression mini-language.
//!
//! Attribute values and element text embed a small expression language:
//! property references `$(Name)`, item-group references
//! `@(Type->'transform', 'sep')`, item-metadata references `%(Type.Name)`,
//! semicolon-delimited lists, quoted strings, and the comparison/boolean
//! grammar used by `Condition` attributes.
//!
//! Parsing is synchronous and pure: [`parse_expression`] for the condition
//! grammar (a structured [`ExprError`] is a normal negative outcome, not a
//! failure), [`parse_simple_list`] for lists (total: any text is a list).
//! Trees are parsed per request from substrings of the semantic model and
//! are not cached.

mod node;
#[allow(clippy::module_inception)]
mod parser;

pub use node::{CompareOp, ExprId, ExprKind, ExprNode, ExprTree, FunctionKind, LogicalOp};
pub use parser::{ExprError, parse_expression, parse_simple_list};
