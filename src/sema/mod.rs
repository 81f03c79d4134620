//! Semantic model for MSBuild project XML.
//!
//! The [`xml`](crate::xml) layer gives a lossless CST; this module derives
//! the model the language-server features actually query:
//!
//! - [`SemanticModel`]: an arena of classified nodes (element, attribute,
//!   text, synthesized whitespace) with document-order sibling links. The
//!   model is total: every input text, however malformed, produces one, with
//!   broken markup carried as invalid-variant nodes.
//! - [`XmlPath`]: ancestor-chain descriptors with prefix, suffix, and
//!   parent/child matching (wildcard-aware).
//! - [`XmlLocator`]: position → innermost node lookup plus an anatomical
//!   classification ([`LocationFlags`]) of what sits at that position.
//!
//! Nodes are addressed by [`NodeId`]; parent, sibling, and child links are
//! ids into the arena, so the graph is cycle-free by construction and a
//! published model is immutable.

mod builder;
mod locator;
mod node;
mod path;

pub use builder::build_model;
pub use locator::{LocationFlags, XmlLocation, XmlLocator};
pub use node::{
    Attribute, Element, ElementForm, ElementRecovery, Node, NodeId, NodeKind, SemanticModel,
};
pub use path::{PathSegment, XmlPath};
