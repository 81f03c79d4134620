//! # buildml-base
//!
//! Core library for MSBuild project-file parsing, semantic modeling, and
//! positional analysis. This is the semantic engine behind a language server
//! for MSBuild project XML: it turns raw source text into a
//! position-addressable node graph, cross-references that graph against an
//! externally-evaluated project, and parses the embedded
//! `$()`/`@()`/`%()` expression language.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! document  → per-document snapshots, workspace, provider fan-out
//!   ↓
//! msbuild   → evaluated-project objects, project locator, expressions
//!   ↓
//! sema      → semantic node graph, builder, paths, node locator
//!   ↓
//! xml       → logos lexer, error-tolerant XML parser, rowan CST
//!   ↓
//! base      → primitives (LineIndex, LineCol, TextRange)
//! ```
//!
//! The model is rebuilt wholesale on every full-text update; a snapshot,
//! once published, is immutable and safe to query from any number of
//! concurrent readers.

// ============================================================================
// MODULES (dependency order: base → xml → sema → msbuild → document)
// ============================================================================

/// Foundation types: LineIndex, LineCol, TextRange/TextSize
pub mod base;

/// Raw XML syntax layer: logos lexer, recovering parser, rowan CST
pub mod xml;

/// Semantic model: node graph, builder, paths, positional locator
pub mod sema;

/// MSBuild layer: evaluated objects, project locator, expressions
pub mod msbuild;

/// Document lifecycle: snapshots, workspace, provider fan-out
pub mod document;

// Re-export foundation types
pub use base::{LineCol, LineIndex, PositionError, TextRange, TextSize};
