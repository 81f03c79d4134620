//! Input contract for the external project evaluation engine.
//!
//! The engine evaluates a project (resolving imports and SDKs, applying
//! conditions, expanding wildcards and property functions) and reports the
//! result as the plain data in this module. Everything here is opaque to
//! this crate: values are carried, never computed.
//!
//! Declaration positions at this boundary are **one-based** line/column
//! pairs ([`DeclarationSite`]); they are converted to byte offsets at the
//! edge, inside [`ProjectLocator`](super::ProjectLocator).

use std::path::PathBuf;

use smol_str::SmolStr;

use crate::base::LineCol;

/// Where an evaluated entity was declared: file plus one-based line/column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclarationSite {
    pub file: PathBuf,
    /// One-based line.
    pub line: u32,
    /// One-based column.
    pub column: u32,
}

impl DeclarationSite {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// The site's position in the crate-internal zero-based convention.
    pub fn position(&self) -> LineCol {
        LineCol::from_one_based(self.line, self.column)
    }
}

/// An evaluated target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedTarget {
    pub name: SmolStr,
    pub site: DeclarationSite,
}

/// An evaluated (or condition-suppressed) property declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedProperty {
    pub name: SmolStr,
    /// The raw (unexpanded) value as written.
    pub raw_value: String,
    /// The evaluated value, when the declaration is used.
    pub value: Option<String>,
    pub site: DeclarationSite,
    /// Whether the declaration survived its condition (an overridden or
    /// condition-suppressed declaration is "unused").
    pub used: bool,
}

/// One evaluated item produced by an item declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInstance {
    /// The include spec as written (may be a wildcard).
    pub include: String,
    /// The evaluated include (one concrete file/value).
    pub evaluated_include: String,
}

/// An evaluated item declaration.
///
/// One declaring element may expand to many [`ItemInstance`]s (e.g. a
/// wildcard include); they stay grouped under the single declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedItem {
    /// The item type (the element name, e.g. `Compile`).
    pub item_type: SmolStr,
    pub instances: Vec<ItemInstance>,
    pub site: DeclarationSite,
    /// Whether any evaluated instance is live after conditions.
    pub used: bool,
}

/// An evaluated import declaration (plain or SDK-style).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedImport {
    /// The `Project` attribute value as written, when present.
    pub project: Option<String>,
    /// The `Sdk` name the import binds through, when SDK-style.
    pub sdk: Option<SmolStr>,
    /// The files the import resolved to (empty when unresolved).
    pub resolved_paths: Vec<PathBuf>,
    pub site: DeclarationSite,
    /// Whether the import resolved (its condition held and the target was
    /// found).
    pub resolved: bool,
}

impl EvaluatedImport {
    /// Whether the import binds through an SDK name attribute rather than a
    /// project path.
    pub fn is_sdk(&self) -> bool {
        self.sdk.as_ref().is_some_and(|sdk| !sdk.is_empty())
    }
}

/// The evaluation engine's view of one project, filtered and regrouped by
/// the [`ProjectLocator`](super::ProjectLocator).
#[derive(Debug, Clone, Default)]
pub struct EvaluatedProject {
    /// Full path of the project file this evaluation describes.
    pub file: PathBuf,
    pub targets: Vec<EvaluatedTarget>,
    pub properties: Vec<EvaluatedProperty>,
    pub items: Vec<EvaluatedItem>,
    pub imports: Vec<EvaluatedImport>,
}
