//! Evaluated objects cross-referenced onto the semantic model.
//!
//! A [`ProjectObject`] pairs one evaluated entity with the semantic node
//! that declares it. Used/unused (for properties and item groups) and
//! resolved/unresolved (for imports) are distinct kinds: consumers treat
//! a condition-suppressed declaration very differently from a live one.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::sema::NodeId;

use super::evaluated::{EvaluatedImport, EvaluatedItem, EvaluatedProperty, EvaluatedTarget};

/// The kind of project object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectObjectKind {
    Target,
    Property,
    /// A property declaration whose condition evaluated to false (or that
    /// was overridden).
    UnusedProperty,
    ItemGroup,
    /// An item declaration with no live evaluated instances.
    UnusedItemGroup,
    Import,
    /// An import whose condition evaluated to false or whose target was
    /// not found.
    UnresolvedImport,
    SdkImport,
    UnresolvedSdkImport,
}

/// The entity behind a [`ProjectObject`].
#[derive(Debug, Clone)]
pub enum ProjectObjectData {
    Target(EvaluatedTarget),
    Property(EvaluatedProperty),
    ItemGroup(EvaluatedItem),
    Import(EvaluatedImport),
}

/// An evaluated entity, located in the document.
#[derive(Debug, Clone)]
pub struct ProjectObject {
    /// The semantic node the entity is declared by (an element, or the
    /// `Sdk` attribute for SDK-style imports).
    pub node: NodeId,
    /// The declaring node's range; [`ProjectLocator::find`] matches
    /// against this.
    ///
    /// [`ProjectLocator::find`]: super::ProjectLocator::find
    pub range: TextRange,
    pub data: ProjectObjectData,
}

impl ProjectObject {
    pub fn kind(&self) -> ProjectObjectKind {
        match &self.data {
            ProjectObjectData::Target(_) => ProjectObjectKind::Target,
            ProjectObjectData::Property(property) => {
                if property.used {
                    ProjectObjectKind::Property
                } else {
                    ProjectObjectKind::UnusedProperty
                }
            }
            ProjectObjectData::ItemGroup(item) => {
                if item.used {
                    ProjectObjectKind::ItemGroup
                } else {
                    ProjectObjectKind::UnusedItemGroup
                }
            }
            ProjectObjectData::Import(import) => match (import.is_sdk(), import.resolved) {
                (true, true) => ProjectObjectKind::SdkImport,
                (true, false) => ProjectObjectKind::UnresolvedSdkImport,
                (false, true) => ProjectObjectKind::Import,
                (false, false) => ProjectObjectKind::UnresolvedImport,
            },
        }
    }

    /// The object's name: target/property name, item type, import spec or
    /// SDK name.
    pub fn name(&self) -> SmolStr {
        match &self.data {
            ProjectObjectData::Target(target) => target.name.clone(),
            ProjectObjectData::Property(property) => property.name.clone(),
            ProjectObjectData::ItemGroup(item) => item.item_type.clone(),
            ProjectObjectData::Import(import) => import
                .sdk
                .clone()
                .or_else(|| import.project.as_deref().map(SmolStr::new))
                .unwrap_or_default(),
        }
    }

    /// Whether the object's range contains the given offset (closed at
    /// both ends, like node lookup).
    pub fn contains(&self, offset: TextSize) -> bool {
        self.range.start() <= offset && offset <= self.range.end()
    }

    /// Whether another object describes the same underlying evaluated
    /// entity (used to tell harmless re-registration from a genuine
    /// duplicate).
    pub fn is_same_underlying(&self, other: &ProjectObject) -> bool {
        match (&self.data, &other.data) {
            (ProjectObjectData::Target(a), ProjectObjectData::Target(b)) => a == b,
            (ProjectObjectData::Property(a), ProjectObjectData::Property(b)) => a == b,
            (ProjectObjectData::ItemGroup(a), ProjectObjectData::ItemGroup(b)) => a == b,
            (ProjectObjectData::Import(a), ProjectObjectData::Import(b)) => a == b,
            _ => false,
        }
    }
}
