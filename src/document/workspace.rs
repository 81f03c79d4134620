//! The set of open documents.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::msbuild::EvaluatedProject;

use super::snapshot::Document;

/// All open documents, keyed by project-file path.
///
/// Iteration order is insertion order, so operations that touch every
/// document (diagnostics publishing, workspace symbols) behave
/// deterministically.
#[derive(Default)]
pub struct Workspace {
    documents: RwLock<IndexMap<PathBuf, Arc<Document>>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or re-open) a document with its full text.
    pub fn open(&self, path: impl Into<PathBuf>, text: &str) -> Arc<Document> {
        let path = path.into();
        let document = Arc::new(Document::open(text));
        self.documents.write().insert(path, document.clone());
        document
    }

    /// Apply a full-text update to an open document. Returns `false` when
    /// the document is not open.
    pub fn update(&self, path: &Path, text: &str) -> bool {
        match self.get(path) {
            Some(document) => {
                document.update(text);
                true
            }
            None => {
                debug!(path = %path.display(), "update for a document that is not open");
                false
            }
        }
    }

    /// Attach evaluation-engine output to an open document.
    pub fn apply_project(&self, path: &Path, project: &EvaluatedProject) -> bool {
        match self.get(path) {
            Some(document) => {
                document.apply_project(project);
                true
            }
            None => false,
        }
    }

    /// Close a document, discarding its model.
    pub fn close(&self, path: &Path) {
        self.documents.write().shift_remove(path);
    }

    pub fn get(&self, path: &Path) -> Option<Arc<Document>> {
        self.documents.read().get(path).cloned()
    }

    pub fn is_open(&self, path: &Path) -> bool {
        self.documents.read().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Paths of all open documents, in open order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.documents.read().keys().cloned().collect()
    }
}
