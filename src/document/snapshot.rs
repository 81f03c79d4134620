//! Per-document state: immutable snapshots behind a replace-and-swap lock.

use std::sync::Arc;

use parking_lot::RwLock;
use text_size::{TextRange, TextSize};

use crate::base::{LineIndex, PositionError};
use crate::msbuild::{DeclarationSite, EvaluatedProject, ProjectLocator, ProjectObject};
use crate::sema::{SemanticModel, XmlLocation, XmlLocator, build_model};
use crate::xml::{SyntaxError, parse};

/// One fully-built, immutable view of a document version.
///
/// Everything a query needs lives here: the source text, the position
/// index, the semantic model with its node locator, and (when the
/// evaluation engine has reported in) the project-object cross-reference.
pub struct DocumentSnapshot {
    text: Arc<str>,
    line_index: LineIndex,
    syntax_errors: Vec<SyntaxError>,
    locator: XmlLocator,
    project: Option<ProjectLocator>,
}

impl DocumentSnapshot {
    /// Build a snapshot from full document text, with the evaluation
    /// engine's output when available.
    pub fn build(text: &str, project: Option<&EvaluatedProject>) -> Self {
        let line_index = LineIndex::new(text);
        let parse = parse(text);
        let syntax_errors = parse.errors.clone();
        let locator = XmlLocator::new(build_model(&parse));
        let project =
            project.map(|project| ProjectLocator::new(project, &locator, &line_index));

        Self {
            text: Arc::from(text),
            line_index,
            syntax_errors,
            locator,
            project,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Errors the XML parser recovered from.
    pub fn syntax_errors(&self) -> &[SyntaxError] {
        &self.syntax_errors
    }

    pub fn model(&self) -> &SemanticModel {
        self.locator.model()
    }

    pub fn locator(&self) -> &XmlLocator {
        &self.locator
    }

    /// The project-object cross-reference, when the evaluation engine has
    /// reported for this document.
    pub fn project(&self) -> Option<&ProjectLocator> {
        self.project.as_ref()
    }

    /// Inspect a position: innermost node plus anatomical classification.
    pub fn inspect(&self, offset: TextSize) -> Option<XmlLocation<'_>> {
        self.locator.inspect(offset)
    }

    /// Find the evaluated project object at a position.
    pub fn find_object(&self, offset: TextSize) -> Option<&ProjectObject> {
        self.project.as_ref()?.find(offset)
    }

    /// Remap an evaluation-engine failure (reported against a one-based
    /// line/column) to a range in this document.
    ///
    /// When the position resolves to a node, the diagnostic covers that
    /// node's exact range; otherwise it falls back to a zero-width range
    /// at the reported point (clamped to the document).
    pub fn remap_engine_diagnostic(
        &self,
        site: &DeclarationSite,
        message: impl Into<String>,
    ) -> EngineDiagnostic {
        let offset = self
            .line_index
            .position_to_offset(site.position())
            .unwrap_or_else(|_: PositionError| self.line_index.len());

        let range = self
            .locator
            .find_node(offset)
            .map(|node| node.range())
            .unwrap_or_else(|| TextRange::empty(offset));

        EngineDiagnostic {
            range,
            message: message.into(),
        }
    }
}

/// An evaluation-engine failure remapped into document coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineDiagnostic {
    pub range: TextRange,
    pub message: String,
}

/// An open document: the current snapshot behind a reader/writer lock.
///
/// Readers take cheap `Arc` clones ([`Document::snapshot`]); the single
/// writer path rebuilds the snapshot wholesale and swaps it in. No stale
/// node survives an edit, and no reader ever observes a partially-built
/// model.
pub struct Document {
    state: RwLock<Arc<DocumentSnapshot>>,
}

impl Document {
    /// Open a document with its initial text.
    pub fn open(text: &str) -> Self {
        Self {
            state: RwLock::new(Arc::new(DocumentSnapshot::build(text, None))),
        }
    }

    /// The current snapshot. The returned `Arc` stays consistent even if
    /// an update swaps in a newer snapshot concurrently.
    pub fn snapshot(&self) -> Arc<DocumentSnapshot> {
        self.state.read().clone()
    }

    /// Replace the document's text, discarding the old model atomically.
    ///
    /// Any project cross-reference is dropped: it described the old text,
    /// and the engine will re-evaluate.
    pub fn update(&self, text: &str) {
        let snapshot = Arc::new(DocumentSnapshot::build(text, None));
        *self.state.write() = snapshot;
    }

    /// Replace the document's text together with fresh evaluation output.
    pub fn update_with_project(&self, text: &str, project: &EvaluatedProject) {
        let snapshot = Arc::new(DocumentSnapshot::build(text, Some(project)));
        *self.state.write() = snapshot;
    }

    /// Attach evaluation output to the current text (the engine reports
    /// asynchronously, usually after the update that triggered it).
    pub fn apply_project(&self, project: &EvaluatedProject) {
        let current = self.snapshot();
        let snapshot = Arc::new(DocumentSnapshot::build(current.text(), Some(project)));
        *self.state.write() = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_survives_concurrent_update() {
        let document = Document::open("<Project><ItemGroup /></Project>");

        let before = document.snapshot();
        let root_before = before.model().root().unwrap().name().to_string();

        document.update("<Other />");

        // The old snapshot is untouched; the new one sees the new text.
        assert_eq!(before.model().root().unwrap().name(), root_before);
        assert_eq!(document.snapshot().model().root().unwrap().name(), "Other");
    }

    #[test]
    fn update_discards_stale_project() {
        let document = Document::open("<Project />");
        let project = EvaluatedProject {
            file: "/work/App.csproj".into(),
            ..Default::default()
        };
        document.apply_project(&project);
        assert!(document.snapshot().project().is_some());

        document.update("<Project><Target Name=\"T\"/></Project>");
        assert!(document.snapshot().project().is_none());
    }

    #[test]
    fn remap_diagnostic_to_node_range() {
        let text = "<Project>\n  <Import Project=\"missing.props\" />\n</Project>";
        let snapshot = DocumentSnapshot::build(text, None);

        // The engine reports one-based line 2, column 3 (the `<Import`).
        let site = DeclarationSite::new("/work/App.csproj", 2, 3);
        let diagnostic = snapshot.remap_engine_diagnostic(&site, "import not found");

        let import_range = snapshot
            .model()
            .root()
            .unwrap()
            .child_element("Import")
            .unwrap()
            .range();
        assert_eq!(diagnostic.range, import_range);
        assert_eq!(diagnostic.message, "import not found");
    }

    #[test]
    fn remap_diagnostic_out_of_bounds_falls_back() {
        let snapshot = DocumentSnapshot::build("<P />", None);

        let site = DeclarationSite::new("/work/App.csproj", 99, 1);
        let diagnostic = snapshot.remap_engine_diagnostic(&site, "boom");
        // Clamped to the document; still zero-width or a real node range,
        // never a panic.
        assert!(u32::from(diagnostic.range.end()) <= 5);
    }
}
