//! Paths through the XML document.
//!
//! An [`XmlPath`] describes where a node sits in the element tree, e.g.
//! `/Project/ItemGroup/PackageReference`. Paths support two deliberately
//! distinct match relations:
//!
//! - [`XmlPath::starts_with`]: "rooted exactly here": absolute prefix
//!   matching from the document root;
//! - [`XmlPath::ends_with`] / [`XmlPath::is_child_of`]: "appears under
//!   this name": suffix and parent adjacency matching that works at any
//!   nesting depth.
//!
//! Callers rely on the distinction ("must be the document's direct child"
//! vs. "must be nested somewhere under an item group"), so the two are
//! never collapsed into one relation.

use std::fmt;

use smol_str::SmolStr;

/// The path separator.
pub const SEPARATOR: char = '/';

/// A single segment of an [`XmlPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// The document root (spelled as an empty name).
    Root,
    /// `*`: matches any single named segment.
    Wildcard,
    Named(SmolStr),
}

impl PathSegment {
    /// Create a segment from its textual spelling.
    pub fn new(name: &str) -> Self {
        match name {
            "" => Self::Root,
            "*" => Self::Wildcard,
            _ => Self::Named(SmolStr::new(name)),
        }
    }

    /// Create a named segment (no special spellings).
    pub fn named(name: &str) -> Self {
        Self::Named(SmolStr::new(name))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Root => "",
            Self::Wildcard => "*",
            Self::Named(name) => name.as_str(),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// Whether this segment matches another in a path comparison.
    ///
    /// A wildcard matches any single named segment (and another wildcard),
    /// but never the root; everything else matches structurally.
    pub fn matches(&self, other: &PathSegment) -> bool {
        match (self, other) {
            (Self::Root, Self::Root) => true,
            (Self::Root, _) | (_, Self::Root) => false,
            (Self::Wildcard, _) | (_, Self::Wildcard) => true,
            (Self::Named(a), Self::Named(b)) => a == b,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An immutable path through the XML document.
///
/// Absolute paths start with the [`PathSegment::Root`] segment (spelled
/// with a leading `/`); relative paths do not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XmlPath {
    /// All segments, including the leaf. Never empty.
    segments: Vec<PathSegment>,
}

impl XmlPath {
    /// The root path, `/`.
    pub fn root() -> Self {
        Self {
            segments: vec![PathSegment::Root],
        }
    }

    /// A path of a single segment.
    pub fn from_segment(segment: PathSegment) -> Self {
        Self {
            segments: vec![segment],
        }
    }

    /// Parse a string into a path.
    ///
    /// A leading separator makes the path absolute; a trailing separator is
    /// ignored. `*` segments are wildcards.
    pub fn parse(path: &str) -> Self {
        if path == "/" || path.is_empty() {
            return Self::root();
        }

        let path = path.strip_suffix(SEPARATOR).unwrap_or(path);
        let segments = path.split(SEPARATOR).map(PathSegment::new).collect();

        Self { segments }
    }

    /// All segments, including the leaf.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The segments above the leaf.
    pub fn ancestors(&self) -> &[PathSegment] {
        &self.segments[..self.segments.len() - 1]
    }

    /// The last segment.
    pub fn leaf(&self) -> &PathSegment {
        self.segments.last().expect("path is never empty")
    }

    /// The leaf segment's name.
    pub fn name(&self) -> &str {
        self.leaf().name()
    }

    pub fn is_absolute(&self) -> bool {
        self.segments[0].is_root()
    }

    pub fn is_relative(&self) -> bool {
        !self.is_absolute()
    }

    pub fn is_root(&self) -> bool {
        self.segments.len() == 1 && self.is_absolute()
    }

    /// The path without its leaf, or `None` for single-segment paths.
    pub fn parent(&self) -> Option<XmlPath> {
        if self.segments.len() == 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append a single segment.
    pub fn append_segment(&self, segment: PathSegment) -> XmlPath {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Append a path. Appending an absolute path replaces this one.
    pub fn append(&self, path: &XmlPath) -> XmlPath {
        if path.is_absolute() {
            return path.clone();
        }
        let mut segments = self.segments.clone();
        segments.extend(path.segments.iter().cloned());
        Self { segments }
    }

    /// Append a path or bare segment spelled as a string.
    pub fn join(&self, path_or_segment: &str) -> XmlPath {
        if path_or_segment.contains(SEPARATOR) {
            self.append(&XmlPath::parse(path_or_segment))
        } else {
            self.append_segment(PathSegment::new(path_or_segment))
        }
    }

    /// Whether this path starts with all of `base`'s segments.
    ///
    /// This is the "rooted exactly here" relation: for an absolute `base`
    /// it means the path sits at that exact place from the document root.
    pub fn starts_with(&self, base: &XmlPath) -> bool {
        if base.segments.len() > self.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(&base.segments)
            .all(|(mine, theirs)| mine.matches(theirs))
    }

    /// Whether this path ends with `suffix`.
    ///
    /// This is the "appears under this name, at any depth" relation:
    /// - an absolute `suffix` can only match through prefix logic, so it
    ///   degrades to [`Self::starts_with`];
    /// - a single bare segment ends any path whose leaf has that name,
    ///   regardless of depth.
    pub fn ends_with(&self, suffix: &XmlPath) -> bool {
        if suffix.is_absolute() {
            return self.starts_with(suffix);
        }
        if suffix.segments.len() == 1 {
            return self.leaf().matches(suffix.leaf());
        }
        if suffix.segments.len() > self.segments.len() {
            return false;
        }
        let tail = &self.segments[self.segments.len() - suffix.segments.len()..];
        tail.iter()
            .zip(&suffix.segments)
            .all(|(mine, theirs)| mine.matches(theirs))
    }

    /// Whether `parent` is this path's direct ancestor.
    ///
    /// The parent may be relative, in which case adjacency is checked at
    /// any depth (`ItemGroup` is the parent of
    /// `/Project/ItemGroup/PackageReference`). By convention, any relative
    /// path is a child of the root.
    pub fn is_child_of(&self, parent: &XmlPath) -> bool {
        if self.is_absolute() && parent.is_relative() {
            return false;
        }
        if self.is_relative() && parent.is_root() {
            return true;
        }
        if self.segments.len() < 2 {
            return false;
        }

        let ancestors = self.ancestors();
        if parent.is_absolute() {
            // Direct child: the ancestor chain IS the parent path.
            return ancestors.len() == parent.segments.len()
                && ancestors
                    .iter()
                    .zip(&parent.segments)
                    .all(|(mine, theirs)| mine.matches(theirs));
        }

        if parent.segments.len() > ancestors.len() {
            return false;
        }
        let tail = &ancestors[ancestors.len() - parent.segments.len()..];
        tail.iter()
            .zip(&parent.segments)
            .all(|(mine, theirs)| mine.matches(theirs))
    }

    /// Whether `child` is a direct child of this path.
    pub fn is_parent_of(&self, child: &XmlPath) -> bool {
        child.is_child_of(self)
    }
}

impl fmt::Display for XmlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }

        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str("/")?;
            }
            first = false;
            f.write_str(segment.name())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn p(path: &str) -> XmlPath {
        XmlPath::parse(path)
    }

    #[rstest]
    #[case("/")]
    #[case("/Project")]
    #[case("/Project/ItemGroup")]
    #[case("ItemGroup")]
    #[case("ItemGroup/*")]
    fn parse_and_display_round_trip(#[case] text: &str) {
        assert_eq!(p(text).to_string(), text);
    }

    #[test]
    fn trailing_separator_is_ignored() {
        assert_eq!(p("/Project/"), p("/Project"));
    }

    #[test]
    fn absolute_and_relative() {
        assert!(p("/Project").is_absolute());
        assert!(p("ItemGroup").is_relative());
        assert!(XmlPath::root().is_root());
    }

    #[test]
    fn parent_drops_leaf() {
        assert_eq!(p("/Project/ItemGroup").parent(), Some(p("/Project")));
        assert_eq!(p("ItemGroup").parent(), None);
    }

    #[test]
    fn starts_with_is_absolute_prefix() {
        assert!(p("/Project/ItemGroup").starts_with(&p("/Project")));
        assert!(p("/Project/ItemGroup").starts_with(&p("/Project/ItemGroup")));
        assert!(!p("/Project").starts_with(&p("/Project/ItemGroup")));
        assert!(!p("/Other/ItemGroup").starts_with(&p("/Project")));
    }

    #[test]
    fn ends_with_bare_segment_matches_any_depth() {
        assert!(p("ItemGroup").ends_with(&p("ItemGroup")));
        assert!(p("/Project/ItemGroup").ends_with(&p("ItemGroup")));
        assert!(p("/Project/Target/ItemGroup").ends_with(&p("ItemGroup")));
        assert!(!p("/Project/PropertyGroup").ends_with(&p("ItemGroup")));
    }

    #[test]
    fn ends_with_multi_segment_suffix() {
        assert!(p("/Project/Target/ItemGroup").ends_with(&p("Target/ItemGroup")));
        assert!(!p("/Project/Target/ItemGroup").ends_with(&p("Project/ItemGroup")));
    }

    #[test]
    fn ends_with_absolute_uses_prefix_logic() {
        assert!(p("/Project/ItemGroup").ends_with(&p("/Project/ItemGroup")));
        assert!(!p("ItemGroup").ends_with(&p("/Project/ItemGroup")));
    }

    #[test]
    fn is_child_of_absolute_parent_is_direct() {
        assert!(p("/Project/ItemGroup").is_child_of(&p("/Project")));
        assert!(!p("/Project/Target/ItemGroup").is_child_of(&p("/Project")));
    }

    #[test]
    fn is_child_of_relative_parent_matches_any_depth() {
        assert!(p("/Project/ItemGroup/PackageReference").is_child_of(&p("ItemGroup")));
        assert!(p("/Project/Target/ItemGroup/Ref").is_child_of(&p("Target/ItemGroup")));
        assert!(!p("/Project/PropertyGroup/Foo").is_child_of(&p("ItemGroup")));
    }

    #[test]
    fn relative_path_is_child_of_root() {
        assert!(p("ItemGroup").is_child_of(&XmlPath::root()));
        assert!(!p("/Project").is_child_of(&p("ItemGroup")));
    }

    #[test]
    fn is_parent_of_mirrors_is_child_of() {
        assert!(p("/Project").is_parent_of(&p("/Project/ItemGroup")));
    }

    #[test]
    fn wildcard_matches_any_named_segment() {
        assert!(p("/Project/ItemGroup/Compile").ends_with(&p("ItemGroup/*")));
        assert!(p("/Project/ItemGroup/Compile").is_child_of(&p("ItemGroup")));
        assert!(p("Whatever").ends_with(&p("*")));
        assert!(!XmlPath::root().ends_with(&p("*")));
    }

    #[test]
    fn wildcard_never_matches_root() {
        assert!(!PathSegment::Wildcard.matches(&PathSegment::Root));
        assert!(PathSegment::Wildcard.matches(&PathSegment::named("Anything")));
    }

    #[test]
    fn append_absolute_replaces() {
        assert_eq!(p("/Project").append(&p("/Other")), p("/Other"));
        assert_eq!(p("/Project").join("ItemGroup"), p("/Project/ItemGroup"));
        assert_eq!(
            p("/Project").join("ItemGroup/PackageReference"),
            p("/Project/ItemGroup/PackageReference")
        );
    }
}
