//! Syntax kinds for the Rowan-based XML CST
//!
//! This enum defines all node and token kinds in the syntax tree. The set
//! is deliberately small: MSBuild project files use a plain subset of XML
//! (no DTDs, no CDATA in practice), and everything the grammar does not
//! recognize is preserved as error tokens rather than rejected.

/// All syntax kinds (tokens and nodes) in the XML tree
///
/// Tokens are leaf nodes; nodes are composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TOKENS
    // =========================================================================
    /// Whitespace inside a tag (between attributes)
    WHITESPACE = 0,
    /// A run of character data between tags
    TEXT_CHUNK,
    /// `<!-- ... -->` (also unterminated comments at end of input)
    COMMENT,
    /// `<?...?>` processing instruction / XML declaration
    PROC_INST,
    /// `<`
    LT,
    /// `</`
    LT_SLASH,
    /// `>`
    GT,
    /// `/>`
    SLASH_GT,
    /// `=`
    EQ,
    /// An XML name (element or attribute)
    NAME,
    /// A quoted attribute value, quotes included
    QUOTED,
    /// Any byte the lexer could not assign to another token
    ERROR_TOKEN,

    // =========================================================================
    // NODES
    // =========================================================================
    /// The root node, always spanning the entire input
    DOCUMENT,
    /// An element with a start tag and (possibly missing) end tag
    ELEMENT,
    /// A self-closing element, `<Foo />`
    EMPTY_ELEMENT,
    /// `<Name attr="..." >` (or an unterminated fragment of one)
    START_TAG,
    /// `</Name>` (possibly name-less)
    END_TAG,
    /// `Name = "value"` inside a tag
    ATTRIBUTE,

    #[doc(hidden)]
    __LAST,
}

impl SyntaxKind {
    /// Check if this is a trivia token (whitespace or comment)
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::COMMENT | Self::PROC_INST)
    }

    /// Check if this kind opens a tag (`<` or `</`)
    pub fn is_tag_open(self) -> bool {
        matches!(self, Self::LT | Self::LT_SLASH)
    }

    /// Check if this kind closes a tag (`>` or `/>`)
    pub fn is_tag_close(self) -> bool {
        matches!(self, Self::GT | Self::SLASH_GT)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

impl From<rowan::SyntaxKind> for SyntaxKind {
    fn from(raw: rowan::SyntaxKind) -> Self {
        assert!(raw.0 < SyntaxKind::__LAST as u16);
        // Safety: we control all syntax kinds and check bounds above
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }
}

/// Language definition for Rowan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum XmlLanguage {}

impl rowan::Language for XmlLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.into()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for convenience
pub type SyntaxNode = rowan::SyntaxNode<XmlLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<XmlLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<XmlLanguage>;
pub type SyntaxNodeChildren = rowan::SyntaxNodeChildren<XmlLanguage>;
