//! Logos-based lexer for MSBuild project XML
//!
//! XML lexing is context-sensitive: the same bytes mean different things
//! between tags and inside a tag. Two logos token sets cover the two
//! contexts, and [`tokenize`] switches between them with `morph`: content
//! mode until a `<`/`</` is seen, tag mode until the matching `>`/`/>`.
//!
//! The lexer never rejects input: bytes no rule matches become
//! `ERROR_TOKEN`s and the stream always covers the full source text.

use logos::Logos;
use text_size::TextSize;

use super::syntax_kind::SyntaxKind;

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: TextSize,
}

impl Token<'_> {
    /// End offset of the token (exclusive).
    pub fn end(&self) -> TextSize {
        self.offset + TextSize::of(self.text)
    }
}

/// Tokens recognized between tags (character data position)
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub(crate) enum ContentToken {
    /// A terminated comment. Wins over the `<!` fallback by priority.
    #[regex(r"<!--([^-]|-[^-])*-->", priority = 5)]
    Comment,

    /// An unterminated comment runs to the end of input.
    #[regex(r"<!--([^-]|-[^-])*-?", priority = 4)]
    UnterminatedComment,

    /// `<!DOCTYPE ...>` and other markup declarations; kept as trivia.
    #[regex(r"<![^>]*>?", priority = 3)]
    MarkupDecl,

    /// `<?xml ...?>` and other processing instructions.
    #[regex(r"<\?[^>]*>?")]
    ProcInst,

    #[token("</")]
    LtSlash,

    #[token("<")]
    Lt,

    /// A run of character data (anything that does not open a tag).
    #[regex(r"[^<]+")]
    Text,
}

/// Tokens recognized inside a tag (between `<` and `>`)
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub(crate) enum TagToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[token(">")]
    Gt,

    #[token("/>")]
    SlashGt,

    #[token("=")]
    Eq,

    /// A quoted attribute value, either quote style, quotes included.
    #[regex(r#""[^"]*""#, priority = 4)]
    #[regex(r"'[^']*'", priority = 4)]
    Quoted,

    /// An unterminated value stops at end-of-line so a missing close quote
    /// cannot swallow the rest of the document.
    #[regex(r#""[^"\r\n]*"#, priority = 3)]
    #[regex(r"'[^'\r\n]*", priority = 3)]
    UnterminatedQuoted,

    /// An XML name. Namespace prefixes and dotted names are allowed.
    #[regex(r"[\p{L}_:][\p{L}\p{N}_:.\-]*")]
    Name,

    /// A new tag opening while the current one is unterminated.
    #[token("</")]
    LtSlash,

    #[token("<")]
    Lt,
}

impl From<ContentToken> for SyntaxKind {
    fn from(token: ContentToken) -> Self {
        match token {
            ContentToken::Comment | ContentToken::UnterminatedComment | ContentToken::MarkupDecl => {
                SyntaxKind::COMMENT
            }
            ContentToken::ProcInst => SyntaxKind::PROC_INST,
            ContentToken::LtSlash => SyntaxKind::LT_SLASH,
            ContentToken::Lt => SyntaxKind::LT,
            ContentToken::Text => SyntaxKind::TEXT_CHUNK,
        }
    }
}

impl From<TagToken> for SyntaxKind {
    fn from(token: TagToken) -> Self {
        match token {
            TagToken::Whitespace => SyntaxKind::WHITESPACE,
            TagToken::Gt => SyntaxKind::GT,
            TagToken::SlashGt => SyntaxKind::SLASH_GT,
            TagToken::Eq => SyntaxKind::EQ,
            TagToken::Quoted | TagToken::UnterminatedQuoted => SyntaxKind::QUOTED,
            TagToken::Name => SyntaxKind::NAME,
            TagToken::LtSlash => SyntaxKind::LT_SLASH,
            TagToken::Lt => SyntaxKind::LT,
        }
    }
}

/// Tokenize an entire document, switching between content and tag modes.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lexer = ContentToken::lexer(input);

    loop {
        let Some(result) = lexer.next() else {
            return tokens;
        };

        let kind = match result {
            Ok(token) => token.into(),
            Err(()) => SyntaxKind::ERROR_TOKEN,
        };
        push_token(&mut tokens, kind, lexer.slice(), lexer.span().start);

        if kind.is_tag_open() {
            // Tag mode until the tag closes or another tag opens a new one.
            let mut tag_lexer = lexer.morph::<TagToken>();
            loop {
                let Some(result) = tag_lexer.next() else {
                    return tokens;
                };

                let kind = match result {
                    Ok(token) => token.into(),
                    Err(()) => SyntaxKind::ERROR_TOKEN,
                };
                push_token(&mut tokens, kind, tag_lexer.slice(), tag_lexer.span().start);

                if kind.is_tag_close() {
                    break;
                }
                // A nested `<` keeps us in tag mode: the new tag begins
                // immediately and the parser deals with the unterminated one.
            }
            lexer = tag_lexer.morph();
        }
    }
}

fn push_token<'a>(tokens: &mut Vec<Token<'a>>, kind: SyntaxKind, text: &'a str, start: usize) {
    tokens.push(Token {
        kind,
        text,
        offset: TextSize::from(start as u32),
    });
}
