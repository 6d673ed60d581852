//! Markup lexer using logos.
//!
//! Tokenizes tag syntax: tag delimiters, names, `=`, quotes and the braces
//! that open mustache tags or attribute expressions. Text content, comment
//! bodies, `<script>`/`<style>` bodies and expression bodies are never
//! lexed; the parser reads those straight from the source.

use logos::Logos;
use source_map::Span;
use text_size::TextSize;

/// A token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span of the token in the source.
    pub span: Span,
}

/// Token kinds for Svelte tag syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Default)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    /// `<`
    #[token("<")]
    LAngle,

    /// `</`
    #[token("</")]
    LAngleSlash,

    /// `<!--`
    #[token("<!--")]
    CommentOpen,

    /// `<!`, as in `<!DOCTYPE html>`
    #[token("<!")]
    LAngleBang,

    /// `>`
    #[token(">")]
    RAngle,

    /// `/>`
    #[token("/>")]
    SlashRAngle,

    /// `/`
    #[token("/")]
    Slash,

    /// `=`
    #[token("=")]
    Eq,

    /// `"`
    #[token("\"")]
    DoubleQuote,

    /// `'`
    #[token("'")]
    SingleQuote,

    /// `{`
    #[token("{")]
    LBrace,

    /// `{#`
    #[token("{#")]
    LBraceHash,

    /// `{:`
    #[token("{:")]
    LBraceColon,

    /// `{/`
    #[token("{/")]
    LBraceSlash,

    /// `{@`
    #[token("{@")]
    LBraceAt,

    /// `}`
    #[token("}")]
    RBrace,

    /// A tag name, attribute name or unquoted value piece
    /// (`div`, `svelte:head`, `on:click|once`, `data-id`).
    #[regex(r#"[^ \t\r\n\f"'<>/={}]+"#)]
    Name,

    /// End of file
    Eof,

    /// Invalid/unknown token
    #[default]
    Error,
}

impl TokenKind {
    /// Returns true if this token opens a `{...}` tag.
    pub fn opens_brace(&self) -> bool {
        matches!(
            self,
            TokenKind::LBrace
                | TokenKind::LBraceHash
                | TokenKind::LBraceColon
                | TokenKind::LBraceSlash
                | TokenKind::LBraceAt
        )
    }

    /// Returns a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::LAngle => "'<'",
            TokenKind::LAngleSlash => "'</'",
            TokenKind::CommentOpen => "'<!--'",
            TokenKind::LAngleBang => "'<!'",
            TokenKind::RAngle => "'>'",
            TokenKind::SlashRAngle => "'/>'",
            TokenKind::Slash => "'/'",
            TokenKind::Eq => "'='",
            TokenKind::DoubleQuote => "'\"'",
            TokenKind::SingleQuote => "'''",
            TokenKind::LBrace => "'{'",
            TokenKind::LBraceHash => "'{#'",
            TokenKind::LBraceColon => "'{:'",
            TokenKind::LBraceSlash => "'{/'",
            TokenKind::LBraceAt => "'{@'",
            TokenKind::RBrace => "'}'",
            TokenKind::Name => "name",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid token",
        }
    }
}

/// A lexer over Svelte source, starting at any byte offset.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    offset: usize,
    end: usize,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer for the whole source.
    pub fn new(source: &'src str) -> Self {
        Self::at(source, 0)
    }

    /// Creates a lexer that starts at byte `offset` of `source`. Token spans
    /// are still relative to the start of `source`.
    pub fn at(source: &'src str, offset: usize) -> Self {
        Self {
            inner: TokenKind::lexer(&source[offset..]),
            offset,
            end: source.len(),
            finished: false,
        }
    }

    fn span(&self) -> Span {
        let span = self.inner.span();
        Span::new(
            TextSize::from((self.offset + span.start) as u32),
            TextSize::from((self.offset + span.end) as u32),
        )
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.inner.next() {
            Some(Ok(kind)) => Some(Token {
                kind,
                span: self.span(),
            }),
            Some(Err(())) => Some(Token {
                kind: TokenKind::Error,
                span: self.span(),
            }),
            None => {
                self.finished = true;
                Some(Token {
                    kind: TokenKind::Eof,
                    span: Span::empty(self.end as u32),
                })
            }
        }
    }
}

/// Returns the first token at or after `offset`, skipping whitespace.
pub(crate) fn token_at(source: &str, offset: usize) -> Token {
    Lexer::at(source, offset).next().unwrap_or(Token {
        kind: TokenKind::Eof,
        span: Span::empty(source.len() as u32),
    })
}
