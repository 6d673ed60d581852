//! Parse error types.

use source_map::Span;
use thiserror::Error;

/// An error that occurred during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// The location in the source where the error occurred.
    pub span: Span,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// The input ended inside a construct.
    #[error("unexpected end of file: expected {expected}")]
    UnexpectedEof {
        /// What was expected.
        expected: String,
    },

    /// An element was never closed.
    #[error("unclosed tag: <{tag_name}>")]
    UnclosedTag {
        /// The name of the unclosed tag.
        tag_name: String,
    },

    /// A closing tag does not match the open element.
    #[error("mismatched closing tag: expected </{expected}>, found </{found}>")]
    MismatchedClosingTag {
        /// The expected tag name.
        expected: String,
        /// The found tag name.
        found: String,
    },

    /// A closing tag with no open element.
    #[error("unexpected closing tag </{tag_name}>")]
    UnexpectedClosingTag {
        /// The name of the closing tag.
        tag_name: String,
    },

    /// A `{` without a matching `}`.
    #[error("unclosed expression")]
    UnclosedExpression,

    /// A malformed attribute.
    #[error("invalid attribute: {message}")]
    InvalidAttribute {
        /// A description of the problem.
        message: String,
    },
}
