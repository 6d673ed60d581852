//! Svelte markup parser for svelte2tsx-rs.
//!
//! This crate parses a Svelte component into a shallow [`Document`]: the
//! top-level `<script>` and `<style>` blocks, and a template tree of elements,
//! `<slot>` definitions, text, comments and mustache tags. Every node carries
//! the byte span it was parsed from, so later passes can splice the original
//! text without re-reading it.
//!
//! # Example
//!
//! ```
//! use svelte_parser::{parse, TemplateNode};
//!
//! let source = r#"
//! <script>
//!     export let name = 'world';
//! </script>
//!
//! <slot greeting="Hello {name}" />
//! "#;
//!
//! let result = parse(source);
//! assert!(result.errors.is_empty());
//! assert_eq!(result.document.scripts.len(), 1);
//! assert!(result
//!     .document
//!     .fragment
//!     .nodes
//!     .iter()
//!     .any(|node| matches!(node, TemplateNode::Slot(_))));
//! ```

mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::*;
pub use error::{ParseError, ParseErrorKind};
pub use lexer::{Lexer, Token, TokenKind};
pub use source_map::Span;

/// The result of parsing a Svelte file.
#[derive(Debug)]
pub struct ParseResult {
    /// The parsed document.
    pub document: Document,
    /// Any errors encountered during parsing.
    pub errors: Vec<ParseError>,
}

/// Parses a Svelte source file into an AST.
///
/// The parser recovers from errors where possible, returning both the
/// document and every error encountered.
pub fn parse(source: &str) -> ParseResult {
    parser::Parser::new(source).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let result = parse("");
        assert!(result.errors.is_empty());
        assert!(result.document.fragment.nodes.is_empty());
    }

    #[test]
    fn test_parse_with_script() {
        let source = r#"<script>let x = 1;</script><div>{x}</div>"#;
        let result = parse(source);
        assert!(result.errors.is_empty());
        assert!(result.document.instance_script().is_some());
        assert_eq!(result.document.fragment.nodes.len(), 1);
    }
}
