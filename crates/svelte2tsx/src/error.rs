//! Transformation errors.

use miette::Diagnostic;
use source_map::{EditError, LineIndex};
use svelte_parser::ParseError;
use text_size::TextSize;
use thiserror::Error;

/// An error that aborts the transformation of a component.
///
/// There is no partial output: any of these means the caller gets no TSX for
/// the component.
#[derive(Debug, Error, Diagnostic)]
pub enum TransformError {
    /// An export whose target is not a plain identifier, such as a
    /// destructuring pattern or `export default`.
    #[error("unsupported export target: {construct}")]
    #[diagnostic(
        code(svelte2tsx::unsupported_export),
        help("props are declared with `export let`, `export function` or an export list of identifiers")
    )]
    UnsupportedExportTarget {
        /// Description of the offending construct.
        construct: String,
        /// Offset of the construct in the component source.
        #[label("declared here")]
        offset: usize,
    },

    /// A slot attribute that cannot be rendered as an expression.
    #[error("malformed attribute `{attribute}` on slot `{slot}`")]
    #[diagnostic(
        code(svelte2tsx::malformed_slot_attribute),
        help("slot names must be static text, e.g. <slot name=\"header\">")
    )]
    MalformedSlotAttribute {
        /// The slot name, or `default`.
        slot: String,
        /// The attribute name.
        attribute: String,
        /// Offset of the attribute in the component source.
        #[label("cannot be rendered")]
        offset: usize,
    },

    /// The instance script is not valid TypeScript.
    #[error("failed to parse script: {message}")]
    #[diagnostic(code(svelte2tsx::script_parse))]
    ScriptParse {
        /// The parser's message.
        message: String,
        /// Offset of the error in the component source.
        #[label("here")]
        offset: usize,
    },

    /// The template could not be parsed.
    #[error("failed to parse template: {0}")]
    #[diagnostic(code(svelte2tsx::template_parse))]
    TemplateParse(#[from] ParseError),

    /// Two edits conflicted inside the edit buffer. Never expected from a
    /// correct pass order.
    #[error("internal edit conflict: {0}")]
    #[diagnostic(code(svelte2tsx::internal))]
    BufferEdit(#[from] EditError),

    /// An error tagged with the component it came from.
    #[error("{location}: {source}")]
    #[diagnostic(code(svelte2tsx::component))]
    InComponent {
        /// The component's file name.
        filename: String,
        /// `filename:line:column` of the error, or just the file name.
        location: String,
        /// Offset of the error in the component source.
        #[label("here")]
        offset: Option<usize>,
        /// The underlying error.
        source: Box<TransformError>,
    },
}

impl TransformError {
    /// Returns the offset in the component source this error points at.
    pub fn offset(&self) -> Option<usize> {
        match self {
            TransformError::UnsupportedExportTarget { offset, .. }
            | TransformError::MalformedSlotAttribute { offset, .. }
            | TransformError::ScriptParse { offset, .. } => Some(*offset),
            TransformError::TemplateParse(error) => Some(error.span.start_usize()),
            TransformError::BufferEdit(_) => None,
            TransformError::InComponent { offset, .. } => *offset,
        }
    }

    /// Returns the error without its component tag.
    pub fn root(&self) -> &TransformError {
        match self {
            TransformError::InComponent { source, .. } => source.root(),
            other => other,
        }
    }

    /// Tags this error with the component's file name and the line/column
    /// of its offset in `source`.
    pub fn in_component(self, filename: &str, source: &str) -> TransformError {
        if matches!(self, TransformError::InComponent { .. }) {
            return self;
        }
        let offset = self.offset();
        let location = offset
            .and_then(|offset| LineIndex::new(source).line_col(TextSize::from(offset as u32)))
            .map(|line_col| format!("{}:{}", filename, line_col))
            .unwrap_or_else(|| filename.to_string());

        TransformError::InComponent {
            filename: filename.to_string(),
            location,
            offset,
            source: Box::new(self),
        }
    }
}
