//! Source position tracking and mapping for svelte2tsx-rs.
//!
//! This crate provides the coordinate types shared by every pass of the
//! transformer, plus [`EditBuffer`]: a positionally editable view over the
//! original component text. All edits are expressed in original-text offsets
//! and resolved once, producing the generated code together with a
//! [`SourceMap`] that maps generated positions back to the Svelte source.

mod builder;
mod edit;
mod line_index;
mod span;

pub use builder::{Mapping, SourceMap, SourceMapBuilder};
pub use edit::{EditBuffer, EditError, EditOutput};
pub use line_index::{LineCol, LineIndex};
pub use span::{ByteOffset, Span};
