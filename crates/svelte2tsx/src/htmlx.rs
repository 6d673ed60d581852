//! Markup to JSX conversion seam.

use source_map::{EditBuffer, EditError};
use svelte_parser::{Document, TemplateNode};

/// Converts the template markup in place into a JSX expression.
///
/// Runs before the script is processed. Implementations must wrap the
/// template in a fragment (`<>` ... `</>`), because the script block is
/// turned into `</>;function render() {` ... `;\n<>` around it, and must not
/// edit inside `<script>` or `<style>` blocks.
pub trait MarkupConverter {
    /// Records the conversion edits on `buffer`.
    fn convert(&self, buffer: &mut EditBuffer, document: &Document) -> Result<(), EditError>;
}

/// The default converter: wraps the template in a fragment and drops HTML
/// comments, which are not valid JSX. Markup is otherwise kept as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct FragmentConverter;

impl MarkupConverter for FragmentConverter {
    fn convert(&self, buffer: &mut EditBuffer, document: &Document) -> Result<(), EditError> {
        buffer.prepend("<>");
        remove_comments(buffer, &document.fragment.nodes)?;
        buffer.append("</>");
        Ok(())
    }
}

fn remove_comments(buffer: &mut EditBuffer, nodes: &[TemplateNode]) -> Result<(), EditError> {
    for node in nodes {
        match node {
            TemplateNode::Comment(comment) => buffer.remove(comment.span.start, comment.span.end)?,
            other => remove_comments(buffer, other.children())?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use svelte_parser::parse;

    #[test]
    fn test_fragment_wraps_template_and_drops_comments() {
        let source = "<div><!-- todo --><p>hi</p></div>";
        let parsed = parse(source);
        let mut buffer = EditBuffer::new(source);
        FragmentConverter
            .convert(&mut buffer, &parsed.document)
            .unwrap();
        assert_eq!(buffer.finish().code, "<><div><p>hi</p></div></>");
    }
}
