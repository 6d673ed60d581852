//! Slot definition extraction.
//!
//! Walks the template for `<slot>` elements and records, per slot, the props
//! it passes to the consumer as expression text. Runs against the original
//! source, before any markup edits, so the captured text is stable.

use crate::error::TransformError;
use crate::types::{property_key, string_literal, SlotRegistry};
use indexmap::IndexMap;
use smol_str::SmolStr;
use svelte_parser::{Attribute, AttributeValue, Document, NormalAttribute, Slot, TemplateNode};

const DEFAULT_SLOT: &str = "default";

/// Builds the slot registry for a document.
///
/// A later slot with the same name replaces the props of an earlier one.
pub fn extract_slots(source: &str, document: &Document) -> Result<SlotRegistry, TransformError> {
    let mut slots = SlotRegistry::default();
    visit(source, &document.fragment.nodes, &mut slots)?;
    tracing::debug!("Extracted {} slot definitions", slots.len());
    Ok(slots)
}

fn visit(
    source: &str,
    nodes: &[TemplateNode],
    slots: &mut SlotRegistry,
) -> Result<(), TransformError> {
    for node in nodes {
        match node {
            TemplateNode::Slot(slot) => {
                let name = slot_name(slot)?;
                let props = slot_props(source, slot);
                slots.insert(name, props);
                visit(source, &slot.children, slots)?;
            }
            TemplateNode::Element(element) => visit(source, &element.children, slots)?,
            TemplateNode::Text(_) | TemplateNode::Comment(_) | TemplateNode::Mustache(_) => {}
        }
    }
    Ok(())
}

/// The slot name is the static text of the `name` attribute.
fn slot_name(slot: &Slot) -> Result<SmolStr, TransformError> {
    let Some(attr) = slot.attribute("name") else {
        return Ok(SmolStr::new(DEFAULT_SLOT));
    };
    match attr.values.as_slice() {
        [AttributeValue::Text(text)] => Ok(SmolStr::new(&text.raw)),
        _ => Err(TransformError::MalformedSlotAttribute {
            slot: DEFAULT_SLOT.to_string(),
            attribute: attr.name.to_string(),
            offset: attr.span.start_usize(),
        }),
    }
}

fn slot_props(source: &str, slot: &Slot) -> IndexMap<SmolStr, String> {
    slot.attributes
        .iter()
        .filter_map(|attr| match attr {
            Attribute::Normal(normal) if normal.name != "name" && !normal.values.is_empty() => {
                Some((normal.name.clone(), attribute_value_as_expression(source, normal)))
            }
            _ => None,
        })
        .collect()
}

/// Renders an attribute's value as a single JavaScript expression.
///
/// - `attr="text"` becomes the string literal `"text"`
/// - `attr={expr}` and `attr="{expr}"` become `expr` verbatim
/// - mixed values are joined with `+` in source order, with expressions
///   parenthesized; a leading `""+` keeps the result a string when the value
///   starts with an expression
pub fn attribute_value_as_expression(source: &str, attr: &NormalAttribute) -> String {
    match attr.values.as_slice() {
        [] => String::new(),
        [AttributeValue::Text(text)] => string_literal(&text.raw),
        [AttributeValue::Expression(expr)] => expr.expression_span.text(source).to_string(),
        values => {
            let mut parts: Vec<String> = values
                .iter()
                .map(|value| match value {
                    AttributeValue::Text(text) => string_literal(&text.raw),
                    AttributeValue::Expression(expr) => {
                        format!("({})", expr.expression_span.text(source))
                    }
                })
                .collect();
            if matches!(values.first(), Some(AttributeValue::Expression(_))) {
                parts.insert(0, "\"\"".to_string());
            }
            parts.join("+")
        }
    }
}

/// Renders the registry as the object literal returned as `slots`.
///
/// `{default: {item:item}, header: {}}`; `{}` when there are no slots.
pub fn render_slots(slots: &SlotRegistry) -> String {
    let entries: Vec<String> = slots
        .iter()
        .map(|(name, props)| {
            let props: Vec<String> = props
                .iter()
                .map(|(prop, expr)| format!("{}:{}", property_key(prop), expr))
                .collect();
            format!("{}: {{{}}}", property_key(name), props.join(", "))
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}
