//! Component assembly: the pipeline that turns a Svelte component into TSX.
//!
//! The output has the shape
//!
//! ```text
//! <></>;function render() {
//! <instance script, exports removed>
//! ;
//! <><template></>
//! return { props: {...}, slots: {...} }}
//!
//! export default class {
//!     $$prop_def = render().props
//!     $$slot_def = render().slots
//! }
//! ```
//!
//! All edits go through one [`EditBuffer`] in original coordinates, so the
//! source map points every surviving character back at the component.

use crate::error::TransformError;
use crate::exports::{render_props, rewrite_exports};
use crate::htmlx::{FragmentConverter, MarkupConverter};
use crate::reactive::declare_implicit_reactive_variables;
use crate::script::parse_script;
use crate::slots::{extract_slots, render_slots};
use crate::types::{
    component_name_from_path, generate_component_export, ExportRegistry, SlotRegistry,
};
use rayon::prelude::*;
use source_map::{EditBuffer, SourceMap, Span};
use svelte_parser::{Document, Script};

/// Options for transformation.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// The filename of the component. Names the generated class and tags
    /// errors.
    pub filename: Option<String>,
    /// Whether to generate source maps.
    pub source_maps: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            filename: None,
            source_maps: true,
        }
    }
}

/// The result of transformation.
#[derive(Debug)]
pub struct Svelte2TsxResult {
    /// The generated TSX code.
    pub code: String,
    /// Maps generated offsets back to the component source. Empty when
    /// source maps are disabled.
    pub source_map: SourceMap,
    /// The slots defined by the template.
    pub slots: SlotRegistry,
    /// The props declared by the instance script.
    pub exports: ExportRegistry,
    /// The `props` object literal, e.g. `{name , label: text}`.
    pub props_descriptor: String,
    /// The `slots` object literal, e.g. `{default: {item:item}}`.
    pub slots_descriptor: String,
}

/// Transforms a Svelte component into TSX with default options.
///
/// ```
/// use svelte2tsx::svelte2tsx;
///
/// let result = svelte2tsx("<script>export let name = 'x';</script>\n<slot greeting=\"{name}\"></slot>").unwrap();
/// assert_eq!(result.props_descriptor, "{name}");
/// assert_eq!(result.slots_descriptor, "{default: {greeting:name}}");
/// ```
pub fn svelte2tsx(source: &str) -> Result<Svelte2TsxResult, TransformError> {
    svelte2tsx_with_options(source, &TransformOptions::default())
}

/// Parses and transforms a Svelte component.
pub fn svelte2tsx_with_options(
    source: &str,
    options: &TransformOptions,
) -> Result<Svelte2TsxResult, TransformError> {
    let parsed = svelte_parser::parse(source);
    if let Some(error) = parsed.errors.into_iter().next() {
        return Err(tag(TransformError::TemplateParse(error), source, options));
    }
    transform_document(source, &parsed.document, &FragmentConverter, options)
}

/// Transforms an already parsed component, converting its markup with
/// `converter`.
pub fn transform_document(
    source: &str,
    document: &Document,
    converter: &dyn MarkupConverter,
    options: &TransformOptions,
) -> Result<Svelte2TsxResult, TransformError> {
    assemble(source, document, converter, options).map_err(|error| tag(error, source, options))
}

/// Transforms many components in parallel.
///
/// Each input is `(filename, source)`. Results are in input order.
pub fn transform_batch<N, S>(
    components: &[(N, S)],
    source_maps: bool,
) -> Vec<Result<Svelte2TsxResult, TransformError>>
where
    N: AsRef<str> + Sync,
    S: AsRef<str> + Sync,
{
    components
        .par_iter()
        .map(|(filename, source)| {
            let options = TransformOptions {
                filename: Some(filename.as_ref().to_string()),
                source_maps,
            };
            svelte2tsx_with_options(source.as_ref(), &options)
        })
        .collect()
}

fn tag(error: TransformError, source: &str, options: &TransformOptions) -> TransformError {
    match &options.filename {
        Some(filename) => error.in_component(filename, source),
        None => error,
    }
}

/// Where the assembler stands with respect to the instance script.
enum ScriptState<'a> {
    /// Only module scripts, or none at all.
    NoScript,
    /// The first non-module script.
    ScriptFound(&'a Script),
}

impl<'a> ScriptState<'a> {
    fn locate(document: &'a Document) -> Self {
        match document.instance_script() {
            Some(script) => ScriptState::ScriptFound(script),
            None => ScriptState::NoScript,
        }
    }
}

fn assemble(
    source: &str,
    document: &Document,
    converter: &dyn MarkupConverter,
    options: &TransformOptions,
) -> Result<Svelte2TsxResult, TransformError> {
    let mut buffer = EditBuffer::new(source);

    converter.convert(&mut buffer, document)?;
    let slots = extract_slots(source, document)?;
    remove_style_tags(&mut buffer, document)?;

    let slots_descriptor = render_slots(&slots);
    let exports = match ScriptState::locate(document) {
        ScriptState::NoScript => {
            tracing::debug!("No instance script, wrapping template only");
            buffer.insert_before(0u32, "</>;function render() {\n<>")?;
            buffer.append(&format!(
                ";\nreturn {{ props: {{}}, slots: {} }}}}",
                slots_descriptor
            ));
            ExportRegistry::default()
        }
        ScriptState::ScriptFound(script) => process_script(&mut buffer, script, &slots_descriptor)?,
    };
    let props_descriptor = render_props(&exports);

    let component_name = options.filename.as_deref().map(component_name_from_path);
    buffer.append(&generate_component_export(component_name.as_deref()));

    let output = buffer.finish();
    Ok(Svelte2TsxResult {
        code: output.code,
        source_map: if options.source_maps {
            output.source_map
        } else {
            SourceMap::new()
        },
        slots,
        exports,
        props_descriptor,
        slots_descriptor,
    })
}

fn remove_style_tags(buffer: &mut EditBuffer, document: &Document) -> Result<(), TransformError> {
    for style in &document.styles {
        buffer.remove(style.span.start, style.span.end)?;
    }
    Ok(())
}

/// Moves the instance script to the front, wraps it in `render()` and
/// rewrites its exports and reactive declarations.
fn process_script(
    buffer: &mut EditBuffer,
    script: &Script,
    slots_descriptor: &str,
) -> Result<ExportRegistry, TransformError> {
    let content = script.content_span;
    tracing::debug!(
        "Instance script at {}..{}",
        u32::from(script.span.start),
        u32::from(script.span.end)
    );

    // Variables must be declared before the template uses them.
    if u32::from(script.span.start) != 0 {
        buffer.move_range(script.span.start, script.span.end, 0u32)?;
    }

    buffer.overwrite(script.span.start, content.start, "</>;function render() {\n")?;
    let closing_tag = Span::new(content.end, script.span.end);
    if closing_tag.is_empty() {
        buffer.insert_before(closing_tag.start, ";\n<>")?;
    } else {
        buffer.overwrite(closing_tag.start, closing_tag.end, ";\n<>")?;
    }

    let script_offset = u32::from(content.start);
    let text = content.text(buffer.original()).to_string();
    let module = parse_script(&text, script_offset)?;
    let (exports, declared) = rewrite_exports(buffer, &module, script_offset)?;
    declare_implicit_reactive_variables(&declared, buffer, &module, script_offset)?;

    buffer.append(&format!(
        "\nreturn {{ props: {}, slots: {} }}}}",
        render_props(&exports),
        slots_descriptor
    ));
    Ok(exports)
}
