//! Svelte component to TSX transformation for type-checking.
//!
//! This crate rewrites a Svelte component into a TSX module whose default
//! export exposes the component's props and slots to a TypeScript
//! type-checker. It handles:
//! - Extracting `<slot>` definitions and the props they pass
//! - Turning `export let` / `export function` / `export { a as b }` into props
//! - Declaring variables introduced by reactive `$: x = ...` statements
//! - Wrapping script and template in a `render()` function
//! - Building a source map back to the component
//!
//! # Example
//!
//! ```
//! use svelte2tsx::svelte2tsx;
//!
//! let source = r#"
//! <script>
//!     export let name = 'world';
//!     $: greeting = `Hello ${name}`;
//! </script>
//!
//! <slot {greeting} />
//! "#;
//!
//! let result = svelte2tsx(source).unwrap();
//! assert!(result.code.contains(";let greeting; $: greeting"));
//! assert_eq!(result.props_descriptor, "{name}");
//! assert_eq!(result.slots_descriptor, "{default: {greeting:greeting}}");
//! ```

mod error;
mod exports;
mod htmlx;
mod reactive;
mod script;
mod slots;
mod transform;
mod types;

pub use error::TransformError;
pub use exports::{render_props, rewrite_exports};
pub use htmlx::{FragmentConverter, MarkupConverter};
pub use reactive::declare_implicit_reactive_variables;
pub use script::{
    parse_script, Binding, ExportName, ExportSpecifier, ReactiveAssignment, ScriptModule,
    ScriptStatement,
};
pub use slots::{attribute_value_as_expression, extract_slots, render_slots};
pub use transform::{
    svelte2tsx, svelte2tsx_with_options, transform_batch, transform_document, Svelte2TsxResult,
    TransformOptions,
};
pub use types::{
    component_name_from_path, generate_component_export, DeclaredNames, ExportRegistry,
    SlotRegistry,
};
