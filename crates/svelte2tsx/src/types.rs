//! Registries shared between passes, and the synthetic component export.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use std::path::Path;

/// Slot name (`"default"` when unnamed) to its props, in source order.
/// Each prop maps to the expression text that renders its value.
pub type SlotRegistry = IndexMap<SmolStr, IndexMap<SmolStr, String>>;

/// Local name to optional exported alias, in declaration order.
pub type ExportRegistry = IndexMap<SmolStr, Option<SmolStr>>;

/// Identifiers declared at the top level of the instance script.
pub type DeclaredNames = FxHashSet<SmolStr>;

/// Generates the default export the type-checker reads props and slots from.
///
/// Produces output like:
/// ```text
/// export default class __SvelteComponent_Counter_ {
///     $$prop_def = render().props
///     $$slot_def = render().slots
/// }
/// ```
///
/// Without a component name the class is anonymous.
pub fn generate_component_export(component_name: Option<&str>) -> String {
    let header = match component_name {
        Some(name) => format!("export default class __SvelteComponent_{}_ {{", name),
        None => "export default class {".to_string(),
    };
    format!(
        "\n\n{}\n    $$prop_def = render().props\n    $$slot_def = render().slots\n}}",
        header
    )
}

/// Extracts a component name from a filename.
///
/// Given a path like `/path/to/Counter.svelte`, returns `"Counter"`.
/// Returns `"Component"` if no valid name can be extracted.
pub fn component_name_from_path(path: &str) -> String {
    let name = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Component");

    sanitize_component_name(name)
}

/// Turns a file stem into a PascalCase TypeScript identifier.
/// `-` and `.` start a new word; leading non-letters (`+page`) are dropped.
fn sanitize_component_name(name: &str) -> String {
    let name = name.trim_start_matches(|c: char| !c.is_alphabetic());

    let mut result = String::with_capacity(name.len());
    let mut capitalize_next = true;
    for c in name.chars() {
        if c.is_alphanumeric() || c == '_' {
            if capitalize_next {
                result.push(c.to_ascii_uppercase());
                capitalize_next = false;
            } else {
                result.push(c);
            }
        } else if c == '-' || c == '.' {
            capitalize_next = true;
        }
    }

    if result.is_empty() {
        "Component".to_string()
    } else {
        result
    }
}

/// Renders `key` as an object literal key, quoting it unless it is a plain
/// identifier.
pub(crate) fn property_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        string_literal(key)
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Renders `text` as a double-quoted JavaScript string literal.
pub(crate) fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_component_export() {
        assert_eq!(
            generate_component_export(None),
            "\n\nexport default class {\n    $$prop_def = render().props\n    $$slot_def = render().slots\n}"
        );
    }

    #[test]
    fn test_named_component_export() {
        let export = generate_component_export(Some("Counter"));
        assert!(export.starts_with("\n\nexport default class __SvelteComponent_Counter_ {\n"));
        assert!(export.ends_with("$$slot_def = render().slots\n}"));
    }

    #[test]
    fn test_component_name_from_path() {
        assert_eq!(component_name_from_path("Counter.svelte"), "Counter");
        assert_eq!(
            component_name_from_path("/path/to/MyComponent.svelte"),
            "MyComponent"
        );
        assert_eq!(component_name_from_path(""), "Component");
        assert_eq!(component_name_from_path("+page.svelte"), "Page");
        assert_eq!(component_name_from_path("src/date-picker.svelte"), "DatePicker");
    }

    #[test]
    fn test_sanitize_component_name() {
        assert_eq!(sanitize_component_name("+layout"), "Layout");
        assert_eq!(sanitize_component_name("my-component"), "MyComponent");
        assert_eq!(sanitize_component_name("+++"), "Component");
    }

    #[test]
    fn test_property_key() {
        assert_eq!(property_key("header"), "header");
        assert_eq!(property_key("$item_2"), "$item_2");
        assert_eq!(property_key("header-left"), "\"header-left\"");
        assert_eq!(property_key("2col"), "\"2col\"");
    }

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(string_literal("plain"), "\"plain\"");
        assert_eq!(string_literal("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\"");
        assert_eq!(string_literal("a\\b"), "\"a\\\\b\"");
    }
}
