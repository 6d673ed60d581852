//! End-to-end transformation of whole components.

use pretty_assertions::assert_eq;
use svelte2tsx::{svelte2tsx, svelte2tsx_with_options, TransformError, TransformOptions};

const EXPORT_CLASS: &str = "\n\nexport default class {\n    $$prop_def = render().props\n    $$slot_def = render().slots\n}";

fn code(source: &str) -> String {
    svelte2tsx(source)
        .unwrap_or_else(|e| panic!("transform failed: {}", e))
        .code
}

#[test]
fn test_prop_used_by_default_slot() {
    let source = "<script>\n\texport let name = 'x';\n</script>\n<slot greeting=\"{name}\"></slot>";
    let result = svelte2tsx(source).unwrap();

    assert_eq!(result.props_descriptor, "{name}");
    assert_eq!(result.slots_descriptor, "{default: {greeting:name}}");
    assert_eq!(result.slots["default"]["greeting"], "name");
    assert_eq!(
        result.code,
        format!(
            "<></>;function render() {{\n\n\tlet name = 'x';\n;\n<>\n<slot greeting=\"{{name}}\"></slot></>\nreturn {{ props: {{name}}, slots: {{default: {{greeting:name}}}} }}}}{}",
            EXPORT_CLASS
        )
    );
}

#[test]
fn test_export_let_and_aliased_clause() {
    let result = svelte2tsx("<script>export let a = 1; export { b as c };</script>").unwrap();
    assert_eq!(result.props_descriptor, "{a , c: b}");
    assert_eq!(result.exports.len(), 2, "{:?}", result.exports);
    assert!(result.code.contains("render() {\nlet a = 1; ;\n<>"));
}

#[test]
fn test_declared_name_suppression() {
    let declared = code("<script>let x; $: x = 1;</script>");
    assert_eq!(declared.matches("let x;").count(), 1);

    let implicit = code("<script>$: y = 1;</script>");
    assert_eq!(implicit.matches(";let y; ").count(), 1);
    assert!(implicit.contains(";let y; $: y = 1;"));
}

#[test]
fn test_no_script_fallback() {
    let result = svelte2tsx("<div>\n\t<slot name=\"body\" text=\"hello\" />\n</div>").unwrap();
    assert_eq!(
        result.code,
        format!(
            "<></>;function render() {{\n<><div>\n\t<slot name=\"body\" text=\"hello\" />\n</div></>;\nreturn {{ props: {{}}, slots: {{body: {{text:\"hello\"}}}} }}}}{}",
            EXPORT_CLASS
        )
    );
    assert!(result.exports.is_empty());
}

#[test]
fn test_module_script_is_untouched() {
    let module = "<script context=\"module\">\n    export const prerender = true;\n</script>";
    let source = format!(
        "{}\n\n<script>\n    export let title;\n</script>\n\n<h1>{{title}}</h1>",
        module
    );
    let result = svelte2tsx(&source).unwrap();

    assert_eq!(result.props_descriptor, "{title}");
    assert_eq!(
        result.code,
        format!(
            "<></>;function render() {{\n\n    let title;\n;\n<>{}\n\n\n\n<h1>{{title}}</h1></>\nreturn {{ props: {{title}}, slots: {{}} }}}}{}",
            module, EXPORT_CLASS
        )
    );
}

#[test]
fn test_module_script_only() {
    let result =
        svelte2tsx("<script context=\"module\">export const a = 1;</script>\n<p/>").unwrap();
    assert!(result.code.starts_with("<></>;function render() {\n<><script context=\"module\">export const a = 1;</script>"));
    assert_eq!(result.props_descriptor, "{}");
}

#[test]
fn test_full_component() {
    let script = "\n\timport { createEventDispatcher } from 'svelte';\n\texport let items: string[] = [];\n\texport function reset() { selected = null; }\n\tlet selected: string | null = null;\n\tconst dispatch = createEventDispatcher();\n\t$: count = items.length;\n\t$: selected = items[0] ?? null;\n\texport { dispatch as notify };\n";
    let template = "\n\n<ul>\n\t{#each items as item, index}\n\t\t<li><slot name=\"item\" {item} {index} label=\"#{index}\" /></li>\n\t{/each}\n</ul>\n<footer><slot name=\"footer\" {count} /></footer>\n\n";
    let source = format!(
        "<script lang=\"ts\">{}</script>{}<style>\n\tul {{ margin: 0; }}\n</style>",
        script, template
    );

    let result = svelte2tsx(&source).unwrap();

    let rewritten_script = "\n\timport { createEventDispatcher } from 'svelte';\n\tlet items: string[] = [];\n\tfunction reset() { selected = null; }\n\tlet selected: string | null = null;\n\tconst dispatch = createEventDispatcher();\n\t;let count; $: count = items.length;\n\t$: selected = items[0] ?? null;\n\t\n";
    assert_eq!(
        result.code,
        format!(
            "<></>;function render() {{\n{};\n<>{}</>\nreturn {{ props: {{items , reset , notify: dispatch}}, slots: {{item: {{item:item, index:index, label:\"#\"+(index)}}, footer: {{count:count}}}} }}}}{}",
            rewritten_script, template, EXPORT_CLASS
        )
    );
}

#[test]
fn test_multiple_instance_scripts_use_the_first() {
    let result = svelte2tsx(
        "<script>export let first;</script>\n<script>export let second;</script>",
    )
    .unwrap();
    assert_eq!(result.props_descriptor, "{first}");
    assert!(result.code.contains("<script>export let second;</script>"));
}

#[test]
fn test_destructuring_export_fails_with_location() {
    let options = TransformOptions {
        filename: Some("Card.svelte".to_string()),
        ..Default::default()
    };
    let source = "<script>\n  const props = {};\n  export const { a } = props;\n</script>";
    let error = svelte2tsx_with_options(source, &options).unwrap_err();

    assert!(error.to_string().starts_with(
        "Card.svelte:3:16: unsupported export target: destructuring export `export const { a } = props"
    ));
    let TransformError::UnsupportedExportTarget { offset, .. } = error.root() else {
        panic!("expected unsupported export, got {:?}", error);
    };
    assert_eq!(&source[*offset..*offset + 5], "{ a }");
}

#[test]
fn test_export_default_fails() {
    let error = svelte2tsx("<script>\nexport default { a: 1 };\n</script>").unwrap_err();
    assert!(matches!(
        error,
        TransformError::UnsupportedExportTarget { offset: 9, .. }
    ));
}

#[test]
fn test_dynamic_slot_name_fails() {
    let error = svelte2tsx("<slot name={which} />").unwrap_err();
    insta::assert_snapshot!(error.to_string(), @"malformed attribute `name` on slot `default`");
}

#[test]
fn test_script_syntax_error() {
    let error = svelte2tsx("<script>let = ;</script>").unwrap_err();
    let TransformError::ScriptParse { offset, .. } = error else {
        panic!("expected script parse error, got {:?}", error);
    };
    assert!(offset >= 8);
}

#[test]
fn test_empty_quoted_slot_props() {
    let result = svelte2tsx(r#"<slot title="" other="x" />"#).unwrap();
    assert_eq!(result.slots_descriptor, r#"{default: {title:"", other:"x"}}"#);

    let result = svelte2tsx(r#"<slot name="" a={1} />"#).unwrap();
    assert_eq!(result.slots_descriptor, r#"{"": {a:1}}"#);
}
