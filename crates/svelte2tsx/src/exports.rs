//! Rewriting of the instance script's exports into props.
//!
//! In a component, `export let name` declares a prop rather than a module
//! export. The `export` modifiers and clauses are removed from the buffer and
//! the exported names are collected so the assembler can return them as the
//! component's `props`.

use crate::error::TransformError;
use crate::script::{Binding, ExportName, ScriptModule, ScriptStatement};
use crate::types::{DeclaredNames, ExportRegistry};
use smol_str::SmolStr;
use source_map::{EditBuffer, Span};

/// Removes exports from the script and returns the props they declare along
/// with every name declared at the top level.
///
/// `script_offset` is the offset of the script content in the component.
pub fn rewrite_exports(
    buffer: &mut EditBuffer,
    module: &ScriptModule,
    script_offset: u32,
) -> Result<(ExportRegistry, DeclaredNames), TransformError> {
    let mut exports = ExportRegistry::default();
    let mut declared = DeclaredNames::default();

    for statement in &module.statements {
        match statement {
            ScriptStatement::Variable {
                span,
                export_keyword,
                declarators,
            } => {
                for binding in declarators {
                    match binding {
                        Binding::Identifier { name, .. } => {
                            if export_keyword.is_some() {
                                exports.insert(name.clone(), None);
                            }
                            declared.insert(name.clone());
                        }
                        Binding::Pattern { span: pattern, names } => {
                            if export_keyword.is_some() {
                                return Err(unsupported(
                                    buffer,
                                    "destructuring export",
                                    *span,
                                    pattern.start,
                                    script_offset,
                                ));
                            }
                            declared.extend(names.iter().cloned());
                        }
                    }
                }
                remove_keyword(buffer, *export_keyword, script_offset)?;
            }
            ScriptStatement::Function {
                name,
                export_keyword,
                ..
            }
            | ScriptStatement::Class {
                name,
                export_keyword,
                ..
            } => {
                if export_keyword.is_some() {
                    exports.insert(name.clone(), None);
                }
                declared.insert(name.clone());
                remove_keyword(buffer, *export_keyword, script_offset)?;
            }
            ScriptStatement::ExportClause {
                span,
                specifiers,
                has_source,
                type_only,
            } => {
                if !has_source && !type_only {
                    for specifier in specifiers.iter().filter(|s| !s.type_only) {
                        let name = |name| {
                            identifier(buffer, name, *span, specifier.span, script_offset)
                        };
                        let local = name(&specifier.local)?;
                        let exported = specifier.exported.as_ref().map(name).transpose()?;
                        let alias = exported.filter(|exported| *exported != local);
                        exports.insert(local, alias);
                    }
                }
                let span = span.shifted(script_offset);
                buffer.remove(span.start, span.end)?;
            }
            ScriptStatement::ExportDefault { span } => {
                return Err(unsupported(
                    buffer,
                    "default export",
                    *span,
                    span.start,
                    script_offset,
                ));
            }
            ScriptStatement::TypeDeclaration { export_keyword, .. } => {
                remove_keyword(buffer, *export_keyword, script_offset)?;
            }
            ScriptStatement::Labeled { .. } | ScriptStatement::Other { .. } => {}
        }
    }

    tracing::debug!(
        "Registered {} exports, {} top-level names",
        exports.len(),
        declared.len()
    );
    Ok((exports, declared))
}

/// Renders the registry as the object literal returned as `props`.
///
/// Aliased entries render `alias: local`, others the bare name:
/// `{a , c: b}`.
pub fn render_props(exports: &ExportRegistry) -> String {
    let entries: Vec<String> = exports
        .iter()
        .map(|(local, alias)| match alias {
            Some(alias) => format!("{}: {}", alias, local),
            None => local.to_string(),
        })
        .collect();
    format!("{{{}}}", entries.join(" , "))
}

fn remove_keyword(
    buffer: &mut EditBuffer,
    keyword: Option<Span>,
    script_offset: u32,
) -> Result<(), TransformError> {
    if let Some(keyword) = keyword {
        let keyword = keyword.shifted(script_offset);
        buffer.remove(keyword.start, keyword.end)?;
    }
    Ok(())
}

fn identifier(
    buffer: &EditBuffer,
    name: &ExportName,
    statement: Span,
    specifier: Span,
    script_offset: u32,
) -> Result<SmolStr, TransformError> {
    match name {
        ExportName::Identifier(name) => Ok(name.clone()),
        ExportName::StringLiteral(_) => Err(unsupported(
            buffer,
            "string export name",
            statement,
            specifier.start,
            script_offset,
        )),
    }
}

/// Builds an `UnsupportedExportTarget` naming the construct and quoting the
/// first line of its statement.
fn unsupported(
    buffer: &EditBuffer,
    kind: &str,
    statement: Span,
    at: source_map::ByteOffset,
    script_offset: u32,
) -> TransformError {
    let text = statement.shifted(script_offset).text(buffer.original());
    let first_line = text.lines().next().unwrap_or_default().trim();
    TransformError::UnsupportedExportTarget {
        construct: format!("{} `{}`", kind, first_line),
        offset: (u32::from(at) + script_offset) as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse_script;
    use pretty_assertions::assert_eq;

    /// Rewrites a bare script (offset 0) and returns the props and new text.
    fn rewrite(script: &str) -> Result<(ExportRegistry, DeclaredNames, String), TransformError> {
        let module = parse_script(script, 0)?;
        let mut buffer = EditBuffer::new(script);
        let (exports, declared) = rewrite_exports(&mut buffer, &module, 0)?;
        Ok((exports, declared, buffer.finish().code))
    }

    #[test]
    fn test_export_let_and_clause() {
        let (exports, _, code) =
            rewrite("let b = 2;\nexport let a = 1; export { b as c };").unwrap();
        assert_eq!(render_props(&exports), "{a , c: b}");
        assert_eq!(code, "let b = 2;\nlet a = 1; ");
    }

    #[test]
    fn test_export_functions_and_classes() {
        let script = "export function greet() {}\nexport class Store {}\nfunction local() {}";
        let (exports, declared, code) = rewrite(script).unwrap();
        assert_eq!(
            exports.keys().map(|k| k.as_str()).collect::<Vec<_>>(),
            vec!["greet", "Store"]
        );
        assert!(declared.contains("local"));
        assert_eq!(code, "function greet() {}\nclass Store {}\nfunction local() {}");
    }

    #[test]
    fn test_multiple_declarators() {
        let (exports, declared, code) = rewrite("export let x = 1, y;").unwrap();
        assert_eq!(render_props(&exports), "{x , y}");
        assert_eq!(declared.len(), 2);
        assert_eq!(code, "let x = 1, y;");
    }

    #[test]
    fn test_declared_names_include_patterns() {
        let (exports, declared, _) = rewrite("const { a, b: [c] } = obj;\nlet d;").unwrap();
        assert!(exports.is_empty());
        for name in ["a", "c", "d"] {
            assert!(declared.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_same_name_alias_is_not_an_alias() {
        let (exports, _, _) = rewrite("let a; export { a as a };").unwrap();
        assert_eq!(exports.get("a"), Some(&None));
    }

    #[test]
    fn test_type_exports_and_reexports_are_dropped() {
        let script = "export interface Props { a: string }\nexport type { T } from './t';\nexport * from './all';\nexport { x } from './x';";
        let (exports, _, code) = rewrite(script).unwrap();
        assert!(exports.is_empty());
        assert_eq!(code, "interface Props { a: string }\n\n\n");
    }

    #[test]
    fn test_inline_type_specifier_is_skipped() {
        let (exports, _, _) = rewrite("let a; type T = 1; export { a, type T };").unwrap();
        assert_eq!(render_props(&exports), "{a}");
    }

    #[test]
    fn test_destructuring_export_is_rejected() {
        let error = rewrite("let x;\nexport const { a, b } = obj;").unwrap_err();
        let TransformError::UnsupportedExportTarget { construct, offset } = error else {
            panic!("expected unsupported export");
        };
        assert!(construct.starts_with("destructuring export `export const { a, b } = obj"));
        assert_eq!(offset, 20);
    }

    #[test]
    fn test_default_export_is_rejected() {
        let error = rewrite("export default {};").unwrap_err();
        assert!(matches!(
            error,
            TransformError::UnsupportedExportTarget { offset: 0, .. }
        ));
    }

    #[test]
    fn test_string_export_name_is_rejected() {
        let error = rewrite(r#"let a; export { a as "a-b" };"#).unwrap_err();
        let TransformError::UnsupportedExportTarget { construct, offset } = error else {
            panic!("expected unsupported export");
        };
        assert!(construct.starts_with("string export name"));
        assert_eq!(offset, 16);
    }

    #[test]
    fn test_offsets_are_shifted_by_script_offset() {
        let source = "<script>export let a;</script>";
        let module = parse_script(&source[8..21], 8).unwrap();
        let mut buffer = EditBuffer::new(source);
        rewrite_exports(&mut buffer, &module, 8).unwrap();
        assert_eq!(buffer.finish().code, "<script>let a;</script>");
    }
}
