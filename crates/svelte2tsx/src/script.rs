//! Statement-level view of the instance script.
//!
//! The script content is parsed standalone with `swc_ecma_parser` and reduced
//! to the top-level statements the export and reactive passes care about.
//! All spans are relative to the start of the script content.

use std::sync::Arc;

use smol_str::SmolStr;
use source_map::Span;
use swc_common::{FileName, SourceMap, Spanned};
use swc_ecma_ast::{
    AssignOp, AssignTarget, Decl, ExportSpecifier as SwcExportSpecifier, Expr, Module, ModuleDecl,
    ModuleExportName, ModuleItem, ObjectPatProp, Pat, SimpleAssignTarget, Stmt,
};
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};

use crate::error::TransformError;

/// The top-level statements of a script, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptModule {
    /// The statements.
    pub statements: Vec<ScriptStatement>,
}

/// A classified top-level statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStatement {
    /// `let`/`const`/`var`, optionally exported.
    Variable {
        span: Span,
        /// `export` plus the whitespace after it.
        export_keyword: Option<Span>,
        declarators: Vec<Binding>,
    },
    /// A function declaration, optionally exported.
    Function {
        span: Span,
        name: SmolStr,
        export_keyword: Option<Span>,
    },
    /// A class declaration, optionally exported.
    Class {
        span: Span,
        name: SmolStr,
        export_keyword: Option<Span>,
    },
    /// `export { a, b as c }`, `export { x } from "mod"` or `export * from "mod"`.
    ExportClause {
        span: Span,
        specifiers: Vec<ExportSpecifier>,
        /// Whether the clause re-exports from another module.
        has_source: bool,
        /// `export type { ... }`
        type_only: bool,
    },
    /// `export default ...` or `export = ...`
    ExportDefault { span: Span },
    /// `type`, `interface`, `enum`, `namespace` and `declare` statements.
    TypeDeclaration {
        span: Span,
        export_keyword: Option<Span>,
    },
    /// `label: body`
    Labeled {
        span: Span,
        label: SmolStr,
        /// Set when the body is `name = expr;` with a bare identifier target.
        assignment: Option<ReactiveAssignment>,
    },
    /// Anything else.
    Other { span: Span },
}

impl ScriptStatement {
    /// Returns the span of the statement.
    pub fn span(&self) -> Span {
        match self {
            ScriptStatement::Variable { span, .. }
            | ScriptStatement::Function { span, .. }
            | ScriptStatement::Class { span, .. }
            | ScriptStatement::ExportClause { span, .. }
            | ScriptStatement::ExportDefault { span }
            | ScriptStatement::TypeDeclaration { span, .. }
            | ScriptStatement::Labeled { span, .. }
            | ScriptStatement::Other { span } => *span,
        }
    }
}

/// A declarator's binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// `let name`
    Identifier { name: SmolStr },
    /// `let { a, b: [c] } = ...`; `names` holds every bound identifier.
    Pattern { span: Span, names: Vec<SmolStr> },
}

/// One element of an export clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSpecifier {
    pub span: Span,
    pub local: ExportName,
    pub exported: Option<ExportName>,
    /// `export { type T }`
    pub type_only: bool,
}

/// A name in an export clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportName {
    Identifier(SmolStr),
    /// `"x-y"`, kept with its quotes.
    StringLiteral(String),
}

/// The `name = ...` inside a `$:` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactiveAssignment {
    pub target: SmolStr,
}

/// Parses script content into a [`ScriptModule`].
///
/// `content_offset` is where the content starts in the component source; it
/// is only used to place parse errors.
pub fn parse_script(content: &str, content_offset: u32) -> Result<ScriptModule, TransformError> {
    let cm: Arc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        FileName::Custom("svelte-instance-script".into()).into(),
        content.to_string(),
    );
    let syntax = Syntax::Typescript(TsSyntax {
        tsx: false,
        ..Default::default()
    });
    let mut parser = Parser::new(syntax, StringInput::from(&*fm), None);
    let module = parser.parse_module().map_err(|error| {
        let span = error.span();
        TransformError::ScriptParse {
            message: error.kind().msg().to_string(),
            offset: (content_offset + span.lo.0.saturating_sub(fm.start_pos.0)) as usize,
        }
    })?;

    let lower = Lower {
        content,
        base: fm.start_pos.0,
    };
    Ok(lower.module(&module))
}

/// Converts swc nodes into [`ScriptStatement`]s.
struct Lower<'a> {
    content: &'a str,
    /// `BytePos` of the first byte of `content`.
    base: u32,
}

impl Lower<'_> {
    fn span(&self, span: swc_common::Span) -> Span {
        Span::new(
            span.lo.0.saturating_sub(self.base),
            span.hi.0.saturating_sub(self.base),
        )
    }

    /// `export` at `start` plus the whitespace that follows it.
    fn export_keyword(&self, start: u32) -> Option<Span> {
        let rest = self.content.get(start as usize..)?.strip_prefix("export")?;
        let keyword_end = start as usize + "export".len();
        let whitespace = rest.len() - rest.trim_start().len();
        Some(Span::from_usize(start as usize, keyword_end + whitespace))
    }

    fn module(&self, module: &Module) -> ScriptModule {
        let statements = module
            .body
            .iter()
            .map(|item| match item {
                ModuleItem::ModuleDecl(decl) => self.module_decl(decl),
                ModuleItem::Stmt(stmt) => self.stmt(stmt),
            })
            .collect();
        ScriptModule { statements }
    }

    fn module_decl(&self, decl: &ModuleDecl) -> ScriptStatement {
        let span = self.span(decl.span());
        match decl {
            ModuleDecl::ExportDecl(export) => {
                let export_keyword = self.export_keyword(span.start.into());
                self.decl(&export.decl, span, export_keyword)
            }
            ModuleDecl::ExportNamed(named) => ScriptStatement::ExportClause {
                span,
                specifiers: named
                    .specifiers
                    .iter()
                    .filter_map(|spec| self.export_specifier(spec))
                    .collect(),
                has_source: named.src.is_some(),
                type_only: named.type_only,
            },
            ModuleDecl::ExportAll(_) => ScriptStatement::ExportClause {
                span,
                specifiers: Vec::new(),
                has_source: true,
                type_only: false,
            },
            ModuleDecl::ExportDefaultDecl(_)
            | ModuleDecl::ExportDefaultExpr(_)
            | ModuleDecl::TsExportAssignment(_) => ScriptStatement::ExportDefault { span },
            _ => ScriptStatement::Other { span },
        }
    }

    fn stmt(&self, stmt: &Stmt) -> ScriptStatement {
        let span = self.span(stmt.span());
        match stmt {
            Stmt::Decl(decl) => self.decl(decl, span, None),
            Stmt::Labeled(labeled) => ScriptStatement::Labeled {
                span,
                label: SmolStr::new(&*labeled.label.sym),
                assignment: self.reactive_assignment(&labeled.body),
            },
            _ => ScriptStatement::Other { span },
        }
    }

    fn decl(&self, decl: &Decl, span: Span, export_keyword: Option<Span>) -> ScriptStatement {
        match decl {
            Decl::Var(var) if !var.declare => ScriptStatement::Variable {
                span,
                export_keyword,
                declarators: var.decls.iter().map(|d| self.binding(&d.name)).collect(),
            },
            Decl::Fn(func) if !func.declare => ScriptStatement::Function {
                span,
                name: SmolStr::new(&*func.ident.sym),
                export_keyword,
            },
            Decl::Class(class) if !class.declare => ScriptStatement::Class {
                span,
                name: SmolStr::new(&*class.ident.sym),
                export_keyword,
            },
            Decl::Var(_)
            | Decl::Fn(_)
            | Decl::Class(_)
            | Decl::TsInterface(_)
            | Decl::TsTypeAlias(_)
            | Decl::TsEnum(_)
            | Decl::TsModule(_) => ScriptStatement::TypeDeclaration {
                span,
                export_keyword,
            },
            _ => ScriptStatement::Other { span },
        }
    }

    fn binding(&self, pat: &Pat) -> Binding {
        match pat {
            Pat::Ident(ident) => Binding::Identifier {
                name: SmolStr::new(&*ident.id.sym),
            },
            _ => {
                let mut names = Vec::new();
                collect_bound_names(pat, &mut names);
                Binding::Pattern {
                    span: self.span(pat.span()),
                    names,
                }
            }
        }
    }

    fn export_specifier(&self, spec: &SwcExportSpecifier) -> Option<ExportSpecifier> {
        let SwcExportSpecifier::Named(named) = spec else {
            return None;
        };
        Some(ExportSpecifier {
            span: self.span(named.span),
            local: self.export_name(&named.orig),
            exported: named.exported.as_ref().map(|name| self.export_name(name)),
            type_only: named.is_type_only,
        })
    }

    fn export_name(&self, name: &ModuleExportName) -> ExportName {
        match name {
            ModuleExportName::Ident(ident) => ExportName::Identifier(SmolStr::new(&*ident.sym)),
            ModuleExportName::Str(string) => {
                ExportName::StringLiteral(self.span(string.span).text(self.content).to_string())
            }
        }
    }

    fn reactive_assignment(&self, body: &Stmt) -> Option<ReactiveAssignment> {
        let Stmt::Expr(expr_stmt) = body else {
            return None;
        };
        let Expr::Assign(assign) = &*expr_stmt.expr else {
            return None;
        };
        if assign.op != AssignOp::Assign {
            return None;
        }
        let AssignTarget::Simple(SimpleAssignTarget::Ident(ident)) = &assign.left else {
            return None;
        };
        Some(ReactiveAssignment {
            target: SmolStr::new(&*ident.id.sym),
        })
    }
}

fn collect_bound_names(pat: &Pat, names: &mut Vec<SmolStr>) {
    match pat {
        Pat::Ident(ident) => names.push(SmolStr::new(&*ident.id.sym)),
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                collect_bound_names(elem, names);
            }
        }
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => collect_bound_names(&kv.value, names),
                    ObjectPatProp::Assign(assign) => {
                        names.push(SmolStr::new(&*assign.key.id.sym))
                    }
                    ObjectPatProp::Rest(rest) => collect_bound_names(&rest.arg, names),
                }
            }
        }
        Pat::Rest(rest) => collect_bound_names(&rest.arg, names),
        Pat::Assign(assign) => collect_bound_names(&assign.left, names),
        Pat::Invalid(_) | Pat::Expr(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use text_size::TextSize;

    fn parse(content: &str) -> Vec<ScriptStatement> {
        parse_script(content, 0).unwrap().statements
    }

    #[test]
    fn test_exported_variable() {
        let content = "export let name = 'x';";
        let statements = parse(content);
        assert_eq!(
            statements,
            vec![ScriptStatement::Variable {
                span: Span::new(0u32, 22u32),
                export_keyword: Some(Span::new(0u32, 7u32)),
                declarators: vec![Binding::Identifier {
                    name: SmolStr::new("name"),
                }],
            }]
        );
    }

    #[test]
    fn test_export_keyword_includes_newlines() {
        let content = "export\n  function greet() {}";
        let statements = parse(content);
        let [ScriptStatement::Function {
            name,
            export_keyword: Some(keyword),
            ..
        }] = statements.as_slice()
        else {
            panic!("expected exported function");
        };
        assert_eq!(name, "greet");
        assert_eq!(keyword.text(content), "export\n  ");
    }

    #[test]
    fn test_destructuring_binding_names() {
        let content = "const { a, b: [c, ...d], e = 1 } = obj;";
        let statements = parse(content);
        let [ScriptStatement::Variable { declarators, .. }] = statements.as_slice() else {
            panic!("expected variable");
        };
        let [Binding::Pattern { names, .. }] = declarators.as_slice() else {
            panic!("expected pattern");
        };
        assert_eq!(names, &["a", "c", "d", "e"]);
    }

    #[test]
    fn test_export_clause() {
        let content = r#"export { a, b as c, type T, d as "d-e" };"#;
        let statements = parse(content);
        let [ScriptStatement::ExportClause {
            specifiers,
            has_source,
            type_only,
            ..
        }] = statements.as_slice()
        else {
            panic!("expected export clause");
        };
        assert!(!has_source);
        assert!(!type_only);
        assert_eq!(specifiers.len(), 4);
        assert_eq!(specifiers[0].local, ExportName::Identifier("a".into()));
        assert_eq!(specifiers[0].exported, None);
        assert_eq!(
            specifiers[1].exported,
            Some(ExportName::Identifier("c".into()))
        );
        assert!(specifiers[2].type_only);
        assert_eq!(
            specifiers[3].exported,
            Some(ExportName::StringLiteral("\"d-e\"".to_string()))
        );
    }

    #[test]
    fn test_reexports_and_defaults() {
        let statements = parse(
            "export { x } from './x';\nexport * from './y';\nexport default 42;",
        );
        assert!(matches!(
            statements[0],
            ScriptStatement::ExportClause {
                has_source: true,
                ..
            }
        ));
        assert!(matches!(
            statements[1],
            ScriptStatement::ExportClause {
                has_source: true,
                ..
            }
        ));
        assert!(matches!(statements[2], ScriptStatement::ExportDefault { .. }));
        assert_eq!(statements[2].span().start, TextSize::from(46));
    }

    #[test]
    fn test_reactive_assignments() {
        let content = "$: doubled = count * 2;\n$: total += 1;\n$: obj.x = 1;\n$: { run(); }";
        let statements = parse(content);
        let assignments: Vec<Option<SmolStr>> = statements
            .iter()
            .map(|stmt| match stmt {
                ScriptStatement::Labeled { label, assignment, .. } => {
                    assert_eq!(label, "$");
                    assignment.as_ref().map(|a| a.target.clone())
                }
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(
            assignments,
            vec![Some(SmolStr::new("doubled")), None, None, None]
        );
        assert_eq!(statements[1].span().start, TextSize::from(24));
    }

    #[test]
    fn test_type_declarations() {
        let statements = parse(
            "export interface Props { a: string }\ntype T = number;\nexport declare const x: T;",
        );
        assert_eq!(statements.len(), 3);
        for stmt in &statements {
            assert!(matches!(stmt, ScriptStatement::TypeDeclaration { .. }));
        }
        assert!(matches!(
            statements[0],
            ScriptStatement::TypeDeclaration {
                export_keyword: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_other_statements() {
        let statements = parse("import { onMount } from 'svelte';\nonMount(() => {});");
        assert!(statements
            .iter()
            .all(|stmt| matches!(stmt, ScriptStatement::Other { .. })));
    }

    #[test]
    fn test_parse_error_offset_is_absolute() {
        let error = parse_script("let = ;", 100).unwrap_err();
        let TransformError::ScriptParse { offset, .. } = error else {
            panic!("expected script parse error");
        };
        assert!(offset >= 100);
    }
}
