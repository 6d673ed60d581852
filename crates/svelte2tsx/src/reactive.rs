//! Forward declarations for implicitly declared reactive variables.
//!
//! `$: doubled = count * 2` declares `doubled` when nothing else does. The
//! type-checker needs a real declaration, so `let doubled;` is inserted
//! before the statement.

use crate::error::TransformError;
use crate::script::{ScriptModule, ScriptStatement};
use crate::types::DeclaredNames;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use source_map::EditBuffer;

/// Inserts `;let <name>; ` before every `$: <name> = ...` whose target is not
/// declared at the top level. Each name is declared once.
///
/// Must run after [`rewrite_exports`](crate::exports::rewrite_exports), which
/// produces `declared`. Returns the names that were declared.
pub fn declare_implicit_reactive_variables(
    declared: &DeclaredNames,
    buffer: &mut EditBuffer,
    module: &ScriptModule,
    script_offset: u32,
) -> Result<Vec<SmolStr>, TransformError> {
    let mut injected = Vec::new();
    let mut seen = FxHashSet::default();

    for statement in &module.statements {
        let ScriptStatement::Labeled {
            span,
            label,
            assignment: Some(assignment),
        } = statement
        else {
            continue;
        };
        if label != "$" || declared.contains(&assignment.target) {
            continue;
        }
        if !seen.insert(assignment.target.clone()) {
            continue;
        }

        let at = span.shifted(script_offset).start;
        buffer.insert_before(at, &format!(";let {}; ", assignment.target))?;
        injected.push(assignment.target.clone());
    }

    if !injected.is_empty() {
        tracing::debug!("Declared reactive variables: {:?}", injected);
    }
    Ok(injected)
}
