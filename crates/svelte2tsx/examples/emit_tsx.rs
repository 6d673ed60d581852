//! Prints the TSX generated for a Svelte component.
//!
//! ```text
//! cargo run -p svelte2tsx --example emit_tsx -- src/lib/Button.svelte
//! ```

use miette::{miette, IntoDiagnostic, NamedSource, Report};
use std::fs;
use svelte2tsx::{svelte2tsx_with_options, TransformOptions};

fn main() -> miette::Result<()> {
    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| miette!("Usage: emit_tsx <file.svelte>"))?;
    let source = fs::read_to_string(&path).into_diagnostic()?;

    let options = TransformOptions {
        filename: Some(path.clone()),
        source_maps: true,
    };
    match svelte2tsx_with_options(&source, &options) {
        Ok(result) => {
            println!("{}", result.code);
            Ok(())
        }
        Err(error) => Err(Report::new(error).with_source_code(NamedSource::new(path, source))),
    }
}
