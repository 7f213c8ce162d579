//! Parse phase - reads the declarations of the input file.

use eyre::Result;

use crate::pipeline::{CompilationContext, Phase};

/// Phase that parses the input source.
///
/// Syntax errors are fatal; they carry the offending source span.
pub struct ParsePhase;

impl Phase for ParsePhase {
    fn name(&self) -> &'static str {
        "parse"
    }

    fn description(&self) -> &'static str {
        "Read the declarations of the input file"
    }

    fn run(&self, ctx: &mut CompilationContext) -> Result<()> {
        let file = genstrument_source::parse_str(&ctx.input.source, &ctx.input.filename)?;
        tracing::debug!(
            package = %file.package,
            imports = file.imports.len(),
            decls = file.decls.len(),
            "parsed input"
        );
        ctx.syntax = Some(file);
        Ok(())
    }
}
