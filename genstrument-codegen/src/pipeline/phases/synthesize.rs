//! Synthesize phase - resolves types and builds the wrapper records.

use eyre::{OptionExt, Result};

use crate::{
    Synthesizer,
    pipeline::{CompilationContext, Phase},
    resolve::Scope,
};

/// Phase that produces the [`TemplateData`](genstrument_ir::TemplateData)
/// for the renderers.
///
/// The resolution scope (alias table, package lookups, setter inference
/// cache) lives for this phase only.
pub struct SynthesizePhase;

impl Phase for SynthesizePhase {
    fn name(&self) -> &'static str {
        "synthesize"
    }

    fn description(&self) -> &'static str {
        "Resolve types and build the wrapper records"
    }

    fn run(&self, ctx: &mut CompilationContext) -> Result<()> {
        let syntax = ctx.syntax.as_ref().ok_or_eyre("the parse phase has not run")?;
        let model = ctx.model.as_ref().ok_or_eyre("the model phase has not run")?;
        let package = ctx.input.destination_package(&syntax.package);

        let mut scope = Scope::new(
            &mut *ctx.loader,
            syntax,
            &ctx.input.source_path,
            &ctx.input.destination_path,
            &ctx.options.runtime.package,
        );
        let (output, diagnostics) =
            Synthesizer::new(&mut scope, &ctx.options.naming, &ctx.input.filename)
                .synthesize(model, &package)?;
        drop(scope);

        ctx.diagnostics.extend(diagnostics);
        ctx.output = Some(output);
        Ok(())
    }
}
