//! Model phase - builds the semantic model from the directives.

use eyre::{OptionExt, Result};

use crate::{
    ModelBuilder,
    pipeline::{CompilationContext, Phase},
};

/// Phase that turns the declarations marked for wrapping into a
/// [`ParsedFile`](genstrument_ir::ParsedFile).
pub struct ModelPhase;

impl Phase for ModelPhase {
    fn name(&self) -> &'static str {
        "model"
    }

    fn description(&self) -> &'static str {
        "Build the semantic model from +genstrument directives"
    }

    fn run(&self, ctx: &mut CompilationContext) -> Result<()> {
        let syntax = ctx.syntax.as_ref().ok_or_eyre("the parse phase has not run")?;
        let (model, diagnostics) =
            ModelBuilder::new(&ctx.input.filename, &ctx.input.source_path).build(syntax);
        if model.is_empty() && diagnostics.is_empty() {
            ctx.add_warning(
                self.name(),
                format!(
                    "{}: no declarations are marked with +genstrument:wrap",
                    ctx.input.filename
                ),
            );
        }
        ctx.diagnostics.extend(diagnostics);
        ctx.model = Some(model);
        Ok(())
    }
}
