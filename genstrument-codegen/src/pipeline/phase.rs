use eyre::Result;

use super::CompilationContext;

/// One step of the pipeline.
///
/// The built-in steps are `parse`, `model` and `synthesize`, in that order.
pub trait Phase: Send + Sync {
    /// Identifies the phase in diagnostics, plugin hooks and snapshot files.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Problems with the input belong in `ctx.diagnostics`; an `Err` aborts
    /// the whole run.
    fn run(&self, ctx: &mut CompilationContext) -> Result<()>;
}
