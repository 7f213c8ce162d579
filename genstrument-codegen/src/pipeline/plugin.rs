//! Hooks around pipeline phases.

use eyre::Result;

use super::CompilationContext;

/// Observer of the pipeline, called around every phase.
///
/// Hooks see the context as the phase leaves it; [`SnapshotPlugin`]
/// records it after each phase.
///
/// An error returned from a hook aborts the pipeline.
///
/// [`SnapshotPlugin`]: super::SnapshotPlugin
pub trait Plugin: Send + Sync {
    /// Short name, used in logs.
    fn name(&self) -> &'static str;

    #[allow(unused_variables)]
    fn on_before_phase(&self, phase: &str, ctx: &mut CompilationContext) -> Result<()> {
        Ok(())
    }

    #[allow(unused_variables)]
    fn on_after_phase(&self, phase: &str, ctx: &mut CompilationContext) -> Result<()> {
        Ok(())
    }
}

impl<P: Plugin + ?Sized> Plugin for std::sync::Arc<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn on_before_phase(&self, phase: &str, ctx: &mut CompilationContext) -> Result<()> {
        (**self).on_before_phase(phase, ctx)
    }

    fn on_after_phase(&self, phase: &str, ctx: &mut CompilationContext) -> Result<()> {
        (**self).on_after_phase(phase, ctx)
    }
}
