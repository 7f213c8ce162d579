//! Runs phases in order with plugin hooks around each.

use eyre::{Result, bail};

use super::{
    CompilationContext, Input, Phase, Plugin,
    phases::{ModelPhase, ParsePhase, SynthesizePhase},
};
use crate::{Options, loader::PackageLoader};

/// Phases and plugins for turning one Go file into wrapper records.
///
/// `parse`, `model` and `synthesize` always run first; phases added with
/// [`Pipeline::phase`] run after them in insertion order.
///
/// ```ignore
/// let mut ctx = Pipeline::new()
///     .plugin(SnapshotPlugin::with_output_dir(".genstrument"))
///     .run(input, options, Box::new(loader))?;
/// let records = ctx.take_output()?;
/// ```
#[derive(Default)]
pub struct Pipeline {
    phases: Vec<Box<dyn Phase>>,
    plugins: Vec<Box<dyn Plugin>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(mut self, phase: impl Phase + 'static) -> Self {
        self.phases.push(Box::new(phase));
        self
    }

    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Analyse `input`, collecting diagnostics from every phase.
    ///
    /// # Errors
    ///
    /// Returns an error if any phase fails fatally, or if any phase recorded
    /// an error diagnostic. The report then lists every error diagnostic as
    /// `<file>:<line>: <message>`, one per line.
    pub fn run(
        &self,
        input: Input,
        options: Options,
        loader: Box<dyn PackageLoader>,
    ) -> Result<CompilationContext> {
        let mut ctx = CompilationContext::new(input, options, loader);

        let builtin: [&dyn Phase; 3] = [&ParsePhase, &ModelPhase, &SynthesizePhase];
        for phase in builtin {
            self.run_phase(phase, &mut ctx)?;
        }
        for phase in &self.phases {
            self.run_phase(phase.as_ref(), &mut ctx)?;
        }

        if ctx.has_errors() {
            let lines: Vec<String> = ctx.errors().map(|error| error.located()).collect();
            bail!(
                "could not generate '{}':\n{}",
                ctx.input.filename,
                lines.join("\n")
            );
        }
        Ok(ctx)
    }

    fn run_phase(&self, phase: &dyn Phase, ctx: &mut CompilationContext) -> Result<()> {
        let phase_name = phase.name();

        for plugin in &self.plugins {
            tracing::trace!(plugin = plugin.name(), phase = phase_name, "before phase");
            plugin.on_before_phase(phase_name, ctx)?;
        }

        tracing::debug!(
            phase = phase_name,
            description = phase.description(),
            "running phase"
        );
        phase.run(ctx)?;

        for plugin in &self.plugins {
            tracing::trace!(plugin = plugin.name(), phase = phase_name, "after phase");
            plugin.on_after_phase(phase_name, ctx)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::loader::MemoryLoader;

    /// Logs every hook call as `before:<phase>` or `after:<phase>`.
    #[derive(Clone, Default)]
    struct HookLog(Arc<Mutex<Vec<String>>>);

    impl HookLog {
        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Plugin for HookLog {
        fn name(&self) -> &'static str {
            "hook-log"
        }

        fn on_before_phase(&self, phase: &str, _ctx: &mut CompilationContext) -> Result<()> {
            self.0.lock().unwrap().push(format!("before:{}", phase));
            Ok(())
        }

        fn on_after_phase(&self, phase: &str, _ctx: &mut CompilationContext) -> Result<()> {
            self.0.lock().unwrap().push(format!("after:{}", phase));
            Ok(())
        }
    }

    struct MarkerPhase;

    impl Phase for MarkerPhase {
        fn name(&self) -> &'static str {
            "marker"
        }

        fn description(&self) -> &'static str {
            "Record that user phases run last"
        }

        fn run(&self, ctx: &mut CompilationContext) -> Result<()> {
            assert!(ctx.output.is_some());
            ctx.add_warning("marker", "ran");
            Ok(())
        }
    }

    const SOURCE: &str = r#"package svc

import "context"

// +genstrument:wrap
func Ping(ctx context.Context) error { return nil }
"#;

    fn run(pipeline: &Pipeline, source: &str) -> Result<CompilationContext> {
        pipeline.run(
            Input::in_place("svc.go", source, "example.com/svc"),
            Options::default(),
            Box::new(MemoryLoader::new()),
        )
    }

    #[test]
    fn test_pipeline_runs_phases() {
        let ctx = run(&Pipeline::new(), SOURCE).expect("pipeline should succeed");

        assert!(ctx.syntax.is_some());
        assert!(ctx.model.is_some());
        let output = ctx.output.as_ref().unwrap();
        assert_eq!(output.functions[0].wrapper_name, "TracePing");
    }

    #[test]
    fn test_pipeline_plugin_hooks() {
        let log = HookLog::default();

        let pipeline = Pipeline::new().plugin(log.clone()).phase(MarkerPhase);
        let ctx = run(&pipeline, SOURCE).expect("pipeline should succeed");

        assert_eq!(
            log.entries(),
            vec![
                "before:parse",
                "after:parse",
                "before:model",
                "after:model",
                "before:synthesize",
                "after:synthesize",
                "before:marker",
                "after:marker",
            ]
        );
        assert_eq!(ctx.diagnostics.last().map(|d| d.phase.as_str()), Some("marker"));
    }

    #[test]
    fn test_errors_from_all_phases_are_reported_together() {
        let source = r#"package svc

import "context"

// +genstrument:wrap
// +genstrument:constructor X
func Ping(ctx context.Context, v func()) {}

// +genstrument:wrap
type Empty interface{}
"#;
        let err = run(&Pipeline::new(), source).unwrap_err();
        assert_eq!(
            err.to_string(),
            "could not generate 'svc.go':\n\
             svc.go:6: 'constructor' is not valid on functions\n\
             svc.go:10: interface has no methods\n\
             svc.go:7: unsupported type shape: function type 'func()'"
        );
    }

    #[test]
    fn test_syntax_errors_are_fatal() {
        let err = run(&Pipeline::new(), "package svc\n\nfunc (").unwrap_err();
        assert!(err.to_string().contains("syntax error"), "{}", err);
    }
}
