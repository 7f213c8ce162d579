//! Phase-by-phase dumps of the pipeline state (`genstrument --visualize`).

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use eyre::{Context, Result};
use genstrument_ir::{ParsedFile, TemplateData};
use serde::Serialize;

use super::{CompilationContext, Diagnostic, Plugin};

/// What the context held when a phase finished.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseSnapshot {
    pub phase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ParsedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<TemplateData>,
    pub diagnostics: Vec<Diagnostic>,
}

impl PhaseSnapshot {
    fn capture(phase: &str, ctx: &CompilationContext) -> Self {
        Self {
            phase: phase.to_string(),
            model: ctx.model.clone(),
            output: ctx.output.clone(),
            diagnostics: ctx.diagnostics.clone(),
        }
    }

    /// Write as pretty JSON to `<dir>/<phase>.json`.
    fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .wrap_err_with(|| format!("create snapshot directory '{}'", dir.display()))?;
        let path = dir.join(format!("{}.json", self.phase));
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).wrap_err_with(|| format!("write snapshot '{}'", path.display()))
    }
}

/// Records a [`PhaseSnapshot`] after every phase, optionally saving each
/// one to disk as soon as it is taken.
#[derive(Debug, Default)]
pub struct SnapshotPlugin {
    taken: Mutex<Vec<PhaseSnapshot>>,
    dir: Option<PathBuf>,
}

impl SnapshotPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::default()
        }
    }

    pub fn snapshots(&self) -> Vec<PhaseSnapshot> {
        self.taken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Plugin for SnapshotPlugin {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn on_after_phase(&self, phase: &str, ctx: &mut CompilationContext) -> Result<()> {
        let snapshot = PhaseSnapshot::capture(phase, ctx);
        if let Some(dir) = &self.dir {
            snapshot.save(dir)?;
        }
        self.taken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::{
        Options,
        loader::MemoryLoader,
        pipeline::{Input, Pipeline},
    };

    const SOURCE: &str = "package svc\n\n// +genstrument:wrap\nfunc Do(n int) {}\n";

    fn run(plugin: impl Plugin + 'static) {
        Pipeline::new()
            .plugin(plugin)
            .run(
                Input::in_place("svc.go", SOURCE, "example.com/svc"),
                Options::default(),
                Box::new(MemoryLoader::new()),
            )
            .unwrap();
    }

    #[test]
    fn test_snapshots_follow_phases() {
        let plugin = Arc::new(SnapshotPlugin::new());
        assert!(plugin.snapshots().is_empty());
        run(Arc::clone(&plugin));

        let snapshots = plugin.snapshots();
        let phases: Vec<_> = snapshots.iter().map(|s| s.phase.as_str()).collect();
        assert_eq!(phases, vec!["parse", "model", "synthesize"]);
        assert!(snapshots[0].model.is_none());
        assert!(snapshots[1].model.is_some() && snapshots[1].output.is_none());
        assert!(snapshots[2].output.is_some());
    }

    #[test]
    fn test_output_dir_gets_one_file_per_phase() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("debug");
        run(SnapshotPlugin::with_output_dir(&dir));

        for phase in ["parse", "model", "synthesize"] {
            assert!(dir.join(format!("{}.json", phase)).is_file(), "{}", phase);
        }
        let json = fs::read_to_string(dir.join("synthesize.json")).unwrap();
        assert!(json.contains("\"wrapper_name\": \"TraceDo\""), "{}", json);
    }
}
