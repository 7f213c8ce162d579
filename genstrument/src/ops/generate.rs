//! Generate operation - wrappers for one annotated file.

use std::path::Path;

use eyre::Result;
use genstrument_codegen::{
    Options,
    pipeline::{Pipeline, SnapshotPlugin},
};
use genstrument_codegen_go::Generator;

use crate::reports::{GenerateReport, GenerationResult, PreviewFile, WrittenResult};

/// Options for the generate operation.
pub struct GenerateOptions<'a> {
    /// Annotated Go source file.
    pub input: &'a Path,
    /// Go file to generate.
    pub output: &'a Path,
    /// Whether to preview without writing the file.
    pub dry_run: bool,
    /// Directory to write phase snapshots to.
    pub visualize: Option<&'a Path>,
}

/// Execute the generate operation.
///
/// Nothing is written unless the whole pass succeeds.
pub fn generate(options: Options, opts: GenerateOptions) -> Result<GenerateReport> {
    let mut pipeline = Pipeline::new();
    if let Some(dir) = opts.visualize {
        pipeline = pipeline.plugin(SnapshotPlugin::with_output_dir(dir));
    }
    let generator = Generator::new(opts.input, opts.output, options).with_pipeline(pipeline);
    let rendered = generator.render()?;

    let warnings = rendered
        .warnings
        .iter()
        .map(|warning| warning.located())
        .collect();

    let result = if opts.dry_run {
        GenerationResult::Preview(PreviewFile {
            path: rendered.path.display().to_string(),
            content: rendered.content,
        })
    } else {
        let written = rendered.write()?;
        GenerationResult::Written(WrittenResult {
            path: written.path,
            write: written.write,
        })
    };

    Ok(GenerateReport {
        input: opts.input.to_path_buf(),
        warnings,
        result,
        debug_dir: opts.visualize.map(Path::to_path_buf),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use genstrument_core::WriteResult;
    use tempfile::TempDir;

    use super::*;

    fn module() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("go.mod"), "module example.com/app\n").unwrap();
        fs::write(
            temp.path().join("svc.go"),
            "package app\n\nimport \"context\"\n\n// +genstrument:wrap\n// +genstrument:attr id id\nfunc Find(ctx context.Context, id string) error { return nil }\n",
        )
        .unwrap();
        temp
    }

    fn unformatted() -> Options {
        let mut options = Options::default();
        options.output.format = false;
        options
    }

    #[test]
    fn test_dry_run_previews() {
        let temp = module();
        let output = temp.path().join("svc_gen.go");
        let report = generate(
            unformatted(),
            GenerateOptions {
                input: &temp.path().join("svc.go"),
                output: &output,
                dry_run: true,
                visualize: None,
            },
        )
        .unwrap();

        let GenerationResult::Preview(preview) = report.result else {
            panic!("expected a preview");
        };
        assert!(preview.content.contains("func TraceFind(tr genstrument.Tracer)"));
        assert!(report.warnings.is_empty());
        assert!(!output.exists());
    }

    #[test]
    fn test_writes_and_snapshots() {
        let temp = module();
        let debug = temp.path().join("debug");
        let report = generate(
            unformatted(),
            GenerateOptions {
                input: &temp.path().join("svc.go"),
                output: &temp.path().join("svc_gen.go"),
                dry_run: false,
                visualize: Some(&debug),
            },
        )
        .unwrap();

        let GenerationResult::Written(written) = report.result else {
            panic!("expected a write");
        };
        assert_eq!(written.write, WriteResult::Written);
        assert!(written.path.is_file());
        assert!(debug.join("synthesize.json").is_file());
        assert_eq!(report.debug_dir.as_deref(), Some(debug.as_path()));
    }

    #[test]
    fn test_syntax_error_keeps_source_diagnostic() {
        let temp = module();
        fs::write(temp.path().join("svc.go"), "package app\n\nfunc (\n").unwrap();
        let err = generate(
            unformatted(),
            GenerateOptions {
                input: &temp.path().join("svc.go"),
                output: &temp.path().join("svc_gen.go"),
                dry_run: false,
                visualize: None,
            },
        )
        .unwrap_err();

        assert!(err.downcast_ref::<Box<genstrument_source::Error>>().is_some());
    }
}
