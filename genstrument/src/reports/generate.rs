//! What one `genstrument` run did.

use std::path::PathBuf;

use genstrument_core::WriteResult;

use super::output::{Output, Report};

#[derive(Debug)]
pub struct GenerateReport {
    pub input: PathBuf,
    /// Each as `<file>:<line>: <message>`.
    pub warnings: Vec<String>,
    pub result: GenerationResult,
    /// Set when `--visualize` saved phase snapshots.
    pub debug_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub enum GenerationResult {
    Written(WrittenResult),
    /// `--dry-run`: the content that would have been written.
    Preview(PreviewFile),
}

#[derive(Debug)]
pub struct WrittenResult {
    pub path: PathBuf,
    pub write: WriteResult,
}

#[derive(Debug)]
pub struct PreviewFile {
    pub path: String,
    pub content: String,
}

impl Report for GenerateReport {
    fn render(&self, out: &mut dyn Output) {
        for warning in &self.warnings {
            out.warn(warning);
        }

        match &self.result {
            GenerationResult::Written(written) => {
                let status = match written.write {
                    WriteResult::Written => "written",
                    WriteResult::Unchanged => "unchanged",
                };
                out.field(
                    &written.path.display().to_string(),
                    &format!("{} (from {})", status, self.input.display()),
                );
            }
            GenerationResult::Preview(preview) => {
                out.heading(&preview.path);
                out.verbatim(&preview.content);
            }
        }

        if let Some(dir) = &self.debug_dir {
            out.field("Debug snapshots", &dir.display().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorded(Vec<String>);

    impl Output for Recorded {
        fn field(&mut self, label: &str, value: &str) {
            self.0.push(format!("{} = {}", label, value));
        }

        fn warn(&mut self, message: &str) {
            self.0.push(format!("warn {}", message));
        }

        fn heading(&mut self, title: &str) {
            self.0.push(format!("-- {}", title));
        }

        fn verbatim(&mut self, text: &str) {
            self.0.push(text.to_string());
        }
    }

    #[test]
    fn test_written_report() {
        let report = GenerateReport {
            input: PathBuf::from("svc.go"),
            warnings: vec!["svc.go:5: attribute for 'x' ignored".to_string()],
            result: GenerationResult::Written(WrittenResult {
                path: PathBuf::from("gen/svc.go"),
                write: WriteResult::Unchanged,
            }),
            debug_dir: Some(PathBuf::from(".genstrument")),
        };
        let mut out = Recorded::default();
        report.render(&mut out);
        assert_eq!(
            out.0,
            vec![
                "warn svc.go:5: attribute for 'x' ignored",
                "gen/svc.go = unchanged (from svc.go)",
                "Debug snapshots = .genstrument",
            ]
        );
    }

    #[test]
    fn test_preview_report() {
        let report = GenerateReport {
            input: PathBuf::from("svc.go"),
            warnings: Vec::new(),
            result: GenerationResult::Preview(PreviewFile {
                path: "svc_gen.go".to_string(),
                content: "package svc\n".to_string(),
            }),
            debug_dir: None,
        };
        let mut out = Recorded::default();
        report.render(&mut out);
        assert_eq!(out.0, vec!["-- svc_gen.go", "package svc\n"]);
    }
}
