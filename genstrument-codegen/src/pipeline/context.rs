//! Per-run state shared by the pipeline phases.

use eyre::{Result, eyre};
use genstrument_ir::{ParsedFile, TemplateData};
use genstrument_source::SourceFile;

use super::diagnostic::{Diagnostic, Severity};
use crate::{Options, loader::PackageLoader};

/// One input file and where its wrappers go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// Name used in diagnostics, usually the path as given.
    pub filename: String,
    /// Go source text.
    pub source: String,
    /// Import path of the input file's package.
    pub source_path: String,
    /// Import path of the output file's package.
    pub destination_path: String,
    /// Package name of the output file when it is not the input package
    /// (the output directory's name).
    pub destination_name: String,
}

impl Input {
    /// Input whose wrappers are generated into its own package.
    pub fn in_place(
        filename: impl Into<String>,
        source: impl Into<String>,
        package_path: impl Into<String>,
    ) -> Self {
        let package_path = package_path.into();
        Self {
            filename: filename.into(),
            source: source.into(),
            destination_name: genstrument_core::default_package_name(&package_path).to_string(),
            destination_path: package_path.clone(),
            source_path: package_path,
        }
    }

    /// Generate into the package at `path`, named `name`.
    pub fn with_destination(mut self, path: impl Into<String>, name: impl Into<String>) -> Self {
        self.destination_path = path.into();
        self.destination_name = name.into();
        self
    }

    /// Package name of the output file: the input's own package name when
    /// both live in the same package.
    pub fn destination_package(&self, source_package: &str) -> String {
        if self.source_path == self.destination_path {
            source_package.to_string()
        } else {
            self.destination_name.clone()
        }
    }
}

/// State threaded through the phases of one run.
///
/// Each phase reads what the previous one stored and fills in its own slot.
#[derive(Debug)]
pub struct CompilationContext {
    pub input: Input,
    pub options: Options,
    /// Resolves types of imported packages.
    pub loader: Box<dyn PackageLoader>,
    /// Set by `parse`.
    pub syntax: Option<SourceFile>,
    /// Set by `model`.
    pub model: Option<ParsedFile>,
    /// Set by `synthesize`.
    pub output: Option<TemplateData>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationContext {
    pub fn new(input: Input, options: Options, loader: Box<dyn PackageLoader>) -> Self {
        Self {
            input,
            options,
            loader,
            syntax: None,
            model: None,
            output: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn add_warning(&mut self, phase: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::warning(phase, message));
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.with_severity(Severity::Warning)
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |diagnostic| diagnostic.severity == severity)
    }

    /// Move the wrapper records out, failing if `synthesize` has not run.
    pub fn take_output(&mut self) -> Result<TemplateData> {
        self.output
            .take()
            .ok_or_else(|| eyre!("no wrapper records: the synthesize phase has not run"))
    }
}
