use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use genstrument_codegen::{
    GenerateResult, LanguageCodegen, Options, PreviewFile,
    loader::ModuleLoader,
    pipeline::{Diagnostic, Input, Pipeline},
};
use genstrument_core::{File, resolve_package_path};

use crate::{
    GoRenderer,
    format::{Formatter, Gofmt, Identity},
};

/// Go code generator: reads one annotated source file and produces the
/// companion file of tracing wrappers.
pub struct Generator {
    input: PathBuf,
    output: PathBuf,
    options: Options,
    pipeline: Pipeline,
    formatter: Box<dyn Formatter>,
}

/// The generated file, before it is written.
#[derive(Debug)]
pub struct Rendered {
    pub path: PathBuf,
    pub content: String,
    /// Warnings recorded while generating.
    pub warnings: Vec<Diagnostic>,
}

impl LanguageCodegen for Generator {
    fn language(&self) -> &'static str {
        "go"
    }

    fn file_extension(&self) -> &'static str {
        "go"
    }

    fn preview(&self) -> Result<PreviewFile> {
        let rendered = self.render()?;
        Ok(PreviewFile {
            path: rendered.path.display().to_string(),
            content: rendered.content,
        })
    }

    fn generate(&self) -> Result<GenerateResult> {
        self.render()?.write()
    }
}

impl Generator {
    /// Generate wrappers for the declarations of `input` into `output`.
    ///
    /// The output is piped through `gofmt` unless `options.output.format`
    /// is off.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, options: Options) -> Self {
        let formatter: Box<dyn Formatter> = if options.output.format {
            Box::new(Gofmt::new())
        } else {
            Box::new(Identity)
        };
        Self {
            input: input.into(),
            output: output.into(),
            options,
            pipeline: Pipeline::new(),
            formatter,
        }
    }

    /// Run a customized pipeline, e.g. one with plugins attached.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Run the pipeline and render the output file without writing it.
    ///
    /// Warnings are returned with the content.
    pub fn render(&self) -> Result<Rendered> {
        let filename = self.input.display().to_string();
        let source = std::fs::read_to_string(&self.input)
            .wrap_err_with(|| format!("read '{}'", filename))?;

        let source_dir = parent_dir(&self.input);
        let destination_dir = parent_dir(&self.output);
        let source_path = resolve_package_path(&source_dir)?;
        let destination_path = resolve_package_path(&destination_dir)?;
        tracing::debug!(
            source = %source_path,
            destination = %destination_path,
            "resolved package paths"
        );

        let mut input = Input::in_place(filename, source, source_path);
        if input.destination_path != destination_path {
            let name = destination_name(&destination_dir)?;
            input = input.with_destination(destination_path, name);
        }

        let loader = ModuleLoader::discover(&source_dir)?
            .with_runtime(self.options.runtime.package.clone());
        let mut ctx = self
            .pipeline
            .run(input, self.options.clone(), Box::new(loader))?;
        let warnings: Vec<Diagnostic> = ctx.warnings().cloned().collect();

        let data = ctx.take_output()?;
        let code = GoRenderer::new().render(&data);
        let content = self
            .formatter
            .format(&code)
            .wrap_err_with(|| format!("format '{}'", self.output.display()))?;
        Ok(Rendered {
            path: self.output.clone(),
            content,
            warnings,
        })
    }
}

impl Rendered {
    /// Write the file unless it already has this content.
    pub fn write(&self) -> Result<GenerateResult> {
        let write = File::new(&self.path, self.content.as_str()).write()?;
        Ok(GenerateResult {
            path: self.path.clone(),
            write,
        })
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// The package name of a new file in `dir`: the directory's name.
fn destination_name(dir: &Path) -> Result<String> {
    let dir = std::path::absolute(dir)
        .wrap_err_with(|| format!("could not get absolute path of {}", dir.display()))?;
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| eyre::eyre!("cannot name a package after '{}'", dir.display()))
}
