use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use eyre::Result;
use genstrument_codegen::Options;

use crate::{
    ops::{self, GenerateOptions},
    reports::{Report, TerminalOutput},
};

/// Name of the options file looked up next to the input.
const OPTIONS_FILE: &str = "genstrument.toml";

/// Extension trait for exiting on Go syntax errors with pretty formatting
pub(crate) trait ExitOnSyntaxError<T> {
    fn exit_on_syntax_error(self) -> Result<T>;
}

impl<T> ExitOnSyntaxError<T> for Result<T> {
    fn exit_on_syntax_error(self) -> Result<T> {
        self.map_err(
            |report| match report.downcast::<Box<genstrument_source::Error>>() {
                Ok(e) => {
                    eprintln!("{:?}", miette::Report::new(*e));
                    std::process::exit(1);
                }
                Err(report) => report,
            },
        )
    }
}

#[derive(Parser)]
#[command(name = "genstrument")]
#[command(version)]
#[command(about = "Generate tracing wrappers for annotated Go interfaces and functions")]
pub(crate) struct Cli {
    /// Go source file with +genstrument: annotations
    #[arg(short, long)]
    pub input: PathBuf,

    /// Go file to write the generated wrappers to
    #[arg(short, long)]
    pub output: PathBuf,

    /// Options file (defaults to genstrument.toml next to the input, if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the generated code instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Do not pipe the generated code through gofmt
    #[arg(long)]
    pub no_format: bool,

    /// Write a JSON snapshot of every pipeline phase into this directory
    #[arg(long, value_name = "DIR")]
    pub visualize: Option<PathBuf>,

    /// Log progress to stderr (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        let options = self.options()?;
        let report = ops::generate(
            options,
            GenerateOptions {
                input: &self.input,
                output: &self.output,
                dry_run: self.dry_run,
                visualize: self.visualize.as_deref(),
            },
        )
        .exit_on_syntax_error()?;

        report.render(&mut TerminalOutput::new());
        Ok(())
    }

    /// Options from `--config`, else from the input's directory; flags
    /// override file settings.
    fn options(&self) -> Result<Options> {
        let mut options = match &self.config {
            Some(path) => Options::load(path)?,
            None => {
                let path = options_beside(&self.input);
                if path.is_file() {
                    tracing::debug!(path = %path.display(), "loading options");
                    Options::load(&path)?
                } else {
                    Options::default()
                }
            }
        };
        if self.no_format {
            options.output.format = false;
        }
        Ok(options)
    }
}

fn options_beside(input: &Path) -> PathBuf {
    match input.parent() {
        Some(dir) => dir.join(OPTIONS_FILE),
        None => PathBuf::from(OPTIONS_FILE),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::CommandFactory;
    use tempfile::TempDir;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("genstrument").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_input_and_output_are_required() {
        let err = Cli::try_parse_from(["genstrument", "--input", "svc.go"])
            .err()
            .expect("missing --output must be rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_flags() {
        let cli = parse(&[
            "-i", "svc.go", "-o", "gen/svc.go", "--dry-run", "--visualize", "debug", "-vv",
        ]);
        assert_eq!(cli.input, PathBuf::from("svc.go"));
        assert_eq!(cli.output, PathBuf::from("gen/svc.go"));
        assert!(cli.dry_run);
        assert_eq!(cli.visualize.as_deref(), Some(Path::new("debug")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_options_file_beside_input() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(OPTIONS_FILE),
            "[naming]\nfunction_prefix = \"With\"\n",
        )
        .unwrap();
        let input = temp.path().join("svc.go");
        let cli = parse(&[
            "--input",
            input.to_str().unwrap(),
            "--output",
            "out.go",
            "--no-format",
        ]);

        let options = cli.options().unwrap();
        assert_eq!(options.naming.function_prefix, "With");
        assert!(!options.output.format);
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.toml");
        let cli = parse(&[
            "--input",
            "svc.go",
            "--output",
            "out.go",
            "--config",
            missing.to_str().unwrap(),
        ]);
        assert!(cli.options().is_err());
    }

    #[test]
    fn test_options_default_without_file() {
        assert_eq!(options_beside(Path::new("svc.go")), PathBuf::from(OPTIONS_FILE));
        let cli = parse(&["--input", "/nonexistent-dir/svc.go", "--output", "out.go"]);
        assert_eq!(cli.options().unwrap(), Options::default());
    }
}
