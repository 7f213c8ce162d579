//! Formatting of generated Go source.

use std::{
    io::Write,
    process::{Command, Stdio},
};

use eyre::{Context, Result, bail};

/// Rewrites generated source into its canonical layout.
pub trait Formatter {
    /// Format `source`, returning the formatted text.
    ///
    /// # Errors
    ///
    /// Returns an error if the formatter cannot run or rejects the source.
    fn format(&self, source: &str) -> Result<String>;
}

/// Pipes source through the `gofmt` executable.
#[derive(Debug, Clone)]
pub struct Gofmt {
    program: String,
}

impl Gofmt {
    pub fn new() -> Self {
        Self {
            program: "gofmt".to_string(),
        }
    }

    /// Use a different executable, e.g. an absolute path to `gofmt`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Gofmt {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for Gofmt {
    fn format(&self, source: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .wrap_err_with(|| format!("could not run '{}'", self.program))?;

        // gofmt may fill stdout before reading all of stdin.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| eyre::eyre!("'{}' stdin is not piped", self.program))?;
        let input = source.to_string();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child
            .wait_with_output()
            .wrap_err_with(|| format!("'{}' did not finish", self.program))?;
        match writer.join() {
            Ok(written) => {
                written.wrap_err_with(|| format!("could not write to '{}'", self.program))?
            }
            Err(_) => bail!("writing to '{}' panicked", self.program),
        }

        if !output.status.success() {
            bail!(
                "{} failed ({}): {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }
        tracing::debug!(program = %self.program, bytes = output.stdout.len(), "formatted output");
        String::from_utf8(output.stdout)
            .wrap_err_with(|| format!("'{}' produced invalid UTF-8", self.program))
    }
}

/// Returns source unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Formatter for Identity {
    fn format(&self, source: &str) -> Result<String> {
        Ok(source.to_string())
    }
}
