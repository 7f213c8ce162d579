//! Language-agnostic renderer interface.

use std::path::PathBuf;

use eyre::Result;
use genstrument_core::WriteResult;

/// A renderer of wrapper records into one target-language source file.
pub trait LanguageCodegen {
    /// Language identifier (e.g., "go").
    fn language(&self) -> &'static str;

    /// File extension of generated source files (e.g., "go").
    fn file_extension(&self) -> &'static str;

    /// Render the output without writing to disk.
    fn preview(&self) -> Result<PreviewFile>;

    /// Render the output and write it.
    fn generate(&self) -> Result<GenerateResult>;
}

/// Outcome of writing the generated file.
#[derive(Debug)]
pub struct GenerateResult {
    pub path: PathBuf,
    pub write: WriteResult,
}

/// A generated file for preview.
#[derive(Debug)]
pub struct PreviewFile {
    /// Output path.
    pub path: String,
    /// File content.
    pub content: String,
}
