//! Go renderer for the genstrument wrapper generator.
//!
//! [`GoRenderer`] lays out the finished records of the analysis pipeline as
//! Go source, [`format`] runs the result through `gofmt`, and
//! [`Generator`] ties both to files on disk.

mod generator;
mod go_file;
mod renderer;

pub mod format;

pub use generator::{Generator, Rendered};
pub use genstrument_codegen::{GenerateResult, LanguageCodegen, PreviewFile};
pub use go_file::{GoFile, Import};
pub use renderer::{GoRenderer, HEADER};
