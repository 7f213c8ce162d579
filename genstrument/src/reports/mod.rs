//! Report data and its terminal rendering.

mod generate;
mod output;

pub use generate::{GenerateReport, GenerationResult, PreviewFile, WrittenResult};
pub use output::{Report, TerminalOutput};
