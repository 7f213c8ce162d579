//! Operations behind the command line, returning report data.

mod generate;

pub use generate::{GenerateOptions, generate};
