//! Analysis and synthesis for the genstrument wrapper generator.
//!
//! This crate turns one annotated Go source file into the finished
//! [`TemplateData`](genstrument_ir::TemplateData) records that renderers
//! (e.g., `genstrument-codegen-go`) consume.
//!
//! # Module Organization
//!
//! - [`pipeline`] - Phases, plugins and diagnostics (parse → model → synthesize)
//! - [`model`] - Semantic model construction from `+genstrument:` directives
//! - [`loader`] - Package information for type resolution
//! - [`resolve`] - Type rendering and import aliasing for the destination file
//! - [`infer`] - Builtin attribute-setter inference
//! - [`synth`] - Wrapper record synthesis
//! - [`builder`] - Code generation building blocks (CodeBuilder, CodeFragment)
//! - [`language`] - Renderer interface

pub mod builder;
pub mod infer;
pub mod language;
pub mod loader;
pub mod model;
mod options;
pub mod pipeline;
pub mod resolve;
pub mod synth;

pub use language::{GenerateResult, LanguageCodegen, PreviewFile};
pub use model::ModelBuilder;
pub use options::{DEFAULT_RUNTIME_PACKAGE, NamingOptions, Options, OutputOptions, RuntimeOptions};
pub use synth::Synthesizer;
