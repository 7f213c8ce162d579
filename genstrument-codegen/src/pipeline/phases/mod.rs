//! Built-in pipeline phases.
//!
//! - [`ParsePhase`] - reads the declarations of the input file
//! - [`ModelPhase`] - builds the semantic model from the directives
//! - [`SynthesizePhase`] - resolves types and builds the wrapper records

mod model;
mod parse;
mod synthesize;

pub use model::ModelPhase;
pub use parse::ParsePhase;
pub use synthesize::SynthesizePhase;
