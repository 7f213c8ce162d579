//! Generation pipeline.
//!
//! A [`Pipeline`] runs the phases from source text to wrapper records:
//!
//! - Explicit phase boundaries (parse → model → synthesize)
//! - Plugin hooks before and after each phase
//! - Diagnostics accumulated across phases and reported together
//!
//! # Example
//!
//! ```ignore
//! use genstrument_codegen::pipeline::{Input, Pipeline};
//!
//! let input = Input::in_place("service.go", source, "example.com/app/service");
//! let mut ctx = Pipeline::new().run(input, options, Box::new(loader))?;
//!
//! for warning in ctx.warnings() {
//!     eprintln!("{}", warning);
//! }
//! let records = ctx.take_output()?;
//! ```

mod context;
mod diagnostic;
mod phase;
pub mod phases;
mod plugin;
mod runner;
mod snapshot;

pub use context::{CompilationContext, Input};
pub use diagnostic::{Diagnostic, Severity};
pub use phase::Phase;
pub use plugin::Plugin;
pub use runner::Pipeline;
pub use snapshot::{PhaseSnapshot, SnapshotPlugin};
