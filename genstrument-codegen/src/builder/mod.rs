//! Line-oriented text assembly for generated files.
//!
//! Declarations describe themselves as [`CodeFragment`] trees through
//! [`Renderable`]; a [`CodeBuilder`] flattens the trees into indented text.

mod code_builder;
mod indent;
mod renderable;

pub use code_builder::CodeBuilder;
pub use indent::Indent;
pub use renderable::{CodeFragment, Renderable};
