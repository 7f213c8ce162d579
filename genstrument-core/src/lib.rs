//! Core utilities and types for the genstrument wrapper generator.
//!
//! This crate provides the filesystem-facing pieces shared by the
//! pipeline and the CLI: writing generated files and mapping directories
//! to Go import paths.

mod file;
mod module;

// File operations
pub use file::{File, WriteResult};
// Go module layout
pub use module::{GoModule, default_package_name, resolve_package_path};
