//! Intermediate representation types for the genstrument wrapper generator.
//!
//! This crate provides the type definitions shared across the generation
//! pipeline. There are three layers:
//!
//! ```text
//! Go source → genstrument-source (syntax) → ParsedFile (model) → TemplateData (records) → renderer
//! ```
//!
//! - [`TypeExpr`] - type expressions exactly as written in the source
//! - [`ParsedFile`] - the semantic model of one annotated compilation unit
//! - [`TemplateData`] - finished, fully qualified records consumed by renderers
//!
//! The types are language-level descriptions only; resolving them against
//! package information is the job of `genstrument-codegen`.

mod model;
mod template;
mod types;

pub use model::{
    Arg, AttributeKeyFunc, Function, FunctionConfig, Interface, InterfaceConfig, ParsedFile,
    WrapTarget,
};
pub use template::{
    AttributeBinding, TemplateData, TemplateFunction, TemplateImport, TemplateType, TemplateValue,
};
pub use types::{ChanDir, FuncSignature, InterfaceElem, Position, SymbolRef, TypeExpr, TypeParam};
