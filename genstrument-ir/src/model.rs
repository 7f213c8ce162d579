//! Semantic model of one annotated compilation unit.
//!
//! Built once per input by the model phase and immutable afterwards.
//!
//! ```text
//! ParsedFile
//! ├── interfaces: Interface ── methods: Function
//! └── functions:  Function (free functions)
//! ```

use indexmap::IndexMap;
use serde::Serialize;

use crate::{Position, SymbolRef, TypeExpr, TypeParam};

/// The annotated declarations of one source file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedFile {
    /// Declared package name (`package example`).
    pub package: String,
    /// Full import path of the package.
    pub package_path: String,
    /// Wrapped interfaces, in declaration order.
    pub interfaces: Vec<Interface>,
    /// Wrapped free functions, in declaration order.
    pub functions: Vec<Function>,
}

impl ParsedFile {
    /// Returns true if nothing in the file is marked for wrapping.
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty() && self.functions.is_empty()
    }

    /// Every wrapped function: free functions first, then interface methods.
    pub fn targets(&self) -> impl Iterator<Item = WrapTarget<'_>> {
        let free = self.functions.iter().map(WrapTarget::FreeFunction);
        let methods = self.interfaces.iter().flat_map(|interface| {
            interface
                .methods
                .iter()
                .map(move |function| WrapTarget::Method {
                    interface,
                    function,
                })
        });
        free.chain(methods)
    }
}

/// A wrapped interface.
#[derive(Debug, Clone, Serialize)]
pub struct Interface {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub config: InterfaceConfig,
    pub methods: Vec<Function>,
    pub position: Position,
}

/// A wrapped function: either a free function or an interface method.
#[derive(Debug, Clone, Serialize)]
pub struct Function {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub arguments: Vec<Arg>,
    pub returns: Vec<Arg>,
    pub config: FunctionConfig,
    pub position: Position,
}

/// A declared parameter or result.
#[derive(Debug, Clone, Serialize)]
pub struct Arg {
    /// Declared name; empty when elided.
    pub name: String,
    pub ty: TypeExpr,
    pub position: Position,
}

/// Per-function configuration collected from directives.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FunctionConfig {
    /// Span name. Filled with the default by the model builder when absent.
    pub operation_name: String,
    /// Overrides the wrapper-name prefix.
    pub prefix: Option<String>,
    /// The wrapped symbol lives in another package.
    pub external: Option<SymbolRef>,
    /// Argument/return name → attribute binding. Last directive wins.
    pub attributes: IndexMap<String, AttributeKeyFunc>,
}

/// Per-interface configuration collected from directives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceConfig {
    /// Overrides the wrapper type-name prefix.
    pub prefix: Option<String>,
    /// The wrapped interface lives in another package.
    pub external: Option<SymbolRef>,
    /// Overrides the constructor-name prefix.
    pub constructor_prefix: Option<String>,
}

/// An attribute key and the encoder that records it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeKeyFunc {
    pub key: String,
    /// Explicit encoder; `None` defers to inference.
    pub setter: Option<SymbolRef>,
}

/// A function as seen by the synthesizer.
#[derive(Debug, Clone, Copy)]
pub enum WrapTarget<'a> {
    /// A package-level function.
    FreeFunction(&'a Function),
    /// A method of a wrapped interface.
    Method {
        interface: &'a Interface,
        function: &'a Function,
    },
}

impl<'a> WrapTarget<'a> {
    /// The wrapped function.
    pub fn function(&self) -> &'a Function {
        match self {
            WrapTarget::FreeFunction(function) => function,
            WrapTarget::Method { function, .. } => function,
        }
    }

    /// The enclosing interface, for methods.
    pub fn interface(&self) -> Option<&'a Interface> {
        match self {
            WrapTarget::FreeFunction(_) => None,
            WrapTarget::Method { interface, .. } => Some(interface),
        }
    }

    /// Type parameters in scope: the interface's, then the function's own.
    pub fn type_params(&self) -> impl Iterator<Item = &'a TypeParam> {
        let outer = self
            .interface()
            .map(|interface| interface.type_params.as_slice())
            .unwrap_or_default();
        outer.iter().chain(self.function().type_params.iter())
    }

    /// Returns true if `name` is a type parameter in scope.
    pub fn is_type_param(&self, name: &str) -> bool {
        self.type_params().any(|tp| tp.name == name)
    }
}
