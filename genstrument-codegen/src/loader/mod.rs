//! Package information for type resolution.
//!
//! The generator is not a type checker. A [`PackageLoader`] supplies, per
//! import path, the package's declared name and the top-level symbols
//! declared in it, which is all the resolver and the setter inference need.

mod memory;
mod module;
mod stdlib;

use std::{fmt, rc::Rc};

use eyre::Result;
use genstrument_ir::{FuncSignature, InterfaceElem, TypeExpr};
use genstrument_source::{FuncDecl, ImportName, SourceFile, TypeSpec, TypeSpecKind};
use indexmap::IndexMap;

pub use memory::MemoryLoader;
pub use module::ModuleLoader;
pub use stdlib::{runtime_package, standard_package};

/// A top-level declaration of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    /// A declared type and its definition.
    Type(TypeExpr),
    Func,
}

/// The receiver of a type's `Error() string` method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMethod {
    /// `func (e T) Error() string`: both `T` and `*T` implement `error`.
    Value,
    /// `func (e *T) Error() string`: only `*T` implements `error`.
    Pointer,
}

/// A loaded package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    /// Import path.
    pub path: String,
    /// Declared package name.
    pub name: String,
    /// Imports of the package's files, by the name they bind. Used to chase
    /// the underlying type of definitions like `type ID uuid.UUID`.
    pub imports: IndexMap<String, String>,
    pub symbols: IndexMap<String, Symbol>,
    /// Declared types with an `Error() string` method.
    pub error_methods: IndexMap<String, ErrorMethod>,
    /// The package could not be read; its symbols are unknown.
    pub opaque: bool,
}

impl Package {
    /// Create an empty package.
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a package whose symbols are unknown.
    pub fn opaque(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            opaque: true,
            ..Self::new(path, name)
        }
    }

    /// Declare a type.
    pub fn with_type(mut self, name: impl Into<String>, definition: TypeExpr) -> Self {
        self.symbols.insert(name.into(), Symbol::Type(definition));
        self
    }

    /// Declare a function.
    pub fn with_func(mut self, name: impl Into<String>) -> Self {
        self.symbols.insert(name.into(), Symbol::Func);
        self
    }

    /// Record an import of the package's source.
    pub fn with_import(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.imports.insert(name.into(), path.into());
        self
    }

    /// Declare an `Error() string` method on type `name`.
    pub fn with_error_method(mut self, name: impl Into<String>, receiver: ErrorMethod) -> Self {
        self.error_methods.insert(name.into(), receiver);
        self
    }

    /// Values of type `name` (or `*name` when `pointer`) implement `error`.
    pub fn implements_error(&self, name: &str, pointer: bool) -> bool {
        match self.error_methods.get(name) {
            Some(ErrorMethod::Value) => true,
            Some(ErrorMethod::Pointer) => pointer,
            None => false,
        }
    }

    /// Look up a top-level symbol.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// The definition of a declared type.
    pub fn type_definition(&self, name: &str) -> Option<&TypeExpr> {
        match self.symbols.get(name)? {
            Symbol::Type(definition) => Some(definition),
            Symbol::Func => None,
        }
    }

    /// Add the declarations of one parsed source file.
    ///
    /// Methods are not addressable as `pkg.Name`; only `Error() string`
    /// methods are recorded, for the error setter.
    pub fn add_file(&mut self, file: &SourceFile) {
        for import in &file.imports {
            let name = match &import.name {
                ImportName::Default => genstrument_core::default_package_name(&import.path),
                ImportName::Alias(alias) => alias.as_str(),
                ImportName::Dot | ImportName::Blank => continue,
            };
            self.imports.insert(name.to_string(), import.path.clone());
        }
        for spec in file.types() {
            self.symbols
                .insert(spec.name.clone(), Symbol::Type(type_spec_definition(spec)));
        }
        for func in file.funcs() {
            match &func.receiver {
                None => {
                    self.symbols.insert(func.name.clone(), Symbol::Func);
                }
                Some(receiver) if is_error_method(func) => {
                    if let Some((name, kind)) = receiver_type(&receiver.ty) {
                        self.error_methods.insert(name.to_string(), kind);
                    }
                }
                Some(_) => {}
            }
        }
    }
}

fn is_error_method(func: &FuncDecl) -> bool {
    func.name == "Error"
        && func.signature.params.is_empty()
        && matches!(
            func.signature.results.as_slice(),
            [result] if result.ty == TypeExpr::ident("string")
        )
}

/// The receiver's base type name, e.g. `List` for `*List[T]`.
fn receiver_type(ty: &TypeExpr) -> Option<(&str, ErrorMethod)> {
    fn base(ty: &TypeExpr) -> Option<&str> {
        match ty {
            TypeExpr::Ident(name) => Some(name.as_str()),
            TypeExpr::Generic { base: inner, .. } => base(inner),
            _ => None,
        }
    }
    match ty {
        TypeExpr::Pointer(inner) => base(inner).map(|name| (name, ErrorMethod::Pointer)),
        other => base(other).map(|name| (name, ErrorMethod::Value)),
    }
}

/// The right-hand side of a type declaration as a type expression.
pub fn type_spec_definition(spec: &TypeSpec) -> TypeExpr {
    match &spec.kind {
        TypeSpecKind::Other(ty) => ty.clone(),
        TypeSpecKind::Interface(interface) => {
            let methods = interface.methods.iter().map(|method| {
                InterfaceElem::Method {
                    name: method.name.clone(),
                    signature: FuncSignature {
                        params: method.signature.params.iter().map(|p| p.ty.clone()).collect(),
                        results: method
                            .signature
                            .results
                            .iter()
                            .map(|p| p.ty.clone())
                            .collect(),
                    },
                }
            });
            let embeds = interface
                .embeds
                .iter()
                .cloned()
                .map(InterfaceElem::Embedded);
            TypeExpr::Interface(embeds.chain(methods).collect())
        }
    }
}

/// Supplies packages by import path.
///
/// Implementations cache loaded packages; loading the same path twice
/// returns the same [`Rc`].
pub trait PackageLoader: fmt::Debug {
    /// Load the package with the given import path.
    ///
    /// # Errors
    ///
    /// Returns an error if the package cannot be found or read.
    fn load(&mut self, path: &str) -> Result<Rc<Package>>;
}
