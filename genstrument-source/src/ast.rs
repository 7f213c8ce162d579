//! Declaration-level syntax tree of a Go source file.
//!
//! Only what the generator consumes is kept: the package clause, imports,
//! type declarations and function signatures. Function bodies, variables
//! and constants are skipped by the parser.

use genstrument_ir::{Position, TypeExpr, TypeParam};

/// A parsed Go source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFile {
    /// Declared package name.
    pub package: String,
    pub imports: Vec<ImportSpec>,
    /// Type and function declarations, in source order.
    pub decls: Vec<Decl>,
}

impl SourceFile {
    /// Iterate over the type declarations.
    pub fn types(&self) -> impl Iterator<Item = &TypeSpec> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Type(spec) => Some(spec),
            Decl::Func(_) => None,
        })
    }

    /// Iterate over the function declarations.
    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Func(func) => Some(func),
            Decl::Type(_) => None,
        })
    }
}

/// How an import binds its package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportName {
    /// `import "path"`: bound under the package's declared name.
    Default,
    /// `import name "path"`
    Alias(String),
    /// `import . "path"`
    Dot,
    /// `import _ "path"`
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub name: ImportName,
    pub path: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Type(TypeSpec),
    Func(FuncDecl),
}

/// A `//` or `/* */` comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Raw text including the comment delimiters.
    pub text: String,
    pub position: Position,
}

/// Consecutive comments directly preceding a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentGroup {
    pub comments: Vec<Comment>,
}

impl CommentGroup {
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}

/// A single type specification: `Name[T any] <type>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    /// The spec's own doc comment, or the enclosing group's for `type ( ... )`
    /// declarations whose specs carry none.
    pub doc: Option<CommentGroup>,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    /// `type A = B`
    pub alias: bool,
    pub kind: TypeSpecKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpecKind {
    Interface(InterfaceType),
    Other(TypeExpr),
}

/// An interface type in a declaration, with per-method doc comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceType {
    pub methods: Vec<MethodSpec>,
    /// Embedded interfaces and constraint terms.
    pub embeds: Vec<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    pub doc: Option<CommentGroup>,
    pub name: String,
    pub signature: Signature,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    pub doc: Option<CommentGroup>,
    /// Receiver parameter of a method declaration.
    pub receiver: Option<Param>,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub signature: Signature,
    pub position: Position,
}

/// Parameters and results with their declared names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Declared name; `None` when elided.
    pub name: Option<String>,
    pub ty: TypeExpr,
    pub position: Position,
}
