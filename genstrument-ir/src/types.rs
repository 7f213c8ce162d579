//! Type expressions and source positions.

use std::fmt;

use serde::Serialize;

/// A position in a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column (in bytes).
    pub column: usize,
    /// Byte offset from the start of the file.
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

/// Direction of a channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChanDir {
    /// `chan T`
    Both,
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
}

/// Parameter and result types of a function type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FuncSignature {
    pub params: Vec<TypeExpr>,
    pub results: Vec<TypeExpr>,
}

/// An element of an anonymous interface literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum InterfaceElem {
    /// A method: `Name(params) results`.
    Method {
        name: String,
        signature: FuncSignature,
    },
    /// An embedded type or constraint term: `fmt.Stringer`, `~[]byte | string`.
    Embedded(TypeExpr),
}

/// A type expression as written in the source.
///
/// The set of shapes is closed: anything the resolver does not know how to
/// qualify is one of the explicit variants below and is rejected there,
/// never silently skipped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeExpr {
    /// A bare identifier: builtin, type parameter or package-local type.
    Ident(String),
    /// `pkg.Name`
    Qualified { package: String, name: String },
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `[N]T`
    Array { len: String, elem: Box<TypeExpr> },
    /// `map[K]V`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// `Base[A, B]`
    Generic {
        base: Box<TypeExpr>,
        args: Vec<TypeExpr>,
    },
    /// `~T`
    Tilde(Box<TypeExpr>),
    /// `A | B`
    Union(Vec<TypeExpr>),
    /// `interface{ ... }`
    Interface(Vec<InterfaceElem>),
    /// `func(params) results`
    Func(FuncSignature),
    /// `chan T`, `chan<- T`, `<-chan T`
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    /// `struct{ ... }` (fields are not modeled)
    Struct,
    /// `...T` in a final parameter
    Variadic(Box<TypeExpr>),
}

impl TypeExpr {
    /// Create an identifier expression.
    pub fn ident(name: impl Into<String>) -> Self {
        TypeExpr::Ident(name.into())
    }

    /// Create a qualified `pkg.Name` expression.
    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        TypeExpr::Qualified {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Returns the identifier name if this is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            TypeExpr::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Human readable name of the expression's shape, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            TypeExpr::Ident(_) => "identifier",
            TypeExpr::Qualified { .. } => "qualified identifier",
            TypeExpr::Pointer(_) => "pointer",
            TypeExpr::Slice(_) => "slice",
            TypeExpr::Array { .. } => "array",
            TypeExpr::Map { .. } => "map",
            TypeExpr::Generic { .. } => "generic instantiation",
            TypeExpr::Tilde(_) => "underlying-type term",
            TypeExpr::Union(_) => "union",
            TypeExpr::Interface(_) => "interface literal",
            TypeExpr::Func(_) => "function type",
            TypeExpr::Chan { .. } => "channel type",
            TypeExpr::Struct => "struct literal",
            TypeExpr::Variadic(_) => "variadic parameter",
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeExpr], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for FuncSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_list(f, &self.params, ", ")?;
        f.write_str(")")?;
        match self.results.len() {
            0 => Ok(()),
            1 => write!(f, " {}", self.results[0]),
            _ => {
                f.write_str(" (")?;
                write_list(f, &self.results, ", ")?;
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Ident(name) => f.write_str(name),
            TypeExpr::Qualified { package, name } => write!(f, "{}.{}", package, name),
            TypeExpr::Pointer(elem) => write!(f, "*{}", elem),
            TypeExpr::Slice(elem) => write!(f, "[]{}", elem),
            TypeExpr::Array { len, elem } => write!(f, "[{}]{}", len, elem),
            TypeExpr::Map { key, value } => write!(f, "map[{}]{}", key, value),
            TypeExpr::Generic { base, args } => {
                write!(f, "{}[", base)?;
                write_list(f, args, ", ")?;
                f.write_str("]")
            }
            TypeExpr::Tilde(elem) => write!(f, "~{}", elem),
            TypeExpr::Union(terms) => write_list(f, terms, " | "),
            TypeExpr::Interface(elems) => {
                f.write_str("interface{")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    match elem {
                        InterfaceElem::Method { name, signature } => {
                            write!(f, "{}{}", name, signature)?
                        }
                        InterfaceElem::Embedded(ty) => write!(f, "{}", ty)?,
                    }
                }
                f.write_str("}")
            }
            TypeExpr::Func(signature) => write!(f, "func{}", signature),
            TypeExpr::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {}", elem),
                ChanDir::Send => write!(f, "chan<- {}", elem),
                ChanDir::Recv => write!(f, "<-chan {}", elem),
            },
            TypeExpr::Struct => f.write_str("struct{...}"),
            TypeExpr::Variadic(elem) => write!(f, "...{}", elem),
        }
    }
}

/// A generic type parameter: `T any`, `PT cmp.Ordered`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeParam {
    pub name: String,
    pub constraint: TypeExpr,
}

impl TypeParam {
    pub fn new(name: impl Into<String>, constraint: TypeExpr) -> Self {
        Self {
            name: name.into(),
            constraint,
        }
    }
}

/// A reference to a symbol named in a directive: `Func` or `pkg.Func`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SymbolRef {
    /// Package qualifier as written (an import name in the scanned file).
    pub package: Option<String>,
    pub name: String,
}

impl SymbolRef {
    /// A bare, package-local reference.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            package: None,
            name: name.into(),
        }
    }

    /// A `pkg.Name` reference.
    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: Some(package.into()),
            name: name.into(),
        }
    }

    /// The reference as a type expression, for resolution.
    pub fn to_type_expr(&self) -> TypeExpr {
        match &self.package {
            Some(package) => TypeExpr::qualified(package, &self.name),
            None => TypeExpr::ident(&self.name),
        }
    }
}

impl fmt::Display for SymbolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.package {
            Some(package) => write!(f, "{}.{}", package, self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_composite_types() {
        let ty = TypeExpr::Map {
            key: Box::new(TypeExpr::ident("string")),
            value: Box::new(TypeExpr::Slice(Box::new(TypeExpr::Pointer(Box::new(
                TypeExpr::qualified("types", "MyType"),
            ))))),
        };
        assert_eq!(ty.to_string(), "map[string][]*types.MyType");
    }

    #[test]
    fn test_display_generic_and_union() {
        let generic = TypeExpr::Generic {
            base: Box::new(TypeExpr::ident("Constraint")),
            args: vec![TypeExpr::ident("int"), TypeExpr::ident("string")],
        };
        assert_eq!(generic.to_string(), "Constraint[int, string]");

        let union = TypeExpr::Union(vec![
            TypeExpr::Tilde(Box::new(TypeExpr::Slice(Box::new(TypeExpr::ident("byte"))))),
            TypeExpr::ident("string"),
        ]);
        assert_eq!(union.to_string(), "~[]byte | string");
    }

    #[test]
    fn test_display_interface_literal() {
        let iface = TypeExpr::Interface(vec![
            InterfaceElem::Embedded(TypeExpr::qualified("fmt", "Stringer")),
            InterfaceElem::Method {
                name: "Len".into(),
                signature: FuncSignature {
                    params: vec![],
                    results: vec![TypeExpr::ident("int")],
                },
            },
        ]);
        assert_eq!(iface.to_string(), "interface{fmt.Stringer; Len() int}");
    }

    #[test]
    fn test_symbol_ref() {
        assert_eq!(SymbolRef::local("Func").to_string(), "Func");
        let qualified = SymbolRef::qualified("types", "MyTypeAttr");
        assert_eq!(qualified.to_string(), "types.MyTypeAttr");
        assert_eq!(
            qualified.to_type_expr(),
            TypeExpr::qualified("types", "MyTypeAttr")
        );
    }
}
