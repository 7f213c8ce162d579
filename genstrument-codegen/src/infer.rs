//! Attribute-setter inference.
//!
//! When an `attr` directive names no setter, the argument's type is matched
//! against the runtime package's builtin setters. The categories are tried
//! in a fixed order and accept disjoint sets of primitive types, so the
//! result never depends on iteration order.

use std::{collections::HashMap, fmt};

/// Predeclared Go types with a fixed primitive representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
}

impl BasicKind {
    /// Every basic kind.
    pub const ALL: [BasicKind; 17] = [
        BasicKind::Bool,
        BasicKind::String,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::Complex64,
        BasicKind::Complex128,
    ];

    /// The kind named by a predeclared identifier; `byte` and `rune` are
    /// aliases of `uint8` and `int32`.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" => BasicKind::Bool,
            "string" => BasicKind::String,
            "int" => BasicKind::Int,
            "int8" => BasicKind::Int8,
            "int16" => BasicKind::Int16,
            "int32" | "rune" => BasicKind::Int32,
            "int64" => BasicKind::Int64,
            "uint" => BasicKind::Uint,
            "uint8" | "byte" => BasicKind::Uint8,
            "uint16" => BasicKind::Uint16,
            "uint32" => BasicKind::Uint32,
            "uint64" => BasicKind::Uint64,
            "uintptr" => BasicKind::Uintptr,
            "float32" => BasicKind::Float32,
            "float64" => BasicKind::Float64,
            "complex64" => BasicKind::Complex64,
            "complex128" => BasicKind::Complex128,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::String => "string",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
        }
    }
}

/// What the generator knows about a value's type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Basic(BasicKind),
    /// The predeclared `error` interface.
    Error,
    /// A concrete type with an `Error() string` method, by its text.
    ErrorImpl(String),
    /// A declared type and its resolved underlying type.
    Named {
        package: String,
        name: String,
        underlying: Box<SemanticType>,
    },
    /// A generic type parameter in scope.
    TypeParam(String),
    /// Anything else (composites, unknown or opaque types), by its text.
    Other(String),
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Basic(kind) => f.write_str(kind.name()),
            SemanticType::Error => f.write_str("error"),
            SemanticType::Named { package, name, .. } => write!(f, "{}.{}", package, name),
            SemanticType::ErrorImpl(name)
            | SemanticType::TypeParam(name)
            | SemanticType::Other(name) => f.write_str(name),
        }
    }
}

/// A builtin setter of the runtime package and the primitives it encodes.
#[derive(Debug, Clone, Copy)]
pub struct SetterCategory {
    /// Function name in the runtime package.
    pub setter: &'static str,
    kinds: &'static [BasicKind],
    error: bool,
}

impl SetterCategory {
    /// The type is one of the category's primitives.
    pub fn accepts_exact(&self, ty: &SemanticType) -> bool {
        match ty {
            SemanticType::Basic(kind) => self.kinds.contains(kind),
            SemanticType::Error | SemanticType::ErrorImpl(_) => self.error,
            _ => false,
        }
    }

    /// The type is a named type whose underlying type is one of the
    /// category's primitives (it satisfies the setter's `~T` constraint).
    pub fn accepts_conversion(&self, ty: &SemanticType) -> bool {
        match ty {
            SemanticType::Named { underlying, .. } => self.accepts_exact(underlying),
            _ => false,
        }
    }
}

/// Builtin setters, in match order.
pub const SETTER_CATEGORIES: [SetterCategory; 5] = [
    SetterCategory {
        setter: "SetStringAttribute",
        kinds: &[BasicKind::String],
        error: false,
    },
    SetterCategory {
        setter: "SetIntAttribute",
        kinds: &[
            BasicKind::Int,
            BasicKind::Int8,
            BasicKind::Int16,
            BasicKind::Int32,
            BasicKind::Int64,
        ],
        error: false,
    },
    SetterCategory {
        setter: "SetBoolAttribute",
        kinds: &[BasicKind::Bool],
        error: false,
    },
    SetterCategory {
        setter: "SetFloatAttribute",
        kinds: &[BasicKind::Float32, BasicKind::Float64],
        error: false,
    },
    SetterCategory {
        setter: "SetErrorAttribute",
        kinds: &[],
        error: true,
    },
];

/// Memoized setter inference for one synthesis pass.
#[derive(Debug, Default)]
pub struct SetterInference {
    cache: HashMap<SemanticType, Option<&'static str>>,
}

impl SetterInference {
    pub fn new() -> Self {
        Self::default()
    }

    /// The builtin setter for `ty`, if any category accepts it.
    ///
    /// Type parameters never match; callers report them separately.
    pub fn infer(&mut self, ty: &SemanticType) -> Option<&'static str> {
        if let Some(cached) = self.cache.get(ty) {
            return *cached;
        }
        let setter = match ty {
            SemanticType::TypeParam(_) => None,
            _ => SETTER_CATEGORIES
                .iter()
                .find(|category| category.accepts_exact(ty))
                .or_else(|| {
                    SETTER_CATEGORIES
                        .iter()
                        .find(|category| category.accepts_conversion(ty))
                })
                .map(|category| category.setter),
        };
        tracing::trace!(ty = %ty, setter = ?setter, "inferred attribute setter");
        self.cache.insert(ty.clone(), setter);
        setter
    }

    /// Number of memoized types.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn named(name: &str, underlying: SemanticType) -> SemanticType {
        SemanticType::Named {
            package: "example.com/types".into(),
            name: name.into(),
            underlying: Box::new(underlying),
        }
    }

    #[test]
    fn test_exact_matches() {
        let mut inference = SetterInference::new();
        let cases = [
            (BasicKind::String, "SetStringAttribute"),
            (BasicKind::Int, "SetIntAttribute"),
            (BasicKind::Int32, "SetIntAttribute"),
            (BasicKind::Bool, "SetBoolAttribute"),
            (BasicKind::Float32, "SetFloatAttribute"),
        ];
        for (kind, setter) in cases {
            assert_eq!(
                inference.infer(&SemanticType::Basic(kind)),
                Some(setter),
                "{}",
                kind.name()
            );
        }
        assert_eq!(
            inference.infer(&SemanticType::Error),
            Some("SetErrorAttribute")
        );
    }

    #[test]
    fn test_named_types_convert_through_underlying() {
        let mut inference = SetterInference::new();
        let duration = named("Duration", SemanticType::Basic(BasicKind::Int64));
        assert_eq!(inference.infer(&duration), Some("SetIntAttribute"));

        let wrapped_error = named("Failure", SemanticType::Error);
        assert_eq!(inference.infer(&wrapped_error), Some("SetErrorAttribute"));

        let record = named("Record", SemanticType::Other("struct{...}".into()));
        assert_eq!(inference.infer(&record), None);
    }

    #[test]
    fn test_unsupported_primitives_and_type_params() {
        let mut inference = SetterInference::new();
        assert_eq!(inference.infer(&SemanticType::Basic(BasicKind::Uint64)), None);
        assert_eq!(inference.infer(&SemanticType::Other("[]string".into())), None);
        assert_eq!(inference.infer(&SemanticType::TypeParam("T".into())), None);
    }

    #[test]
    fn test_results_are_memoized() {
        let mut inference = SetterInference::new();
        let ty = SemanticType::Basic(BasicKind::String);
        inference.infer(&ty);
        inference.infer(&ty);
        inference.infer(&SemanticType::Basic(BasicKind::Bool));
        assert_eq!(inference.cached(), 2);
    }

    #[test]
    fn test_basic_kind_names() {
        for kind in BasicKind::ALL {
            assert_eq!(BasicKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(BasicKind::from_name("byte"), Some(BasicKind::Uint8));
        assert_eq!(BasicKind::from_name("rune"), Some(BasicKind::Int32));
        assert_eq!(BasicKind::from_name("error"), None);
    }

    proptest! {
        #[test]
        fn categories_accept_disjoint_primitives(index in 0..BasicKind::ALL.len(), error in any::<bool>()) {
            let ty = if error {
                SemanticType::Error
            } else {
                SemanticType::Basic(BasicKind::ALL[index])
            };
            let accepting = SETTER_CATEGORIES
                .iter()
                .filter(|category| category.accepts_exact(&ty))
                .count();
            prop_assert!(accepting <= 1);

            let wrapped = named("Wrapped", ty.clone());
            let converting = SETTER_CATEGORIES
                .iter()
                .filter(|category| category.accepts_conversion(&wrapped))
                .count();
            prop_assert_eq!(accepting, converting);
        }
    }
}
