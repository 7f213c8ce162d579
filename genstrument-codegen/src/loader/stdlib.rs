//! Built-in descriptions of packages the generator always knows about.
//!
//! These are the standard-library packages generated code and typical
//! directive targets refer to, plus the tracer runtime package. Loaders
//! fall back to them when a path is not found on disk.

use genstrument_ir::{FuncSignature, InterfaceElem, TypeExpr};

use super::Package;

fn method(name: &str, params: Vec<TypeExpr>, results: Vec<TypeExpr>) -> InterfaceElem {
    InterfaceElem::Method {
        name: name.to_string(),
        signature: FuncSignature { params, results },
    }
}

fn ident(name: &str) -> TypeExpr {
    TypeExpr::ident(name)
}

/// A description of a well-known standard-library package.
pub fn standard_package(path: &str) -> Option<Package> {
    let package = match path {
        "context" => Package::new("context", "context")
            .with_import("time", "time")
            .with_type(
                "Context",
                TypeExpr::Interface(vec![
                    method(
                        "Deadline",
                        vec![],
                        vec![TypeExpr::qualified("time", "Time"), ident("bool")],
                    ),
                    method("Done", vec![], vec![]),
                    method("Err", vec![], vec![ident("error")]),
                    method("Value", vec![ident("any")], vec![ident("any")]),
                ]),
            )
            .with_type("CancelFunc", TypeExpr::Func(FuncSignature::default()))
            .with_func("Background")
            .with_func("TODO")
            .with_func("WithCancel")
            .with_func("WithTimeout")
            .with_func("WithValue"),
        "cmp" => Package::new("cmp", "cmp")
            .with_type(
                "Ordered",
                TypeExpr::Interface(vec![InterfaceElem::Embedded(TypeExpr::Union(
                    [
                        "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16",
                        "uint32", "uint64", "uintptr", "float32", "float64", "string",
                    ]
                    .into_iter()
                    .map(|name| TypeExpr::Tilde(Box::new(ident(name))))
                    .collect(),
                ))]),
            )
            .with_func("Compare")
            .with_func("Less"),
        "fmt" => Package::new("fmt", "fmt")
            .with_type(
                "Stringer",
                TypeExpr::Interface(vec![method("String", vec![], vec![ident("string")])]),
            )
            .with_func("Errorf")
            .with_func("Sprint")
            .with_func("Sprintf"),
        "errors" => Package::new("errors", "errors")
            .with_func("New")
            .with_func("Is")
            .with_func("As")
            .with_func("Join"),
        "time" => Package::new("time", "time")
            .with_type("Duration", ident("int64"))
            .with_type("Month", ident("int"))
            .with_type("Time", TypeExpr::Struct)
            .with_func("Now")
            .with_func("Since"),
        _ => return None,
    };
    Some(package)
}

/// The tracer runtime package, declared at `path` under its conventional name.
///
/// The generated code only uses `Tracer` and the attribute setters; `Span`
/// and `AttributeSetter` are listed so explicit `attr` setters can be
/// written against them.
pub fn runtime_package(path: &str) -> Package {
    Package::new(path, genstrument_core::default_package_name(path))
        .with_import("context", "context")
        .with_type(
            "Tracer",
            TypeExpr::Interface(vec![method(
                "StartSpan",
                vec![TypeExpr::qualified("context", "Context"), ident("string")],
                vec![
                    TypeExpr::qualified("context", "Context"),
                    ident("Span"),
                ],
            )]),
        )
        .with_type(
            "Span",
            TypeExpr::Interface(vec![
                method("Attribute", vec![ident("string")], vec![ident("AttributeSetter")]),
                method(
                    "EndSuccess",
                    vec![TypeExpr::qualified("context", "Context")],
                    vec![],
                ),
                method("EndError", vec![ident("error")], vec![]),
            ]),
        )
        .with_type(
            "AttributeSetter",
            TypeExpr::Interface(vec![
                method("String", vec![ident("string")], vec![]),
                method("Int64", vec![ident("int64")], vec![]),
                method("Bool", vec![ident("bool")], vec![]),
                method("Float64", vec![ident("float64")], vec![]),
                method("Error", vec![ident("error")], vec![]),
            ]),
        )
        .with_func("SetStringAttribute")
        .with_func("SetIntAttribute")
        .with_func("SetBoolAttribute")
        .with_func("SetFloatAttribute")
        .with_func("SetErrorAttribute")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Symbol;

    #[test]
    fn test_standard_packages() {
        let context = standard_package("context").unwrap();
        assert_eq!(context.name, "context");
        assert!(matches!(
            context.lookup("Context"),
            Some(Symbol::Type(TypeExpr::Interface(_)))
        ));

        let time = standard_package("time").unwrap();
        assert_eq!(time.type_definition("Duration"), Some(&ident("int64")));

        assert!(standard_package("net/http").is_none());
    }

    #[test]
    fn test_runtime_package_at_custom_path() {
        let runtime = runtime_package("example.com/tracing");
        assert_eq!(runtime.path, "example.com/tracing");
        assert_eq!(runtime.name, "tracing");
        assert_eq!(
            runtime_package(crate::DEFAULT_RUNTIME_PACKAGE).name,
            "genstrument"
        );
        for setter in [
            "SetStringAttribute",
            "SetIntAttribute",
            "SetBoolAttribute",
            "SetFloatAttribute",
            "SetErrorAttribute",
        ] {
            assert_eq!(runtime.lookup(setter), Some(&Symbol::Func), "{}", setter);
        }
        assert!(runtime.type_definition("Tracer").is_some());
    }
}
