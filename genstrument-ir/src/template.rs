//! Finished records handed to renderers.
//!
//! Every type reference in these records is already qualified for the
//! destination package, and every local name is unique within its wrapper.
//! Renderers only read them.

use serde::Serialize;

/// One generated compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateData {
    /// Destination package name.
    pub package: String,
    /// Imports, sorted by path.
    pub imports: Vec<TemplateImport>,
    /// Qualified reference to the runtime tracer interface.
    pub tracer_type: String,
    /// Alias of the `context` package when a wrapper has no context argument.
    pub context_package: Option<String>,
    /// Wrapped free functions.
    pub functions: Vec<TemplateFunction>,
    /// Wrapped interfaces.
    pub types: Vec<TemplateType>,
}

/// An import of the generated unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateImport {
    /// Alias used in the generated unit.
    pub name: String,
    /// Declared package name.
    pub package: String,
    /// Import path.
    pub path: String,
}

impl TemplateImport {
    /// Returns true if the import needs an explicit alias.
    pub fn is_aliased(&self) -> bool {
        self.name != self.package
    }
}

/// A generated wrapper function or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateFunction {
    /// Original function name.
    pub name: String,
    /// Name of the generated wrapper (free functions).
    pub wrapper_name: String,
    /// Qualified reference to the original symbol (free functions only).
    pub qualified_name: Option<String>,
    /// Span name.
    pub operation_name: String,
    /// Generic parameter clause with constraints: `[T any, PT cmp.Ordered]`.
    pub type_param_spec: String,
    /// Generic parameter names: `[T, PT]`.
    pub type_param_names: String,
    /// Name of the tracer parameter or field.
    pub tracer_arg: String,
    /// Name of the designated context argument.
    pub context_arg: Option<String>,
    /// Name of the designated error return.
    pub error_return: Option<String>,
    pub arguments: Vec<TemplateValue>,
    pub returns: Vec<TemplateValue>,
}

impl TemplateFunction {
    /// Returns true if any argument records an attribute.
    pub fn arg_has_attributes(&self) -> bool {
        self.arguments.iter().any(|a| a.attribute.is_some())
    }

    /// Returns true if any return value records an attribute.
    pub fn return_has_attributes(&self) -> bool {
        self.returns.iter().any(|r| r.attribute.is_some())
    }
}

/// An argument or return value of a wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateValue {
    /// Unique local name.
    pub name: String,
    /// Qualified type.
    pub ty: String,
    pub attribute: Option<AttributeBinding>,
}

/// A span attribute recorded from a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeBinding {
    pub key: String,
    /// Qualified encoder function.
    pub setter: String,
}

/// A generated wrapper type for an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateType {
    /// Original interface name.
    pub name: String,
    /// Name of the generated struct.
    pub type_name: String,
    /// Name of the generated constructor.
    pub constructor_name: String,
    /// Qualified reference to the wrapped interface.
    pub qualified_name: String,
    pub type_param_spec: String,
    pub type_param_names: String,
    /// Receiver name of the generated methods.
    pub receiver: String,
    pub methods: Vec<TemplateFunction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(name: &str, attribute: Option<AttributeBinding>) -> TemplateValue {
        TemplateValue {
            name: name.into(),
            ty: "string".into(),
            attribute,
        }
    }

    #[test]
    fn test_import_alias() {
        let plain = TemplateImport {
            name: "types".into(),
            package: "types".into(),
            path: "example.com/types".into(),
        };
        let renamed = TemplateImport {
            name: "types1".into(),
            ..plain.clone()
        };
        assert!(!plain.is_aliased());
        assert!(renamed.is_aliased());
    }

    #[test]
    fn test_attribute_flags() {
        let binding = AttributeBinding {
            key: "name".into(),
            setter: "genstrument.SetStringAttribute".into(),
        };
        let function = TemplateFunction {
            name: "Do".into(),
            wrapper_name: "TraceDo".into(),
            qualified_name: None,
            operation_name: "example:Do".into(),
            type_param_spec: String::new(),
            type_param_names: String::new(),
            tracer_arg: "tr".into(),
            context_arg: Some("ctx".into()),
            error_return: None,
            arguments: vec![value("ctx", None), value("name", Some(binding))],
            returns: vec![value("ret0", None)],
        };
        assert!(function.arg_has_attributes());
        assert!(!function.return_has_attributes());
    }
}
