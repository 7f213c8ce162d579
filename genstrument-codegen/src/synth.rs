//! Wrapper synthesis.
//!
//! Turns the semantic model into the finished records the renderers
//! consume: every type rendered for the destination package, every local
//! name unique within its wrapper, every attribute bound to a setter.

use std::collections::HashSet;

use eyre::Result;
use genstrument_ir::{
    Arg, AttributeBinding, Function, Interface, ParsedFile, Position, SymbolRef, TemplateData,
    TemplateFunction, TemplateType, TemplateValue, TypeParam, WrapTarget,
};

use crate::{
    infer::SemanticType,
    options::NamingOptions,
    pipeline::Diagnostic,
    resolve::{ResolveError, Scope},
};

const PHASE: &str = "synthesize";

/// Tracer parameter of free-function wrappers and field of wrapper types.
pub const TRACER: &str = "tr";
/// Span variable of every wrapper body.
pub const SPAN: &str = "span";
/// Receiver of generated wrapper methods.
pub const RECEIVER: &str = "w";
/// Name given to the designated context argument.
pub const CONTEXT: &str = "ctx";
/// Name given to the designated error return.
pub const ERROR: &str = "err";

/// Hands out unique local names, suffixing collisions with an
/// incrementing number.
#[derive(Debug, Default)]
pub struct Disambiguator {
    used: HashSet<String>,
}

impl Disambiguator {
    /// Create a disambiguator with names already taken.
    pub fn new<I, S>(taken: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            used: taken.into_iter().map(Into::into).collect(),
        }
    }

    /// Mark `name` as taken.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.used.insert(name.into());
    }

    /// Claim `name`, or the first free `name1`, `name2`, ...
    pub fn claim(&mut self, name: &str) -> String {
        let mut candidate = name.to_string();
        let mut suffix = 0;
        while self.used.contains(&candidate) {
            suffix += 1;
            candidate = format!("{}{}", name, suffix);
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

/// Blank and omitted names cannot be forwarded and get a generated one.
fn is_unnamed(name: &str) -> bool {
    name.is_empty() || name == "_"
}

/// A value with its rendered type, before naming.
struct Pending<'m> {
    arg: &'m Arg,
    ty: String,
    attribute: Option<AttributeBinding>,
}

/// Builds [`TemplateData`] from a [`ParsedFile`] within one [`Scope`].
pub struct Synthesizer<'s, 'l> {
    scope: &'s mut Scope<'l>,
    naming: &'s NamingOptions,
    filename: &'s str,
    context_package: Option<String>,
    needs_context: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'s, 'l> Synthesizer<'s, 'l> {
    pub fn new(scope: &'s mut Scope<'l>, naming: &'s NamingOptions, filename: &'s str) -> Self {
        Self {
            scope,
            naming,
            filename,
            context_package: None,
            needs_context: false,
            diagnostics: Vec::new(),
        }
    }

    /// Synthesize the records of `model` for the destination package named
    /// `package`.
    ///
    /// Problems with the scanned declarations are returned as diagnostics;
    /// the records are only meaningful when none of them is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a package needed for resolution cannot be loaded.
    pub fn synthesize(
        mut self,
        model: &ParsedFile,
        package: &str,
    ) -> Result<(TemplateData, Vec<Diagnostic>)> {
        if model.is_empty() {
            return Ok((
                TemplateData {
                    package: package.to_string(),
                    ..TemplateData::default()
                },
                self.diagnostics,
            ));
        }
        let tracer_type = self.scope.runtime("Tracer")?;

        let mut functions = Vec::with_capacity(model.functions.len());
        for function in &model.functions {
            functions.push(self.function(WrapTarget::FreeFunction(function))?);
        }

        let mut types = Vec::with_capacity(model.interfaces.len());
        for interface in &model.interfaces {
            types.push(self.interface(interface)?);
        }

        let data = TemplateData {
            package: package.to_string(),
            imports: self.scope.imports(),
            tracer_type,
            context_package: if self.needs_context {
                self.context_package.clone()
            } else {
                None
            },
            functions,
            types,
        };
        tracing::debug!(
            functions = data.functions.len(),
            types = data.types.len(),
            imports = data.imports.len(),
            "synthesized wrapper records"
        );
        Ok((data, self.diagnostics))
    }

    fn location(&self, position: Position) -> String {
        format!("{}:{}", self.filename, position.line)
    }

    fn error(&mut self, position: Position, message: impl Into<String>) {
        let location = self.location(position);
        self.diagnostics
            .push(Diagnostic::error(PHASE, message).at(location));
    }

    fn warning(&mut self, position: Position, message: impl Into<String>) {
        let location = self.location(position);
        self.diagnostics
            .push(Diagnostic::warning(PHASE, message).at(location));
    }

    /// Unwrap a resolution result, recording invalid input as a diagnostic.
    fn check<T>(
        &mut self,
        position: Position,
        result: Result<T, ResolveError>,
    ) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(ResolveError::Invalid(message)) => {
                self.error(position, message);
                Ok(None)
            }
            Err(ResolveError::Fatal(report)) => Err(report),
        }
    }

    fn symbol(&mut self, position: Position, symbol: &SymbolRef) -> Result<String> {
        let result = self.scope.resolve_symbol(symbol);
        Ok(self.check(position, result)?.unwrap_or_default())
    }

    /// `[T any, PT cmp.Ordered]` and `[T, PT]`, or two empty strings.
    fn type_param_clauses(
        &mut self,
        position: Position,
        declared: &[TypeParam],
    ) -> Result<(String, String)> {
        if declared.is_empty() {
            return Ok((String::new(), String::new()));
        }
        let in_scope: Vec<&TypeParam> = declared.iter().collect();
        let mut specs = Vec::with_capacity(declared.len());
        for param in declared {
            let result = self.scope.render(&param.constraint, &in_scope);
            let constraint = self.check(position, result)?.unwrap_or_default();
            specs.push(format!("{} {}", param.name, constraint));
        }
        let names: Vec<&str> = declared.iter().map(|param| param.name.as_str()).collect();
        Ok((
            format!("[{}]", specs.join(", ")),
            format!("[{}]", names.join(", ")),
        ))
    }

    fn interface(&mut self, interface: &Interface) -> Result<TemplateType> {
        let config = &interface.config;
        let qualified_name = match &config.external {
            Some(external) => self.symbol(interface.position, external)?,
            None => self.symbol(interface.position, &SymbolRef::local(&interface.name))?,
        };
        let (type_param_spec, type_param_names) =
            self.type_param_clauses(interface.position, &interface.type_params)?;

        let mut methods = Vec::with_capacity(interface.methods.len());
        for function in &interface.methods {
            methods.push(self.function(WrapTarget::Method {
                interface,
                function,
            })?);
        }

        let naming = self.naming;
        let type_prefix = config.prefix.as_deref().unwrap_or(&naming.type_prefix);
        let constructor_prefix = config
            .constructor_prefix
            .as_deref()
            .unwrap_or(&naming.constructor_prefix);
        Ok(TemplateType {
            name: interface.name.clone(),
            type_name: format!("{}{}", type_prefix, interface.name),
            constructor_name: format!("{}{}", constructor_prefix, interface.name),
            qualified_name,
            type_param_spec,
            type_param_names,
            receiver: RECEIVER.to_string(),
            methods,
        })
    }

    fn function(&mut self, target: WrapTarget<'_>) -> Result<TemplateFunction> {
        let function = target.function();
        let params: Vec<&TypeParam> = target.type_params().collect();

        let (qualified_name, wrapper_name, type_param_spec, type_param_names) = match target {
            WrapTarget::FreeFunction(_) => {
                let qualified = match &function.config.external {
                    Some(external) => self.symbol(function.position, external)?,
                    None => self.symbol(function.position, &SymbolRef::local(&function.name))?,
                };
                let naming = self.naming;
                let prefix = function
                    .config
                    .prefix
                    .as_deref()
                    .unwrap_or(&naming.function_prefix);
                let (spec, names) =
                    self.type_param_clauses(function.position, &function.type_params)?;
                (
                    Some(qualified),
                    format!("{}{}", prefix, function.name),
                    spec,
                    names,
                )
            }
            WrapTarget::Method { .. } => {
                (None, function.name.clone(), String::new(), String::new())
            }
        };

        self.check_attribute_names(function);

        let mut arguments = Vec::with_capacity(function.arguments.len());
        let mut context_index = None;
        for (index, arg) in function.arguments.iter().enumerate() {
            if context_index.is_none() && self.is_context(arg, &params)? {
                context_index = Some(index);
            }
            arguments.push(self.pending(function, arg, &params)?);
        }
        let mut returns = Vec::with_capacity(function.returns.len());
        let mut error_index = None;
        for (index, ret) in function.returns.iter().enumerate() {
            if error_index.is_none() && self.is_error(ret, &params)? {
                error_index = Some(index);
            }
            returns.push(self.pending(function, ret, &params)?);
        }

        if context_index.is_none() {
            self.needs_context = true;
            if self.context_package.is_none() {
                self.context_package = self.scope.import("context")?;
            }
        }

        // Every alias the wrapper refers to is claimed by now.
        let mut names = Disambiguator::new([SPAN, TRACER]);
        if matches!(target, WrapTarget::Method { .. }) {
            names.reserve(RECEIVER);
        }
        if context_index.is_none() {
            names.reserve(CONTEXT);
        }
        for alias in self.scope.aliases() {
            names.reserve(alias);
        }

        let mut context_arg = None;
        let arguments: Vec<TemplateValue> = arguments
            .into_iter()
            .enumerate()
            .map(|(index, pending)| {
                let name = if Some(index) == context_index {
                    names.claim(CONTEXT)
                } else if is_unnamed(&pending.arg.name) {
                    names.claim(&format!("arg{}", index))
                } else {
                    names.claim(&pending.arg.name)
                };
                if Some(index) == context_index {
                    context_arg = Some(name.clone());
                }
                pending.into_value(name)
            })
            .collect();

        let mut error_return = None;
        let returns: Vec<TemplateValue> = returns
            .into_iter()
            .enumerate()
            .map(|(index, pending)| {
                let name = if Some(index) == error_index {
                    names.claim(ERROR)
                } else if is_unnamed(&pending.arg.name) {
                    names.claim(&format!("ret{}", index))
                } else {
                    names.claim(&pending.arg.name)
                };
                if Some(index) == error_index {
                    error_return = Some(name.clone());
                }
                pending.into_value(name)
            })
            .collect();

        Ok(TemplateFunction {
            name: function.name.clone(),
            wrapper_name,
            qualified_name,
            operation_name: function.config.operation_name.clone(),
            type_param_spec,
            type_param_names,
            tracer_arg: TRACER.to_string(),
            context_arg,
            error_return,
            arguments,
            returns,
        })
    }

    /// Render a value's type and bind its attribute, if one is configured.
    fn pending<'m>(
        &mut self,
        function: &Function,
        arg: &'m Arg,
        params: &[&TypeParam],
    ) -> Result<Pending<'m>> {
        let rendered = self.scope.render(&arg.ty, params);
        let Some(ty) = self.check(arg.position, rendered)? else {
            return Ok(Pending {
                arg,
                ty: String::new(),
                attribute: None,
            });
        };
        let attribute = match function.config.attributes.get(&arg.name) {
            Some(attr) if !arg.name.is_empty() => {
                let setter = match &attr.setter {
                    Some(explicit) => self.scope.resolve_symbol(explicit),
                    None => self.scope.infer_setter(&arg.ty, params),
                };
                self.check(arg.position, setter)?.map(|setter| AttributeBinding {
                    key: attr.key.clone(),
                    setter,
                })
            }
            _ => None,
        };
        Ok(Pending { arg, ty, attribute })
    }

    fn is_context(&mut self, arg: &Arg, params: &[&TypeParam]) -> Result<bool> {
        Ok(matches!(
            self.scope.semantic_type(&arg.ty, params)?,
            SemanticType::Named { package, name, .. } if package == "context" && name == "Context"
        ))
    }

    fn is_error(&mut self, ret: &Arg, params: &[&TypeParam]) -> Result<bool> {
        Ok(self.scope.semantic_type(&ret.ty, params)? == SemanticType::Error)
    }

    /// Attributes naming no argument or return value are never recorded.
    fn check_attribute_names(&mut self, function: &Function) {
        let unknown: Vec<String> = function
            .config
            .attributes
            .keys()
            .filter(|name| {
                !function
                    .arguments
                    .iter()
                    .chain(&function.returns)
                    .any(|value| &value.name == *name)
            })
            .cloned()
            .collect();
        for name in unknown {
            self.warning(
                function.position,
                format!(
                    "attribute for '{}' ignored: {} has no argument or return value with that name",
                    name, function.name
                ),
            );
        }
    }
}

impl Pending<'_> {
    fn into_value(self, name: String) -> TemplateValue {
        TemplateValue {
            name,
            ty: self.ty,
            attribute: self.attribute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DEFAULT_RUNTIME_PACKAGE, ModelBuilder,
        loader::{MemoryLoader, Package},
        pipeline::Severity,
    };
    use genstrument_ir::TypeExpr;

    const SOURCE: &str = "example.com/app/svc";

    fn loader() -> MemoryLoader {
        MemoryLoader::new().with_package(
            Package::new("example.com/app/types", "types")
                .with_type("MyType", TypeExpr::ident("string"))
                .with_type("Record", TypeExpr::Struct)
                .with_func("MyTypeAttr"),
        )
    }

    fn synthesize(src: &str, destination: &str) -> (TemplateData, Vec<Diagnostic>) {
        let file = genstrument_source::parse_str(src, "svc.go").unwrap();
        let (model, diagnostics) = ModelBuilder::new("svc.go", SOURCE).build(&file);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let mut loader = loader();
        let mut scope = Scope::new(
            &mut loader,
            &file,
            SOURCE,
            destination,
            DEFAULT_RUNTIME_PACKAGE,
        );
        let naming = NamingOptions::default();
        Synthesizer::new(&mut scope, &naming, "svc.go")
            .synthesize(&model, "svc")
            .unwrap()
    }

    fn names(values: &[TemplateValue]) -> Vec<&str> {
        values.iter().map(|value| value.name.as_str()).collect()
    }

    fn errors(diagnostics: &[Diagnostic]) -> Vec<String> {
        diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| format!("{}: {}", d.location.as_deref().unwrap_or("-"), d.message))
            .collect()
    }

    #[test]
    fn test_disambiguator() {
        let mut names = Disambiguator::new(["span", "tr"]);
        assert_eq!(names.claim("span"), "span1");
        assert_eq!(names.claim("span"), "span2");
        assert_eq!(names.claim("id"), "id");
        assert_eq!(names.claim("id"), "id1");
        names.reserve("x");
        assert_eq!(names.claim("x"), "x1");
    }

    #[test]
    fn test_free_function_record() {
        let (data, diagnostics) = synthesize(
            r#"package svc

import (
	"context"

	"example.com/app/types"
)

// +genstrument:wrap
// +genstrument:attr name name
// +genstrument:attr kind k types.MyTypeAttr
// +genstrument:attr result out
func Lookup(ctx context.Context, name string, k types.MyType) (out int, err error) {
	return 0, nil
}
"#,
            SOURCE,
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(data.package, "svc");
        assert_eq!(data.tracer_type, "genstrument.Tracer");
        assert_eq!(data.context_package, None);

        let lookup = &data.functions[0];
        assert_eq!(lookup.wrapper_name, "TraceLookup");
        assert_eq!(lookup.qualified_name.as_deref(), Some("Lookup"));
        assert_eq!(lookup.operation_name, "svc:Lookup");
        assert_eq!(lookup.context_arg.as_deref(), Some("ctx"));
        assert_eq!(lookup.error_return.as_deref(), Some("err"));
        assert_eq!(names(&lookup.arguments), vec!["ctx", "name", "k"]);
        assert_eq!(lookup.arguments[2].ty, "types.MyType");
        assert_eq!(
            lookup.arguments[1].attribute,
            Some(AttributeBinding {
                key: "name".into(),
                setter: "genstrument.SetStringAttribute".into(),
            })
        );
        assert_eq!(
            lookup.arguments[2].attribute.as_ref().map(|a| a.setter.as_str()),
            Some("types.MyTypeAttr")
        );
        assert_eq!(
            lookup.returns[0].attribute.as_ref().map(|a| a.key.as_str()),
            Some("result")
        );

        let paths: Vec<_> = data.imports.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["context", "example.com/app/types", DEFAULT_RUNTIME_PACKAGE]
        );
    }

    #[test]
    fn test_only_first_context_and_error_are_designated() {
        let (data, _) = synthesize(
            r#"package svc

import "context"

// +genstrument:wrap
func Both(a context.Context, b context.Context) (error, error) { return nil, nil }
"#,
            SOURCE,
        );
        let both = &data.functions[0];
        assert_eq!(names(&both.arguments), vec!["ctx", "b"]);
        assert_eq!(both.context_arg.as_deref(), Some("ctx"));
        assert_eq!(names(&both.returns), vec!["err", "ret1"]);
        assert_eq!(both.error_return.as_deref(), Some("err"));
    }

    #[test]
    fn test_missing_context_registers_background() {
        let (data, _) = synthesize(
            r#"package svc

// +genstrument:wrap
func Count(ctx string, span int) int { return 0 }
"#,
            SOURCE,
        );
        let count = &data.functions[0];
        assert_eq!(count.context_arg, None);
        assert_eq!(names(&count.arguments), vec!["ctx1", "span1"]);
        assert_eq!(names(&count.returns), vec!["ret0"]);
        assert_eq!(data.context_package.as_deref(), Some("context"));
        assert!(data.imports.iter().any(|i| i.path == "context"));
    }

    #[test]
    fn test_blank_names_are_replaced() {
        let (data, _) = synthesize(
            r#"package svc

import "context"

// +genstrument:wrap
func Skip(_ context.Context, _ int) (_ int, err error) { return 0, nil }
"#,
            SOURCE,
        );
        let skip = &data.functions[0];
        assert_eq!(names(&skip.arguments), vec!["ctx", "arg1"]);
        assert_eq!(names(&skip.returns), vec!["ret0", "err"]);
    }

    #[test]
    fn test_names_avoid_package_aliases() {
        let (data, _) = synthesize(
            r#"package svc

import (
	"context"

	"example.com/app/types"
)

// +genstrument:wrap
func Save(ctx context.Context, types types.MyType, genstrument bool) {}
"#,
            SOURCE,
        );
        assert_eq!(
            names(&data.functions[0].arguments),
            vec!["ctx", "types1", "genstrument1"]
        );
    }

    #[test]
    fn test_interface_record() {
        let (data, diagnostics) = synthesize(
            r#"package svc

import (
	"cmp"
	"context"
)

// +genstrument:wrap
// +genstrument:constructor New
type Store[K cmp.Ordered, V any] interface {
	// +genstrument:op store-get
	Get(ctx context.Context, key K) (V, error)
	Len() int
}
"#,
            "example.com/app/gen",
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let store = &data.types[0];
        assert_eq!(store.type_name, "instrumentedStore");
        assert_eq!(store.constructor_name, "NewStore");
        assert_eq!(store.qualified_name, "svc.Store");
        assert_eq!(store.type_param_spec, "[K cmp.Ordered, V any]");
        assert_eq!(store.type_param_names, "[K, V]");
        assert_eq!(store.receiver, "w");

        let get = &store.methods[0];
        assert_eq!(get.operation_name, "store-get");
        assert_eq!(get.qualified_name, None);
        assert_eq!(get.type_param_spec, "");
        assert_eq!(get.arguments[1].ty, "K");
        assert_eq!(names(&get.returns), vec!["ret0", "err"]);

        let len = &store.methods[1];
        assert_eq!(len.operation_name, "svc.Store:Len");
        assert_eq!(len.context_arg, None);
        assert_eq!(data.context_package.as_deref(), Some("context"));
    }

    #[test]
    fn test_invalid_declarations_accumulate() {
        let (_, diagnostics) = synthesize(
            r#"package svc

import (
	"context"

	"example.com/app/types"
)

// +genstrument:wrap
// +genstrument:attr rec r
// +genstrument:attr id id types.Missing
// +genstrument:attr v v
func Bad[T any](ctx context.Context, r types.Record, id string, v T, f func()) {}
"#,
            SOURCE,
        );
        assert_eq!(
            errors(&diagnostics),
            vec![
                "svc.go:13: cannot find auto-setter function for type types.Record",
                "svc.go:13: cannot resolve 'types.Missing': not declared in package 'example.com/app/types'",
                "svc.go:13: cannot find auto-setter function for generic type T",
                "svc.go:13: unsupported type shape: function type 'func()'",
            ]
        );
    }

    #[test]
    fn test_unknown_attribute_names_warn() {
        let (data, diagnostics) = synthesize(
            r#"package svc

import "context"

// +genstrument:wrap
// +genstrument:attr key missing
func Ping(ctx context.Context) {}
"#,
            SOURCE,
        );
        assert!(errors(&diagnostics).is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert!(data.functions[0].arguments[0].attribute.is_none());
    }
}
