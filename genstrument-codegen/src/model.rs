//! Semantic model construction.
//!
//! Walks the declarations of the scanned file in order and turns those
//! marked `+genstrument:wrap` into a [`ParsedFile`]. Problems are collected
//! as diagnostics and the walk continues past them.

use genstrument_ir::{Arg, Function, FunctionConfig, Interface, ParsedFile, Position};
use genstrument_source::{
    DirectiveError, FuncDecl, InterfaceType, Param, SourceFile, Target, TypeSpec, TypeSpecKind,
    function_directives, interface_directives,
};

use crate::pipeline::Diagnostic;

const PHASE: &str = "model";

/// Builds the semantic model of one source file.
pub struct ModelBuilder<'a> {
    filename: &'a str,
    package_path: &'a str,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ModelBuilder<'a> {
    /// `filename` is used in diagnostic locations; `package_path` is the
    /// import path of the file's package.
    pub fn new(filename: &'a str, package_path: &'a str) -> Self {
        Self {
            filename,
            package_path,
            diagnostics: Vec::new(),
        }
    }

    /// Build the model and return it with the collected diagnostics.
    pub fn build(mut self, file: &SourceFile) -> (ParsedFile, Vec<Diagnostic>) {
        let mut model = ParsedFile {
            package: file.package.clone(),
            package_path: self.package_path.to_string(),
            ..ParsedFile::default()
        };
        for decl in &file.decls {
            match decl {
                genstrument_source::Decl::Type(spec) => {
                    if let Some(interface) = self.interface(&file.package, spec) {
                        model.interfaces.push(interface);
                    }
                }
                genstrument_source::Decl::Func(func) => {
                    if let Some(function) = self.function(&file.package, func) {
                        model.functions.push(function);
                    }
                }
            }
        }
        tracing::debug!(
            interfaces = model.interfaces.len(),
            functions = model.functions.len(),
            diagnostics = self.diagnostics.len(),
            "built semantic model"
        );
        (model, self.diagnostics)
    }

    fn error(&mut self, position: Position, message: impl Into<String>) {
        self.diagnostics.push(
            Diagnostic::error(PHASE, message).at(format!("{}:{}", self.filename, position.line)),
        );
    }

    fn directive_errors(&mut self, errors: Vec<DirectiveError>) {
        for err in errors {
            self.error(err.position, err.message);
        }
    }

    fn interface(&mut self, package: &str, spec: &TypeSpec) -> Option<Interface> {
        let directives = interface_directives(spec.doc.as_ref())?;
        self.directive_errors(directives.errors);
        if !directives.wrap {
            return None;
        }
        let body = match &spec.kind {
            TypeSpecKind::Interface(body) => body,
            TypeSpecKind::Other(_) => {
                self.error(spec.position, "type is not an interface");
                return None;
            }
        };
        for embedded in &body.embeds {
            self.error(
                spec.position,
                format!(
                    "interface embeds '{}': embedded methods cannot be wrapped",
                    embedded
                ),
            );
        }
        if body.methods.is_empty() {
            self.error(spec.position, "interface has no methods");
            return None;
        }
        let methods = self.methods(package, &spec.name, body);
        Some(Interface {
            name: spec.name.clone(),
            type_params: spec.type_params.clone(),
            config: directives.config,
            methods,
            position: spec.position,
        })
    }

    fn methods(&mut self, package: &str, interface: &str, body: &InterfaceType) -> Vec<Function> {
        let mut methods = Vec::with_capacity(body.methods.len());
        for method in &body.methods {
            let mut config = match function_directives(method.doc.as_ref(), Target::Method) {
                Some(directives) => {
                    self.directive_errors(directives.errors);
                    directives.config
                }
                None => FunctionConfig::default(),
            };
            if config.operation_name.is_empty() {
                config.operation_name = format!("{}.{}:{}", package, interface, method.name);
            }
            methods.push(Function {
                name: method.name.clone(),
                type_params: Vec::new(),
                arguments: args(&method.signature.params),
                returns: args(&method.signature.results),
                config,
                position: method.position,
            });
        }
        methods
    }

    fn function(&mut self, package: &str, func: &FuncDecl) -> Option<Function> {
        let directives = function_directives(func.doc.as_ref(), Target::Function)?;
        self.directive_errors(directives.errors);
        if !directives.wrap {
            return None;
        }
        if func.receiver.is_some() {
            self.error(func.position, "methods with receivers cannot be wrapped");
            return None;
        }
        if func.signature.params.is_empty() {
            self.error(
                func.position,
                "function has no arguments: must have at least context.Context in the first position",
            );
            return None;
        }
        let mut config = directives.config;
        if config.operation_name.is_empty() {
            config.operation_name = format!("{}:{}", package, func.name);
        }
        Some(Function {
            name: func.name.clone(),
            type_params: func.type_params.clone(),
            arguments: args(&func.signature.params),
            returns: args(&func.signature.results),
            config,
            position: func.position,
        })
    }
}

fn args(params: &[Param]) -> Vec<Arg> {
    params
        .iter()
        .map(|param| Arg {
            name: param.name.clone().unwrap_or_default(),
            ty: param.ty.clone(),
            position: param.position,
        })
        .collect()
}
