//! Go renderer for finished wrapper records.
//!
//! Turns a [`TemplateData`] into the text of the generated Go file. The
//! records are already fully resolved: every type is qualified for the
//! destination package and every local name is unique, so rendering only
//! lays out declarations.

use genstrument_codegen::{
    builder::{CodeFragment, Renderable},
    synth::{CONTEXT, SPAN, TRACER},
};
use genstrument_ir::{AttributeBinding, TemplateData, TemplateFunction, TemplateType, TemplateValue};

use crate::{GoFile, Import};

/// Header comment of every generated file.
pub const HEADER: &str = "// Code generated by genstrument. DO NOT EDIT.";

/// Field of wrapper types holding the wrapped implementation.
const NEXT: &str = "next";

/// Go language renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoRenderer;

impl GoRenderer {
    /// Create a new Go renderer.
    pub fn new() -> Self {
        Self
    }

    /// Render the complete generated file.
    pub fn render(&self, data: &TemplateData) -> String {
        let context = data.context_package.as_deref().unwrap_or("context");
        GoFile::new(&data.package)
            .imports(data.imports.iter().map(Import::from))
            .add_all(data.types.iter().map(|ty| WrapperType {
                ty,
                tracer_type: &data.tracer_type,
                context,
            }))
            .add_all(data.functions.iter().map(|function| WrapperFunction {
                function,
                tracer_type: &data.tracer_type,
                context,
            }))
            .render_with_header(HEADER)
    }
}

/// Struct, constructor and methods wrapping one interface.
struct WrapperType<'a> {
    ty: &'a TemplateType,
    tracer_type: &'a str,
    context: &'a str,
}

impl Renderable for WrapperType<'_> {
    fn to_fragments(&self) -> Vec<CodeFragment> {
        let ty = self.ty;
        let interface = format!("{}{}", ty.qualified_name, ty.type_param_names);
        let width = NEXT.len().max(TRACER.len());

        let mut fragments = vec![
            CodeFragment::braced(
                format!("type {}{} struct {{", ty.type_name, ty.type_param_spec),
                vec![
                    CodeFragment::line(format!("{:<width$} {}", NEXT, interface)),
                    CodeFragment::line(format!("{:<width$} {}", TRACER, self.tracer_type)),
                ],
            ),
            CodeFragment::blank(),
            CodeFragment::comment(format!(
                "{} returns a {} that traces every call with {} before passing it to {}.",
                ty.constructor_name, ty.name, TRACER, NEXT
            )),
            CodeFragment::braced(
                format!(
                    "func {}{}({} {}, {} {}) {} {{",
                    ty.constructor_name,
                    ty.type_param_spec,
                    TRACER,
                    self.tracer_type,
                    NEXT,
                    interface,
                    interface
                ),
                vec![CodeFragment::line(format!(
                    "return &{}{}{{{}: {}, {}: {}}}",
                    ty.type_name, ty.type_param_names, NEXT, NEXT, TRACER, TRACER
                ))],
            ),
        ];

        for method in &ty.methods {
            let tracer = format!("{}.{}", ty.receiver, method.tracer_arg);
            let call = format!(
                "{}.{}.{}({})",
                ty.receiver,
                NEXT,
                method.name,
                call_args(&method.arguments)
            );
            fragments.push(CodeFragment::blank());
            fragments.push(CodeFragment::braced(
                format!(
                    "func ({} *{}{}) {}({}){} {{",
                    ty.receiver,
                    ty.type_name,
                    ty.type_param_names,
                    method.name,
                    params(&method.arguments),
                    results(&method.returns)
                ),
                body(method, &tracer, &call, self.context),
            ));
        }
        fragments
    }
}

/// Tracer-binding wrapper of one free function.
struct WrapperFunction<'a> {
    function: &'a TemplateFunction,
    tracer_type: &'a str,
    context: &'a str,
}

impl Renderable for WrapperFunction<'_> {
    fn to_fragments(&self) -> Vec<CodeFragment> {
        let function = self.function;
        let target = function.qualified_name.as_deref().unwrap_or(&function.name);
        let signature = format!(
            "func({}){}",
            params(&function.arguments),
            results(&function.returns)
        );
        let call = format!(
            "{}{}({})",
            target,
            function.type_param_names,
            call_args(&function.arguments)
        );
        vec![
            CodeFragment::comment(format!(
                "{} returns {} traced with {}.",
                function.wrapper_name, function.name, function.tracer_arg
            )),
            CodeFragment::braced(
                format!(
                    "func {}{}({} {}) {} {{",
                    function.wrapper_name,
                    function.type_param_spec,
                    function.tracer_arg,
                    self.tracer_type,
                    signature
                ),
                vec![CodeFragment::braced(
                    format!("return {} {{", signature),
                    body(function, &function.tracer_arg, &call, self.context),
                )],
            ),
        ]
    }
}

/// Statements of a wrapper: start the span, record argument attributes,
/// defer the return attributes and the end of the span, forward the call.
fn body(
    function: &TemplateFunction,
    tracer: &str,
    call: &str,
    context: &str,
) -> Vec<CodeFragment> {
    let mut body = Vec::new();
    let ctx = match &function.context_arg {
        Some(name) => name.as_str(),
        None => {
            body.push(CodeFragment::line(format!(
                "{} := {}.Background()",
                CONTEXT, context
            )));
            CONTEXT
        }
    };
    body.push(CodeFragment::line(format!(
        "{}, {} := {}.StartSpan({}, {})",
        ctx,
        SPAN,
        tracer,
        ctx,
        quote(&function.operation_name)
    )));
    body.extend(attributes(&function.arguments));

    let mut deferred: Vec<CodeFragment> = attributes(&function.returns).collect();
    if let Some(err) = &function.error_return {
        deferred.push(CodeFragment::braced(
            format!("if {} != nil {{", err),
            vec![
                CodeFragment::line(format!("{}.EndError({})", SPAN, err)),
                CodeFragment::line("return"),
            ],
        ));
    }
    deferred.push(CodeFragment::line(format!("{}.EndSuccess({})", SPAN, ctx)));
    body.push(CodeFragment::block(
        "defer func() {",
        deferred,
        Some("}()".to_string()),
    ));

    if function.returns.is_empty() {
        body.push(CodeFragment::line(call));
    } else {
        body.push(CodeFragment::line(format!("return {}", call)));
    }
    body
}

fn attributes(values: &[TemplateValue]) -> impl Iterator<Item = CodeFragment> + '_ {
    values.iter().filter_map(|value| {
        value
            .attribute
            .as_ref()
            .map(|binding| CodeFragment::line(record(value, binding)))
    })
}

fn record(value: &TemplateValue, binding: &AttributeBinding) -> String {
    format!(
        "{}({}, {}.Attribute({}))",
        binding.setter,
        value.name,
        SPAN,
        quote(&binding.key)
    )
}

fn params(values: &[TemplateValue]) -> String {
    values
        .iter()
        .map(|value| format!("{} {}", value.name, value.ty))
        .collect::<Vec<_>>()
        .join(", ")
}

fn results(values: &[TemplateValue]) -> String {
    if values.is_empty() {
        String::new()
    } else {
        format!(" ({})", params(values))
    }
}

fn call_args(values: &[TemplateValue]) -> String {
    values
        .iter()
        .map(|value| value.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A Go interpreted string literal.
fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => quoted.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
