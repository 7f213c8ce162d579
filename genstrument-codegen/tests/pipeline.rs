//! End-to-end tests of the analysis pipeline: source text in, wrapper
//! records (or a failure report) out.

use std::fs;

use genstrument_codegen::{
    DEFAULT_RUNTIME_PACKAGE, Options,
    loader::{MemoryLoader, ModuleLoader, Package},
    pipeline::{CompilationContext, Input, Pipeline},
};
use genstrument_core::GoModule;
use genstrument_ir::{TemplateData, TypeExpr};
use tempfile::TempDir;

const SVC: &str = "example.com/app/svc";

fn run_with(loader: MemoryLoader, input: Input) -> eyre::Result<CompilationContext> {
    Pipeline::new().run(input, Options::default(), Box::new(loader))
}

fn generate(source: &str) -> TemplateData {
    let mut ctx = run_with(MemoryLoader::new(), Input::in_place("svc.go", source, SVC))
        .expect("generation should succeed");
    ctx.take_output().unwrap()
}

#[test]
fn scenario_a_interface_method_with_auto_attribute() {
    let data = generate(
        r#"package svc

import "context"

// +genstrument:wrap
type Svc interface {
	// +genstrument:attr code name
	Do(ctx context.Context, name string) (string, error)
}
"#,
    );

    let svc = &data.types[0];
    assert_eq!(svc.type_name, "instrumentedSvc");
    assert_eq!(svc.constructor_name, "InstrumentSvc");
    assert_eq!(svc.qualified_name, "Svc");

    let method = &svc.methods[0];
    assert_eq!(method.name, "Do");
    assert_eq!(method.operation_name, "svc.Svc:Do");
    assert_eq!(method.context_arg.as_deref(), Some("ctx"));
    assert_eq!(method.error_return.as_deref(), Some("err"));

    let name = &method.arguments[1];
    let binding = name.attribute.as_ref().unwrap();
    assert_eq!(binding.key, "code");
    assert_eq!(binding.setter, "genstrument.SetStringAttribute");
    assert!(method.returns.iter().all(|r| r.attribute.is_none()));
}

#[test]
fn scenario_b_free_function_defaults() {
    let data = generate(
        r#"package svc

import "context"

// +genstrument:wrap
func F(ctx context.Context) (string, error) {
	return "", nil
}
"#,
    );

    let f = &data.functions[0];
    assert_eq!(f.operation_name, "svc:F");
    assert_eq!(f.wrapper_name, "TraceF");
    assert_eq!(f.qualified_name.as_deref(), Some("F"));
    assert!(!f.arg_has_attributes());
    assert!(!f.return_has_attributes());
}

#[test]
fn scenario_c_malformed_directive_fails_with_line() {
    let err = run_with(
        MemoryLoader::new(),
        Input::in_place(
            "svc.go",
            r#"package svc

import "context"

// +genstrument:wrap
// +genstrument:attr onlyonearg
func F(ctx context.Context) error { return nil }
"#,
            SVC,
        ),
    )
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "could not generate 'svc.go':\nsvc.go:6: attr: expected 2 or 3 arguments, got 1"
    );
}

#[test]
fn generation_is_idempotent() {
    let source = r#"package svc

import (
	"context"

	"example.com/app/types"
	other "example.com/other/types"
)

// +genstrument:wrap
type Store interface {
	// +genstrument:attr id id
	// +genstrument:attr kind kind
	Get(ctx context.Context, id int64, kind types.Kind) (*other.Record, error)
}

// +genstrument:wrap
// +genstrument:attr id id
func Load(ctx context.Context, id int64) (other.Record, error) { return other.Record{}, nil }
"#;
    let loader = || {
        MemoryLoader::new()
            .with_package(
                Package::new("example.com/app/types", "types")
                    .with_type("Kind", TypeExpr::ident("string")),
            )
            .with_package(
                Package::new("example.com/other/types", "types")
                    .with_type("Record", TypeExpr::Struct),
            )
    };
    let first = run_with(loader(), Input::in_place("svc.go", source, SVC))
        .unwrap()
        .take_output()
        .unwrap();
    let second = run_with(loader(), Input::in_place("svc.go", source, SVC))
        .unwrap()
        .take_output()
        .unwrap();
    assert_eq!(first, second);

    let aliases: Vec<_> = first
        .imports
        .iter()
        .map(|i| (i.name.as_str(), i.path.as_str()))
        .collect();
    assert_eq!(
        aliases,
        vec![
            ("context", "context"),
            ("types1", "example.com/app/types"),
            ("types", "example.com/other/types"),
            ("genstrument", DEFAULT_RUNTIME_PACKAGE),
        ]
    );
    // Load claims "types" for the other package before Store refers to the
    // app package.
    assert_eq!(first.functions[0].returns[0].ty, "types.Record");
    assert_eq!(first.types[0].methods[0].arguments[2].ty, "types1.Kind");
    assert_eq!(first.types[0].methods[0].returns[0].ty, "*types.Record");
}

#[test]
fn output_into_another_package_qualifies_source_symbols() {
    let mut ctx = run_with(
        MemoryLoader::new(),
        Input::in_place(
            "svc.go",
            r#"package svc

import "context"

type ID string

// +genstrument:wrap
// +genstrument:attr id id
func Find(ctx context.Context, id ID) error { return nil }
"#,
            SVC,
        )
        .with_destination("example.com/app/svc/traced", "traced"),
    )
    .unwrap();
    let data = ctx.take_output().unwrap();

    assert_eq!(data.package, "traced");
    let find = &data.functions[0];
    assert_eq!(find.qualified_name.as_deref(), Some("svc.Find"));
    assert_eq!(find.arguments[1].ty, "svc.ID");
    assert_eq!(
        find.arguments[1].attribute.as_ref().unwrap().setter,
        "genstrument.SetStringAttribute"
    );
    assert!(data.imports.iter().any(|i| i.path == SVC));
}

#[test]
fn unresolvable_explicit_setter_invalidates_generation() {
    let err = run_with(
        MemoryLoader::new(),
        Input::in_place(
            "svc.go",
            r#"package svc

import "context"

// +genstrument:wrap
// +genstrument:attr a a NoSuchSetter
// +genstrument:attr b b
func F(ctx context.Context, a string, b string) {}
"#,
            SVC,
        ),
    )
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "could not generate 'svc.go':\nsvc.go:8: cannot resolve 'NoSuchSetter': not declared in package 'example.com/app/svc'"
    );
}

#[test]
fn custom_options_change_names_and_runtime() {
    let options = Options::from_toml_str(
        r#"
        [naming]
        function_prefix = "With"
        type_prefix = "traced"
        constructor_prefix = "Wrap"

        [runtime]
        package = "example.com/tracing"
        "#,
    )
    .unwrap();
    let mut ctx = Pipeline::new()
        .run(
            Input::in_place(
                "svc.go",
                r#"package svc

import "context"

// +genstrument:wrap
type S interface {
	Run(ctx context.Context) error
}

// +genstrument:wrap
// +genstrument:attr n n
func G(ctx context.Context, n int) {}
"#,
                SVC,
            ),
            options,
            Box::new(MemoryLoader::new().with_runtime("example.com/tracing")),
        )
        .unwrap();
    let data = ctx.take_output().unwrap();

    assert_eq!(data.tracer_type, "tracing.Tracer");
    assert_eq!(data.functions[0].wrapper_name, "WithG");
    assert_eq!(
        data.functions[0].arguments[1].attribute.as_ref().unwrap().setter,
        "tracing.SetIntAttribute"
    );
    assert_eq!(data.types[0].type_name, "tracedS");
    assert_eq!(data.types[0].constructor_name, "WrapS");
}

#[test]
fn module_loader_resolves_types_from_disk() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("go.mod"), "module example.com/shop\n\ngo 1.22\n").unwrap();
    fs::create_dir_all(root.join("model")).unwrap();
    fs::write(
        root.join("model/model.go"),
        r#"package model

import "time"

type SKU string
type Timeout time.Duration
type Cart struct{ Items []SKU }

func SKUAttr(v SKU, s any) {}
"#,
    )
    .unwrap();
    fs::create_dir_all(root.join("checkout")).unwrap();
    let source = r#"package checkout

import (
	"context"

	"example.com/shop/model"
)

// +genstrument:wrap
type Service interface {
	// +genstrument:attr sku sku model.SKUAttr
	// +genstrument:attr timeout timeout
	// +genstrument:attr cart.size size
	Checkout(ctx context.Context, sku model.SKU, timeout model.Timeout, size uint8) (*model.Cart, error)
}
"#;
    fs::write(root.join("checkout/service.go"), source).unwrap();

    let module = GoModule::find(root).unwrap().unwrap();
    let loader = ModuleLoader::new(Some(module));
    let err = Pipeline::new()
        .run(
            Input::in_place("checkout/service.go", source, "example.com/shop/checkout"),
            Options::default(),
            Box::new(loader),
        )
        .unwrap_err();

    // uint8 has no builtin setter; everything else resolves.
    assert_eq!(
        err.to_string(),
        "could not generate 'checkout/service.go':\ncheckout/service.go:14: cannot find auto-setter function for type uint8"
    );
}

#[test]
fn module_loader_happy_path() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("go.mod"), "module example.com/shop\n").unwrap();
    fs::create_dir_all(root.join("model")).unwrap();
    fs::write(
        root.join("model/model.go"),
        "package model\n\nimport \"time\"\n\ntype Timeout time.Duration\n",
    )
    .unwrap();
    let source = r#"package checkout

import (
	"context"

	"example.com/shop/model"
)

// +genstrument:wrap
// +genstrument:attr timeout timeout
func Wait(ctx context.Context, timeout model.Timeout) error { return nil }
"#;

    let module = GoModule::find(root).unwrap().unwrap();
    let mut ctx = Pipeline::new()
        .run(
            Input::in_place("checkout/wait.go", source, "example.com/shop/checkout"),
            Options::default(),
            Box::new(ModuleLoader::new(Some(module))),
        )
        .unwrap();
    let data = ctx.take_output().unwrap();

    let timeout = &data.functions[0].arguments[1];
    assert_eq!(timeout.ty, "model.Timeout");
    assert_eq!(
        timeout.attribute.as_ref().unwrap().setter,
        "genstrument.SetIntAttribute"
    );
}

#[test]
fn unread_dependency_resolves_by_assumed_name() {
    let source = r#"package svc

import (
	"context"

	"github.com/mattn/go-sqlite3"
)

// +genstrument:wrap
func F(ctx context.Context, e sqlite3.Error) error { return nil }
"#;
    let mut ctx = Pipeline::new()
        .run(
            Input::in_place("svc.go", source, SVC),
            Options::default(),
            Box::new(ModuleLoader::new(None)),
        )
        .unwrap();
    let data = ctx.take_output().unwrap();

    assert_eq!(data.functions[0].arguments[1].ty, "sqlite3.Error");
    let sqlite = data
        .imports
        .iter()
        .find(|import| import.path == "github.com/mattn/go-sqlite3")
        .unwrap();
    assert_eq!(sqlite.name, "sqlite3");
}

#[test]
fn concrete_error_argument_uses_error_setter() {
    let data = generate(
        r#"package svc

import "context"

type NotFound struct{ Key string }

func (e *NotFound) Error() string { return e.Key }

// +genstrument:wrap
// +genstrument:attr cause cause
func F(ctx context.Context, cause *NotFound) {}
"#,
    );

    let cause = &data.functions[0].arguments[1];
    assert_eq!(
        cause.attribute.as_ref().unwrap().setter,
        "genstrument.SetErrorAttribute"
    );
}
