//! `+genstrument:` directive comments.
//!
//! A directive is a `//` doc comment line whose text (after the comment
//! marker and leading whitespace) starts with [`DIRECTIVE_PREFIX`]. The rest
//! of the line is split on whitespace: a keyword followed by its arguments.
//!
//! ```text
//! // +genstrument:wrap
//! // +genstrument:external types.Service
//! // +genstrument:prefix Traced
//! // +genstrument:constructor New
//! // +genstrument:op fetch-user
//! // +genstrument:attr user.id id
//! // +genstrument:attr user.kind kind types.KindAttr
//! ```

use genstrument_ir::{AttributeKeyFunc, FunctionConfig, InterfaceConfig, Position, SymbolRef};
use thiserror::Error;

use crate::ast::CommentGroup;

pub const DIRECTIVE_PREFIX: &str = "+genstrument:";

/// The kind of declaration a set of directives is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Interface,
    Function,
    Method,
}

impl Target {
    fn describe(self) -> &'static str {
        match self {
            Target::Interface => "interfaces",
            Target::Function => "functions",
            Target::Method => "interface methods",
        }
    }

    fn accepts(self, directive: &Directive) -> bool {
        match (self, directive) {
            (_, Directive::Wrap) => true,
            (Target::Interface, Directive::Op(_) | Directive::Attr { .. }) => false,
            (Target::Function, Directive::Constructor(_)) => false,
            (
                Target::Method,
                Directive::External(_) | Directive::Prefix(_) | Directive::Constructor(_),
            ) => false,
            _ => true,
        }
    }
}

/// A single parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Wrap,
    External(SymbolRef),
    Prefix(String),
    Constructor(String),
    Op(String),
    Attr {
        key: String,
        arg: String,
        setter: Option<SymbolRef>,
    },
}

impl Directive {
    pub fn keyword(&self) -> &'static str {
        match self {
            Directive::Wrap => "wrap",
            Directive::External(_) => "external",
            Directive::Prefix(_) => "prefix",
            Directive::Constructor(_) => "constructor",
            Directive::Op(_) => "op",
            Directive::Attr { .. } => "attr",
        }
    }
}

/// A malformed or misplaced directive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DirectiveError {
    pub message: String,
    /// Position of the comment carrying the directive.
    pub position: Position,
}

impl DirectiveError {
    fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// The directives of one declaration folded into its configuration.
#[derive(Debug, Clone, Default)]
pub struct Directives<C> {
    pub config: C,
    /// The declaration carries `wrap`.
    pub wrap: bool,
    pub errors: Vec<DirectiveError>,
}

/// Directive lines of a doc comment: the text after the prefix and the
/// comment's position.
pub fn extract(doc: Option<&CommentGroup>) -> Vec<(&str, Position)> {
    let Some(doc) = doc else {
        return Vec::new();
    };
    doc.comments
        .iter()
        .filter_map(|comment| {
            let text = comment.text.strip_prefix("//")?.trim();
            let text = text.strip_prefix(DIRECTIVE_PREFIX)?;
            Some((text, comment.position))
        })
        .collect()
}

/// Parse the text following [`DIRECTIVE_PREFIX`].
pub fn parse_directive(text: &str, position: Position) -> Result<Directive, DirectiveError> {
    let mut words = text.split_whitespace();
    let keyword = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();
    let expect = |n: usize| {
        if args.len() == n {
            Ok(())
        } else {
            Err(DirectiveError::new(
                format!(
                    "{}: expected {} argument{}, got {}",
                    keyword,
                    n,
                    if n == 1 { "" } else { "s" },
                    args.len()
                ),
                position,
            ))
        }
    };
    match keyword {
        "wrap" => {
            expect(0)?;
            Ok(Directive::Wrap)
        }
        "external" => {
            expect(1)?;
            let symbol = parse_selector(args[0], position)?;
            Ok(Directive::External(symbol))
        }
        "prefix" => {
            expect(1)?;
            Ok(Directive::Prefix(args[0].to_string()))
        }
        "constructor" => {
            expect(1)?;
            Ok(Directive::Constructor(args[0].to_string()))
        }
        "op" => {
            expect(1)?;
            Ok(Directive::Op(args[0].to_string()))
        }
        "attr" => {
            if !(2..=3).contains(&args.len()) {
                return Err(DirectiveError::new(
                    format!("attr: expected 2 or 3 arguments, got {}", args.len()),
                    position,
                ));
            }
            let setter = match args.get(2) {
                Some(setter) => Some(parse_symbol(setter, position)?),
                None => None,
            };
            Ok(Directive::Attr {
                key: args[0].to_string(),
                arg: args[1].to_string(),
                setter,
            })
        }
        _ => Err(DirectiveError::new(
            format!("unknown directive: {}", text.trim()),
            position,
        )),
    }
}

/// `package.Name`, both parts required.
fn parse_selector(text: &str, position: Position) -> Result<SymbolRef, DirectiveError> {
    match text.split_once('.') {
        Some((package, name)) if is_identifier(package) && is_identifier(name) => {
            Ok(SymbolRef::qualified(package, name))
        }
        _ => Err(DirectiveError::new(
            format!(
                "invalid selector expression '{}': expected 'package.TypeName'",
                text
            ),
            position,
        )),
    }
}

/// `Name` or `package.Name`.
fn parse_symbol(text: &str, position: Position) -> Result<SymbolRef, DirectiveError> {
    if is_identifier(text) {
        Ok(SymbolRef::local(text))
    } else {
        parse_selector(text, position)
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn collect<C>(
    doc: Option<&CommentGroup>,
    target: Target,
    mut apply: impl FnMut(&mut C, Directive),
) -> Option<Directives<C>>
where
    C: Default,
{
    let lines = extract(doc);
    if lines.is_empty() {
        return None;
    }
    let mut result = Directives::default();
    for (text, position) in lines {
        let directive = match parse_directive(text, position) {
            Ok(directive) => directive,
            Err(err) => {
                result.errors.push(err);
                continue;
            }
        };
        if !target.accepts(&directive) {
            result.errors.push(DirectiveError::new(
                format!(
                    "'{}' is not valid on {}",
                    directive.keyword(),
                    target.describe()
                ),
                position,
            ));
            continue;
        }
        if directive == Directive::Wrap {
            result.wrap = true;
            continue;
        }
        apply(&mut result.config, directive);
    }
    Some(result)
}

/// Fold the directives of a function or interface method.
///
/// Returns `None` when the doc comment carries no directive at all. The
/// operation name is left empty when no `op` directive is present.
pub fn function_directives(
    doc: Option<&CommentGroup>,
    target: Target,
) -> Option<Directives<FunctionConfig>> {
    collect(doc, target, |config: &mut FunctionConfig, directive| match directive {
        Directive::External(symbol) => config.external = Some(symbol),
        Directive::Prefix(prefix) => config.prefix = Some(prefix),
        Directive::Op(name) => config.operation_name = name,
        Directive::Attr { key, arg, setter } => {
            config
                .attributes
                .insert(arg, AttributeKeyFunc { key, setter });
        }
        Directive::Wrap | Directive::Constructor(_) => {}
    })
}

/// Fold the directives of an interface type.
pub fn interface_directives(doc: Option<&CommentGroup>) -> Option<Directives<InterfaceConfig>> {
    collect(
        doc,
        Target::Interface,
        |config: &mut InterfaceConfig, directive| match directive {
            Directive::External(symbol) => config.external = Some(symbol),
            Directive::Prefix(prefix) => config.prefix = Some(prefix),
            Directive::Constructor(prefix) => config.constructor_prefix = Some(prefix),
            Directive::Wrap | Directive::Op(_) | Directive::Attr { .. } => {}
        },
    )
}
