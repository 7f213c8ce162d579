//! Cross-package type resolution.
//!
//! A [`Scope`] renders type expressions of the scanned file so they are
//! valid in the destination file, and records every package the rendered
//! text refers to. Aliases are allocated by the [`TypeImporter`]: one alias
//! per package for the whole pass, never a generator-reserved local name
//! and never an alias another package already holds.

use std::{collections::HashMap, fmt, rc::Rc};

use genstrument_core::default_package_name;
use genstrument_ir::{InterfaceElem, SymbolRef, TemplateImport, TypeExpr, TypeParam};
use genstrument_source::{ImportName, ImportSpec, SourceFile};
use indexmap::IndexMap;

use crate::{
    infer::{BasicKind, SemanticType, SetterInference},
    loader::{Package, PackageLoader},
};

/// Locals every generated wrapper declares; no package may be aliased to them.
pub const RESERVED_NAMES: [&str; 3] = ["err", "ctx", "span"];

const MAX_DEFINITION_DEPTH: usize = 16;

/// Failure to resolve something the generated code needs.
#[derive(Debug)]
pub enum ResolveError {
    /// A problem with the scanned declarations, reported as a diagnostic.
    Invalid(String),
    /// A collaborator failed; generation cannot continue.
    Fatal(eyre::Report),
}

impl From<eyre::Report> for ResolveError {
    fn from(report: eyre::Report) -> Self {
        ResolveError::Fatal(report)
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Invalid(message) => f.write_str(message),
            ResolveError::Fatal(report) => write!(f, "{}", report),
        }
    }
}

fn invalid<T>(message: impl Into<String>) -> Result<T, ResolveError> {
    Err(ResolveError::Invalid(message.into()))
}

/// Import alias table of the destination file.
#[derive(Debug)]
pub struct TypeImporter {
    destination: String,
    imports: IndexMap<String, TemplateImport>,
    claimed: HashMap<String, String>,
}

impl TypeImporter {
    /// Create an empty table for the package at import path `destination`.
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            imports: IndexMap::new(),
            claimed: HashMap::new(),
        }
    }

    /// The alias of `package` in the destination file, allocating it on
    /// first use. Returns `None` for the destination package itself, whose
    /// symbols are referenced unqualified.
    pub fn alias(&mut self, package: &Package) -> Option<String> {
        if package.path == self.destination {
            return None;
        }
        if let Some(import) = self.imports.get(&package.path) {
            return Some(import.name.clone());
        }
        let mut alias = package.name.clone();
        let mut suffix = 0;
        while RESERVED_NAMES.contains(&alias.as_str()) || self.claimed.contains_key(&alias) {
            suffix += 1;
            alias = format!("{}{}", package.name, suffix);
        }
        tracing::debug!(package = %package.path, alias = %alias, "allocated import alias");
        self.claimed.insert(alias.clone(), package.path.clone());
        self.imports.insert(
            package.path.clone(),
            TemplateImport {
                name: alias.clone(),
                package: package.name.clone(),
                path: package.path.clone(),
            },
        );
        Some(alias)
    }

    /// Aliases allocated so far.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.imports.values().map(|import| import.name.as_str())
    }

    /// Imports of the destination file, sorted by path.
    pub fn imports(&self) -> Vec<TemplateImport> {
        let mut imports: Vec<_> = self.imports.values().cloned().collect();
        imports.sort_by(|a, b| a.path.cmp(&b.path));
        imports
    }
}

fn builtin_semantic(name: &str) -> Option<SemanticType> {
    if name == "error" {
        return Some(SemanticType::Error);
    }
    BasicKind::from_name(name).map(SemanticType::Basic)
}

fn is_builtin_type(name: &str) -> bool {
    builtin_semantic(name).is_some() || matches!(name, "any" | "comparable")
}

fn in_scope(params: &[&TypeParam], name: &str) -> bool {
    params.iter().any(|param| param.name == name)
}

/// Resolution state of one synthesis pass.
///
/// Owns the alias table, the qualifier and dot-import lookups and the
/// setter inference cache; all of it is dropped with the pass.
pub struct Scope<'a> {
    loader: &'a mut dyn PackageLoader,
    imports: Vec<ImportSpec>,
    source: Rc<Package>,
    runtime: String,
    qualifiers: HashMap<String, Option<Rc<Package>>>,
    dot_symbols: Option<HashMap<String, Rc<Package>>>,
    importer: TypeImporter,
    inference: SetterInference,
}

impl<'a> Scope<'a> {
    /// Create the scope of `file`, declared in the package at `source_path`,
    /// for output into the package at `destination`.
    ///
    /// The source package's symbols are the input file's declarations plus
    /// whatever the loader finds in the rest of the package.
    pub fn new(
        loader: &'a mut dyn PackageLoader,
        file: &SourceFile,
        source_path: &str,
        destination: &str,
        runtime: &str,
    ) -> Self {
        let mut source = Package::new(source_path, &file.package);
        match loader.load(source_path) {
            Ok(package) if !package.opaque => {
                source.symbols = package.symbols.clone();
                source.imports = package.imports.clone();
                source.error_methods = package.error_methods.clone();
            }
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(
                    package = source_path,
                    error = %err,
                    "source package not loadable, using the input file only"
                );
            }
        }
        source.add_file(file);
        Self {
            loader,
            imports: file.imports.clone(),
            source: Rc::new(source),
            runtime: runtime.to_string(),
            qualifiers: HashMap::new(),
            dot_symbols: None,
            importer: TypeImporter::new(destination),
            inference: SetterInference::new(),
        }
    }

    /// The package being scanned.
    pub fn source(&self) -> &Package {
        &self.source
    }

    /// Import aliases allocated so far.
    pub fn aliases(&self) -> Vec<String> {
        self.importer.aliases().map(str::to_string).collect()
    }

    /// Imports of the destination file, sorted by path.
    pub fn imports(&self) -> Vec<TemplateImport> {
        self.importer.imports()
    }

    /// Render `ty` for the destination file. `params` are the type
    /// parameters in scope.
    pub fn render(&mut self, ty: &TypeExpr, params: &[&TypeParam]) -> Result<String, ResolveError> {
        let rendered = match ty {
            TypeExpr::Ident(name) => self.render_ident(name, params)?,
            TypeExpr::Qualified { package, name } => match self.package_for(package)? {
                Some(found) => self.qualify(&found, name),
                None => {
                    return invalid(format!(
                        "cannot resolve package '{}' of type '{}'",
                        package, ty
                    ));
                }
            },
            TypeExpr::Pointer(elem) => format!("*{}", self.render(elem, params)?),
            TypeExpr::Slice(elem) => format!("[]{}", self.render(elem, params)?),
            TypeExpr::Array { len, elem } => format!("[{}]{}", len, self.render(elem, params)?),
            TypeExpr::Map { key, value } => format!(
                "map[{}]{}",
                self.render(key, params)?,
                self.render(value, params)?
            ),
            TypeExpr::Generic { base, args } => format!(
                "{}[{}]",
                self.render(base, params)?,
                self.render_list(args, params, ", ")?
            ),
            TypeExpr::Tilde(elem) => format!("~{}", self.render(elem, params)?),
            TypeExpr::Union(terms) => self.render_list(terms, params, " | ")?,
            TypeExpr::Interface(elems) => {
                let mut rendered = Vec::with_capacity(elems.len());
                for elem in elems {
                    rendered.push(match elem {
                        InterfaceElem::Method { name, signature } => {
                            let params_text = self.render_list(&signature.params, params, ", ")?;
                            match signature.results.as_slice() {
                                [] => format!("{}({})", name, params_text),
                                [single] => format!(
                                    "{}({}) {}",
                                    name,
                                    params_text,
                                    self.render(single, params)?
                                ),
                                results => format!(
                                    "{}({}) ({})",
                                    name,
                                    params_text,
                                    self.render_list(results, params, ", ")?
                                ),
                            }
                        }
                        InterfaceElem::Embedded(embedded) => self.render(embedded, params)?,
                    });
                }
                format!("interface{{{}}}", rendered.join("; "))
            }
            TypeExpr::Func(_)
            | TypeExpr::Chan { .. }
            | TypeExpr::Struct
            | TypeExpr::Variadic(_) => {
                return invalid(format!("unsupported type shape: {} '{}'", ty.shape(), ty));
            }
        };
        Ok(rendered)
    }

    fn render_list(
        &mut self,
        types: &[TypeExpr],
        params: &[&TypeParam],
        separator: &str,
    ) -> Result<String, ResolveError> {
        let mut rendered = Vec::with_capacity(types.len());
        for ty in types {
            rendered.push(self.render(ty, params)?);
        }
        Ok(rendered.join(separator))
    }

    fn render_ident(&mut self, name: &str, params: &[&TypeParam]) -> Result<String, ResolveError> {
        if in_scope(params, name) {
            return Ok(name.to_string());
        }
        let source = Rc::clone(&self.source);
        if source.type_definition(name).is_some() {
            return Ok(self.qualify(&source, name));
        }
        if is_builtin_type(name) {
            return Ok(name.to_string());
        }
        if let Some(package) = self.dot_package(name)? {
            return Ok(self.qualify(&package, name));
        }
        invalid(format!("cannot resolve type '{}'", name))
    }

    /// Reference `name` of `package` from the destination file.
    fn qualify(&mut self, package: &Package, name: &str) -> String {
        match self.importer.alias(package) {
            Some(alias) => format!("{}.{}", alias, name),
            None => name.to_string(),
        }
    }

    /// The package an import qualifier of the scanned file refers to.
    ///
    /// An explicit alias names its package directly. Otherwise the default
    /// imports are searched for a package declaring that name, starting
    /// with those whose path ends in it.
    fn package_for(&mut self, qualifier: &str) -> eyre::Result<Option<Rc<Package>>> {
        if let Some(found) = self.qualifiers.get(qualifier) {
            return Ok(found.clone());
        }
        let explicit = self.imports.iter().find_map(|import| match &import.name {
            ImportName::Alias(alias) if alias == qualifier => Some(import.path.clone()),
            _ => None,
        });
        let found = match explicit {
            Some(path) => Some(self.loader.load(&path)?),
            None => {
                let mut candidates: Vec<String> = self
                    .imports
                    .iter()
                    .filter(|import| import.name == ImportName::Default)
                    .map(|import| import.path.clone())
                    .collect();
                candidates.sort_by_key(|path| default_package_name(path) != qualifier);
                let mut found = None;
                for path in candidates {
                    let package = self.loader.load(&path)?;
                    if package.name == qualifier {
                        found = Some(package);
                        break;
                    }
                }
                found
            }
        };
        if found.is_none() {
            tracing::debug!(qualifier, "no import provides this package name");
        }
        self.qualifiers.insert(qualifier.to_string(), found.clone());
        Ok(found)
    }

    /// The dot-imported package declaring `name`, from a symbol table built
    /// once per pass.
    fn dot_package(&mut self, name: &str) -> eyre::Result<Option<Rc<Package>>> {
        if self.dot_symbols.is_none() {
            let paths: Vec<String> = self
                .imports
                .iter()
                .filter(|import| import.name == ImportName::Dot)
                .map(|import| import.path.clone())
                .collect();
            let mut table = HashMap::new();
            for path in paths {
                let package = self.loader.load(&path)?;
                for symbol in package.symbols.keys() {
                    table
                        .entry(symbol.clone())
                        .or_insert_with(|| Rc::clone(&package));
                }
            }
            tracing::debug!(symbols = table.len(), "built dot-import symbol table");
            self.dot_symbols = Some(table);
        }
        Ok(self
            .dot_symbols
            .as_ref()
            .and_then(|table| table.get(name))
            .cloned())
    }

    /// Resolve a directive's symbol reference. The symbol must exist unless
    /// its package's contents are unknown.
    pub fn resolve_symbol(&mut self, symbol: &SymbolRef) -> Result<String, ResolveError> {
        let Some(qualifier) = &symbol.package else {
            let source = Rc::clone(&self.source);
            if source.lookup(&symbol.name).is_some() {
                return Ok(self.qualify(&source, &symbol.name));
            }
            if let Some(package) = self.dot_package(&symbol.name)? {
                return Ok(self.qualify(&package, &symbol.name));
            }
            return invalid(format!(
                "cannot resolve '{}': not declared in package '{}'",
                symbol, source.path
            ));
        };
        let Some(package) = self.package_for(qualifier)? else {
            return invalid(format!(
                "cannot resolve package '{}' of '{}'",
                qualifier, symbol
            ));
        };
        if !package.opaque && package.lookup(&symbol.name).is_none() {
            return invalid(format!(
                "cannot resolve '{}': not declared in package '{}'",
                symbol, package.path
            ));
        }
        Ok(self.qualify(&package, &symbol.name))
    }

    /// Reference `name` of the package at import path `path`, importing it.
    pub fn qualified(&mut self, path: &str, name: &str) -> eyre::Result<String> {
        let package = self.loader.load(path)?;
        Ok(self.qualify(&package, name))
    }

    /// Import the package at `path`, returning its alias (`None` when it is
    /// the destination package).
    pub fn import(&mut self, path: &str) -> eyre::Result<Option<String>> {
        let package = self.loader.load(path)?;
        Ok(self.importer.alias(&package))
    }

    /// Reference `name` of the tracer runtime package.
    pub fn runtime(&mut self, name: &str) -> eyre::Result<String> {
        let path = self.runtime.clone();
        self.qualified(&path, name)
    }

    /// What is known about `ty`: builtin, named type with its underlying
    /// type, type parameter, or anything else.
    pub fn semantic_type(
        &mut self,
        ty: &TypeExpr,
        params: &[&TypeParam],
    ) -> eyre::Result<SemanticType> {
        match ty {
            TypeExpr::Ident(name) => {
                if in_scope(params, name) {
                    return Ok(SemanticType::TypeParam(name.clone()));
                }
                let source = Rc::clone(&self.source);
                if let Some(definition) = source.type_definition(name) {
                    if source.implements_error(name, false) {
                        return Ok(SemanticType::ErrorImpl(name.clone()));
                    }
                    return self.named(&source, name, definition);
                }
                if let Some(builtin) = builtin_semantic(name) {
                    return Ok(builtin);
                }
                if let Some(package) = self.dot_package(name)?
                    && let Some(definition) = package.type_definition(name)
                {
                    if package.implements_error(name, false) {
                        return Ok(SemanticType::ErrorImpl(name.clone()));
                    }
                    return self.named(&package, name, definition);
                }
                Ok(SemanticType::Other(name.clone()))
            }
            TypeExpr::Qualified { package, name } => {
                let Some(found) = self.package_for(package)? else {
                    return Ok(SemanticType::Other(ty.to_string()));
                };
                if found.implements_error(name, false) {
                    return Ok(SemanticType::ErrorImpl(ty.to_string()));
                }
                match found.type_definition(name) {
                    Some(definition) => self.named(&found, name, definition),
                    None => Ok(SemanticType::Named {
                        package: found.path.clone(),
                        name: name.clone(),
                        underlying: Box::new(SemanticType::Other(ty.to_string())),
                    }),
                }
            }
            TypeExpr::Pointer(elem) => {
                let implements = match self.declaring_package(elem, params)? {
                    Some((package, name)) => package.implements_error(&name, true),
                    None => false,
                };
                Ok(if implements {
                    SemanticType::ErrorImpl(ty.to_string())
                } else {
                    SemanticType::Other(ty.to_string())
                })
            }
            _ => Ok(SemanticType::Other(ty.to_string())),
        }
    }

    /// The package declaring the named type `ty`, with the type's name.
    /// Instantiations count as their generic type.
    fn declaring_package(
        &mut self,
        ty: &TypeExpr,
        params: &[&TypeParam],
    ) -> eyre::Result<Option<(Rc<Package>, String)>> {
        match ty {
            TypeExpr::Ident(name) if !in_scope(params, name) => {
                if self.source.type_definition(name).is_some() {
                    return Ok(Some((Rc::clone(&self.source), name.clone())));
                }
                if is_builtin_type(name) {
                    return Ok(None);
                }
                Ok(self.dot_package(name)?.map(|package| (package, name.clone())))
            }
            TypeExpr::Qualified { package, name } => {
                Ok(self.package_for(package)?.map(|found| (found, name.clone())))
            }
            TypeExpr::Generic { base, .. } => self.declaring_package(base, params),
            _ => Ok(None),
        }
    }

    fn named(
        &mut self,
        package: &Package,
        name: &str,
        definition: &TypeExpr,
    ) -> eyre::Result<SemanticType> {
        let underlying = self.underlying(package, definition, 0)?;
        Ok(SemanticType::Named {
            package: package.path.clone(),
            name: name.to_string(),
            underlying: Box::new(underlying),
        })
    }

    /// Follow a type definition to the type it is ultimately defined as.
    fn underlying(
        &mut self,
        package: &Package,
        definition: &TypeExpr,
        depth: usize,
    ) -> eyre::Result<SemanticType> {
        if depth > MAX_DEFINITION_DEPTH {
            return Ok(SemanticType::Other(definition.to_string()));
        }
        match definition {
            TypeExpr::Ident(name) => {
                if let Some(next) = package.type_definition(name) {
                    return self.underlying(package, next, depth + 1);
                }
                Ok(builtin_semantic(name).unwrap_or_else(|| SemanticType::Other(name.clone())))
            }
            TypeExpr::Qualified { package: qualifier, name } => {
                let Some(path) = package.imports.get(qualifier) else {
                    return Ok(SemanticType::Other(definition.to_string()));
                };
                let target = self.loader.load(path)?;
                match target.type_definition(name) {
                    Some(next) => self.underlying(&target, next, depth + 1),
                    None => Ok(SemanticType::Other(definition.to_string())),
                }
            }
            _ => Ok(SemanticType::Other(definition.to_string())),
        }
    }

    /// The qualified builtin setter recording values of type `ty`.
    pub fn infer_setter(
        &mut self,
        ty: &TypeExpr,
        params: &[&TypeParam],
    ) -> Result<String, ResolveError> {
        let semantic = self.semantic_type(ty, params)?;
        if let SemanticType::TypeParam(name) = &semantic {
            return invalid(format!(
                "cannot find auto-setter function for generic type {}",
                name
            ));
        }
        match self.inference.infer(&semantic) {
            Some(setter) => Ok(self.runtime(setter)?),
            None => invalid(format!("cannot find auto-setter function for type {}", ty)),
        }
    }
}
