//! Layout of a whole Go source file: package clause, imports, declarations.

use std::fmt;

use genstrument_codegen::builder::{CodeBuilder, CodeFragment, Renderable};
use genstrument_ir::TemplateImport;

/// One import spec, `"path"` or `name "path"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    path: String,
    alias: Option<String>,
}

impl Import {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
        }
    }

    pub fn aliased(self, alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..self
        }
    }
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(alias) = &self.alias {
            write!(f, "{} ", alias)?;
        }
        write!(f, "\"{}\"", self.path)
    }
}

/// The local name is spelled out only when it differs from the package's
/// declared name.
impl From<&TemplateImport> for Import {
    fn from(import: &TemplateImport) -> Self {
        let spec = Import::new(&import.path);
        if import.is_aliased() {
            spec.aliased(&import.name)
        } else {
            spec
        }
    }
}

/// A Go file under construction.
///
/// ```
/// use genstrument_codegen_go::{GoFile, Import};
///
/// let code = GoFile::new("svc")
///     .import(Import::new("context"))
///     .render();
///
/// assert_eq!(code, "package svc\n\nimport \"context\"\n");
/// ```
pub struct GoFile {
    package: String,
    imports: Vec<Import>,
    decls: Vec<Vec<CodeFragment>>,
}

impl GoFile {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            imports: Vec::new(),
            decls: Vec::new(),
        }
    }

    pub fn import(self, import: Import) -> Self {
        self.imports([import])
    }

    pub fn imports(mut self, imports: impl IntoIterator<Item = Import>) -> Self {
        self.imports.extend(imports);
        self
    }

    /// Append top-level declarations, each separated by a blank line.
    pub fn add_all<R: Renderable>(mut self, decls: impl IntoIterator<Item = R>) -> Self {
        self.decls
            .extend(decls.into_iter().map(|decl| decl.to_fragments()));
        self
    }

    pub fn render(&self) -> String {
        let mut out = CodeBuilder::go();
        out.push_line(&format!("package {}", self.package));

        if let [only] = self.imports.as_slice() {
            out.push_blank().push_line(&format!("import {}", only));
        } else if !self.imports.is_empty() {
            out.push_blank().push_line("import (").push_indent();
            for import in &self.imports {
                out.push_line(&import.to_string());
            }
            out.push_dedent().push_line(")");
        }

        for decl in &self.decls {
            out.push_blank();
            for fragment in decl {
                out.apply_fragment(fragment.clone());
            }
        }
        out.build()
    }

    /// `header`, a blank line, then the file.
    pub fn render_with_header(&self, header: &str) -> String {
        format!("{}\n\n{}", header, self.render())
    }
}
