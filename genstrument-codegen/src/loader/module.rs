//! Package loader over a Go module tree on disk.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};

use eyre::{Context, Result, bail};
use genstrument_core::{GoModule, default_package_name};

use super::{Package, PackageLoader, runtime_package, standard_package};
use crate::DEFAULT_RUNTIME_PACKAGE;

/// Loads packages from the enclosing module and `GOPATH` source roots.
///
/// Resolution order for an import path:
/// 1. a directory of the enclosing module (missing directories are errors),
/// 2. a directory under a `GOPATH` source root,
/// 3. the built-in standard and runtime package descriptions,
/// 4. an opaque package named after the path, for dependencies outside the
///    module whose sources are not available.
#[derive(Debug)]
pub struct ModuleLoader {
    module: Option<GoModule>,
    source_roots: Vec<PathBuf>,
    runtime: String,
    cache: HashMap<String, Rc<Package>>,
}

impl ModuleLoader {
    pub fn new(module: Option<GoModule>) -> Self {
        Self {
            module,
            source_roots: Vec::new(),
            runtime: DEFAULT_RUNTIME_PACKAGE.to_string(),
            cache: HashMap::new(),
        }
    }

    /// Create a loader for the module enclosing `dir`, with the `src`
    /// directories of `GOPATH` as additional roots.
    pub fn discover(dir: &Path) -> Result<Self> {
        let module = if std::env::var("GO111MODULE").as_deref() == Ok("off") {
            None
        } else {
            GoModule::find(dir)?
        };
        let roots: Vec<PathBuf> = std::env::var_os("GOPATH")
            .map(|paths| {
                std::env::split_paths(&paths)
                    .map(|path| path.join("src"))
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self::new(module).with_source_roots(roots))
    }

    /// Add `GOPATH`-style source roots (`<root>/<import path>`).
    pub fn with_source_roots(mut self, roots: impl IntoIterator<Item = PathBuf>) -> Self {
        self.source_roots.extend(roots);
        self
    }

    /// Serve the built-in runtime package description at `path` when it is
    /// not found on disk.
    pub fn with_runtime(mut self, path: impl Into<String>) -> Self {
        self.runtime = path.into();
        self
    }

    fn find(&self, path: &str) -> Result<Option<Package>> {
        if let Some(module) = &self.module
            && let Some(dir) = module.package_dir(path)
        {
            if !dir.is_dir() {
                bail!(
                    "package '{}' not found in module '{}' (no directory '{}')",
                    path,
                    module.path(),
                    dir.display()
                );
            }
            return read_package(path, &dir).map(Some);
        }
        for root in &self.source_roots {
            let dir = path.split('/').fold(root.clone(), |dir, part| dir.join(part));
            if dir.is_dir() {
                return read_package(path, &dir).map(Some);
            }
        }
        Ok(None)
    }
}

impl PackageLoader for ModuleLoader {
    fn load(&mut self, path: &str) -> Result<Rc<Package>> {
        if let Some(package) = self.cache.get(path) {
            return Ok(Rc::clone(package));
        }
        let package = match self.find(path)? {
            Some(package) => package,
            None => match standard_package(path) {
                Some(package) => package,
                None if path == self.runtime => runtime_package(path),
                None => {
                    tracing::debug!(
                        package = path,
                        "package sources not found, treating as opaque"
                    );
                    Package::opaque(path, default_package_name(path))
                }
            },
        };
        let package = Rc::new(package);
        self.cache.insert(path.to_string(), Rc::clone(&package));
        Ok(package)
    }
}

/// Read the non-test `.go` files of a package directory.
fn read_package(path: &str, dir: &Path) -> Result<Package> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .wrap_err_with(|| format!("read package directory '{}'", dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|file| {
            file.is_file()
                && file.extension().is_some_and(|ext| ext == "go")
                && !file.to_string_lossy().ends_with("_test.go")
        })
        .collect();
    files.sort();

    let mut package: Option<Package> = None;
    for file in &files {
        let source = genstrument_source::parse_file(file)
            .wrap_err_with(|| format!("load package '{}'", path))?;
        let package = package.get_or_insert_with(|| Package::new(path, &source.package));
        if source.package != package.name {
            tracing::debug!(
                file = %file.display(),
                package = %source.package,
                "skipping file of another package"
            );
            continue;
        }
        package.add_file(&source);
    }
    let Some(package) = package else {
        bail!("no Go files in '{}'", dir.display());
    };
    tracing::debug!(
        package = path,
        files = files.len(),
        symbols = package.symbols.len(),
        "loaded package"
    );
    Ok(package)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::loader::Symbol;

    fn module_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("go.mod"), "module example.com/app\n\ngo 1.22\n").unwrap();
        let types = temp.path().join("types");
        fs::create_dir_all(&types).unwrap();
        fs::write(
            types.join("types.go"),
            "package types\n\ntype MyType string\n\nfunc MyTypeAttr(v MyType, s any) {}\n",
        )
        .unwrap();
        fs::write(
            types.join("more.go"),
            "package types\n\nimport \"time\"\n\ntype Timeout time.Duration\n",
        )
        .unwrap();
        fs::write(
            types.join("types_test.go"),
            "package types_test\n\nfunc TestNothing() {}\n",
        )
        .unwrap();
        temp
    }

    fn loader(temp: &TempDir) -> ModuleLoader {
        ModuleLoader::new(GoModule::find(temp.path()).unwrap())
    }

    #[test]
    fn test_load_package_from_module() {
        let temp = module_tree();
        let mut loader = loader(&temp);

        let package = loader.load("example.com/app/types").unwrap();
        assert_eq!(package.name, "types");
        assert!(!package.opaque);
        assert_eq!(package.lookup("MyTypeAttr"), Some(&Symbol::Func));
        assert!(package.type_definition("Timeout").is_some());
        assert_eq!(package.lookup("TestNothing"), None);
        assert_eq!(package.imports.get("time").map(String::as_str), Some("time"));

        let again = loader.load("example.com/app/types").unwrap();
        assert!(Rc::ptr_eq(&package, &again));
    }

    #[test]
    fn test_discover_loads_from_enclosing_module() {
        let temp = module_tree();
        let mut loader = ModuleLoader::discover(&temp.path().join("types")).unwrap();

        let package = loader.load("example.com/app/types").unwrap();
        assert!(!package.opaque);
        assert!(package.type_definition("MyType").is_some());
    }

    #[test]
    fn test_missing_module_package_is_an_error() {
        let temp = module_tree();
        let mut loader = loader(&temp);

        let err = loader.load("example.com/app/missing").unwrap_err();
        assert!(err.to_string().contains("not found in module 'example.com/app'"));
    }

    #[test]
    fn test_builtin_and_opaque_fallbacks() {
        let temp = module_tree();
        let mut loader = loader(&temp);

        assert_eq!(loader.load("context").unwrap().name, "context");
        assert!(!loader.load(DEFAULT_RUNTIME_PACKAGE).unwrap().opaque);

        let external = loader.load("github.com/google/uuid").unwrap();
        assert!(external.opaque);
        assert_eq!(external.name, "uuid");
    }

    #[test]
    fn test_source_roots() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("src").join("example.com").join("lib");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("lib.go"), "package library\n\ntype Key int\n").unwrap();

        let mut loader = ModuleLoader::new(None).with_source_roots([temp.path().join("src")]);
        let package = loader.load("example.com/lib").unwrap();
        assert_eq!(package.name, "library");
        assert!(package.type_definition("Key").is_some());
    }

    #[test]
    fn test_syntax_error_in_package() {
        let temp = module_tree();
        fs::write(
            temp.path().join("types").join("broken.go"),
            "package types\n\nfunc (\n",
        )
        .unwrap();
        let mut loader = loader(&temp);

        let err = loader.load("example.com/app/types").unwrap_err();
        assert_eq!(err.to_string(), "load package 'example.com/app/types'");
    }
}
