//! In-memory package loader.

use std::rc::Rc;

use eyre::{Result, bail};
use indexmap::IndexMap;

use super::{Package, PackageLoader, runtime_package, standard_package};
use crate::DEFAULT_RUNTIME_PACKAGE;

/// A loader over packages registered up front.
///
/// Well-known standard packages and the runtime package are supplied on
/// demand; any other path must have been added with
/// [`with_package`](Self::with_package).
#[derive(Debug)]
pub struct MemoryLoader {
    packages: IndexMap<String, Rc<Package>>,
    runtime: String,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self {
            packages: IndexMap::new(),
            runtime: DEFAULT_RUNTIME_PACKAGE.to_string(),
        }
    }

    /// Register a package under its import path.
    pub fn with_package(mut self, package: Package) -> Self {
        self.packages.insert(package.path.clone(), Rc::new(package));
        self
    }

    /// Serve the built-in runtime package description at `path`.
    pub fn with_runtime(mut self, path: impl Into<String>) -> Self {
        self.runtime = path.into();
        self
    }
}

impl Default for MemoryLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageLoader for MemoryLoader {
    fn load(&mut self, path: &str) -> Result<Rc<Package>> {
        if let Some(package) = self.packages.get(path) {
            return Ok(Rc::clone(package));
        }
        let package = match standard_package(path) {
            Some(package) => package,
            None if path == self.runtime => runtime_package(path),
            None => bail!("package '{}' not found", path),
        };
        let package = Rc::new(package);
        self.packages.insert(path.to_string(), Rc::clone(&package));
        Ok(package)
    }
}
