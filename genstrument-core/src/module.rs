//! Mapping between directories and Go import paths.

use std::path::{Component, Path, PathBuf};

use eyre::{Context, Result, bail};

/// A Go module: the directory holding `go.mod` and the declared module path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoModule {
    root: PathBuf,
    path: String,
}

impl GoModule {
    /// Create a module description from its root directory and module path.
    pub fn new(root: impl Into<PathBuf>, path: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            path: path.into(),
        }
    }

    /// Find the module enclosing `dir` by walking up to the nearest `go.mod`.
    pub fn find(dir: &Path) -> Result<Option<GoModule>> {
        let dir = std::path::absolute(dir)
            .wrap_err_with(|| format!("could not get absolute path of {}", dir.display()))?;
        for candidate in dir.ancestors() {
            let go_mod = candidate.join("go.mod");
            let content = match std::fs::read_to_string(&go_mod) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(e).wrap_err_with(|| format!("read '{}'", go_mod.display()));
                }
            };
            let Some(path) = parse_module_path(&content) else {
                bail!("'{}' has no module directive", go_mod.display());
            };
            tracing::debug!(root = %candidate.display(), module = %path, "found go module");
            return Ok(Some(GoModule::new(candidate, path)));
        }
        Ok(None)
    }

    /// The directory containing `go.mod`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The declared module path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Import path of the package in `dir`, if `dir` is inside the module.
    pub fn package_path(&self, dir: &Path) -> Option<String> {
        let relative = dir.strip_prefix(&self.root).ok()?;
        let mut path = self.path.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    path.push('/');
                    path.push_str(&part.to_string_lossy());
                }
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(path)
    }

    /// Directory of the package `import_path`, if it belongs to the module.
    pub fn package_dir(&self, import_path: &str) -> Option<PathBuf> {
        if import_path == self.path {
            return Some(self.root.clone());
        }
        let rest = import_path.strip_prefix(&self.path)?.strip_prefix('/')?;
        Some(rest.split('/').fold(self.root.clone(), |dir, part| dir.join(part)))
    }
}

/// Extract the module path from the contents of a `go.mod` file.
fn parse_module_path(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or_default().trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches(|c| c == '"' || c == '`');
        (!path.is_empty()).then(|| path.to_string())
    })
}

/// Resolve the full import path of the package in `dir`.
///
/// Uses the enclosing module unless `GO111MODULE=off`, then falls back to
/// the `GOPATH` source roots.
pub fn resolve_package_path(dir: &Path) -> Result<String> {
    let dir = std::path::absolute(dir)
        .wrap_err_with(|| format!("could not get absolute path of {}", dir.display()))?;
    if std::env::var("GO111MODULE").as_deref() != Ok("off")
        && let Some(module) = GoModule::find(&dir)?
        && let Some(path) = module.package_path(&dir)
    {
        return Ok(path);
    }
    let Some(go_paths) = std::env::var_os("GOPATH") else {
        bail!("GOPATH not set and '{}' is not inside a module", dir.display());
    };
    for go_path in std::env::split_paths(&go_paths) {
        let src = go_path.join("src");
        if let Ok(relative) = dir.strip_prefix(&src) {
            let parts: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            return Ok(parts.join("/"));
        }
    }
    bail!("module not found: '{}' is outside GOPATH", dir.display())
}

/// The package name assumed for an import path when its sources are not
/// read: the last element, skipping a major-version suffix (`/v2`), without
/// a `go-` prefix and cut at the first character that cannot appear in an
/// identifier (`yaml.v3`, `client-go`).
pub fn default_package_name(import_path: &str) -> &str {
    let mut parts = import_path.rsplit('/');
    let mut base = parts.next().unwrap_or(import_path);
    if is_major_version(base)
        && let Some(previous) = parts.next()
    {
        base = previous;
    }
    let base = base.strip_prefix("go-").unwrap_or(base);
    match base.find(|c: char| !(c.is_alphanumeric() || c == '_')) {
        Some(end) => &base[..end],
        None => base,
    }
}

fn is_major_version(part: &str) -> bool {
    part.strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}
