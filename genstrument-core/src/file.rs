use std::{
    fs,
    path::{Path, PathBuf},
};

use eyre::{Context, Result};

/// Outcome of [`File::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Written,
    /// The file on disk already had this content.
    Unchanged,
}

/// Generated content bound for `path`.
#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
    content: String,
}

impl File {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole buffer at once, creating missing parent directories.
    ///
    /// A file that already holds the same bytes is not touched, so its
    /// modification time survives regeneration.
    pub fn write(&self) -> Result<WriteResult> {
        if fs::read(&self.path).is_ok_and(|existing| existing == self.content.as_bytes()) {
            tracing::debug!(path = %self.path.display(), "generated file unchanged");
            return Ok(WriteResult::Unchanged);
        }
        self.replace()
            .wrap_err_with(|| format!("write '{}' failed", self.path.display()))?;
        Ok(WriteResult::Written)
    }

    fn replace(&self) -> std::io::Result<()> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)?,
            _ => {}
        }
        fs::write(&self.path, &self.content)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a/b/gen.go");

        let file = File::new(&path, "package b\n");
        assert_eq!(file.path(), path);
        assert_eq!(file.write().unwrap(), WriteResult::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "package b\n");
    }

    #[test]
    fn test_replaces_stale_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gen.go");
        fs::write(&path, "package old\n").unwrap();

        assert_eq!(File::new(&path, "package new\n").write().unwrap(), WriteResult::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "package new\n");
    }

    #[test]
    fn test_identical_content_is_left_alone() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gen.go");
        fs::write(&path, "package same\n").unwrap();

        assert_eq!(File::new(&path, "package same\n").write().unwrap(), WriteResult::Unchanged);
    }
}
