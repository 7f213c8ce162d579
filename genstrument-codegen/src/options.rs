//! Generator options, loadable from a `genstrument.toml` file.
//!
//! ```toml
//! [naming]
//! function_prefix = "Trace"
//! type_prefix = "instrumented"
//! constructor_prefix = "Instrument"
//!
//! [runtime]
//! package = "github.com/justenwalker/genstrument"
//!
//! [output]
//! format = true
//! ```

use std::path::Path;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

/// Import path of the runtime package the generated code calls into.
pub const DEFAULT_RUNTIME_PACKAGE: &str = "github.com/justenwalker/genstrument";

/// All generator options. Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    pub naming: NamingOptions,
    pub runtime: RuntimeOptions,
    pub output: OutputOptions,
}

/// Default name prefixes, used when a declaration carries no `prefix` or
/// `constructor` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingOptions {
    /// Prefix of free-function wrappers.
    pub function_prefix: String,
    /// Prefix of interface wrapper types.
    pub type_prefix: String,
    /// Prefix of interface wrapper constructors.
    pub constructor_prefix: String,
}

impl Default for NamingOptions {
    fn default() -> Self {
        Self {
            function_prefix: "Trace".to_string(),
            type_prefix: "instrumented".to_string(),
            constructor_prefix: "Instrument".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeOptions {
    /// Import path of the tracer runtime package.
    pub package: String,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            package: DEFAULT_RUNTIME_PACKAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputOptions {
    /// Pipe the generated file through `gofmt`.
    pub format: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self { format: true }
    }
}

impl Options {
    /// Parse options from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).wrap_err("invalid genstrument options")
    }

    /// Load options from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("read options file '{}'", path.display()))?;
        Self::from_toml_str(&content).wrap_err_with(|| format!("in '{}'", path.display()))
    }
}
