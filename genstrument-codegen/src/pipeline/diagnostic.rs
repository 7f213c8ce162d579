//! Problems found while analysing an input file.
//!
//! Phases keep going after a bad directive or an unwrappable declaration;
//! everything found is reported together at the end of the run.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    /// Blocks generation.
    Error,
    /// Something was ignored; output is still produced.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Name of the phase that recorded it.
    pub phase: String,
    pub message: String,
    /// `<file>:<line>` of the offending declaration.
    pub location: Option<String>,
}

impl Diagnostic {
    pub fn error(phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, phase.into(), message.into())
    }

    pub fn warning(phase: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, phase.into(), message.into())
    }

    fn with_severity(severity: Severity, phase: String, message: String) -> Self {
        Self {
            severity,
            phase,
            message,
            location: None,
        }
    }

    pub fn at(self, location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..self
        }
    }

    /// `<file>:<line>: <message>`, or the bare message without a location.
    pub fn located(&self) -> String {
        self.location.as_ref().map_or_else(
            || self.message.clone(),
            |location| format!("{}: {}", location, self.message),
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.located())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_without_location() {
        let diag = Diagnostic::error("model", "interface has no methods");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.phase, "model");
        assert_eq!(diag.located(), "interface has no methods");
        assert_eq!(diag.to_string(), "error: interface has no methods");
    }

    #[test]
    fn test_located_warning() {
        let diag = Diagnostic::warning("synthesize", "attribute ignored").at("svc.go:12");
        assert_eq!(diag.location.as_deref(), Some("svc.go:12"));
        assert_eq!(diag.located(), "svc.go:12: attribute ignored");
        assert_eq!(diag.to_string(), "warning: svc.go:12: attribute ignored");
    }
}
