//! Severity levels for scenario failures
//!
//! The highest severity among reported failures decides the process exit code.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Failure severity, ordered from harmless to fatal
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational (exit 0)
    Info,
    /// Contract drift that does not break the scenario's main expectation:
    /// schema, headers, collection hygiene (exit 0, or 1 if --strict)
    Warning,
    /// Wrong status, body or count (exit 1)
    Error,
    /// Unexpected 5xx or broken setup (exit 2)
    Critical,
}

impl Severity {
    /// Exit code contributed by a failure of this severity.
    ///
    /// Warnings only fail the run in strict mode.
    #[must_use]
    pub const fn exit_code(self, strict: bool) -> i32 {
        match self {
            Self::Info => 0,
            Self::Warning if strict => 1,
            Self::Warning => 0,
            Self::Error => 1,
            Self::Critical => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
