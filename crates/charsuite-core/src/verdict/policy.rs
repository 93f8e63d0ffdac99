//! Verdict policy - filters failures and turns scenario counts into a verdict

use super::{Failure, FailureType, Severity};

/// Policy for filtering and judging failures
#[derive(Debug, Clone)]
pub struct VerdictPolicy {
    /// Strict mode: warnings become errors
    pub strict: bool,
    /// Failure types to ignore
    pub ignore_failure_types: Vec<FailureType>,
    /// Minimum severity to report (below this = ignored)
    pub min_severity: Severity,
}

impl Default for VerdictPolicy {
    fn default() -> Self {
        Self {
            strict: true,
            ignore_failure_types: vec![],
            min_severity: Severity::Warning,
        }
    }
}

impl VerdictPolicy {
    /// Warnings are reported but do not fail the run.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn filter(&self, failures: Vec<Failure>) -> Vec<Failure> {
        failures
            .into_iter()
            .filter(|f| self.should_report(f))
            .collect()
    }

    fn should_report(&self, failure: &Failure) -> bool {
        !self.ignore_failure_types.contains(&failure.failure_type)
            && failure.severity >= self.min_severity
    }

    /// Highest exit code among failures; 3 when only transport errors occurred.
    #[must_use]
    pub fn exit_code(&self, failures: &[Failure], has_errors: bool) -> i32 {
        let failure_code = failures
            .iter()
            .map(|f| f.severity.exit_code(self.strict))
            .max()
            .unwrap_or(0);

        if failure_code > 0 {
            return failure_code;
        }
        if has_errors {
            return 3;
        }
        0
    }

    /// PASS requires every scenario to pass and at least one to have run.
    #[must_use]
    pub fn verdict(&self, failures: &[Failure], total: u64, passed: u64, errors: u64) -> Verdict {
        let has_errors = errors > 0;
        let exit_code = self.exit_code(failures, has_errors);

        let status = if passed == total && total > 0 {
            VerdictStatus::Pass
        } else {
            VerdictStatus::Fail
        };

        let reason = if status == VerdictStatus::Pass {
            "All scenarios passed".to_string()
        } else if total == 0 {
            "No scenarios were run".to_string()
        } else {
            let mut parts = vec![format!("{} of {total} scenarios failed", total - passed)];
            if !failures.is_empty() {
                let count = |s: Severity| failures.iter().filter(|f| f.severity == s).count();
                parts.push(format!(
                    "{} failures ({} critical, {} error, {} warning)",
                    failures.len(),
                    count(Severity::Critical),
                    count(Severity::Error),
                    count(Severity::Warning),
                ));
            }
            if has_errors {
                parts.push(format!("{errors} errors (connection/transport)"));
            }
            parts.join("; ")
        };

        Verdict {
            status,
            exit_code,
            reason,
        }
    }
}

/// Final verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub exit_code: i32,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}
