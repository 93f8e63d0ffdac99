//! Suite report: the interchange format written by `charsuite run`
//!
//! Per-scenario outcomes plus aggregate counts. `charsuite schema` prints the
//! JSON Schema generated from these types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::verdict::Failure;

/// Scenario group, used to select subsets of the suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// Standard CRUD flows
    HttpFunctional,
    /// Collection-wide and field-level checks
    ObjectsApi,
    /// Error codes and rejected input
    NegativeCases,
}

impl Marker {
    pub const ALL: [Marker; 3] = [Self::HttpFunctional, Self::ObjectsApi, Self::NegativeCases];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HttpFunctional => "http_functional",
            Self::ObjectsApi => "objects_api",
            Self::NegativeCases => "negative_cases",
        }
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a scenario ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Passed,
    /// At least one expectation failed
    Failed,
    /// Aborted by a transport error
    Errored,
}

/// Result of one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioOutcome {
    /// Scenario id, e.g. `create_character[0]`
    pub id: String,
    pub marker: Marker,
    pub status: OutcomeStatus,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<Failure>,
    /// Transport error that aborted the scenario
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Whole-suite report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SuiteReport {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub errored: u64,
    pub scenarios: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    #[must_use]
    pub fn from_outcomes(scenarios: Vec<ScenarioOutcome>) -> Self {
        let count = |s: OutcomeStatus| scenarios.iter().filter(|o| o.status == s).count() as u64;
        Self {
            total: scenarios.len() as u64,
            passed: count(OutcomeStatus::Passed),
            failed: count(OutcomeStatus::Failed),
            errored: count(OutcomeStatus::Errored),
            scenarios,
        }
    }

    /// All failures across scenarios, in run order.
    #[must_use]
    pub fn failures(&self) -> Vec<Failure> {
        self.scenarios
            .iter()
            .flat_map(|o| o.failures.iter().cloned())
            .collect()
    }

    /// Transport errors, prefixed with the scenario id.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.scenarios
            .iter()
            .filter_map(|o| o.error.as_ref().map(|e| format!("{}: {e}", o.id)))
            .collect()
    }
}

/// Generate JSON Schema for the report format.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(SuiteReport);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: &str, status: OutcomeStatus) -> ScenarioOutcome {
        ScenarioOutcome {
            id: id.to_string(),
            marker: Marker::NegativeCases,
            status,
            duration_ms: 1,
            failures: vec![],
            error: (status == OutcomeStatus::Errored).then(|| "connection refused".to_string()),
        }
    }

    #[test]
    fn counts_from_outcomes() {
        let report = SuiteReport::from_outcomes(vec![
            outcome("a", OutcomeStatus::Passed),
            outcome("b", OutcomeStatus::Failed),
            outcome("c", OutcomeStatus::Errored),
            outcome("d", OutcomeStatus::Passed),
        ]);
        assert_eq!(report.total, 4);
        assert_eq!(report.passed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errored, 1);
        assert_eq!(report.errors(), vec!["c: connection refused".to_string()]);
    }

    #[test]
    fn deserialize_minimal_report() {
        let json = r#"{
            "total": 1, "passed": 1, "failed": 0, "errored": 0,
            "scenarios": [{"id": "empty_login", "marker": "negative_cases", "status": "passed"}]
        }"#;
        let report: SuiteReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.scenarios[0].marker, Marker::NegativeCases);
        assert!(report.failures().is_empty());
    }

    #[test]
    fn marker_labels_match_serde() {
        for marker in Marker::ALL {
            let json = serde_json::to_string(&marker).unwrap();
            assert_eq!(json, format!("\"{}\"", marker.as_str()));
        }
    }

    #[test]
    fn schema_generation_produces_valid_json() {
        let schema = generate_schema();
        let parsed: serde_json::Value = serde_json::from_str(&schema).unwrap();
        assert_eq!(
            parsed.get("title").and_then(|v| v.as_str()),
            Some("SuiteReport")
        );
    }
}
