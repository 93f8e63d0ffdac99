//! Scenario failures and the request/response snapshots attached to them

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Severity;

/// What a scenario expectation tripped over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    /// Unexpected 5xx where something else was expected
    ServerError,
    /// Status code differs from the expected one
    StatusMismatch,
    /// Decoded body differs from the fixture
    BodyMismatch,
    /// Raw body lacks the expected text fragment
    RawTextMismatch,
    /// Body does not satisfy the contract schema
    SchemaViolation,
    /// A response header breaks its rule
    HeaderMismatch,
    /// Collection holds the same name more than once
    DuplicateRecords,
    /// Record field outside its allowed range/precision
    FieldRuleViolation,
    /// Collection size did not change as expected
    CountMismatch,
    /// Fixture setup could not establish the required state
    SetupFailed,
}

impl FailureType {
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::ServerError | Self::SetupFailed => Severity::Critical,
            Self::StatusMismatch
            | Self::BodyMismatch
            | Self::RawTextMismatch
            | Self::CountMismatch => Severity::Error,
            Self::SchemaViolation
            | Self::HeaderMismatch
            | Self::DuplicateRecords
            | Self::FieldRuleViolation => Severity::Warning,
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ServerError => "Server returned an unexpected 5xx",
            Self::StatusMismatch => "Status code differs from expected",
            Self::BodyMismatch => "Response body differs from expected",
            Self::RawTextMismatch => "Response text lacks expected fragment",
            Self::SchemaViolation => "Response body does not match contract schema",
            Self::HeaderMismatch => "Response header breaks its rule",
            Self::DuplicateRecords => "Collection contains duplicate names",
            Self::FieldRuleViolation => "Record field breaks its rule",
            Self::CountMismatch => "Collection size changed unexpectedly",
            Self::SetupFailed => "Fixture setup failed",
        }
    }
}

impl std::fmt::Display for FailureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Snapshot of HTTP request for reproduction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RequestSnapshot {
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl RequestSnapshot {
    /// Path and query of the URL, `/` when there is none.
    #[must_use]
    pub fn path(&self) -> &str {
        let rest = self
            .url
            .split_once("://")
            .map_or(self.url.as_str(), |(_, r)| r);
        rest.find('/').map_or("/", |idx| &rest[idx..])
    }
}

/// Snapshot of HTTP response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseSnapshot {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub latency_ms: u64,
}

/// A single failed expectation inside a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Failure {
    /// Scenario id, e.g. `get_character_by_name[1]`
    pub id: String,
    pub method: String,
    pub path: String,
    /// Status of the offending response
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status: Option<u16>,
    pub failure_type: FailureType,
    pub severity: Severity,
    pub request: RequestSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSnapshot>,
    /// Diagnostic attachment: expected, actual, diff, message
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl Failure {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        failure_type: FailureType,
        request: RequestSnapshot,
        response: ResponseSnapshot,
    ) -> Self {
        Self {
            id: id.into(),
            method: request.method.clone(),
            path: request.path().to_string(),
            status_code: response.status_code,
            expected_status: None,
            failure_type,
            severity: failure_type.default_severity(),
            request,
            response: Some(response),
            context: BTreeMap::new(),
        }
    }

    /// Status expectation broken: an unexpected 5xx is a server error,
    /// anything else a plain mismatch.
    #[must_use]
    pub fn from_status(
        id: impl Into<String>,
        expected: u16,
        request: RequestSnapshot,
        response: ResponseSnapshot,
    ) -> Self {
        let failure_type = classify_status(expected, response.status_code);
        let mut failure = Self::new(id, failure_type, request, response);
        failure.expected_status = Some(expected);
        failure
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_expected_status(mut self, expected: u16) -> Self {
        self.expected_status = Some(expected);
        self
    }

    /// The `message` context entry, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.context.get("message").map(String::as_str)
    }
}

fn classify_status(expected: u16, actual: u16) -> FailureType {
    if (500..600).contains(&actual) && !(500..600).contains(&expected) {
        FailureType::ServerError
    } else {
        FailureType::StatusMismatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> RequestSnapshot {
        RequestSnapshot {
            method: "POST".to_string(),
            url: "http://localhost:8080/v2/character".to_string(),
            headers: BTreeMap::new(),
            body: Some(r#"{"name": "test"}"#.to_string()),
        }
    }

    fn response(status: u16) -> ResponseSnapshot {
        ResponseSnapshot {
            status_code: status,
            headers: BTreeMap::new(),
            body: None,
            latency_ms: 3,
        }
    }

    #[test]
    fn severity_mapping() {
        assert_eq!(
            FailureType::ServerError.default_severity(),
            Severity::Critical
        );
        assert_eq!(
            FailureType::SetupFailed.default_severity(),
            Severity::Critical
        );
        assert_eq!(FailureType::BodyMismatch.default_severity(), Severity::Error);
        assert_eq!(
            FailureType::SchemaViolation.default_severity(),
            Severity::Warning
        );
    }

    #[test]
    fn unexpected_5xx_is_server_error() {
        let f = Failure::from_status("s", 200, sample_request(), response(502));
        assert_eq!(f.failure_type, FailureType::ServerError);
        assert_eq!(f.severity, Severity::Critical);
        assert_eq!(f.expected_status, Some(200));
    }

    #[test]
    fn expected_5xx_mismatch_is_plain_status_mismatch() {
        let f = Failure::from_status("s", 500, sample_request(), response(503));
        assert_eq!(f.failure_type, FailureType::StatusMismatch);
        let f = Failure::from_status("s", 400, sample_request(), response(200));
        assert_eq!(f.failure_type, FailureType::StatusMismatch);
        assert_eq!(f.severity, Severity::Error);
    }

    #[test]
    fn new_takes_method_and_path_from_request() {
        let f = Failure::new("s", FailureType::BodyMismatch, sample_request(), response(200));
        assert_eq!(f.method, "POST");
        assert_eq!(f.path, "/v2/character");
        assert_eq!(f.status_code, 200);
    }

    #[test]
    fn request_path_variants() {
        let mut req = sample_request();
        req.url = "http://host".into();
        assert_eq!(req.path(), "/");
        req.url = "https://host/v2/character?name=A".into();
        assert_eq!(req.path(), "/v2/character?name=A");
    }

    #[test]
    fn builder_pattern() {
        let f = Failure::from_status("s", 200, sample_request(), response(500))
            .with_context("message", "boom");
        assert_eq!(f.severity, Severity::Critical);
        assert_eq!(f.message(), Some("boom"));
    }

    #[test]
    fn serialization_roundtrip() {
        let f = Failure::new("s", FailureType::SchemaViolation, sample_request(), response(200))
            .with_context("diff", "/result: missing");
        let json = serde_json::to_string(&f).unwrap();
        let parsed: Failure = serde_json::from_str(&json).unwrap();
        assert_eq!(f, parsed);
    }
}
