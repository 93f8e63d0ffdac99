//! Scenario expectations
//!
//! No I/O. Each helper inspects one response and either passes or returns a
//! [`Failure`] carrying the request/response snapshots plus a context map
//! (expected, actual, diff, message) used as the diagnostic attachment.

use charsuite_core::fixtures::ExpectedHeaders;
use charsuite_core::record::record_name;
use charsuite_core::workbench::{check_characters_fields, field_violations};
use charsuite_core::{Failure, FailureType, find_duplicate_characters};
use serde_json::Value;

use crate::client::ClientError;
use crate::contract::{Contract, validate_fields};
use crate::response::Response;

/// Why a scenario step stopped.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// The request never completed
    #[error(transparent)]
    Transport(#[from] ClientError),
    /// The response broke an expectation
    #[error("{}: {}", .0.id, .0.message().unwrap_or(.0.failure_type.description()))]
    Failed(Box<Failure>),
}

impl From<Failure> for StepError {
    fn from(failure: Failure) -> Self {
        Self::Failed(Box::new(failure))
    }
}

pub type StepResult = Result<(), StepError>;

/// Failure of `failure_type` attributed to `resp`.
#[must_use]
pub fn failure(id: &str, failure_type: FailureType, resp: &Response) -> Failure {
    Failure::new(id, failure_type, resp.request().clone(), resp.snapshot())
}

pub fn expect_status(id: &str, resp: &Response, expected: u16) -> StepResult {
    if resp.compare_status_code(expected) {
        return Ok(());
    }
    let actual = resp.status_code();
    Err(
        Failure::from_status(id, expected, resp.request().clone(), resp.snapshot())
            .with_context("expected", expected.to_string())
            .with_context("actual", actual.to_string())
            .with_context("message", format!("status {actual} != expected {expected}"))
            .into(),
    )
}

/// Decoded body structurally equal to `expected`.
pub fn expect_body(id: &str, resp: &Response, expected: &Value) -> StepResult {
    if resp.compare_body(expected) {
        return Ok(());
    }
    let mismatches = resp.body_diff(expected);
    let diff = mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    Err(failure(id, FailureType::BodyMismatch, resp)
        .with_context("expected", expected.to_string())
        .with_context("actual", resp.text())
        .with_context("diff", diff)
        .with_context(
            "message",
            format!("body differs at {} path(s)", mismatches.len().max(1)),
        )
        .into())
}

pub fn expect_schema(id: &str, resp: &Response, contract: Contract) -> StepResult {
    match validate_fields(resp.return_body(), contract) {
        Ok(()) => Ok(()),
        Err(errors) => Err(failure(id, FailureType::SchemaViolation, resp)
            .with_context("schema", contract.name())
            .with_context("actual", resp.text())
            .with_context(
                "message",
                format!("{contract} schema: {}", errors.join("; ")),
            )
            .into()),
    }
}

/// Raw body text contains `fragment`.
pub fn expect_raw_text(id: &str, resp: &Response, fragment: &str) -> StepResult {
    if resp.compare_raw_text(fragment) {
        return Ok(());
    }
    Err(failure(id, FailureType::RawTextMismatch, resp)
        .with_context("expected", fragment)
        .with_context("actual", resp.text())
        .with_context("message", format!("body lacks {fragment:?}"))
        .into())
}

/// Constraint on a response header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderRule {
    Equals(String),
    NonBlank,
    PositiveInteger,
}

impl HeaderRule {
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Self::Equals(expected) => value == expected,
            Self::NonBlank => !value.trim().is_empty(),
            Self::PositiveInteger => value.trim().parse::<u64>().is_ok_and(|n| n > 0),
        }
    }
}

impl std::fmt::Display for HeaderRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equals(expected) => write!(f, "== {expected:?}"),
            Self::NonBlank => f.write_str("non-blank"),
            Self::PositiveInteger => f.write_str("integer > 0"),
        }
    }
}

/// Header name → rule, values taken from the header fixture.
#[must_use]
pub fn header_rules(expected: &ExpectedHeaders) -> Vec<(&'static str, HeaderRule)> {
    vec![
        ("Server", HeaderRule::Equals(expected.server.clone())),
        ("Date", HeaderRule::NonBlank),
        (
            "Content-Type",
            HeaderRule::Equals(expected.content_type.clone()),
        ),
        ("Connection", HeaderRule::Equals(expected.connection.clone())),
        ("Content-Length", HeaderRule::PositiveInteger),
    ]
}

/// Every present header satisfies its rule. Absent headers are not checked.
pub fn expect_headers(id: &str, resp: &Response, expected: &ExpectedHeaders) -> StepResult {
    let broken: Vec<String> = header_rules(expected)
        .into_iter()
        .filter_map(|(name, rule)| {
            let value = resp.header(name)?;
            (!rule.accepts(value)).then(|| format!("{name}: {value:?} breaks {rule}"))
        })
        .collect();
    if broken.is_empty() {
        return Ok(());
    }
    Err(failure(id, FailureType::HeaderMismatch, resp)
        .with_context("message", broken.join("\n"))
        .into())
}

/// Collection body holds no repeated names.
pub fn expect_no_duplicates(id: &str, resp: &Response) -> StepResult {
    let report = find_duplicate_characters(&resp.records());
    if report.is_clean() {
        return Ok(());
    }
    let listed = report
        .duplicates
        .iter()
        .map(|(name, count)| format!("{name} x{count}"))
        .collect::<Vec<_>>()
        .join(", ");
    Err(failure(id, FailureType::DuplicateRecords, resp)
        .with_context("total", report.total.to_string())
        .with_context("message", format!("recurring characters: {listed}"))
        .into())
}

/// No record in the collection breaks a field rule.
pub fn expect_field_rules(id: &str, resp: &Response) -> StepResult {
    let flagged = check_characters_fields(&resp.records());
    if flagged.is_empty() {
        return Ok(());
    }
    let lines: Vec<String> = flagged
        .iter()
        .flat_map(|record| {
            let name = record_name(record).unwrap_or("<unnamed>").to_string();
            field_violations(record)
                .into_iter()
                .map(move |v| format!("{name}: {} = {} breaks {}", v.field, v.value, v.rule))
        })
        .collect();
    Err(failure(id, FailureType::FieldRuleViolation, resp)
        .with_context("flagged", flagged.len().to_string())
        .with_context("message", lines.join("\n"))
        .into())
}

pub fn expect_count(id: &str, resp: &Response, expected: usize, actual: usize) -> StepResult {
    if expected == actual {
        return Ok(());
    }
    Err(failure(id, FailureType::CountMismatch, resp)
        .with_context("expected", expected.to_string())
        .with_context("actual", actual.to_string())
        .with_context("message", format!("collection size {actual} != expected {expected}"))
        .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::tests::{json_response, request};
    use charsuite_core::Severity;
    use serde_json::json;

    fn unwrap_failure(result: StepResult) -> Failure {
        match result {
            Err(StepError::Failed(f)) => *f,
            other => panic!("expected failure, got {other:?}"),
        }
    }

    fn headers() -> ExpectedHeaders {
        ExpectedHeaders {
            server: "nginx".into(),
            content_type: "application/json".into(),
            connection: "keep-alive".into(),
        }
    }

    fn head_response(pairs: &[(&str, &str)]) -> Response {
        Response::new(
            200,
            pairs.iter().copied(),
            String::new(),
            0,
            request("HEAD", "http://h/v2/characters"),
        )
    }

    #[test]
    fn status_match_passes() {
        let resp = json_response(400, &json!({"error": "No such name"}));
        assert!(expect_status("s", &resp, 400).is_ok());
    }

    #[test]
    fn status_mismatch_carries_context() {
        let resp = json_response(500, &json!({}));
        let f = unwrap_failure(expect_status("s", &resp, 400));
        assert_eq!(f.failure_type, FailureType::ServerError);
        assert_eq!(f.context.get("expected").unwrap(), "400");
        assert_eq!(f.context.get("actual").unwrap(), "500");
        assert_eq!(f.expected_status, Some(400));
    }

    #[test]
    fn body_mismatch_attaches_diff() {
        let resp = json_response(200, &json!({"result": {"name": "Thor", "height": 190}}));
        assert!(expect_body("s", &resp, &json!({"result": {"height": 190.0, "name": "Thor"}})).is_ok());

        let f = unwrap_failure(expect_body("s", &resp, &json!({"result": {"name": "Loki"}})));
        assert_eq!(f.failure_type, FailureType::BodyMismatch);
        let diff = f.context.get("diff").unwrap();
        assert!(diff.contains("/result/name"));
        assert!(diff.contains("/result/height"));
    }

    #[test]
    fn schema_violation_is_warning() {
        let resp = json_response(200, &json!({"result": {"universe": "Marvel"}}));
        let f = unwrap_failure(expect_schema("s", &resp, Contract::Character));
        assert_eq!(f.failure_type, FailureType::SchemaViolation);
        assert_eq!(f.severity, Severity::Warning);
        assert_eq!(f.context.get("schema").unwrap(), "character");
    }

    #[test]
    fn raw_text_fragment() {
        let resp = Response::new(
            500,
            Vec::<(&str, &str)>::new(),
            "string index out of range".to_string(),
            0,
            request("GET", "http://h/v2/characters"),
        );
        assert!(expect_raw_text("s", &resp, "index out of range").is_ok());
        let f = unwrap_failure(expect_raw_text("s", &resp, "KeyError"));
        assert_eq!(f.failure_type, FailureType::RawTextMismatch);
    }

    #[test]
    fn header_rule_table() {
        let rules = header_rules(&headers());
        let rule = |name: &str| rules.iter().find(|(n, _)| *n == name).unwrap().1.clone();
        assert!(rule("Server").accepts("nginx"));
        assert!(!rule("Server").accepts("Apache"));
        assert!(rule("Date").accepts("Sun, 18 Oct 2026 10:00:00 GMT"));
        assert!(!rule("Date").accepts("  "));
        assert!(rule("Content-Length").accepts("42"));
        assert!(!rule("Content-Length").accepts("0"));
        assert!(!rule("Content-Length").accepts("many"));
    }

    #[test]
    fn conforming_headers_pass() {
        let resp = head_response(&[
            ("server", "nginx"),
            ("date", "Sun, 18 Oct 2026 10:00:00 GMT"),
            ("content-type", "application/json"),
            ("connection", "keep-alive"),
            ("content-length", "1024"),
        ]);
        assert!(expect_headers("headers_field", &resp, &headers()).is_ok());
    }

    #[test]
    fn absent_headers_are_not_checked() {
        let resp = head_response(&[("server", "nginx")]);
        assert!(expect_headers("headers_field", &resp, &headers()).is_ok());
    }

    #[test]
    fn every_broken_header_is_listed() {
        let resp = head_response(&[
            ("server", "Apache"),
            ("connection", "close"),
            ("content-length", "0"),
        ]);
        let f = unwrap_failure(expect_headers("headers_field", &resp, &headers()));
        assert_eq!(f.failure_type, FailureType::HeaderMismatch);
        insta::assert_snapshot!(f.message().unwrap(), @r#"
        Server: "Apache" breaks == "nginx"
        Connection: "close" breaks == "keep-alive"
        Content-Length: "0" breaks integer > 0
        "#);
    }

    #[test]
    fn duplicates_reported_by_name() {
        let resp = json_response(
            200,
            &json!({"result": [{"name": "A"}, {"name": "B"}, {"name": "A"}]}),
        );
        let f = unwrap_failure(expect_no_duplicates("s", &resp));
        assert_eq!(f.failure_type, FailureType::DuplicateRecords);
        assert_eq!(f.message(), Some("recurring characters: A x2"));

        let clean = json_response(200, &json!({"result": [{"name": "A"}, {"name": "B"}]}));
        assert!(expect_no_duplicates("s", &clean).is_ok());
    }

    #[test]
    fn field_rules_flag_short_and_imprecise_heights() {
        let resp = json_response(
            200,
            &json!({"result": [
                {"name": "Tall", "height": 190},
                {"name": "Short", "height": 100},
                {"name": "Precise", "height": 180.123}
            ]}),
        );
        let f = unwrap_failure(expect_field_rules("s", &resp));
        assert_eq!(f.context.get("flagged").unwrap(), "2");
        let msg = f.message().unwrap();
        assert!(msg.contains("Short"));
        assert!(msg.contains("Precise"));
        assert!(!msg.contains("Tall"));
    }

    #[test]
    fn count_mismatch() {
        let resp = json_response(200, &json!({"result": []}));
        assert!(expect_count("s", &resp, 3, 3).is_ok());
        let f = unwrap_failure(expect_count("s", &resp, 5, 4));
        assert_eq!(f.failure_type, FailureType::CountMismatch);
    }

    #[test]
    fn step_error_display_uses_message() {
        let resp = json_response(404, &json!({}));
        let err = expect_status("wrong_url_resource", &resp, 200).unwrap_err();
        assert_eq!(
            err.to_string(),
            "wrong_url_resource: status 404 != expected 200"
        );
    }
}
