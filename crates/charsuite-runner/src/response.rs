//! Response wrapper: status, headers, raw text and decoded body of one call

use std::collections::BTreeMap;

use charsuite_core::compare::{self, Mismatch};
use charsuite_core::record::{collection_items, collection_records};
use charsuite_core::{Record, RequestSnapshot, ResponseSnapshot};
use serde_json::Value;

/// Stored body size cap for snapshots
const MAX_BODY_BYTES: usize = 4096;

#[derive(Debug, Clone)]
pub struct Response {
    status_code: u16,
    /// Canonical names (`Content-Type`), repeated headers joined with `", "`
    headers: BTreeMap<String, String>,
    text: String,
    /// `Null` when the body is not JSON
    body: Value,
    latency_ms: u64,
    request: RequestSnapshot,
}

impl Response {
    pub fn new<K, V>(
        status_code: u16,
        headers: impl IntoIterator<Item = (K, V)>,
        text: String,
        latency_ms: u64,
        request: RequestSnapshot,
    ) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut merged: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in headers {
            let value = value.into();
            merged
                .entry(canonical_header_name(name.as_ref()))
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status_code,
            headers: merged,
            text,
            body,
            latency_ms,
            request,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    #[must_use]
    pub fn compare_status_code(&self, expected: u16) -> bool {
        self.status_code == expected
    }

    /// Structural equality with `expected`.
    #[must_use]
    pub fn compare_body(&self, expected: &Value) -> bool {
        compare::values_equal(expected, &self.body)
    }

    #[must_use]
    pub fn body_diff(&self, expected: &Value) -> Vec<Mismatch> {
        compare::diff(expected, &self.body)
    }

    /// Every key of `expected` present in the body with a matching value.
    #[must_use]
    pub fn contains_body(&self, expected: &Value) -> bool {
        compare::contains(&self.body, expected)
    }

    /// Substring match against the raw body text.
    #[must_use]
    pub fn compare_raw_text(&self, expected: &str) -> bool {
        self.text.contains(expected)
    }

    #[must_use]
    pub fn return_headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&canonical_header_name(name)).map(String::as_str)
    }

    /// Entries of a collection body, 0 for anything else.
    #[must_use]
    pub fn count_all_characters(&self) -> usize {
        collection_items(&self.body).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn return_body(&self) -> &Value {
        &self.body
    }

    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        collection_records(&self.body)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn request(&self) -> &RequestSnapshot {
        &self.request
    }

    /// Snapshot for failure reports, body truncated to a bounded size.
    #[must_use]
    pub fn snapshot(&self) -> ResponseSnapshot {
        ResponseSnapshot {
            status_code: self.status_code,
            headers: self.headers.clone(),
            body: truncate_body(&self.text),
            latency_ms: self.latency_ms,
        }
    }
}

/// `content-type` → `Content-Type`
fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn truncate_body(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    if text.len() <= MAX_BODY_BYTES {
        return Some(text.to_string());
    }
    let mut end = MAX_BODY_BYTES;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    Some(format!("{}…({} bytes total)", &text[..end], text.len()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn request(method: &str, url: &str) -> RequestSnapshot {
        RequestSnapshot {
            method: method.to_string(),
            url: url.to_string(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub(crate) fn json_response(status: u16, body: &Value) -> Response {
        Response::new(
            status,
            [("content-type", "application/json")],
            body.to_string(),
            5,
            request("GET", "http://h/v2/character?name=Thor"),
        )
    }

    #[test]
    fn header_names_canonicalized() {
        let resp = Response::new(
            200,
            [("content-type", "application/json"), ("x-request-id", "abc")],
            String::new(),
            0,
            request("HEAD", "http://h/v2/characters"),
        );
        assert!(resp.return_headers().contains_key("Content-Type"));
        assert!(resp.return_headers().contains_key("X-Request-Id"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn repeated_headers_joined() {
        let resp = Response::new(
            200,
            [("vary", "Accept"), ("Vary", "Origin")],
            String::new(),
            0,
            request("GET", "http://h/"),
        );
        assert_eq!(resp.header("vary"), Some("Accept, Origin"));
    }

    #[test]
    fn body_comparison_ignores_key_order_and_int_float() {
        let resp = json_response(200, &json!({"result": {"name": "Thor", "height": 190}}));
        assert!(resp.compare_status_code(200));
        assert!(resp.compare_body(&json!({"result": {"height": 190.0, "name": "Thor"}})));
        assert!(!resp.compare_body(&json!({"result": {"name": "Thor"}})));
        assert!(resp.contains_body(&json!({"result": {"name": "Thor"}})));
    }

    #[test]
    fn body_diff_reports_paths() {
        let resp = json_response(200, &json!({"result": {"name": "Thor"}}));
        let diff = resp.body_diff(&json!({"result": {"name": "Loki"}}));
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].path, "/result/name");
    }

    #[test]
    fn non_json_body_keeps_raw_text() {
        let resp = Response::new(
            500,
            Vec::<(&str, &str)>::new(),
            "IndexError: string index out of range".to_string(),
            0,
            request("GET", "http://h/v2/characters"),
        );
        assert_eq!(resp.return_body(), &Value::Null);
        assert!(resp.compare_raw_text("string index out of range"));
        assert!(!resp.compare_raw_text("KeyError"));
    }

    #[test]
    fn counts_collection_entries() {
        let resp = json_response(200, &json!({"result": [{"name": "A"}, {"name": "B"}]}));
        assert_eq!(resp.count_all_characters(), 2);
        assert_eq!(resp.records().len(), 2);

        let single = json_response(200, &json!({"result": {"name": "A"}}));
        assert_eq!(single.count_all_characters(), 0);
        assert!(single.records().is_empty());
    }

    #[test]
    fn snapshot_truncates_large_body() {
        let text = "é".repeat(MAX_BODY_BYTES);
        let resp = Response::new(
            200,
            Vec::<(&str, &str)>::new(),
            text,
            1,
            request("GET", "http://h/"),
        );
        let body = resp.snapshot().body.unwrap();
        assert!(body.ends_with("bytes total)"));
        assert!(body.len() < MAX_BODY_BYTES + 32);
    }

    #[test]
    fn empty_body_snapshot_is_none() {
        let resp = Response::new(
            200,
            Vec::<(&str, &str)>::new(),
            String::new(),
            1,
            request("HEAD", "http://h/"),
        );
        assert!(resp.snapshot().body.is_none());
    }
}
