#![allow(dead_code)]

use charsuite_core::{Config, Credentials, Fixtures, Record};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{Value, json};

/// `tester:secret`
pub const AUTH: &str = "Basic dGVzdGVyOnNlY3JldA==";

pub struct TestSetup {
    pub server: ServerGuard,
    pub config: Config,
}

impl TestSetup {
    pub fn creds(&self) -> Credentials {
        self.config.credentials()
    }
}

/// Mock server plus a config pointing at its `/v2` prefix.
pub fn test_setup() -> TestSetup {
    let server = Server::new();
    let config = Config {
        base_url: format!("{}/v2", server.url()),
        login: "tester".into(),
        password: "secret".into(),
        ..Config::default()
    };
    TestSetup { server, config }
}

pub fn fixtures() -> &'static Fixtures {
    Fixtures::embedded()
}

pub fn name_of(record: &Record) -> &str {
    record.get("name").and_then(Value::as_str).unwrap()
}

// Mocks are removed from the server when dropped: keep every returned
// `Mock` bound until the scenario has run.

/// Mock a JSON response for `method path`, optionally keyed by `?name=`.
pub fn mock_json(
    server: &mut ServerGuard,
    method: &str,
    path: &str,
    name: Option<&str>,
    status: usize,
    body: &Value,
) -> Mock {
    let mut mock = server
        .mock(method, path)
        .match_header("authorization", AUTH)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body.to_string());
    if let Some(name) = name {
        mock = mock.match_query(Matcher::UrlEncoded("name".into(), name.into()));
    }
    mock.create()
}

/// POST that echoes `record` back as `{"result": record}`.
pub fn mock_create(server: &mut ServerGuard, record: &Record) -> Mock {
    server
        .mock("POST", "/v2/character")
        .match_header("authorization", AUTH)
        .match_body(Matcher::Json(Value::Object(record.clone())))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"result": record}).to_string())
        .create()
}

/// GET by name answering with `{"result": record}`.
pub fn mock_read(server: &mut ServerGuard, record: &Record) -> Mock {
    mock_json(
        server,
        "GET",
        "/v2/character",
        Some(name_of(record)),
        200,
        &json!({"result": record}),
    )
}

/// DELETE by name answering with the delete confirmation.
pub fn mock_delete(server: &mut ServerGuard, record: &Record) -> Mock {
    let name = name_of(record);
    let message = fixtures().responses.deleted_message(name);
    mock_json(
        server,
        "DELETE",
        "/v2/character",
        Some(name),
        200,
        &json!({"result": message}),
    )
}

/// POST then GET round trip for each record.
pub fn mock_round_trips(server: &mut ServerGuard, records: &[Record]) -> Vec<Mock> {
    records
        .iter()
        .flat_map(|record| [mock_create(server, record), mock_read(server, record)])
        .collect()
}

pub fn mock_creates(server: &mut ServerGuard, records: &[Record]) -> Vec<Mock> {
    records.iter().map(|record| mock_create(server, record)).collect()
}

pub fn mock_deletes(server: &mut ServerGuard, records: &[Record]) -> Vec<Mock> {
    records.iter().map(|record| mock_delete(server, record)).collect()
}

/// Collection listing holding `names`, served exactly once so a later
/// listing mock on the same path answers the next request.
pub fn mock_listing_once(server: &mut ServerGuard, names: &[&str]) -> Mock {
    let items: Vec<Value> = names.iter().map(|n| json!({ "name": n })).collect();
    server
        .mock("GET", "/v2/characters")
        .match_header("authorization", AUTH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "result": items }).to_string())
        .expect(1)
        .create()
}
