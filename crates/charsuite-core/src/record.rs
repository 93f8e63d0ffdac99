//! Character records and response envelope helpers

use serde_json::{Map, Value};

/// A character record: field name → scalar value.
pub type Record = Map<String, Value>;

/// Key wrapping every successful response payload.
pub const RESULT_KEY: &str = "result";

/// Fields holding numbers rather than text.
pub const NUMERIC_FIELDS: &[&str] = &["height", "weight"];

/// `{"result": value}`
#[must_use]
pub fn wrap_result(value: impl Into<Value>) -> Value {
    let mut envelope = Map::new();
    envelope.insert(RESULT_KEY.to_string(), value.into());
    Value::Object(envelope)
}

/// Record `name`, if present and textual.
#[must_use]
pub fn record_name(record: &Record) -> Option<&str> {
    record.get("name").and_then(Value::as_str)
}

/// Objects inside a collection body: the `result` array, or a bare array.
#[must_use]
pub fn collection_records(body: &Value) -> Vec<Record> {
    collection_items(body)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_object().cloned())
                .collect()
        })
        .unwrap_or_default()
}

/// Items of a collection body, `None` when the body is not a collection.
#[must_use]
pub fn collection_items(body: &Value) -> Option<&Vec<Value>> {
    match body {
        Value::Array(items) => Some(items),
        Value::Object(obj) => obj.get(RESULT_KEY).and_then(Value::as_array),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrap_result_builds_envelope() {
        assert_eq!(wrap_result(json!("ok")), json!({"result": "ok"}));
    }

    #[test]
    fn collection_from_result_key() {
        let body = json!({"result": [{"name": "A"}, {"name": "B"}, 3]});
        let records = collection_records(&body);
        assert_eq!(records.len(), 2);
        assert_eq!(record_name(&records[1]), Some("B"));
    }

    #[test]
    fn collection_from_bare_array() {
        let body = json!([{"name": "A"}]);
        assert_eq!(collection_records(&body).len(), 1);
    }

    #[test]
    fn single_record_is_not_a_collection() {
        let body = json!({"result": {"name": "A"}});
        assert!(collection_items(&body).is_none());
        assert!(collection_records(&body).is_empty());
    }
}
