//! Structural comparison of JSON bodies
//!
//! Key order never matters. Strings, booleans, null and integers compare
//! exactly; any comparison involving a float uses [`FLOAT_TOLERANCE`], so an
//! integer `190` equals the float `190.0`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Absolute tolerance for float comparison.
pub const FLOAT_TOLERANCE: f64 = 1e-9;

/// Why two values differ at a given path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// Key expected but absent
    Missing,
    /// Key present but not expected
    Unexpected,
    /// Arrays of different length
    Length,
    /// Different JSON types or scalar values
    Value,
}

/// One point of difference between expected and actual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Mismatch {
    /// JSON pointer, `""` for the root
    pub path: String,
    pub kind: MismatchKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        let show = |v: &Option<Value>| v.as_ref().map_or("<absent>".to_string(), Value::to_string);
        match self.kind {
            MismatchKind::Missing => write!(f, "{path}: missing, expected {}", show(&self.expected)),
            MismatchKind::Unexpected => write!(f, "{path}: unexpected {}", show(&self.actual)),
            MismatchKind::Length => write!(
                f,
                "{path}: length {} != expected {}",
                show(&self.actual),
                show(&self.expected)
            ),
            MismatchKind::Value => write!(
                f,
                "{path}: {} != expected {}",
                show(&self.actual),
                show(&self.expected)
            ),
        }
    }
}

/// Structural equality.
#[must_use]
pub fn values_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => {
            e.len() == a.len()
                && e.iter()
                    .all(|(k, ev)| a.get(k).is_some_and(|av| values_equal(ev, av)))
        }
        (Value::Array(e), Value::Array(a)) => {
            e.len() == a.len() && e.iter().zip(a).all(|(ev, av)| values_equal(ev, av))
        }
        _ => scalars_equal(expected, actual),
    }
}

/// Partial match: every key in `expected` exists in `actual` with a matching
/// value. Extra keys in `actual` are allowed at any depth; arrays must have
/// equal length.
#[must_use]
pub fn contains(actual: &Value, expected: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => e
            .iter()
            .all(|(k, ev)| a.get(k).is_some_and(|av| contains(av, ev))),
        (Value::Array(e), Value::Array(a)) => {
            e.len() == a.len() && e.iter().zip(a).all(|(ev, av)| contains(av, ev))
        }
        _ => scalars_equal(expected, actual),
    }
}

/// Every point where `actual` differs from `expected`, sorted by path.
#[must_use]
pub fn diff(expected: &Value, actual: &Value) -> Vec<Mismatch> {
    let mut out = Vec::new();
    diff_into(expected, actual, String::new(), &mut out);
    out.sort_by(|a, b| a.path.cmp(&b.path));
    out
}

fn diff_into(expected: &Value, actual: &Value, path: String, out: &mut Vec<Mismatch>) {
    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => {
            for (k, ev) in e {
                let child = format!("{path}/{}", escape_pointer(k));
                match a.get(k) {
                    Some(av) => diff_into(ev, av, child, out),
                    None => out.push(Mismatch {
                        path: child,
                        kind: MismatchKind::Missing,
                        expected: Some(ev.clone()),
                        actual: None,
                    }),
                }
            }
            for (k, av) in a {
                if !e.contains_key(k) {
                    out.push(Mismatch {
                        path: format!("{path}/{}", escape_pointer(k)),
                        kind: MismatchKind::Unexpected,
                        expected: None,
                        actual: Some(av.clone()),
                    });
                }
            }
        }
        (Value::Array(e), Value::Array(a)) => {
            if e.len() != a.len() {
                out.push(Mismatch {
                    path: path.clone(),
                    kind: MismatchKind::Length,
                    expected: Some(Value::from(e.len())),
                    actual: Some(Value::from(a.len())),
                });
            }
            for (idx, (ev, av)) in e.iter().zip(a).enumerate() {
                diff_into(ev, av, format!("{path}/{idx}"), out);
            }
        }
        _ => {
            if !scalars_equal(expected, actual) {
                out.push(Mismatch {
                    path,
                    kind: MismatchKind::Value,
                    expected: Some(expected.clone()),
                    actual: Some(actual.clone()),
                });
            }
        }
    }
}

fn scalars_equal(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(e), Value::Number(a)) => numbers_equal(e, a),
        _ => expected == actual,
    }
}

fn numbers_equal(e: &Number, a: &Number) -> bool {
    if let (Some(x), Some(y)) = (e.as_i64(), a.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (e.as_u64(), a.as_u64()) {
        return x == y;
    }
    match (e.as_f64(), a.as_f64()) {
        (Some(x), Some(y)) => (x - y).abs() <= FLOAT_TOLERANCE,
        _ => false,
    }
}

/// RFC 6901 token escaping.
fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
