//! Field workbench: batch utilities over character records
//!
//! No I/O. Duplicate detection, boundary-length payload construction and
//! table-driven field rules.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::record::{NUMERIC_FIELDS, Record, record_name};

/// Character repeated to build boundary-length text fields.
pub const PLACEHOLDER: char = '0';

/// Text field lengths the service must accept.
pub const ACCEPTED_LENGTHS: [usize; 2] = [1, 350];

/// Text field lengths the service must reject.
pub const REJECTED_LENGTHS: [usize; 2] = [0, 351];

/// Result of a duplicate-name scan over a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    /// Records scanned
    pub total: usize,
    /// Name → occurrences, only names seen more than once
    pub duplicates: BTreeMap<String, usize>,
}

impl DuplicateReport {
    /// `true` when no name repeats.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty()
    }

    /// Occurrences of a duplicated name (0 if it is not duplicated).
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.duplicates.get(name).copied().unwrap_or(0)
    }
}

/// Count records per `name` and report every name occurring more than once.
///
/// Records without a textual `name` are counted in `total` but cannot collide.
#[must_use]
pub fn find_duplicate_characters(records: &[Record]) -> DuplicateReport {
    tracing::debug!(total = records.len(), "scanning collection for duplicate names");

    let mut counter: BTreeMap<String, usize> = BTreeMap::new();
    for name in records.iter().filter_map(record_name) {
        *counter.entry(name.to_string()).or_default() += 1;
    }
    counter.retain(|_, count| *count > 1);

    if !counter.is_empty() {
        tracing::warn!(duplicates = ?counter, "recurring characters in collection");
    }

    DuplicateReport {
        total: records.len(),
        duplicates: counter,
    }
}

/// Replace every text field with `n` placeholder characters and zero the
/// numeric fields.
#[must_use]
pub fn make_field_symbols(mut record: Record, n: usize) -> Record {
    let filler = PLACEHOLDER.to_string().repeat(n);
    for (field, value) in record.iter_mut() {
        *value = if NUMERIC_FIELDS.contains(&field.as_str()) {
            Value::from(0.0)
        } else {
            Value::String(filler.clone())
        };
    }
    record
}

/// A constraint on a single record field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRule {
    /// Numeric value must be >= the bound
    MinValue(f64),
    /// At most this many digits after the decimal point
    MaxFractionDigits(usize),
}

impl FieldRule {
    /// Whether `value` satisfies the rule. Non-numeric values never do.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        let Some(text) = numeric_text(value) else {
            return false;
        };
        match self {
            Self::MinValue(min) => text.parse::<f64>().is_ok_and(|v| v >= min),
            Self::MaxFractionDigits(max) => fraction_digits(&text).is_some_and(|d| d <= max),
        }
    }
}

impl std::fmt::Display for FieldRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MinValue(min) => write!(f, ">= {min}"),
            Self::MaxFractionDigits(max) => write!(f, "at most {max} fractional digits"),
        }
    }
}

/// Field name → rules. Fields not listed are unconstrained.
pub const FIELD_RULES: &[(&str, &[FieldRule])] = &[(
    "height",
    &[FieldRule::MinValue(120.0), FieldRule::MaxFractionDigits(2)],
)];

/// A rule broken by one field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    pub field: String,
    pub rule: FieldRule,
    pub value: Value,
}

/// Every rule the record breaks.
#[must_use]
pub fn field_violations(record: &Record) -> Vec<FieldViolation> {
    let mut out = Vec::new();
    for (field, rules) in FIELD_RULES {
        let Some(value) = record.get(*field) else {
            continue;
        };
        for rule in *rules {
            if !rule.accepts(value) {
                out.push(FieldViolation {
                    field: (*field).to_string(),
                    rule: *rule,
                    value: value.clone(),
                });
            }
        }
    }
    out
}

/// Records violating at least one field rule, each collected once.
#[must_use]
pub fn check_characters_fields(records: &[Record]) -> Vec<Record> {
    records
        .iter()
        .filter(|record| {
            let violations = field_violations(record);
            for v in &violations {
                tracing::warn!(
                    name = record_name(record).unwrap_or("<unnamed>"),
                    field = %v.field,
                    value = %v.value,
                    rule = %v.rule,
                    "field rule violated"
                );
            }
            !violations.is_empty()
        })
        .cloned()
        .collect()
}

/// Textual form of a numeric value (numbers, or strings that parse as a finite one).
fn numeric_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|_| s.to_string())
        }
        _ => None,
    }
}

/// Digits after the decimal point, handling exponent notation (`1.5e-3` → 4).
fn fraction_digits(text: &str) -> Option<usize> {
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(pos) => (&text[..pos], text[pos + 1..].parse::<i64>().ok()?),
        None => (text, 0),
    };
    let digits = mantissa
        .split_once('.')
        .map_or(0, |(_, frac)| frac.trim_end_matches('0').len());
    let shifted = i64::try_from(digits).ok()?.checked_sub(exponent)?;
    Some(usize::try_from(shifted.max(0)).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn duplicates_found_with_counts() {
        let records = vec![
            rec(json!({"name": "Hulk", "height": 250})),
            rec(json!({"name": "Thor"})),
            rec(json!({"name": "Hulk", "universe": "Earth-616"})),
        ];
        let report = find_duplicate_characters(&records);

        assert!(!report.is_clean());
        assert_eq!(report.total, 3);
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.count("Hulk"), 2);
        assert_eq!(report.count("Thor"), 0);
    }

    #[test]
    fn no_duplicates_is_explicit_success() {
        let records = vec![rec(json!({"name": "A"})), rec(json!({"name": "B"}))];
        let report = find_duplicate_characters(&records);
        assert!(report.is_clean());
        assert_eq!(report.total, 2);
    }

    #[test]
    fn empty_collection_is_clean() {
        assert!(find_duplicate_characters(&[]).is_clean());
    }

    #[test]
    fn unnamed_records_do_not_collide() {
        let records = vec![rec(json!({"height": 1})), rec(json!({"height": 1}))];
        assert!(find_duplicate_characters(&records).is_clean());
    }

    #[test]
    fn field_symbols_fill_text_and_zero_numbers() {
        let record = rec(json!({
            "name": "Hulk",
            "universe": "Marvel",
            "height": 250,
            "weight": 500.5
        }));
        let out = make_field_symbols(record, 3);

        assert_eq!(out["name"], json!("000"));
        assert_eq!(out["universe"], json!("000"));
        assert_eq!(out["height"], json!(0.0));
        assert_eq!(out["weight"], json!(0.0));
    }

    #[test]
    fn field_symbols_zero_length_gives_empty_strings() {
        let out = make_field_symbols(rec(json!({"name": "Hulk"})), 0);
        assert_eq!(out["name"], json!(""));
    }

    #[test]
    fn boundary_lengths_straddle_the_limits() {
        assert_eq!(ACCEPTED_LENGTHS[0], REJECTED_LENGTHS[0] + 1);
        assert_eq!(ACCEPTED_LENGTHS[1] + 1, REJECTED_LENGTHS[1]);
    }

    #[test]
    fn fraction_digit_counting() {
        assert_eq!(fraction_digits("190"), Some(0));
        assert_eq!(fraction_digits("190.0"), Some(0));
        assert_eq!(fraction_digits("190.25"), Some(2));
        assert_eq!(fraction_digits("190.255"), Some(3));
        assert_eq!(fraction_digits("1.5e-3"), Some(4));
        assert_eq!(fraction_digits("1.5e2"), Some(0));
        assert_eq!(fraction_digits("1e-9223372036854775808"), None);
        assert_eq!(fraction_digits("1.5e9223372036854775807"), Some(0));
    }

    #[test]
    fn extreme_exponent_is_flagged_not_panicking() {
        let records = vec![rec(json!({"name": "X", "height": "1e-9223372036854775808"}))];
        let bad = check_characters_fields(&records);
        assert_eq!(bad.len(), 1);
        assert_eq!(field_violations(&records[0]).len(), 2);
    }

    #[test]
    fn non_finite_heights_break_both_rules() {
        for v in ["inf", "-inf", "infinity", "NaN"] {
            assert_eq!(
                field_violations(&rec(json!({"height": v}))).len(),
                2,
                "{v} should be rejected"
            );
        }
    }

    #[test]
    fn height_rules() {
        let ok = [json!(120), json!(180.5), json!(199.99), json!("150.25")];
        for v in ok {
            assert!(
                field_violations(&rec(json!({"height": v.clone()}))).is_empty(),
                "{v} should pass"
            );
        }

        let short = field_violations(&rec(json!({"height": 119.99})));
        assert_eq!(short.len(), 1);
        assert_eq!(short[0].rule, FieldRule::MinValue(120.0));

        let precise = field_violations(&rec(json!({"height": 180.125})));
        assert_eq!(precise[0].rule, FieldRule::MaxFractionDigits(2));

        // Non-numeric height breaks both rules
        assert_eq!(field_violations(&rec(json!({"height": "tall"}))).len(), 2);
    }

    #[test]
    fn check_fields_collects_each_bad_record_once() {
        let records = vec![
            rec(json!({"name": "A", "height": 180})),
            rec(json!({"name": "B", "height": 100.123})),
            rec(json!({"name": "C"})),
            rec(json!({"name": "D", "height": 90})),
        ];
        let bad = check_characters_fields(&records);
        let names: Vec<_> = bad.iter().filter_map(record_name).collect();
        assert_eq!(names, vec!["B", "D"]);
    }

    proptest! {
        #[test]
        fn duplicated_name_is_identified(
            name in "[A-Za-z]{1,12}",
            others in prop::collection::btree_set("[0-9]{1,6}", 0..8),
        ) {
            let mut records: Vec<Record> = others
                .iter()
                .map(|n| rec(json!({"name": n})))
                .collect();
            records.push(rec(json!({"name": name, "height": 180})));
            records.push(rec(json!({"name": name, "universe": "other"})));

            let report = find_duplicate_characters(&records);
            prop_assert_eq!(report.duplicates.len(), 1);
            prop_assert!(report.count(&name) >= 2);
        }

        #[test]
        fn field_symbols_text_length(n in 0usize..400) {
            let out = make_field_symbols(rec(json!({"name": "x", "identity": "y", "height": 1})), n);
            prop_assert_eq!(out["name"].as_str().map(str::len), Some(n));
            prop_assert_eq!(out["identity"].as_str().map(str::len), Some(n));
            prop_assert_eq!(&out["height"], &json!(0.0));
        }
    }
}
