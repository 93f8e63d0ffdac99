//! JSON Schema contracts for response bodies

use std::sync::LazyLock;

use jsonschema::validator_for;
use serde_json::{Value, json};

/// Maximum validation messages kept per body
const MAX_ERRORS: usize = 5;

static CHARACTER_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Character response",
        "type": "object",
        "required": ["result"],
        "properties": {
            "result": {
                "oneOf": [
                    {"$ref": "#/$defs/character"},
                    {"type": "array", "items": {"$ref": "#/$defs/character"}}
                ]
            }
        },
        "$defs": {
            "character": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": {"type": "string"},
                    "universe": {"type": "string"},
                    "education": {"type": "string"},
                    "identity": {"type": "string"},
                    "other_aliases": {"type": "string"},
                    "height": {"type": "number"},
                    "weight": {"type": "number"}
                }
            }
        }
    })
});

static ERROR_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Error response",
        "type": "object",
        "required": ["error"],
        "properties": {
            "error": {"type": ["string", "object"]},
            "message": {"type": "string"}
        }
    })
});

static RESULT_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "Result response",
        "type": "object",
        "required": ["result"],
        "properties": {
            "result": {"type": "string"}
        }
    })
});

/// Response shapes the service promises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contract {
    /// `{"result": character | [character]}`
    Character,
    /// `{"error": string | object, "message"?: string}`
    Error,
    /// `{"result": string}`
    Result,
}

impl Contract {
    #[must_use]
    pub fn schema(self) -> &'static Value {
        match self {
            Self::Character => &CHARACTER_SCHEMA,
            Self::Error => &ERROR_SCHEMA,
            Self::Result => &RESULT_SCHEMA,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Error => "error",
            Self::Result => "result",
        }
    }
}

impl std::fmt::Display for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Validate `body` against a contract.
///
/// # Errors
///
/// Returns up to five validation messages when the body does not conform.
pub fn validate_fields(body: &Value, contract: Contract) -> Result<(), Vec<String>> {
    let validator = validator_for(contract.schema())
        .map_err(|e| vec![format!("{contract} schema does not compile: {e}")])?;
    let errors: Vec<String> = validator
        .iter_errors(body)
        .take(MAX_ERRORS)
        .map(|e| e.to_string())
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_character_conforms() {
        let body = json!({"result": {"name": "Thor", "height": 198.12, "universe": "Marvel"}});
        assert!(validate_fields(&body, Contract::Character).is_ok());
    }

    #[test]
    fn character_list_conforms() {
        let body = json!({"result": [{"name": "A"}, {"name": "B", "weight": 80}]});
        assert!(validate_fields(&body, Contract::Character).is_ok());
    }

    #[test]
    fn character_without_name_rejected() {
        let body = json!({"result": {"universe": "Marvel"}});
        assert!(validate_fields(&body, Contract::Character).is_err());
    }

    #[test]
    fn character_with_text_height_rejected() {
        let body = json!({"result": {"name": "A", "height": "tall"}});
        let errors = validate_fields(&body, Contract::Character).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn error_accepts_string_or_object() {
        assert!(validate_fields(&json!({"error": "No such name"}), Contract::Error).is_ok());
        assert!(
            validate_fields(
                &json!({"error": {"name": ["Missing data for required field."]}}),
                Contract::Error
            )
            .is_ok()
        );
        assert!(validate_fields(&json!({"error": 3}), Contract::Error).is_err());
        assert!(validate_fields(&json!({"result": "x"}), Contract::Error).is_err());
    }

    #[test]
    fn result_requires_string() {
        assert!(validate_fields(&json!({"result": "Hero A is deleted"}), Contract::Result).is_ok());
        assert!(validate_fields(&json!({"result": {"name": "A"}}), Contract::Result).is_err());
    }

    #[test]
    fn non_object_body_rejected() {
        assert!(validate_fields(&Value::Null, Contract::Character).is_err());
    }
}
