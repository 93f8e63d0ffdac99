//! Fixture set: expected payloads and response bodies used as oracles
//!
//! Parsed once per process. Scenarios borrow it immutably and clone a
//! record before mutating it.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Config;
use crate::record::{Record, record_name};

const EMBEDDED: &str = include_str!("../fixtures/default.json");

static EMBEDDED_FIXTURES: LazyLock<Fixtures> = LazyLock::new(|| {
    serde_json::from_str(EMBEDDED).expect("embedded fixture set should parse")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixtures {
    pub payloads: Payloads,
    pub responses: Responses,
    pub headers: ExpectedHeaders,
}

/// Request payloads. Records are stored bare; scenarios wrap them in
/// `{"result": ..}` when an echo is expected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payloads {
    /// Created by the "several characters" setup; index 1 is re-posted
    /// to provoke the already-exists error
    pub post_characters: Vec<Record>,
    /// PUT bodies applied to `post_characters[1]`
    pub changed_identity_for_put: Vec<Record>,
    /// Template for boundary-length payloads
    pub min_length_field: Record,
    pub wrong_order_of_fields: Record,
    pub wrong_order_of_fields_expected: Record,
    pub missing_required_field: Record,
    pub standard_character: Vec<Record>,
    pub only_required_name: Record,
    /// Uniquely named batch for the collection count check
    pub many_chars_manipulations: Vec<Record>,
    /// Name that must never exist on the service
    pub unknown_name: String,
    pub wrong_password: String,
}

/// Expected response bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Responses {
    pub needed_authorization: Value,
    /// Fragment of the raw 500 body for an empty login
    pub slice_login: String,
    pub missing_required_field: Value,
    pub field_length_error: Value,
    pub invalid_input: Value,
    pub no_such_name: Value,
    pub character_created_already: Value,
    /// Delete confirmation, `{name}` is substituted
    pub deleted_template: String,
}

impl Responses {
    /// Delete confirmation text for `name`.
    #[must_use]
    pub fn deleted_message(&self, name: &str) -> String {
        self.deleted_template.replace("{name}", name)
    }
}

/// Fixed header values the service must send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedHeaders {
    pub server: String,
    pub content_type: String,
    pub connection: String,
}

impl Fixtures {
    /// Built-in fixture set.
    #[must_use]
    pub fn embedded() -> &'static Fixtures {
        &EMBEDDED_FIXTURES
    }

    /// Load and validate a fixture file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FixtureError::Io(path.to_path_buf(), e.to_string()))?;
        let fixtures: Self =
            serde_json::from_str(&content).map_err(|e| FixtureError::Parse(e.to_string()))?;
        fixtures.validate()?;
        Ok(fixtures)
    }

    /// Fixture file named in config, or the embedded set.
    ///
    /// # Errors
    ///
    /// Returns error if the configured file cannot be loaded.
    pub fn from_config(config: &Config) -> Result<Self, FixtureError> {
        match &config.fixtures {
            Some(path) => Self::load(path),
            None => Ok(Self::embedded().clone()),
        }
    }

    /// Structural requirements the scenarios rely on.
    ///
    /// # Errors
    ///
    /// Returns the first violated requirement.
    pub fn validate(&self) -> Result<(), FixtureError> {
        let p = &self.payloads;
        if p.post_characters.len() < 2 {
            return Err(FixtureError::Invalid(
                "payloads.post_characters needs at least 2 records".into(),
            ));
        }
        let named = [
            ("post_characters", &p.post_characters),
            ("changed_identity_for_put", &p.changed_identity_for_put),
            ("standard_character", &p.standard_character),
            ("many_chars_manipulations", &p.many_chars_manipulations),
        ];
        for (section, records) in named {
            if let Some(idx) = records.iter().position(|r| record_name(r).is_none()) {
                return Err(FixtureError::Invalid(format!(
                    "payloads.{section}[{idx}] has no name"
                )));
            }
        }
        for (section, record) in [
            ("wrong_order_of_fields", &p.wrong_order_of_fields),
            ("only_required_name", &p.only_required_name),
            ("min_length_field", &p.min_length_field),
        ] {
            if record_name(record).is_none() {
                return Err(FixtureError::Invalid(format!("payloads.{section} has no name")));
            }
        }
        if record_name(&p.missing_required_field).is_some() {
            return Err(FixtureError::Invalid(
                "payloads.missing_required_field must not carry a name".into(),
            ));
        }
        if !self.responses.deleted_template.contains("{name}") {
            return Err(FixtureError::Invalid(
                "responses.deleted_template must contain {name}".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Cannot read fixtures {0}: {1}")]
    Io(PathBuf, String),
    #[error("Fixture parse error: {0}")]
    Parse(String),
    #[error("Invalid fixtures: {0}")]
    Invalid(String),
}
