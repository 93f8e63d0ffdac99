//! charsuite-core: fixtures, comparison and verdict logic for the character
//! catalog conformance suite
//!
//! Everything here is pure data handling: deciding whether an observed body
//! matches an expected one, building boundary payloads, scanning collections,
//! and turning scenario failures into a verdict. Network access lives in
//! `charsuite-runner`.

pub mod compare;
pub mod config;
pub mod fixtures;
pub mod generator;
pub mod record;
pub mod report;
pub mod verdict;
pub mod workbench;

pub use compare::{Mismatch, MismatchKind, contains, diff, values_equal};
pub use config::{Config, ConfigError, Credentials, Endpoints};
pub use fixtures::{FixtureError, Fixtures};
pub use generator::to_http_file;
pub use record::{Record, wrap_result};
pub use report::{Marker, OutcomeStatus, ScenarioOutcome, SuiteReport};
pub use verdict::{
    Failure, FailureType, RequestSnapshot, ResponseSnapshot, Severity, Verdict, VerdictPolicy,
    VerdictStatus,
};
pub use workbench::{
    DuplicateReport, check_characters_fields, find_duplicate_characters, make_field_symbols,
};
