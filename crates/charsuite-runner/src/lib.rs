//! charsuite-runner: HTTP client, contract checks and scenario execution

pub mod assertions;
pub mod client;
pub mod contract;
pub mod lifecycle;
pub mod response;
pub mod scenarios;
pub mod suite;

pub use assertions::StepError;
pub use client::{ApiClient, ClientError, HttpMethod};
pub use contract::{Contract, validate_fields};
pub use response::Response;
pub use scenarios::{ScenarioCase, ScenarioContext};
pub use suite::SuiteRunner;
