//! Suite configuration: target service, credentials, endpoint paths

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables that override file values.
pub const ENV_BASE_URL: &str = "CHARSUITE_BASE_URL";
pub const ENV_LOGIN: &str = "CHARSUITE_LOGIN";
pub const ENV_PASSWORD: &str = "CHARSUITE_PASSWORD";

const MASK: &str = "***";

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the character service (API version prefix included)
    pub base_url: String,

    /// Basic auth login
    #[serde(default)]
    pub login: String,

    /// Basic auth password
    #[serde(default)]
    pub password: String,

    /// Per-request timeout in seconds (transport default when unset)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Fixture file replacing the embedded fixture set
    #[serde(default)]
    pub fixtures: Option<PathBuf>,

    /// Endpoint paths relative to `base_url`
    #[serde(default)]
    pub endpoints: Endpoints,

    /// Directory for persisted run reports (default: `.charsuite/reports`)
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
}

/// Endpoint paths of the character service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Collection: GET all, HEAD
    pub characters: String,
    /// Single record: GET/POST/PUT/DELETE
    pub character: String,
    /// Wipes all records
    pub reset: String,
    /// Path that must not exist (404 check)
    pub invalid: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            characters: "/characters".to_string(),
            character: "/character".to_string(),
            reset: "/reset".to_string(),
            invalid: "/wrong_url_resource".to_string(),
        }
    }
}

/// Login/password pair sent as HTTP basic auth.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Same login, different password.
    #[must_use]
    pub fn with_password(&self, password: impl Into<String>) -> Self {
        Self::new(self.login.clone(), password)
    }

    /// Same password, different login.
    #[must_use]
    pub fn with_login(&self, login: impl Into<String>) -> Self {
        Self::new(login, self.password.clone())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &MASK)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://rest.test.ivi.ru/v2".to_string(),
            login: String::new(),
            password: String::new(),
            timeout_secs: None,
            fixtures: None,
            endpoints: Endpoints::default(),
            report_dir: None,
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.charsuite.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".charsuite.toml", ".charsuite.json", "charsuite.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Apply `CHARSUITE_*` overrides from the process environment.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(login) = lookup(ENV_LOGIN) {
            self.login = login;
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.password = password;
        }
        self
    }

    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.login.clone(), self.password.clone())
    }

    /// Copy safe to persist: password replaced by a mask.
    #[must_use]
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        if !copy.password.is_empty() {
            copy.password = MASK.to_string();
        }
        copy
    }

    /// Full URL for an endpoint path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# charsuite configuration

# Character service under test
base_url = "http://rest.test.ivi.ru/v2"

# Basic auth (CHARSUITE_LOGIN / CHARSUITE_PASSWORD override these)
login = "user@example.com"
password = "change-me"

# Request timeout in seconds (transport default when omitted)
# timeout_secs = 10

# Replace the built-in fixture set
# fixtures = "fixtures.json"

# Where run reports are written (default: .charsuite/reports)
# report_dir = ".charsuite/reports"

# Endpoint paths relative to base_url
[endpoints]
characters = "/characters"
character = "/character"
reset = "/reset"
invalid = "/wrong_url_resource"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
