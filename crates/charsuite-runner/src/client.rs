//! Blocking HTTP client for the character service
//!
//! One method per endpoint operation. Every call is a single network round
//! trip: no retries, no caching. Non-2xx statuses are ordinary outcomes; only
//! transport failures surface as [`ClientError`].

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use charsuite_core::{Config, Credentials, Endpoints, RequestSnapshot};
use serde_json::Value;

use crate::response::Response;

const AUTH_MASK: &str = "Basic ***";

/// HTTP verbs used by the suite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        };
        f.write_str(label)
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }
}

/// Client bound to one service instance.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    /// Endpoint paths resolved against `base_url`
    urls: Endpoints,
}

impl ApiClient {
    /// Build from config: base URL, endpoint paths and optional timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            urls: Endpoints {
                characters: config.url(&config.endpoints.characters),
                character: config.url(&config.endpoints.character),
                reset: config.url(&config.endpoints.reset),
                invalid: config.url(&config.endpoints.invalid),
            },
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn get_all_characters(&self, creds: &Credentials) -> Result<Response, ClientError> {
        self.send(HttpMethod::Get, &self.urls.characters, None, None, creds)
    }

    pub fn get_character_by_name(
        &self,
        name: &str,
        creds: &Credentials,
    ) -> Result<Response, ClientError> {
        self.send(
            HttpMethod::Get,
            &self.urls.character,
            Some(name),
            None,
            creds,
        )
    }

    /// POST a record. `body` is sent as-is, so non-object JSON works too.
    pub fn post_character_by_body(
        &self,
        body: &Value,
        creds: &Credentials,
    ) -> Result<Response, ClientError> {
        self.send(
            HttpMethod::Post,
            &self.urls.character,
            None,
            Some(body),
            creds,
        )
    }

    /// PUT a record; the service locates it by the `name` inside `body`.
    pub fn put_character_by_name(
        &self,
        body: &Value,
        creds: &Credentials,
    ) -> Result<Response, ClientError> {
        self.send(
            HttpMethod::Put,
            &self.urls.character,
            None,
            Some(body),
            creds,
        )
    }

    pub fn delete_character(
        &self,
        name: &str,
        creds: &Credentials,
    ) -> Result<Response, ClientError> {
        self.send(
            HttpMethod::Delete,
            &self.urls.character,
            Some(name),
            None,
            creds,
        )
    }

    /// Wipe every record (POST to the reset endpoint).
    pub fn delete_all_characters(&self, creds: &Credentials) -> Result<Response, ClientError> {
        self.send(HttpMethod::Post, &self.urls.reset, None, None, creds)
    }

    pub fn head_characters_page(&self, creds: &Credentials) -> Result<Response, ClientError> {
        self.send(HttpMethod::Head, &self.urls.characters, None, None, creds)
    }

    pub fn get_wrong_url_resource(&self, creds: &Credentials) -> Result<Response, ClientError> {
        self.send(HttpMethod::Get, &self.urls.invalid, None, None, creds)
    }

    fn send(
        &self,
        method: HttpMethod,
        url: &str,
        name: Option<&str>,
        body: Option<&Value>,
        creds: &Credentials,
    ) -> Result<Response, ClientError> {
        let mut req = self
            .http
            .request(method.into(), url)
            .basic_auth(&creds.login, Some(&creds.password));
        if let Some(name) = name {
            req = req.query(&[("name", name)]);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let request = req.build().map_err(|e| ClientError::Transport {
            method,
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let snapshot = snapshot_request(&request);

        let start = Instant::now();
        let resp = self
            .http
            .execute(request)
            .map_err(|e| transport_error(method, &snapshot.url, &e))?;
        let elapsed = start.elapsed();

        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let text = resp
            .text()
            .map_err(|e| transport_error(method, &snapshot.url, &e))?;

        tracing::debug!(
            %method,
            url = %snapshot.url,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            "request completed"
        );

        let headers = headers
            .iter()
            .map(|(k, v)| (k.as_str(), String::from_utf8_lossy(v.as_bytes()).into_owned()));
        Ok(Response::new(
            status,
            headers,
            text,
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            snapshot,
        ))
    }
}

fn transport_error(method: HttpMethod, url: &str, err: &reqwest::Error) -> ClientError {
    tracing::debug!(%method, url, error = %err, "transport failure");
    ClientError::Transport {
        method,
        url: url.to_string(),
        message: err.to_string(),
    }
}

/// Snapshot of the request as it goes on the wire, credentials masked.
fn snapshot_request(request: &reqwest::blocking::Request) -> RequestSnapshot {
    let headers: BTreeMap<String, String> = request
        .headers()
        .iter()
        .map(|(k, v)| {
            let value = if *k == reqwest::header::AUTHORIZATION {
                AUTH_MASK.to_string()
            } else {
                String::from_utf8_lossy(v.as_bytes()).into_owned()
            };
            (k.as_str().to_string(), value)
        })
        .collect();
    let body = request
        .body()
        .and_then(|b| b.as_bytes())
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned());
    RequestSnapshot {
        method: request.method().to_string(),
        url: request.url().to_string(),
        headers,
        body,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    Build(String),
    #[error("{method} {url}: {message}")]
    Transport {
        method: HttpMethod,
        url: String,
        message: String,
    },
}
