// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! StruAI client construction, authentication, and HTTP transport layer.
//!
//! [`StruAiClient`] is the primary entry point for all SDK operations. It owns
//! the base URL, HTTP client, bearer token, and timeout. Resource façades
//! ([`Drawings`](crate::drawings::Drawings), [`Projects`](crate::projects::Projects))
//! borrow it and call the crate-internal helpers defined here.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::multipart::Form;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::drawings::Drawings;
use crate::error::{Result, StruAiError};
use crate::projects::Projects;

const JSON_MIME: &str = "application/json";

/// Request body variants accepted by the transport.
pub(crate) enum RequestBody {
    /// No body.
    Empty,
    /// JSON body.
    Json(Value),
    /// `multipart/form-data` body (file uploads).
    Multipart(Form),
}

/// Raw response body plus its declared content type.
#[derive(Debug)]
pub(crate) struct BinaryBody {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// The main StruAI client.
///
/// Cloning is cheap: the underlying `reqwest::Client` is connection-pooled and
/// reference-counted. Job handles keep their own clone so they can be polled
/// after the façade that created them is gone.
///
/// # Examples
///
/// ```rust,no_run
/// use struai_client::client::StruAiClient;
///
/// # #[tokio::main]
/// # async fn main() -> struai_client::error::Result<()> {
/// let client = StruAiClient::from_env()?;
/// let projects = client.projects().list(Some(5)).await?;
/// println!("{} projects", projects.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StruAiClient {
    /// Normalised API root (e.g. `https://api.stru.ai/v1`).
    base_url: Url,
    /// Underlying `reqwest` HTTP client.
    http: reqwest::Client,
    /// Bearer token.
    api_key: String,
    /// Per-request timeout.
    timeout: Duration,
}

impl StruAiClient {
    // -- Constructors -------------------------------------------------------

    /// Create a client from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StruAiError::Config`] if the API key is empty or the base URL
    /// cannot be parsed.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(StruAiError::Config("API key must not be empty".into()));
        }

        let base_url = config.resolved_base_url()?;

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(StruAiError::Network)?;

        Ok(Self {
            base_url,
            http,
            api_key: config.api_key,
            timeout: config.timeout,
        })
    }

    /// Create a client for the production endpoint with the given API key.
    pub fn with_api_key(api_key: &str) -> Result<Self> {
        Self::new(ClientConfig::new(api_key))
    }

    /// Create a client from `STRUAI_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    // -- Resource façades ---------------------------------------------------

    /// Tier 1: single-page drawing detection.
    pub fn drawings(&self) -> Drawings<'_> {
        Drawings::new(self)
    }

    /// Tier 2: projects, sheet ingestion, search, and DocQuery.
    pub fn projects(&self) -> Projects<'_> {
        Projects::new(self)
    }

    // -- Accessors ----------------------------------------------------------

    /// The normalised API root.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Return the configured per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Set a custom per-request timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    // -- Internal HTTP helpers ----------------------------------------------

    /// Build a URL by appending percent-encoded `segments` to the API root.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StruAiError::Config(format!("Base URL cannot carry paths: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Attach authentication and content negotiation headers.
    fn authorize(&self, builder: reqwest::RequestBuilder, accept: &str) -> reqwest::RequestBuilder {
        builder
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(ACCEPT, accept)
            .timeout(self.timeout)
    }

    /// Map a `reqwest` failure to a transport-level error.
    fn transport_error(&self, err: reqwest::Error) -> StruAiError {
        if err.is_timeout() {
            StruAiError::Timeout(self.timeout)
        } else {
            StruAiError::Network(err)
        }
    }

    /// Send one request and return the response if its status is 2xx.
    #[instrument(skip_all, fields(method = %method, path = %url.path()))]
    async fn send(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, String)],
        body: RequestBody,
        accept: &str,
    ) -> Result<reqwest::Response> {
        let mut builder = self.authorize(self.http.request(method, url), accept);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        debug!(status = status.as_u16(), "Response received");

        if status.is_success() {
            Ok(response)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Execute a request and parse the JSON body.
    ///
    /// Returns `Ok(None)` for 204 responses and empty bodies.
    pub(crate) async fn request(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, String)],
        body: RequestBody,
    ) -> Result<Option<Value>> {
        let response = self.send(method, url, query, body, JSON_MIME).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StruAiError::Decode(format!("Malformed JSON response: {e}")))
    }

    /// Execute a request and return the raw response bytes.
    pub(crate) async fn request_bytes(
        &self,
        method: Method,
        url: Url,
        body: RequestBody,
    ) -> Result<BinaryBody> {
        let response = self.send(method, url, &[], body, "*/*").await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;
        Ok(BinaryBody {
            bytes: bytes.to_vec(),
            content_type,
        })
    }

    /// Perform a GET request and deserialize the JSON response body.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T> {
        let body = self.request(Method::GET, url, query, RequestBody::Empty).await?;
        decode_required(body)
    }

    /// Perform a POST request with a JSON body and deserialize the response.
    pub(crate) async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T> {
        let value = serde_json::to_value(body)
            .map_err(|e| StruAiError::Validation(format!("Unserializable request body: {e}")))?;
        let body = self
            .request(Method::POST, url, &[], RequestBody::Json(value))
            .await?;
        decode_required(body)
    }

    /// Perform a multipart POST request and deserialize the response.
    pub(crate) async fn post_form<T: DeserializeOwned>(&self, url: Url, form: Form) -> Result<T> {
        let body = self
            .request(Method::POST, url, &[], RequestBody::Multipart(form))
            .await?;
        decode_required(body)
    }

    /// Perform a DELETE request. Returns `None` when the server sends no body.
    pub(crate) async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        match self.request(Method::DELETE, url, &[], RequestBody::Empty).await? {
            Some(value) => decode(value).map(Some),
            None => Ok(None),
        }
    }

    // -- Response handling --------------------------------------------------

    /// Turn a non-2xx response into [`StruAiError::Api`].
    async fn extract_error(&self, response: reqwest::Response) -> StruAiError {
        let status = response.status().as_u16();
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let retry_after = if status == StatusCode::TOO_MANY_REQUESTS.as_u16() {
            response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        } else {
            None
        };

        let text = response.text().await.unwrap_or_default();
        let (message, code) = parse_error_body(status, &text);

        StruAiError::Api {
            status,
            code,
            message,
            request_id,
            retry_after,
        }
    }
}

/// Deserialize a JSON value into `T`.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| StruAiError::Decode(format!("Unexpected response shape: {e}")))
}

fn decode_required<T: DeserializeOwned>(body: Option<Value>) -> Result<T> {
    match body {
        Some(value) => decode(value),
        None => Err(StruAiError::Decode("Expected a JSON body, got none".into())),
    }
}

/// Extract `(message, code)` from an error body.
///
/// Understands `{"error": {"message", "code"}}`, `{"error": "..."}` and a flat
/// `{"message", "code"}`; anything else falls back to the raw text.
fn parse_error_body(status: u16, text: &str) -> (String, Option<String>) {
    let fallback = || {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            format!("HTTP {status}")
        } else {
            trimmed.to_string()
        }
    };

    let Ok(Value::Object(body)) = serde_json::from_str::<Value>(text) else {
        return (fallback(), None);
    };

    let container = match body.get("error") {
        Some(Value::Object(inner)) => inner,
        Some(Value::String(message)) => return (message.clone(), None),
        _ => &body,
    };

    let message = container
        .get("message")
        .or_else(|| container.get("detail"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(fallback);
    let code = container.get("code").and_then(|code| match code {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    (message, code)
}

/// Reject empty identifiers before they reach a URL.
pub(crate) fn require_id<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(StruAiError::Validation(format!("{field} is required")))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> StruAiClient {
        StruAiClient::new(ClientConfig::new("sk-test").with_base_url(base)).unwrap()
    }

    #[test]
    fn endpoint_appends_and_encodes_segments() {
        let c = client("https://api.stru.ai/v1");
        let url = c.endpoint(&["projects", "proj 1", "sheets"]).unwrap();
        assert_eq!(url.as_str(), "https://api.stru.ai/v1/projects/proj%201/sheets");
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let err = StruAiClient::new(ClientConfig::new("  ")).unwrap_err();
        assert!(matches!(err, StruAiError::Config(_)));
    }

    #[test]
    fn nested_error_body() {
        let (message, code) = parse_error_body(
            404,
            r#"{"error": {"message": "Project not found", "code": "project_not_found"}}"#,
        );
        assert_eq!(message, "Project not found");
        assert_eq!(code.as_deref(), Some("project_not_found"));
    }

    #[test]
    fn flat_and_string_error_bodies() {
        let (message, code) = parse_error_body(400, r#"{"message": "bad page", "code": 17}"#);
        assert_eq!(message, "bad page");
        assert_eq!(code.as_deref(), Some("17"));

        let (message, code) = parse_error_body(400, r#"{"error": "nope"}"#);
        assert_eq!(message, "nope");
        assert_eq!(code, None);
    }

    #[test]
    fn unparseable_error_body_falls_back_to_text_or_status() {
        assert_eq!(parse_error_body(502, "Bad Gateway").0, "Bad Gateway");
        assert_eq!(parse_error_body(502, "").0, "HTTP 502");
    }

    #[test]
    fn require_id_trims_and_rejects_blank() {
        assert_eq!(require_id("sheet_id", " S111 ").unwrap(), "S111");
        assert!(matches!(
            require_id("sheet_id", "   "),
            Err(StruAiError::Validation(_))
        ));
    }
}
