// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Error types for the StruAI client SDK.
//!
//! All fallible operations in this crate return [`Result<T>`], which is an alias
//! for `std::result::Result<T, StruAiError>`. Errors fall into four groups:
//! local problems caught before any request is sent (configuration and
//! validation), transport failures (network, timeout), API failures (non-2xx
//! responses and undecodable bodies), and job outcomes (a job that failed
//! server-side or did not finish in time).

use std::time::Duration;

use thiserror::Error;

/// Comprehensive error type for StruAI client operations.
#[derive(Error, Debug)]
pub enum StruAiError {
    /// Client configuration is missing or malformed (API key, base URL, env values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client-side validation failed before the request was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An underlying HTTP / network transport error from `reqwest`.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The request exceeded the configured per-request timeout.
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The server returned a non-2xx status.
    #[error("{}", format_api_error(*status, code.as_deref(), message))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code from the response body, if any.
        code: Option<String>,
        /// Human-readable error message.
        message: String,
        /// Value of the `x-request-id` response header, if any.
        request_id: Option<String>,
        /// Seconds to wait before retrying, from `Retry-After` on 429 responses.
        retry_after: Option<u64>,
    },

    /// A 2xx response body could not be decoded into the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// An ingestion job reached the terminal `failed` state.
    #[error("Job {job_id} failed: {message}")]
    JobFailed {
        /// Identifier of the failed job.
        job_id: String,
        /// Error string reported by the server.
        message: String,
    },

    /// Waiting for a job exceeded the caller's timeout.
    #[error("Job {job_id} did not complete within {}ms", .timeout.as_millis())]
    JobTimeout {
        /// Identifier of the job still in flight.
        job_id: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// Local file I/O failed (reading an upload, writing a crop).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classification of an [`StruAiError::Api`] by HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// 401: invalid or missing API key.
    Authentication,
    /// 403: insufficient permissions.
    PermissionDenied,
    /// 404: resource not found.
    NotFound,
    /// 422: invalid request parameters.
    Validation,
    /// 429: rate limit exceeded.
    RateLimit,
    /// 5xx.
    InternalServer,
    /// Any other non-2xx status.
    Other,
}

impl ApiErrorKind {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Authentication,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            422 => Self::Validation,
            429 => Self::RateLimit,
            s if s >= 500 => Self::InternalServer,
            _ => Self::Other,
        }
    }
}

impl StruAiError {
    /// The API error class, or `None` for non-API errors.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Self::Api { status, .. } => Some(ApiErrorKind::from_status(*status)),
            _ => None,
        }
    }

    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a 404 from the API.
    pub fn is_not_found(&self) -> bool {
        self.api_kind() == Some(ApiErrorKind::NotFound)
    }

    /// Whether the failure happened below the API layer (network or timeout).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

fn format_api_error(status: u16, code: Option<&str>, message: &str) -> String {
    match code {
        Some(code) => format!("{message} code={code} status={status}"),
        None => format!("{message} status={status}"),
    }
}

/// Crate-level result alias using [`StruAiError`].
pub type Result<T> = std::result::Result<T, StruAiError>;
