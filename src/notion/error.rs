//! Notion API error types.
//!
//! Errors are categorized as transient or permanent so that logs and callers
//! can tell a Notion outage apart from a misconfiguration:
//!
//! - **Transient**: HTTP 429, HTTP 5xx, and network failures with no response
//! - **Permanent**: every other non-2xx status, and undecodable responses
//!
//! The service does not retry either kind itself. Notion redelivers webhooks on
//! its own schedule, and the update pipeline is idempotent, so a redelivery is
//! the retry.

use std::fmt;
use thiserror::Error;

/// Upper bound on the response body kept for diagnostics.
const MAX_BODY_CHARS: usize = 512;

/// The kind of Notion API error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotionErrorKind {
    /// Rate limits, server errors, timeouts, connection failures.
    Transient,
    /// Bad requests, missing pages, missing permissions, malformed responses.
    Permanent,
}

impl NotionErrorKind {
    /// Categorizes an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => NotionErrorKind::Transient,
            500..=599 => NotionErrorKind::Transient,
            _ => NotionErrorKind::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, NotionErrorKind::Transient)
    }
}

/// A failed Notion API call.
#[derive(Debug, Error)]
pub struct NotionApiError {
    pub kind: NotionErrorKind,

    /// The HTTP status code, if a response was received.
    pub status_code: Option<u16>,

    /// A human-readable description of the error.
    pub message: String,

    /// The (truncated) response body, if any. Never logged.
    pub body: Option<String>,

    #[source]
    pub source: Option<reqwest::Error>,
}

impl fmt::Display for NotionApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "Notion API error (HTTP {}): {}", code, self.message),
            None => write!(f, "Notion API error: {}", self.message),
        }
    }
}

impl NotionApiError {
    /// Creates an error for a non-2xx response.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = truncate(body.into());
        Self {
            kind: NotionErrorKind::from_status(status),
            status_code: Some(status),
            message: format!("Notion API request failed: {status}"),
            body: if body.is_empty() { None } else { Some(body) },
            source: None,
        }
    }

    /// Categorizes a transport-level reqwest error.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        let status_code = err.status().map(|s| s.as_u16());
        let kind = match status_code {
            Some(code) => NotionErrorKind::from_status(code),
            None if err.is_timeout() || err.is_connect() || err.is_request() => {
                NotionErrorKind::Transient
            }
            None if err.is_decode() => NotionErrorKind::Permanent,
            None => NotionErrorKind::Transient,
        };
        Self {
            kind,
            status_code,
            message: err.to_string(),
            body: None,
            source: Some(err),
        }
    }

    /// Creates a permanent error without a status or source.
    ///
    /// Used for undecodable responses and unusable client settings.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: NotionErrorKind::Permanent,
            status_code: None,
            message: message.into(),
            body: None,
            source: None,
        }
    }

    /// Creates a transient error without a status or source.
    ///
    /// Used by in-memory clients to simulate outages.
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: NotionErrorKind::Transient,
            status_code: None,
            message: message.into(),
            body: None,
            source: None,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

fn truncate(mut body: String) -> String {
    if let Some((idx, _)) = body.char_indices().nth(MAX_BODY_CHARS) {
        body.truncate(idx);
    }
    body
}
