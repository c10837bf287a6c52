//! Error handling for the mock HTTP service.
//!
//! Every failure is fatal for the test that triggered it: there is no retry
//! and no partial registration. Errors are returned as a typed enum so that a
//! failing test reports the exact cause.
//!
//! # Error Types
//!
//! ## Bind
//! The embedded server could not acquire its port. Raised by
//! `MockHttpService::start_with_options`.
//!
//! ## MalformedMatcher
//! A request body matcher passed to `stub_with_body` is not valid JSON.
//!
//! ## InvalidMethod / InvalidUrl / InvalidStatus / InvalidHeader
//! A stub rule failed validation before being handed to the embedded server.
//!
//! ## Mapping
//! A mapping file on disk could not be parsed into a stub rule.
//!
//! Requests that match no rule are not errors of this crate: the embedded
//! server answers them with `501 Not Implemented`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MockHttpError {
    #[error("Failed to bind mock server on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed JSON body matcher '{body}': {source}")]
    MalformedMatcher {
        body: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),
    #[error("Invalid request URL '{0}': must start with '/'")]
    InvalidUrl(String),
    #[error("Invalid status code: {0}")]
    InvalidStatus(u16),
    #[error("Invalid response header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("Invalid mapping file {}: {reason}", path.display())]
    Mapping { path: PathBuf, reason: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MockHttpError {
    /// Build a [`MockHttpError::MalformedMatcher`] from the offending body text
    pub fn malformed_matcher(body: &str, source: serde_json::Error) -> Self {
        MockHttpError::MalformedMatcher {
            body: body.to_string(),
            source,
        }
    }

    /// Build a [`MockHttpError::InvalidHeader`]
    pub fn invalid_header(name: &str, reason: impl ToString) -> Self {
        MockHttpError::InvalidHeader {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}
