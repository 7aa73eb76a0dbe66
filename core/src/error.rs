//! Error types for the OneSignal client.
//!
//! # Design
//! Failures split into two kinds. Construction errors (`InvalidPath`,
//! `Serialization`) are raised before anything reaches the network.
//! Transport errors cover everything after that point: the transport itself
//! failing, a non-2xx status, or a body that does not decode. Whenever a
//! response was received it travels inside the error so the caller can still
//! read the status, headers and body.

use thiserror::Error;

use crate::http::HttpResponse;

/// Which side of the network boundary an `ApiError` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request could not be built; nothing was sent.
    Construction,
    /// The request was handed to the transport and failed there or after.
    Transport,
}

/// Errors returned by `Client` and the resource accessors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A path segment cannot be encoded into a resource path.
    #[error("invalid resource path: {0}")]
    InvalidPath(String),

    /// The request payload could not be serialized to JSON.
    #[error("failed to serialize request body: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The transport failed before producing a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The provider answered with a non-2xx status.
    #[error("HTTP {}: {}", .response.status, display_messages(.messages))]
    Status {
        response: HttpResponse,
        messages: Vec<String>,
    },

    /// A 2xx body could not be decoded into the expected shape.
    #[error("failed to decode response (HTTP {}): {source}", .response.status)]
    Deserialization {
        response: HttpResponse,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::InvalidPath(_) | ApiError::Serialization(_) => ErrorKind::Construction,
            ApiError::Transport(_) | ApiError::Status { .. } | ApiError::Deserialization { .. } => {
                ErrorKind::Transport
            }
        }
    }

    /// The raw response, when the failure happened after one was received.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            ApiError::Status { response, .. } | ApiError::Deserialization { response, .. } => {
                Some(response)
            }
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.response().map(|response| response.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

fn display_messages(messages: &[String]) -> String {
    if messages.is_empty() {
        "no error message".to_string()
    } else {
        messages.join("; ")
    }
}

/// Failure reported by a `Transport` before any response was available
/// (connection refused, DNS, TLS, timeout, body read failure).
#[derive(Debug, Error)]
#[error("transport failed: {message}")]
pub struct TransportError {
    message: String,
    timed_out: bool,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: true,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_timeout(&self) -> bool {
        self.timed_out
    }
}

/// Configuration errors raised while building a `Client`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base URL does not parse or cannot carry resource paths.
    #[error("invalid base URL {0}: {1}")]
    InvalidUrl(String, String),

    /// An environment variable held an unusable value.
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

pub type ApiResult<T> = Result<T, ApiError>;

pub type ConfigResult<T> = Result<T, ConfigError>;
