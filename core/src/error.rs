//! Error types for the mBaaS client.
//!
//! # Design
//! Executor failures are opaque: whatever the transport reports is wrapped
//! once in `Transport` and then handed to the caller untouched. Backend
//! rejections (any non-2xx status) land in `Service` with the status and the
//! decoded error envelope so callers can branch on the backend's error code.
//!
//! `ApiError` is `Clone` because a test executor replays the same canned
//! failure for every call; the opaque payload is therefore reference-counted.

use std::error::Error as StdError;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error as ThisError;

use crate::http::HttpResponse;

/// Result alias used by every fallible operation in this crate.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by request construction and by `Call` execution.
#[derive(Debug, Clone, ThisError)]
pub enum ApiError {
    /// The endpoint, path or query could not be turned into a URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The operation was missing something it needs (e.g. an object id).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A required configuration value was not provided.
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    /// The request body could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The executor failed before a response was received.
    #[error("transport failure: {0}")]
    Transport(Arc<dyn StdError + Send + Sync>),

    /// The executor dropped the call without completing it.
    #[error("call was dropped before completion")]
    Canceled,

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status} {code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },
}

impl ApiError {
    /// Wrap an arbitrary transport error.
    pub fn transport<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Transport(Arc::new(error))
    }

    /// Build a `Service` error from a non-2xx response.
    ///
    /// The body is expected to be the backend's `{"code", "error"}` envelope;
    /// anything else is kept verbatim as the message.
    pub fn from_response(response: &HttpResponse) -> Self {
        match serde_json::from_slice::<ErrorEnvelope>(&response.body) {
            Ok(envelope) => Self::Service {
                status: response.status,
                code: envelope.code,
                message: envelope.error,
            },
            Err(_) => Self::Service {
                status: response.status,
                code: String::new(),
                message: String::from_utf8_lossy(&response.body).into_owned(),
            },
        }
    }

    /// The backend error code, if this is a `Service` error.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Service { status: 404, .. })
    }
}

/// Error body returned by the backend, e.g.
/// `{"code":"E404001","error":"No data available."}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    code: String,
    #[serde(default)]
    error: String,
}
