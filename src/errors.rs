//! Error type shared by every layer of the client.
//!
//! Transport failures (nothing came back) and unexpected statuses (something
//! came back, just not what the operation accepts) are distinct variants of
//! the same error so callers can either propagate blindly or match on cause.

use http::{Method, StatusCode};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwiftError {
    #[error("{method} {path} failed: {source}")]
    Transport {
        method: Method,
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {path} failed: {message}")]
    TransportMessage {
        method: Method,
        path: String,
        message: String,
    },
    #[error("{operation}: expected status to be one of {expected:?}, but got {status}")]
    UnexpectedStatus {
        operation: &'static str,
        status: u16,
        expected: Vec<u16>,
    },
    #[error("{context}. Failed requests:\n{}", failures.join("\n"))]
    Batch {
        context: String,
        failures: Vec<String>,
    },
    #[error("object container `{0}` is private")]
    PrivateContainer(String),
    #[error("cannot update new object `{0}` without a body")]
    MissingBody(String),
    #[error("destination `{0}` is same as source")]
    SelfCopy(String),
    #[error("`{0}` has a `.` or `..` segment and cannot be addressed by URL")]
    UnaddressablePath(String),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SwiftError {
    /// Build an `UnexpectedStatus` error for `operation`.
    pub fn unexpected_status(
        operation: &'static str,
        status: StatusCode,
        expected: impl IntoIterator<Item = StatusCode>,
    ) -> Self {
        Self::UnexpectedStatus {
            operation,
            status: status.as_u16(),
            expected: expected.into_iter().map(|s| s.as_u16()).collect(),
        }
    }

    /// Status code carried by the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type SwiftResult<T> = Result<T, SwiftError>;
