//! Request/response plumbing between the driver and the storage endpoint.
//!
//! The driver never talks to an HTTP client directly; it hands a [`Request`]
//! to a [`Transport`] and gets a [`Response`] back. Any response the server
//! sent is `Ok`, whatever its status; only failures where nothing came back
//! are errors.

pub mod client;
#[cfg(test)]
pub(crate) mod mock;

pub use client::HttpTransport;

use crate::errors::SwiftResult;
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use std::fmt;
use std::sync::LazyLock;

static COPY: LazyLock<Method> =
    LazyLock::new(|| Method::from_bytes(b"COPY").expect("COPY is a valid method token"));

/// The `COPY` verb Swift uses for server-side copies.
pub fn copy_method() -> Method {
    COPY.clone()
}

/// Query string pairs, in the order they are sent.
pub type Query = Vec<(String, String)>;

#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    /// Path relative to the storage endpoint, e.g. `photos/2025/img.jpg`.
    pub path: String,
    pub query: Query,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Option<Bytes>) -> Self {
        self.body = body;
        self
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        for (idx, (key, value)) in self.query.iter().enumerate() {
            let sep = if idx == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, key, value)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends requests to a storage endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Endpoint every request path is relative to, without trailing slash.
    fn base_url(&self) -> &str;

    async fn send(&self, request: Request) -> SwiftResult<Response>;
}
