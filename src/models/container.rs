//! Represents a Swift container: a named namespace for objects.

use crate::errors::{SwiftError, SwiftResult};
use crate::models::metadata::Metadata;
use http::{HeaderMap, HeaderName, HeaderValue};

/// Metadata key whose value carries the container read ACL.
pub const READ_ACL_KEY: &str = "Read";

/// ACL marker granting anonymous read access.
pub const PUBLIC_READ_ACL: &str = ".r:*";

pub const OBJECT_COUNT_HEADER: &str = "x-container-object-count";
pub const BYTES_USED_HEADER: &str = "x-container-bytes-used";

/// Headers the server reports about a container but never accepts back.
const RESPONSE_ONLY_HEADERS: [&str; 12] = [
    "accept-ranges",
    "connection",
    "content-length",
    "content-type",
    "date",
    "etag",
    "last-modified",
    "transfer-encoding",
    "x-container-bytes-used",
    "x-container-object-count",
    "x-timestamp",
    "x-trans-id",
];

/// A storage container.
///
/// Containers are private until made public. Object count and bytes used are
/// only known once a container has been read back from the server; a freshly
/// constructed container reports `None` for both.
#[derive(Clone, Debug)]
pub struct Container {
    name: String,
    private: bool,
    object_count: Option<u64>,
    bytes_used: Option<u64>,
    headers: HeaderMap,
    metadata: Metadata,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            private: true,
            object_count: None,
            bytes_used: None,
            headers: HeaderMap::new(),
            metadata: Metadata::container(),
        }
    }

    /// Rebuild a container from HEAD response headers.
    ///
    /// Visibility comes from the `Read` metadata entry, counters from
    /// `X-Container-Object-Count` and `X-Container-Bytes-Used` when present.
    pub fn from_headers(name: impl Into<String>, headers: &HeaderMap) -> Self {
        let mut container = Self::new(name);
        container.set_headers(headers);

        let public = container
            .metadata
            .get(READ_ACL_KEY)
            .is_some_and(|acl| acl.contains(PUBLIC_READ_ACL));
        container.private = !public;

        container.object_count = container.numeric_header(OBJECT_COUNT_HEADER);
        container.bytes_used = container.numeric_header(BYTES_USED_HEADER);
        container
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_private(&mut self) {
        self.private = true;
    }

    pub fn set_public(&mut self) {
        self.private = false;
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn is_public(&self) -> bool {
        !self.private
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Route headers into metadata (prefixed names) or the plain header bag.
    pub fn set_headers(&mut self, headers: &HeaderMap) {
        for name in headers.keys() {
            let values = headers.get_all(name).iter().filter_map(|v| v.to_str().ok());
            if self.metadata.is_prefixed_key(name.as_str()) {
                self.metadata.set_first(name.as_str(), values);
            } else {
                self.headers.remove(name);
                for value in headers.get_all(name) {
                    self.headers.append(name.clone(), value.clone());
                }
            }
        }
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> SwiftResult<()> {
        let mut single = HeaderMap::new();
        single.insert(
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| SwiftError::InvalidHeader(name.to_string()))?,
            HeaderValue::from_str(value)
                .map_err(|_| SwiftError::InvalidHeader(format!("{}: {}", name, value)))?,
        );
        self.set_headers(&single);
        Ok(())
    }

    /// First value of a plain (non-metadata) header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn header_bag(&self) -> &HeaderMap {
        &self.headers
    }

    /// Plain headers merged with the metadata headers.
    pub fn headers(&self) -> SwiftResult<HeaderMap> {
        let mut merged = self.headers.clone();
        merged.extend(self.metadata.header_map()?);
        Ok(merged)
    }

    /// Headers to send when creating or updating this container remotely.
    ///
    /// Server-reported headers are left out, and a public container always
    /// carries the public read ACL.
    pub fn request_headers(&self) -> SwiftResult<HeaderMap> {
        let mut metadata = self.metadata.clone();
        if self.is_public() {
            metadata.set(READ_ACL_KEY, PUBLIC_READ_ACL);
        }

        let mut headers: HeaderMap = self
            .headers
            .iter()
            .filter(|(name, _)| !RESPONSE_ONLY_HEADERS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        headers.extend(metadata.header_map()?);
        Ok(headers)
    }

    pub fn count(&self) -> Option<u64> {
        self.object_count
    }

    /// True only when the server reported zero objects.
    pub fn is_empty(&self) -> bool {
        self.object_count == Some(0)
    }

    pub fn set_object_count(&mut self, count: u64) {
        self.object_count = Some(count);
    }

    pub fn object_count(&self) -> Option<u64> {
        self.object_count
    }

    pub fn set_bytes_used(&mut self, bytes: u64) {
        self.bytes_used = Some(bytes);
    }

    pub fn bytes_used(&self) -> Option<u64> {
        self.bytes_used
    }

    fn numeric_header(&self, name: &str) -> Option<u64> {
        self.header(name).and_then(|v| v.trim().parse().ok())
    }
}
