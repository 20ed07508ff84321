//! Represents an object (blob) stored in a container.

use crate::errors::{SwiftError, SwiftResult};
use crate::models::container::Container;
use crate::models::metadata::Metadata;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{HeaderMap, HeaderName, HeaderValue, header};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// Content type given to pseudo-directory entries.
pub const DIRECTORY_CONTENT_TYPE: &str = "application/directory";

/// Plain headers never sent with an update: the payload description, plus
/// what the server reports about a response rather than the object.
const NON_UPDATABLE_HEADERS: [&str; 10] = [
    "etag",
    "content-length",
    "content-type",
    "accept-ranges",
    "connection",
    "date",
    "transfer-encoding",
    "x-openstack-request-id",
    "x-timestamp",
    "x-trans-id",
];

/// A single object within a container.
///
/// The object keeps a shared handle to the container it was created for; it
/// never manages that container's lifetime. The name may contain `/`, and a
/// name ending in `/` is a pseudo-directory marker rather than real content.
#[derive(Clone, Debug)]
pub struct Object {
    container: Arc<Container>,
    name: String,
    body: Option<Bytes>,
    headers: HeaderMap,
    metadata: Metadata,
    local_file: Option<PathBuf>,
}

impl Object {
    pub fn new(container: Arc<Container>, name: impl Into<String>) -> Self {
        Self {
            container,
            name: name.into(),
            body: None,
            headers: HeaderMap::new(),
            metadata: Metadata::object(),
            local_file: None,
        }
    }

    /// Build an object from response headers and an optional body.
    pub fn from_response(
        container: Arc<Container>,
        name: impl Into<String>,
        headers: &HeaderMap,
        body: Option<Bytes>,
    ) -> Self {
        let mut object = Self::new(container, name);
        object.set_headers(headers);
        object.body = body;
        object
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last path segment of the name, with `suffix` stripped when it ends
    /// the segment (and is not the whole segment).
    pub fn basename(&self, suffix: Option<&str>) -> &str {
        let trimmed = self.name.trim_end_matches('/');
        let base = trimmed.rsplit('/').next().unwrap_or(trimmed);
        match suffix {
            Some(suffix) if base.len() > suffix.len() => base.strip_suffix(suffix).unwrap_or(base),
            _ => base,
        }
    }

    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name).extension().and_then(|ext| ext.to_str())
    }

    /// `{container}/{name}`, relative to the storage endpoint.
    pub fn path(&self) -> String {
        format!("{}/{}", self.container.name(), self.name)
    }

    pub fn is_pseudo_dir(&self) -> bool {
        self.name.ends_with('/')
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = Some(body.into());
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Route headers into metadata (prefixed names) or the plain header bag.
    pub fn set_headers(&mut self, headers: &HeaderMap) {
        for name in headers.keys() {
            if self.metadata.is_prefixed_key(name.as_str()) {
                let values = headers.get_all(name).iter().filter_map(|v| v.to_str().ok());
                self.metadata.set_first(name.as_str(), values);
            } else {
                self.headers.remove(name);
                for value in headers.get_all(name) {
                    self.headers.append(name.clone(), value.clone());
                }
            }
        }
    }

    /// First value of a plain (non-metadata) header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn header_bag(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn set_content_type(&mut self, content_type: &str) -> SwiftResult<()> {
        self.set_plain_header(header::CONTENT_TYPE, content_type)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    pub fn set_content_length(&mut self, bytes: u64) {
        self.headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(bytes));
    }

    /// Content length, when present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.header(header::CONTENT_LENGTH.as_str())
            .and_then(|v| v.trim().parse().ok())
    }

    pub fn set_etag(&mut self, etag: &str) -> SwiftResult<()> {
        self.set_plain_header(header::ETAG, etag)
    }

    pub fn etag(&self) -> Option<&str> {
        self.header(header::ETAG.as_str())
    }

    pub fn set_last_modified(&mut self, last_modified: DateTime<Utc>) -> SwiftResult<()> {
        self.set_plain_header(header::LAST_MODIFIED, &last_modified.to_rfc2822())
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.header(header::LAST_MODIFIED.as_str())
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
            .map(|date| date.with_timezone(&Utc))
    }

    /// Stage a local file as this object's content.
    ///
    /// Reads the file into the body and records its content type (guessed
    /// from the extension), length and MD5 ETag.
    pub async fn set_local_file(&mut self, path: impl AsRef<Path>) -> SwiftResult<()> {
        let path = path.as_ref();
        let data = fs::read(path).await?;

        let content_type = mime_guess::from_path(path).first_or_octet_stream();
        let etag = format!("{:x}", md5::compute(&data));

        self.set_content_type(content_type.essence_str())?;
        self.set_content_length(data.len() as u64);
        self.set_etag(&etag)?;
        self.body = Some(Bytes::from(data));
        self.local_file = Some(path.to_path_buf());
        Ok(())
    }

    pub fn local_file(&self) -> Option<&Path> {
        self.local_file.as_deref()
    }

    /// Plain headers merged with the metadata headers.
    pub fn headers(&self) -> SwiftResult<HeaderMap> {
        let mut merged = self.headers.clone();
        merged.extend(self.metadata.header_map()?);
        Ok(merged)
    }

    /// Headers for a metadata-only update: metadata plus every plain header
    /// the server accepts back.
    pub fn update_headers(&self) -> SwiftResult<HeaderMap> {
        let mut headers = self.metadata.header_map()?;
        for (name, value) in self.headers.iter() {
            if !NON_UPDATABLE_HEADERS.contains(&name.as_str()) {
                headers.append(name.clone(), value.clone());
            }
        }
        Ok(headers)
    }

    /// Headers for a content upload: the update headers plus the content
    /// type and ETag of the staged body. The transport sets the length.
    pub fn upload_headers(&self) -> SwiftResult<HeaderMap> {
        let mut headers = self.update_headers()?;
        for name in [header::CONTENT_TYPE, header::ETAG] {
            if let Some(value) = self.headers.get(&name) {
                headers.insert(name, value.clone());
            }
        }
        Ok(headers)
    }

    fn set_plain_header(&mut self, name: HeaderName, value: &str) -> SwiftResult<()> {
        let value = HeaderValue::from_str(value)
            .map_err(|_| SwiftError::InvalidHeader(format!("{}: {}", name, value)))?;
        self.headers.insert(name, value);
        Ok(())
    }
}

/// Objects are equal when their content hashes are.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.etag() == other.etag()
    }
}
