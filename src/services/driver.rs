//! SwiftDriver: the only component that knows HTTP.
//!
//! Builds requests for container/object operations, interprets response
//! statuses through the tables in [`status`](crate::services::status), and
//! fans out per-object HEAD/DELETE requests when listing or removing in bulk.

use crate::config::SwiftConfig;
use crate::errors::{SwiftError, SwiftResult};
use crate::models::object::DIRECTORY_CONTENT_TYPE;
use crate::models::{Container, Object};
use crate::services::batch;
use crate::services::status::{
    self, Listing, Lookup, PostAction, Removal, StatusTable,
};
use crate::transport::{HttpTransport, Query, Request, Response, Transport, copy_method};
use bytes::Bytes;
use chrono::Utc;
use http::{HeaderMap, HeaderValue, Method};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

pub const DESTINATION_HEADER: &str = "destination";

/// Parameters of a container listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ListOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Only names sorting after this one.
    #[serde(rename = "marker", skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// Only names sorting before this one.
    #[serde(rename = "end_marker", skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start(mut self, marker: impl Into<String>) -> Self {
        self.start = Some(marker.into());
        self
    }

    pub fn end(mut self, marker: impl Into<String>) -> Self {
        self.end = Some(marker.into());
        self
    }

    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        if let Some(prefix) = &self.prefix {
            query.push(("prefix".into(), prefix.clone()));
        }
        if let Some(delimiter) = &self.delimiter {
            query.push(("delimiter".into(), delimiter.clone()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit".into(), limit.to_string()));
        }
        if let Some(start) = &self.start {
            query.push(("marker".into(), start.clone()));
        }
        if let Some(end) = &self.end {
            query.push(("end_marker".into(), end.clone()));
        }
        query
    }

    fn describe(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// Translates container/object operations into requests against one
/// storage endpoint.
#[derive(Clone)]
pub struct SwiftDriver {
    transport: Arc<dyn Transport>,
    concurrency: usize,
}

impl SwiftDriver {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            concurrency: crate::config::DEFAULT_CONCURRENCY,
        }
    }

    /// Driver over HTTP(S) for the configured endpoint.
    pub fn from_config(config: &SwiftConfig) -> SwiftResult<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(Arc::new(transport)).with_concurrency(config.concurrency))
    }

    /// Bound on in-flight requests during listing and batch deletion.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub async fn request(&self, request: Request) -> SwiftResult<Response> {
        self.transport.send(request).await
    }

    pub async fn head(&self, path: &str, query: Query, headers: HeaderMap) -> SwiftResult<Response> {
        self.send(Method::HEAD, path, query, headers, None).await
    }

    pub async fn get(&self, path: &str, query: Query, headers: HeaderMap) -> SwiftResult<Response> {
        self.send(Method::GET, path, query, headers, None).await
    }

    pub async fn put(
        &self,
        path: &str,
        query: Query,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> SwiftResult<Response> {
        self.send(Method::PUT, path, query, headers, body).await
    }

    pub async fn post(
        &self,
        path: &str,
        query: Query,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> SwiftResult<Response> {
        self.send(Method::POST, path, query, headers, body).await
    }

    pub async fn copy(&self, path: &str, query: Query, headers: HeaderMap) -> SwiftResult<Response> {
        self.send(copy_method(), path, query, headers, None).await
    }

    pub async fn delete(
        &self,
        path: &str,
        query: Query,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> SwiftResult<Response> {
        self.send(Method::DELETE, path, query, headers, body).await
    }

    /// Public URL of an object. Whether it is reachable depends on the
    /// container ACL; see `ObjectStore::object_url`.
    pub fn object_url(&self, object: &Object) -> String {
        format!("{}/{}", self.base_url(), object.path())
    }

    pub async fn container_exists(&self, container: &Container) -> SwiftResult<bool> {
        let response = self.head(container.name(), Query::new(), HeaderMap::new()).await?;
        interpret(&response, &status::CONTAINER_EXISTS)
    }

    /// Create (or re-create) a container; public containers get the public
    /// read ACL.
    pub async fn create_container(&self, container: &Container) -> SwiftResult<bool> {
        info!("Creating container \"{}\"", container.name());
        let response = self
            .put(container.name(), Query::new(), container.request_headers()?, None)
            .await?;
        interpret(&response, &status::CREATE_CONTAINER)
    }

    pub async fn get_container(&self, name: &str) -> SwiftResult<Option<Container>> {
        let response = self.head(name, Query::new(), HeaderMap::new()).await?;
        Ok(match interpret(&response, &status::GET_CONTAINER)? {
            Lookup::Found => Some(Container::from_headers(name, &response.headers)),
            Lookup::Missing => None,
        })
    }

    pub async fn update_container(&self, container: &Container) -> SwiftResult<bool> {
        info!("Updating container \"{}\"", container.name());
        let response = self
            .post(container.name(), Query::new(), container.request_headers()?, None)
            .await?;
        interpret(&response, &status::UPDATE_CONTAINER)
    }

    /// Empty the container, then delete it. A missing container counts as
    /// deleted.
    pub async fn delete_container(&self, container: &Container) -> SwiftResult<bool> {
        info!("Deleting container \"{}\"", container.name());

        // No delimiter: names ending in `/` are stored marker objects too.
        let handle = Arc::new(container.clone());
        let objects = self.get_objects(&handle, &ListOptions::default()).await?;
        self.delete_batch(objects.iter(), "Could not empty container").await?;

        let response = self
            .delete(container.name(), Query::new(), HeaderMap::new(), None)
            .await?;
        interpret(&response, &status::DELETE_CONTAINER)
    }

    pub async fn object_exists(&self, object: &Object) -> SwiftResult<bool> {
        let response = self.head(&object.path(), Query::new(), HeaderMap::new()).await?;
        interpret(&response, &status::OBJECT_EXISTS)
    }

    /// Local object handle; no request is made. Headers of `response`, when
    /// given, populate the object.
    pub fn create_object(
        &self,
        container: &Arc<Container>,
        name: &str,
        response: Option<&Response>,
    ) -> Object {
        match response {
            Some(response) => Object::from_response(container.clone(), name, &response.headers, None),
            None => Object::new(container.clone(), name),
        }
    }

    pub async fn get_object(
        &self,
        container: &Arc<Container>,
        name: &str,
    ) -> SwiftResult<Option<Object>> {
        let path = format!("{}/{}", container.name(), name);
        let response = self.head(&path, Query::new(), HeaderMap::new()).await?;
        Ok(match interpret(&response, &status::GET_OBJECT)? {
            Lookup::Found => Some(self.create_object(container, name, Some(&response))),
            Lookup::Missing => None,
        })
    }

    /// Download an object's content. `headers` are forwarded as-is.
    pub async fn get_object_content(&self, object: &Object, headers: HeaderMap) -> SwiftResult<Bytes> {
        let response = self.get(&object.path(), Query::new(), headers).await?;
        interpret(&response, &status::GET_OBJECT_CONTENT)?;
        Ok(response.body)
    }

    /// List a container and fetch every listed object's headers.
    ///
    /// Names ending in the delimiter are pseudo-directories and are built
    /// locally. Every other name costs one HEAD; those run concurrently and
    /// the result keeps the server's listing order. Any failed HEAD fails the
    /// whole listing.
    pub async fn get_objects(
        &self,
        container: &Arc<Container>,
        options: &ListOptions,
    ) -> SwiftResult<Vec<Object>> {
        info!(
            "Listing objects in container \"{}\" with {}",
            container.name(),
            options.describe()
        );

        let response = self
            .get(container.name(), options.to_query(), HeaderMap::new())
            .await?;
        let content = match interpret(&response, &status::LIST_OBJECTS)? {
            Listing::Entries => response.text(),
            Listing::Empty => return Ok(Vec::new()),
        };

        let mut entries = Vec::new();
        let mut requests = Vec::new();
        for name in content
            .trim()
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !line.is_empty())
        {
            let pseudo_dir = options
                .delimiter
                .as_deref()
                .is_some_and(|delimiter| !delimiter.is_empty() && name.ends_with(delimiter));
            let path = format!("{}/{}", container.name(), name);
            debug!("=> \"{}\"", path);

            if !pseudo_dir {
                requests.push((name.to_string(), Request::new(Method::HEAD, path)));
            }
            entries.push((name, pseudo_dir));
        }

        info!("Getting objects metadata");
        let results = batch::dispatch(self.transport.as_ref(), requests, self.concurrency).await;
        let report = batch::resolve(results, &status::LIST_OBJECT_HEAD);
        if !report.is_success() {
            return Err(SwiftError::Batch {
                context: format!(
                    "Could not get all objects for container \"{}\" with params {}",
                    container.name(),
                    options.describe()
                ),
                failures: report.failures,
            });
        }

        let mut fetched = report.resolved.into_iter();
        let mut objects = Vec::with_capacity(entries.len());
        for (name, pseudo_dir) in entries {
            if pseudo_dir {
                let mut object = Object::new(container.clone(), name);
                object.set_content_type(DIRECTORY_CONTENT_TYPE)?;
                objects.push(object);
            } else if let Some((name, _, response)) = fetched.next() {
                objects.push(self.create_object(container, &name, Some(&response)));
            }
        }

        Ok(objects)
    }

    /// Persist an object.
    ///
    /// The owning container is updated first. Objects with staged content
    /// are timestamped and uploaded; objects without only get their metadata
    /// updated.
    pub async fn update_object(&self, object: &mut Object) -> SwiftResult<bool> {
        self.update_container(object.container()).await?;

        if object.body().is_none() {
            return self.update_object_metadata(object).await;
        }

        object.set_last_modified(Utc::now())?;
        info!("Updating object \"{}\"", object.path());

        let response = self
            .put(
                &object.path(),
                Query::new(),
                object.upload_headers()?,
                object.body().cloned(),
            )
            .await?;
        interpret(&response, &status::UPDATE_OBJECT)
    }

    pub async fn update_object_metadata(&self, object: &Object) -> SwiftResult<bool> {
        info!("Updating metadata for \"{}\"", object.path());
        let response = self
            .post(&object.path(), Query::new(), object.update_headers()?, None)
            .await?;
        interpret(&response, &status::UPDATE_OBJECT_METADATA)
    }

    pub async fn delete_object(&self, object: &Object) -> SwiftResult<bool> {
        info!("Deleting \"{}\"", object.path());
        let response = self
            .delete(&object.path(), Query::new(), HeaderMap::new(), None)
            .await?;
        interpret(&response, &status::DELETE_OBJECT)
    }

    /// Delete objects concurrently and return how many were actually
    /// removed. Pseudo-directories are skipped and objects that were already
    /// gone are not counted; any other failure fails the batch.
    pub async fn delete_objects(&self, objects: &[Object]) -> SwiftResult<usize> {
        let stored = objects.iter().filter(|object| !object.is_pseudo_dir());
        self.delete_batch(stored, "Could not delete all objects").await
    }

    /// Server-side copy to `to_container/name`, returning the destination as
    /// read back after the copy.
    pub async fn copy_object(
        &self,
        object: &Object,
        to_container: &Arc<Container>,
        name: &str,
    ) -> SwiftResult<Option<Object>> {
        info!("Copying \"{}\" => \"{}/{}\"", object.path(), to_container.name(), name);

        // Swift unquotes the destination, so it is quoted like a request path.
        let destination = format!("/{}/{}", urlencoding::encode(to_container.name()), quote_path(name));
        let mut headers = HeaderMap::new();
        headers.insert(
            DESTINATION_HEADER,
            HeaderValue::from_str(&destination)
                .map_err(|_| SwiftError::InvalidHeader(format!("Destination: {}", destination)))?,
        );

        let response = self.copy(&object.path(), Query::new(), headers).await?;
        match interpret(&response, &status::COPY_OBJECT)? {
            PostAction::FetchDestination => self.get_object(to_container, name).await,
        }
    }

    async fn delete_batch<'a>(
        &self,
        objects: impl Iterator<Item = &'a Object>,
        context: &str,
    ) -> SwiftResult<usize> {
        let requests: Vec<(String, Request)> = objects
            .map(|object| {
                let path = object.path();
                debug!("Deleting \"{}\"", path);
                (path.clone(), Request::new(Method::DELETE, path))
            })
            .collect();

        if requests.is_empty() {
            return Ok(0);
        }

        let results = batch::dispatch(self.transport.as_ref(), requests, self.concurrency).await;
        let report = batch::resolve(results, &status::DELETE_OBJECTS_ENTRY);
        if !report.is_success() {
            return Err(SwiftError::Batch {
                context: context.to_string(),
                failures: report.failures,
            });
        }

        let removed = report
            .resolved
            .iter()
            .filter(|(_, outcome, _)| *outcome == Removal::Removed)
            .count();
        info!("Deleted {} objects", removed);
        Ok(removed)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Query,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> SwiftResult<Response> {
        let request = Request::new(method, path)
            .with_query(query)
            .with_headers(headers)
            .with_body(body);
        self.transport.send(request).await
    }
}

/// Percent-encode every `/`-separated segment of an object name.
fn quote_path(name: &str) -> String {
    name.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn interpret<T: Copy + 'static>(response: &Response, table: &StatusTable<T>) -> SwiftResult<T> {
    table.resolve(response.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{BASE_URL, MockTransport, reply_with};
    use std::io::Write;
    use std::time::Duration;

    fn driver() -> (Arc<MockTransport>, SwiftDriver) {
        let transport = Arc::new(MockTransport::new());
        let driver = SwiftDriver::new(transport.clone());
        (transport, driver)
    }

    fn container(name: &str) -> Arc<Container> {
        Arc::new(Container::new(name))
    }

    #[tokio::test]
    async fn http_primitives_pass_everything_through() {
        let (transport, driver) = driver();
        let copy = copy_method();
        for method in [Method::HEAD, Method::GET, Method::PUT, Method::POST, Method::DELETE, copy.clone()] {
            transport.on_status(method, "foo", 200);
        }

        let query = vec![("bar".to_string(), "baz".to_string())];
        let mut headers = HeaderMap::new();
        headers.insert("baz", HeaderValue::from_static("qux"));
        let body = Some(Bytes::from_static(b"foobar"));

        driver.head("foo", query.clone(), headers.clone()).await.unwrap();
        driver.get("foo", query.clone(), headers.clone()).await.unwrap();
        driver.put("foo", query.clone(), headers.clone(), body.clone()).await.unwrap();
        driver.post("foo", query.clone(), headers.clone(), body.clone()).await.unwrap();
        driver.delete("foo", query.clone(), headers.clone(), body.clone()).await.unwrap();
        driver.copy("foo", query.clone(), headers.clone()).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 6);
        for request in &requests {
            assert_eq!(request.query, query);
            assert_eq!(request.headers.get("baz").unwrap(), "qux");
        }
        assert_eq!(requests[2].body.as_deref(), Some(&b"foobar"[..]));
        assert!(requests[0].body.is_none());
        assert_eq!(requests[5].method, copy);
    }

    #[tokio::test]
    async fn unexpected_statuses_are_returned_not_raised() {
        let (transport, driver) = driver();
        transport.on_status(Method::GET, "foo", 500);
        let response = driver.get("foo", Query::new(), HeaderMap::new()).await.unwrap();
        assert_eq!(response.status.as_u16(), 500);
    }

    #[tokio::test]
    async fn transport_failures_are_errors() {
        let (transport, driver) = driver();
        transport.fail(Method::GET, "foo", "connection refused");
        let err = driver.get("foo", Query::new(), HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, SwiftError::TransportMessage { .. }));
    }

    #[test]
    fn object_url_joins_base_and_path() {
        let (_, driver) = driver();
        let object = Object::new(container("foo"), "bar");
        assert_eq!(driver.object_url(&object), format!("{}/foo/bar", BASE_URL));
    }

    #[tokio::test]
    async fn container_existence() {
        let (transport, driver) = driver();
        transport
            .on_status(Method::HEAD, "foo", 204)
            .on_status(Method::HEAD, "bar", 404)
            .on_status(Method::HEAD, "baz", 500);

        assert!(driver.container_exists(&Container::new("foo")).await.unwrap());
        assert!(!driver.container_exists(&Container::new("bar")).await.unwrap());
        assert!(driver.container_exists(&Container::new("baz")).await.is_err());
    }

    #[tokio::test]
    async fn create_container_accepts_created_and_accepted() {
        let (transport, driver) = driver();
        transport
            .on_status(Method::PUT, "foo", 201)
            .on_status(Method::PUT, "foo", 202)
            .on_status(Method::PUT, "foo", 500);

        let mut container = Container::new("foo");
        container.set_header("foo", "bar").unwrap();

        assert!(driver.create_container(&container).await.unwrap());
        assert!(driver.create_container(&container).await.unwrap());
        assert!(matches!(
            driver.create_container(&container).await,
            Err(SwiftError::UnexpectedStatus { status: 500, .. })
        ));

        let request = &transport.requests()[0];
        assert_eq!(request.headers.get("foo").unwrap(), "bar");
        assert!(request.headers.get("x-container-meta-read").is_none());
    }

    #[tokio::test]
    async fn public_container_is_created_with_read_acl() {
        let (transport, driver) = driver();
        transport.on_status(Method::PUT, "foo", 201);

        let mut container = Container::new("foo");
        container.set_public();
        assert!(driver.create_container(&container).await.unwrap());

        let request = &transport.requests()[0];
        assert_eq!(request.headers.get("x-container-meta-read").unwrap(), ".r:*");
    }

    #[tokio::test]
    async fn get_container_parses_headers() {
        let (transport, driver) = driver();
        transport.on(
            Method::HEAD,
            "foo",
            reply_with(
                204,
                &[("X-Container-Meta-Read", ".r:*"), ("X-Container-Object-Count", "2")],
                "",
            ),
        );
        transport.on_status(Method::HEAD, "missing", 404);

        let container = driver.get_container("foo").await.unwrap().unwrap();
        assert_eq!(container.name(), "foo");
        assert!(container.is_public());
        assert_eq!(container.object_count(), Some(2));

        assert!(driver.get_container("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_public_container_posts_acl() {
        let (transport, driver) = driver();
        transport.on_status(Method::POST, "foo", 204);

        let mut container = Container::new("foo");
        container.set_public();
        assert!(driver.update_container(&container).await.unwrap());

        let request = &transport.requests()[0];
        assert_eq!(request.headers.get("x-container-meta-read").unwrap(), ".r:*");
    }

    #[tokio::test]
    async fn delete_empty_container() {
        let (transport, driver) = driver();
        transport
            .on_status(Method::GET, "foo", 200)
            .on_status(Method::DELETE, "foo", 204);

        assert!(driver.delete_container(&Container::new("foo")).await.unwrap());
        assert_eq!(transport.calls(), vec!["GET foo", "DELETE foo"]);
    }

    #[tokio::test]
    async fn delete_container_removes_objects_first() {
        let (transport, driver) = driver();
        transport
            .on(Method::GET, "foo", reply_with(200, &[], "foo\nbar"))
            .on_status(Method::HEAD, "foo/foo", 204)
            .on_status(Method::HEAD, "foo/bar", 204)
            .on_status(Method::DELETE, "foo/foo", 204)
            .on_status(Method::DELETE, "foo/bar", 204)
            .on_status(Method::DELETE, "foo", 204);

        assert!(driver.delete_container(&Container::new("foo")).await.unwrap());
        assert!(transport.is_drained());
        assert_eq!(transport.calls().last().unwrap(), "DELETE foo");
    }

    #[tokio::test]
    async fn delete_container_removes_directory_markers() {
        let (transport, driver) = driver();
        transport
            .on(Method::GET, "foo", reply_with(200, &[], "dir/\ndir/a"))
            .on_status(Method::HEAD, "foo/dir/", 204)
            .on_status(Method::HEAD, "foo/dir/a", 204)
            .on_status(Method::DELETE, "foo/dir/", 204)
            .on_status(Method::DELETE, "foo/dir/a", 204)
            .on_status(Method::DELETE, "foo", 204);

        assert!(driver.delete_container(&Container::new("foo")).await.unwrap());
        let calls = transport.calls();
        assert!(calls.contains(&"DELETE foo/dir/".to_string()));
        assert!(calls.contains(&"DELETE foo/dir/a".to_string()));
        assert_eq!(calls.last().unwrap(), "DELETE foo");
        assert!(transport.is_drained());
    }

    #[tokio::test]
    async fn delete_missing_container_succeeds() {
        let (transport, driver) = driver();
        transport
            .on_status(Method::GET, "foo", 404)
            .on_status(Method::DELETE, "foo", 404);

        assert!(driver.delete_container(&Container::new("foo")).await.unwrap());
    }

    #[tokio::test]
    async fn object_existence() {
        let (transport, driver) = driver();
        transport
            .on_status(Method::HEAD, "foo/bar", 204)
            .on_status(Method::HEAD, "foo/baz", 404);

        let foo = container("foo");
        assert!(driver.object_exists(&Object::new(foo.clone(), "bar")).await.unwrap());
        assert!(!driver.object_exists(&Object::new(foo, "baz")).await.unwrap());
    }

    #[test]
    fn create_object_is_local() {
        let (transport, driver) = driver();
        let foo = container("foo");

        let object = driver.create_object(&foo, "bar", None);
        assert!(Arc::ptr_eq(object.container(), &foo));
        assert_eq!(object.name(), "bar");

        let response = reply_with(200, &[("foo", "bar"), ("X-Object-Meta-Bar", "baz")], "test");
        let object = driver.create_object(&foo, "bar", Some(&response));
        assert_eq!(object.header("foo"), Some("bar"));
        assert_eq!(object.metadata().get("bar"), Some("baz"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn get_object_reads_headers() {
        let (transport, driver) = driver();
        transport
            .on(
                Method::HEAD,
                "foo/bar",
                reply_with(204, &[("foo", "bar"), ("X-Object-Meta-Bar", "baz")], ""),
            )
            .on_status(Method::HEAD, "foo/missing", 404);

        let foo = container("foo");
        let object = driver.get_object(&foo, "bar").await.unwrap().unwrap();
        assert!(Arc::ptr_eq(object.container(), &foo));
        assert_eq!(object.header("foo"), Some("bar"));
        assert_eq!(object.metadata().get("bar"), Some("baz"));

        assert!(driver.get_object(&foo, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_objects_fetches_metadata_per_entry() {
        let (transport, driver) = driver();
        transport
            .on(Method::GET, "bar", reply_with(200, &[], "foo\nbar"))
            .on(Method::HEAD, "bar/foo", reply_with(204, &[("etag", "f00")], ""))
            .on_status(Method::HEAD, "bar/bar", 204);

        let bar = container("bar");
        let objects = driver.get_objects(&bar, &ListOptions::default()).await.unwrap();

        assert_eq!(objects.len(), 2);
        assert!(Arc::ptr_eq(objects[0].container(), &bar));
        assert_eq!(objects[0].name(), "foo");
        assert_eq!(objects[0].etag(), Some("f00"));
        assert_eq!(objects[1].name(), "bar");
    }

    #[tokio::test]
    async fn get_objects_keeps_listing_order_when_heads_finish_out_of_order() {
        let (transport, driver) = driver();
        transport
            .on(Method::GET, "c", reply_with(200, &[], "foo\nbar"))
            .on_delayed(
                Method::HEAD,
                "c/foo",
                Duration::from_millis(60),
                reply_with(204, &[("etag", "1")], ""),
            )
            .on(Method::HEAD, "c/bar", reply_with(204, &[("etag", "2")], ""));

        let objects = driver
            .get_objects(&container("c"), &ListOptions::default())
            .await
            .unwrap();

        let names: Vec<&str> = objects.iter().map(Object::name).collect();
        assert_eq!(names, vec!["foo", "bar"]);
        assert_eq!(objects[0].etag(), Some("1"));
        assert_eq!(objects[1].etag(), Some("2"));

        let heads: Vec<String> = transport
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("HEAD"))
            .collect();
        assert_eq!(heads, vec!["HEAD c/foo", "HEAD c/bar"]);
    }

    #[tokio::test]
    async fn get_objects_builds_pseudo_dirs_locally() {
        let (transport, driver) = driver();
        transport
            .on(Method::GET, "foo", reply_with(200, &[], "bar/\nbar/baz\nbar/qux\n"))
            .on_status(Method::HEAD, "foo/bar/baz", 204)
            .on_status(Method::HEAD, "foo/bar/qux", 204);

        let options = ListOptions::new()
            .prefix("bar/")
            .delimiter("/")
            .limit(10)
            .start("a")
            .end("z");
        let objects = driver.get_objects(&container("foo"), &options).await.unwrap();

        assert_eq!(objects.len(), 3);
        assert!(objects[0].is_pseudo_dir());
        assert_eq!(objects[0].path(), "foo/bar/");
        assert_eq!(objects[0].content_type(), Some(DIRECTORY_CONTENT_TYPE));
        assert_eq!(objects[1].path(), "foo/bar/baz");
        assert_eq!(objects[2].path(), "foo/bar/qux");

        assert_eq!(transport.count(&Method::HEAD), 2);
        let listing = &transport.requests()[0];
        assert_eq!(
            listing.query,
            vec![
                ("prefix".to_string(), "bar/".to_string()),
                ("delimiter".to_string(), "/".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("marker".to_string(), "a".to_string()),
                ("end_marker".to_string(), "z".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn get_objects_without_delimiter_heads_trailing_slash_names() {
        let (transport, driver) = driver();
        transport
            .on(Method::GET, "foo", reply_with(200, &[], "bar/"))
            .on_status(Method::HEAD, "foo/bar/", 204);

        let objects = driver
            .get_objects(&container("foo"), &ListOptions::default())
            .await
            .unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(transport.count(&Method::HEAD), 1);
    }

    #[tokio::test]
    async fn empty_listing_makes_no_head_requests() {
        let (transport, driver) = driver();
        transport
            .on_status(Method::GET, "foo", 204)
            .on(Method::GET, "bar", reply_with(200, &[], "\n"));

        assert!(driver.get_objects(&container("foo"), &ListOptions::default()).await.unwrap().is_empty());
        assert!(driver.get_objects(&container("bar"), &ListOptions::default()).await.unwrap().is_empty());
        assert_eq!(transport.count(&Method::HEAD), 0);
    }

    #[tokio::test]
    async fn get_objects_aggregates_failures() {
        let (transport, driver) = driver();
        transport
            .on(Method::GET, "bar", reply_with(200, &[], "foo\nbar/\nbar/baz\nbar/qux\n"))
            .on_status(Method::HEAD, "bar/foo", 204)
            .on_status(Method::HEAD, "bar/bar/", 204)
            .fail(Method::HEAD, "bar/bar/baz", "connection reset")
            .on_status(Method::HEAD, "bar/bar/qux", 500);

        let err = driver
            .get_objects(&container("bar"), &ListOptions::default())
            .await
            .unwrap_err();
        match err {
            SwiftError::Batch { context, failures } => {
                assert!(context.contains("container \"bar\""));
                assert_eq!(failures.len(), 2);
                assert!(failures[0].contains("bar/baz"));
                assert!(failures[1].contains("500"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn get_objects_rejects_unexpected_listing_status() {
        let (transport, driver) = driver();
        transport.on_status(Method::GET, "foo", 401);
        assert!(matches!(
            driver.get_objects(&container("foo"), &ListOptions::default()).await,
            Err(SwiftError::UnexpectedStatus { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn object_content() {
        let (transport, driver) = driver();
        transport
            .on(Method::GET, "foo/bar", reply_with(200, &[], "test"))
            .on_status(Method::GET, "foo/missing", 404);

        let foo = container("foo");
        let mut headers = HeaderMap::new();
        headers.insert("x-newest", HeaderValue::from_static("true"));
        let content = driver
            .get_object_content(&Object::new(foo.clone(), "bar"), headers)
            .await
            .unwrap();
        assert_eq!(content.as_ref(), b"test");
        assert_eq!(transport.requests()[0].headers.get("x-newest").unwrap(), "true");

        assert!(
            driver
                .get_object_content(&Object::new(foo, "missing"), HeaderMap::new())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn update_object_without_content_only_posts_metadata() {
        let (transport, driver) = driver();
        transport
            .on_status(Method::POST, "foo", 204)
            .on_status(Method::POST, "foo/bar", 202);

        let mut object = Object::new(container("foo"), "bar");
        object.metadata_mut().set("owner", "me");
        assert!(driver.update_object(&mut object).await.unwrap());

        assert_eq!(transport.calls(), vec!["POST foo", "POST foo/bar"]);
        let post = &transport.requests()[1];
        assert_eq!(post.headers.get("x-object-meta-owner").unwrap(), "me");
        assert!(object.last_modified().is_none());
    }

    #[tokio::test]
    async fn update_object_with_local_file_uploads() {
        let (transport, driver) = driver();
        transport
            .on_status(Method::POST, "foo", 204)
            .on_status(Method::PUT, "foo/bar", 201);

        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"hello").unwrap();

        let mut object = Object::new(container("foo"), "bar");
        object.set_local_file(file.path()).await.unwrap();
        assert!(driver.update_object(&mut object).await.unwrap());

        assert_eq!(transport.calls(), vec!["POST foo", "PUT foo/bar"]);
        let put = &transport.requests()[1];
        assert_eq!(put.body.as_deref(), Some(&b"hello"[..]));
        assert_eq!(put.headers.get("content-type").unwrap(), "text/plain");
        assert_eq!(
            put.headers.get("etag").unwrap().to_str().unwrap(),
            format!("{:x}", md5::compute(b"hello"))
        );
        assert!(put.headers.get("last-modified").is_some());
        assert!(object.last_modified().is_some());
    }

    #[tokio::test]
    async fn update_object_unexpected_status() {
        let (transport, driver) = driver();
        transport
            .on_status(Method::POST, "foo", 204)
            .on_status(Method::PUT, "foo/bar", 411);

        let mut object = Object::new(container("foo"), "bar");
        object.set_body("data");
        assert!(matches!(
            driver.update_object(&mut object).await,
            Err(SwiftError::UnexpectedStatus { status: 411, .. })
        ));
    }

    #[tokio::test]
    async fn update_object_metadata_expects_accepted() {
        let (transport, driver) = driver();
        transport.on_status(Method::POST, "foo/bar", 202);
        let object = Object::new(container("foo"), "bar");
        assert!(driver.update_object_metadata(&object).await.unwrap());
    }

    #[tokio::test]
    async fn delete_object_is_idempotent() {
        let (transport, driver) = driver();
        transport
            .on_status(Method::DELETE, "foo/bar", 204)
            .on_status(Method::DELETE, "foo/bar", 404)
            .on_status(Method::DELETE, "foo/bar", 500);

        let object = Object::new(container("foo"), "bar");
        assert!(driver.delete_object(&object).await.unwrap());
        assert!(driver.delete_object(&object).await.unwrap());
        assert!(driver.delete_object(&object).await.is_err());
    }

    #[tokio::test]
    async fn delete_objects_skips_pseudo_dirs() {
        let (transport, driver) = driver();
        transport
            .on_status(Method::DELETE, "foo/foo/bar", 204)
            .on_status(Method::DELETE, "foo/foo/baz", 204);

        let foo = container("foo");
        let objects = vec![
            Object::new(foo.clone(), "foo/"),
            Object::new(foo.clone(), "foo/bar"),
            Object::new(foo, "foo/baz"),
        ];

        assert_eq!(driver.delete_objects(&objects).await.unwrap(), 2);
        assert_eq!(transport.count(&Method::DELETE), 2);
    }

    #[tokio::test]
    async fn delete_objects_does_not_count_already_gone() {
        let (transport, driver) = driver();
        transport
            .on_status(Method::DELETE, "foo/bar", 404)
            .on_status(Method::DELETE, "foo/baz", 204);

        let foo = container("foo");
        let objects = vec![Object::new(foo.clone(), "bar"), Object::new(foo, "baz")];
        assert_eq!(driver.delete_objects(&objects).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_objects_fails_on_other_errors() {
        let (transport, driver) = driver();
        transport
            .on_status(Method::DELETE, "foo/bar", 204)
            .fail(Method::DELETE, "foo/baz", "connection reset");

        let foo = container("foo");
        let objects = vec![Object::new(foo.clone(), "bar"), Object::new(foo, "baz")];
        match driver.delete_objects(&objects).await {
            Err(SwiftError::Batch { failures, .. }) => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].starts_with("foo/baz: "));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn delete_objects_with_nothing_to_delete() {
        let (transport, driver) = driver();
        let objects = vec![Object::new(container("foo"), "dir/")];
        assert_eq!(driver.delete_objects(&objects).await.unwrap(), 0);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn copy_object_refetches_destination() {
        let (transport, driver) = driver();
        transport
            .on_status(copy_method(), "foo/bar", 201)
            .on(Method::HEAD, "baz/qux", reply_with(204, &[("etag", "abc")], ""));

        let source = Object::new(container("foo"), "bar");
        let destination = container("baz");
        let copied = driver
            .copy_object(&source, &destination, "qux")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(copied.path(), "baz/qux");
        assert_eq!(copied.etag(), Some("abc"));
        let copy = &transport.requests()[0];
        assert_eq!(copy.headers.get(DESTINATION_HEADER).unwrap(), "/baz/qux");
    }

    #[tokio::test]
    async fn copy_destination_is_quoted_per_segment() {
        let (transport, driver) = driver();
        transport
            .on_status(copy_method(), "foo/bar", 201)
            .on_status(Method::HEAD, "baz/a b%20c/d", 204);

        let source = Object::new(container("foo"), "bar");
        let copied = driver
            .copy_object(&source, &container("baz"), "a b%20c/d")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(copied.name(), "a b%20c/d");
        let copy = &transport.requests()[0];
        assert_eq!(
            copy.headers.get(DESTINATION_HEADER).unwrap(),
            "/baz/a%20b%2520c/d"
        );
    }

    #[tokio::test]
    async fn listed_names_keep_trailing_spaces() {
        let (transport, driver) = driver();
        transport
            .on(Method::GET, "foo", reply_with(200, &[], "report \r\nnotes\n"))
            .on_status(Method::HEAD, "foo/report ", 204)
            .on_status(Method::HEAD, "foo/notes", 204);

        let objects = driver
            .get_objects(&container("foo"), &ListOptions::default())
            .await
            .unwrap();
        let names: Vec<&str> = objects.iter().map(Object::name).collect();
        assert_eq!(names, vec!["report ", "notes"]);
    }

    #[tokio::test]
    async fn copy_object_failure_skips_refetch() {
        let (transport, driver) = driver();
        transport.on_status(copy_method(), "foo/bar", 404);

        let source = Object::new(container("foo"), "bar");
        assert!(driver.copy_object(&source, &container("baz"), "qux").await.is_err());
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn list_options_describe_as_json() {
        let options = ListOptions::new().prefix("a/").limit(5);
        assert_eq!(options.describe(), r#"{"prefix":"a/","limit":5}"#);
        assert!(ListOptions::default().to_query().is_empty());
    }
}
