//! High-level entry point: caches containers, checks preconditions and
//! delegates everything on the wire to [`SwiftDriver`].

use crate::config::SwiftConfig;
use crate::errors::{SwiftError, SwiftResult};
use crate::models::{Container, Object};
use crate::services::driver::{ListOptions, SwiftDriver};
use crate::transport::{Query, Response};
use bytes::Bytes;
use http::HeaderMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Object storage client.
///
/// Containers fetched or created through the store are cached by name and
/// handed out as shared handles. A missing container is never cached. The
/// cache makes this a single-owner type: methods touching it take
/// `&mut self`. Clone the driver to share the wire side across tasks.
pub struct ObjectStore {
    driver: SwiftDriver,
    containers: HashMap<String, Arc<Container>>,
}

impl ObjectStore {
    pub fn new(driver: SwiftDriver) -> Self {
        Self {
            driver,
            containers: HashMap::new(),
        }
    }

    pub fn from_config(config: &SwiftConfig) -> SwiftResult<Self> {
        Ok(Self::new(SwiftDriver::from_config(config)?))
    }

    pub fn driver(&self) -> &SwiftDriver {
        &self.driver
    }

    pub async fn head(&self, path: &str, query: Query, headers: HeaderMap) -> SwiftResult<Response> {
        self.driver.head(path, query, headers).await
    }

    pub async fn get(&self, path: &str, query: Query, headers: HeaderMap) -> SwiftResult<Response> {
        self.driver.get(path, query, headers).await
    }

    pub async fn put(
        &self,
        path: &str,
        query: Query,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> SwiftResult<Response> {
        self.driver.put(path, query, headers, body).await
    }

    pub async fn post(
        &self,
        path: &str,
        query: Query,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> SwiftResult<Response> {
        self.driver.post(path, query, headers, body).await
    }

    pub async fn copy(&self, path: &str, query: Query, headers: HeaderMap) -> SwiftResult<Response> {
        self.driver.copy(path, query, headers).await
    }

    pub async fn delete(
        &self,
        path: &str,
        query: Query,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> SwiftResult<Response> {
        self.driver.delete(path, query, headers, body).await
    }

    /// Public URL of an object. Refused for objects in private containers,
    /// whose URLs would not be reachable anonymously.
    pub fn object_url(&self, object: &Object) -> SwiftResult<String> {
        if object.container().is_private() {
            return Err(SwiftError::PrivateContainer(object.container().name().to_string()));
        }
        Ok(self.driver.object_url(object))
    }

    /// Cached container, or a new one created remotely with the requested
    /// visibility.
    pub async fn create_container(&mut self, name: &str, private: bool) -> SwiftResult<Arc<Container>> {
        if let Some(container) = self.containers.get(name) {
            debug!("Container \"{}\" served from cache", name);
            return Ok(container.clone());
        }

        let mut container = Container::new(name);
        if private {
            container.set_private();
        } else {
            container.set_public();
        }

        self.driver.create_container(&container).await?;

        let container = Arc::new(container);
        self.containers.insert(name.to_string(), container.clone());
        Ok(container)
    }

    pub async fn get_container(&mut self, name: &str) -> SwiftResult<Option<Arc<Container>>> {
        if let Some(container) = self.containers.get(name) {
            return Ok(Some(container.clone()));
        }

        let Some(container) = self.driver.get_container(name).await? else {
            return Ok(None);
        };
        let container = Arc::new(container);
        self.containers.insert(name.to_string(), container.clone());
        Ok(Some(container))
    }

    pub async fn container_exists(&self, container: &Container) -> SwiftResult<bool> {
        self.driver.container_exists(container).await
    }

    /// Persist a modified container and cache it in place of the previous
    /// handle. Objects built from the old handle keep seeing the old state.
    pub async fn update_container(&mut self, container: Container) -> SwiftResult<Arc<Container>> {
        self.driver.update_container(&container).await?;
        let container = Arc::new(container);
        self.containers
            .insert(container.name().to_string(), container.clone());
        Ok(container)
    }

    /// Delete a container and everything in it, and forget it.
    pub async fn delete_container(&mut self, container: &Container) -> SwiftResult<bool> {
        let deleted = self.driver.delete_container(container).await?;
        self.containers.remove(container.name());
        Ok(deleted)
    }

    pub async fn object_exists(&self, object: &Object) -> SwiftResult<bool> {
        self.driver.object_exists(object).await
    }

    /// New local object handle. The container is created remotely first if it
    /// does not exist yet.
    pub async fn create_object(&self, container: &Arc<Container>, name: &str) -> SwiftResult<Object> {
        if !self.driver.container_exists(container).await? {
            self.driver.create_container(container).await?;
        }
        Ok(self.driver.create_object(container, name, None))
    }

    pub async fn get_object(&self, container: &Arc<Container>, name: &str) -> SwiftResult<Option<Object>> {
        self.driver.get_object(container, name).await
    }

    /// List objects. With both a prefix and a delimiter, the prefix is made
    /// to end with the delimiter so `dir` lists the contents of `dir/`.
    pub async fn get_objects(
        &self,
        container: &Arc<Container>,
        mut options: ListOptions,
    ) -> SwiftResult<Vec<Object>> {
        let normalized = match (&options.prefix, &options.delimiter) {
            (Some(prefix), Some(delimiter)) if !delimiter.is_empty() => Some(format!(
                "{}{}",
                prefix.trim_end_matches(delimiter.as_str()),
                delimiter
            )),
            _ => None,
        };
        if normalized.is_some() {
            options.prefix = normalized;
        }
        self.driver.get_objects(container, &options).await
    }

    pub async fn get_object_content(&self, object: &Object, headers: HeaderMap) -> SwiftResult<Bytes> {
        self.driver.get_object_content(object, headers).await
    }

    /// Upload staged content, or update metadata of an existing object.
    /// An object with neither staged content nor a remote counterpart is
    /// rejected before anything is written.
    pub async fn update_object(&self, object: &mut Object) -> SwiftResult<bool> {
        if object.body().is_none() && !self.driver.object_exists(object).await? {
            return Err(SwiftError::MissingBody(object.path()));
        }
        self.driver.update_object(object).await
    }

    pub async fn update_object_metadata(&self, object: &Object) -> SwiftResult<bool> {
        self.driver.update_object_metadata(object).await
    }

    pub async fn delete_object(&self, object: &Object) -> SwiftResult<bool> {
        self.driver.delete_object(object).await
    }

    pub async fn delete_objects(&self, objects: &[Object]) -> SwiftResult<usize> {
        self.driver.delete_objects(objects).await
    }

    /// Server-side copy. `name` defaults to the source object's name; copying
    /// an object onto itself is refused without contacting the server.
    pub async fn copy_object(
        &self,
        object: &Object,
        destination: &Arc<Container>,
        name: Option<&str>,
    ) -> SwiftResult<Option<Object>> {
        let name = name.unwrap_or(object.name());
        if destination.name() == object.container().name() && name == object.name() {
            return Err(SwiftError::SelfCopy(object.path()));
        }
        self.driver.copy_object(object, destination, name).await
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.containers.contains_key(name)
    }

    /// Forget every cached container.
    pub fn clear(&mut self) {
        self.containers.clear();
    }
}
