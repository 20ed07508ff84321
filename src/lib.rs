//! Client for OpenStack Swift style object storage.
//!
//! [`ObjectStore`] is the entry point: it caches containers, guards against
//! requests that can only fail or surprise (public URLs of private objects,
//! empty uploads, copies onto self) and delegates to [`SwiftDriver`], which
//! speaks HTTP through a [`Transport`].
//!
//! ```no_run
//! # async fn run() -> swift_store::SwiftResult<()> {
//! use swift_store::{ListOptions, ObjectStore, SwiftConfig};
//!
//! let config = SwiftConfig::new("http://127.0.0.1:8080/v1/AUTH_test").with_auth_token("token");
//! let mut store = ObjectStore::from_config(&config)?;
//!
//! let container = store.create_container("photos", false).await?;
//! let mut object = store.create_object(&container, "2024/cat.jpg").await?;
//! object.set_local_file("cat.jpg").await?;
//! store.update_object(&mut object).await?;
//!
//! for object in store.get_objects(&container, ListOptions::new().prefix("2024").delimiter("/")).await? {
//!     println!("{}", store.object_url(&object)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod transport;

pub use config::SwiftConfig;
pub use errors::{SwiftError, SwiftResult};
pub use models::{Container, Metadata, Object};
pub use services::{ListOptions, ObjectStore, SwiftDriver};
pub use transport::{HttpTransport, Request, Response, Transport};
