pub mod batch;
pub mod driver;
pub mod object_store;
pub mod status;

pub use driver::{ListOptions, SwiftDriver};
pub use object_store::ObjectStore;
