//! Client-side models of the Swift entities.
//!
//! A container owns its metadata bag; an object owns its own and holds a
//! shared handle to the container it lives in.

pub mod container;
pub mod metadata;
pub mod object;

pub use container::Container;
pub use metadata::Metadata;
pub use object::Object;
