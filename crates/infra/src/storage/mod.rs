//! Order persistence backends.

pub mod document;
pub mod relational;
pub mod r#trait;

pub use document::DocumentFileStore;
pub use r#trait::{BackendKind, StorageBackend, StoreError};
pub use relational::RelationalStore;
