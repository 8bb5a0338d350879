//! Infrastructure layer: order storage backends, backend selection,
//! the processing pipeline and configuration.

pub mod config;
pub mod pipeline;
pub mod selector;
pub mod storage;

pub use config::StoreConfig;
pub use pipeline::{ProcessError, ProcessOrder, ProcessReceipt};
pub use selector::{BackendSelector, ReachabilityProbe, SelectedBackend, SqliteProbe};
pub use storage::{BackendKind, DocumentFileStore, RelationalStore, StorageBackend, StoreError};
