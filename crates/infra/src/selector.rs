//! Backend selection: relational when reachable, JSON file otherwise.

use std::path::{Path, PathBuf};

use ordercap_core::OrderNumber;
use ordercap_sales::Order;

use crate::storage::{BackendKind, DocumentFileStore, RelationalStore, StorageBackend, StoreError};

/// File name of the fallback store when no path is configured.
pub const FALLBACK_FILE_NAME: &str = "orders.json";

/// Answers "can the relational store be used right now?".
pub trait ReachabilityProbe {
    fn probe(&self, descriptor: &str) -> Result<(), StoreError>;
}

/// Opens and closes a real SQLite connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteProbe;

impl ReachabilityProbe for SqliteProbe {
    fn probe(&self, descriptor: &str) -> Result<(), StoreError> {
        RelationalStore::probe(descriptor)
    }
}

/// `orders.json` next to the running executable, or in the working
/// directory when the executable path is unknown.
pub fn default_fallback_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(FALLBACK_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_FILE_NAME))
}

/// Factory for the backend a processed order is written to.
///
/// Every [`create_backend`](Self::create_backend) call probes again; there is
/// no caching, retry or backoff.
#[derive(Debug, Clone)]
pub struct BackendSelector<P = SqliteProbe> {
    descriptor: String,
    fallback_path: PathBuf,
    probe: P,
}

impl BackendSelector<SqliteProbe> {
    pub fn new(descriptor: impl Into<String>) -> Result<Self, StoreError> {
        let descriptor = descriptor.into();
        if descriptor.is_empty() {
            return Err(StoreError::InvalidArgument(
                "connection descriptor must not be empty".to_string(),
            ));
        }
        Ok(Self {
            descriptor,
            fallback_path: default_fallback_path(),
            probe: SqliteProbe,
        })
    }
}

impl<P> BackendSelector<P> {
    pub fn with_probe<Q: ReachabilityProbe>(self, probe: Q) -> BackendSelector<Q> {
        BackendSelector {
            descriptor: self.descriptor,
            fallback_path: self.fallback_path,
            probe,
        }
    }

    pub fn with_fallback_path(mut self, path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(StoreError::InvalidArgument(
                "fallback path must not be empty".to_string(),
            ));
        }
        self.fallback_path = path;
        Ok(self)
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn fallback_path(&self) -> &Path {
        &self.fallback_path
    }
}

impl<P: ReachabilityProbe> BackendSelector<P> {
    pub fn create_backend(&self) -> SelectedBackend {
        match self.probe.probe(&self.descriptor) {
            Ok(()) => {
                tracing::info!(descriptor = %self.descriptor, "relational store reachable");
                SelectedBackend::Relational(RelationalStore::from_checked(
                    self.descriptor.clone(),
                ))
            }
            Err(err) => {
                tracing::warn!(
                    descriptor = %self.descriptor,
                    fallback = %self.fallback_path.display(),
                    error = %err,
                    "relational store unavailable, falling back to document store"
                );
                SelectedBackend::Document(DocumentFileStore::from_checked(
                    self.fallback_path.clone(),
                ))
            }
        }
    }

    /// Highest order number in either store.
    ///
    /// Orders written to the fallback file while the database was down keep
    /// their numbers, so the file is always consulted and the database when
    /// reachable. An unreadable fallback file counts as empty: the next
    /// fallback write discards it.
    pub fn last_order_number(&self) -> Result<Option<OrderNumber>, StoreError> {
        let fallback = DocumentFileStore::from_checked(self.fallback_path.clone());
        let from_file = match fallback.last_order_number() {
            Err(StoreError::Decode(reason)) => {
                tracing::warn!(
                    fallback = %self.fallback_path.display(),
                    %reason,
                    "ignoring unreadable fallback file when resuming order numbers"
                );
                None
            }
            other => other?,
        };

        let from_database = match self.probe.probe(&self.descriptor) {
            Ok(()) => RelationalStore::from_checked(self.descriptor.clone()).last_order_number()?,
            Err(_) => None,
        };

        Ok(from_file.max(from_database))
    }
}

/// The backend chosen by [`BackendSelector::create_backend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedBackend {
    Relational(RelationalStore),
    Document(DocumentFileStore),
}

impl StorageBackend for SelectedBackend {
    fn kind(&self) -> BackendKind {
        match self {
            SelectedBackend::Relational(store) => store.kind(),
            SelectedBackend::Document(store) => store.kind(),
        }
    }

    fn describe(&self) -> String {
        match self {
            SelectedBackend::Relational(store) => store.describe(),
            SelectedBackend::Document(store) => store.describe(),
        }
    }

    fn write(&self, order: &Order) -> Result<(), StoreError> {
        match self {
            SelectedBackend::Relational(store) => store.write(order),
            SelectedBackend::Document(store) => store.write(order),
        }
    }

    fn last_order_number(&self) -> Result<Option<OrderNumber>, StoreError> {
        match self {
            SelectedBackend::Relational(store) => store.last_order_number(),
            SelectedBackend::Document(store) => store.last_order_number(),
        }
    }
}
