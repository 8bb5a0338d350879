//! JSON file order store.
//!
//! The file holds one JSON array of [`OrderDocument`]s. Every write reads the
//! whole collection, appends the new order and rewrites the file
//! pretty-printed through a sibling temp file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ordercap_core::OrderNumber;
use ordercap_sales::{Order, OrderDocument};

use super::r#trait::{BackendKind, StorageBackend, StoreError};

const EMPTY_COLLECTION: &str = "[]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFileStore {
    path: PathBuf,
}

impl DocumentFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(StoreError::InvalidArgument(
                "document store path must not be empty".to_string(),
            ));
        }
        Ok(Self { path })
    }

    pub(crate) fn from_checked(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored order, in write order.
    pub fn read_all(&self) -> Result<Vec<Order>, StoreError> {
        self.read_documents()?
            .into_iter()
            .map(|doc| self.decode_order(doc))
            .collect()
    }

    fn decode_order(&self, doc: OrderDocument) -> Result<Order, StoreError> {
        let number = doc.order_number;
        Order::try_from(doc).map_err(|e| {
            StoreError::Decode(format!("order {number} in {}: {e}", self.path.display()))
        })
    }

    /// Parse the file as it is. Missing or blank files are an empty collection.
    fn read_documents(&self) -> Result<Vec<OrderDocument>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(StoreError::Io(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )));
            }
        };

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "read order document file");

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            StoreError::Decode(format!("{} is not an order collection: {e}", self.path.display()))
        })
    }

    /// Documents that all decode into valid orders.
    fn read_valid_documents(&self) -> Result<Vec<OrderDocument>, StoreError> {
        let documents = self.read_documents()?;
        for doc in &documents {
            self.decode_order(doc.clone())?;
        }
        Ok(documents)
    }

    /// Collection to append to. Content that does not decode into valid
    /// orders is discarded and the file reset to an empty array.
    fn load_for_append(&self) -> Result<Vec<OrderDocument>, StoreError> {
        match self.read_valid_documents() {
            Err(StoreError::Decode(reason)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %reason,
                    "discarding unreadable order document file"
                );
                self.replace_contents(EMPTY_COLLECTION)?;
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn ensure_parent_dir(&self) -> Result<(), StoreError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Io(format!("failed to create {}: {e}", parent.display()))
                })
            }
            _ => Ok(()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn replace_contents(&self, contents: &str) -> Result<(), StoreError> {
        let tmp = self.temp_path();
        fs::write(&tmp, contents)
            .map_err(|e| StoreError::Io(format!("failed to write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            StoreError::Io(format!(
                "failed to move {} to {}: {e}",
                tmp.display(),
                self.path.display()
            ))
        })
    }
}

impl StorageBackend for DocumentFileStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    fn describe(&self) -> String {
        format!("document store at {}", self.path.display())
    }

    fn write(&self, order: &Order) -> Result<(), StoreError> {
        self.ensure_parent_dir()?;

        let mut documents = self.load_for_append()?;
        documents.push(OrderDocument::from(order));

        let text = serde_json::to_string_pretty(&documents)
            .map_err(|e| StoreError::Decode(format!("failed to encode orders: {e}")))?;
        self.replace_contents(&text)?;

        tracing::info!(
            path = %self.path.display(),
            order_number = %order.order_number(),
            stored_orders = documents.len(),
            "appended order to document store"
        );
        Ok(())
    }

    fn last_order_number(&self) -> Result<Option<OrderNumber>, StoreError> {
        Ok(self
            .read_all()?
            .iter()
            .map(Order::order_number)
            .max())
    }
}
