use serde::{Deserialize, Serialize};
use thiserror::Error;

use ordercap_core::OrderNumber;
use ordercap_sales::Order;

/// Storage operation error.
///
/// These are **infrastructure errors** (connectivity, integrity, filesystem,
/// encoding) as opposed to domain errors (validation, preconditions).
///
/// ## Error Categories
///
/// - **InvalidArgument**: a store was configured with an unusable location
/// - **Connection**: the relational store could not be reached
/// - **ConstraintViolation**: duplicate key or other integrity failure on insert
/// - **Io**: the filesystem path cannot be used
/// - **Decode**: stored content could not be parsed (or encoded)
/// - **Database**: any other driver failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Which concrete backend a [`StorageBackend`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Relational,
    Document,
}

impl core::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BackendKind::Relational => f.write_str("relational"),
            BackendKind::Document => f.write_str("document"),
        }
    }
}

/// Durable sink for processed orders.
///
/// ## Write Semantics
///
/// `write()`:
/// - records the order header and every line item, or nothing at all
/// - acquires and releases its connection or file handle within the call
/// - returns a typed [`StoreError`] on failure
///
/// Callers never need to inspect the concrete type: `kind()` and
/// `describe()` say where an order went.
pub trait StorageBackend {
    fn kind(&self) -> BackendKind;

    /// Human-readable location, e.g. the connection descriptor or file path.
    fn describe(&self) -> String;

    /// Persist one order (header + all line items).
    fn write(&self, order: &Order) -> Result<(), StoreError>;

    /// Highest order number already persisted, if any.
    fn last_order_number(&self) -> Result<Option<OrderNumber>, StoreError>;
}
