//! Order processing: totals, backend selection, persistence.

use serde::Serialize;
use thiserror::Error;

use ordercap_core::{DomainError, OrderNumber};
use ordercap_sales::Order;

use crate::selector::{BackendSelector, ReachabilityProbe};
use crate::storage::{BackendKind, StorageBackend, StoreError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProcessError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where a processed order ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessReceipt {
    pub order_number: OrderNumber,
    pub backend: BackendKind,
    pub backend_description: String,
    pub total_amount: f64,
}

/// Finalize and persist an order.
///
/// Totals are computed first; an order that fails validation never reaches a
/// backend. Processing the same order twice is not guarded against: the
/// relational store rejects the duplicate key, the document store appends a
/// second copy.
pub trait ProcessOrder {
    fn process_order<P: ReachabilityProbe>(
        &mut self,
        selector: &BackendSelector<P>,
    ) -> Result<ProcessReceipt, ProcessError>;

    fn process_order_with<B: StorageBackend + ?Sized>(
        &mut self,
        backend: &B,
    ) -> Result<ProcessReceipt, ProcessError>;
}

impl ProcessOrder for Order {
    fn process_order<P: ReachabilityProbe>(
        &mut self,
        selector: &BackendSelector<P>,
    ) -> Result<ProcessReceipt, ProcessError> {
        self.compute_totals()?;
        let backend = selector.create_backend();
        persist(self, &backend)
    }

    fn process_order_with<B: StorageBackend + ?Sized>(
        &mut self,
        backend: &B,
    ) -> Result<ProcessReceipt, ProcessError> {
        self.compute_totals()?;
        persist(self, backend)
    }
}

fn persist<B: StorageBackend + ?Sized>(
    order: &Order,
    backend: &B,
) -> Result<ProcessReceipt, ProcessError> {
    backend.write(order)?;

    let receipt = ProcessReceipt {
        order_number: order.order_number(),
        backend: backend.kind(),
        backend_description: backend.describe(),
        total_amount: order.total_amount(),
    };
    tracing::info!(
        order_number = %receipt.order_number,
        backend = %receipt.backend,
        total_amount = receipt.total_amount,
        "order processed"
    );
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DocumentFileStore, RelationalStore};
    use ordercap_core::AtomicOrderNumbers;
    use ordercap_sales::LineItem;
    use std::cell::RefCell;

    const EPSILON: f64 = 1e-9;

    struct Unreachable;

    impl ReachabilityProbe for Unreachable {
        fn probe(&self, _descriptor: &str) -> Result<(), StoreError> {
            Err(StoreError::Connection("no database".to_string()))
        }
    }

    /// Backend that records what it was asked to write.
    #[derive(Default)]
    struct RecordingBackend {
        written: RefCell<Vec<OrderNumber>>,
    }

    impl StorageBackend for RecordingBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Document
        }

        fn describe(&self) -> String {
            "recording backend".to_string()
        }

        fn write(&self, order: &Order) -> Result<(), StoreError> {
            self.written.borrow_mut().push(order.order_number());
            Ok(())
        }

        fn last_order_number(&self) -> Result<Option<OrderNumber>, StoreError> {
            Ok(self.written.borrow().iter().copied().max())
        }
    }

    fn billy_smith(seq: &AtomicOrderNumbers) -> Order {
        let mut order = Order::new(seq, "Billy Smith", "6780923750").unwrap();
        order
            .add_line_item(&LineItem::new("ELECT001", "42 Inch TV", 300.00).unwrap(), 1)
            .unwrap();
        order
            .add_line_item(&LineItem::new("GARD003", "Lawn Mower", 500.00).unwrap(), 1)
            .unwrap();
        order
    }

    #[test]
    fn unreachable_database_falls_back_to_document_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.json");
        let selector = BackendSelector::new("sqlite://unused.db")
            .unwrap()
            .with_fallback_path(&path)
            .unwrap()
            .with_probe(Unreachable);
        let seq = AtomicOrderNumbers::new();
        let mut order = billy_smith(&seq);

        let receipt = order.process_order(&selector).unwrap();

        assert_eq!(receipt.backend, BackendKind::Document);
        assert_eq!(receipt.order_number.get(), 1000);
        assert!((receipt.total_amount - 896.50).abs() < EPSILON);
        assert!((order.subtotal() - 815.00).abs() < EPSILON);
        assert!((order.tax_amount() - 81.50).abs() < EPSILON);

        let stored = DocumentFileStore::new(&path).unwrap().read_all().unwrap();
        assert_eq!(stored, vec![order]);
    }

    #[test]
    fn reachable_database_receives_the_order() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = format!("sqlite://{}?mode=rwc", dir.path().join("orders.db").display());
        let selector = BackendSelector::new(descriptor.clone())
            .unwrap()
            .with_fallback_path(dir.path().join("orders.json"))
            .unwrap();
        let seq = AtomicOrderNumbers::new();
        let mut order = billy_smith(&seq);

        let receipt = order.process_order(&selector).unwrap();

        assert_eq!(receipt.backend, BackendKind::Relational);
        assert!(!dir.path().join("orders.json").exists());
        let store = RelationalStore::new(descriptor).unwrap();
        assert_eq!(store.last_order_number().unwrap(), Some(order.order_number()));
    }

    #[test]
    fn empty_order_fails_before_any_write() {
        let backend = RecordingBackend::default();
        let seq = AtomicOrderNumbers::new();
        let mut order = Order::new(&seq, "Billy Smith", "6780923750").unwrap();

        let err = order.process_order_with(&backend).unwrap_err();

        assert!(matches!(err, ProcessError::Domain(DomainError::InvalidState(_))));
        assert!(backend.written.borrow().is_empty());
    }

    #[test]
    fn processing_twice_is_not_guarded() {
        let backend = RecordingBackend::default();
        let seq = AtomicOrderNumbers::new();
        let mut order = billy_smith(&seq);

        order.process_order_with(&backend).unwrap();
        order.process_order_with(&backend).unwrap();

        assert_eq!(backend.written.borrow().len(), 2);
    }

    #[test]
    fn second_document_write_appends_a_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentFileStore::new(dir.path().join("orders.json")).unwrap();
        let seq = AtomicOrderNumbers::new();
        let mut order = billy_smith(&seq);

        order.process_order_with(&store).unwrap();
        order.process_order_with(&store).unwrap();

        let stored = store.read_all().unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|o| o.order_number() == order.order_number()));
        assert_eq!(stored[0], stored[1]);
    }

    #[test]
    fn second_relational_write_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = format!("sqlite://{}?mode=rwc", dir.path().join("orders.db").display());
        let store = RelationalStore::new(descriptor).unwrap();
        let seq = AtomicOrderNumbers::new();
        let mut order = billy_smith(&seq);

        order.process_order_with(&store).unwrap();
        let err = order.process_order_with(&store).unwrap_err();

        assert!(matches!(
            err,
            ProcessError::Store(StoreError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn backend_failure_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file.txt");
        std::fs::write(&blocker, "occupied").unwrap();
        let store = DocumentFileStore::new(blocker.join("orders.json")).unwrap();
        let seq = AtomicOrderNumbers::new();
        let mut order = billy_smith(&seq);

        let err = order.process_order_with(&store).unwrap_err();
        assert!(matches!(err, ProcessError::Store(StoreError::Io(_))));
    }
}
