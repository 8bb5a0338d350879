//! `ordercap-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the error taxonomy, typed identifiers and the order-number sequence.

pub mod entity;
pub mod error;
pub mod id;
pub mod sequence;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{LineNumber, OrderNumber};
pub use sequence::{AtomicOrderNumbers, OrderNumberSequence};
pub use value_object::ValueObject;
