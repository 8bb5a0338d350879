//! Sales orders domain module.
//!
//! This crate contains the business rules for capturing an order: catalog line
//! items with their tariff rule, the order aggregate with its totals and tax,
//! and the document encoding used to persist orders. It performs no IO;
//! persistence lives in `ordercap-infra`.

pub mod document;
pub mod line_item;
pub mod order;

pub use document::{LineItemDocument, OrderDocument};
pub use line_item::{LineItem, TARIFF_CATEGORY, TARIFF_MULTIPLIER};
pub use order::{Order, TAX_RATE};
