//! Identity for domain objects that change over time.

/// A domain object identified by a number rather than by its contents.
///
/// An order keeps its identity while line items are added and totals are
/// computed; two orders with the same contents but different numbers are
/// different orders.
pub trait Entity {
    type Id: Copy + Eq + core::fmt::Display;

    fn id(&self) -> Self::Id;
}
