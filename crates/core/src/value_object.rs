//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity of their own; two instances with the same
/// attribute values are interchangeable. A catalog line item (stock code,
/// name, price) is the typical example: copying it into an order produces an
/// independent value that compares equal field by field.
///
/// The trait requires:
/// - **Clone**: copies are independent owned values
/// - **PartialEq**: compared by attribute values
/// - **Debug**: printable in logs and test failures
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
