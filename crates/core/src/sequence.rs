//! Order-number generation.
//!
//! Orders never pick their own number: construction takes an
//! [`OrderNumberSequence`] so callers decide where numbering starts and tests
//! can hand in a deterministic generator.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::{DomainError, DomainResult};
use crate::id::OrderNumber;

/// Source of unique, monotonically increasing order numbers.
pub trait OrderNumberSequence: Send + Sync {
    /// Take the next order number. Each call returns a number never handed
    /// out before, or `InvalidState` once the number space is used up.
    fn next_order_number(&self) -> DomainResult<OrderNumber>;
}

impl<S> OrderNumberSequence for Arc<S>
where
    S: OrderNumberSequence + ?Sized,
{
    fn next_order_number(&self) -> DomainResult<OrderNumber> {
        (**self).next_order_number()
    }
}

/// Stored in `next` once `u32::MAX` has been handed out.
const EXHAUSTED: u32 = 0;

/// Lock-free counter; safe to share between threads.
#[derive(Debug)]
pub struct AtomicOrderNumbers {
    next: AtomicU32,
}

impl AtomicOrderNumbers {
    /// Number handed out first by a fresh sequence.
    pub const FIRST: u32 = 1000;

    pub fn new() -> Self {
        Self::starting_at(Self::FIRST)
    }

    /// Start counting at `first` (zero is bumped to 1).
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first.max(1)),
        }
    }

    /// Continue after the highest number already persisted.
    ///
    /// With nothing persisted yet the sequence starts at [`Self::FIRST`].
    pub fn resume_after(last: Option<OrderNumber>) -> Self {
        match last {
            Some(last) => Self {
                next: AtomicU32::new(last.get().checked_add(1).unwrap_or(EXHAUSTED)),
            },
            None => Self::new(),
        }
    }

    /// The number the next call to `next_order_number` will return, if any.
    pub fn peek(&self) -> Option<OrderNumber> {
        OrderNumber::new(self.next.load(Ordering::SeqCst)).ok()
    }
}

impl Default for AtomicOrderNumbers {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderNumberSequence for AtomicOrderNumbers {
    fn next_order_number(&self) -> DomainResult<OrderNumber> {
        let taken = self
            .next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |next| {
                (next != EXHAUSTED).then(|| next.checked_add(1).unwrap_or(EXHAUSTED))
            })
            .map_err(|_| DomainError::invalid_state("order numbers exhausted"))?;

        OrderNumber::new(taken)
    }
}
