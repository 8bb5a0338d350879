//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of an order. Always positive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct OrderNumber(u32);

/// Position of a line item within its order, starting at 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct LineNumber(u32);

macro_rules! impl_positive_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a raw value, rejecting zero.
            pub fn new(value: u32) -> Result<Self, DomainError> {
                if value == 0 {
                    return Err(DomainError::invalid_argument(concat!(
                        $name,
                        " must be positive"
                    )));
                }
                Ok(Self(value))
            }

            pub fn get(&self) -> u32 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl TryFrom<u32> for $t {
            type Error = DomainError;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<i64> for $t {
            type Error = DomainError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                let raw = u32::try_from(value).map_err(|_| {
                    DomainError::invalid_argument(format!("{}: {} is out of range", $name, value))
                })?;
                Self::new(raw)
            }
        }

        impl From<$t> for u32 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                i64::from(value.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .parse::<u32>()
                    .map_err(|e| DomainError::invalid_argument(format!("{}: {}", $name, e)))?;
                Self::new(raw)
            }
        }
    };
}

impl_positive_newtype!(OrderNumber, "OrderNumber");
impl_positive_newtype!(LineNumber, "LineNumber");

impl OrderNumber {
    /// Largest representable order number.
    pub const MAX: OrderNumber = OrderNumber(u32::MAX);
}

impl LineNumber {
    /// The first line of an order.
    pub const FIRST: LineNumber = LineNumber(1);

    /// The line number following this one.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert!(matches!(
            OrderNumber::new(0),
            Err(DomainError::InvalidArgument(_))
        ));
        assert!(matches!(
            LineNumber::new(0),
            Err(DomainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn negative_and_oversized_i64_are_rejected() {
        assert!(OrderNumber::try_from(-1i64).is_err());
        assert!(OrderNumber::try_from(i64::from(u32::MAX) + 1).is_err());
        assert_eq!(OrderNumber::try_from(1000i64).unwrap().get(), 1000);
    }

    #[test]
    fn parses_from_str() {
        let n: OrderNumber = "1042".parse().unwrap();
        assert_eq!(n.get(), 1042);
        assert!("abc".parse::<OrderNumber>().is_err());
        assert!("0".parse::<LineNumber>().is_err());
    }

    #[test]
    fn serializes_as_plain_integer() {
        let n = OrderNumber::new(1000).unwrap();
        assert_eq!(serde_json::to_string(&n).unwrap(), "1000");
        let back: OrderNumber = serde_json::from_str("1000").unwrap();
        assert_eq!(back, n);
        assert!(serde_json::from_str::<OrderNumber>("0").is_err());
    }

    #[test]
    fn line_numbers_advance_by_one() {
        assert_eq!(LineNumber::FIRST.get(), 1);
        assert_eq!(LineNumber::FIRST.next().get(), 2);
    }
}
