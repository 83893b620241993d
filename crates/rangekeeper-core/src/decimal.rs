//! Precision-safe numeric newtypes.
//!
//! Prices and token amounts are never passed around as bare `Decimal` or
//! `f64` — wrapping them keeps unit confusion (price vs. amount, bps vs.
//! fraction) out of the type system's blind spot.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A USD or token-denominated price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

/// A token-denominated amount, always non-negative by construction at the
/// call sites that matter (withdrawals, swap sizes); the type itself does
/// not enforce non-negativity since intermediate deltas can be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

macro_rules! decimal_newtype {
    ($ty:ident) => {
        impl $ty {
            pub const ZERO: $ty = $ty(Decimal::ZERO);

            #[must_use]
            pub fn new(value: Decimal) -> Self {
                Self(value)
            }

            #[must_use]
            pub fn inner(&self) -> Decimal {
                self.0
            }

            #[must_use]
            pub fn is_zero(&self) -> bool {
                self.0.is_zero()
            }

            #[must_use]
            pub fn abs(&self) -> Self {
                Self(self.0.abs())
            }

            /// Basis points of `self` relative to `base` (`self / base * 10_000`).
            #[must_use]
            pub fn bps_of(&self, base: $ty) -> Decimal {
                if base.0.is_zero() {
                    return Decimal::ZERO;
                }
                (self.0 / base.0) * Decimal::from(10_000)
            }

            /// Percentage of `self` relative to `base` (`self / base * 100`).
            #[must_use]
            pub fn pct_of(&self, base: $ty) -> Decimal {
                if base.0.is_zero() {
                    return Decimal::ZERO;
                }
                (self.0 / base.0) * Decimal::from(100)
            }

            /// True if `self` is below `threshold` — used to suppress
            /// dust-sized swaps and transfers.
            #[must_use]
            pub fn is_dust(&self, threshold: $ty) -> bool {
                self.0.abs() < threshold.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $ty {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self> {
                Decimal::from_str(s)
                    .map($ty)
                    .map_err(|e| CoreError::DecimalParse(e.into()))
            }
        }

        impl From<Decimal> for $ty {
            fn from(value: Decimal) -> Self {
                Self(value)
            }
        }

        impl Add for $ty {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $ty {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<Decimal> for $ty {
            type Output = Self;
            fn mul(self, rhs: Decimal) -> Self {
                Self(self.0 * rhs)
            }
        }

        impl Div<Decimal> for $ty {
            type Output = Self;
            fn div(self, rhs: Decimal) -> Self {
                Self(self.0 / rhs)
            }
        }
    };
}

decimal_newtype!(Price);
decimal_newtype!(Amount);

impl Amount {
    /// Converts a raw on-chain integer amount (as produced by an ERC-20
    /// `balanceOf`/`Transfer` value) into a human-scaled `Amount` given the
    /// token's decimals.
    #[must_use]
    pub fn from_raw(raw: u128, decimals: u8) -> Self {
        let scale = Decimal::from(10u128.pow(decimals as u32));
        Self(Decimal::from(raw) / scale)
    }

    /// Notional value of this amount at `price`.
    #[must_use]
    pub fn notional(&self, price: Price) -> Price {
        Price(self.0 * price.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn bps_of_computes_relative_deviation() {
        let a = Price::new(dec!(1020));
        let b = Price::new(dec!(1000));
        let diff = Price::new(a.inner() - b.inner());
        assert_eq!(diff.bps_of(b), dec!(200));
    }

    #[test]
    fn is_dust_below_threshold() {
        let threshold = Amount::new(dec!(5));
        assert!(Amount::new(dec!(1)).is_dust(threshold));
        assert!(!Amount::new(dec!(10)).is_dust(threshold));
    }

    #[test]
    fn from_raw_scales_by_decimals() {
        let amt = Amount::from_raw(1_500_000, 6);
        assert_eq!(amt.inner(), dec!(1.5));
    }

    #[test]
    fn notional_multiplies_by_price() {
        let amt = Amount::new(dec!(2));
        let price = Price::new(dec!(3000));
        assert_eq!(amt.notional(price).inner(), dec!(6000));
    }
}
