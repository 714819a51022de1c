//! Fare policies for pricing a trip at request time.

use crate::domain::trip::Fare;
use crate::error::{DispatchError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Flat fare charged for every trip, in currency units.
pub const DEFAULT_FLAT_FARE: Decimal = dec!(70);

/// Prices a trip from its endpoints.
///
/// Called exactly once per trip, before it is queued, so implementations
/// must be pure and must not block.
pub trait FarePolicy: Send + Sync {
    fn compute_fare(&self, start_location: &str, destination: &str) -> Fare;
}

/// Charges the same amount regardless of route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatFare {
    amount: Fare,
}

impl FlatFare {
    pub fn new(amount: Decimal) -> Result<Self> {
        Ok(Self {
            amount: Fare::new(amount)?,
        })
    }
}

impl Default for FlatFare {
    fn default() -> Self {
        Self {
            amount: Fare::new_unchecked(DEFAULT_FLAT_FARE),
        }
    }
}

impl FarePolicy for FlatFare {
    fn compute_fare(&self, _start_location: &str, _destination: &str) -> Fare {
        self.amount
    }
}

/// Scales another policy's fare by a fixed multiplier, rounded to cents.
#[derive(Debug, Clone)]
pub struct SurgeFare<P> {
    inner: P,
    multiplier: Decimal,
}

impl<P: FarePolicy> SurgeFare<P> {
    /// `multiplier` must be at least one; surge never discounts.
    pub fn new(inner: P, multiplier: Decimal) -> Result<Self> {
        if multiplier < Decimal::ONE {
            return Err(DispatchError::InvalidArgument(format!(
                "surge multiplier must be >= 1, got {multiplier}"
            )));
        }
        Ok(Self { inner, multiplier })
    }
}

impl<P: FarePolicy> FarePolicy for SurgeFare<P> {
    fn compute_fare(&self, start_location: &str, destination: &str) -> Fare {
        let base = self.inner.compute_fare(start_location, destination);
        let surged = (base.value() * self.multiplier).round_dp(2);
        // Both factors are non-negative, so the product is too.
        Fare::new_unchecked(surged)
    }
}
