//! Integer money representation for Indian rupees.
//!
//! The backend stores all prices as whole rupees, so `Rupees` wraps a `u64`
//! rather than a decimal type. Checkout math that needs sub-rupee precision
//! (the 8% tax line) works in paise; see [`Rupees::as_paise`].

use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

use serde::{Deserialize, Serialize};

/// An amount of whole Indian rupees.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Rupees(u64);

impl Rupees {
    /// Zero rupees.
    pub const ZERO: Self = Self(0);

    /// Create an amount from whole rupees.
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Get the amount in whole rupees.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Get the amount in paise (1 rupee = 100 paise).
    ///
    /// This is also the unit the payment processor expects for line items.
    #[must_use]
    pub const fn as_paise(&self) -> u64 {
        self.0 * 100
    }
}

impl Add for Rupees {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Rupees {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<u64> for Rupees {
    type Output = Self;

    fn mul(self, quantity: u64) -> Self {
        Self(self.0.saturating_mul(quantity))
    }
}

impl Sum for Rupees {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl std::fmt::Display for Rupees {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "₹{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let price = Rupees::new(250);
        assert_eq!(price * 2, Rupees::new(500));
        assert_eq!(price + Rupees::new(50), Rupees::new(300));

        let total: Rupees = [Rupees::new(250), Rupees::new(300)].into_iter().sum();
        assert_eq!(total, Rupees::new(550));
    }

    #[test]
    fn test_paise_conversion() {
        assert_eq!(Rupees::new(50).as_paise(), 5_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Rupees::new(250).to_string(), "₹250");
    }
}
