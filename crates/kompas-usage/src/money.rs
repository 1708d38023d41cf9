// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-point monetary amounts and the single cent-rounding rule.
//!
//! Running sums are kept as integer nano-units so that adding the same
//! records in any order yields the same total. Conversion to a two-decimal
//! `f64` happens only through [`Amount::rounded`], which every exposed
//! figure goes through exactly once.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Nano-units per whole currency unit.
pub const NANOS_PER_UNIT: u64 = 1_000_000_000;

const NANOS_PER_CENT: u64 = NANOS_PER_UNIT / 100;

/// A non-negative amount of money at nano-unit precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount {
    nanos: u64,
}

impl Amount {
    pub const ZERO: Amount = Amount { nanos: 0 };

    pub fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Quantize a float amount. Negative, NaN and infinite inputs become zero.
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Self::ZERO;
        }
        let nanos = (value * NANOS_PER_UNIT as f64).round();
        if nanos >= u64::MAX as f64 {
            Self { nanos: u64::MAX }
        } else {
            Self {
                nanos: nanos as u64,
            }
        }
    }

    pub fn nanos(self) -> u64 {
        self.nanos
    }

    /// Unrounded value, for arithmetic that feeds another rounded figure.
    pub fn to_f64(self) -> f64 {
        self.nanos as f64 / NANOS_PER_UNIT as f64
    }

    /// Round half away from zero to whole cents.
    pub fn cents(self) -> u64 {
        self.nanos / NANOS_PER_CENT + u64::from(self.nanos % NANOS_PER_CENT >= NANOS_PER_CENT / 2)
    }

    /// The two-decimal figure exposed outside the engine.
    pub fn rounded(self) -> f64 {
        self.cents() as f64 / 100.0
    }

    /// Difference saturating at zero.
    pub fn saturating_sub(self, other: Amount) -> Amount {
        Self {
            nanos: self.nanos.saturating_sub(other.nanos),
        }
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount {
            nanos: self.nanos.saturating_add(rhs.nanos),
        }
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

/// Round a non-negative derived figure (USD total, percentage) to two decimals.
pub fn round_cents(value: f64) -> f64 {
    Amount::from_f64(value).rounded()
}

/// Convert a EUR amount to USD at a fixed EUR-per-USD rate, rounded to cents.
pub fn eur_to_usd(eur: Amount, usd_to_eur: f64) -> f64 {
    if usd_to_eur <= 0.0 {
        return 0.0;
    }
    round_cents(eur.to_f64() / usd_to_eur)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_up_at_cent_boundary() {
        assert_eq!(Amount::from_f64(0.005).rounded(), 0.01);
        assert_eq!(Amount::from_f64(0.0049).rounded(), 0.0);
        assert_eq!(Amount::from_f64(1.005).rounded(), 1.01);
        assert_eq!(Amount::from_f64(2.675).rounded(), 2.68);
    }

    #[test]
    fn sum_then_round_differs_from_round_then_sum() {
        let parts = [Amount::from_f64(0.004), Amount::from_f64(0.003)];
        let summed: Amount = parts.iter().copied().sum();
        assert_eq!(summed.rounded(), 0.01);
        let naive: f64 = parts.iter().map(|a| a.rounded()).sum();
        assert_eq!(naive, 0.0);
    }

    #[test]
    fn negative_and_nan_quantize_to_zero() {
        assert_eq!(Amount::from_f64(-3.2), Amount::ZERO);
        assert_eq!(Amount::from_f64(f64::NAN), Amount::ZERO);
        assert_eq!(Amount::from_f64(f64::INFINITY), Amount::ZERO);
    }

    #[test]
    fn rounded_value_is_stable_under_reparse() {
        for raw in [0.012, 12.345_678, 99.995, 1234.5] {
            let rounded = Amount::from_f64(raw).rounded();
            let reparsed: f64 = rounded.to_string().parse().unwrap();
            assert_eq!(reparsed, rounded);
            assert_eq!(Amount::from_f64(reparsed).rounded(), rounded);
        }
    }

    #[test]
    fn usd_conversion_uses_fixed_rate() {
        let eur = Amount::from_f64(9.2);
        assert_eq!(eur_to_usd(eur, 0.92), 10.0);
        assert_eq!(eur_to_usd(eur, 0.0), 0.0);
    }

    #[test]
    fn saturating_sub_floors_at_zero() {
        let small = Amount::from_f64(1.0);
        let large = Amount::from_f64(2.5);
        assert_eq!(small.saturating_sub(large), Amount::ZERO);
        assert_eq!(large.saturating_sub(small).rounded(), 1.5);
    }
}
