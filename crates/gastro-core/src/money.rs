//! # Money Module
//!
//! Provides the `Money` type for euro amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Closing a drawer with floats:                                          │
//! │    150.00 + 1.20 + 1.20 + 1.20 − 4.00 = 149.59999999999997  ❌          │
//! │    → a phantom 0.00000000000003 € discrepancy on every close            │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    15000 + 120 + 120 + 120 − 400 = 14960 cents                          │
//! │    Expected cash is exact, so "balanced" means exactly zero             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gastro_core::money::Money;
//!
//! let cana = Money::from_cents(150);       // 1,50 €
//! let round = cana * 4;                    // 6,00 €
//! let with_tapa = round + Money::from_cents(250);
//! assert_eq!(with_tapa.cents(), 850);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A euro amount in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: discrepancies and VAT settlements go negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serializes as a bare integer** so stored records stay readable
///
/// ## Where Money is Used
/// ```text
/// Product.price ──► SaleLine.unit_price ──► Sale.total ──┬──► Shift.total_sales
///                                                        └──► TaxEntry (income)
/// TaxEntry.total (cash-out) ──► Shift.total_expenses
/// Shift.initial_base + cash sales − expenses ──► expected cash
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use gastro_core::money::Money;
    ///
    /// let cafe = Money::from_cents(130); // 1,30 €
    /// assert_eq!(cafe.cents(), 130);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole euros and cents.
    ///
    /// For negative amounts only the euro part carries the sign:
    /// `from_euros(-5, 50)` is -5,50 €.
    #[inline]
    pub const fn from_euros(euros: i64, cents: i64) -> Self {
        if euros < 0 {
            Money(euros * 100 - cents)
        } else {
            Money(euros * 100 + cents)
        }
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole euro portion (truncated toward zero).
    #[inline]
    pub const fn euros(&self) -> i64 {
        self.0 / 100
    }

    /// Cent portion, always 0-99.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the larger of `self` and zero.
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// Applies a rate in basis points, rounding half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use gastro_core::money::Money;
    /// use gastro_core::types::TaxRate;
    ///
    /// // 20% IRPF instalment on 1.234,56 € of profit
    /// let profit = Money::from_cents(123_456);
    /// assert_eq!(profit.percent(TaxRate::from_bps(2000)).cents(), 24_691);
    /// ```
    pub fn percent(&self, rate: TaxRate) -> Money {
        Money::from_cents(div_round(self.0 as i128 * rate.bps() as i128, 10_000))
    }

    /// Splits a VAT-inclusive amount and returns the taxable base.
    ///
    /// Spanish till prices include VAT, so the base is
    /// `total / (1 + rate)`. Computed in integer cents:
    /// `round(total × 10000 / (10000 + bps))`.
    ///
    /// ## Example
    /// ```rust
    /// use gastro_core::money::Money;
    /// use gastro_core::types::TaxRate;
    ///
    /// // A 12,10 € supplier ticket at 21%
    /// let total = Money::from_cents(1210);
    /// assert_eq!(total.net_of_tax(TaxRate::GENERAL).cents(), 1000);
    /// ```
    pub fn net_of_tax(&self, rate: TaxRate) -> Money {
        let divisor = 10_000 + rate.bps() as i128;
        Money::from_cents(div_round(self.0 as i128 * 10_000, divisor))
    }

    /// VAT contained in a VAT-inclusive amount.
    pub fn tax_included(&self, rate: TaxRate) -> Money {
        *self - self.net_of_tax(rate)
    }
}

/// Integer division rounding half away from zero.
fn div_round(numerator: i128, divisor: i128) -> i64 {
    let half = divisor / 2;
    let rounded = if numerator >= 0 {
        (numerator + half) / divisor
    } else {
        (numerator - half) / divisor
    };
    rounded as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount the way a Spanish receipt does: `12,50 €`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{},{:02} €",
            sign,
            self.euros().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by a line quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
