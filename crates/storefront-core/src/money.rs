//! # Money Module
//!
//! Monetary values in poisha, the minor unit of the Bangladeshi taka
//! (100 poisha = ৳1).
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Browser carts compute 3% of ৳1,499 as 44.97 and send 1454.03 back.    │
//! │  Summing a few such lines in f64 drifts by fractions of a poisha,      │
//! │  and two sides of the wire stop agreeing on the total.                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Poisha                                           │
//! │    Prices arrive once from JSON, are converted once, and every         │
//! │    discount, fee and total after that is exact integer arithmetic.     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::money::Money;
//!
//! let price = Money::from_taka(250);
//! let line = price * 3;
//! assert_eq!(line, Money::from_taka(750));
//! assert_eq!(line.to_string(), "৳750");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Poisha per taka.
const POISHA_PER_TAKA: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in poisha.
///
/// ## Design Decisions
/// - **i64 (signed)**: discounts are computed as differences and may be
///   negative before clamping
/// - **Tuple struct**: zero-cost wrapper, serialized as a bare integer
///
/// ## Where Money is Used
/// ```text
/// Product.price_poisha ──► LineItem.unit_price ──► line total
///                                                      │
///                                     PricingPolicy ◄──┘
///                                          │
///                 base_subtotal ─► discount ─► subtotal ─► + delivery ─► total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from poisha.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let price = Money::from_poisha(25_050); // ৳250.50
    /// assert_eq!(price.poisha(), 25_050);
    /// ```
    #[inline]
    pub const fn from_poisha(poisha: i64) -> Self {
        Money(poisha)
    }

    /// Creates a Money value from whole taka.
    ///
    /// Storefront catalogs price in whole taka, so this is the common
    /// constructor in configuration and tests.
    #[inline]
    pub const fn from_taka(taka: i64) -> Self {
        Money(taka * POISHA_PER_TAKA)
    }

    /// Returns the value in poisha.
    #[inline]
    pub const fn poisha(&self) -> i64 {
        self.0
    }

    /// Returns the whole-taka portion (truncated toward zero).
    #[inline]
    pub const fn taka(&self) -> i64 {
        self.0 / POISHA_PER_TAKA
    }

    /// Returns the poisha portion (always 0-99).
    #[inline]
    pub const fn poisha_part(&self) -> i64 {
        (self.0 % POISHA_PER_TAKA).abs()
    }

    /// Returns zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let unit = Money::from_taka(250);
    /// assert_eq!(unit.multiply_quantity(5), Money::from_taka(1250));
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `bps` basis points of this amount, rounded half up.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, in i128 so large
    /// carts cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let base = Money::from_taka(3000);
    /// assert_eq!(base.percentage(500), Money::from_taka(150)); // 5%
    /// assert_eq!(base.percentage(300), Money::from_taka(90));  // 3%
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        let part = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money(part as i64)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let base = Money::from_taka(3000);
    /// assert_eq!(base.apply_percentage_discount(500), Money::from_taka(2850));
    /// ```
    pub fn apply_percentage_discount(&self, discount_bps: u32) -> Money {
        *self - self.percentage(discount_bps)
    }

    /// Returns the larger of `self` and zero.
    #[inline]
    pub fn clamp_non_negative(self) -> Money {
        if self.0 < 0 {
            Money::zero()
        } else {
            self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

// Arithmetic saturates at the i64 bounds instead of wrapping. Validation
// keeps real carts far below them.

/// Shows whole amounts as `৳1350` and fractional ones as `৳1350.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        if self.poisha_part() == 0 {
            write!(f, "{}৳{}", sign, self.taka().abs())
        } else {
            write!(f, "{}৳{}.{:02}", sign, self.taka().abs(), self.poisha_part())
        }
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
