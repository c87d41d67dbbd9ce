//! # Pricing Engine
//!
//! Maps `(items, delivery area)` under a storefront's [`PricingPolicy`] to a
//! [`PricingResult`]. Pure: no I/O, no hidden state.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          price(items, area)                             │
//! │                                                                         │
//! │  items ──► total_quantity = Σ qty of non-pack lines                     │
//! │       └──► base_subtotal  = Σ unit_price × qty of all lines             │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  ┌───────────────────────────────────────────────────────────────┐     │
//! │  │ TierShape                                                     │     │
//! │  │   Flat       : subtotal = base                                │     │
//! │  │   Pack       : ⌊q/size⌋ × pack_price + (q mod size) × unit    │     │
//! │  │                + pack lines at their own price                │     │
//! │  │   Percentage : base × (1 − rate of highest tier met)          │     │
//! │  └───────────────────────────────────────────────────────────────┘     │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  discount = max(base − subtotal, 0)                                     │
//! │  free_delivery = total_quantity ≥ threshold                             │
//! │  delivery = free ? 0 : fee[area]   (unset area → 0)                     │
//! │  total = subtotal + delivery                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! Every step is a sum or a function of sums, so reordering the items never
//! changes the result, and calling twice with the same input returns the
//! same output.

use serde::Serialize;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{DeliveryArea, LineItem};

// =============================================================================
// Defaults
// =============================================================================

/// Quantity at which delivery becomes free.
pub const DEFAULT_FREE_DELIVERY_THRESHOLD: i64 = 3;

/// Delivery fee inside the home city, in taka.
pub const DEFAULT_INSIDE_FEE_TAKA: i64 = 80;

/// Delivery fee elsewhere, in taka.
pub const DEFAULT_OUTSIDE_FEE_TAKA: i64 = 120;

// =============================================================================
// Policy Types
// =============================================================================

/// One percentage tier: buying at least `min_quantity` items takes
/// `discount_bps` basis points off the base subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentTier {
    pub min_quantity: i64,
    pub discount_bps: u32,
}

/// The quantity-discount shape a storefront uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierShape {
    /// No quantity discount.
    Flat,

    /// Fixed price per bundle of `pack_size`, `unit_price` for the rest.
    ///
    /// Tier-eligible lines are priced from `unit_price` alone; the catalog
    /// price of those lines only feeds `base_subtotal`.
    Pack {
        pack_size: i64,
        pack_price: Money,
        unit_price: Money,
    },

    /// Percentage off the whole base subtotal.
    Percentage { tiers: Vec<PercentTier> },
}

/// Flat delivery fee per area. Never computed from distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryFees {
    pub inside: Money,
    pub outside: Money,
}

impl DeliveryFees {
    pub fn fee(&self, area: DeliveryArea) -> Money {
        match area {
            DeliveryArea::Inside => self.inside,
            DeliveryArea::Outside => self.outside,
        }
    }
}

impl Default for DeliveryFees {
    fn default() -> Self {
        DeliveryFees {
            inside: Money::from_taka(DEFAULT_INSIDE_FEE_TAKA),
            outside: Money::from_taka(DEFAULT_OUTSIDE_FEE_TAKA),
        }
    }
}

/// A storefront's pricing rules.
///
/// ## Example
/// ```rust
/// use storefront_core::pricing::PricingPolicy;
/// use storefront_core::types::LineItem;
/// use storefront_core::Money;
///
/// let policy = PricingPolicy::pack_pricing(6, Money::from_taka(1350), Money::from_taka(250));
/// let items = vec![LineItem::new("dates", "Dates 500g", Money::from_taka(250), 7)];
///
/// let quote = policy.price(&items, None);
/// assert_eq!(quote.subtotal, Money::from_taka(1600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPolicy {
    pub tiers: TierShape,
    /// `None` disables free delivery.
    pub free_delivery_threshold: Option<i64>,
    pub delivery_fees: DeliveryFees,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy::new(TierShape::Flat)
    }
}

impl PricingPolicy {
    /// Creates a policy with the default free-delivery threshold and fees.
    pub fn new(tiers: TierShape) -> Self {
        PricingPolicy {
            tiers,
            free_delivery_threshold: Some(DEFAULT_FREE_DELIVERY_THRESHOLD),
            delivery_fees: DeliveryFees::default(),
        }
    }

    /// Pack pricing (shape A).
    pub fn pack_pricing(pack_size: i64, pack_price: Money, unit_price: Money) -> Self {
        PricingPolicy::new(TierShape::Pack {
            pack_size,
            pack_price,
            unit_price,
        })
    }

    /// Percentage tiers (shape B) with the standard 6+ → 5%, 3+ → 3% ladder.
    pub fn percentage_tiers() -> Self {
        PricingPolicy::new(TierShape::Percentage {
            tiers: vec![
                PercentTier {
                    min_quantity: 6,
                    discount_bps: 500,
                },
                PercentTier {
                    min_quantity: 3,
                    discount_bps: 300,
                },
            ],
        })
    }

    /// Sets the free-delivery threshold.
    pub fn with_free_delivery_threshold(mut self, threshold: Option<i64>) -> Self {
        self.free_delivery_threshold = threshold;
        self
    }

    /// Sets the per-area delivery fees.
    pub fn with_delivery_fees(mut self, inside: Money, outside: Money) -> Self {
        self.delivery_fees = DeliveryFees { inside, outside };
        self
    }

    /// Discount rate for a quantity under percentage tiers, in basis points.
    ///
    /// The tier with the largest `min_quantity` not above `total_quantity`
    /// wins. Other shapes return 0.
    pub fn discount_bps(&self, total_quantity: i64) -> u32 {
        match &self.tiers {
            TierShape::Percentage { tiers } => tiers
                .iter()
                .filter(|t| total_quantity >= t.min_quantity)
                .max_by_key(|t| t.min_quantity)
                .map(|t| t.discount_bps)
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// Whether a quantity qualifies for free delivery.
    pub fn is_free_delivery(&self, total_quantity: i64) -> bool {
        self.free_delivery_threshold
            .is_some_and(|threshold| total_quantity >= threshold)
    }

    /// Prices a set of line items.
    ///
    /// ## Edge Cases
    /// - Empty cart: every amount is zero, delivery included.
    /// - Unset area: delivery is zero (checkout rejects the area separately).
    pub fn price(&self, items: &[LineItem], area: Option<DeliveryArea>) -> PricingResult {
        if items.is_empty() {
            return PricingResult::default();
        }

        let total_quantity: i64 = items
            .iter()
            .filter(|item| !item.is_pack)
            .map(|item| item.quantity)
            .sum();
        let base_subtotal: Money = items.iter().map(LineItem::line_total).sum();

        let subtotal = match &self.tiers {
            TierShape::Flat => base_subtotal,
            TierShape::Pack {
                pack_size,
                pack_price,
                unit_price,
            } => {
                let pack_lines: Money = items
                    .iter()
                    .filter(|item| item.is_pack)
                    .map(LineItem::line_total)
                    .sum();
                pack_lines + pack_subtotal(total_quantity, *pack_size, *pack_price, *unit_price)
            }
            TierShape::Percentage { .. } => {
                base_subtotal.apply_percentage_discount(self.discount_bps(total_quantity))
            }
        };

        let discount = (base_subtotal - subtotal).clamp_non_negative();
        let free_delivery = self.is_free_delivery(total_quantity);
        let delivery_charge = match area {
            _ if free_delivery => Money::zero(),
            Some(area) => self.delivery_fees.fee(area),
            None => Money::zero(),
        };

        PricingResult {
            base_subtotal,
            discount,
            subtotal,
            delivery_charge,
            total: subtotal + delivery_charge,
            total_quantity,
            free_delivery,
        }
    }
}

/// Shape A arithmetic for `quantity` tier-eligible units.
fn pack_subtotal(quantity: i64, pack_size: i64, pack_price: Money, unit_price: Money) -> Money {
    if pack_size <= 0 || quantity < pack_size {
        return unit_price * quantity;
    }

    let packs = quantity / pack_size;
    let remainder = quantity % pack_size;
    pack_price * packs + unit_price * remainder
}

// =============================================================================
// Pricing Result
// =============================================================================

/// Derived pricing of a cart. Recomputed on every read, never stored as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    /// Σ unit price × quantity.
    pub base_subtotal: Money,
    /// `base_subtotal − subtotal`, never negative.
    pub discount: Money,
    /// After tier pricing.
    pub subtotal: Money,
    pub delivery_charge: Money,
    pub total: Money,
    /// Quantity of non-pack items (drives tiers and free delivery).
    pub total_quantity: i64,
    pub free_delivery: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn taka(n: i64) -> Money {
        Money::from_taka(n)
    }

    fn item(id: &str, price: i64, qty: i64) -> LineItem {
        LineItem::new(id, id, taka(price), qty)
    }

    fn bengolsale() -> PricingPolicy {
        PricingPolicy::pack_pricing(6, taka(1350), taka(250))
    }

    #[test]
    fn test_pack_pricing_examples() {
        let policy = bengolsale();

        assert_eq!(policy.price(&[item("a", 250, 6)], None).subtotal, taka(1350));
        assert_eq!(policy.price(&[item("a", 250, 7)], None).subtotal, taka(1600));
        assert_eq!(policy.price(&[item("a", 250, 5)], None).subtotal, taka(1250));
    }

    #[test]
    fn test_pack_pricing_across_products() {
        let policy = bengolsale();
        let items = vec![item("a", 250, 4), item("b", 250, 4)];

        let quote = policy.price(&items, Some(DeliveryArea::Inside));
        // 8 units = 1 pack + 2 singles
        assert_eq!(quote.subtotal, taka(1350 + 500));
        assert_eq!(quote.base_subtotal, taka(2000));
        assert_eq!(quote.discount, taka(150));
    }

    #[test]
    fn test_percentage_examples() {
        let policy = PricingPolicy::percentage_tiers();

        let six = policy.price(&[item("a", 500, 6)], None);
        assert_eq!(six.base_subtotal, taka(3000));
        assert_eq!(six.discount, taka(150));
        assert_eq!(six.subtotal, taka(2850));

        let four = policy.price(&[item("a", 750, 4)], None);
        assert_eq!(four.base_subtotal, taka(3000));
        assert_eq!(four.discount, taka(90));

        let two = policy.price(&[item("a", 1500, 2)], None);
        assert_eq!(two.discount, Money::zero());
    }

    #[test]
    fn test_highest_tier_wins_regardless_of_declaration_order() {
        let policy = PricingPolicy::new(TierShape::Percentage {
            tiers: vec![
                PercentTier {
                    min_quantity: 3,
                    discount_bps: 300,
                },
                PercentTier {
                    min_quantity: 6,
                    discount_bps: 500,
                },
            ],
        });
        assert_eq!(policy.discount_bps(10), 500);
        assert_eq!(policy.discount_bps(3), 300);
        assert_eq!(policy.discount_bps(2), 0);
    }

    #[test]
    fn test_free_delivery_ignores_area() {
        let policy = PricingPolicy::percentage_tiers();
        let items = vec![item("a", 100, 2), item("b", 100, 1)];

        for area in [None, Some(DeliveryArea::Inside), Some(DeliveryArea::Outside)] {
            let quote = policy.price(&items, area);
            assert!(quote.free_delivery);
            assert_eq!(quote.delivery_charge, Money::zero());
        }
    }

    #[test]
    fn test_delivery_fee_by_area() {
        let policy = PricingPolicy::default();
        let items = vec![item("a", 400, 1)];

        let inside = policy.price(&items, Some(DeliveryArea::Inside));
        assert_eq!(inside.delivery_charge, taka(80));
        assert_eq!(inside.total, taka(480));

        let outside = policy.price(&items, Some(DeliveryArea::Outside));
        assert_eq!(outside.delivery_charge, taka(120));

        let unset = policy.price(&items, None);
        assert_eq!(unset.delivery_charge, Money::zero());
        assert_eq!(unset.total, taka(400));
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        let policy = PricingPolicy::percentage_tiers();
        let quote = policy.price(&[], Some(DeliveryArea::Outside));
        assert_eq!(quote, PricingResult::default());
    }

    #[test]
    fn test_pack_lines_excluded_from_quantity() {
        let policy = PricingPolicy::percentage_tiers();
        let items = vec![
            item("combo", 6000, 1).as_pack(),
            item("a", 1000, 2),
        ];

        let quote = policy.price(&items, Some(DeliveryArea::Inside));
        assert_eq!(quote.total_quantity, 2);
        assert!(!quote.free_delivery);
        assert_eq!(quote.discount, Money::zero());
        assert_eq!(quote.delivery_charge, taka(80));
    }

    #[test]
    fn test_pack_shape_keeps_pack_line_price() {
        let policy = bengolsale();
        let items = vec![item("box", 2000, 1).as_pack(), item("a", 250, 6)];

        let quote = policy.price(&items, None);
        assert_eq!(quote.subtotal, taka(2000 + 1350));
    }

    #[test]
    fn test_free_delivery_can_be_disabled() {
        let policy = PricingPolicy::default().with_free_delivery_threshold(None);
        let quote = policy.price(&[item("a", 100, 10)], Some(DeliveryArea::Inside));
        assert!(!quote.free_delivery);
        assert_eq!(quote.delivery_charge, taka(80));
    }

    #[test]
    fn test_order_independence() {
        let items = vec![
            item("a", 250, 2),
            item("b", 310, 1).with_variant(Some("L"), None),
            item("c", 199, 4),
            item("pack", 1800, 1).as_pack(),
        ];

        for policy in [
            PricingPolicy::default(),
            bengolsale(),
            PricingPolicy::percentage_tiers(),
        ] {
            let expected = policy.price(&items, Some(DeliveryArea::Outside));

            let mut reversed = items.clone();
            reversed.reverse();
            assert_eq!(policy.price(&reversed, Some(DeliveryArea::Outside)), expected);

            for shift in 1..items.len() {
                let mut rotated = items.clone();
                rotated.rotate_left(shift);
                assert_eq!(policy.price(&rotated, Some(DeliveryArea::Outside)), expected);
            }

            // Idempotent
            assert_eq!(policy.price(&items, Some(DeliveryArea::Outside)), expected);
        }
    }
}
