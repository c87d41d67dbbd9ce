//! # Cart
//!
//! The cart as an explicit state container. Every mutation is a method
//! returning a typed result; pricing is derived on read through a
//! [`PricingPolicy`], so the cart never caches totals.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Operations                                   │
//! │                                                                         │
//! │  Shopper Action           Method                  State Change          │
//! │  ──────────────           ──────                  ────────────          │
//! │                                                                         │
//! │  Add to cart ────────────► add() ───────────────► push or merge qty    │
//! │  Type a quantity ────────► set_quantity() ──────► qty = n (n ≥ 1)      │
//! │  Click + / − ────────────► increment/decrement ─► qty ± 1 (floor 1)    │
//! │  Click remove ───────────► remove() ────────────► line deleted         │
//! │  Order placed ───────────► clear() ─────────────► empty                │
//! │                                                                         │
//! │  View totals ────────────► pricing(policy, area) (read only)           │
//! │                                                                         │
//! │  Lines are keyed by (product_id, size, color).                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::pricing::{PricingPolicy, PricingResult};
use crate::types::{DeliveryArea, LineItem, LineKey};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A shopper's cart.
///
/// ## Invariants
/// - Lines are unique by [`LineKey`]; adding an existing key merges quantity
/// - Every line has `1 ≤ quantity ≤ MAX_ITEM_QUANTITY`
/// - At most `MAX_CART_ITEMS` lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Lines in display (insertion) order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Adds a line, or merges its quantity into an existing line with the
    /// same key.
    ///
    /// ## Arguments
    /// * `item` - The selection; its quantity is the amount to add
    /// * `available` - Stock for the selection, when known. The merged
    ///   quantity may not exceed it.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::{Cart, LineItem, Money};
    ///
    /// let mut cart = Cart::new();
    /// let tee = LineItem::new("tee", "Tee", Money::from_taka(450), 2);
    ///
    /// cart.add(tee.clone(), Some(5)).unwrap();
    /// cart.add(tee.clone(), Some(5)).unwrap();
    /// assert_eq!(cart.items()[0].quantity, 4);
    ///
    /// // Only 1 more left in stock
    /// assert!(cart.add(tee, Some(5)).is_err());
    /// ```
    pub fn add(&mut self, item: LineItem, available: Option<i64>) -> CoreResult<()> {
        if item.quantity < 1 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let key = item.key();
        let existing = self.position(&key);
        let current = existing.map(|i| self.items[i].quantity).unwrap_or(0);
        let merged = current + item.quantity;

        if merged > MAX_ITEM_QUANTITY {
            return Err(quantity_out_of_range());
        }

        if let Some(available) = available {
            if merged > available {
                return Err(CoreError::InsufficientStock {
                    name: item.name,
                    available: available.max(0),
                    requested: merged,
                });
            }
        }

        match existing {
            Some(i) => self.items[i].quantity = merged,
            None => {
                if self.items.len() >= MAX_CART_ITEMS {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_ITEMS,
                    });
                }
                self.items.push(item);
            }
        }

        Ok(())
    }

    /// Sets a line's quantity.
    ///
    /// Quantities below 1 are rejected, not clamped: removing a line is
    /// [`Cart::remove`].
    pub fn set_quantity(&mut self, key: &LineKey, quantity: i64) -> CoreResult<()> {
        if quantity < 1 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        if quantity > MAX_ITEM_QUANTITY {
            return Err(quantity_out_of_range());
        }

        let line = self.line_mut(key)?;
        line.quantity = quantity;
        Ok(())
    }

    /// Adds one to a line.
    pub fn increment(&mut self, key: &LineKey) -> CoreResult<()> {
        let line = self.line_mut(key)?;
        if line.quantity >= MAX_ITEM_QUANTITY {
            return Err(quantity_out_of_range());
        }
        line.quantity += 1;
        Ok(())
    }

    /// Takes one from a line, stopping at 1.
    pub fn decrement(&mut self, key: &LineKey) -> CoreResult<()> {
        let line = self.line_mut(key)?;
        line.quantity = (line.quantity - 1).max(1);
        Ok(())
    }

    /// Removes a line and returns it.
    pub fn remove(&mut self, key: &LineKey) -> CoreResult<LineItem> {
        let index = self
            .position(key)
            .ok_or_else(|| CoreError::LineNotFound(key.product_id.clone()))?;
        Ok(self.items.remove(index))
    }

    /// Empties the cart (after a successful order).
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Quantity of non-pack lines, the figure tiers are keyed on.
    pub fn total_quantity(&self) -> i64 {
        self.items
            .iter()
            .filter(|i| !i.is_pack)
            .map(|i| i.quantity)
            .sum()
    }

    /// Prices the cart under a storefront policy.
    pub fn pricing(&self, policy: &PricingPolicy, area: Option<DeliveryArea>) -> PricingResult {
        policy.price(&self.items, area)
    }

    fn position(&self, key: &LineKey) -> Option<usize> {
        self.items.iter().position(|i| &i.key() == key)
    }

    fn line_mut(&mut self, key: &LineKey) -> CoreResult<&mut LineItem> {
        self.items
            .iter_mut()
            .find(|i| &i.key() == key)
            .ok_or_else(|| CoreError::LineNotFound(key.product_id.clone()))
    }
}

fn quantity_out_of_range() -> CoreError {
    ValidationError::OutOfRange {
        field: "quantity".to_string(),
        min: 1,
        max: MAX_ITEM_QUANTITY,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Money;

    fn shirt(qty: i64) -> LineItem {
        LineItem::new("shirt", "Shirt", Money::from_taka(1000), qty)
    }

    #[test]
    fn test_add_merges_same_key() {
        let mut cart = Cart::new();
        cart.add(shirt(2), None).unwrap();
        cart.add(shirt(3), None).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_variants_are_separate_lines() {
        let mut cart = Cart::new();
        cart.add(shirt(1).with_variant(Some("M"), Some("Black")), None).unwrap();
        cart.add(shirt(1).with_variant(Some("L"), Some("Black")), None).unwrap();

        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_add_respects_stock() {
        let mut cart = Cart::new();
        cart.add(shirt(2), Some(3)).unwrap();

        let err = cart.add(shirt(2), Some(3)).unwrap_err();
        assert_eq!(err.to_string(), "Only 3 items available for 'Shirt'");
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        let mut cart = Cart::new();
        assert!(cart.add(shirt(0), None).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_rejects_below_one() {
        let mut cart = Cart::new();
        cart.add(shirt(2), None).unwrap();
        let key = shirt(1).key();

        assert!(cart.set_quantity(&key, 0).is_err());
        assert_eq!(cart.items()[0].quantity, 2);

        cart.set_quantity(&key, 7).unwrap();
        assert_eq!(cart.items()[0].quantity, 7);
    }

    #[test]
    fn test_increment_and_decrement_floor_at_one() {
        let mut cart = Cart::new();
        cart.add(shirt(1), None).unwrap();
        let key = shirt(1).key();

        cart.increment(&key).unwrap();
        assert_eq!(cart.items()[0].quantity, 2);

        cart.decrement(&key).unwrap();
        cart.decrement(&key).unwrap();
        assert_eq!(cart.items()[0].quantity, 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(shirt(1), None).unwrap();
        cart.add(LineItem::new("cap", "Cap", Money::from_taka(300), 1), None)
            .unwrap();

        let removed = cart.remove(&shirt(1).key()).unwrap();
        assert_eq!(removed.product_id, "shirt");
        assert!(cart.remove(&shirt(1).key()).is_err());

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_pricing_is_derived() {
        let mut cart = Cart::new();
        let policy = PricingPolicy::percentage_tiers();
        cart.add(shirt(2), None).unwrap();

        let before = cart.pricing(&policy, Some(DeliveryArea::Inside));
        assert_eq!(before.delivery_charge, Money::from_taka(80));

        cart.increment(&shirt(1).key()).unwrap();
        let after = cart.pricing(&policy, Some(DeliveryArea::Inside));
        assert!(after.free_delivery);
        assert_eq!(after.discount, Money::from_taka(90));
    }
}
