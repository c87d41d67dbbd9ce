//! # Domain Types
//!
//! Types shared by the cart, the pricing engine, the checkout validator and
//! the persistence layer.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │     Order       │   │    Product      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │   │  id (UUID)      │   │  id             │       │
//! │  │  size / color   │   │  customer_phone │   │  price_poisha   │       │
//! │  │  unit_price     │   │  status         │   │  stock          │       │
//! │  │  quantity ≥ 1   │   │  total_poisha   │   │  variants[]     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DeliveryArea   │   │  OrderStatus    │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Inside         │   │  PENDING        │   │  COD            │       │
//! │  │  Outside        │   │  CONFIRMED ...  │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Order items copy name and unit price from the catalog at checkout time,
//! so later catalog edits never rewrite a placed order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Delivery Area
// =============================================================================

/// Where the parcel is delivered. Each area has its own flat fee.
///
/// An unset area is `Option<DeliveryArea>::None`; checkout rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryArea {
    /// Inside the storefront's home city.
    Inside,
    /// Anywhere else in the country.
    Outside,
}

impl DeliveryArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryArea::Inside => "inside",
            DeliveryArea::Outside => "outside",
        }
    }
}

impl fmt::Display for DeliveryArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryArea {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inside" | "inside_dhaka" => Ok(DeliveryArea::Inside),
            "outside" | "outside_dhaka" => Ok(DeliveryArea::Outside),
            other => Err(ValidationError::InvalidFormat {
                field: "area".to_string(),
                reason: format!("unknown delivery area '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// Identity of a cart line: the same product in another size or colour is a
/// separate line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: String,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// A product selection in a cart or an order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    /// Always ≥ 1 inside a [`crate::Cart`].
    pub quantity: i64,
    pub size: Option<String>,
    pub color: Option<String>,
    pub image_url: Option<String>,
    /// Pre-built bundles are priced as-is and never count toward tiers.
    #[serde(default)]
    pub is_pack: bool,
}

impl LineItem {
    /// Creates a plain (non-pack, no variant) line.
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: i64,
    ) -> Self {
        LineItem {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            quantity,
            size: None,
            color: None,
            image_url: None,
            is_pack: false,
        }
    }

    /// Sets the selected size and colour.
    pub fn with_variant(mut self, size: Option<&str>, color: Option<&str>) -> Self {
        self.size = size.map(str::to_string);
        self.color = color.map(str::to_string);
        self
    }

    /// Sets the image shown in the cart and stored on the order item.
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Marks the line as a pre-built pack.
    pub fn as_pack(mut self) -> Self {
        self.is_pack = true;
        self
    }

    /// Returns the line's identity in a cart.
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id.clone(),
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Customer Details
// =============================================================================

/// Contact and delivery details typed into the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub area: Option<DeliveryArea>,
    #[serde(default)]
    pub email: Option<String>,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle of a placed order. Checkout only ever creates `Pending`;
/// the other transitions happen in the back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Accepted, waiting for the shop to confirm by phone.
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentMethod {
    /// Cash collected by the courier.
    #[default]
    #[serde(rename = "COD")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "COD"))]
    CashOnDelivery,
}

// =============================================================================
// Catalog
// =============================================================================

/// Stock held for one size/colour combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub product_id: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub stock: i64,
}

/// A catalog product of one storefront.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub storefront_id: String,
    pub name: String,
    pub price_poisha: i64,
    /// Flat stock, used when the product has no matching variant row.
    pub stock: i64,
    pub is_pack: bool,
    pub image_url: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    /// Loaded separately from `product_variants`.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// Returns the catalog price.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_poisha(self.price_poisha)
    }

    /// Stock available for a size/colour selection.
    ///
    /// ## Lookup Order
    /// ```text
    /// exact (size, color) variant ──► found? use its stock
    ///          │ no
    ///          ▼
    /// product has no variants? ──► flat product stock
    ///          │ no
    ///          ▼
    /// 0  (the combination is not offered)
    /// ```
    pub fn available_stock(&self, size: Option<&str>, color: Option<&str>) -> i64 {
        if self.variants.is_empty() {
            return self.stock;
        }

        self.variants
            .iter()
            .find(|v| v.size.as_deref() == size && v.color.as_deref() == color)
            .map(|v| v.stock)
            .unwrap_or(0)
    }

    /// Checks whether `quantity` units of a selection can be sold.
    pub fn can_sell(&self, size: Option<&str>, color: Option<&str>, quantity: i64) -> bool {
        self.is_active && self.available_stock(size, color) >= quantity
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A shopper, identified by normalised phone number.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub storefront_id: String,
    pub customer_id: String,
    /// Normalised `01XXXXXXXXX`.
    pub customer_phone: String,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_area: DeliveryArea,
    pub customer_email: Option<String>,
    pub subtotal_poisha: i64,
    pub discount_poisha: i64,
    pub delivery_charge_poisha: i64,
    pub total_poisha: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_poisha(self.total_poisha)
    }
}

/// A line of a placed order (snapshot of the catalog at checkout).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at checkout (frozen).
    pub name: String,
    /// Catalog unit price at checkout (frozen).
    pub unit_price_poisha: i64,
    pub quantity: i64,
    pub line_total_poisha: i64,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
    pub image_url: Option<String>,
}

// =============================================================================
// Notification Outbox
// =============================================================================

/// Outbox kind written when an order is placed.
pub const ORDER_PLACED: &str = "ORDER_PLACED";

/// A pending side effect, written in the same transaction as its order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct NotificationOutboxEntry {
    pub id: String,
    /// e.g. [`ORDER_PLACED`].
    pub kind: String,
    pub order_id: String,
    /// JSON body for the notifier.
    pub payload: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub attempted_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub sent_at: Option<DateTime<Utc>>,
}

/// Payload of an [`ORDER_PLACED`] outbox entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlaced {
    pub order_id: String,
    pub storefront_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub email: Option<String>,
    pub total: Money,
    pub status: OrderStatus,
    pub items_count: usize,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, variants: Vec<ProductVariant>) -> Product {
        Product {
            id: "p-1".to_string(),
            storefront_id: "stylehunt".to_string(),
            name: "Hejel Scarf".to_string(),
            price_poisha: 55_000,
            stock,
            is_pack: false,
            image_url: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            variants,
        }
    }

    fn variant(size: &str, color: &str, stock: i64) -> ProductVariant {
        ProductVariant {
            product_id: "p-1".to_string(),
            size: Some(size.to_string()),
            color: Some(color.to_string()),
            stock,
        }
    }

    #[test]
    fn test_delivery_area_parsing() {
        assert_eq!("inside".parse::<DeliveryArea>().unwrap(), DeliveryArea::Inside);
        assert_eq!(" Outside ".parse::<DeliveryArea>().unwrap(), DeliveryArea::Outside);
        assert!("mars".parse::<DeliveryArea>().is_err());
    }

    #[test]
    fn test_delivery_area_serde() {
        let json = serde_json::to_string(&DeliveryArea::Inside).unwrap();
        assert_eq!(json, "\"inside\"");
        let area: Option<DeliveryArea> = serde_json::from_str("null").unwrap();
        assert!(area.is_none());
    }

    #[test]
    fn test_line_key_includes_variant() {
        let plain = LineItem::new("p-1", "Scarf", Money::from_taka(550), 1);
        let red = plain.clone().with_variant(Some("M"), Some("Red"));
        assert_ne!(plain.key(), red.key());
        assert_eq!(red.line_total(), Money::from_taka(550));
    }

    #[test]
    fn test_flat_stock_without_variants() {
        let p = product(7, vec![]);
        assert_eq!(p.available_stock(Some("M"), None), 7);
        assert!(p.can_sell(None, None, 7));
        assert!(!p.can_sell(None, None, 8));
    }

    #[test]
    fn test_variant_stock() {
        let p = product(100, vec![variant("M", "Red", 2), variant("L", "Red", 0)]);
        assert_eq!(p.available_stock(Some("M"), Some("Red")), 2);
        assert_eq!(p.available_stock(Some("L"), Some("Red")), 0);
        // Combination not offered
        assert_eq!(p.available_stock(Some("XL"), Some("Blue")), 0);
    }

    #[test]
    fn test_inactive_product_cannot_sell() {
        let mut p = product(10, vec![]);
        p.is_active = false;
        assert!(!p.can_sell(None, None, 1));
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&OrderStatus::Pending).unwrap(), "\"PENDING\"");
        assert_eq!(OrderStatus::default().as_str(), "PENDING");
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(),
            "\"COD\""
        );
    }
}
