//! # Request / Response Bodies
//!
//! The storefront frontends send prices as taka numbers (`1350`, `1350.5`).
//! They are converted to [`Money`] once, here, and converted back only when
//! a response is written.
//!
//! Missing customer fields deserialize as empty strings so the checkout
//! gate reports them with its own message instead of a JSON error. For the
//! same reason a checkout body converts without failing: bad areas and
//! prices are left for `validate_checkout` to reject in step order.

use serde::{Deserialize, Serialize};
use tracing::warn;

use storefront_core::{
    CustomerDetails, DeliveryArea, LineItem, Money, Order, OrderItem, PricingResult,
    ValidationError,
};

use crate::services::checkout_service::CheckoutInput;

// =============================================================================
// Money conversion
// =============================================================================

/// Converts a client taka amount to poisha, rounding to the nearest poisha.
pub fn taka_to_money(field: &str, taka: f64) -> Result<Money, ValidationError> {
    if !taka.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "not a number".to_string(),
        });
    }
    if taka < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    // i64 poisha covers far beyond any plausible order
    if taka > 1e12 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 1_000_000_000_000,
        });
    }
    Ok(Money::from_poisha((taka * 100.0).round() as i64))
}

/// Converts a cart line price without range checks.
///
/// Negative amounts stay negative and huge ones saturate, so
/// `validate_price` sees them at step 3. JSON numbers are always finite.
fn line_price(taka: f64) -> Money {
    Money::from_poisha((taka * 100.0).round() as i64)
}

/// Converts an informational client amount, dropping it when unusable.
fn client_amount(field: &str, taka: Option<f64>) -> Option<Money> {
    match taka.map(|t| taka_to_money(field, t)) {
        Some(Ok(money)) => Some(money),
        Some(Err(e)) => {
            warn!(field, error = %e, "Ignoring invalid client amount");
            None
        }
        None => None,
    }
}

/// Converts poisha back to a taka number for JSON.
pub fn money_to_taka(money: Money) -> f64 {
    money.poisha() as f64 / 100.0
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// =============================================================================
// Requests
// =============================================================================

/// `POST /api/storefronts/{id}/checkout`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub customer: CustomerInput,
    #[serde(default)]
    pub items: Vec<CartItemInput>,
    /// Informational; the server prices the order itself.
    pub total: Option<f64>,
    pub delivery_charge: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    /// `"inside" | "outside" | null`
    pub area: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_pack: bool,
}

/// `POST /api/storefronts/{id}/quote`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(default)]
    pub items: Vec<CartItemInput>,
    pub area: Option<String>,
}

impl CheckoutRequest {
    pub fn into_input(self) -> CheckoutInput {
        CheckoutInput {
            customer: self.customer.into_details(),
            items: line_items(self.items),
            client_total: client_amount("total", self.total),
            client_delivery_charge: client_amount("deliveryCharge", self.delivery_charge),
        }
    }
}

/// Empty or absent means "not selected"; anything else must name an area.
pub fn parse_area(area: Option<&str>) -> Result<Option<DeliveryArea>, ValidationError> {
    match area.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

impl CustomerInput {
    /// An unknown area counts as no area, which step 2 rejects.
    pub fn into_details(self) -> CustomerDetails {
        let area = parse_area(self.area.as_deref()).unwrap_or_else(|e| {
            warn!(error = %e, "Unknown delivery area in checkout");
            None
        });
        CustomerDetails {
            name: self.name,
            phone: self.phone,
            address: self.address,
            area,
            email: non_empty(self.email),
        }
    }
}

impl CartItemInput {
    pub fn into_line_item(self) -> LineItem {
        let price = line_price(self.price);
        let mut item = LineItem::new(self.product_id, self.name, price, self.quantity).with_variant(
            self.selected_size.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            self.selected_color.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        );
        item.image_url = non_empty(self.image_url);
        item.is_pack = self.is_pack;
        item
    }
}

pub fn line_items(items: Vec<CartItemInput>) -> Vec<LineItem> {
    items.into_iter().map(CartItemInput::into_line_item).collect()
}

// =============================================================================
// Responses
// =============================================================================

/// `201 { orderId }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_id: String,
}

/// Server-side price of a cart, in taka.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub base_subtotal: f64,
    pub discount: f64,
    pub subtotal: f64,
    pub delivery_charge: f64,
    pub total: f64,
    pub total_quantity: i64,
    pub free_delivery: bool,
}

impl From<PricingResult> for QuoteResponse {
    fn from(p: PricingResult) -> Self {
        QuoteResponse {
            base_subtotal: money_to_taka(p.base_subtotal),
            discount: money_to_taka(p.discount),
            subtotal: money_to_taka(p.subtotal),
            delivery_charge: money_to_taka(p.delivery_charge),
            total: money_to_taka(p.total),
            total_quantity: p.total_quantity,
            free_delivery: p.free_delivery,
        }
    }
}

/// Order confirmation page payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub storefront_id: String,
    pub status: String,
    pub payment_method: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub customer_area: String,
    pub subtotal: f64,
    pub discount: f64,
    pub delivery_charge: f64,
    pub total: f64,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub line_total: f64,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
    pub image_url: Option<String>,
}

impl OrderResponse {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        OrderResponse {
            status: order.status.as_str().to_string(),
            payment_method: "COD".to_string(),
            customer_area: order.customer_area.as_str().to_string(),
            subtotal: money_to_taka(Money::from_poisha(order.subtotal_poisha)),
            discount: money_to_taka(Money::from_poisha(order.discount_poisha)),
            delivery_charge: money_to_taka(Money::from_poisha(order.delivery_charge_poisha)),
            total: money_to_taka(order.total()),
            created_at: order.created_at.to_rfc3339(),
            id: order.id,
            storefront_id: order.storefront_id,
            customer_name: order.customer_name,
            customer_phone: order.customer_phone,
            customer_address: order.customer_address,
            items: items
                .into_iter()
                .map(|item| OrderItemResponse {
                    price: money_to_taka(Money::from_poisha(item.unit_price_poisha)),
                    line_total: money_to_taka(Money::from_poisha(item.line_total_poisha)),
                    product_id: item.product_id,
                    name: item.name,
                    quantity: item.quantity,
                    selected_size: item.selected_size,
                    selected_color: item.selected_color,
                    image_url: item.image_url,
                })
                .collect(),
        }
    }
}
