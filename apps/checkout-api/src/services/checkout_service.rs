//! # Checkout Service
//!
//! Turns a validated cart into a stored order.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CheckoutService::place_order                       │
//! │                                                                         │
//! │  1-6  validate_checkout (fields, area, cart, phone, address, minimums) │
//! │   7   rate limits: ip window + phone window (both always counted)      │
//! │   8   pending orders for this phone < cap                              │
//! │       ── nothing has been written up to here ──                        │
//! │   9   brand row exists (missing = deployment error, 500)               │
//! │  10   every line: product exists, active, enough stock                 │
//! │  11   re-price against catalog prices, re-check minimums               │
//! │  12   find-or-create customer by phone                                 │
//! │  13   OrderRepository::create (order + items + outbox, one tx)         │
//! │       ── committed ──                                                   │
//! │  14   decrement stock per line (best-effort, logged)                   │
//! │  15   nudge notification dispatcher                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Client prices only drive steps 1-6. Everything stored comes from the
//! catalog; a differing client total is logged and ignored.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use storefront_core::validation::{
    validate_cart_size, validate_checkout, validate_minimum_order, validate_quantity,
};
use storefront_core::{
    CoreError, CustomerDetails, DeliveryArea, LineItem, LineKey, Money, Order, OrderItem,
    PricingResult, Product,
};
use storefront_db::{NewOrder, NewOrderItem};

use crate::error::{ApiError, ApiResult, RateLimitScope};
use crate::state::AppState;

/// A checkout submission after JSON decoding.
#[derive(Debug, Clone)]
pub struct CheckoutInput {
    pub customer: CustomerDetails,
    pub items: Vec<LineItem>,
    /// What the shopper's browser showed. Compared, never trusted.
    pub client_total: Option<Money>,
    pub client_delivery_charge: Option<Money>,
}

/// Checkout, quote and order lookup for one request.
pub struct CheckoutService {
    state: AppState,
}

impl CheckoutService {
    pub fn new(state: AppState) -> Self {
        CheckoutService { state }
    }

    /// Places a cash-on-delivery order and returns its id.
    ///
    /// ## Errors
    /// - `StorefrontNotFound` for an unknown storefront id
    /// - `Validation` for steps 1-6 and the catalog re-check
    /// - `RateLimited` when either window is exceeded
    /// - `TooManyPendingOrders` at the pending cap
    /// - `Stock` for a missing product or short stock
    /// - `Config` when the storefront has no brand row
    pub async fn place_order(
        &self,
        storefront_id: &str,
        client_ip: &str,
        input: CheckoutInput,
    ) -> ApiResult<String> {
        let storefront = self.state.storefront(storefront_id)?;
        let policy = storefront.pricing_policy();
        let rules = storefront.checkout_rules();

        // 1-6
        let validated = validate_checkout(&input.customer, &input.items, &policy, &rules)?;
        let phone = validated.phone;

        // 7. Count both windows before deciding
        let limiter = self.state.limiter();
        let ip_allowed = limiter
            .hit(&format!("{storefront_id}:checkout_ip_{client_ip}"), storefront.ip_limit())
            .await;
        let phone_allowed = limiter
            .hit(&format!("{storefront_id}:checkout_phone_{phone}"), storefront.phone_limit())
            .await;
        if !ip_allowed {
            return Err(ApiError::RateLimited(RateLimitScope::Ip));
        }
        if !phone_allowed {
            return Err(ApiError::RateLimited(RateLimitScope::Phone));
        }

        // 8
        let db = self.state.db();
        let pending = db.orders().count_pending_by_phone(storefront_id, &phone).await?;
        if pending >= storefront.limits.max_pending_orders {
            warn!(storefront_id, %phone, pending, "Pending order cap reached");
            return Err(ApiError::TooManyPendingOrders);
        }

        // 9
        if !db.brands().exists(storefront_id).await? {
            return Err(ApiError::Config(format!(
                "brand row for storefront '{storefront_id}' is missing"
            )));
        }

        // 10-11
        let priced = self.catalog_lines(storefront_id, &input.items, true).await?;
        let pricing = policy.price(&priced, Some(validated.area));
        validate_minimum_order(&pricing, &rules)?;

        if let Some(client_total) = input.client_total {
            if client_total != pricing.total {
                warn!(
                    storefront_id,
                    client_total = %client_total,
                    server_total = %pricing.total,
                    "Client total differs from server price"
                );
            }
        }
        if let Some(client_delivery) = input.client_delivery_charge {
            if client_delivery != pricing.delivery_charge {
                warn!(
                    storefront_id,
                    client_delivery = %client_delivery,
                    server_delivery = %pricing.delivery_charge,
                    "Client delivery charge differs from server price"
                );
            }
        }

        // 12
        let name = input.customer.name.trim();
        let customer = db
            .customers()
            .find_or_create_by_phone(&phone, name, input.customer.email.as_deref())
            .await?;

        // 13
        let new_order = NewOrder {
            storefront_id: storefront_id.to_string(),
            customer_id: customer.id,
            customer_phone: phone.clone(),
            customer_name: name.to_string(),
            customer_address: input.customer.address.trim().to_string(),
            customer_area: validated.area,
            customer_email: input.customer.email.clone(),
            subtotal: pricing.base_subtotal,
            discount: pricing.discount,
            delivery_charge: pricing.delivery_charge,
            total: pricing.total,
            items: priced
                .iter()
                .map(|item| NewOrderItem {
                    product_id: item.product_id.clone(),
                    name: item.name.clone(),
                    unit_price: item.unit_price,
                    quantity: item.quantity,
                    selected_size: item.size.clone(),
                    selected_color: item.color.clone(),
                    image_url: item.image_url.clone(),
                })
                .collect(),
        };
        let order = db.orders().create(&new_order).await?;

        info!(
            order_id = %order.id,
            storefront_id,
            %phone,
            total = %pricing.total,
            items = priced.len(),
            "Order placed"
        );

        // 14
        let products = db.products();
        for item in &priced {
            if let Err(e) = products
                .decrement_stock(
                    &item.product_id,
                    item.size.as_deref(),
                    item.color.as_deref(),
                    item.quantity,
                )
                .await
            {
                warn!(
                    order_id = %order.id,
                    product_id = %item.product_id,
                    error = %e,
                    "Stock decrement failed"
                );
            }
        }

        // 15
        self.state.notifications().nudge();

        Ok(order.id)
    }

    /// Prices a cart with catalog prices and the storefront policy.
    ///
    /// No stock check: a quote is shown while the shopper is still
    /// choosing quantities.
    pub async fn quote(
        &self,
        storefront_id: &str,
        items: &[LineItem],
        area: Option<DeliveryArea>,
    ) -> ApiResult<PricingResult> {
        let storefront = self.state.storefront(storefront_id)?;
        validate_cart_size(items.len())?;
        for item in items {
            validate_quantity(item.quantity)?;
        }

        let priced = self.catalog_lines(storefront_id, items, false).await?;
        Ok(storefront.pricing_policy().price(&priced, area))
    }

    /// Loads an order placed on this storefront.
    pub async fn get_order(
        &self,
        storefront_id: &str,
        order_id: &str,
    ) -> ApiResult<(Order, Vec<OrderItem>)> {
        self.state.storefront(storefront_id)?;

        let orders = self.state.db().orders();
        let order = orders
            .get(order_id)
            .await?
            .filter(|order| order.storefront_id == storefront_id)
            .ok_or_else(|| ApiError::OrderNotFound(order_id.to_string()))?;
        let items = orders.items(&order.id).await?;

        Ok((order, items))
    }

    /// Replaces client prices with catalog prices.
    ///
    /// With `check_stock`, quantities drawing on the same stock are summed
    /// before comparing: per (product, size, color) for variant stock, per
    /// product for flat stock whatever size or color the lines name.
    async fn catalog_lines(
        &self,
        storefront_id: &str,
        items: &[LineItem],
        check_stock: bool,
    ) -> ApiResult<Vec<LineItem>> {
        let repo = self.state.db().products();
        let mut catalog: HashMap<String, Product> = HashMap::new();
        let mut requested: HashMap<LineKey, i64> = HashMap::new();
        let mut priced = Vec::with_capacity(items.len());

        for item in items {
            if !catalog.contains_key(&item.product_id) {
                let product = repo
                    .get(storefront_id, &item.product_id)
                    .await?
                    .filter(|p| p.is_active)
                    .ok_or_else(|| CoreError::ProductNotFound {
                        product_id: item.product_id.clone(),
                        name: item.name.clone(),
                    })?;
                catalog.insert(item.product_id.clone(), product);
            }
            let product = &catalog[&item.product_id];

            if check_stock {
                let stock_key = if product.variants.is_empty() {
                    LineKey {
                        product_id: product.id.clone(),
                        size: None,
                        color: None,
                    }
                } else {
                    item.key()
                };
                let wanted = requested.entry(stock_key).or_insert(0);
                *wanted += item.quantity;

                let available = product.available_stock(item.size.as_deref(), item.color.as_deref());
                if available < *wanted {
                    debug!(
                        product_id = %product.id,
                        available,
                        requested = *wanted,
                        "Insufficient stock"
                    );
                    return Err(CoreError::InsufficientStock {
                        name: product.name.clone(),
                        available,
                        requested: *wanted,
                    }
                    .into());
                }
            }

            let mut line = LineItem::new(
                product.id.clone(),
                product.name.clone(),
                product.price(),
                item.quantity,
            )
            .with_variant(item.size.as_deref(), item.color.as_deref());
            line.image_url = item.image_url.clone().or_else(|| product.image_url.clone());
            line.is_pack = product.is_pack;
            priced.push(line);
        }

        Ok(priced)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
