//! # Order Repository
//!
//! Order placement and the lookups checkout needs around it.
//!
//! ## Placement Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     OrderRepository::create                             │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. INSERT INTO orders (... status = 'PENDING')                       │
//! │    2. INSERT INTO order_items        × N   (catalog snapshot)          │
//! │    3. INSERT INTO notification_outbox      ('ORDER_PLACED', payload)   │
//! │  COMMIT  ← all three or nothing                                        │
//! │                                                                         │
//! │  After commit (caller, best-effort):                                   │
//! │    • ProductRepository::decrement_stock per item                       │
//! │    • nudge the notification dispatcher                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every statement inside the transaction runs on the transaction's own
//! connection; touching `self.pool` there would wait forever on a
//! single-connection pool.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use storefront_core::{
    DeliveryArea, Money, Order, OrderItem, OrderPlaced, OrderStatus, PaymentMethod, ORDER_PLACED,
};

// =============================================================================
// Inputs
// =============================================================================

/// An order ready to be written. Amounts are server-side figures.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub storefront_id: String,
    pub customer_id: String,
    /// Normalised `01XXXXXXXXX`.
    pub customer_phone: String,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_area: DeliveryArea,
    pub customer_email: Option<String>,
    /// Before discount.
    pub subtotal: Money,
    pub discount: Money,
    pub delivery_charge: Money,
    pub total: Money,
    pub items: Vec<NewOrderItem>,
}

/// One order line, priced from the catalog.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
    pub image_url: Option<String>,
}

impl NewOrderItem {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Places an order: order row, item rows and an `ORDER_PLACED` outbox
    /// entry in one transaction.
    ///
    /// ## Returns
    /// The stored order, status `PENDING`.
    pub async fn create(&self, new_order: &NewOrder) -> DbResult<Order> {
        if new_order.items.is_empty() {
            return Err(DbError::Internal("order has no items".to_string()));
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            storefront_id: new_order.storefront_id.clone(),
            customer_id: new_order.customer_id.clone(),
            customer_phone: new_order.customer_phone.clone(),
            customer_name: new_order.customer_name.clone(),
            customer_address: new_order.customer_address.clone(),
            customer_area: new_order.customer_area,
            customer_email: new_order.customer_email.clone(),
            subtotal_poisha: new_order.subtotal.poisha(),
            discount_poisha: new_order.discount.poisha(),
            delivery_charge_poisha: new_order.delivery_charge.poisha(),
            total_poisha: new_order.total.poisha(),
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::CashOnDelivery,
            created_at: now,
            updated_at: now,
        };

        let payload = serde_json::to_string(&OrderPlaced {
            order_id: order.id.clone(),
            storefront_id: order.storefront_id.clone(),
            customer_name: order.customer_name.clone(),
            customer_phone: order.customer_phone.clone(),
            email: order.customer_email.clone(),
            total: order.total(),
            status: order.status,
            items_count: new_order.items.len(),
        })?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, storefront_id, customer_id,
                customer_phone, customer_name, customer_address, customer_area, customer_email,
                subtotal_poisha, discount_poisha, delivery_charge_poisha, total_poisha,
                status, payment_method, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
        )
        .bind(&order.id)
        .bind(&order.storefront_id)
        .bind(&order.customer_id)
        .bind(&order.customer_phone)
        .bind(&order.customer_name)
        .bind(&order.customer_address)
        .bind(order.customer_area)
        .bind(&order.customer_email)
        .bind(order.subtotal_poisha)
        .bind(order.discount_poisha)
        .bind(order.delivery_charge_poisha)
        .bind(order.total_poisha)
        .bind(order.status)
        .bind(order.payment_method)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &new_order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, name, unit_price_poisha, quantity,
                    line_total_poisha, selected_size, selected_color, image_url
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order.id)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(item.unit_price.poisha())
            .bind(item.quantity)
            .bind(item.line_total().poisha())
            .bind(&item.selected_size)
            .bind(&item.selected_color)
            .bind(&item.image_url)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO notification_outbox (id, kind, order_id, payload, attempts, created_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(ORDER_PLACED)
        .bind(&order.id)
        .bind(&payload)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            storefront_id = %order.storefront_id,
            items = new_order.items.len(),
            total = %order.total(),
            "Order placed"
        );

        Ok(order)
    }

    /// Gets an order by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT
                id, storefront_id, customer_id,
                customer_phone, customer_name, customer_address, customer_area, customer_email,
                subtotal_poisha, discount_poisha, delivery_charge_poisha, total_poisha,
                status, payment_method, created_at, updated_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets the items of an order, in insertion order.
    pub async fn items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT
                id, order_id, product_id, name, unit_price_poisha, quantity,
                line_total_poisha, selected_size, selected_color, image_url
            FROM order_items
            WHERE order_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Counts `PENDING` orders a phone has open with one storefront.
    pub async fn count_pending_by_phone(&self, storefront_id: &str, phone: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE storefront_id = ?1 AND customer_phone = ?2 AND status = ?3
            "#,
        )
        .bind(storefront_id)
        .bind(phone)
        .bind(OrderStatus::Pending)
        .fetch_one(&self.pool)
        .await?;

        debug!(storefront_id = %storefront_id, phone = %phone, pending = count, "Pending orders counted");
        Ok(count)
    }

    /// Sets an order's status (back-office transitions).
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
