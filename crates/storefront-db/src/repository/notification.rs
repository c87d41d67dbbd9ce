//! # Notification Outbox Repository
//!
//! Queue of order notifications still to be delivered.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Notification Outbox                                  │
//! │                                                                         │
//! │  CHECKOUT (OrderRepository::create)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │  INSERT INTO orders ...                                         │   │
//! │  │  INSERT INTO notification_outbox ('ORDER_PLACED', payload)      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            NOTIFICATION DISPATCHER (background)                 │   │
//! │  │                                                                 │   │
//! │  │  1. get_pending(batch)       WHERE sent_at IS NULL             │   │
//! │  │                                AND attempts < 10               │   │
//! │  │  2. Notifier::send(...)                                        │   │
//! │  │     ok  → mark_sent(id)                                        │   │
//! │  │     err → mark_failed(id, error)   attempts += 1               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  A placed order never loses its notification, and a failing mail      │
//! │  provider never fails a checkout.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use storefront_core::NotificationOutboxEntry;

/// Entries that failed this many times are no longer fetched.
pub const MAX_DELIVERY_ATTEMPTS: i64 = 10;

/// Repository for notification outbox operations.
#[derive(Debug, Clone)]
pub struct NotificationOutboxRepository {
    pool: SqlitePool,
}

impl NotificationOutboxRepository {
    /// Creates a new NotificationOutboxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NotificationOutboxRepository { pool }
    }

    /// Gets undelivered entries, fewest attempts first, then oldest.
    ///
    /// Entries that keep failing sink below fresh ones instead of filling
    /// every batch, and drop out once they reach `MAX_DELIVERY_ATTEMPTS`.
    /// They stay in the table (and in `count_pending`) for inspection.
    pub async fn get_pending(&self, limit: u32) -> DbResult<Vec<NotificationOutboxEntry>> {
        let entries = sqlx::query_as::<_, NotificationOutboxEntry>(
            r#"
            SELECT
                id, kind, order_id, payload, attempts, last_error,
                created_at, attempted_at, sent_at
            FROM notification_outbox
            WHERE sent_at IS NULL AND attempts < ?2
            ORDER BY attempts ASC, created_at ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .bind(MAX_DELIVERY_ATTEMPTS)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Marks an entry as delivered.
    pub async fn mark_sent(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE notification_outbox SET
                sent_at = ?2,
                attempted_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!(entry_id = %id, "Notification marked sent");
        Ok(())
    }

    /// Records a delivery failure.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE notification_outbox SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts undelivered entries.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notification_outbox WHERE sent_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::MAX_DELIVERY_ATTEMPTS;
    use crate::{Database, DbConfig, NewOrder, NewOrderItem};
    use chrono::Utc;
    use storefront_core::{DeliveryArea, Money, Product};

    async fn placed_order(db: &Database) -> String {
        db.brands().insert("bengolsale", "Bengol Sale").await.unwrap();
        db.products()
            .insert(&Product {
                id: "pack-6".to_string(),
                storefront_id: "bengolsale".to_string(),
                name: "6 Piece Pack".to_string(),
                price_poisha: 135_000,
                stock: 20,
                is_pack: true,
                image_url: None,
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                variants: Vec::new(),
            })
            .await
            .unwrap();
        let customer = db
            .customers()
            .find_or_create_by_phone("01912345678", "Nusrat", None)
            .await
            .unwrap();

        let order = db
            .orders()
            .create(&NewOrder {
                storefront_id: "bengolsale".to_string(),
                customer_id: customer.id,
                customer_phone: "01912345678".to_string(),
                customer_name: "Nusrat".to_string(),
                customer_address: "Chawkbazar, Chattogram".to_string(),
                customer_area: DeliveryArea::Outside,
                customer_email: None,
                subtotal: Money::from_taka(1350),
                discount: Money::zero(),
                delivery_charge: Money::from_taka(120),
                total: Money::from_taka(1470),
                items: vec![NewOrderItem {
                    product_id: "pack-6".to_string(),
                    name: "6 Piece Pack".to_string(),
                    unit_price: Money::from_taka(1350),
                    quantity: 1,
                    selected_size: None,
                    selected_color: None,
                    image_url: None,
                }],
            })
            .await
            .unwrap();
        order.id
    }

    #[tokio::test]
    async fn test_mark_failed_then_sent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        placed_order(&db).await;
        let outbox = db.notification_outbox();

        let entry = outbox.get_pending(10).await.unwrap().remove(0);
        outbox.mark_failed(&entry.id, "smtp timeout").await.unwrap();

        let retried = outbox.get_pending(10).await.unwrap().remove(0);
        assert_eq!(retried.attempts, 1);
        assert_eq!(retried.last_error.as_deref(), Some("smtp timeout"));
        assert!(retried.attempted_at.is_some());

        outbox.mark_sent(&entry.id).await.unwrap();
        assert_eq!(outbox.count_pending().await.unwrap(), 0);
        assert!(outbox.get_pending(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_given_up_entries_are_not_fetched() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        placed_order(&db).await;
        let outbox = db.notification_outbox();

        let entry = outbox.get_pending(10).await.unwrap().remove(0);
        for _ in 0..MAX_DELIVERY_ATTEMPTS - 1 {
            outbox.mark_failed(&entry.id, "smtp timeout").await.unwrap();
        }
        assert_eq!(outbox.get_pending(10).await.unwrap().len(), 1);

        outbox.mark_failed(&entry.id, "smtp timeout").await.unwrap();
        assert!(outbox.get_pending(10).await.unwrap().is_empty());
        assert_eq!(outbox.count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_pending_respects_limit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        placed_order(&db).await;

        assert_eq!(db.notification_outbox().get_pending(0).await.unwrap().len(), 0);
        assert_eq!(db.notification_outbox().count_pending().await.unwrap(), 1);
    }
}
