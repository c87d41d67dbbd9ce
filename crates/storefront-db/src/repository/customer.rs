//! # Customer Repository
//!
//! Shoppers are keyed by normalised phone number. There is no sign-up:
//! the first checkout from a phone creates the customer.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use storefront_core::Customer;

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by normalised phone.
    pub async fn get_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, phone, name, email, created_at FROM customers WHERE phone = ?1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Returns the customer for `phone`, creating one if needed.
    ///
    /// An existing customer keeps their name; a missing email is filled in
    /// from this checkout.
    ///
    /// ## Concurrency
    /// Two checkouts from a new phone can race on the UNIQUE(phone)
    /// constraint. The loser re-reads the winner's row.
    pub async fn find_or_create_by_phone(
        &self,
        phone: &str,
        name: &str,
        email: Option<&str>,
    ) -> DbResult<Customer> {
        if let Some(existing) = self.get_by_phone(phone).await? {
            return self.fill_missing_email(existing, email).await;
        }

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            phone: phone.to_string(),
            name: name.to_string(),
            email: email.map(str::to_string),
            created_at: Utc::now(),
        };

        let inserted = sqlx::query(
            "INSERT INTO customers (id, phone, name, email, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&customer.id)
        .bind(&customer.phone)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {
                debug!(customer_id = %customer.id, phone = %phone, "Customer created");
                Ok(customer)
            }
            Err(e) => {
                let err = DbError::from(e);
                if !err.is_unique_violation() {
                    return Err(err);
                }
                debug!(phone = %phone, "Customer created concurrently, re-reading");
                self.get_by_phone(phone)
                    .await?
                    .ok_or_else(|| DbError::not_found("Customer", phone))
            }
        }
    }

    async fn fill_missing_email(
        &self,
        mut customer: Customer,
        email: Option<&str>,
    ) -> DbResult<Customer> {
        let (None, Some(email)) = (customer.email.as_deref(), email) else {
            return Ok(customer);
        };

        sqlx::query("UPDATE customers SET email = ?1 WHERE id = ?2 AND email IS NULL")
            .bind(email)
            .bind(&customer.id)
            .execute(&self.pool)
            .await?;

        customer.email = Some(email.to_string());
        Ok(customer)
    }
}
