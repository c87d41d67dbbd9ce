//! # Product Repository
//!
//! Catalog lookups and stock updates.
//!
//! ## Stock Model
//! ```text
//! products.stock ─────────────── used when the product has no variants
//!
//! product_variants (product_id, size, color, stock)
//!      ├── ("M", "Red")   12
//!      ├── ("L", "Red")    0
//!      └── ("",  "Blue")   4     ← '' stored for "not selected"
//! ```
//!
//! The catalog price is authoritative: checkout re-prices every line from
//! [`ProductRepository::get`], never from the client's cart.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use storefront_core::{Product, ProductVariant};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product of one storefront, with its variants.
    ///
    /// Returns `None` when the id is unknown or belongs to a different
    /// storefront. Inactive products are returned; callers decide.
    pub async fn get(&self, storefront_id: &str, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, storefront_id, name, price_poisha, stock,
                is_pack, image_url, is_active, created_at, updated_at
            FROM products
            WHERE id = ?1 AND storefront_id = ?2
            "#,
        )
        .bind(id)
        .bind(storefront_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut product) = product else {
            return Ok(None);
        };

        product.variants = self.variants(&product.id).await?;
        Ok(Some(product))
    }

    /// Lists variants of a product, with '' mapped back to `None`.
    pub async fn variants(&self, product_id: &str) -> DbResult<Vec<ProductVariant>> {
        let variants = sqlx::query_as::<_, ProductVariant>(
            r#"
            SELECT
                product_id,
                NULLIF(size, '') AS size,
                NULLIF(color, '') AS color,
                stock
            FROM product_variants
            WHERE product_id = ?1
            ORDER BY size, color
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(variants)
    }

    /// Inserts a product (variants are inserted separately).
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(
            product_id = %product.id,
            storefront_id = %product.storefront_id,
            "Inserting product"
        );

        sqlx::query(
            r#"
            INSERT INTO products (
                id, storefront_id, name, price_poisha, stock,
                is_pack, image_url, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.storefront_id)
        .bind(&product.name)
        .bind(product.price_poisha)
        .bind(product.stock)
        .bind(product.is_pack)
        .bind(&product.image_url)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts or replaces the stock row of one size/colour combination.
    pub async fn insert_variant(&self, variant: &ProductVariant) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO product_variants (product_id, size, color, stock)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (product_id, size, color) DO UPDATE SET stock = excluded.stock
            "#,
        )
        .bind(&variant.product_id)
        .bind(variant.size.as_deref().unwrap_or(""))
        .bind(variant.color.as_deref().unwrap_or(""))
        .bind(variant.stock)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Decrements stock after an order is placed.
    ///
    /// The matching variant row is decremented when one exists, otherwise
    /// the flat product stock. Stock never goes below zero.
    ///
    /// ## Errors
    /// `DbError::NotFound` if neither a variant nor the product matched.
    pub async fn decrement_stock(
        &self,
        product_id: &str,
        size: Option<&str>,
        color: Option<&str>,
        quantity: i64,
    ) -> DbResult<()> {
        let variant = sqlx::query(
            r#"
            UPDATE product_variants
            SET stock = MAX(stock - ?1, 0)
            WHERE product_id = ?2 AND size = ?3 AND color = ?4
            "#,
        )
        .bind(quantity)
        .bind(product_id)
        .bind(size.unwrap_or(""))
        .bind(color.unwrap_or(""))
        .execute(&self.pool)
        .await?;

        if variant.rows_affected() > 0 {
            debug!(product_id = %product_id, quantity, "Variant stock decremented");
            return Ok(());
        }

        let flat = sqlx::query(
            r#"
            UPDATE products
            SET stock = MAX(stock - ?1, 0), updated_at = ?2
            WHERE id = ?3
            "#,
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        if flat.rows_affected() == 0 {
            warn!(product_id = %product_id, "Stock decrement matched no product");
            return Err(DbError::not_found("Product", product_id));
        }

        debug!(product_id = %product_id, quantity, "Product stock decremented");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
