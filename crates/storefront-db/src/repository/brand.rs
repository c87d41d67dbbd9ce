//! # Brand Repository
//!
//! One brand row per storefront. Checkout refuses to place orders for a
//! storefront whose brand row is missing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// A storefront's brand record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Repository for brand lookups.
#[derive(Debug, Clone)]
pub struct BrandRepository {
    pool: SqlitePool,
}

impl BrandRepository {
    /// Creates a new BrandRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BrandRepository { pool }
    }

    /// Returns true if a brand row exists for the storefront.
    pub async fn exists(&self, storefront_id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM brands WHERE id = ?1")
            .bind(storefront_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Gets a brand by storefront id.
    pub async fn get(&self, storefront_id: &str) -> DbResult<Option<Brand>> {
        let brand = sqlx::query_as::<_, Brand>(
            "SELECT id, name, created_at FROM brands WHERE id = ?1",
        )
        .bind(storefront_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(brand)
    }

    /// Inserts a brand row.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` if the storefront id is taken.
    pub async fn insert(&self, storefront_id: &str, name: &str) -> DbResult<Brand> {
        let brand = Brand {
            id: storefront_id.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        debug!(storefront_id = %brand.id, "Inserting brand");

        sqlx::query("INSERT INTO brands (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&brand.id)
            .bind(&brand.name)
            .bind(brand.created_at)
            .execute(&self.pool)
            .await?;

        Ok(brand)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let brands = db.brands();

        assert!(!brands.exists("bengolsale").await.unwrap());
        assert!(brands.get("bengolsale").await.unwrap().is_none());

        brands.insert("bengolsale", "Bengol Sale").await.unwrap();

        assert!(brands.exists("bengolsale").await.unwrap());
        let brand = brands.get("bengolsale").await.unwrap().unwrap();
        assert_eq!(brand.name, "Bengol Sale");
    }

    #[tokio::test]
    async fn test_duplicate_brand_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.brands().insert("stylehunt", "StyleHunt").await.unwrap();

        let err = db.brands().insert("stylehunt", "Again").await.unwrap_err();
        assert!(err.is_unique_violation());
    }
}
