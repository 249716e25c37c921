//! Read access to the product catalog.
//!
//! Catalog management lives elsewhere; carts only resolve their lines here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{FromRow, Pool, Postgres};

use crate::error::Result;

/// Catalog entry. Every field besides `id` is kept as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Find every product whose id is listed. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Product>>;
}

#[derive(FromRow)]
struct ProductRow {
    id: String,
    document: Json<Map<String, Value>>,
}

/// PostgreSQL-backed [`ProductCatalog`].
#[derive(Clone)]
pub struct PgProductCatalog {
    pool: Pool<Postgres>,
}

impl PgProductCatalog {
    /// Create a new [`PgProductCatalog`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for PgProductCatalog {
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, document FROM products WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Product {
                id: row.id,
                details: row.document.0,
            })
            .collect())
    }
}

#[cfg(test)]
pub use memory::MemoryCatalog;
