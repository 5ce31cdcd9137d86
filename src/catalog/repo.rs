use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{dto::ProductFilter, repo_types::Product};

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list(&self, filter: &ProductFilter, limit: i64) -> anyhow::Result<Vec<Product>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Product>>;
    /// Missing ids are simply absent from the result.
    async fn find_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Product>>;
}

#[derive(Clone)]
pub struct PgProductStore {
    db: PgPool,
}

impl PgProductStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn list(&self, filter: &ProductFilter, limit: i64) -> anyhow::Result<Vec<Product>> {
        // strpos keeps the search a literal substring, no LIKE wildcards.
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, category, image_url, stock, created_at
            FROM products
            WHERE ($1::text IS NULL OR strpos(lower(name), lower($1)) > 0)
              AND ($2::text IS NULL OR category = $2)
            ORDER BY created_at ASC, id ASC
            LIMIT $3
            "#,
        )
        .bind(filter.search.as_deref())
        .bind(filter.category.as_deref())
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("list products")?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, category, image_url, stock, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get product")?;
        Ok(row)
    }

    async fn find_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, description, price, category, image_url, stock, created_at
            FROM products
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await
        .context("get products by id")?;
        Ok(rows)
    }
}
