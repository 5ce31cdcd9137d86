use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::CartLineItem;

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<CartLineItem>>;
    /// Atomically creates the line or adds `quantity` to the existing one.
    /// `None` when the sum would not fit in an `i32`; the line is left as it was.
    async fn add_quantity(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> anyhow::Result<Option<CartLineItem>>;
    async fn find_owned(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> anyhow::Result<Option<CartLineItem>>;
    /// Replaces the quantity of a line owned by `user_id`; `None` if there is none.
    async fn set_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> anyhow::Result<Option<CartLineItem>>;
    /// Returns whether an owned line was deleted.
    async fn delete(&self, user_id: Uuid, item_id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgCartStore {
    db: PgPool,
}

impl PgCartStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<CartLineItem>> {
        let rows = sqlx::query_as::<_, CartLineItem>(
            r#"
            SELECT id, user_id, product_id, quantity, created_at
            FROM cart_items
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list cart items")?;
        Ok(rows)
    }

    async fn add_quantity(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> anyhow::Result<Option<CartLineItem>> {
        // A skipped DO UPDATE returns no row instead of raising an integer overflow.
        let row = sqlx::query_as::<_, CartLineItem>(
            r#"
            INSERT INTO cart_items (id, user_id, product_id, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
                WHERE cart_items.quantity <= 2147483647 - EXCLUDED.quantity
            RETURNING id, user_id, product_id, quantity, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_optional(&self.db)
        .await
        .context("upsert cart item")?;
        Ok(row)
    }

    async fn find_owned(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> anyhow::Result<Option<CartLineItem>> {
        let row = sqlx::query_as::<_, CartLineItem>(
            r#"
            SELECT id, user_id, product_id, quantity, created_at
            FROM cart_items
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find cart item")?;
        Ok(row)
    }

    async fn set_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> anyhow::Result<Option<CartLineItem>> {
        let row = sqlx::query_as::<_, CartLineItem>(
            r#"
            UPDATE cart_items
               SET quantity = $3
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, product_id, quantity, created_at
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .bind(quantity)
        .fetch_optional(&self.db)
        .await
        .context("update cart item")?;
        Ok(row)
    }

    async fn delete(&self, user_id: Uuid, item_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            DELETE FROM cart_items
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .execute(&self.db)
        .await
        .context("delete cart item")?;
        Ok(res.rows_affected() > 0)
    }
}
