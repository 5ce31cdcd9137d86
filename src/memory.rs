//! In-memory stores used by tests in place of Postgres.

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    cart::{repo::CartStore, repo_types::CartLineItem},
    catalog::{dto::ProductFilter, repo::ProductStore, repo_types::Product},
};

pub fn product(name: &str, category: &str) -> Product {
    Product {
        id: Uuid::new_v4(),
        name: name.into(),
        description: format!("{name} description"),
        price: Decimal::new(1999, 2),
        category: category.into(),
        image_url: String::new(),
        stock: 10,
        created_at: OffsetDateTime::now_utc(),
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.email.to_lowercase() == email.to_lowercase())
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new: NewUser<'_>) -> anyhow::Result<Option<User>> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.email.to_lowercase() == new.email.to_lowercase())
        {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email.to_string(),
            display_name: new.display_name.to_string(),
            password_hash: new.password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(Some(user))
    }
}

#[derive(Default)]
pub struct MemoryProductStore {
    products: RwLock<Vec<Product>>,
}

impl MemoryProductStore {
    pub fn seeded(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
        }
    }

    pub async fn remove(&self, id: Uuid) {
        self.products.write().await.retain(|p| p.id != id);
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self, filter: &ProductFilter, limit: i64) -> anyhow::Result<Vec<Product>> {
        let products = self.products.read().await;
        Ok(products
            .iter()
            .filter(|p| filter.matches(p))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Product>> {
        let products = self.products.read().await;
        Ok(products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryCartStore {
    lines: RwLock<Vec<CartLineItem>>,
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<CartLineItem>> {
        let lines = self.lines.read().await;
        Ok(lines
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn add_quantity(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> anyhow::Result<Option<CartLineItem>> {
        let mut lines = self.lines.write().await;
        if let Some(line) = lines
            .iter_mut()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
        {
            let Some(total) = line.quantity.checked_add(quantity) else {
                return Ok(None);
            };
            line.quantity = total;
            return Ok(Some(line.clone()));
        }
        let line = CartLineItem {
            id: Uuid::new_v4(),
            user_id,
            product_id,
            quantity,
            created_at: OffsetDateTime::now_utc(),
        };
        lines.push(line.clone());
        Ok(Some(line))
    }

    async fn find_owned(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> anyhow::Result<Option<CartLineItem>> {
        let lines = self.lines.read().await;
        Ok(lines
            .iter()
            .find(|l| l.id == item_id && l.user_id == user_id)
            .cloned())
    }

    async fn set_quantity(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> anyhow::Result<Option<CartLineItem>> {
        let mut lines = self.lines.write().await;
        Ok(lines
            .iter_mut()
            .find(|l| l.id == item_id && l.user_id == user_id)
            .map(|l| {
                l.quantity = quantity;
                l.clone()
            }))
    }

    async fn delete(&self, user_id: Uuid, item_id: Uuid) -> anyhow::Result<bool> {
        let mut lines = self.lines.write().await;
        let before = lines.len();
        lines.retain(|l| !(l.id == item_id && l.user_id == user_id));
        Ok(lines.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stored_records_read_back_unchanged() {
        let users = MemoryUserStore::default();
        let created = users
            .create(NewUser {
                email: "rt@example.com",
                display_name: "Round Trip",
                password_hash: "$argon2id$fake",
            })
            .await
            .unwrap()
            .unwrap();
        let read = users.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(read.email, "rt@example.com");
        assert_eq!(read.display_name, "Round Trip");
        assert_eq!(read.password_hash, "$argon2id$fake");
        assert!(!read.id.is_nil());

        let p = product("Desk Lamp", "Home");
        let products = MemoryProductStore::seeded(vec![p.clone()]);
        assert_eq!(products.find_by_id(p.id).await.unwrap(), Some(p));
    }
}
