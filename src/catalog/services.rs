use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::{dto::ProductFilter, repo::ProductStore, repo_types::Product};
use crate::error::{AppError, AppResult};

/// Upper bound on a single listing; there is no pagination.
pub const MAX_PRODUCTS: i64 = 1000;

/// Read-only queries over the product catalog.
#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductStore>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        Self { products }
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<Product>> {
        let products = self.products.list(filter, MAX_PRODUCTS).await?;
        debug!(count = products.len(), ?filter, "products listed");
        Ok(products)
    }

    pub async fn get_product(&self, id: Uuid) -> AppResult<Product> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Product not found"))
    }

    /// Existence check used by the cart; `None` when the product is unknown.
    pub async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.products.find_by_id(id).await?)
    }

    pub async fn find_products(&self, ids: &[Uuid]) -> AppResult<Vec<Product>> {
        Ok(self.products.find_many(ids).await?)
    }
}
