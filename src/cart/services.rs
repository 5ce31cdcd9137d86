use std::{collections::HashMap, sync::Arc};

use tracing::{debug, info};
use uuid::Uuid;

use super::{
    dto::{CartItemResponse, GuestCartEntry},
    repo::CartStore,
    repo_types::CartLineItem,
};
use crate::{
    catalog::{repo_types::Product, CatalogService},
    error::{AppError, AppResult},
};

fn check_quantity(quantity: i32) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::Validation("Quantity must be at least 1".into()));
    }
    Ok(())
}

fn too_large() -> AppError {
    AppError::Validation("Quantity too large".into())
}

fn joined(line: CartLineItem, product: Product) -> CartItemResponse {
    CartItemResponse {
        id: line.id,
        product,
        quantity: line.quantity,
    }
}

/// Outcome of a best-effort guest cart merge.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub merged: usize,
    pub skipped: usize,
}

/// Per-user cart; the only writer of cart lines.
#[derive(Clone)]
pub struct CartService {
    cart: Arc<dyn CartStore>,
    catalog: CatalogService,
}

impl CartService {
    pub fn new(cart: Arc<dyn CartStore>, catalog: CatalogService) -> Self {
        Self { cart, catalog }
    }

    /// Lines whose product has disappeared from the catalog are left out.
    pub async fn get_cart(&self, user_id: Uuid) -> AppResult<Vec<CartItemResponse>> {
        let lines = self.cart.list_by_user(user_id).await?;
        let ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        let mut products: HashMap<Uuid, Product> = self
            .catalog
            .find_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let items = lines
            .into_iter()
            .filter_map(|line| match products.remove(&line.product_id) {
                Some(product) => Some(joined(line, product)),
                None => {
                    debug!(item_id = %line.id, product_id = %line.product_id, "skipping orphaned cart line");
                    None
                }
            })
            .collect();
        Ok(items)
    }

    pub async fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> AppResult<CartItemResponse> {
        check_quantity(quantity)?;
        let product = self
            .catalog
            .find_product(product_id)
            .await?
            .ok_or(AppError::NotFound("Product not found"))?;

        let line = self
            .cart
            .add_quantity(user_id, product_id, quantity)
            .await?
            .ok_or_else(too_large)?;
        info!(%user_id, %product_id, item_id = %line.id, quantity = line.quantity, "cart item added");
        Ok(joined(line, product))
    }

    pub async fn update_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> AppResult<CartItemResponse> {
        check_quantity(quantity)?;
        let line = self
            .cart
            .find_owned(user_id, item_id)
            .await?
            .ok_or(AppError::NotFound("Cart item not found"))?;
        let product = self
            .catalog
            .find_product(line.product_id)
            .await?
            .ok_or(AppError::NotFound("Product not found"))?;

        let line = self
            .cart
            .set_quantity(user_id, item_id, quantity)
            .await?
            .ok_or(AppError::NotFound("Cart item not found"))?;
        info!(%user_id, %item_id, quantity, "cart item updated");
        Ok(joined(line, product))
    }

    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> AppResult<()> {
        if !self.cart.delete(user_id, item_id).await? {
            return Err(AppError::NotFound("Cart item not found"));
        }
        info!(%user_id, %item_id, "cart item removed");
        Ok(())
    }

    /// Merges each entry independently; unknown products, bad quantities and
    /// entries that would overflow a line are skipped.
    pub async fn sync_guest_cart(
        &self,
        user_id: Uuid,
        entries: Vec<GuestCartEntry>,
    ) -> AppResult<SyncOutcome> {
        let mut outcome = SyncOutcome::default();
        for entry in entries {
            let Ok(product_id) = Uuid::parse_str(entry.product_id.trim()) else {
                debug!(product_id = %entry.product_id, "guest cart entry with malformed id skipped");
                outcome.skipped += 1;
                continue;
            };
            if entry.quantity < 1 {
                debug!(%product_id, quantity = entry.quantity, "guest cart entry with bad quantity skipped");
                outcome.skipped += 1;
                continue;
            }
            if self.catalog.find_product(product_id).await?.is_none() {
                debug!(%product_id, "guest cart entry for unknown product skipped");
                outcome.skipped += 1;
                continue;
            }
            if self
                .cart
                .add_quantity(user_id, product_id, entry.quantity)
                .await?
                .is_none()
            {
                debug!(%product_id, quantity = entry.quantity, "guest cart entry would overflow the line");
                outcome.skipped += 1;
                continue;
            }
            outcome.merged += 1;
        }
        info!(%user_id, merged = outcome.merged, skipped = outcome.skipped, "guest cart synced");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{product, MemoryCartStore, MemoryProductStore};

    struct Fixture {
        svc: CartService,
        products: Arc<MemoryProductStore>,
        mat: Uuid,
        shoes: Uuid,
    }

    fn fixture() -> Fixture {
        let mat = product("Yoga Mat Premium", "Sports");
        let shoes = product("Running Shoes Pro", "Sports");
        let (mat_id, shoes_id) = (mat.id, shoes.id);
        let products = Arc::new(MemoryProductStore::seeded(vec![mat, shoes]));
        let svc = CartService::new(
            Arc::new(MemoryCartStore::default()),
            CatalogService::new(products.clone()),
        );
        Fixture {
            svc,
            products,
            mat: mat_id,
            shoes: shoes_id,
        }
    }

    fn entry(product_id: impl ToString, quantity: i32) -> GuestCartEntry {
        GuestCartEntry {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn repeated_adds_merge_into_one_line() {
        let f = fixture();
        let user = Uuid::new_v4();
        let first = f.svc.add_item(user, f.mat, 2).await.unwrap();
        let second = f.svc.add_item(user, f.mat, 3).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 5);
        assert_eq!(second.product.id, f.mat);

        let cart = f.svc.get_cart(user).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 5);
    }

    #[tokio::test]
    async fn add_unknown_product_is_not_found() {
        let f = fixture();
        let err = f
            .svc
            .add_item(Uuid::new_v4(), Uuid::new_v4(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("Product not found")));
    }

    #[tokio::test]
    async fn non_positive_quantities_are_rejected() {
        let f = fixture();
        let user = Uuid::new_v4();
        assert!(matches!(
            f.svc.add_item(user, f.mat, 0).await.unwrap_err(),
            AppError::Validation(_)
        ));
        let line = f.svc.add_item(user, f.mat, 1).await.unwrap();
        assert!(matches!(
            f.svc.update_item(user, line.id, -2).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn update_replaces_quantity() {
        let f = fixture();
        let user = Uuid::new_v4();
        let line = f.svc.add_item(user, f.mat, 4).await.unwrap();
        let updated = f.svc.update_item(user, line.id, 2).await.unwrap();
        assert_eq!(updated.id, line.id);
        assert_eq!(updated.quantity, 2);
    }

    #[tokio::test]
    async fn foreign_lines_are_invisible() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let line = f.svc.add_item(owner, f.mat, 1).await.unwrap();

        let err = f.svc.update_item(intruder, line.id, 9).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Cart item not found")));
        let err = f.svc.remove_item(intruder, line.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        assert!(f.svc.get_cart(intruder).await.unwrap().is_empty());
        assert_eq!(f.svc.get_cart(owner).await.unwrap()[0].quantity, 1);
    }

    #[tokio::test]
    async fn remove_twice_fails_the_second_time() {
        let f = fixture();
        let user = Uuid::new_v4();
        let line = f.svc.add_item(user, f.mat, 1).await.unwrap();
        f.svc.remove_item(user, line.id).await.unwrap();
        let err = f.svc.remove_item(user, line.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(f.svc.get_cart(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sync_skips_unknown_and_merges_known() {
        let f = fixture();
        let user = Uuid::new_v4();
        f.svc.add_item(user, f.shoes, 1).await.unwrap();

        let outcome = f
            .svc
            .sync_guest_cart(
                user,
                vec![
                    entry(Uuid::new_v4(), 1),
                    entry(f.shoes, 2),
                    entry("not-a-uuid", 1),
                    entry(f.mat, 0),
                    entry(f.mat, 4),
                ],
            )
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome { merged: 2, skipped: 3 });

        let cart = f.svc.get_cart(user).await.unwrap();
        let qty = |id: Uuid| cart.iter().find(|i| i.product.id == id).map(|i| i.quantity);
        assert_eq!(cart.len(), 2);
        assert_eq!(qty(f.shoes), Some(3));
        assert_eq!(qty(f.mat), Some(4));
    }

    #[tokio::test]
    async fn overflowing_add_is_rejected_and_leaves_the_line() {
        let f = fixture();
        let user = Uuid::new_v4();
        f.svc.add_item(user, f.mat, i32::MAX).await.unwrap();
        let err = f.svc.add_item(user, f.mat, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);

        let cart = f.svc.get_cart(user).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, i32::MAX);
    }

    #[tokio::test]
    async fn sync_skips_overflowing_entries_and_continues() {
        let f = fixture();
        let user = Uuid::new_v4();
        f.svc.add_item(user, f.mat, i32::MAX - 1).await.unwrap();

        let outcome = f
            .svc
            .sync_guest_cart(user, vec![entry(f.mat, 5), entry(f.shoes, 2)])
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome { merged: 1, skipped: 1 });

        let cart = f.svc.get_cart(user).await.unwrap();
        let qty = |id: Uuid| cart.iter().find(|i| i.product.id == id).map(|i| i.quantity);
        assert_eq!(qty(f.mat), Some(i32::MAX - 1));
        assert_eq!(qty(f.shoes), Some(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_land_on_one_line() {
        const N: i32 = 32;
        let f = fixture();
        let user = Uuid::new_v4();

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..N {
            let svc = f.svc.clone();
            let mat = f.mat;
            tasks.spawn(async move { svc.add_item(user, mat, 1).await });
        }
        while let Some(res) = tasks.join_next().await {
            res.unwrap().unwrap();
        }

        let cart = f.svc.get_cart(user).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, N);
    }

    #[tokio::test]
    async fn update_on_vanished_product_leaves_quantity_alone() {
        let f = fixture();
        let user = Uuid::new_v4();
        let line = f.svc.add_item(user, f.mat, 2).await.unwrap();
        f.products.remove(f.mat).await;

        let err = f.svc.update_item(user, line.id, 9).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Product not found")));

        let stored = f.svc.cart.list_by_user(user).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].quantity, 2);
    }

    #[tokio::test]
    async fn cart_read_omits_vanished_products() {
        let f = fixture();
        let user = Uuid::new_v4();
        f.svc.add_item(user, f.mat, 1).await.unwrap();
        f.svc.add_item(user, f.shoes, 1).await.unwrap();

        f.products.remove(f.mat).await;

        let cart = f.svc.get_cart(user).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].product.id, f.shoes);
    }
}
