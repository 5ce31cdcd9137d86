use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{ProductFilter, ProductQuery},
    repo_types::Product,
    services::CatalogService,
};
use crate::{
    error::{parse_id, AppResult},
    state::AppState,
};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
}

#[instrument(skip(catalog))]
pub async fn list_products(
    State(catalog): State<CatalogService>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let filter = ProductFilter::from(query);
    catalog.list_products(&filter).await.map(Json)
}

#[instrument(skip(catalog))]
pub async fn get_product(
    State(catalog): State<CatalogService>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let id = parse_id(&id, "Product not found")?;
    catalog.get_product(id).await.map(Json)
}
