use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        AddItemRequest, CartItemResponse, GuestCartEntry, MessageResponse, SyncResponse,
        UpdateItemRequest,
    },
    services::CartService,
};
use crate::{
    auth::AuthUser,
    error::{parse_id, AppResult},
    state::AppState,
};

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart).post(add_item))
        .route("/cart/sync", post(sync_cart))
        .route("/cart/:id", patch(update_item).delete(remove_item))
}

#[instrument(skip(cart, user), fields(user_id = %user.id))]
pub async fn get_cart(
    State(cart): State<CartService>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<CartItemResponse>>> {
    cart.get_cart(user.id).await.map(Json)
}

#[instrument(skip(cart, user, body), fields(user_id = %user.id))]
pub async fn add_item(
    State(cart): State<CartService>,
    AuthUser(user): AuthUser,
    Json(body): Json<AddItemRequest>,
) -> AppResult<Json<CartItemResponse>> {
    let product_id = parse_id(&body.product_id, "Product not found")?;
    cart.add_item(user.id, product_id, body.quantity)
        .await
        .map(Json)
}

#[instrument(skip(cart, user, body), fields(user_id = %user.id))]
pub async fn update_item(
    State(cart): State<CartService>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateItemRequest>,
) -> AppResult<Json<CartItemResponse>> {
    let item_id = parse_id(&id, "Cart item not found")?;
    cart.update_item(user.id, item_id, body.quantity)
        .await
        .map(Json)
}

#[instrument(skip(cart, user), fields(user_id = %user.id))]
pub async fn remove_item(
    State(cart): State<CartService>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let item_id = parse_id(&id, "Cart item not found")?;
    cart.remove_item(user.id, item_id).await?;
    Ok(Json(MessageResponse {
        message: "Item removed from cart",
    }))
}

#[instrument(skip(cart, user, entries), fields(user_id = %user.id, entries = entries.len()))]
pub async fn sync_cart(
    State(cart): State<CartService>,
    AuthUser(user): AuthUser,
    Json(entries): Json<Vec<GuestCartEntry>>,
) -> AppResult<Json<SyncResponse>> {
    let outcome = cart.sync_guest_cart(user.id, entries).await?;
    Ok(Json(SyncResponse {
        message: "Cart synced successfully",
        merged: outcome.merged,
        skipped: outcome.skipped,
    }))
}
