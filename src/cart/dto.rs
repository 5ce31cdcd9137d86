use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::repo_types::Product;

fn default_quantity() -> i32 {
    1
}

/// Body of `POST /cart`; also one entry of a guest cart.
#[derive(Debug, Clone, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

pub type GuestCartEntry = AddItemRequest;

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// A cart line joined with its catalog record.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub message: &'static str,
    pub merged: usize,
    pub skipped: usize,
}
