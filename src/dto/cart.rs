use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveItemRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActiveCartResponse {
    pub cart_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    pub product: String,
    pub price: i64,
    pub quantity: i32,
    pub subtotal: i64,
}

/// Snapshot of the active cart; all-empty when no active cart exists.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total: i64,
    pub expires_in: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CartView {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            expires_in: None,
            expires_at: None,
        }
    }
}
