use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order_id: Uuid,
    pub total_amount: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemView {
    pub product_id: Uuid,
    pub product_name: String,
    pub price_at_order: i64,
    pub quantity: i32,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderView {
    pub order_id: Uuid,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<OrderView>)]
    pub items: Vec<OrderView>,
}
