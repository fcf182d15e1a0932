use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::cart::{ActiveCartResponse, AddItemRequest, CartView, RemoveItemRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_cart).post(open_cart))
        .route("/items", post(add_item))
        .route("/items/remove", post(remove_item))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    responses(
        (status = 200, description = "Active cart ready", body = ApiResponse<ActiveCartResponse>),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn open_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ActiveCartResponse>>> {
    let cart = cart_service::get_or_create_active_cart(&state, user.user_id).await?;
    let data = ActiveCartResponse {
        cart_id: cart.id,
        expires_at: cart.expires_at.with_timezone(&chrono::Utc),
    };
    Ok(Json(ApiResponse::success(
        "Active cart ready",
        data,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart contents with totals and time to expiry", body = ApiResponse<CartView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let view = cart_service::view_cart(&state, user.user_id).await?;
    Ok(Json(ApiResponse::success("OK", view, None)))
}

#[utoipa::path(
    post,
    path = "/api/cart/items",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Item added to cart"),
        (status = 400, description = "Not enough stock"),
        (status = 404, description = "User or product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddItemRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    cart_service::add_item(&state, user.user_id, payload.product_id, payload.quantity).await?;
    Ok(Json(ApiResponse::success(
        "Item added to cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/cart/items/remove",
    request_body = RemoveItemRequest,
    responses(
        (status = 200, description = "Item removed or quantity reduced"),
        (status = 404, description = "Product not found or not in cart"),
        (status = 410, description = "Cart expired")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RemoveItemRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let message =
        cart_service::remove_item(&state, user.user_id, payload.product_id, payload.quantity)
            .await?;
    Ok(Json(ApiResponse::success(
        message,
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
