use axum::Router;
use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{ActiveCartResponse, AddItemRequest, CartLine, CartView, RemoveItemRequest},
        orders::{CheckoutResponse, OrderItemView, OrderList, OrderView},
        products::{CreateProductRequest, ProductList},
    },
    models::{Cart, CartItem, Order, OrderItem, Product, User},
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, orders, params, products, users},
    state::AppState,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        users::list_users,
        products::list_products,
        products::get_product,
        products::create_product,
        cart::open_cart,
        cart::view_cart,
        cart::add_item,
        cart::remove_item,
        orders::checkout,
        orders::list_orders
    ),
    components(
        schemas(
            User,
            Product,
            Cart,
            CartItem,
            Order,
            OrderItem,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            ProductList,
            AddItemRequest,
            RemoveItemRequest,
            ActiveCartResponse,
            CartLine,
            CartView,
            CheckoutResponse,
            OrderItemView,
            OrderView,
            OrderList,
            users::UserList,
            params::Pagination,
            Meta,
            ApiResponse<serde_json::Value>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "User listing"),
        (name = "Products", description = "Catalog"),
        (name = "Cart", description = "Time-limited cart with stock reservation"),
        (name = "Orders", description = "Checkout and order history")
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Router<AppState> {
    Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()))
}
