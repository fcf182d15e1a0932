//! Checkout and order history. Checkout converts the active cart into an
//! immutable order in one transaction; stock is not touched because it was
//! already taken out of the pool when the items were reserved.

use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{CheckoutResponse, OrderItemView, OrderList, OrderView},
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::Entity as Products,
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    response::Meta,
    routes::params::Pagination,
    state::AppState,
};

/// Turn the user's active cart into an order.
///
/// One transaction end to end: the cart row is locked so neither the
/// sweeper nor another handler can touch it mid-checkout, the total is
/// computed from current prices, order and order items are written, and
/// the cart is deleted (its items go with it via the FK cascade). A crash
/// anywhere before commit leaves no order and an intact cart.
pub async fn checkout(state: &AppState, user_id: Uuid) -> AppResult<CheckoutResponse> {
    let txn = state.orm.begin().await?;

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .filter(CartCol::ExpiresAt.gt(Utc::now()))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::CartExpired)?;

    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .find_also_related(Products)
        .all(&txn)
        .await?;

    if rows.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let mut lines = Vec::with_capacity(rows.len());
    let mut total_amount: i64 = 0;
    for (item, product) in rows {
        let product = product.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("cart item without product row"))
        })?;
        total_amount += product.price * i64::from(item.quantity);
        lines.push((item, product));
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        total_amount: Set(total_amount),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for (item, product) in lines {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            price_at_order: Set(product.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    // Stock stays where it is: the reserved units are consumed by the
    // order, not returned to the pool.
    Carts::delete_by_id(cart.id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, %user_id, total_amount, "checkout complete");

    Ok(CheckoutResponse {
        order_id: order.id,
        total_amount,
    })
}

/// The user's orders, newest first, each with its captured line items.
pub async fn list_orders(
    state: &AppState,
    user_id: Uuid,
    pagination: Pagination,
) -> AppResult<(OrderList, Meta)> {
    if Users::find_by_id(user_id).one(&state.orm).await?.is_none() {
        return Err(AppError::UserNotFound);
    }

    let (page, limit, offset) = pagination.normalize();

    let finder = Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        let rows = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order.id))
            .find_also_related(Products)
            .all(&state.orm)
            .await?;

        let items = rows
            .into_iter()
            .map(|(item, product)| OrderItemView {
                product_id: item.product_id,
                product_name: product.map(|p| p.name).unwrap_or_default(),
                price_at_order: item.price_at_order,
                quantity: item.quantity,
                subtotal: item.price_at_order * i64::from(item.quantity),
            })
            .collect();

        views.push(OrderView {
            order_id: order.id,
            total_amount: order.total_amount,
            created_at: order.created_at.with_timezone(&Utc),
            items,
        });
    }

    let meta = Meta::new(page, limit, total);
    Ok((OrderList { items: views }, meta))
}
