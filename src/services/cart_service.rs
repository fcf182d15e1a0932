//! Cart lifecycle: one active cart per user, reservation-on-add, lazy
//! expiry cleanup on the creation path. Every mutating operation runs in a
//! transaction and serializes on the user row, so two handlers for the same
//! user (or a handler and the sweeper fighting over an expired cart) cannot
//! interleave destructively.

use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::cart::{CartLine, CartView},
    entity::{
        cart_items::{
            ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems,
        },
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        products::{Column as ProdCol, Entity as Products},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    services::inventory_service,
    state::AppState,
};

pub const CART_TTL_MINUTES: i64 = 15;

/// The cart with `expires_at` strictly in the future, or none. Read-only:
/// an already-lapsed cart is simply invisible here, its stock is returned
/// by the creation path or the sweeper, never by a read.
pub async fn get_active_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<Option<CartModel>> {
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .filter(CartCol::ExpiresAt.gt(Utc::now()))
        .one(conn)
        .await?;
    Ok(cart)
}

/// Same lookup but with a row lock, for mutating paths inside a transaction.
async fn get_active_cart_locked<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<Option<CartModel>> {
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .filter(CartCol::ExpiresAt.gt(Utc::now()))
        .lock(LockType::Update)
        .one(conn)
        .await?;
    Ok(cart)
}

/// Release every item of `cart_id` back to the ledger. Both the lazy path
/// here and the sweeper funnel through this, so the two cleanup paths
/// cannot diverge. Returns the number of items released.
pub async fn release_cart_items<C: ConnectionTrait>(conn: &C, cart_id: Uuid) -> AppResult<usize> {
    let items = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .all(conn)
        .await?;

    for item in &items {
        inventory_service::release(conn, item.product_id, item.quantity).await?;
    }

    Ok(items.len())
}

/// Get-or-create inside an existing transaction. Locks the user row first,
/// which is the per-user mutex for all cart lifecycle mutations; if the
/// most recent cart turns out to be expired its stock is released and the
/// cart deleted before a fresh one is created.
pub async fn ensure_active_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<CartModel> {
    let user = Users::find()
        .filter(UserCol::Id.eq(user_id))
        .lock(LockType::Update)
        .one(conn)
        .await?;
    if user.is_none() {
        return Err(AppError::UserNotFound);
    }

    if let Some(cart) = get_active_cart_locked(conn, user_id).await? {
        return Ok(cart);
    }

    // Lazy cleanup: the newest cart, if any, must be expired at this point.
    // The lock ordering matches the sweeper's, and a cart the sweeper
    // already removed simply no longer matches.
    let latest = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .order_by_desc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .one(conn)
        .await?;
    if let Some(expired) = latest {
        if expired.expires_at.with_timezone(&Utc) <= Utc::now() {
            let released = release_cart_items(conn, expired.id).await?;
            Carts::delete_by_id(expired.id).exec(conn).await?;
            tracing::info!(cart_id = %expired.id, items = released, "released expired cart");
        }
    }

    let now = Utc::now();
    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: Set(now.into()),
        expires_at: Set((now + Duration::minutes(CART_TTL_MINUTES)).into()),
    }
    .insert(conn)
    .await?;

    tracing::info!(cart_id = %cart.id, %user_id, "created cart");
    Ok(cart)
}

/// Return the user's active cart, creating one (and lazily cleaning up an
/// expired predecessor) if necessary.
pub async fn get_or_create_active_cart(state: &AppState, user_id: Uuid) -> AppResult<CartModel> {
    let txn = state.orm.begin().await?;
    let cart = ensure_active_cart(&txn, user_id).await?;
    txn.commit().await?;
    Ok(cart)
}

/// Add `qty` of a product to the user's active cart, reserving the stock in
/// the same transaction. On `InsufficientStock` the transaction is dropped
/// whole, so neither the ledger nor the cart changes.
pub async fn add_item(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
    qty: i32,
) -> AppResult<()> {
    if qty <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;

    let cart = ensure_active_cart(&txn, user_id).await?;

    let product = Products::find()
        .filter(ProdCol::Id.eq(product_id))
        .one(&txn)
        .await?;
    if product.is_none() {
        return Err(AppError::ProductNotFound);
    }

    inventory_service::reserve(&txn, product_id, qty).await?;

    let existing = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product_id))
        .one(&txn)
        .await?;

    match existing {
        Some(item) => {
            let new_qty = item.quantity + qty;
            let mut active: CartItemActive = item.into();
            active.quantity = Set(new_qty);
            active.update(&txn).await?;
        }
        None => {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product_id),
                quantity: Set(qty),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;
    Ok(())
}

/// Remove up to `qty` of a product from the active cart, releasing exactly
/// what leaves the cart. Removing at least the held quantity drops the line
/// entirely. Requires an active cart; an expired one is gone, not absent.
pub async fn remove_item(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
    qty: i32,
) -> AppResult<String> {
    if qty <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;

    let cart = get_active_cart_locked(&txn, user_id)
        .await?
        .ok_or(AppError::CartExpired)?;

    let product = Products::find()
        .filter(ProdCol::Id.eq(product_id))
        .one(&txn)
        .await?;
    if product.is_none() {
        return Err(AppError::ProductNotFound);
    }

    let item = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product_id))
        .one(&txn)
        .await?
        .ok_or(AppError::ItemNotInCart)?;

    let message = if qty >= item.quantity {
        inventory_service::release(&txn, product_id, item.quantity).await?;
        CartItems::delete_by_id(item.id).exec(&txn).await?;
        "Item removed from cart".to_string()
    } else {
        inventory_service::release(&txn, product_id, qty).await?;
        let new_qty = item.quantity - qty;
        let mut active: CartItemActive = item.into();
        active.quantity = Set(new_qty);
        active.update(&txn).await?;
        format!("Reduced quantity by {qty}")
    };

    txn.commit().await?;
    Ok(message)
}

/// Item list with subtotals, cart total and time to expiry. No active cart
/// is an empty view, not an error.
pub async fn view_cart(state: &AppState, user_id: Uuid) -> AppResult<CartView> {
    let cart = match get_active_cart(&state.orm, user_id).await? {
        Some(cart) => cart,
        None => return Ok(CartView::empty()),
    };

    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .find_also_related(Products)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    let mut total: i64 = 0;
    for (item, product) in rows {
        let product = product.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("cart item without product row"))
        })?;
        let subtotal = product.price * i64::from(item.quantity);
        total += subtotal;
        items.push(CartLine {
            product_id: product.id,
            product: product.name,
            price: product.price,
            quantity: item.quantity,
            subtotal,
        });
    }

    let expires_at = cart.expires_at.with_timezone(&Utc);
    Ok(CartView {
        items,
        total,
        expires_in: Some(format_remaining(expires_at, Utc::now())),
        expires_at: Some(expires_at),
    })
}

/// Render the time left as `"{m}m {s}s"`, clamping negative remainders to
/// zero so a cart read just past its deadline never shows negative time.
fn format_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (expires_at - now).num_seconds().max(0);
    format!("{}m {}s", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_time_is_minutes_and_seconds() {
        let now = Utc::now();
        let expires = now + Duration::seconds(14 * 60 + 42);
        assert_eq!(format_remaining(expires, now), "14m 42s");
    }

    #[test]
    fn remaining_time_clamps_to_zero_when_past() {
        let now = Utc::now();
        let expires = now - Duration::seconds(90);
        assert_eq!(format_remaining(expires, now), "0m 0s");
    }

    #[test]
    fn full_ttl_renders_as_fifteen_minutes() {
        let now = Utc::now();
        let expires = now + Duration::minutes(CART_TTL_MINUTES);
        assert_eq!(format_remaining(expires, now), "15m 0s");
    }
}
