mod common;

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Set};

use axum_commerce_api::{
    entity::carts::ActiveModel as CartActive,
    error::AppError,
    services::{cart_service, order_service, sweep_service},
};

use common::{available_quantity, create_product, create_user, setup_state};

// An expired cart is invisible to reads, blocks checkout with a gone
// semantic, and both cleanup paths (sweep and lazy re-create) return its
// reserved stock exactly once.
#[tokio::test]
async fn expired_carts_release_stock_exactly_once() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user_id = create_user(&state, "dhina", "dhina@example.com").await?;
    let phone = create_product(&state, "Phone", 45_000, 10).await?;

    cart_service::add_item(&state, user_id, phone, 3).await?;
    assert_eq!(available_quantity(&state, phone).await?, 7);

    // Push the cart past its deadline.
    let cart = cart_service::get_active_cart(&state.orm, user_id)
        .await?
        .expect("active cart");
    let cart_id = cart.id;
    let mut active: CartActive = cart.into();
    active.expires_at = Set((Utc::now() - Duration::minutes(1)).into());
    active.update(&state.orm).await?;

    // The lapsed cart is absent on the read path but nothing is released.
    assert!(
        cart_service::get_active_cart(&state.orm, user_id)
            .await?
            .is_none()
    );
    assert_eq!(available_quantity(&state, phone).await?, 7);

    let view = cart_service::view_cart(&state, user_id).await?;
    assert!(view.items.is_empty());
    assert_eq!(view.total, 0);
    assert!(view.expires_at.is_none());

    let err = order_service::checkout(&state, user_id)
        .await
        .expect_err("cart lapsed");
    assert!(matches!(err, AppError::CartExpired));

    let err = cart_service::remove_item(&state, user_id, phone, 1)
        .await
        .expect_err("cart lapsed");
    assert!(matches!(err, AppError::CartExpired));

    // The sweep releases the reservation and deletes the cart.
    let cleaned = sweep_service::sweep_expired(&state.orm).await?;
    assert_eq!(cleaned, 1);
    assert_eq!(available_quantity(&state, phone).await?, 10);

    // Idempotent: a back-to-back sweep finds nothing to release.
    let cleaned = sweep_service::sweep_expired(&state.orm).await?;
    assert_eq!(cleaned, 0);
    assert_eq!(available_quantity(&state, phone).await?, 10);

    // Lazy path: an expired predecessor is cleaned up inline before a
    // fresh cart is created.
    cart_service::add_item(&state, user_id, phone, 2).await?;
    assert_eq!(available_quantity(&state, phone).await?, 8);
    let cart = cart_service::get_active_cart(&state.orm, user_id)
        .await?
        .expect("active cart");
    assert_ne!(cart.id, cart_id);
    let mut active: CartActive = cart.clone().into();
    active.expires_at = Set((Utc::now() - Duration::minutes(1)).into());
    active.update(&state.orm).await?;

    let fresh = cart_service::get_or_create_active_cart(&state, user_id).await?;
    assert_ne!(fresh.id, cart.id);
    assert!(fresh.expires_at.with_timezone(&Utc) > Utc::now());
    assert_eq!(available_quantity(&state, phone).await?, 10);

    let view = cart_service::view_cart(&state, user_id).await?;
    assert!(view.items.is_empty());

    Ok(())
}
