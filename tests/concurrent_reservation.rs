mod common;

use axum_commerce_api::{error::AppError, services::cart_service};

use common::{available_quantity, create_product, create_user, setup_state};

// Two handlers racing for the same stock: the conditional decrement lets
// exactly one past the check, and the pool never goes negative.
#[tokio::test]
async fn concurrent_adds_cannot_overdraw_stock() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let alice = create_user(&state, "alice_smith", "alice@example.com").await?;
    let bob = create_user(&state, "john_doe", "john@example.com").await?;
    let tablet = create_product(&state, "Tablet", 35_000, 10).await?;

    let state_a = state.clone();
    let state_b = state.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { cart_service::add_item(&state_a, alice, tablet, 6).await }),
        tokio::spawn(async move { cart_service::add_item(&state_b, bob, tablet, 6).await }),
    );
    let results = [a?, b?];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one reservation may win");
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(AppError::InsufficientStock))),
        "the loser fails with InsufficientStock"
    );

    assert_eq!(available_quantity(&state, tablet).await?, 4);

    Ok(())
}
