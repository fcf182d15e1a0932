mod common;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use axum_commerce_api::{
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        carts::Entity as Carts,
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders},
    },
    error::AppError,
    routes::params::Pagination,
    services::{cart_service, order_service},
};

use common::{available_quantity, create_product, create_user, setup_state};

// Reservation on add, symmetric release on remove, and an atomic checkout
// that consumes the reserved stock.
#[tokio::test]
async fn reserve_release_and_checkout_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let user_id = create_user(&state, "dhina", "dhina@example.com").await?;
    let laptop = create_product(&state, "Laptop", 100, 10).await?;
    let mouse = create_product(&state, "Mouse", 50, 20).await?;

    // Adding 4 reserves 4.
    cart_service::add_item(&state, user_id, laptop, 4).await?;
    assert_eq!(available_quantity(&state, laptop).await?, 6);

    let cart = cart_service::get_active_cart(&state.orm, user_id)
        .await?
        .expect("active cart");
    let item = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(laptop))
        .one(&state.orm)
        .await?
        .expect("cart item");
    assert_eq!(item.quantity, 4);

    // Overdraw fails whole and leaves no partial state.
    let err = cart_service::add_item(&state, user_id, laptop, 7)
        .await
        .expect_err("only 6 left");
    assert!(matches!(err, AppError::InsufficientStock));
    assert_eq!(available_quantity(&state, laptop).await?, 6);
    let item = CartItems::find_by_id(item.id)
        .one(&state.orm)
        .await?
        .expect("cart item untouched");
    assert_eq!(item.quantity, 4);

    // Removing at least the held quantity drops the line and restores stock.
    let message = cart_service::remove_item(&state, user_id, laptop, 4).await?;
    assert_eq!(message, "Item removed from cart");
    assert_eq!(available_quantity(&state, laptop).await?, 10);
    assert!(CartItems::find_by_id(item.id).one(&state.orm).await?.is_none());

    // Removing what is not there is its own error.
    let err = cart_service::remove_item(&state, user_id, laptop, 1)
        .await
        .expect_err("nothing to remove");
    assert!(matches!(err, AppError::ItemNotInCart));

    // Partial removal releases exactly the removed quantity.
    cart_service::add_item(&state, user_id, laptop, 4).await?;
    cart_service::add_item(&state, user_id, mouse, 3).await?;
    let message = cart_service::remove_item(&state, user_id, mouse, 1).await?;
    assert_eq!(message, "Reduced quantity by 1");
    assert_eq!(available_quantity(&state, mouse).await?, 18);

    // Repeated adds increment the existing line instead of duplicating it.
    cart_service::add_item(&state, user_id, mouse, 1).await?;
    let lines = CartItems::find()
        .filter(CartItemCol::ProductId.eq(mouse))
        .all(&state.orm)
        .await?;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 3);

    let view = cart_service::view_cart(&state, user_id).await?;
    assert_eq!(view.items.len(), 2);
    assert_eq!(view.total, 4 * 100 + 3 * 50);
    assert!(view.expires_at.is_some());
    assert!(view.expires_in.is_some());

    // Checkout: order appears with current-price total, cart is gone,
    // stock stays where reservation put it.
    let checkout = order_service::checkout(&state, user_id).await?;
    assert_eq!(checkout.total_amount, 4 * 100 + 3 * 50);

    assert!(Carts::find_by_id(cart.id).one(&state.orm).await?.is_none());
    assert_eq!(available_quantity(&state, laptop).await?, 6);
    assert_eq!(available_quantity(&state, mouse).await?, 17);

    let order = Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .one(&state.orm)
        .await?
        .expect("order row");
    assert_eq!(order.total_amount, checkout.total_amount);

    let order_items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?;
    assert_eq!(order_items.len(), 2);
    let laptop_line = order_items
        .iter()
        .find(|i| i.product_id == laptop)
        .expect("laptop line");
    assert_eq!(laptop_line.quantity, 4);
    assert_eq!(laptop_line.price_at_order, 100);

    // A second checkout has nothing to work with.
    let err = order_service::checkout(&state, user_id)
        .await
        .expect_err("cart is gone");
    assert!(matches!(err, AppError::CartExpired));

    // History shows the order with its captured prices.
    let (orders, _meta) = order_service::list_orders(
        &state,
        user_id,
        Pagination {
            page: None,
            per_page: None,
        },
    )
    .await?;
    assert_eq!(orders.items.len(), 1);
    assert_eq!(orders.items[0].items.len(), 2);

    // An open-but-empty cart cannot be checked out.
    let other = create_user(&state, "john_doe", "john@example.com").await?;
    cart_service::get_or_create_active_cart(&state, other).await?;
    let err = order_service::checkout(&state, other)
        .await
        .expect_err("nothing in cart");
    assert!(matches!(err, AppError::EmptyCart));

    // Unknown ids are rejected up front.
    let ghost = uuid::Uuid::new_v4();
    let err = cart_service::get_or_create_active_cart(&state, ghost)
        .await
        .expect_err("no such user");
    assert!(matches!(err, AppError::UserNotFound));

    let err = cart_service::add_item(&state, other, uuid::Uuid::new_v4(), 1)
        .await
        .expect_err("no such product");
    assert!(matches!(err, AppError::ProductNotFound));

    Ok(())
}
