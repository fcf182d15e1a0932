//! Stock ledger. Every unit of a product is either available here,
//! reserved in an active cart, or consumed by an order; reserve and
//! release are the only two ways quantities move in or out.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    entity::products::{Column as ProdCol, Entity as Products},
    error::{AppError, AppResult},
};

/// Atomically take `qty` units out of the available pool.
///
/// The existence check and the decrement are one conditional UPDATE, so two
/// concurrent reservations can never both pass the stock check: the row
/// predicate `available_quantity >= qty` is re-evaluated under the row lock
/// the UPDATE itself takes. Zero rows affected means not enough stock.
pub async fn reserve<C: ConnectionTrait>(conn: &C, product_id: Uuid, qty: i32) -> AppResult<()> {
    let result = Products::update_many()
        .col_expr(
            ProdCol::AvailableQuantity,
            Expr::col(ProdCol::AvailableQuantity).sub(qty),
        )
        .col_expr(ProdCol::Version, Expr::col(ProdCol::Version).add(1))
        .filter(ProdCol::Id.eq(product_id))
        .filter(ProdCol::AvailableQuantity.gte(qty))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::InsufficientStock);
    }

    tracing::debug!(%product_id, qty, "reserved stock");
    Ok(())
}

/// Return `qty` units to the available pool. The inverse of [`reserve`];
/// callers release exactly what they reserved, so no upper bound applies.
pub async fn release<C: ConnectionTrait>(conn: &C, product_id: Uuid, qty: i32) -> AppResult<()> {
    let result = Products::update_many()
        .col_expr(
            ProdCol::AvailableQuantity,
            Expr::col(ProdCol::AvailableQuantity).add(qty),
        )
        .col_expr(ProdCol::Version, Expr::col(ProdCol::Version).add(1))
        .filter(ProdCol::Id.eq(product_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::ProductNotFound);
    }

    tracing::debug!(%product_id, qty, "released stock");
    Ok(())
}
