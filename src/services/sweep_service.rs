//! Scheduled cleanup of expired carts. Each batch is one transaction:
//! release every reserved quantity, then delete the carts. A cart deleted
//! by the batch cannot be swept twice, and a cart the lazy creation path
//! already cleaned up simply no longer matches the predicate, so a
//! back-to-back sweep releases nothing.

use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect, TransactionTrait};
use std::time::Duration;

use crate::{
    db::OrmConn,
    entity::carts::{Column as CartCol, Entity as Carts},
    error::{AppError, AppResult},
    services::cart_service,
};

const MAX_ATTEMPTS: u32 = 5;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Release and delete every cart past its expiry. Returns the number of
/// carts cleaned. Transient storage contention is retried with a fixed
/// backoff; anything else, or exhausting the retries, surfaces as an error
/// the scheduler-facing caller logs rather than raises.
pub async fn sweep_expired(conn: &OrmConn) -> AppResult<usize> {
    let mut attempt = 1;
    loop {
        match sweep_batch(conn).await {
            Ok(cleaned) => return Ok(cleaned),
            Err(err) if is_retryable(&err) && attempt < MAX_ATTEMPTS => {
                tracing::warn!(
                    attempt,
                    max_attempts = MAX_ATTEMPTS,
                    error = %err,
                    "sweep hit storage contention, retrying"
                );
                tokio::time::sleep(RETRY_DELAY).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn sweep_batch(conn: &OrmConn) -> AppResult<usize> {
    let txn = conn.begin().await?;

    let expired = Carts::find()
        .filter(CartCol::ExpiresAt.lte(Utc::now()))
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    if expired.is_empty() {
        return Ok(0);
    }

    let count = expired.len();
    for cart in &expired {
        let released = cart_service::release_cart_items(&txn, cart.id).await?;
        Carts::delete_by_id(cart.id).exec(&txn).await?;
        tracing::debug!(cart_id = %cart.id, items = released, "swept expired cart");
    }

    txn.commit().await?;

    tracing::info!(carts_cleaned = count, "sweep finished");
    Ok(count)
}

fn is_retryable(err: &AppError) -> bool {
    let AppError::OrmError(db_err) = err else {
        return false;
    };
    if matches!(
        db_err,
        sea_orm::DbErr::Conn(_) | sea_orm::DbErr::ConnectionAcquire(_)
    ) {
        return true;
    }
    let msg = db_err.to_string().to_lowercase();
    msg.contains("lock") || msg.contains("deadlock") || msg.contains("timed out")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn lock_contention_is_retryable() {
        let err = AppError::OrmError(DbErr::Custom("database is locked".into()));
        assert!(is_retryable(&err));

        let err = AppError::OrmError(DbErr::Custom("deadlock detected".into()));
        assert!(is_retryable(&err));
    }

    #[test]
    fn domain_errors_are_not_retryable() {
        assert!(!is_retryable(&AppError::InsufficientStock));
        assert!(!is_retryable(&AppError::CartExpired));

        let err = AppError::OrmError(DbErr::Custom("syntax error".into()));
        assert!(!is_retryable(&err));
    }
}
