//! Expiry sweeper entry point, meant to be run from cron or a systemd
//! timer. Failures are logged, never raised: a missed sweep only defers
//! cleanup to the next scheduled run.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use axum_commerce_api::{config::AppConfig, db::create_orm_conn, services::sweep_service};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,axum_commerce_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;

    match sweep_service::sweep_expired(&orm).await {
        Ok(0) => tracing::info!("no expired carts found"),
        Ok(cleaned) => tracing::info!(carts_cleaned = cleaned, "cleanup completed"),
        Err(err) => tracing::error!(error = %err, "failed to clear expired carts"),
    }

    Ok(())
}
