//! Database migration runner.

use sqlx::PgPool;
use tracing::info;

use thumbhub_core::error::{AppError, ErrorKind};

/// Apply the pixels, rendering settings, and thumbnail schema.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to run migrations: {e}"),
                e,
            )
        })?;

    info!("Thumbnail schema is up to date");
    Ok(())
}
