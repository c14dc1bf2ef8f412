use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{info, instrument};

use crate::application::ports::RepositoryError;
use crate::application::services::RetryPolicy;
use crate::infrastructure::observability::sanitize_url;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection failures are retried under `connect_retry`.
#[instrument(skip(url, connect_retry), fields(database = %sanitize_url(url)))]
pub async fn create_pool(
    url: &str,
    max_connections: u32,
    connect_retry: RetryPolicy,
) -> Result<PgPool, RepositoryError> {
    let options = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT);

    let pool = connect_retry
        .run("postgres_connect", || {
            let options = options.clone();
            async move {
                options
                    .connect(url)
                    .await
                    .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))
            }
        })
        .await
        .map_err(|e| e.into_last())?;

    info!(max_connections, "PostgreSQL connection pool established");
    Ok(pool)
}

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::migrate!()
        .run(pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(format!("migration failed: {e}")))?;
    info!("Database migrations applied");
    Ok(())
}
