use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, instrument, warn};

use crate::application::ports::RepositoryError;

const MAX_ATTEMPTS: u32 = 6;
const INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Connects with exponential backoff so the service survives a database
/// that comes up slower than it does.
#[instrument(skip(url))]
pub async fn create_pool(url: &str, max_connections: u32) -> Result<PgPool, RepositoryError> {
    let options = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5));

    let mut delay = INITIAL_DELAY;
    for attempt in 1..=MAX_ATTEMPTS {
        match options.clone().connect(url).await {
            Ok(pool) => {
                info!(attempt, "PostgreSQL connection pool established");
                return Ok(pool);
            }
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!(
                    error = %e,
                    attempt,
                    delay_ms = delay.as_millis(),
                    "PostgreSQL connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(RepositoryError::ConnectionFailed(e.to_string())),
        }
    }
    unreachable!("connect loop returns on success or final failure")
}
