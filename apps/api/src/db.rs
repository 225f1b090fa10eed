use std::time::Duration;

use anyhow::{bail, Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Creates a PostgreSQL connection pool and applies pending migrations.
/// Makes up to `attempts` connection attempts, `RETRY_DELAY` apart.
pub async fn create_pool(database_url: &str, attempts: u32) -> Result<PgPool> {
    let attempts = attempts.max(1);

    for attempt in 1..=attempts {
        info!("Connecting to PostgreSQL (attempt {attempt}/{attempts})...");

        match PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .context("Failed to run database migrations")?;
                info!("PostgreSQL connection pool established");
                return Ok(pool);
            }
            Err(e) => {
                warn!("Failed to connect to PostgreSQL: {e}");
                if attempt < attempts {
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    bail!("Unable to connect to PostgreSQL after {attempts} attempts")
}
