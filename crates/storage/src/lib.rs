//! SQLite backend for the indicator store and both message channels.

mod outbox;
mod store;
mod triggers;

pub use outbox::SqliteOutbox;
pub use store::SqliteStore;
pub use triggers::{enqueue_trigger, SqliteTriggerSource};

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use common::{Error, Result};

/// Open the database at `url` and bring its schema up to date.
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

    // Every connection to an in-memory database sees its own empty database
    let max_connections = if url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .map_err(|e| Error::Store(format!("database migration failed: {e}")))?;

    info!(max_connections, "Database ready");
    Ok(pool)
}
