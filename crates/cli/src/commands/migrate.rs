//! Database migration command.
//!
//! Migration files live in `crates/api/migrations/`; the path is resolved at
//! compile time so the binary carries the migrations with it.

use tracing::info;

use super::{CommandError, connect};

/// Run the order service database migrations.
///
/// # Errors
///
/// Returns an error if `API_DATABASE_URL` is unset, the database is
/// unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    info!("Connecting to order service database...");
    let pool = connect().await?;

    info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
