//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! foodlane migrate
//! ```
//!
//! Migrations live in `crates/server/migrations/` and are embedded at build
//! time.

use thiserror::Error;

use super::CommandError;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
