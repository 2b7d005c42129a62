//! Subcommand implementations.

pub mod migrate;
pub mod offer;
pub mod vendor;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use foodlane_server::db::{self, Store};

/// Errors shared by every command that talks to the database.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Neither database variable is set.
    #[error("Missing environment variable: FOODLANE_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect using `FOODLANE_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// # Errors
///
/// Returns `CommandError::MissingDatabaseUrl` when neither is set.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("FOODLANE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&url).await?)
}

/// Open a Postgres-backed store.
///
/// # Errors
///
/// See [`connect`].
pub async fn store() -> Result<Store, CommandError> {
    Ok(Store::postgres(connect().await?))
}
