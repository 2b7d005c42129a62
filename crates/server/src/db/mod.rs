//! Persistence for users, vendors, foods, offers and orders.
//!
//! Every aggregate sits behind an `async_trait` repository so services never
//! see which backend they run on. [`Store`] bundles one handle per aggregate.
//!
//! # Backends
//!
//! - [`postgres::PgStore`] - `PostgreSQL`, one JSONB document per row plus the
//!   key columns that queries filter on (schema `foodlane`)
//! - [`memory::MemoryStore`] - hash maps behind a Tokio `RwLock`, used for
//!   local development and tests
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p foodlane-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use foodlane_core::{
    Email, Food, FoodId, Offer, OfferId, Order, OrderId, Pincode, User, UserId, Vendor,
    VendorChange, VendorId,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

// =============================================================================
// Repository Traits
// =============================================================================

/// Customer accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// `RepositoryError::Conflict` if the email is already registered.
    async fn insert(&self, user: &User) -> Result<(), RepositoryError>;

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Overwrite a stored user.
    ///
    /// # Errors
    ///
    /// `RepositoryError::NotFound` if no user has this id.
    async fn update(&self, user: &User) -> Result<(), RepositoryError>;
}

/// Vendor accounts.
#[async_trait]
pub trait VendorRepository: Send + Sync {
    /// # Errors
    ///
    /// `RepositoryError::Conflict` if the email is already registered.
    async fn insert(&self, vendor: &Vendor) -> Result<(), RepositoryError>;

    async fn get(&self, id: VendorId) -> Result<Option<Vendor>, RepositoryError>;

    async fn get_by_email(&self, email: &Email) -> Result<Option<Vendor>, RepositoryError>;

    /// Overwrite a stored vendor. The stored food list is kept; foods are
    /// only registered through [`FoodRepository::insert_for_vendor`].
    ///
    /// # Errors
    ///
    /// `RepositoryError::NotFound` if no vendor has this id.
    async fn update(&self, vendor: &Vendor) -> Result<(), RepositoryError>;

    /// Apply `change` to the stored vendor as a single write and return the
    /// result.
    ///
    /// # Errors
    ///
    /// `RepositoryError::NotFound` if no vendor has this id.
    async fn change(
        &self,
        id: VendorId,
        change: VendorChange,
        now: DateTime<Utc>,
    ) -> Result<Vendor, RepositoryError>;

    /// Every vendor, oldest first.
    async fn list(&self) -> Result<Vec<Vendor>, RepositoryError>;

    /// Vendors registered in `pincode`, regardless of service state.
    async fn list_by_pincode(&self, pincode: &Pincode) -> Result<Vec<Vendor>, RepositoryError>;
}

/// Catalog items.
#[async_trait]
pub trait FoodRepository: Send + Sync {
    /// Store `food` and append its id to the owning vendor's food list as a
    /// single write. Returns the updated vendor.
    ///
    /// # Errors
    ///
    /// `RepositoryError::NotFound` if the owning vendor does not exist; in
    /// that case nothing is written.
    async fn insert_for_vendor(&self, food: &Food) -> Result<Vendor, RepositoryError>;

    /// Foods with the given ids. Unknown ids are skipped.
    async fn get_many(&self, ids: &[FoodId]) -> Result<Vec<Food>, RepositoryError>;

    /// Foods owned by `vendor_id`, oldest first.
    async fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Food>, RepositoryError>;
}

/// Promotional offers.
#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn insert(&self, offer: &Offer) -> Result<(), RepositoryError>;

    async fn get(&self, id: OfferId) -> Result<Option<Offer>, RepositoryError>;

    /// # Errors
    ///
    /// `RepositoryError::NotFound` if no offer has this id.
    async fn update(&self, offer: &Offer) -> Result<(), RepositoryError>;

    /// Every offer in insertion order.
    async fn list(&self) -> Result<Vec<Offer>, RepositoryError>;
}

/// Placed orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// # Errors
    ///
    /// `RepositoryError::NotFound` if no order has this id.
    async fn update(&self, order: &Order) -> Result<(), RepositoryError>;

    /// Orders placed by `user_id`, oldest first.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// Orders placed with `vendor_id`, oldest first.
    async fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Order>, RepositoryError>;
}

// =============================================================================
// Store
// =============================================================================

/// One repository handle per aggregate, all backed by the same storage.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub vendors: Arc<dyn VendorRepository>,
    pub foods: Arc<dyn FoodRepository>,
    pub offers: Arc<dyn OfferRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pool: Option<PgPool>,
}

impl Store {
    /// A store backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        Self {
            users: store.clone(),
            vendors: store.clone(),
            foods: store.clone(),
            offers: store.clone(),
            orders: store,
            pool: Some(pool),
        }
    }

    /// A fresh, empty in-memory store.
    #[must_use]
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::default());
        Self {
            users: store.clone(),
            vendors: store.clone(),
            foods: store.clone(),
            offers: store.clone(),
            orders: store,
            pool: None,
        }
    }

    /// Check that the backing storage answers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if `PostgreSQL` is unreachable.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").fetch_one(pool).await?;
        }
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
