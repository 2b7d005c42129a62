//! `PostgreSQL` repositories.
//!
//! Queries are checked at runtime (`sqlx::query`) so the crate builds without
//! a live database. Documents travel as `sqlx::types::Json`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use foodlane_core::{
    Email, Food, FoodId, Offer, OfferId, Order, OrderId, Pincode, User, UserId, Vendor,
    VendorChange, VendorId,
};

use super::{
    FoodRepository, OfferRepository, OrderRepository, RepositoryError, UserRepository,
    VendorRepository,
};

/// Repositories over a shared connection pool.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique violation to `Conflict`, anything else to `Database`.
fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

fn expect_one_row(rows_affected: u64) -> Result<(), RepositoryError> {
    if rows_affected == 0 {
        Err(RepositoryError::NotFound)
    } else {
        Ok(())
    }
}

// =============================================================================
// Users
// =============================================================================

#[async_trait]
impl UserRepository for PgStore {
    async fn insert(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO foodlane.users (id, email, doc, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(user.id.as_uuid())
        .bind(user.email.as_str())
        .bind(Json(user))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;
        Ok(())
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row =
            sqlx::query_scalar::<_, Json<User>>("SELECT doc FROM foodlane.users WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|Json(user)| user))
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row =
            sqlx::query_scalar::<_, Json<User>>("SELECT doc FROM foodlane.users WHERE email = $1")
                .bind(email.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|Json(user)| user))
    }

    async fn update(&self, user: &User) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE foodlane.users
            SET email = $2, doc = $3, updated_at = $4
            WHERE id = $1
            ",
        )
        .bind(user.id.as_uuid())
        .bind(user.email.as_str())
        .bind(Json(user))
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;
        expect_one_row(result.rows_affected())
    }
}

// =============================================================================
// Vendors
// =============================================================================

#[async_trait]
impl VendorRepository for PgStore {
    async fn insert(&self, vendor: &Vendor) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO foodlane.vendors (id, email, pincode, doc, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(vendor.id.as_uuid())
        .bind(vendor.email.as_str())
        .bind(vendor.pincode.as_str())
        .bind(Json(vendor))
        .bind(vendor.created_at)
        .bind(vendor.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;
        Ok(())
    }

    async fn get(&self, id: VendorId) -> Result<Option<Vendor>, RepositoryError> {
        let row =
            sqlx::query_scalar::<_, Json<Vendor>>("SELECT doc FROM foodlane.vendors WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|Json(vendor)| vendor))
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<Vendor>, RepositoryError> {
        let row = sqlx::query_scalar::<_, Json<Vendor>>(
            "SELECT doc FROM foodlane.vendors WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|Json(vendor)| vendor))
    }

    async fn update(&self, vendor: &Vendor) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE foodlane.vendors
            SET email = $2, pincode = $3,
                doc = $4 || jsonb_build_object('foods', doc -> 'foods'),
                updated_at = $5
            WHERE id = $1
            ",
        )
        .bind(vendor.id.as_uuid())
        .bind(vendor.email.as_str())
        .bind(vendor.pincode.as_str())
        .bind(Json(vendor))
        .bind(vendor.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;
        expect_one_row(result.rows_affected())
    }

    async fn change(
        &self,
        id: VendorId,
        change: VendorChange,
        now: DateTime<Utc>,
    ) -> Result<Vendor, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_scalar::<_, Json<Vendor>>(
            "SELECT doc FROM foodlane.vendors WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(Json(mut vendor)) = row else {
            return Err(RepositoryError::NotFound);
        };

        change.apply(&mut vendor, now);
        sqlx::query(
            "UPDATE foodlane.vendors SET pincode = $2, doc = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(vendor.id.as_uuid())
        .bind(vendor.pincode.as_str())
        .bind(Json(&vendor))
        .bind(vendor.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(vendor)
    }

    async fn list(&self) -> Result<Vec<Vendor>, RepositoryError> {
        let rows = sqlx::query_scalar::<_, Json<Vendor>>(
            "SELECT doc FROM foodlane.vendors ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(vendor)| vendor).collect())
    }

    async fn list_by_pincode(&self, pincode: &Pincode) -> Result<Vec<Vendor>, RepositoryError> {
        let rows = sqlx::query_scalar::<_, Json<Vendor>>(
            "SELECT doc FROM foodlane.vendors WHERE pincode = $1 ORDER BY created_at, id",
        )
        .bind(pincode.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(vendor)| vendor).collect())
    }
}

// =============================================================================
// Foods
// =============================================================================

#[async_trait]
impl FoodRepository for PgStore {
    async fn insert_for_vendor(&self, food: &Food) -> Result<Vendor, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_scalar::<_, Json<Vendor>>(
            "SELECT doc FROM foodlane.vendors WHERE id = $1 FOR UPDATE",
        )
        .bind(food.vendor_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(Json(mut vendor)) = row else {
            return Err(RepositoryError::NotFound);
        };

        sqlx::query(
            r"
            INSERT INTO foodlane.foods (id, vendor_id, doc, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(food.id.as_uuid())
        .bind(food.vendor_id.as_uuid())
        .bind(Json(food))
        .bind(food.created_at)
        .execute(&mut *tx)
        .await?;

        vendor.register_food(food.id, Utc::now());
        sqlx::query("UPDATE foodlane.vendors SET doc = $2, updated_at = $3 WHERE id = $1")
            .bind(vendor.id.as_uuid())
            .bind(Json(&vendor))
            .bind(vendor.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(vendor)
    }

    async fn get_many(&self, ids: &[FoodId]) -> Result<Vec<Food>, RepositoryError> {
        let keys: Vec<Uuid> = ids.iter().map(FoodId::as_uuid).collect();
        let rows = sqlx::query_scalar::<_, Json<Food>>(
            "SELECT doc FROM foodlane.foods WHERE id = ANY($1)",
        )
        .bind(keys)
        .fetch_all(&self.pool)
        .await?;

        let mut by_id: HashMap<FoodId, Food> =
            rows.into_iter().map(|Json(food)| (food.id, food)).collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Food>, RepositoryError> {
        let rows = sqlx::query_scalar::<_, Json<Food>>(
            "SELECT doc FROM foodlane.foods WHERE vendor_id = $1 ORDER BY created_at, id",
        )
        .bind(vendor_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(food)| food).collect())
    }
}

// =============================================================================
// Offers
// =============================================================================

#[async_trait]
impl OfferRepository for PgStore {
    async fn insert(&self, offer: &Offer) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO foodlane.offers (id, doc, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(offer.id.as_uuid())
        .bind(Json(offer))
        .bind(offer.created_at)
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "offer"))?;
        Ok(())
    }

    async fn get(&self, id: OfferId) -> Result<Option<Offer>, RepositoryError> {
        let row =
            sqlx::query_scalar::<_, Json<Offer>>("SELECT doc FROM foodlane.offers WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|Json(offer)| offer))
    }

    async fn update(&self, offer: &Offer) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE foodlane.offers SET doc = $2, updated_at = $3 WHERE id = $1")
                .bind(offer.id.as_uuid())
                .bind(Json(offer))
                .bind(offer.updated_at)
                .execute(&self.pool)
                .await?;
        expect_one_row(result.rows_affected())
    }

    async fn list(&self) -> Result<Vec<Offer>, RepositoryError> {
        let rows =
            sqlx::query_scalar::<_, Json<Offer>>("SELECT doc FROM foodlane.offers ORDER BY seq")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|Json(offer)| offer).collect())
    }
}

// =============================================================================
// Orders
// =============================================================================

#[async_trait]
impl OrderRepository for PgStore {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO foodlane.orders (id, user_id, vendor_id, doc, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.vendor_id.as_uuid())
        .bind(Json(order))
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row =
            sqlx::query_scalar::<_, Json<Order>>("SELECT doc FROM foodlane.orders WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|Json(order)| order))
    }

    async fn update(&self, order: &Order) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE foodlane.orders SET doc = $2, updated_at = $3 WHERE id = $1")
                .bind(order.id.as_uuid())
                .bind(Json(order))
                .bind(order.updated_at)
                .execute(&self.pool)
                .await?;
        expect_one_row(result.rows_affected())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_scalar::<_, Json<Order>>(
            "SELECT doc FROM foodlane.orders WHERE user_id = $1 ORDER BY created_at, id",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(order)| order).collect())
    }

    async fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_scalar::<_, Json<Order>>(
            "SELECT doc FROM foodlane.orders WHERE vendor_id = $1 ORDER BY created_at, id",
        )
        .bind(vendor_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(order)| order).collect())
    }
}
