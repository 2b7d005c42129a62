//! Catalog: vendor food management and shopper listings by pincode.
//!
//! Shopper listings only ever include vendors whose service is on.

use std::collections::HashMap;

use chrono::Utc;
use thiserror::Error;

use foodlane_core::{Food, FoodError, FoodId, NewFood, Pincode, Vendor, VendorId};

use crate::db::{RepositoryError, Store};
use crate::models::RestaurantView;

/// Restaurants returned by the top restaurants listing.
pub const TOP_RESTAURANTS_LIMIT: usize = 10;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("vendor not found")]
    VendorNotFound,

    #[error(transparent)]
    InvalidFood(#[from] FoodError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct CatalogService<'a> {
    store: &'a Store,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    // =========================================================================
    // Vendor Side
    // =========================================================================

    /// Create a food and register it under its vendor in one write.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidFood` for a blank name or negative price
    /// and `CatalogError::VendorNotFound` if the vendor doesn't exist.
    pub async fn add_food(
        &self,
        vendor_id: VendorId,
        new: NewFood,
        images: Vec<String>,
    ) -> Result<(Food, Vendor), CatalogError> {
        let food = Food::new(vendor_id, new, images, Utc::now())?;
        let vendor = self
            .store
            .foods
            .insert_for_vendor(&food)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CatalogError::VendorNotFound,
                other => CatalogError::Repository(other),
            })?;

        tracing::info!(vendor_id = %vendor_id, food_id = %food.id, "Food added");
        Ok((food, vendor))
    }

    /// Foods owned by `vendor_id`. An empty list is a valid answer.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if storage fails.
    pub async fn foods_for_vendor(&self, vendor_id: VendorId) -> Result<Vec<Food>, CatalogError> {
        Ok(self.store.foods.list_by_vendor(vendor_id).await?)
    }

    // =========================================================================
    // Shopper Side
    // =========================================================================

    /// Serving vendors in `pincode` with their foods, rating descending then
    /// id ascending.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if storage fails.
    pub async fn availability(
        &self,
        pincode: &Pincode,
    ) -> Result<Vec<RestaurantView>, CatalogError> {
        let vendors = self.serving_vendors(pincode).await?;
        let mut foods = self.foods_of(&vendors).await?;
        Ok(vendors
            .iter()
            .map(|vendor| RestaurantView::new(vendor, take_foods(vendor, &mut foods)))
            .collect())
    }

    /// The best rated serving vendors in `pincode`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if storage fails.
    pub async fn top_restaurants(
        &self,
        pincode: &Pincode,
    ) -> Result<Vec<RestaurantView>, CatalogError> {
        let mut restaurants = self.availability(pincode).await?;
        restaurants.truncate(TOP_RESTAURANTS_LIMIT);
        Ok(restaurants)
    }

    /// Foods from serving vendors in `pincode` ready within `minutes`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if storage fails.
    pub async fn foods_ready_within(
        &self,
        pincode: &Pincode,
        minutes: u32,
    ) -> Result<Vec<Food>, CatalogError> {
        let mut foods = self.foods_in(pincode).await?;
        foods.retain(|food| food.ready_within(minutes));
        Ok(foods)
    }

    /// Foods from serving vendors in `pincode`, optionally filtered by a
    /// name or category substring.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if storage fails.
    pub async fn search(
        &self,
        pincode: &Pincode,
        query: Option<&str>,
    ) -> Result<Vec<Food>, CatalogError> {
        let mut foods = self.foods_in(pincode).await?;
        if let Some(query) = query {
            foods.retain(|food| food.matches(query));
        }
        Ok(foods)
    }

    /// One restaurant with its foods. Vendors whose service is off are
    /// reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::VendorNotFound` if the vendor doesn't exist or
    /// isn't serving.
    pub async fn restaurant(&self, vendor_id: VendorId) -> Result<RestaurantView, CatalogError> {
        let vendor = self
            .store
            .vendors
            .get(vendor_id)
            .await?
            .filter(|vendor| vendor.service_available)
            .ok_or(CatalogError::VendorNotFound)?;
        let mut foods = self.foods_of(std::slice::from_ref(&vendor)).await?;
        let listed = take_foods(&vendor, &mut foods);
        Ok(RestaurantView::new(&vendor, listed))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn serving_vendors(&self, pincode: &Pincode) -> Result<Vec<Vendor>, CatalogError> {
        let mut vendors = self.store.vendors.list_by_pincode(pincode).await?;
        vendors.retain(|vendor| vendor.service_available);
        vendors.sort_by(Vendor::listing_order);
        Ok(vendors)
    }

    async fn foods_of(&self, vendors: &[Vendor]) -> Result<HashMap<FoodId, Food>, CatalogError> {
        let ids: Vec<FoodId> = vendors
            .iter()
            .flat_map(|vendor| vendor.foods.iter().copied())
            .collect();
        let foods = self.store.foods.get_many(&ids).await?;
        Ok(foods.into_iter().map(|food| (food.id, food)).collect())
    }

    /// Every food of every serving vendor in `pincode`, in listing order.
    async fn foods_in(&self, pincode: &Pincode) -> Result<Vec<Food>, CatalogError> {
        let vendors = self.serving_vendors(pincode).await?;
        let mut foods = self.foods_of(&vendors).await?;
        Ok(vendors
            .iter()
            .flat_map(|vendor| take_foods(vendor, &mut foods))
            .collect())
    }
}

/// Pull `vendor`'s foods out of `foods` in the vendor's registration order.
fn take_foods(vendor: &Vendor, foods: &mut HashMap<FoodId, Food>) -> Vec<Food> {
    vendor
        .foods
        .iter()
        .filter_map(|id| foods.remove(id))
        .collect()
}
