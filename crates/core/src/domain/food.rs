//! Catalog items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{FoodId, VendorId};

/// Why a new food item was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FoodError {
    #[error("food name cannot be empty")]
    EmptyName,
    #[error("food price cannot be negative")]
    NegativePrice,
}

/// A food item owned by exactly one vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub id: FoodId,
    pub vendor_id: VendorId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub food_type: String,
    /// Preparation time in minutes.
    pub ready_time: u32,
    pub price: Decimal,
    pub rating: f64,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields a vendor supplies when adding a food.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFood {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub food_type: String,
    #[serde(default)]
    pub ready_time: u32,
    pub price: Decimal,
}

impl NewFood {
    /// # Errors
    ///
    /// Returns [`FoodError`] for a blank name or a negative price.
    pub fn validate(&self) -> Result<(), FoodError> {
        if self.name.trim().is_empty() {
            return Err(FoodError::EmptyName);
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(FoodError::NegativePrice);
        }
        Ok(())
    }
}

impl Food {
    /// Build an unrated food for `vendor_id` with its uploaded images.
    ///
    /// # Errors
    ///
    /// Propagates [`NewFood::validate`] failures.
    pub fn new(
        vendor_id: VendorId,
        new: NewFood,
        images: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, FoodError> {
        new.validate()?;
        Ok(Self {
            id: FoodId::generate(),
            vendor_id,
            name: new.name.trim().to_owned(),
            description: new.description,
            category: new.category,
            food_type: new.food_type,
            ready_time: new.ready_time,
            price: new.price,
            rating: 0.0,
            images,
            created_at: now,
        })
    }

    /// Case-insensitive substring match on name or category.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.category.to_lowercase().contains(&query)
    }

    #[must_use]
    pub const fn ready_within(&self, minutes: u32) -> bool {
        self.ready_time <= minutes
    }
}
