//! JSON views of stored entities.
//!
//! Password hashes and OTP state never leave the server: handlers serialize
//! these views, not the entities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use foodlane_core::{
    Email, Food, FoodId, Order, OrderId, OrderStatus, Pincode, User, UserId, Vendor, VendorId,
};

/// A user's own profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub verified: bool,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            phone: user.phone.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            address: user.address.clone(),
            verified: user.verified,
            lat: user.lat,
            lng: user.lng,
            created_at: user.created_at,
        }
    }
}

/// A vendor as seen by the vendor itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorView {
    pub id: VendorId,
    pub email: Email,
    pub name: String,
    pub owner_name: String,
    pub food_types: Vec<String>,
    pub pincode: Pincode,
    pub address: String,
    pub phone: String,
    pub rating: f64,
    pub service_available: bool,
    pub cover_images: Vec<String>,
    pub foods: Vec<FoodId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Vendor> for VendorView {
    fn from(vendor: &Vendor) -> Self {
        Self {
            id: vendor.id,
            email: vendor.email.clone(),
            name: vendor.name.clone(),
            owner_name: vendor.owner_name.clone(),
            food_types: vendor.food_types.clone(),
            pincode: vendor.pincode.clone(),
            address: vendor.address.clone(),
            phone: vendor.phone.clone(),
            rating: vendor.rating,
            service_available: vendor.service_available,
            cover_images: vendor.cover_images.clone(),
            foods: vendor.foods.clone(),
            created_at: vendor.created_at,
            updated_at: vendor.updated_at,
        }
    }
}

/// A restaurant as shown to shoppers, with its foods expanded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantView {
    pub id: VendorId,
    pub name: String,
    pub food_types: Vec<String>,
    pub pincode: Pincode,
    pub address: String,
    pub phone: String,
    pub rating: f64,
    pub service_available: bool,
    pub cover_images: Vec<String>,
    pub foods: Vec<Food>,
}

impl RestaurantView {
    #[must_use]
    pub fn new(vendor: &Vendor, foods: Vec<Food>) -> Self {
        Self {
            id: vendor.id,
            name: vendor.name.clone(),
            food_types: vendor.food_types.clone(),
            pincode: vendor.pincode.clone(),
            address: vendor.address.clone(),
            phone: vendor.phone.clone(),
            rating: vendor.rating,
            service_available: vendor.service_available,
            cover_images: vendor.cover_images.clone(),
            foods,
        }
    }
}

/// One order line with the food it refers to, when that food still exists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineView {
    pub food_id: FoodId,
    pub quantity: u32,
    pub food: Option<Food>,
}

/// An order with its lines populated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: UserId,
    pub vendor_id: VendorId,
    pub items: Vec<OrderLineView>,
    pub order_status: OrderStatus,
    pub remarks: String,
    pub ready_time: u32,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    /// Pair each line of `order` with its food, looked up by `find`.
    pub fn new<'a>(order: Order, find: impl Fn(FoodId) -> Option<&'a Food>) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| OrderLineView {
                food_id: item.food_id,
                quantity: item.quantity,
                food: find(item.food_id).cloned(),
            })
            .collect();
        Self {
            id: order.id,
            user_id: order.user_id,
            vendor_id: order.vendor_id,
            items,
            order_status: order.status,
            remarks: order.remarks,
            ready_time: order.ready_time,
            total: order.total,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
