//! Restaurant accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, FoodId, Pincode, VendorId};

/// A vendor (restaurant) account.
///
/// `foods` and `cover_images` keep insertion order. `service_available` is the
/// vendor's on/off switch: vendors that are off are hidden from shoppers and
/// cannot receive orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: VendorId,
    pub email: Email,
    pub password_hash: String,
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

/// Data supplied by the administrator when onboarding a vendor.
#[derive(Debug, Clone)]
pub struct NewVendor {
    pub email: Email,
    pub password_hash: String,
    pub name: String,
    pub owner_name: String,
    pub food_types: Vec<String>,
    pub pincode: Pincode,
    pub address: String,
    pub phone: String,
}

impl Vendor {
    /// A freshly onboarded vendor: unrated, service off, nothing listed yet.
    #[must_use]
    pub fn new(new: NewVendor, now: DateTime<Utc>) -> Self {
        Self {
            id: VendorId::generate(),
            email: new.email,
            password_hash: new.password_hash,
            name: new.name,
            owner_name: new.owner_name,
            food_types: new.food_types,
            pincode: new.pincode,
            address: new.address,
            phone: new.phone,
            rating: 0.0,
            service_available: false,
            cover_images: Vec::new(),
            foods: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Flip the service switch and return the new value.
    pub fn toggle_service(&mut self, now: DateTime<Utc>) -> bool {
        self.service_available = !self.service_available;
        self.updated_at = now;
        self.service_available
    }

    /// Append stored image names to the cover gallery.
    pub fn add_cover_images(
        &mut self,
        images: impl IntoIterator<Item = String>,
        now: DateTime<Utc>,
    ) {
        self.cover_images.extend(images);
        self.updated_at = now;
    }

    /// Register a food under this vendor. Registering twice is a no-op.
    pub fn register_food(&mut self, food_id: FoodId, now: DateTime<Utc>) {
        if !self.foods.contains(&food_id) {
            self.foods.push(food_id);
        }
        self.updated_at = now;
    }

    /// Ordering used for shopper listings: rating descending, then id.
    #[must_use]
    pub fn listing_order(&self, other: &Self) -> std::cmp::Ordering {
        other
            .rating
            .total_cmp(&self.rating)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Partial vendor profile edit. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorPatch {
    pub name: Option<String>,
    pub owner_name: Option<String>,
    #[serde(alias = "foodType")]
    pub food_types: Option<Vec<String>>,
    pub pincode: Option<Pincode>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl VendorPatch {
    /// Apply the present fields to `vendor`, in declaration order.
    pub fn apply(self, vendor: &mut Vendor, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            vendor.name = name;
        }
        if let Some(owner_name) = self.owner_name {
            vendor.owner_name = owner_name;
        }
        if let Some(food_types) = self.food_types {
            vendor.food_types = food_types;
        }
        if let Some(pincode) = self.pincode {
            vendor.pincode = pincode;
        }
        if let Some(address) = self.address {
            vendor.address = address;
        }
        if let Some(phone) = self.phone {
            vendor.phone = phone;
        }
        vendor.updated_at = now;
    }
}

/// An edit a vendor makes to its own account.
///
/// Stores apply a change against the current stored document, so it never
/// touches `foods` and cannot undo a concurrent food registration.
#[derive(Debug, Clone)]
pub enum VendorChange {
    Profile(VendorPatch),
    ToggleService,
    AddCoverImages(Vec<String>),
}

impl VendorChange {
    pub fn apply(self, vendor: &mut Vendor, now: DateTime<Utc>) {
        match self {
            Self::Profile(patch) => patch.apply(vendor, now),
            Self::ToggleService => {
                vendor.toggle_service(now);
            }
            Self::AddCoverImages(images) => vendor.add_cover_images(images, now),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn vendor() -> Vendor {
        Vendor::new(
            NewVendor {
                email: Email::parse("owner@tandoor.in").unwrap(),
                password_hash: "hash".to_owned(),
                name: "Tandoor House".to_owned(),
                owner_name: "Meera".to_owned(),
                food_types: vec!["veg".to_owned(), "non-veg".to_owned()],
                pincode: Pincode::parse("560034").unwrap(),
                address: "80 Feet Road".to_owned(),
                phone: "9000000001".to_owned(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_onboarded_vendor_starts_switched_off() {
        let v = vendor();
        assert!(!v.service_available);
        assert!(v.foods.is_empty());
        assert!(v.cover_images.is_empty());
    }

    #[test]
    fn test_toggle_service_flips() {
        let mut v = vendor();
        assert!(v.toggle_service(Utc::now()));
        assert!(!v.toggle_service(Utc::now()));
    }

    #[test]
    fn test_register_food_is_idempotent() {
        let mut v = vendor();
        let food = FoodId::generate();
        v.register_food(food, Utc::now());
        v.register_food(food, Utc::now());
        assert_eq!(v.foods, vec![food]);
    }

    #[test]
    fn test_patch_leaves_absent_fields_identical() {
        let mut v = vendor();
        v.add_cover_images(["front.jpg".to_owned()], Utc::now());
        let before = v.clone();

        VendorPatch {
            phone: Some("9000000002".to_owned()),
            ..Default::default()
        }
        .apply(&mut v, Utc::now());

        assert_eq!(v.phone, "9000000002");
        assert_eq!(v.name, before.name);
        assert_eq!(v.owner_name, before.owner_name);
        assert_eq!(v.food_types, before.food_types);
        assert_eq!(v.pincode, before.pincode);
        assert_eq!(v.address, before.address);
        assert_eq!(v.cover_images, before.cover_images);
        assert_eq!(v.service_available, before.service_available);
    }

    #[test]
    fn test_patch_accepts_legacy_food_type_key() {
        let patch: VendorPatch = serde_json::from_str(r#"{"foodType":["vegan"]}"#).unwrap();
        assert_eq!(patch.food_types, Some(vec!["vegan".to_owned()]));
    }

    #[test]
    fn test_listing_order_rating_then_id() {
        let mut a = vendor();
        let mut b = vendor();
        a.rating = 4.0;
        b.rating = 4.5;
        assert_eq!(a.listing_order(&b), std::cmp::Ordering::Greater);

        b.rating = 4.0;
        let expected = a.id.cmp(&b.id);
        assert_eq!(a.listing_order(&b), expected);
    }

    #[test]
    fn test_change_keeps_registered_foods() {
        let mut v = vendor();
        let food = FoodId::generate();
        v.register_food(food, Utc::now());

        VendorChange::ToggleService.apply(&mut v, Utc::now());
        VendorChange::AddCoverImages(vec!["side.jpg".to_owned()]).apply(&mut v, Utc::now());
        VendorChange::Profile(VendorPatch {
            name: Some("Tandoor Express".to_owned()),
            ..Default::default()
        })
        .apply(&mut v, Utc::now());

        assert!(v.service_available);
        assert_eq!(v.cover_images, vec!["side.jpg".to_owned()]);
        assert_eq!(v.name, "Tandoor Express");
        assert_eq!(v.foods, vec![food]);
    }
}
