//! Vendor directory and vendor self-service.

use chrono::Utc;
use thiserror::Error;

use foodlane_core::{Email, NewVendor, Pincode, Vendor, VendorChange, VendorId, VendorPatch};

use crate::db::{RepositoryError, Store};
use crate::services::auth::{AuthError, hash_password, validate_password};

/// Errors from vendor operations.
#[derive(Debug, Error)]
pub enum VendorError {
    #[error("vendor not found")]
    NotFound,

    #[error("a vendor with this email already exists")]
    AlreadyExists,

    #[error(transparent)]
    Credentials(#[from] AuthError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// How to find a vendor. Exactly one key is given.
#[derive(Debug, Clone)]
pub enum VendorLookup {
    Id(VendorId),
    Email(Email),
}

/// Resolve a vendor. `None` means no such vendor, which is not an error here.
///
/// # Errors
///
/// Returns `RepositoryError` if storage fails.
pub async fn find_vendor(
    store: &Store,
    lookup: &VendorLookup,
) -> Result<Option<Vendor>, RepositoryError> {
    match lookup {
        VendorLookup::Id(id) => store.vendors.get(*id).await,
        VendorLookup::Email(email) => store.vendors.get_by_email(email).await,
    }
}

/// Administrative onboarding input.
#[derive(Debug, Clone)]
pub struct Onboarding {
    pub email: Email,
    pub password: String,
    pub name: String,
    pub owner_name: String,
    pub food_types: Vec<String>,
    pub pincode: Pincode,
    pub address: String,
    pub phone: String,
}

/// Vendor self-service.
pub struct VendorService<'a> {
    store: &'a Store,
}

impl<'a> VendorService<'a> {
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `VendorError::NotFound` if the vendor doesn't exist.
    pub async fn profile(&self, vendor_id: VendorId) -> Result<Vendor, VendorError> {
        find_vendor(self.store, &VendorLookup::Id(vendor_id))
            .await?
            .ok_or(VendorError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `VendorError::NotFound` if the vendor doesn't exist.
    pub async fn update_profile(
        &self,
        vendor_id: VendorId,
        patch: VendorPatch,
    ) -> Result<Vendor, VendorError> {
        self.change(vendor_id, VendorChange::Profile(patch)).await
    }

    /// Flip the service switch.
    ///
    /// # Errors
    ///
    /// Returns `VendorError::NotFound` if the vendor doesn't exist.
    pub async fn toggle_service(&self, vendor_id: VendorId) -> Result<Vendor, VendorError> {
        let vendor = self.change(vendor_id, VendorChange::ToggleService).await?;
        tracing::info!(
            vendor_id = %vendor.id,
            available = vendor.service_available,
            "Vendor service toggled"
        );
        Ok(vendor)
    }

    /// Append already-stored image names to the cover gallery.
    ///
    /// # Errors
    ///
    /// Returns `VendorError::NotFound` if the vendor doesn't exist.
    pub async fn add_cover_images(
        &self,
        vendor_id: VendorId,
        images: Vec<String>,
    ) -> Result<Vendor, VendorError> {
        self.change(vendor_id, VendorChange::AddCoverImages(images)).await
    }

    async fn change(
        &self,
        vendor_id: VendorId,
        change: VendorChange,
    ) -> Result<Vendor, VendorError> {
        self.store
            .vendors
            .change(vendor_id, change, Utc::now())
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => VendorError::NotFound,
                other => VendorError::Repository(other),
            })
    }

    /// Create a vendor account. Used by administrators, not by the HTTP API.
    ///
    /// # Errors
    ///
    /// Returns `VendorError::Credentials` for a weak password and
    /// `VendorError::AlreadyExists` if the email is taken.
    pub async fn onboard(&self, onboarding: Onboarding) -> Result<Vendor, VendorError> {
        validate_password(&onboarding.password)?;
        let password_hash = hash_password(&onboarding.password)?;
        let vendor = Vendor::new(
            NewVendor {
                email: onboarding.email,
                password_hash,
                name: onboarding.name,
                owner_name: onboarding.owner_name,
                food_types: onboarding.food_types,
                pincode: onboarding.pincode,
                address: onboarding.address,
                phone: onboarding.phone,
            },
            Utc::now(),
        );

        self.store.vendors.insert(&vendor).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => VendorError::AlreadyExists,
            other => VendorError::Repository(other),
        })?;

        tracing::info!(vendor_id = %vendor.id, pincode = %vendor.pincode, "Vendor onboarded");
        Ok(vendor)
    }

    /// Every vendor, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `VendorError::Repository` if storage fails.
    pub async fn list(&self) -> Result<Vec<Vendor>, VendorError> {
        Ok(self.store.vendors.list().await?)
    }
}

/// Test fixture shared by the service tests.
#[cfg(test)]
pub(crate) fn onboarding(email: &str, pincode: &str) -> Onboarding {
    Onboarding {
        email: Email::parse(email).unwrap_or_else(|e| panic!("{e}")),
        password: "vendorpass1".to_owned(),
        name: "Dosa Point".to_owned(),
        owner_name: "Meena".to_owned(),
        food_types: vec!["veg".to_owned()],
        pincode: Pincode::parse(pincode).unwrap_or_else(|e| panic!("{e}")),
        address: "2nd Cross".to_owned(),
        phone: "9000000001".to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_onboard_then_find_by_either_key() {
        let store = Store::memory();
        let service = VendorService::new(&store);
        let vendor = service
            .onboard(onboarding("owner@dosa.in", "560034"))
            .await
            .unwrap();
        assert!(!vendor.service_available);
        assert!(vendor.password_hash.starts_with("$argon2id$"));

        let by_id = find_vendor(&store, &VendorLookup::Id(vendor.id)).await.unwrap();
        let by_email = find_vendor(&store, &VendorLookup::Email(vendor.email.clone()))
            .await
            .unwrap();
        assert_eq!(by_id, Some(vendor.clone()));
        assert_eq!(by_email, Some(vendor));

        let missing = find_vendor(&store, &VendorLookup::Id(VendorId::generate()))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_onboard_rejects_duplicate_email() {
        let store = Store::memory();
        let service = VendorService::new(&store);
        service.onboard(onboarding("owner@dosa.in", "560034")).await.unwrap();
        let again = service.onboard(onboarding("owner@dosa.in", "560035")).await;
        assert!(matches!(again, Err(VendorError::AlreadyExists)));
    }

    #[tokio::test]
    async fn test_toggle_service_persists() {
        let store = Store::memory();
        let service = VendorService::new(&store);
        let vendor = service.onboard(onboarding("owner@dosa.in", "560034")).await.unwrap();

        assert!(service.toggle_service(vendor.id).await.unwrap().service_available);
        assert!(service.profile(vendor.id).await.unwrap().service_available);
        assert!(!service.toggle_service(vendor.id).await.unwrap().service_available);
    }

    #[tokio::test]
    async fn test_update_profile_and_cover_images() {
        let store = Store::memory();
        let service = VendorService::new(&store);
        let vendor = service.onboard(onboarding("owner@dosa.in", "560034")).await.unwrap();

        let patched = service
            .update_profile(
                vendor.id,
                VendorPatch {
                    phone: Some("9111111111".to_owned()),
                    ..VendorPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.phone, "9111111111");
        assert_eq!(patched.name, "Dosa Point");

        let with_images = service
            .add_cover_images(vendor.id, vec!["a.jpg".to_owned(), "b.jpg".to_owned()])
            .await
            .unwrap();
        assert_eq!(with_images.cover_images, ["a.jpg", "b.jpg"]);

        assert!(matches!(
            service.profile(VendorId::generate()).await,
            Err(VendorError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_vendor_edits_keep_foods_registered_meanwhile() {
        let store = Store::memory();
        let service = VendorService::new(&store);
        let vendor = service.onboard(onboarding("owner@dosa.in", "560034")).await.unwrap();

        let food = foodlane_core::Food::new(
            vendor.id,
            foodlane_core::NewFood {
                name: "Rava Dosa".to_owned(),
                description: String::new(),
                category: "Breakfast".to_owned(),
                food_type: "veg".to_owned(),
                ready_time: 15,
                price: rust_decimal::Decimal::from(80),
            },
            vec![],
            Utc::now(),
        )
        .unwrap();
        store.foods.insert_for_vendor(&food).await.unwrap();

        let toggled = service.toggle_service(vendor.id).await.unwrap();
        assert_eq!(toggled.foods, vec![food.id]);
        let patched = service
            .update_profile(
                vendor.id,
                VendorPatch {
                    address: Some("2 Temple Road".to_owned()),
                    ..VendorPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.foods, vec![food.id]);
        service
            .add_cover_images(vendor.id, vec!["front.jpg".to_owned()])
            .await
            .unwrap();

        // A full overwrite from a copy read before the food existed.
        let mut stale = vendor.clone();
        stale.rating = 4.5;
        store.vendors.update(&stale).await.unwrap();

        let stored = service.profile(vendor.id).await.unwrap();
        assert_eq!(stored.foods, vec![food.id]);
        assert!((stored.rating - 4.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_edits_to_unknown_vendor_are_not_found() {
        let store = Store::memory();
        let service = VendorService::new(&store);
        assert!(matches!(
            service.toggle_service(VendorId::generate()).await,
            Err(VendorError::NotFound)
        ));
        assert!(matches!(
            service.add_cover_images(VendorId::generate(), vec![]).await,
            Err(VendorError::NotFound)
        ));
    }
}
