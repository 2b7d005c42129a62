//! Offer authoring and eligibility.

use chrono::Utc;
use thiserror::Error;

use foodlane_core::{NewOffer, Offer, OfferId, OfferPatch, Pincode, VendorId, eligible_offers};

use crate::db::{RepositoryError, Store};

#[derive(Debug, Error)]
pub enum OfferError {
    #[error("vendor not found")]
    VendorNotFound,

    #[error("offer not found")]
    OfferNotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct OfferService<'a> {
    store: &'a Store,
}

impl<'a> OfferService<'a> {
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Offers visible to `requester` (anonymous when `None`).
    ///
    /// An offer that is both GENERIC and linked to the requester is listed
    /// twice.
    ///
    /// # Errors
    ///
    /// Returns `OfferError::Repository` if storage fails.
    pub async fn eligible(&self, requester: Option<VendorId>) -> Result<Vec<Offer>, OfferError> {
        let offers = self.store.offers.list().await?;
        Ok(eligible_offers(&offers, requester)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Create an offer authored by `vendor_id`.
    ///
    /// # Errors
    ///
    /// Returns `OfferError::VendorNotFound` if the vendor doesn't exist.
    pub async fn add_vendor_offer(
        &self,
        vendor_id: VendorId,
        new: NewOffer,
    ) -> Result<Offer, OfferError> {
        let vendor = self
            .store
            .vendors
            .get(vendor_id)
            .await?
            .ok_or(OfferError::VendorNotFound)?;
        let offer = Offer::for_vendor(&vendor, new, Utc::now());
        self.store.offers.insert(&offer).await?;
        tracing::info!(vendor_id = %vendor_id, offer_id = %offer.id, "Offer created");
        Ok(offer)
    }

    /// Edit an offer linked to `vendor_id`.
    ///
    /// # Errors
    ///
    /// Returns `OfferError::OfferNotFound` if the offer doesn't exist or is
    /// not linked to this vendor.
    pub async fn edit_offer(
        &self,
        vendor_id: VendorId,
        offer_id: OfferId,
        patch: OfferPatch,
    ) -> Result<Offer, OfferError> {
        let mut offer = self
            .store
            .offers
            .get(offer_id)
            .await?
            .filter(|offer| offer.is_linked_to(vendor_id))
            .ok_or(OfferError::OfferNotFound)?;
        patch.apply(&mut offer, Utc::now());
        self.store.offers.update(&offer).await?;
        Ok(offer)
    }

    /// Create a platform-wide offer.
    ///
    /// # Errors
    ///
    /// Returns `OfferError::Repository` if storage fails.
    pub async fn create_generic(
        &self,
        new: NewOffer,
        pincode: Pincode,
    ) -> Result<Offer, OfferError> {
        let offer = Offer::generic(new, pincode, Utc::now());
        self.store.offers.insert(&offer).await?;
        tracing::info!(offer_id = %offer.id, "Generic offer created");
        Ok(offer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::services::vendors::{VendorService, onboarding};

    fn new_offer(title: &str) -> NewOffer {
        NewOffer {
            title: title.to_owned(),
            description: String::new(),
            min_value: Decimal::from(200),
            offer_amount: Decimal::from(50),
            promocode: "SAVE50".to_owned(),
            promo_type: "USER".to_owned(),
            bank: vec![],
            bins: vec![],
            is_active: true,
            start_validity: None,
            end_validity: None,
        }
    }

    #[tokio::test]
    async fn test_vendor_offer_visible_only_to_its_vendor() {
        let store = Store::memory();
        let vendors = VendorService::new(&store);
        let a = vendors.onboard(onboarding("a@food.in", "560034")).await.unwrap();
        let b = vendors.onboard(onboarding("b@food.in", "560034")).await.unwrap();
        let offers = OfferService::new(&store);

        let offer = offers.add_vendor_offer(a.id, new_offer("Lunch")).await.unwrap();
        assert_eq!(offer.vendors, vec![a.id]);
        assert_eq!(offer.pincode, a.pincode);

        assert_eq!(offers.eligible(Some(a.id)).await.unwrap(), vec![offer]);
        assert!(offers.eligible(Some(b.id)).await.unwrap().is_empty());
        assert!(offers.eligible(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generic_offer_visible_to_everyone() {
        let store = Store::memory();
        let offers = OfferService::new(&store);
        let generic = offers
            .create_generic(new_offer("Festive"), Pincode::parse("560034").unwrap())
            .await
            .unwrap();
        assert_eq!(offers.eligible(None).await.unwrap(), vec![generic.clone()]);
        assert_eq!(
            offers.eligible(Some(VendorId::generate())).await.unwrap(),
            vec![generic]
        );
    }

    #[tokio::test]
    async fn test_edit_requires_link() {
        let store = Store::memory();
        let vendors = VendorService::new(&store);
        let a = vendors.onboard(onboarding("a@food.in", "560034")).await.unwrap();
        let b = vendors.onboard(onboarding("b@food.in", "560034")).await.unwrap();
        let offers = OfferService::new(&store);
        let offer = offers.add_vendor_offer(a.id, new_offer("Lunch")).await.unwrap();

        let patch = OfferPatch {
            title: Some("Dinner".to_owned()),
            ..OfferPatch::default()
        };
        assert!(matches!(
            offers.edit_offer(b.id, offer.id, patch.clone()).await,
            Err(OfferError::OfferNotFound)
        ));
        assert!(matches!(
            offers.edit_offer(a.id, OfferId::generate(), patch.clone()).await,
            Err(OfferError::OfferNotFound)
        ));

        let edited = offers.edit_offer(a.id, offer.id, patch).await.unwrap();
        assert_eq!(edited.title, "Dinner");
        assert_eq!(edited.promocode, "SAVE50");
    }

    #[tokio::test]
    async fn test_offer_for_missing_vendor() {
        let store = Store::memory();
        let result = OfferService::new(&store)
            .add_vendor_offer(VendorId::generate(), new_offer("Lunch"))
            .await;
        assert!(matches!(result, Err(OfferError::VendorNotFound)));
    }
}
