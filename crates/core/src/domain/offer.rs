//! Promotional offers and the eligibility rule.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::vendor::Vendor;
use crate::types::{OfferId, OfferType, Pincode, VendorId};

/// A discount offer.
///
/// `vendors` holds weak references: an offer never owns the vendors it
/// lists, and a listed vendor may no longer exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: OfferId,
    pub offer_type: OfferType,
    pub vendors: Vec<VendorId>,
    pub title: String,
    pub description: String,
    pub min_value: Decimal,
    pub offer_amount: Decimal,
    pub pincode: Pincode,
    pub promocode: String,
    pub promo_type: String,
    pub bank: Vec<String>,
    pub bins: Vec<String>,
    pub is_active: bool,
    pub start_validity: Option<DateTime<Utc>>,
    pub end_validity: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Offer fields supplied by its creator.
///
/// Type, pincode and vendor links are decided by who creates the offer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOffer {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub min_value: Decimal,
    pub offer_amount: Decimal,
    #[serde(default)]
    pub promocode: String,
    #[serde(default)]
    pub promo_type: String,
    #[serde(default)]
    pub bank: Vec<String>,
    #[serde(default)]
    pub bins: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub start_validity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_validity: Option<DateTime<Utc>>,
}

const fn default_active() -> bool {
    true
}

impl Offer {
    fn build(
        offer_type: OfferType,
        vendors: Vec<VendorId>,
        pincode: Pincode,
        new: NewOffer,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: OfferId::generate(),
            offer_type,
            vendors,
            title: new.title,
            description: new.description,
            min_value: new.min_value,
            offer_amount: new.offer_amount,
            pincode,
            promocode: new.promocode,
            promo_type: new.promo_type,
            bank: new.bank,
            bins: new.bins,
            is_active: new.is_active,
            start_validity: new.start_validity,
            end_validity: new.end_validity,
            created_at: now,
            updated_at: now,
        }
    }

    /// An offer authored by `vendor`: always VENDOR-typed, scoped to the
    /// vendor's pincode and linked to the vendor alone.
    #[must_use]
    pub fn for_vendor(vendor: &Vendor, new: NewOffer, now: DateTime<Utc>) -> Self {
        Self::build(
            OfferType::Vendor,
            vec![vendor.id],
            vendor.pincode.clone(),
            new,
            now,
        )
    }

    /// A platform-wide offer with no vendor links.
    #[must_use]
    pub fn generic(new: NewOffer, pincode: Pincode, now: DateTime<Utc>) -> Self {
        Self::build(OfferType::Generic, Vec::new(), pincode, new, now)
    }

    #[must_use]
    pub fn is_linked_to(&self, vendor_id: VendorId) -> bool {
        self.vendors.contains(&vendor_id)
    }
}

/// Offers visible to `requester`, in store order.
///
/// Each offer is pushed once for every vendor link matching the requester,
/// then once more if it is GENERIC. An offer that is both ends up in the
/// result twice; callers that want a set must dedupe themselves. Activity,
/// validity window and pincode are not consulted.
#[must_use]
pub fn eligible_offers(offers: &[Offer], requester: Option<VendorId>) -> Vec<&Offer> {
    let mut visible = Vec::new();
    for offer in offers {
        if let Some(vendor_id) = requester {
            for linked in &offer.vendors {
                if *linked == vendor_id {
                    visible.push(offer);
                }
            }
        }
        if offer.offer_type == OfferType::Generic {
            visible.push(offer);
        }
    }
    visible
}

/// Partial offer edit. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub min_value: Option<Decimal>,
    pub offer_amount: Option<Decimal>,
    pub pincode: Option<Pincode>,
    pub promocode: Option<String>,
    pub promo_type: Option<String>,
    pub bank: Option<Vec<String>>,
    pub bins: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub start_validity: Option<DateTime<Utc>>,
    pub end_validity: Option<DateTime<Utc>>,
}

impl OfferPatch {
    /// Apply the present fields to `offer`, in declaration order.
    pub fn apply(self, offer: &mut Offer, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            offer.title = title;
        }
        if let Some(description) = self.description {
            offer.description = description;
        }
        if let Some(min_value) = self.min_value {
            offer.min_value = min_value;
        }
        if let Some(offer_amount) = self.offer_amount {
            offer.offer_amount = offer_amount;
        }
        if let Some(pincode) = self.pincode {
            offer.pincode = pincode;
        }
        if let Some(promocode) = self.promocode {
            offer.promocode = promocode;
        }
        if let Some(promo_type) = self.promo_type {
            offer.promo_type = promo_type;
        }
        if let Some(bank) = self.bank {
            offer.bank = bank;
        }
        if let Some(bins) = self.bins {
            offer.bins = bins;
        }
        if let Some(is_active) = self.is_active {
            offer.is_active = is_active;
        }
        if let Some(start) = self.start_validity {
            offer.start_validity = Some(start);
        }
        if let Some(end) = self.end_validity {
            offer.end_validity = Some(end);
        }
        offer.updated_at = now;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::vendor::NewVendor;
    use crate::types::Email;

    fn vendor(pincode: &str) -> Vendor {
        Vendor::new(
            NewVendor {
                email: Email::parse("kitchen@example.com").unwrap(),
                password_hash: "hash".to_owned(),
                name: "Kitchen".to_owned(),
                owner_name: "Ravi".to_owned(),
                food_types: vec!["veg".to_owned()],
                pincode: Pincode::parse(pincode).unwrap(),
                address: "1 Main St".to_owned(),
                phone: "9000000003".to_owned(),
            },
            Utc::now(),
        )
    }

    fn new_offer(title: &str) -> NewOffer {
        NewOffer {
            title: title.to_owned(),
            description: "Flat off".to_owned(),
            min_value: Decimal::from(200),
            offer_amount: Decimal::from(50),
            promocode: "FLAT50".to_owned(),
            promo_type: "USER".to_owned(),
            bank: vec![],
            bins: vec![],
            is_active: true,
            start_validity: None,
            end_validity: None,
        }
    }

    #[test]
    fn test_vendor_offer_is_vendor_typed_with_vendor_pincode() {
        let v = vendor("560034");
        let offer = Offer::for_vendor(&v, new_offer("Lunch"), Utc::now());
        assert_eq!(offer.offer_type, OfferType::Vendor);
        assert_eq!(offer.pincode, v.pincode);
        assert_eq!(offer.vendors, vec![v.id]);

        let offers = [offer];
        let visible = eligible_offers(&offers, Some(v.id));
        assert_eq!(visible.len(), 1);
    }

    #[test]
    fn test_generic_offer_visible_to_everyone() {
        let offers = [Offer::generic(
            new_offer("Festive"),
            Pincode::parse("110001").unwrap(),
            Utc::now(),
        )];
        assert_eq!(eligible_offers(&offers, None).len(), 1);
        assert_eq!(eligible_offers(&offers, Some(VendorId::generate())).len(), 1);
    }

    #[test]
    fn test_foreign_vendor_offer_hidden() {
        let v = vendor("560034");
        let offers = [Offer::for_vendor(&v, new_offer("Lunch"), Utc::now())];
        assert!(eligible_offers(&offers, Some(VendorId::generate())).is_empty());
        assert!(eligible_offers(&offers, None).is_empty());
    }

    #[test]
    fn test_generic_and_linked_offer_appears_twice() {
        let v = vendor("560034");
        let mut offer = Offer::generic(new_offer("Both"), v.pincode.clone(), Utc::now());
        offer.vendors.push(v.id);
        let offers = [offer];

        let visible = eligible_offers(&offers, Some(v.id));
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].id, visible[1].id);
    }

    #[test]
    fn test_inactive_and_expired_offers_still_listed() {
        let v = vendor("560034");
        let mut offer = Offer::for_vendor(&v, new_offer("Old"), Utc::now());
        offer.is_active = false;
        offer.end_validity = Some(Utc::now() - chrono::Duration::days(3));
        let offers = [offer];
        assert_eq!(eligible_offers(&offers, Some(v.id)).len(), 1);
    }

    #[test]
    fn test_patch_leaves_absent_fields_identical() {
        let v = vendor("560034");
        let mut offer = Offer::for_vendor(&v, new_offer("Lunch"), Utc::now());
        let before = offer.clone();

        OfferPatch {
            is_active: Some(false),
            ..Default::default()
        }
        .apply(&mut offer, Utc::now());

        assert!(!offer.is_active);
        let mut expected = before;
        expected.is_active = false;
        expected.updated_at = offer.updated_at;
        assert_eq!(offer, expected);
    }

    #[test]
    fn test_patch_false_is_present() {
        let patch: OfferPatch = serde_json::from_str(r#"{"isActive":false}"#).unwrap();
        assert_eq!(patch.is_active, Some(false));
        let empty: OfferPatch = serde_json::from_str("{}").unwrap();
        assert!(empty.is_active.is_none());
    }
}
