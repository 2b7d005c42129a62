//! Authenticated identity attached to a request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use foodlane_core::{Email, Role, User, UserId, Vendor, VendorId};

/// Name of the HTTP-only cookie carrying the session token.
pub const SESSION_COOKIE_NAME: &str = "foodlane_session";

/// The caller behind a validated session token.
///
/// Built from a user or vendor at login and rebuilt from token claims on
/// every request; nothing here is read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: Email,
    pub display_name: String,
    pub role: Role,
    /// Users only: whether the OTP step is done. Always `true` for vendors.
    pub verified: bool,
    /// Vendors only: the food type labels they serve.
    pub food_types: Vec<String>,
}

impl Principal {
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.as_uuid(),
            email: user.email.clone(),
            display_name: user.display_name(),
            role: Role::User,
            verified: user.verified,
            food_types: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_vendor(vendor: &Vendor) -> Self {
        Self {
            id: vendor.id.as_uuid(),
            email: vendor.email.clone(),
            display_name: vendor.name.clone(),
            role: Role::Vendor,
            verified: true,
            food_types: vendor.food_types.clone(),
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::from_uuid(self.id)
    }

    #[must_use]
    pub const fn vendor_id(&self) -> VendorId {
        VendorId::from_uuid(self.id)
    }
}
