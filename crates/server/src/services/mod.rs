//! Business logic services.
//!
//! # Services
//!
//! - `auth` - User signup/login, vendor login, OTP verification
//! - `jwt` - Session token signing and validation
//! - `otp` - OTP code generation and delivery
//! - `vendors` - Vendor directory and vendor self-service
//! - `catalog` - Foods and shopper listings by pincode
//! - `offers` - Offer authoring and eligibility
//! - `orders` - Order placement and processing
//!
//! Services borrow the [`Store`](crate::db::Store) for the length of a
//! request and hold no state of their own.

pub mod auth;
pub mod catalog;
pub mod jwt;
pub mod offers;
pub mod orders;
pub mod otp;
pub mod vendors;

pub use auth::{AuthError, AuthService};
pub use catalog::{CatalogError, CatalogService};
pub use jwt::{Claims, JwtError, JwtService};
pub use offers::{OfferError, OfferService};
pub use orders::{OrderService, OrderServiceError};
pub use otp::{LogOtpNotifier, NotifyError, OtpNotifier};
pub use vendors::{Onboarding, VendorError, VendorLookup, VendorService, find_vendor};
