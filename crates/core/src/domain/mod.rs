//! Domain entities and the rules that act on them.
//!
//! # Aggregates
//!
//! - [`User`] - customer account with OTP verification state
//! - [`Vendor`] - restaurant account, owns its food list and cover images
//! - [`Food`] - catalog item owned by exactly one vendor
//! - [`Offer`] - discount, weakly linked to zero or more vendors
//! - [`Order`] - a user's order against one vendor
//!
//! Mutations that arrive as partial documents go through the `*Patch`
//! structs, which overwrite only the fields that are present.

pub mod food;
pub mod offer;
pub mod order;
pub mod otp;
pub mod user;
pub mod vendor;

pub use food::{Food, FoodError, NewFood};
pub use offer::{NewOffer, Offer, OfferPatch, eligible_offers};
pub use order::{NewOrderItem, Order, OrderError, OrderItem, OrderUpdate, PricedItems, price_items};
pub use otp::{OTP_VALIDITY_MINUTES, OtpChallenge, OtpError};
pub use user::{NewUser, User, UserProfilePatch};
pub use vendor::{NewVendor, Vendor, VendorChange, VendorPatch};
