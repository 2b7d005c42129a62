//! Core types for Foodlane.
//!
//! Type-safe wrappers for the identifiers and value objects shared by every
//! component.

pub mod email;
pub mod id;
pub mod pincode;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use pincode::{Pincode, PincodeError};
pub use status::*;
