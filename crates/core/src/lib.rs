//! Foodlane Core - Domain types and rules.
//!
//! This crate holds everything about the ordering platform that can be
//! expressed without I/O:
//! - [`types`] - Newtype ids, validated emails and pincodes, status enums
//! - [`domain`] - Entities, patch structs, OTP checks, offer eligibility and
//!   order pricing
//!
//! # Architecture
//!
//! The core crate contains only types and rules - no database access, no HTTP,
//! no clock reads. Callers pass `now` and issued OTP codes in.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod domain;
pub mod types;

pub use domain::*;
pub use types::*;
