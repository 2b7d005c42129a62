//! Vendor onboarding and listing.
//!
//! # Usage
//!
//! ```bash
//! foodlane vendor create -e owner@dosapoint.in -p 'S3cure-pass' \
//!     --name "Dosa Point" --owner-name Meena --pincode 560001 \
//!     --address "12 MG Road" --phone 9876543210 --food-type veg
//!
//! foodlane vendor list
//! ```

use foodlane_server::services::{Onboarding, VendorError, VendorService};
use thiserror::Error;

use super::CommandError;

#[derive(Debug, Error)]
pub enum VendorCommandError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error(transparent)]
    Vendor(#[from] VendorError),
}

/// Onboard a vendor account.
///
/// # Errors
///
/// Returns an error for a weak password, a taken email or a database failure.
pub async fn create(onboarding: Onboarding) -> Result<(), VendorCommandError> {
    let store = super::store().await?;
    let vendor = VendorService::new(&store).onboard(onboarding).await?;

    tracing::info!("Vendor created");
    #[allow(clippy::print_stdout)]
    {
        println!("Vendor created");
        println!("  ID:      {}", vendor.id);
        println!("  Email:   {}", vendor.email);
        println!("  Pincode: {}", vendor.pincode);
    }
    Ok(())
}

/// Print every vendor, one per line.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn list() -> Result<(), VendorCommandError> {
    let store = super::store().await?;
    let vendors = VendorService::new(&store).list().await?;

    #[allow(clippy::print_stdout)]
    {
        if vendors.is_empty() {
            println!("No vendors");
        }
        for vendor in &vendors {
            let service = if vendor.service_available { "on" } else { "off" };
            println!(
                "{}  {:<32}  {}  service={service}",
                vendor.id,
                vendor.email.as_str(),
                vendor.pincode
            );
        }
    }
    Ok(())
}
