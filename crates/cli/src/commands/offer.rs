//! Platform-wide (GENERIC) offers.
//!
//! # Usage
//!
//! ```bash
//! foodlane offer generic --title "Flat 50" --offer-amount 50 --min-value 299 \
//!     --pincode 560001 --promocode FLAT50 --promo-type USER --bank HDFC
//! ```

use foodlane_core::{NewOffer, Pincode};
use foodlane_server::services::{OfferError, OfferService};
use thiserror::Error;

use super::CommandError;

#[derive(Debug, Error)]
pub enum OfferCommandError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error(transparent)]
    Offer(#[from] OfferError),
}

/// Create a GENERIC offer, visible to every shopper and vendor.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn create_generic(new: NewOffer, pincode: Pincode) -> Result<(), OfferCommandError> {
    let store = super::store().await?;
    let offer = OfferService::new(&store).create_generic(new, pincode).await?;

    tracing::info!("Generic offer created");
    #[allow(clippy::print_stdout)]
    {
        println!("Offer created");
        println!("  ID:        {}", offer.id);
        println!("  Title:     {}", offer.title);
        println!("  Promocode: {}", offer.promocode);
        println!("  Active:    {}", offer.is_active);
    }
    Ok(())
}
