//! Foodlane CLI - Database migrations and platform administration.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! foodlane migrate
//!
//! # Onboard a vendor
//! foodlane vendor create -e owner@dosapoint.in -p 'S3cure-pass' --name "Dosa Point" \
//!     --owner-name Meena --pincode 560001 --address "12 MG Road" --phone 9876543210 \
//!     --food-type veg --food-type south-indian
//!
//! # List vendors
//! foodlane vendor list
//!
//! # Create a platform-wide offer
//! foodlane offer generic --title "Flat 50" --offer-amount 50 --pincode 560001
//! ```
//!
//! # Environment Variables
//!
//! - `FOODLANE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use foodlane_core::{Email, NewOffer, Pincode};
use foodlane_server::services::Onboarding;

mod commands;

#[derive(Parser)]
#[command(name = "foodlane")]
#[command(author, version, about = "Foodlane CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage vendors
    Vendor {
        #[command(subcommand)]
        action: VendorAction,
    },
    /// Manage platform offers
    Offer {
        #[command(subcommand)]
        action: OfferAction,
    },
}

#[derive(Subcommand)]
enum VendorAction {
    /// Onboard a new vendor
    Create {
        /// Login email
        #[arg(short, long)]
        email: Email,

        /// Login password (min 8 characters)
        #[arg(short, long)]
        password: String,

        /// Restaurant name
        #[arg(short, long)]
        name: String,

        /// Owner's name
        #[arg(long)]
        owner_name: String,

        /// Six digit service pincode
        #[arg(long)]
        pincode: Pincode,

        #[arg(long, default_value = "")]
        address: String,

        #[arg(long, default_value = "")]
        phone: String,

        /// Cuisine tag, repeatable
        #[arg(long = "food-type")]
        food_types: Vec<String>,
    },
    /// List every vendor
    List,
}

#[derive(Subcommand)]
enum OfferAction {
    /// Create an offer visible to everyone
    Generic {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Minimum order value
        #[arg(long, default_value = "0")]
        min_value: Decimal,

        /// Discount amount
        #[arg(long)]
        offer_amount: Decimal,

        #[arg(long)]
        pincode: Pincode,

        #[arg(long, default_value = "")]
        promocode: String,

        #[arg(long, default_value = "")]
        promo_type: String,

        /// Eligible bank, repeatable
        #[arg(long)]
        bank: Vec<String>,

        /// Eligible card BIN, repeatable
        #[arg(long = "bin")]
        bins: Vec<String>,

        /// Create the offer switched off
        #[arg(long)]
        inactive: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Vendor { action } => match action {
            VendorAction::Create {
                email,
                password,
                name,
                owner_name,
                pincode,
                address,
                phone,
                food_types,
            } => {
                let onboarding = Onboarding {
                    email,
                    password,
                    name,
                    owner_name,
                    food_types,
                    pincode,
                    address,
                    phone,
                };
                commands::vendor::create(onboarding).await?;
            }
            VendorAction::List => commands::vendor::list().await?,
        },
        Commands::Offer { action } => match action {
            OfferAction::Generic {
                title,
                description,
                min_value,
                offer_amount,
                pincode,
                promocode,
                promo_type,
                bank,
                bins,
                inactive,
            } => {
                let offer = NewOffer {
                    title,
                    description,
                    min_value,
                    offer_amount,
                    promocode,
                    promo_type,
                    bank,
                    bins,
                    is_active: !inactive,
                    start_validity: None,
                    end_validity: None,
                };
                commands::offer::create_generic(offer, pincode).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_vendor_create_rejects_bad_pincode() {
        let parsed = Cli::try_parse_from([
            "foodlane",
            "vendor",
            "create",
            "-e",
            "owner@dosapoint.in",
            "-p",
            "S3cure-pass",
            "--name",
            "Dosa Point",
            "--owner-name",
            "Meena",
            "--pincode",
            "012345",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_offer_generic_flags() {
        let cli = Cli::try_parse_from([
            "foodlane",
            "offer",
            "generic",
            "--title",
            "Flat 50",
            "--offer-amount",
            "50",
            "--pincode",
            "560001",
            "--bank",
            "HDFC",
            "--bank",
            "ICICI",
            "--inactive",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        let Commands::Offer {
            action:
                OfferAction::Generic {
                    bank,
                    inactive,
                    min_value,
                    ..
                },
        } = cli.command
        else {
            panic!("expected offer command");
        };
        assert_eq!(bank, vec!["HDFC", "ICICI"]);
        assert!(inactive);
        assert_eq!(min_value, Decimal::ZERO);
    }
}
