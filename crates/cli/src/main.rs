//! RocketShoes CLI - Inspect and edit the persisted cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! rs-cli show
//!
//! # Add one unit of product 3
//! rs-cli add 3
//!
//! # Set product 3 to 2 units
//! rs-cli update 3 2
//!
//! # Remove product 3
//! rs-cli remove 3
//!
//! # Use another cart file
//! rs-cli --cart /tmp/cart.json show
//!
//! # Use another API
//! rs-cli --api-url http://localhost:3333 add 3
//! ```
//!
//! # Exit Codes
//!
//! - `0` - Command applied (or `show`)
//! - `1` - Configuration or cart file could not be opened
//! - `2` - Operation rejected; the notice is printed to stderr
//!
//! # Commands
//!
//! - `show` - Print line items and totals (no API access)
//! - `add` - Add one unit (checked against stock)
//! - `update` - Set a product's amount (checked against stock)
//! - `remove` - Remove a product

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rocketshoes_core::ProductId;
use url::Url;

mod commands;

#[derive(Parser)]
#[command(name = "rs-cli")]
#[command(author, version, about = "RocketShoes cart tools")]
struct Cli {
    /// Cart blob file (overrides `ROCKETSHOES_CART_PATH`)
    #[arg(long, global = true)]
    cart: Option<PathBuf>,

    /// Stock and catalog API base URL (overrides `ROCKETSHOES_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Catalog product id
        product_id: ProductId,
    },
    /// Set a product's amount
    Update {
        /// Catalog product id
        product_id: ProductId,

        /// New amount (must be at least 1)
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Remove a product
    Remove {
        /// Catalog product id
        product_id: ProductId,
    },
}

const EXIT_APPLIED: u8 = 0;
const EXIT_STARTUP_FAILED: u8 = 1;
const EXIT_REJECTED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::from(EXIT_STARTUP_FAILED)
        }
    }
}

async fn run(cli: Cli) -> Result<u8, Box<dyn std::error::Error>> {
    if matches!(cli.command, Commands::Show) {
        commands::cart::print(&commands::cart::load(cli.cart)?);
        return Ok(EXIT_APPLIED);
    }

    let mut cart = commands::cart::open(cli.cart, cli.api_url)?;

    let outcome = match cli.command {
        Commands::Show => return Ok(EXIT_APPLIED),
        Commands::Add { product_id } => cart.add_product(product_id).await,
        Commands::Update { product_id, amount } => {
            cart.update_product_amount(product_id, amount).await
        }
        Commands::Remove { product_id } => cart.remove_product(product_id),
    };

    commands::cart::print(cart.cart());

    Ok(if outcome.applied {
        EXIT_APPLIED
    } else {
        EXIT_REJECTED
    })
}
