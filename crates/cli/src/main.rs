//! Biblio CLI - browse the catalogue, manage the cart and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Log in (the session is stored under BIBLIO_STATE_DIR)
//! biblio login -e reader@example.com
//!
//! # Browse and add to cart
//! biblio products list --search borges
//! biblio cart add 12 --quantity 2
//!
//! # Review and check out
//! biblio cart show
//! biblio cart checkout --place-order
//! ```
//!
//! # Commands
//!
//! - `login`, `logout`, `whoami`, `signup` - Session management
//! - `products` - Catalogue browsing (and administration for admins)
//! - `cart` - Cart resolution, items and checkout
//! - `orders` - Order history and status changes
//! - `users` - User administration
//!
//! # Logging
//!
//! Logs go to stderr. `RUST_LOG` overrides the default filter
//! (`biblio_client=info,biblio_cli=info`); `BIBLIO_LOG_FORMAT=json` switches
//! to JSON lines.

#![cfg_attr(not(test), forbid(unsafe_code))]

use biblio_client::cart::QuantityStep;
use biblio_client::{ClientConfig, LogFormat};
use biblio_core::{CartItemId, OrderId, OrderStatus, ProductId, UserId, UserStatus};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::Context;

const DEFAULT_LOG_FILTER: &str = "biblio_client=info,biblio_cli=info";

#[derive(Parser)]
#[command(name = "biblio")]
#[command(author, version, about = "Biblio bookstore CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "BIBLIO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in profile
    Whoami,
    /// Create an account and log in
    Signup {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "BIBLIO_PASSWORD", hide_env_values = true)]
        password: String,

        /// Shipping address
        #[arg(long, default_value = "")]
        address: String,

        #[arg(long, default_value = "")]
        phone: String,
    },
    /// Browse the catalogue
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// User administration
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        /// Filter by title, author or genre
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one product
    Show { id: ProductId },
    /// Create a product (admin)
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        author: String,

        #[arg(long)]
        genre: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        price: Decimal,

        #[arg(long, default_value_t = 0)]
        stock: i32,
    },
    /// Change price or stock (admin)
    Update {
        id: ProductId,

        #[arg(long)]
        price: Option<Decimal>,

        #[arg(long)]
        stock: Option<i32>,
    },
    /// Delete a product (admin)
    Delete { id: ProductId },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show items and totals
    Show,
    /// Add a product
    Add {
        product_id: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set an item's quantity (0 removes it)
    Qty { item_id: CartItemId, quantity: u32 },
    /// Increase an item's quantity by one
    Inc { item_id: CartItemId },
    /// Decrease an item's quantity by one
    Dec { item_id: CartItemId },
    /// Remove an item
    Remove { item_id: CartItemId },
    /// Clear the cart, optionally placing an order first
    Checkout {
        #[arg(long)]
        place_order: bool,
    },
    /// Print the cart this session resolves to
    Resolve,
}

#[derive(Subcommand)]
enum OrderAction {
    /// List orders
    List,
    /// Set an order's status (admin)
    Status {
        id: OrderId,

        /// New status (pendiente, aceptada, rechazada, enviada)
        #[arg(value_parser = parse_order_status)]
        status: OrderStatus,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// List users
    List,
    /// Show one user
    Show { id: UserId },
    /// Block a user
    Block { id: UserId },
    /// Unblock a user
    Unblock { id: UserId },
    /// Delete a user
    Delete { id: UserId },
}

fn parse_order_status(raw: &str) -> Result<OrderStatus, String> {
    match OrderStatus::normalize(raw) {
        OrderStatus::Other(other) => Err(format!("unknown order status: {other}")),
        status => Ok(status),
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = ClientConfig::from_env();
    init_tracing(
        config
            .as_ref()
            .map_or_else(|_| LogFormat::default(), |c| c.log_format),
    );

    let result: Result<(), Box<dyn std::error::Error>> = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::new(config)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&ctx, &email, password).await?;
        }
        Commands::Logout => commands::auth::logout(&ctx).await?,
        Commands::Whoami => commands::auth::whoami(&ctx).await?,
        Commands::Signup {
            name,
            email,
            password,
            address,
            phone,
        } => {
            commands::auth::signup(&ctx, name, &email, password, address, phone).await?;
        }
        Commands::Products { action } => match action {
            ProductAction::List { search } => {
                commands::products::list(&ctx, search.as_deref()).await?;
            }
            ProductAction::Show { id } => commands::products::show(&ctx, id).await?,
            ProductAction::Create {
                title,
                author,
                genre,
                description,
                price,
                stock,
            } => {
                let args = commands::products::NewProductArgs {
                    title,
                    author,
                    genre,
                    description,
                    price,
                    stock,
                };
                commands::products::create(&ctx, args).await?;
            }
            ProductAction::Update { id, price, stock } => {
                commands::products::update(&ctx, id, price, stock).await?;
            }
            ProductAction::Delete { id } => commands::products::delete(&ctx, id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx).await?,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(&ctx, product_id, quantity).await?,
            CartAction::Qty { item_id, quantity } => {
                commands::cart::set_quantity(&ctx, item_id, quantity).await?;
            }
            CartAction::Inc { item_id } => {
                commands::cart::step(&ctx, item_id, QuantityStep::Increment).await?;
            }
            CartAction::Dec { item_id } => {
                commands::cart::step(&ctx, item_id, QuantityStep::Decrement).await?;
            }
            CartAction::Remove { item_id } => commands::cart::remove(&ctx, item_id).await?,
            CartAction::Checkout { place_order } => {
                commands::cart::checkout(&ctx, place_order).await?;
            }
            CartAction::Resolve => commands::cart::resolve(&ctx).await?,
        },
        Commands::Orders { action } => match action {
            OrderAction::List => commands::orders::list(&ctx).await?,
            OrderAction::Status { id, status } => {
                commands::orders::set_status(&ctx, id, status).await?;
            }
        },
        Commands::Users { action } => match action {
            UserAction::List => commands::users::list(&ctx).await?,
            UserAction::Show { id } => commands::users::show(&ctx, id).await?,
            UserAction::Block { id } => {
                commands::users::set_status(&ctx, id, UserStatus::Blocked).await?;
            }
            UserAction::Unblock { id } => {
                commands::users::set_status(&ctx, id, UserStatus::Active).await?;
            }
            UserAction::Delete { id } => commands::users::delete(&ctx, id).await?,
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
    fn test_parse_order_status() {
        assert_eq!(parse_order_status("enviada"), Ok(OrderStatus::Shipped));
        assert!(parse_order_status("lost").is_err());
    }
}
