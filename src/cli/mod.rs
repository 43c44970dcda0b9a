use clap::{Parser, Subcommand};
use storefront_orders::context::AppContext;

use crate::config::{self, CartConfig, DatabaseConfig, FulfillmentConfig, LoggingConfig};

mod cart;
mod checkout;
mod orders;
mod product;
mod reconcile;
mod worker;

#[derive(Debug, Parser)]
#[command(name = "storefront-orders", about = "Storefront orders CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    cart: CartConfig,

    #[command(flatten)]
    fulfillment: FulfillmentConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the fulfillment worker until Ctrl+C or SIGTERM
    Worker,
    /// Place an order for everything in a buyer's cart
    Checkout(checkout::CheckoutArgs),
    Cart(cart::CartCommand),
    Product(product::ProductCommand),
    /// List a buyer's orders, newest first
    Orders(orders::OrdersArgs),
    /// Requeue stale `PENDING` orders and fulfill them
    Reconcile,
}

impl Cli {
    pub(crate) fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let settings = config::app_settings(&self.database, &self.cart, &self.fulfillment);

        let (app, worker) = AppContext::from_settings(&settings)
            .await
            .map_err(|error| format!("failed to initialize app context: {error}"))?;

        match self.command {
            Commands::Worker => worker::run(app, worker, &self.fulfillment).await,
            Commands::Reconcile => reconcile::run(app, worker, &self.fulfillment).await,
            Commands::Checkout(args) => {
                // Nothing drains the queue in this process, so the order stays
                // PENDING until a worker reconciles it.
                drop(worker);
                checkout::run(&app, args).await
            }
            Commands::Cart(command) => cart::run(&app, command).await,
            Commands::Product(command) => product::run(&app, command).await,
            Commands::Orders(args) => orders::run(&app, args).await,
        }
    }
}
