use clap::Args;
use storefront_orders::{context::AppContext, domain::buyers::BuyerUuid};

use super::orders::print_order;

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Buyer UUID
    #[arg(long)]
    buyer: BuyerUuid,

    /// Client-supplied key; retrying with the same key returns the same order
    #[arg(long)]
    idempotency_key: Option<String>,
}

pub(crate) async fn run(app: &AppContext, args: CheckoutArgs) -> Result<(), String> {
    let order = app
        .checkout
        .checkout(args.buyer, args.idempotency_key)
        .await
        .map_err(|error| {
            if error.is_retryable() {
                format!("checkout failed, safe to retry: {error}")
            } else {
                format!("checkout failed: {error}")
            }
        })?;

    print_order(&order)
}
