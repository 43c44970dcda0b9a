use clap::Args;
use storefront_orders::{
    context::AppContext,
    domain::{buyers::BuyerUuid, orders::records::OrderRecord},
};

#[derive(Debug, Args)]
pub(crate) struct OrdersArgs {
    /// Buyer UUID
    #[arg(long)]
    buyer: BuyerUuid,
}

pub(crate) async fn run(app: &AppContext, args: OrdersArgs) -> Result<(), String> {
    let orders = app
        .orders
        .list_orders(args.buyer)
        .await
        .map_err(|error| format!("failed to list orders: {error}"))?;

    if orders.is_empty() {
        println!("no orders found for buyer {}", args.buyer);
        return Ok(());
    }

    for order in &orders {
        print_order(order)?;
    }

    Ok(())
}

pub(super) fn print_order(order: &OrderRecord) -> Result<(), String> {
    let json = serde_json::to_string_pretty(order)
        .map_err(|error| format!("failed to render order: {error}"))?;

    println!("{json}");

    Ok(())
}
