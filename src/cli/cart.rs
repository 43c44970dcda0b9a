use clap::{Args, Subcommand};
use storefront_orders::{
    context::AppContext,
    domain::{buyers::BuyerUuid, carts::records::CartEntry, products::records::ProductUuid},
};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Add units of a product, merging with an existing entry
    Add(ItemArgs),
    /// Set the quantity of an entry; zero removes it
    Update(ItemArgs),
    /// Remove a product from the cart
    Remove(RemoveArgs),
    /// Show the cart
    Show(ShowArgs),
}

#[derive(Debug, Args)]
struct ItemArgs {
    /// Buyer UUID
    #[arg(long)]
    buyer: BuyerUuid,

    /// Product UUID
    #[arg(long)]
    product: ProductUuid,

    #[arg(long)]
    quantity: u32,
}

#[derive(Debug, Args)]
struct RemoveArgs {
    /// Buyer UUID
    #[arg(long)]
    buyer: BuyerUuid,

    /// Product UUID
    #[arg(long)]
    product: ProductUuid,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Buyer UUID
    #[arg(long)]
    buyer: BuyerUuid,
}

pub(crate) async fn run(app: &AppContext, command: CartCommand) -> Result<(), String> {
    let entries = match command.command {
        CartSubcommand::Add(args) => {
            app.carts
                .add_item(args.buyer, args.product, args.quantity)
                .await
        }
        CartSubcommand::Update(args) => {
            app.carts
                .update_item(args.buyer, args.product, args.quantity)
                .await
        }
        CartSubcommand::Remove(args) => app.carts.remove_item(args.buyer, args.product).await,
        CartSubcommand::Show(args) => app.carts.get_cart(args.buyer).await,
    }
    .map_err(|error| format!("cart operation failed: {error}"))?;

    print_entries(&entries);

    Ok(())
}

fn print_entries(entries: &[CartEntry]) {
    if entries.is_empty() {
        println!("cart is empty");
        return;
    }

    for entry in entries {
        println!("{} x{}", entry.product, entry.quantity);
    }
}
