use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use storefront_orders::{
    context::AppContext,
    domain::products::{
        data::NewProduct,
        records::{ProductRecord, ProductUuid},
    },
};

#[derive(Debug, Args)]
pub(crate) struct ProductCommand {
    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    /// Add a product to the stock ledger
    Create(CreateProductArgs),
    /// Add units to a product's stock
    Restock(RestockArgs),
    /// Show a product's price and stock
    Show(ShowProductArgs),
}

#[derive(Debug, Args)]
struct CreateProductArgs {
    /// Unit price, e.g. 9.995
    #[arg(long)]
    price: Decimal,

    /// Opening stock
    #[arg(long, default_value_t = 0)]
    stock: u64,

    /// Optional product UUID; generated when omitted
    #[arg(long)]
    uuid: Option<ProductUuid>,
}

#[derive(Debug, Args)]
struct RestockArgs {
    /// Product UUID
    #[arg(long)]
    product: ProductUuid,

    #[arg(long)]
    quantity: u64,
}

#[derive(Debug, Args)]
struct ShowProductArgs {
    /// Product UUID
    #[arg(long)]
    product: ProductUuid,
}

pub(crate) async fn run(app: &AppContext, command: ProductCommand) -> Result<(), String> {
    let product = match command.command {
        ProductSubcommand::Create(args) => {
            app.products
                .create_product(NewProduct {
                    uuid: args.uuid.unwrap_or_else(ProductUuid::new),
                    price: args.price,
                    stock: args.stock,
                })
                .await
        }
        ProductSubcommand::Restock(args) => app.products.restock(args.product, args.quantity).await,
        ProductSubcommand::Show(args) => app.products.get_product(args.product).await,
    }
    .map_err(|error| format!("product operation failed: {error}"))?;

    print_product(&product);

    Ok(())
}

fn print_product(product: &ProductRecord) {
    println!("product_uuid: {}", product.uuid);
    println!("price: {}", product.price);
    println!("stock: {}", product.stock);
    println!("updated_at: {}", product.updated_at);
}
