//! Storefront Orders CLI

use std::process;

use clap::Parser;

use crate::cli::Cli;

mod cli;
mod config;
mod observability;
mod shutdown;

#[tokio::main]
pub async fn main() {
    let _env = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(error) = observability::init(cli.logging()) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized, must use eprintln"
        )]
        {
            eprintln!("failed to initialize logging: {error}");
        }

        process::exit(1);
    }

    if let Err(error) = cli.run().await {
        tracing::error!("{error}");

        process::exit(1);
    }
}
