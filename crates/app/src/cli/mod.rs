use clap::{Args, Parser, Subcommand};
use market_app::{context::AppContext, identifiers::DEFAULT_MAX_ATTEMPTS, logging::LoggingConfig};
use serde::Serialize;

mod cart;
mod coupon;
mod db;
mod order;
mod payment;
mod product;

#[derive(Debug, Parser)]
#[command(name = "market-app", about = "Marketplace operator CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Product(product::ProductCommand),
    Coupon(coupon::CouponCommand),
    Cart(cart::CartCommand),
    Order(order::OrderCommand),
    Payment(payment::PaymentCommand),
}

impl Cli {
    pub(crate) fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Product(command) => product::run(command).await,
            Commands::Coupon(command) => coupon::run(command).await,
            Commands::Cart(command) => cart::run(command).await,
            Commands::Order(command) => order::run(command).await,
            Commands::Payment(command) => payment::run(command).await,
        }
    }
}

/// Connection settings shared by every command that talks to the services.
#[derive(Debug, Args)]
pub(crate) struct ServiceArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Draws allowed for an unused order id, coupon code or payment reference.
    /// Zero is treated as one.
    #[arg(long, env = "IDENTIFIER_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    identifier_max_attempts: usize,
}

impl ServiceArgs {
    pub(crate) async fn context(&self) -> Result<AppContext, String> {
        AppContext::from_database_url(&self.database_url, self.identifier_max_attempts)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|error| format!("failed to encode output: {error}"))?;

    println!("{json}");

    Ok(())
}
