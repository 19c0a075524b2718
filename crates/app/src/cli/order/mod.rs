use clap::{Args, Subcommand};

mod pay;
mod place;

#[derive(Debug, Args)]
pub(crate) struct OrderCommand {
    #[command(subcommand)]
    command: OrderSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrderSubcommand {
    Place(place::PlaceOrderArgs),
    Pay(pay::PayOrderArgs),
}

pub(crate) async fn run(command: OrderCommand) -> Result<(), String> {
    match command.command {
        OrderSubcommand::Place(args) => place::run(args).await,
        OrderSubcommand::Pay(args) => pay::run(args).await,
    }
}
