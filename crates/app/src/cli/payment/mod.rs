use clap::{Args, Subcommand};

mod create;
mod verify;

#[derive(Debug, Args)]
pub(crate) struct PaymentCommand {
    #[command(subcommand)]
    command: PaymentSubcommand,
}

#[derive(Debug, Subcommand)]
enum PaymentSubcommand {
    Create(create::CreatePaymentArgs),
    Verify(verify::VerifyPaymentArgs),
}

pub(crate) async fn run(command: PaymentCommand) -> Result<(), String> {
    match command.command {
        PaymentSubcommand::Create(args) => create::run(args).await,
        PaymentSubcommand::Verify(args) => verify::run(args).await,
    }
}
