use clap::Args;

use crate::cli::{ServiceArgs, print_json};

#[derive(Debug, Args)]
pub(crate) struct VerifyPaymentArgs {
    #[command(flatten)]
    service: ServiceArgs,

    /// Payment reference confirmed by the provider
    #[arg(long)]
    payment_ref: String,
}

pub(crate) async fn run(args: VerifyPaymentArgs) -> Result<(), String> {
    let app = args.service.context().await?;

    let payment = app
        .payments
        .verify_payment(&args.payment_ref)
        .await
        .map_err(|error| format!("failed to verify payment: {error}"))?;

    print_json(&payment)
}
