use clap::Args;
use market_app::domain::{
    payments::data::{DEFAULT_CURRENCY, NewPayment},
    users::UserUuid,
};
use uuid::Uuid;

use crate::cli::{ServiceArgs, print_json};

#[derive(Debug, Args)]
pub(crate) struct CreatePaymentArgs {
    #[command(flatten)]
    service: ServiceArgs,

    /// User the payment came from
    #[arg(long)]
    user_uuid: Uuid,

    /// Amount received in minor units
    #[arg(long)]
    amount: u64,

    /// ISO 4217 currency code
    #[arg(long, default_value = DEFAULT_CURRENCY)]
    currency: String,
}

pub(crate) async fn run(args: CreatePaymentArgs) -> Result<(), String> {
    let app = args.service.context().await?;

    let mut payment = NewPayment::new(UserUuid::from_uuid(args.user_uuid), args.amount);
    payment.currency = args.currency;

    let payment = app
        .payments
        .create_payment(payment)
        .await
        .map_err(|error| format!("failed to create payment: {error}"))?;

    print_json(&payment)
}
