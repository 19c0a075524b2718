use clap::Args;
use market_app::domain::orders::records::OrderUuid;
use uuid::Uuid;

use crate::cli::{ServiceArgs, print_json};

#[derive(Debug, Args)]
pub(crate) struct PayOrderArgs {
    #[command(flatten)]
    service: ServiceArgs,

    /// Order to settle
    #[arg(long)]
    order_uuid: Uuid,

    /// Reference of a verified payment
    #[arg(long)]
    payment_ref: String,
}

pub(crate) async fn run(args: PayOrderArgs) -> Result<(), String> {
    let app = args.service.context().await?;

    let order = app
        .orders
        .mark_paid(OrderUuid::from_uuid(args.order_uuid), &args.payment_ref)
        .await
        .map_err(|error| format!("failed to settle order: {error}"))?;

    print_json(&order)
}
