use std::net::IpAddr;

use clap::Args;
use market_app::domain::users::UserUuid;
use uuid::Uuid;

use crate::cli::{ServiceArgs, print_json};

#[derive(Debug, Args)]
pub(crate) struct MergeCartArgs {
    #[command(flatten)]
    service: ServiceArgs,

    /// Address the anonymous cart was built under
    #[arg(long)]
    ip: IpAddr,

    /// User signing in
    #[arg(long)]
    user_uuid: Uuid,
}

pub(crate) async fn run(args: MergeCartArgs) -> Result<(), String> {
    let app = args.service.context().await?;

    let outcome = app
        .carts
        .merge_carts(args.ip, UserUuid::from_uuid(args.user_uuid))
        .await
        .map_err(|error| format!("failed to merge carts: {error}"))?;

    print_json(&outcome)
}
