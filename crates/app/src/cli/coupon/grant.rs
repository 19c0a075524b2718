use clap::Args;
use market_app::domain::users::UserUuid;
use uuid::Uuid;

use crate::cli::{ServiceArgs, coupon::CouponSelector, print_json};

#[derive(Debug, Args)]
pub(crate) struct GrantCouponArgs {
    #[command(flatten)]
    service: ServiceArgs,

    #[command(flatten)]
    coupon: CouponSelector,

    /// User to bind the coupon to
    #[arg(long)]
    user_uuid: Uuid,
}

pub(crate) async fn run(args: GrantCouponArgs) -> Result<(), String> {
    let app = args.service.context().await?;
    let coupon = args.coupon.resolve(&app).await?;

    let row = app
        .coupons
        .grant_coupon(coupon, UserUuid::from_uuid(args.user_uuid))
        .await
        .map_err(|error| format!("failed to grant coupon: {error}"))?;

    print_json(&row)
}
