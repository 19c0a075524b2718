use clap::Args;
use market_app::domain::users::UserUuid;
use uuid::Uuid;

use crate::cli::{ServiceArgs, coupon::CouponSelector, print_json};

#[derive(Debug, Args)]
pub(crate) struct RedeemCouponArgs {
    #[command(flatten)]
    service: ServiceArgs,

    #[command(flatten)]
    coupon: CouponSelector,

    /// User redeeming the coupon
    #[arg(long)]
    user_uuid: Uuid,
}

pub(crate) async fn run(args: RedeemCouponArgs) -> Result<(), String> {
    let app = args.service.context().await?;
    let coupon = args.coupon.resolve(&app).await?;

    let row = app
        .coupons
        .redeem_coupon(coupon, UserUuid::from_uuid(args.user_uuid))
        .await
        .map_err(|error| format!("failed to redeem coupon: {error}"))?;

    print_json(&row)
}
