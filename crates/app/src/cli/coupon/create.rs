use clap::Args;
use jiff::Timestamp;
use market_app::domain::{
    coupons::{data::NewCoupon, records::CouponUuid},
    users::UserUuid,
};
use uuid::Uuid;

use crate::cli::{ServiceArgs, print_json};

#[derive(Debug, Args)]
pub(crate) struct CreateCouponArgs {
    #[command(flatten)]
    service: ServiceArgs,

    /// Amount taken off an order, in minor units
    #[arg(long)]
    value: u64,

    /// Last moment the coupon can be redeemed (RFC 3339)
    #[arg(long)]
    valid_until: String,

    /// Code to issue; a KW- code is generated when omitted
    #[arg(long)]
    code: Option<String>,

    /// User the coupon is meant for; repeat for several, omit for anyone
    #[arg(long = "user")]
    users: Vec<Uuid>,
}

pub(crate) async fn run(args: CreateCouponArgs) -> Result<(), String> {
    let valid_until = args
        .valid_until
        .parse::<Timestamp>()
        .map_err(|error| format!("invalid valid-until timestamp: {error}"))?;

    let app = args.service.context().await?;

    let coupon = app
        .coupons
        .create_coupon(NewCoupon {
            uuid: CouponUuid::new(),
            code: args.code,
            value: args.value,
            valid_until,
            user_list: args.users.into_iter().map(UserUuid::from_uuid).collect(),
        })
        .await
        .map_err(|error| format!("failed to create coupon: {error}"))?;

    print_json(&coupon)
}
