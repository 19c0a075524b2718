use clap::{Args, Subcommand};
use market_app::{context::AppContext, domain::coupons::records::CouponUuid};
use uuid::Uuid;

mod create;
mod grant;
mod redeem;

#[derive(Debug, Args)]
pub(crate) struct CouponCommand {
    #[command(subcommand)]
    command: CouponSubcommand,
}

#[derive(Debug, Subcommand)]
enum CouponSubcommand {
    Create(create::CreateCouponArgs),
    Grant(grant::GrantCouponArgs),
    Redeem(redeem::RedeemCouponArgs),
}

pub(crate) async fn run(command: CouponCommand) -> Result<(), String> {
    match command.command {
        CouponSubcommand::Create(args) => create::run(args).await,
        CouponSubcommand::Grant(args) => grant::run(args).await,
        CouponSubcommand::Redeem(args) => redeem::run(args).await,
    }
}

/// A coupon named by UUID or by code.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub(crate) struct CouponSelector {
    /// Coupon UUID
    #[arg(long)]
    coupon_uuid: Option<Uuid>,

    /// Coupon code
    #[arg(long)]
    code: Option<String>,
}

impl CouponSelector {
    pub(crate) async fn resolve(&self, app: &AppContext) -> Result<CouponUuid, String> {
        match (&self.coupon_uuid, &self.code) {
            (Some(uuid), _) => Ok(CouponUuid::from_uuid(*uuid)),
            (None, Some(code)) => app
                .coupons
                .get_coupon_by_code(code)
                .await
                .map(|coupon| coupon.uuid)
                .map_err(|error| format!("failed to find coupon {code}: {error}")),
            (None, None) => Err("either coupon-uuid or code is required".to_string()),
        }
    }
}
