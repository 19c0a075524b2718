use clap::Args;
use market_app::domain::{
    carts::records::CartItemUuid,
    coupons::records::CouponUuid,
    orders::{
        data::NewOrder,
        records::{OrderItemRecord, OrderRecord, OrderUuid},
    },
    users::UserUuid,
};
use serde::Serialize;
use uuid::Uuid;

use crate::cli::{ServiceArgs, print_json};

#[derive(Debug, Args)]
pub(crate) struct PlaceOrderArgs {
    #[command(flatten)]
    service: ServiceArgs,

    /// User placing the order
    #[arg(long)]
    user_uuid: Uuid,

    /// Cart item to check out; repeat for several
    #[arg(long = "item", required = true)]
    items: Vec<Uuid>,

    /// Coupon to apply; repeat for several
    #[arg(long = "coupon")]
    coupons: Vec<Uuid>,

    #[arg(long)]
    payment_method: String,

    #[arg(long)]
    delivery_method: String,
}

#[derive(Serialize)]
struct PlacedOrder {
    order: OrderRecord,
    items: Vec<OrderItemRecord>,
}

pub(crate) async fn run(args: PlaceOrderArgs) -> Result<(), String> {
    let app = args.service.context().await?;

    let order = app
        .orders
        .place_order(NewOrder {
            uuid: OrderUuid::new(),
            user_uuid: UserUuid::from_uuid(args.user_uuid),
            cart_items: args.items.into_iter().map(CartItemUuid::from_uuid).collect(),
            coupons: args.coupons.into_iter().map(CouponUuid::from_uuid).collect(),
            payment_method: args.payment_method,
            delivery_method: args.delivery_method,
        })
        .await
        .map_err(|error| format!("failed to place order: {error}"))?;

    let items = app
        .orders
        .list_order_items(order.uuid)
        .await
        .map_err(|error| format!("failed to list order items: {error}"))?;

    print_json(&PlacedOrder { order, items })
}
