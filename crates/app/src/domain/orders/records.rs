//! Order Records

use jiff::Timestamp;
use serde::Serialize;

use crate::{
    domain::{
        carts::records::CartItemUuid, coupons::records::CouponUuid,
        payments::records::PaymentUuid, products::records::ProductUuid, users::UserUuid,
    },
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order Item UUID
pub type OrderItemUuid = TypedUuid<OrderItemRecord>;

/// Delivery status of a freshly placed order.
pub const DEFAULT_DELIVERY_STATUS: &str = "Order in progress";

/// Order Record
///
/// `gross_price` and `net_price` are fixed when the order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub uuid: OrderUuid,

    /// Human-readable identifier, `KWEK-` followed by a url-safe token.
    pub order_id: String,
    pub user_uuid: UserUuid,
    pub cart_items: Vec<CartItemUuid>,
    pub coupons: Vec<CouponUuid>,
    pub payment_method: String,
    pub delivery_method: String,
    pub delivery_status: String,
    pub gross_price: u64,
    pub net_price: u64,
    pub payment_uuid: Option<PaymentUuid>,
    pub closed: bool,
    pub paid: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One cart line as it stood when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemRecord {
    pub uuid: OrderItemUuid,
    pub order_uuid: OrderUuid,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub price: u64,
}
