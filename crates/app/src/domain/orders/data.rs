//! Order Data

use crate::domain::{
    carts::records::CartItemUuid, coupons::records::CouponUuid, orders::records::OrderUuid,
    users::UserUuid,
};

/// New Order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub user_uuid: UserUuid,

    /// Items from the user's cart to check out. Repeats are ignored.
    pub cart_items: Vec<CartItemUuid>,

    /// Coupons applied to the order. Repeats are ignored.
    pub coupons: Vec<CouponUuid>,
    pub payment_method: String,
    pub delivery_method: String,
}
