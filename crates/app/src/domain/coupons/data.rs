//! Coupon Data

use jiff::Timestamp;

use crate::domain::{coupons::records::CouponUuid, users::UserUuid};

/// New Coupon
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub uuid: CouponUuid,

    /// Code to issue. A `KW-` code is generated when absent.
    pub code: Option<String>,

    /// Amount taken off an order's gross price, in minor units.
    pub value: u64,

    pub valid_until: Timestamp,

    /// Users the coupon is meant for. Empty means anyone, without limit.
    pub user_list: Vec<UserUuid>,
}
