pub(crate) mod coupon_users;
pub(crate) mod coupons;
