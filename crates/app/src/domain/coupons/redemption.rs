//! Coupon Redemption
//!
//! Decides which coupon user row a redemption or grant touches. The service
//! reads the coupon and its rows under a lock on the coupon, asks for a plan,
//! then applies it.

use jiff::Timestamp;

use crate::domain::{
    coupons::{
        CouponsServiceError,
        records::{CouponRecord, CouponUserRecord, CouponUserUuid, RedemptionState},
    },
    users::UserUuid,
};

/// The single row write a redemption or grant needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPlan {
    /// The user already holds an unredeemed row.
    UseBound(CouponUserUuid),

    /// Bind the user to a slot nobody has claimed.
    ClaimUnbound(CouponUserUuid),

    /// No row is available; insert one for the user.
    Insert,
}

/// Plan a redemption of `coupon` by `user` at `now`.
///
/// # Errors
///
/// - [`CouponsServiceError::ExpiredCoupon`] when the coupon has expired.
/// - [`CouponsServiceError::AlreadyRedeemed`] when the user's row carries a
///   redemption time.
pub fn plan_redemption(
    coupon: &CouponRecord,
    rows: &[CouponUserRecord],
    user: UserUuid,
    now: Timestamp,
) -> Result<SlotPlan, CouponsServiceError> {
    if coupon.is_expired(now) {
        return Err(CouponsServiceError::ExpiredCoupon);
    }

    plan_slot(rows, user)
}

/// Plan binding `user` to `coupon` without redeeming it.
///
/// # Errors
///
/// Same as [`plan_redemption`].
pub fn plan_grant(
    coupon: &CouponRecord,
    rows: &[CouponUserRecord],
    user: UserUuid,
    now: Timestamp,
) -> Result<SlotPlan, CouponsServiceError> {
    plan_redemption(coupon, rows, user, now)
}

fn plan_slot(rows: &[CouponUserRecord], user: UserUuid) -> Result<SlotPlan, CouponsServiceError> {
    if let Some(row) = rows.iter().find(|row| row.user_uuid == Some(user)) {
        return match row.state() {
            RedemptionState::Redeemed => Err(CouponsServiceError::AlreadyRedeemed),
            RedemptionState::BoundUnredeemed | RedemptionState::Unbound => {
                Ok(SlotPlan::UseBound(row.uuid))
            }
        };
    }

    let plan = rows
        .iter()
        .find(|row| row.state() == RedemptionState::Unbound)
        .map_or(SlotPlan::Insert, |row| SlotPlan::ClaimUnbound(row.uuid));

    Ok(plan)
}
