//! Coupon Records

use jiff::Timestamp;
use serde::Serialize;

use crate::{domain::users::UserUuid, uuids::TypedUuid};

/// Coupon UUID
pub type CouponUuid = TypedUuid<CouponRecord>;

/// Coupon User UUID
pub type CouponUserUuid = TypedUuid<CouponUserRecord>;

/// Coupon Record
///
/// Redemption totals are aggregated from the coupon's user rows whenever the
/// coupon is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouponRecord {
    pub uuid: CouponUuid,
    pub code: String,
    pub value: u64,
    pub valid_until: Timestamp,
    pub user_list: Vec<UserUuid>,
    pub redeemed_count: u64,
    pub last_redeemed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl CouponRecord {
    /// A coupon is expired once `now` passes `valid_until`.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.valid_until
    }

    /// Number of redemptions the coupon is meant for. Zero means unlimited.
    #[must_use]
    pub fn user_limit(&self) -> usize {
        self.user_list.len()
    }

    #[must_use]
    pub fn is_redeemed(&self) -> bool {
        let limit = u64::try_from(self.user_limit()).unwrap_or(u64::MAX);

        limit > 0 && self.redeemed_count >= limit
    }
}

/// Where a user stands with a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionState {
    Unbound,
    BoundUnredeemed,
    Redeemed,
}

/// Coupon User Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouponUserRecord {
    pub uuid: CouponUserUuid,
    pub coupon_uuid: CouponUuid,

    /// `None` for a slot nobody has claimed yet.
    pub user_uuid: Option<UserUuid>,
    pub redeemed_at: Option<Timestamp>,
}

impl CouponUserRecord {
    #[must_use]
    pub fn state(&self) -> RedemptionState {
        match (self.user_uuid, self.redeemed_at) {
            (None, _) => RedemptionState::Unbound,
            (Some(_), None) => RedemptionState::BoundUnredeemed,
            (Some(_), Some(_)) => RedemptionState::Redeemed,
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, Timestamp};
    use testresult::TestResult;

    use super::*;

    fn coupon(user_list: Vec<UserUuid>, redeemed_count: u64) -> TestResult<CouponRecord> {
        Ok(CouponRecord {
            uuid: CouponUuid::new(),
            code: "KW-ABCD1234".to_string(),
            value: 500,
            valid_until: Timestamp::from_second(1_800_000_000)?,
            user_list,
            redeemed_count,
            last_redeemed_at: None,
            created_at: Timestamp::UNIX_EPOCH,
        })
    }

    #[test]
    fn expiry_is_strictly_after_valid_until() -> TestResult {
        let coupon = coupon(Vec::new(), 0)?;

        assert!(!coupon.is_expired(coupon.valid_until));
        assert!(coupon.is_expired(coupon.valid_until.checked_add(SignedDuration::from_secs(1))?));
        assert!(!coupon.is_expired(Timestamp::UNIX_EPOCH));

        Ok(())
    }

    #[test]
    fn unlimited_coupon_is_never_redeemed() -> TestResult {
        let coupon = coupon(Vec::new(), 10_000)?;

        assert_eq!(coupon.user_limit(), 0);
        assert!(!coupon.is_redeemed());

        Ok(())
    }

    #[test]
    fn limited_coupon_is_redeemed_once_limit_reached() -> TestResult {
        let users = vec![UserUuid::new(), UserUuid::new()];

        assert!(!coupon(users.clone(), 1)?.is_redeemed());
        assert!(coupon(users.clone(), 2)?.is_redeemed());
        assert!(coupon(users, 3)?.is_redeemed());

        Ok(())
    }

    #[test]
    fn coupon_user_states() {
        let mut row = CouponUserRecord {
            uuid: CouponUserUuid::new(),
            coupon_uuid: CouponUuid::new(),
            user_uuid: None,
            redeemed_at: None,
        };

        assert_eq!(row.state(), RedemptionState::Unbound);

        row.user_uuid = Some(UserUuid::new());

        assert_eq!(row.state(), RedemptionState::BoundUnredeemed);

        row.redeemed_at = Some(Timestamp::UNIX_EPOCH);

        assert_eq!(row.state(), RedemptionState::Redeemed);
    }
}
