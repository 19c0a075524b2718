//! Coupons Service

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use sqlx::Acquire;
use tracing::{Span, info, warn};

use crate::{
    clock::Clock,
    database::{Db, is_unique_violation},
    domain::{
        coupons::{
            CouponsServiceError,
            data::NewCoupon,
            records::{CouponRecord, CouponUserRecord, CouponUuid},
            redemption::{SlotPlan, plan_grant, plan_redemption},
            repositories::{
                coupon_users::PgCouponUsersRepository,
                coupons::{COUPON_CODE_CONSTRAINT, PgCouponsRepository},
            },
        },
        users::UserUuid,
    },
    identifiers::{IdentifierGenerator, IdentifierKind},
};

/// Longest code the coupons table accepts.
const MAX_CODE_LENGTH: usize = 16;

#[derive(Debug, Clone)]
pub struct PgCouponsService {
    db: Db,
    clock: Arc<dyn Clock>,
    identifiers: Arc<IdentifierGenerator>,
    coupons: PgCouponsRepository,
    coupon_users: PgCouponUsersRepository,
}

impl PgCouponsService {
    #[must_use]
    pub fn new(db: Db, clock: Arc<dyn Clock>, identifiers: Arc<IdentifierGenerator>) -> Self {
        Self {
            db,
            clock,
            identifiers,
            coupons: PgCouponsRepository::new(),
            coupon_users: PgCouponUsersRepository::new(),
        }
    }
}

#[async_trait]
impl CouponsService for PgCouponsService {
    #[tracing::instrument(
        name = "coupons.service.create_coupon",
        skip(self, coupon),
        fields(
            coupon_uuid = %coupon.uuid,
            value = coupon.value,
            user_limit = coupon.user_list.len(),
            code = tracing::field::Empty
        ),
        err
    )]
    async fn create_coupon(&self, coupon: NewCoupon) -> Result<CouponRecord, CouponsServiceError> {
        let NewCoupon {
            uuid,
            code,
            value,
            valid_until,
            user_list,
        } = coupon;

        let mut tx = self.db.begin_transaction().await?;

        let created = if let Some(code) = code {
            let code = code.trim();

            if code.is_empty() || code.len() > MAX_CODE_LENGTH {
                return Err(CouponsServiceError::InvalidData);
            }

            self.coupons
                .create_coupon(&mut tx, uuid, code, value, valid_until, &user_list)
                .await?
        } else {
            let mut created = None;

            for candidate in self.identifiers.candidates(IdentifierKind::CouponCode) {
                if self.coupons.code_exists(&mut tx, &candidate).await? {
                    warn!(code = %candidate, "coupon code taken, drawing another");

                    continue;
                }

                let mut savepoint = tx.begin().await?;

                match self
                    .coupons
                    .create_coupon(&mut savepoint, uuid, &candidate, value, valid_until, &user_list)
                    .await
                {
                    Ok(coupon) => {
                        savepoint.commit().await?;
                        created = Some(coupon);

                        break;
                    }
                    Err(error) if is_unique_violation(&error, COUPON_CODE_CONSTRAINT) => {
                        savepoint.rollback().await?;

                        warn!(code = %candidate, "coupon code claimed concurrently, drawing another");
                    }
                    Err(error) => return Err(error.into()),
                }
            }

            created.ok_or_else(|| self.identifiers.exhausted(IdentifierKind::CouponCode))?
        };

        tx.commit().await?;

        Span::current().record("code", tracing::field::display(&created.code));

        info!(coupon_uuid = %created.uuid, "created coupon");

        Ok(created)
    }

    async fn get_coupon(&self, coupon: CouponUuid) -> Result<CouponRecord, CouponsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let coupon = self.coupons.get_coupon(&mut tx, coupon).await?;

        tx.commit().await?;

        Ok(coupon)
    }

    async fn get_coupon_by_code(&self, code: &str) -> Result<CouponRecord, CouponsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let coupon = self.coupons.get_coupon_by_code(&mut tx, code.trim()).await?;

        tx.commit().await?;

        Ok(coupon)
    }

    async fn list_coupon_users(
        &self,
        coupon: CouponUuid,
    ) -> Result<Vec<CouponUserRecord>, CouponsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        self.coupons.get_coupon(&mut tx, coupon).await?;

        let rows = self.coupon_users.list_coupon_users(&mut tx, coupon).await?;

        tx.commit().await?;

        Ok(rows)
    }

    #[tracing::instrument(
        name = "coupons.service.provision_slot",
        skip(self),
        fields(coupon_uuid = %coupon),
        err
    )]
    async fn provision_slot(
        &self,
        coupon: CouponUuid,
    ) -> Result<CouponUserRecord, CouponsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        self.coupons.lock_coupon(&mut tx, coupon).await?;

        let slot = self
            .coupon_users
            .insert_coupon_user(&mut tx, coupon, None, None)
            .await?;

        tx.commit().await?;

        Ok(slot)
    }

    #[tracing::instrument(
        name = "coupons.service.grant_coupon",
        skip(self),
        fields(coupon_uuid = %coupon, user_uuid = %user),
        err
    )]
    async fn grant_coupon(
        &self,
        coupon: CouponUuid,
        user: UserUuid,
    ) -> Result<CouponUserRecord, CouponsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let locked = self.coupons.lock_coupon(&mut tx, coupon).await?;
        let rows = self.coupon_users.list_coupon_users(&mut tx, coupon).await?;

        let granted = match plan_grant(&locked, &rows, user, self.clock.now())? {
            SlotPlan::UseBound(row) => self.coupon_users.get_coupon_user(&mut tx, row).await?,
            SlotPlan::ClaimUnbound(row) => {
                match self
                    .coupon_users
                    .claim_coupon_user(&mut tx, row, user, None)
                    .await?
                {
                    Some(claimed) => claimed,
                    None => {
                        self.coupon_users
                            .insert_coupon_user(&mut tx, coupon, Some(user), None)
                            .await?
                    }
                }
            }
            SlotPlan::Insert => {
                self.coupon_users
                    .insert_coupon_user(&mut tx, coupon, Some(user), None)
                    .await?
            }
        };

        tx.commit().await?;

        Ok(granted)
    }

    #[tracing::instrument(
        name = "coupons.service.redeem_coupon",
        skip(self),
        fields(coupon_uuid = %coupon, user_uuid = %user),
        err
    )]
    async fn redeem_coupon(
        &self,
        coupon: CouponUuid,
        user: UserUuid,
    ) -> Result<CouponUserRecord, CouponsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let locked = self.coupons.lock_coupon(&mut tx, coupon).await?;
        let rows = self.coupon_users.list_coupon_users(&mut tx, coupon).await?;

        let now = self.clock.now();

        let redeemed = match plan_redemption(&locked, &rows, user, now)? {
            SlotPlan::UseBound(row) => self
                .coupon_users
                .stamp_coupon_user(&mut tx, row, now)
                .await?
                .ok_or(CouponsServiceError::AlreadyRedeemed)?,
            SlotPlan::ClaimUnbound(row) => {
                match self
                    .coupon_users
                    .claim_coupon_user(&mut tx, row, user, Some(now))
                    .await?
                {
                    Some(claimed) => claimed,
                    None => {
                        self.coupon_users
                            .insert_coupon_user(&mut tx, coupon, Some(user), Some(now))
                            .await?
                    }
                }
            }
            SlotPlan::Insert => {
                self.coupon_users
                    .insert_coupon_user(&mut tx, coupon, Some(user), Some(now))
                    .await?
            }
        };

        tx.commit().await?;

        info!(coupon_uuid = %coupon, user_uuid = %user, "redeemed coupon");

        Ok(redeemed)
    }
}

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync {
    /// Create a coupon, generating a unique code when none is given.
    async fn create_coupon(&self, coupon: NewCoupon) -> Result<CouponRecord, CouponsServiceError>;

    /// Retrieve a coupon with its redemption totals.
    async fn get_coupon(&self, coupon: CouponUuid) -> Result<CouponRecord, CouponsServiceError>;

    async fn get_coupon_by_code(&self, code: &str) -> Result<CouponRecord, CouponsServiceError>;

    /// Every user row recorded against a coupon, unbound slots included.
    async fn list_coupon_users(
        &self,
        coupon: CouponUuid,
    ) -> Result<Vec<CouponUserRecord>, CouponsServiceError>;

    /// Add a slot any user may later claim.
    async fn provision_slot(
        &self,
        coupon: CouponUuid,
    ) -> Result<CouponUserRecord, CouponsServiceError>;

    /// Bind a user to a coupon without redeeming it.
    ///
    /// Granting a coupon the user already holds returns the existing row.
    async fn grant_coupon(
        &self,
        coupon: CouponUuid,
        user: UserUuid,
    ) -> Result<CouponUserRecord, CouponsServiceError>;

    /// Record that `user` redeemed `coupon`.
    ///
    /// Expired coupons are rejected before anything is written. A user redeems
    /// a given coupon at most once, and the first redemption time is kept.
    async fn redeem_coupon(
        &self,
        coupon: CouponUuid,
        user: UserUuid,
    ) -> Result<CouponUserRecord, CouponsServiceError>;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jiff::{SignedDuration, Timestamp};
    use testresult::TestResult;
    use tokio::time::sleep;

    use crate::{
        domain::coupons::records::RedemptionState, identifiers::IdentifierKind,
        test::TestContext,
    };

    use super::*;

    fn new_coupon(valid_until: Timestamp, user_list: Vec<UserUuid>) -> NewCoupon {
        NewCoupon {
            uuid: CouponUuid::new(),
            code: None,
            value: 1_000,
            valid_until,
            user_list,
        }
    }

    #[tokio::test]
    async fn create_coupon_generates_code_when_absent() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = ctx
            .coupons
            .create_coupon(new_coupon(ctx.days_from_now(7)?, Vec::new()))
            .await?;

        assert!(
            IdentifierKind::CouponCode.matches(&coupon.code),
            "unexpected code {}",
            coupon.code
        );
        assert_eq!(coupon.redeemed_count, 0);
        assert!(coupon.last_redeemed_at.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn create_coupon_keeps_given_code() -> TestResult {
        let ctx = TestContext::new().await;

        let mut coupon = new_coupon(ctx.days_from_now(7)?, Vec::new());

        coupon.code = Some("SPRING10".to_string());

        let created = ctx.coupons.create_coupon(coupon).await?;

        assert_eq!(created.code, "SPRING10");
        assert_eq!(
            ctx.coupons.get_coupon_by_code("SPRING10").await?.uuid,
            created.uuid
        );

        Ok(())
    }

    #[tokio::test]
    async fn create_coupon_with_duplicate_code_returns_already_exists() -> TestResult {
        let ctx = TestContext::new().await;

        let mut first = new_coupon(ctx.days_from_now(7)?, Vec::new());
        first.code = Some("DUPE".to_string());

        let mut second = new_coupon(ctx.days_from_now(7)?, Vec::new());
        second.code = Some("DUPE".to_string());

        ctx.coupons.create_coupon(first).await?;

        let result = ctx.coupons.create_coupon(second).await;

        assert!(
            matches!(result, Err(CouponsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn generated_codes_skip_taken_candidates() -> TestResult {
        let ctx = TestContext::with_seed(11).await;

        let taken = IdentifierGenerator::seeded(11).candidate(IdentifierKind::CouponCode);

        let mut squatter = new_coupon(ctx.days_from_now(7)?, Vec::new());
        squatter.code = Some(taken.clone());

        ctx.coupons.create_coupon(squatter).await?;

        let generated = ctx
            .coupons
            .create_coupon(new_coupon(ctx.days_from_now(7)?, Vec::new()))
            .await?;

        assert_ne!(generated.code, taken);
        assert!(IdentifierKind::CouponCode.matches(&generated.code));

        Ok(())
    }

    #[tokio::test]
    async fn code_claimed_by_concurrent_transaction_is_redrawn() -> TestResult {
        let ctx = TestContext::with_seed(11).await;

        let taken = IdentifierGenerator::seeded(11).candidate(IdentifierKind::CouponCode);
        let valid_until = ctx.days_from_now(7)?;

        let mut rival = ctx.db.pool().begin().await?;

        PgCouponsRepository::new()
            .create_coupon(&mut rival, CouponUuid::new(), &taken, 500, valid_until, &[])
            .await?;

        // The uncommitted row passes the existence check, so the insert waits
        // on the unique index and fails once the rival commits.
        let (generated, committed) = tokio::join!(
            ctx.coupons.create_coupon(new_coupon(valid_until, Vec::new())),
            async move {
                sleep(Duration::from_millis(200)).await;

                rival.commit().await
            }
        );

        committed?;

        let generated = generated?;

        assert_ne!(generated.code, taken);
        assert!(IdentifierKind::CouponCode.matches(&generated.code));
        assert_eq!(ctx.coupons.get_coupon_by_code(&taken).await?.value, 500);

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_redemptions_of_one_pair_succeed_once() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();

        let coupon = ctx
            .coupons
            .create_coupon(new_coupon(ctx.days_from_now(7)?, Vec::new()))
            .await?;

        let (first, second) = tokio::join!(
            ctx.coupons.redeem_coupon(coupon.uuid, user),
            ctx.coupons.redeem_coupon(coupon.uuid, user)
        );
        let outcomes = [first, second];

        assert_eq!(
            outcomes.iter().filter(|outcome| outcome.is_ok()).count(),
            1,
            "expected one redemption, got {outcomes:?}"
        );
        assert!(
            outcomes
                .iter()
                .any(|outcome| matches!(outcome, Err(CouponsServiceError::AlreadyRedeemed))),
            "expected AlreadyRedeemed, got {outcomes:?}"
        );

        let rows = ctx.coupons.list_coupon_users(coupon.uuid).await?;

        assert_eq!(rows.len(), 1);
        assert_eq!(ctx.coupons.get_coupon(coupon.uuid).await?.redeemed_count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn redeeming_twice_keeps_first_timestamp() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();

        let coupon = ctx
            .coupons
            .create_coupon(new_coupon(ctx.days_from_now(7)?, Vec::new()))
            .await?;

        let first = ctx.coupons.redeem_coupon(coupon.uuid, user).await?;

        ctx.clock.advance(SignedDuration::from_mins(5))?;

        let second = ctx.coupons.redeem_coupon(coupon.uuid, user).await;

        assert!(
            matches!(second, Err(CouponsServiceError::AlreadyRedeemed)),
            "expected AlreadyRedeemed, got {second:?}"
        );

        let rows = ctx.coupons.list_coupon_users(coupon.uuid).await?;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows.first().and_then(|row| row.redeemed_at), first.redeemed_at);

        let reloaded = ctx.coupons.get_coupon(coupon.uuid).await?;

        assert_eq!(reloaded.redeemed_count, 1);
        assert_eq!(reloaded.last_redeemed_at, first.redeemed_at);

        Ok(())
    }

    #[tokio::test]
    async fn expired_coupon_is_rejected_without_writes() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();

        let coupon = ctx
            .coupons
            .create_coupon(new_coupon(ctx.days_from_now(1)?, Vec::new()))
            .await?;
        ctx.coupons.grant_coupon(coupon.uuid, user).await?;

        ctx.clock.advance(SignedDuration::from_hours(48))?;

        let result = ctx.coupons.redeem_coupon(coupon.uuid, user).await;

        assert!(
            matches!(result, Err(CouponsServiceError::ExpiredCoupon)),
            "expected ExpiredCoupon, got {result:?}"
        );

        let rows = ctx.coupons.list_coupon_users(coupon.uuid).await?;

        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows.first().map(CouponUserRecord::state),
            Some(RedemptionState::BoundUnredeemed)
        );

        Ok(())
    }

    #[tokio::test]
    async fn redeeming_claims_unbound_slot() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();

        let coupon = ctx
            .coupons
            .create_coupon(new_coupon(ctx.days_from_now(7)?, Vec::new()))
            .await?;
        let slot = ctx.coupons.provision_slot(coupon.uuid).await?;

        assert_eq!(slot.state(), RedemptionState::Unbound);

        let redeemed = ctx.coupons.redeem_coupon(coupon.uuid, user).await?;

        assert_eq!(redeemed.uuid, slot.uuid);
        assert_eq!(redeemed.user_uuid, Some(user));
        assert_eq!(redeemed.redeemed_at, Some(ctx.clock.now()));
        assert_eq!(ctx.coupons.list_coupon_users(coupon.uuid).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn grant_then_redeem_stamps_bound_row() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();

        let coupon = ctx
            .coupons
            .create_coupon(new_coupon(ctx.days_from_now(7)?, vec![user]))
            .await?;

        let granted = ctx.coupons.grant_coupon(coupon.uuid, user).await?;
        let granted_again = ctx.coupons.grant_coupon(coupon.uuid, user).await?;

        assert_eq!(granted.state(), RedemptionState::BoundUnredeemed);
        assert_eq!(granted_again.uuid, granted.uuid);

        let redeemed = ctx.coupons.redeem_coupon(coupon.uuid, user).await?;

        assert_eq!(redeemed.uuid, granted.uuid);
        assert_eq!(redeemed.state(), RedemptionState::Redeemed);

        let reloaded = ctx.coupons.get_coupon(coupon.uuid).await?;

        assert_eq!(reloaded.user_limit(), 1);
        assert!(reloaded.is_redeemed());

        Ok(())
    }

    #[tokio::test]
    async fn unlimited_coupon_is_never_marked_redeemed() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = ctx
            .coupons
            .create_coupon(new_coupon(ctx.days_from_now(7)?, Vec::new()))
            .await?;

        for _ in 0..3 {
            ctx.coupons.redeem_coupon(coupon.uuid, UserUuid::new()).await?;
        }

        let reloaded = ctx.coupons.get_coupon(coupon.uuid).await?;

        assert_eq!(reloaded.redeemed_count, 3);
        assert!(!reloaded.is_redeemed());

        Ok(())
    }

    #[tokio::test]
    async fn redeeming_unknown_coupon_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx
            .coupons
            .redeem_coupon(CouponUuid::new(), UserUuid::new())
            .await;

        assert!(
            matches!(result, Err(CouponsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }
}
