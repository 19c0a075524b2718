//! Coupon Users Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::domain::{
    coupons::records::{CouponUserRecord, CouponUserUuid, CouponUuid},
    users::UserUuid,
};

const LIST_COUPON_USERS_SQL: &str = include_str!("../sql/list_coupon_users.sql");
const GET_COUPON_USER_SQL: &str = include_str!("../sql/get_coupon_user.sql");
const INSERT_COUPON_USER_SQL: &str = include_str!("../sql/insert_coupon_user.sql");
const CLAIM_COUPON_USER_SQL: &str = include_str!("../sql/claim_coupon_user.sql");
const STAMP_COUPON_USER_SQL: &str = include_str!("../sql/stamp_coupon_user.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCouponUsersRepository;

impl PgCouponUsersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_coupon_users(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<Vec<CouponUserRecord>, sqlx::Error> {
        query_as::<Postgres, CouponUserRecord>(LIST_COUPON_USERS_SQL)
            .bind(coupon.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_coupon_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        row: CouponUserUuid,
    ) -> Result<CouponUserRecord, sqlx::Error> {
        query_as::<Postgres, CouponUserRecord>(GET_COUPON_USER_SQL)
            .bind(row.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn insert_coupon_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
        user: Option<UserUuid>,
        redeemed_at: Option<Timestamp>,
    ) -> Result<CouponUserRecord, sqlx::Error> {
        query_as::<Postgres, CouponUserRecord>(INSERT_COUPON_USER_SQL)
            .bind(CouponUserUuid::new().into_uuid())
            .bind(coupon.into_uuid())
            .bind(user.map(UserUuid::into_uuid))
            .bind(redeemed_at.map(SqlxTimestamp::from))
            .fetch_one(&mut **tx)
            .await
    }

    /// Bind `user` to an unbound slot. `None` when the slot was taken meanwhile.
    pub(crate) async fn claim_coupon_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        row: CouponUserUuid,
        user: UserUuid,
        redeemed_at: Option<Timestamp>,
    ) -> Result<Option<CouponUserRecord>, sqlx::Error> {
        query_as::<Postgres, CouponUserRecord>(CLAIM_COUPON_USER_SQL)
            .bind(row.into_uuid())
            .bind(user.into_uuid())
            .bind(redeemed_at.map(SqlxTimestamp::from))
            .fetch_optional(&mut **tx)
            .await
    }

    /// Set the redemption time unless one is already recorded.
    pub(crate) async fn stamp_coupon_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        row: CouponUserUuid,
        redeemed_at: Timestamp,
    ) -> Result<Option<CouponUserRecord>, sqlx::Error> {
        query_as::<Postgres, CouponUserRecord>(STAMP_COUPON_USER_SQL)
            .bind(row.into_uuid())
            .bind(SqlxTimestamp::from(redeemed_at))
            .fetch_optional(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CouponUserRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CouponUserUuid::from_uuid(row.try_get("uuid")?),
            coupon_uuid: CouponUuid::from_uuid(row.try_get("coupon_uuid")?),
            user_uuid: row
                .try_get::<Option<Uuid>, _>("user_uuid")?
                .map(UserUuid::from_uuid),
            redeemed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("redeemed_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
