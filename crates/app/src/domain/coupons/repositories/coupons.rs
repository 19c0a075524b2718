//! Coupons Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    database::{amount_to_i64, try_get_amount},
    domain::{
        coupons::records::{CouponRecord, CouponUuid},
        users::UserUuid,
    },
};

/// Unique constraint guarding coupon codes.
pub(crate) const COUPON_CODE_CONSTRAINT: &str = "coupons_code_key";

const CREATE_COUPON_SQL: &str = include_str!("../sql/create_coupon.sql");
const GET_COUPON_SQL: &str = include_str!("../sql/get_coupon.sql");
const GET_COUPON_BY_CODE_SQL: &str = include_str!("../sql/get_coupon_by_code.sql");
const LOCK_COUPONS_SQL: &str = include_str!("../sql/lock_coupons.sql");
const COUPON_CODE_EXISTS_SQL: &str = include_str!("../sql/coupon_code_exists.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCouponsRepository;

impl PgCouponsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: CouponUuid,
        code: &str,
        value: u64,
        valid_until: Timestamp,
        user_list: &[UserUuid],
    ) -> Result<CouponRecord, sqlx::Error> {
        let user_list: Vec<Uuid> = user_list.iter().map(|user| user.into_uuid()).collect();

        query_as::<Postgres, CouponRecord>(CREATE_COUPON_SQL)
            .bind(uuid.into_uuid())
            .bind(code)
            .bind(amount_to_i64("value", value)?)
            .bind(SqlxTimestamp::from(valid_until))
            .bind(user_list)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<CouponRecord, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(GET_COUPON_SQL)
            .bind(coupon.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_coupon_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<CouponRecord, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(GET_COUPON_BY_CODE_SQL)
            .bind(code)
            .fetch_one(&mut **tx)
            .await
    }

    /// Lock the given coupons until the transaction ends. Unknown coupons are skipped.
    pub(crate) async fn lock_coupons(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupons: &[CouponUuid],
    ) -> Result<Vec<CouponRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = coupons.iter().map(|coupon| coupon.into_uuid()).collect();

        query_as::<Postgres, CouponRecord>(LOCK_COUPONS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn lock_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<CouponRecord, sqlx::Error> {
        self.lock_coupons(tx, &[coupon])
            .await?
            .into_iter()
            .next()
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub(crate) async fn code_exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(COUPON_CODE_EXISTS_SQL)
            .bind(code)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CouponRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let user_list: Vec<Uuid> = row.try_get("user_list")?;

        Ok(Self {
            uuid: CouponUuid::from_uuid(row.try_get("uuid")?),
            code: row.try_get("code")?,
            value: try_get_amount(row, "value")?,
            valid_until: row.try_get::<SqlxTimestamp, _>("valid_until")?.to_jiff(),
            user_list: user_list.into_iter().map(UserUuid::from_uuid).collect(),
            redeemed_count: try_get_amount(row, "redeemed_count")?,
            last_redeemed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("last_redeemed_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
