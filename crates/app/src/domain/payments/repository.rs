//! Payments Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    database::{amount_to_i64, try_get_amount},
    domain::{
        payments::{
            data::NewPayment,
            records::{PaymentRecord, PaymentUuid},
        },
        users::UserUuid,
    },
};

/// Unique constraint guarding payment references.
pub(crate) const PAYMENT_REF_CONSTRAINT: &str = "payments_ref_key";

const CREATE_PAYMENT_SQL: &str = include_str!("sql/create_payment.sql");
const GET_PAYMENT_SQL: &str = include_str!("sql/get_payment.sql");
const GET_PAYMENT_BY_REF_SQL: &str = include_str!("sql/get_payment_by_ref.sql");
const LOCK_PAYMENT_BY_REF_SQL: &str = include_str!("sql/lock_payment_by_ref.sql");
const PAYMENT_REF_EXISTS_SQL: &str = include_str!("sql/payment_ref_exists.sql");
const VERIFY_PAYMENT_SQL: &str = include_str!("sql/verify_payment.sql");
const MARK_PAYMENT_USED_SQL: &str = include_str!("sql/mark_payment_used.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPaymentsRepository;

impl PgPaymentsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: &NewPayment,
        reference: &str,
        transaction_date: Timestamp,
    ) -> Result<PaymentRecord, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(CREATE_PAYMENT_SQL)
            .bind(payment.uuid.into_uuid())
            .bind(reference)
            .bind(payment.user_uuid.into_uuid())
            .bind(amount_to_i64("amount", payment.amount)?)
            .bind(&payment.currency)
            .bind(SqlxTimestamp::from(transaction_date))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: PaymentUuid,
    ) -> Result<PaymentRecord, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(GET_PAYMENT_SQL)
            .bind(payment.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_payment_by_ref(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference: &str,
    ) -> Result<PaymentRecord, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(GET_PAYMENT_BY_REF_SQL)
            .bind(reference)
            .fetch_one(&mut **tx)
            .await
    }

    /// Lock a payment until the transaction ends.
    pub(crate) async fn lock_payment_by_ref(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference: &str,
    ) -> Result<Option<PaymentRecord>, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(LOCK_PAYMENT_BY_REF_SQL)
            .bind(reference)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn ref_exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference: &str,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(PAYMENT_REF_EXISTS_SQL)
            .bind(reference)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn verify_payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        reference: &str,
    ) -> Result<PaymentRecord, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(VERIFY_PAYMENT_SQL)
            .bind(reference)
            .fetch_one(&mut **tx)
            .await
    }

    /// Flag a verified payment as spent. Returns the number of rows changed.
    pub(crate) async fn mark_used(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment: PaymentUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(MARK_PAYMENT_USED_SQL)
            .bind(payment.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for PaymentRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: PaymentUuid::from_uuid(row.try_get("uuid")?),
            reference: row.try_get("ref")?,
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            amount: try_get_amount(row, "amount")?,
            currency: row.try_get("currency")?,
            verified: row.try_get("verified")?,
            used: row.try_get("used")?,
            transaction_date: row
                .try_get::<SqlxTimestamp, _>("transaction_date")?
                .to_jiff(),
        })
    }
}
