//! Payments Service

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use sqlx::Acquire;
use tracing::{info, warn};

use crate::{
    clock::Clock,
    database::{Db, is_unique_violation},
    domain::payments::{
        PaymentsServiceError,
        data::NewPayment,
        records::{PaymentRecord, PaymentUuid},
        repository::{PAYMENT_REF_CONSTRAINT, PgPaymentsRepository},
    },
    identifiers::{IdentifierGenerator, IdentifierKind},
};

#[derive(Debug, Clone)]
pub struct PgPaymentsService {
    db: Db,
    clock: Arc<dyn Clock>,
    identifiers: Arc<IdentifierGenerator>,
    repository: PgPaymentsRepository,
}

impl PgPaymentsService {
    #[must_use]
    pub fn new(db: Db, clock: Arc<dyn Clock>, identifiers: Arc<IdentifierGenerator>) -> Self {
        Self {
            db,
            clock,
            identifiers,
            repository: PgPaymentsRepository::new(),
        }
    }
}

#[async_trait]
impl PaymentsService for PgPaymentsService {
    #[tracing::instrument(
        name = "payments.service.create_payment",
        skip(self, payment),
        fields(
            payment_uuid = %payment.uuid,
            user_uuid = %payment.user_uuid,
            amount = payment.amount
        ),
        err
    )]
    async fn create_payment(
        &self,
        payment: NewPayment,
    ) -> Result<PaymentRecord, PaymentsServiceError> {
        if !payment.has_valid_currency() {
            return Err(PaymentsServiceError::InvalidData);
        }

        let mut tx = self.db.begin_transaction().await?;

        let transaction_date = self.clock.now();
        let mut created = None;

        for candidate in self.identifiers.candidates(IdentifierKind::PaymentRef) {
            if self.repository.ref_exists(&mut tx, &candidate).await? {
                warn!("payment reference taken, drawing another");

                continue;
            }

            let mut savepoint = tx.begin().await?;

            match self
                .repository
                .create_payment(&mut savepoint, &payment, &candidate, transaction_date)
                .await
            {
                Ok(record) => {
                    savepoint.commit().await?;
                    created = Some(record);

                    break;
                }
                Err(error) if is_unique_violation(&error, PAYMENT_REF_CONSTRAINT) => {
                    savepoint.rollback().await?;

                    warn!("payment reference claimed concurrently, drawing another");
                }
                Err(error) => return Err(error.into()),
            }
        }

        let created =
            created.ok_or_else(|| self.identifiers.exhausted(IdentifierKind::PaymentRef))?;

        tx.commit().await?;

        info!(payment_uuid = %created.uuid, "created payment");

        Ok(created)
    }

    async fn get_payment(&self, payment: PaymentUuid) -> Result<PaymentRecord, PaymentsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let payment = self.repository.get_payment(&mut tx, payment).await?;

        tx.commit().await?;

        Ok(payment)
    }

    async fn get_payment_by_ref(
        &self,
        reference: &str,
    ) -> Result<PaymentRecord, PaymentsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let payment = self.repository.get_payment_by_ref(&mut tx, reference).await?;

        tx.commit().await?;

        Ok(payment)
    }

    #[tracing::instrument(name = "payments.service.verify_payment", skip_all, err)]
    async fn verify_payment(&self, reference: &str) -> Result<PaymentRecord, PaymentsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let payment = self.repository.verify_payment(&mut tx, reference).await?;

        tx.commit().await?;

        info!(payment_uuid = %payment.uuid, "verified payment");

        Ok(payment)
    }
}

#[automock]
#[async_trait]
pub trait PaymentsService: Send + Sync {
    /// Record an incoming payment under a freshly generated reference.
    async fn create_payment(
        &self,
        payment: NewPayment,
    ) -> Result<PaymentRecord, PaymentsServiceError>;

    async fn get_payment(&self, payment: PaymentUuid) -> Result<PaymentRecord, PaymentsServiceError>;

    async fn get_payment_by_ref(&self, reference: &str)
    -> Result<PaymentRecord, PaymentsServiceError>;

    /// Mark a payment as confirmed by the provider.
    async fn verify_payment(&self, reference: &str) -> Result<PaymentRecord, PaymentsServiceError>;
}
