//! Payment Records

use jiff::Timestamp;
use serde::Serialize;

use crate::{domain::users::UserUuid, uuids::TypedUuid};

/// Payment UUID
pub type PaymentUuid = TypedUuid<PaymentRecord>;

/// Payment Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRecord {
    pub uuid: PaymentUuid,

    /// Opaque reference handed to the payment provider.
    pub reference: String,
    pub user_uuid: UserUuid,
    pub amount: u64,
    pub currency: String,

    /// Set once the provider confirms the payment.
    pub verified: bool,

    /// Set once the payment has settled an order.
    pub used: bool,
    pub transaction_date: Timestamp,
}
