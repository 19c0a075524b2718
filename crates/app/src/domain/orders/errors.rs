//! Orders service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::{
    domain::{carts::records::CartItemUuid, coupons::records::CouponUuid},
    identifiers::UniquenessExhausted,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order already exists")]
    AlreadyExists,

    #[error("order not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("order has no cart items")]
    EmptyOrder,

    #[error("cart item {0} not found")]
    CartItemNotFound(CartItemUuid),

    #[error("coupon {0} not found")]
    CouponNotFound(CouponUuid),

    #[error("order total overflows")]
    PriceOverflow,

    #[error(transparent)]
    UniquenessExhausted(#[from] UniquenessExhausted),

    #[error("payment not found")]
    PaymentNotFound,

    #[error("payment belongs to another user")]
    PaymentOwnerMismatch,

    #[error("payment has not been verified")]
    PaymentNotVerified,

    #[error("payment already settled an order")]
    PaymentAlreadyUsed,

    #[error("payment does not cover the order")]
    InsufficientPayment,

    #[error("order already paid")]
    AlreadyPaid,

    #[error("order is closed")]
    OrderClosed,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}
