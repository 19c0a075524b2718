//! Payment Data

use crate::domain::{payments::records::PaymentUuid, users::UserUuid};

/// Currency recorded when none is given.
pub const DEFAULT_CURRENCY: &str = "USD";

/// New Payment
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub uuid: PaymentUuid,
    pub user_uuid: UserUuid,

    /// Amount received, in minor units of `currency`.
    pub amount: u64,

    /// ISO 4217 alphabetic code.
    pub currency: String,
}

impl NewPayment {
    #[must_use]
    pub fn new(user_uuid: UserUuid, amount: u64) -> Self {
        Self {
            uuid: PaymentUuid::new(),
            user_uuid,
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    pub(crate) fn has_valid_currency(&self) -> bool {
        self.currency.len() == 3 && self.currency.bytes().all(|b| b.is_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_must_be_three_upper_case_letters() {
        let mut payment = NewPayment::new(UserUuid::new(), 100);

        assert!(payment.has_valid_currency());

        for bad in ["usd", "US", "EURO", "U5D"] {
            payment.currency = bad.to_string();

            assert!(!payment.has_valid_currency(), "{bad} should be rejected");
        }
    }
}
