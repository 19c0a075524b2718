//! Order Pricing
//!
//! Totals are computed once, when an order is placed, from the cart item
//! snapshots and coupons locked for that order. They are stored on the order
//! and never recomputed.

use serde::Serialize;

use crate::domain::{carts::records::CartItemRecord, coupons::records::CouponRecord};

/// Totals for one order, in minor currency units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderPricing {
    /// Sum of every line's price snapshot. Quantity does not scale it.
    pub gross: u64,

    /// Sum of every coupon's value.
    pub discount: u64,

    /// `gross` less `discount`, never below zero.
    pub net: u64,
}

impl OrderPricing {
    /// Price an order from its cart items and coupons.
    ///
    /// Returns `None` when a total does not fit in `u64`.
    #[must_use]
    pub fn compute(items: &[CartItemRecord], coupons: &[CouponRecord]) -> Option<Self> {
        Self::from_amounts(
            items.iter().map(|item| Some(item.price)),
            coupons.iter().map(|coupon| Some(coupon.value)),
        )
    }

    /// Price an order from raw item prices and coupon values.
    ///
    /// Returns `None` when any amount is missing or a total does not fit.
    pub fn from_amounts(
        line_prices: impl IntoIterator<Item = Option<u64>>,
        coupon_values: impl IntoIterator<Item = Option<u64>>,
    ) -> Option<Self> {
        let gross = checked_sum(line_prices)?;
        let discount = checked_sum(coupon_values)?;

        Some(Self {
            gross,
            discount,
            net: gross.saturating_sub(discount),
        })
    }
}

fn checked_sum(amounts: impl IntoIterator<Item = Option<u64>>) -> Option<u64> {
    amounts
        .into_iter()
        .try_fold(0_u64, |total, amount| total.checked_add(amount?))
}
