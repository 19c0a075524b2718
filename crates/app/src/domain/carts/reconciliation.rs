//! Cart Reconciliation
//!
//! Works out how an anonymous cart folds into a user's cart when the shopper
//! signs in. Planning is pure; [`PgCartsService`](super::PgCartsService) applies
//! the plan and clears the anonymous cart inside one transaction.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::domain::{
    carts::{
        errors::CartsServiceError,
        records::{CartItemRecord, CartItemUuid},
    },
    products::records::ProductUuid,
};

/// One write needed to merge an anonymous cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStep {
    /// The user already holds the product; raise their quantity.
    SetQuantity { item: CartItemUuid, quantity: u32 },

    /// The user does not hold the product; carry the anonymous line over.
    Create {
        uuid: CartItemUuid,
        product_uuid: ProductUuid,
        quantity: u32,
        price: u64,
    },
}

/// The writes that merge one cart into another, plus the items they consume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    pub steps: Vec<MergeStep>,
    pub consumed: Vec<CartItemUuid>,
}

impl MergePlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }
}

/// Summary of a completed merge.
#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome {
    /// Anonymous lines whose product the user already held.
    pub merged: usize,

    /// Anonymous lines carried over as new user lines.
    pub moved: usize,

    /// The user's cart after the merge.
    pub items: Vec<CartItemRecord>,
}

/// Plan the merge of `anonymous` into `user_items`.
///
/// Lines for the same product are combined by quantity. Anonymous lines for a
/// product the user does not hold keep their product, quantity and price.
///
/// # Errors
///
/// Returns [`CartsServiceError::QuantityOverflow`] when a combined quantity does
/// not fit.
pub fn plan_merge(
    anonymous: &[CartItemRecord],
    user_items: &[CartItemRecord],
) -> Result<MergePlan, CartsServiceError> {
    let mut existing: FxHashMap<ProductUuid, (CartItemUuid, u32)> = user_items
        .iter()
        .map(|item| (item.product_uuid, (item.uuid, item.quantity)))
        .collect();

    let mut created: FxHashMap<ProductUuid, usize> = FxHashMap::default();
    let mut plan = MergePlan::default();

    for item in anonymous {
        plan.consumed.push(item.uuid);

        if let Some((target, quantity)) = existing.get_mut(&item.product_uuid) {
            *quantity = quantity
                .checked_add(item.quantity)
                .ok_or(CartsServiceError::QuantityOverflow(item.product_uuid))?;

            upsert_set_quantity(&mut plan.steps, *target, *quantity);

            continue;
        }

        if let Some(step) = created
            .get(&item.product_uuid)
            .and_then(|index| plan.steps.get_mut(*index))
        {
            if let MergeStep::Create { quantity, .. } = step {
                *quantity = quantity
                    .checked_add(item.quantity)
                    .ok_or(CartsServiceError::QuantityOverflow(item.product_uuid))?;
            }

            continue;
        }

        created.insert(item.product_uuid, plan.steps.len());

        plan.steps.push(MergeStep::Create {
            uuid: CartItemUuid::new(),
            product_uuid: item.product_uuid,
            quantity: item.quantity,
            price: item.price,
        });
    }

    Ok(plan)
}

fn upsert_set_quantity(steps: &mut Vec<MergeStep>, item: CartItemUuid, quantity: u32) {
    let existing = steps.iter_mut().find_map(|step| match step {
        MergeStep::SetQuantity {
            item: target,
            quantity: current,
        } if *target == item => Some(current),
        _ => None,
    });

    match existing {
        Some(current) => *current = quantity,
        None => steps.push(MergeStep::SetQuantity { item, quantity }),
    }
}
