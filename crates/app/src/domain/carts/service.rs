//! Carts service.

use std::net::IpAddr;

use async_trait::async_trait;
use mockall::automock;
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        carts::{
            data::NewCartItem,
            errors::CartsServiceError,
            reconciliation::{MergeOutcome, MergeStep, plan_merge},
            records::{CartItemRecord, CartItemUuid, CartOwner},
            repository::PgCartItemsRepository,
        },
        users::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    items: PgCartItemsRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            items: PgCartItemsRepository::new(),
        }
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn list_items(&self, owner: CartOwner) -> Result<Vec<CartItemRecord>, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let items = self.items.list_items(&mut tx, owner).await?;

        tx.commit().await?;

        Ok(items)
    }

    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self, item),
        fields(
            owner = %owner,
            product_uuid = %item.product_uuid,
            quantity = item.quantity
        ),
        err
    )]
    async fn add_item(
        &self,
        owner: CartOwner,
        item: NewCartItem,
    ) -> Result<CartItemRecord, CartsServiceError> {
        if item.quantity == 0 {
            return Err(CartsServiceError::InvalidData);
        }

        let mut tx = self.db.begin_transaction().await?;

        let item = self
            .items
            .upsert_item(&mut tx, owner, item.uuid, item.product_uuid, item.quantity)
            .await?;

        tx.commit().await?;

        Ok(item)
    }

    #[tracing::instrument(
        name = "carts.service.remove_item",
        skip(self),
        fields(owner = %owner, item_uuid = %item),
        err
    )]
    async fn remove_item(
        &self,
        owner: CartOwner,
        item: CartItemUuid,
    ) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let rows_affected = self.items.delete_item(&mut tx, owner, item).await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(
        name = "carts.service.merge_carts",
        skip(self),
        fields(
            ip = %ip,
            user_uuid = %user,
            merged = tracing::field::Empty,
            moved = tracing::field::Empty
        ),
        err
    )]
    async fn merge_carts(
        &self,
        ip: IpAddr,
        user: UserUuid,
    ) -> Result<MergeOutcome, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let anonymous = self.items.lock_items(&mut tx, CartOwner::Ip(ip)).await?;

        if anonymous.is_empty() {
            let items = self.items.list_items(&mut tx, CartOwner::User(user)).await?;

            tx.commit().await?;

            return Ok(MergeOutcome {
                merged: 0,
                moved: 0,
                items,
            });
        }

        let held = self.items.lock_items(&mut tx, CartOwner::User(user)).await?;

        let plan = plan_merge(&anonymous, &held)?;

        let held_products: Vec<_> = held.iter().map(|item| item.product_uuid).collect();

        let merged = anonymous
            .iter()
            .filter(|item| held_products.contains(&item.product_uuid))
            .count();

        let moved = anonymous.len() - merged;

        for step in &plan.steps {
            match *step {
                MergeStep::SetQuantity { item, quantity } => {
                    self.items.set_quantity(&mut tx, item, quantity).await?;
                }
                MergeStep::Create {
                    uuid,
                    product_uuid,
                    quantity,
                    price,
                } => {
                    self.items
                        .insert_user_item(&mut tx, user, uuid, product_uuid, quantity, price)
                        .await?;
                }
            }
        }

        self.items.delete_items(&mut tx, &plan.consumed).await?;

        let items = self.items.list_items(&mut tx, CartOwner::User(user)).await?;

        tx.commit().await?;

        let span = Span::current();

        span.record("merged", merged);
        span.record("moved", moved);

        info!(%user, merged, moved, "merged anonymous cart");

        Ok(MergeOutcome {
            merged,
            moved,
            items,
        })
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Items currently held by the given owner.
    async fn list_items(&self, owner: CartOwner) -> Result<Vec<CartItemRecord>, CartsServiceError>;

    /// Add a product to the owner's cart at the product's current price.
    ///
    /// Adding a product the owner already holds raises that line's quantity
    /// and keeps its original price.
    async fn add_item(
        &self,
        owner: CartOwner,
        item: NewCartItem,
    ) -> Result<CartItemRecord, CartsServiceError>;

    /// Remove a line from the owner's cart.
    async fn remove_item(&self, owner: CartOwner, item: CartItemUuid)
    -> Result<(), CartsServiceError>;

    /// Fold the anonymous cart for `ip` into the user's cart and empty it.
    ///
    /// Either every line moves and the anonymous cart is cleared, or nothing
    /// changes.
    async fn merge_carts(
        &self,
        ip: IpAddr,
        user: UserUuid,
    ) -> Result<MergeOutcome, CartsServiceError>;
}
