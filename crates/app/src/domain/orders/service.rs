//! Orders Service

use std::{hash::Hash, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashSet;
use sqlx::Acquire;
use tracing::{Span, info, warn};

use crate::{
    database::{Db, is_unique_violation},
    domain::{
        carts::repository::PgCartItemsRepository,
        coupons::repositories::coupons::PgCouponsRepository,
        orders::{
            OrdersServiceError,
            data::NewOrder,
            pricing::OrderPricing,
            records::{OrderItemRecord, OrderRecord, OrderUuid},
            repository::{ORDER_ID_CONSTRAINT, PgOrdersRepository},
        },
        payments::repository::PgPaymentsRepository,
        users::UserUuid,
    },
    identifiers::{IdentifierGenerator, IdentifierKind},
};

/// Longest delivery status the orders table accepts.
const MAX_DELIVERY_STATUS_LENGTH: usize = 30;

/// Longest payment or delivery method the orders table accepts.
const MAX_METHOD_LENGTH: usize = 30;

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    identifiers: Arc<IdentifierGenerator>,
    orders: PgOrdersRepository,
    cart_items: PgCartItemsRepository,
    coupons: PgCouponsRepository,
    payments: PgPaymentsRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db, identifiers: Arc<IdentifierGenerator>) -> Self {
        Self {
            db,
            identifiers,
            orders: PgOrdersRepository::new(),
            cart_items: PgCartItemsRepository::new(),
            coupons: PgCouponsRepository::new(),
            payments: PgPaymentsRepository::new(),
        }
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.place_order",
        skip(self, order),
        fields(
            order_uuid = %order.uuid,
            user_uuid = %order.user_uuid,
            order_id = tracing::field::Empty,
            gross_price = tracing::field::Empty,
            net_price = tracing::field::Empty
        ),
        err
    )]
    async fn place_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError> {
        let mut order = order;

        order.cart_items = distinct(&order.cart_items);
        order.coupons = distinct(&order.coupons);

        if order.cart_items.is_empty() {
            return Err(OrdersServiceError::EmptyOrder);
        }

        if order.payment_method.trim().is_empty() || order.delivery_method.trim().is_empty() {
            return Err(OrdersServiceError::MissingRequiredData);
        }

        if [&order.payment_method, &order.delivery_method]
            .iter()
            .any(|method| method.chars().count() > MAX_METHOD_LENGTH)
        {
            return Err(OrdersServiceError::InvalidData);
        }

        let mut tx = self.db.begin_transaction().await?;

        let items = self
            .cart_items
            .lock_user_items_by_uuid(&mut tx, order.user_uuid, &order.cart_items)
            .await?;

        let found: FxHashSet<_> = items.iter().map(|item| item.uuid).collect();

        if let Some(missing) = order.cart_items.iter().find(|uuid| !found.contains(uuid)) {
            return Err(OrdersServiceError::CartItemNotFound(*missing));
        }

        let coupons = self.coupons.lock_coupons(&mut tx, &order.coupons).await?;

        let found: FxHashSet<_> = coupons.iter().map(|coupon| coupon.uuid).collect();

        if let Some(missing) = order.coupons.iter().find(|uuid| !found.contains(uuid)) {
            return Err(OrdersServiceError::CouponNotFound(*missing));
        }

        let pricing =
            OrderPricing::compute(&items, &coupons).ok_or(OrdersServiceError::PriceOverflow)?;

        let mut placed = None;

        for candidate in self.identifiers.candidates(IdentifierKind::OrderId) {
            if self.orders.order_id_exists(&mut tx, &candidate).await? {
                warn!(order_id = %candidate, "order id taken, drawing another");

                continue;
            }

            let mut savepoint = tx.begin().await?;

            match self
                .orders
                .create_order(&mut savepoint, &order, &candidate, pricing)
                .await
            {
                Ok(record) => {
                    savepoint.commit().await?;
                    placed = Some(record);

                    break;
                }
                Err(error) if is_unique_violation(&error, ORDER_ID_CONSTRAINT) => {
                    savepoint.rollback().await?;

                    warn!(order_id = %candidate, "order id claimed concurrently, drawing another");
                }
                Err(error) => return Err(error.into()),
            }
        }

        let placed = placed.ok_or_else(|| self.identifiers.exhausted(IdentifierKind::OrderId))?;

        for item in &items {
            self.orders
                .create_order_item(&mut tx, placed.uuid, item)
                .await?;
        }

        self.cart_items
            .delete_items(&mut tx, &order.cart_items)
            .await?;

        tx.commit().await?;

        let span = Span::current();

        span.record("order_id", tracing::field::display(&placed.order_id));
        span.record("gross_price", placed.gross_price);
        span.record("net_price", placed.net_price);

        info!(order_id = %placed.order_id, "placed order");

        Ok(placed)
    }

    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let order = self.orders.get_order(&mut tx, order).await?;

        tx.commit().await?;

        Ok(order)
    }

    async fn get_order_by_order_id(
        &self,
        order_id: &str,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let order = self.orders.get_order_by_order_id(&mut tx, order_id).await?;

        tx.commit().await?;

        Ok(order)
    }

    async fn list_orders(&self, user: UserUuid) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let orders = self.orders.list_user_orders(&mut tx, user).await?;

        tx.commit().await?;

        Ok(orders)
    }

    async fn list_order_items(
        &self,
        order: OrderUuid,
    ) -> Result<Vec<OrderItemRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        self.orders.get_order(&mut tx, order).await?;

        let items = self.orders.list_order_items(&mut tx, order).await?;

        tx.commit().await?;

        Ok(items)
    }

    #[tracing::instrument(
        name = "orders.service.mark_paid",
        skip(self, payment_ref),
        fields(order_uuid = %order, payment_uuid = tracing::field::Empty),
        err
    )]
    async fn mark_paid(
        &self,
        order: OrderUuid,
        payment_ref: &str,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let locked = self.orders.lock_order(&mut tx, order).await?;

        if locked.closed {
            return Err(OrdersServiceError::OrderClosed);
        }

        if locked.paid {
            return Err(OrdersServiceError::AlreadyPaid);
        }

        let payment = self
            .payments
            .lock_payment_by_ref(&mut tx, payment_ref)
            .await?
            .ok_or(OrdersServiceError::PaymentNotFound)?;

        Span::current().record("payment_uuid", tracing::field::display(payment.uuid));

        if payment.user_uuid != locked.user_uuid {
            return Err(OrdersServiceError::PaymentOwnerMismatch);
        }

        if !payment.verified {
            return Err(OrdersServiceError::PaymentNotVerified);
        }

        if payment.used {
            return Err(OrdersServiceError::PaymentAlreadyUsed);
        }

        if payment.amount < locked.net_price {
            return Err(OrdersServiceError::InsufficientPayment);
        }

        if self.payments.mark_used(&mut tx, payment.uuid).await? == 0 {
            return Err(OrdersServiceError::PaymentAlreadyUsed);
        }

        let paid = self.orders.mark_paid(&mut tx, order, payment.uuid).await?;

        tx.commit().await?;

        info!(order_id = %paid.order_id, "order paid");

        Ok(paid)
    }

    #[tracing::instrument(
        name = "orders.service.update_delivery_status",
        skip(self),
        fields(order_uuid = %order),
        err
    )]
    async fn update_delivery_status(
        &self,
        order: OrderUuid,
        status: &str,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let status = status.trim();

        if status.is_empty() {
            return Err(OrdersServiceError::MissingRequiredData);
        }

        if status.chars().count() > MAX_DELIVERY_STATUS_LENGTH {
            return Err(OrdersServiceError::InvalidData);
        }

        let mut tx = self.db.begin_transaction().await?;

        let locked = self.orders.lock_order(&mut tx, order).await?;

        if locked.closed {
            return Err(OrdersServiceError::OrderClosed);
        }

        let updated = self
            .orders
            .set_delivery_status(&mut tx, order, status)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "orders.service.close_order",
        skip(self),
        fields(order_uuid = %order),
        err
    )]
    async fn close_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let locked = self.orders.lock_order(&mut tx, order).await?;

        let closed = if locked.closed {
            locked
        } else {
            self.orders.close_order(&mut tx, order).await?
        };

        tx.commit().await?;

        Ok(closed)
    }
}

/// `values` with repeats removed, first occurrence kept.
fn distinct<T: Copy + Eq + Hash>(values: &[T]) -> Vec<T> {
    let mut seen = FxHashSet::default();

    values
        .iter()
        .copied()
        .filter(|value| seen.insert(*value))
        .collect()
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Check out cart items into a new order.
    ///
    /// The items must belong to the ordering user. Prices are taken from the
    /// items' snapshots, less the coupons' values, and fixed on the order. The
    /// consumed items leave the cart.
    async fn place_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError>;

    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError>;

    async fn get_order_by_order_id(&self, order_id: &str)
    -> Result<OrderRecord, OrdersServiceError>;

    /// A user's orders, newest first.
    async fn list_orders(&self, user: UserUuid) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// The cart lines an order was placed with.
    async fn list_order_items(
        &self,
        order: OrderUuid,
    ) -> Result<Vec<OrderItemRecord>, OrdersServiceError>;

    /// Settle an order with a verified payment that has not settled another.
    async fn mark_paid(
        &self,
        order: OrderUuid,
        payment_ref: &str,
    ) -> Result<OrderRecord, OrdersServiceError>;

    async fn update_delivery_status(
        &self,
        order: OrderUuid,
        status: &str,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Close an order. Closing a closed order returns it unchanged.
    async fn close_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use sqlx::query;
    use testresult::TestResult;

    use crate::{
        domain::{
            carts::{
                CartsService,
                data::NewCartItem,
                records::{CartItemRecord, CartItemUuid, CartOwner},
            },
            coupons::{
                CouponsService,
                data::NewCoupon,
                records::{CouponRecord, CouponUuid},
            },
            payments::{PaymentsService, data::NewPayment},
            products::{ProductsService, data::ProductUpdate, records::ProductUuid},
        },
        test::TestContext,
    };

    use super::*;

    async fn add_to_cart(
        ctx: &TestContext,
        user: UserUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> TestResult<CartItemRecord> {
        let item = ctx
            .carts
            .add_item(
                CartOwner::User(user),
                NewCartItem {
                    uuid: CartItemUuid::new(),
                    product_uuid: product,
                    quantity,
                },
            )
            .await?;

        Ok(item)
    }

    async fn create_coupon(ctx: &TestContext, value: u64) -> TestResult<CouponRecord> {
        let coupon = ctx
            .coupons
            .create_coupon(NewCoupon {
                uuid: CouponUuid::new(),
                code: None,
                value,
                valid_until: ctx.days_from_now(30)?,
                user_list: Vec::new(),
            })
            .await?;

        Ok(coupon)
    }

    fn new_order(
        user: UserUuid,
        cart_items: Vec<CartItemUuid>,
        coupons: Vec<CouponUuid>,
    ) -> NewOrder {
        NewOrder {
            uuid: OrderUuid::new(),
            user_uuid: user,
            cart_items,
            coupons,
            payment_method: "card".to_string(),
            delivery_method: "courier".to_string(),
        }
    }

    #[tokio::test]
    async fn place_order_prices_items_and_consumes_cart() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let kettle = ctx.create_product("Kettle", 500).await?;
        let toaster = ctx.create_product("Toaster", 700).await?;

        let first = add_to_cart(&ctx, user, kettle.uuid, 2).await?;
        let second = add_to_cart(&ctx, user, toaster.uuid, 1).await?;
        let coupon = create_coupon(&ctx, 300).await?;

        let order = ctx
            .orders
            .place_order(new_order(
                user,
                vec![first.uuid, second.uuid],
                vec![coupon.uuid],
            ))
            .await?;

        assert!(
            IdentifierKind::OrderId.matches(&order.order_id),
            "unexpected order id {}",
            order.order_id
        );
        // Quantity 2 of the kettle does not double its snapshot.
        assert_eq!(order.gross_price, 1_200);
        assert_eq!(order.net_price, 900);
        assert_eq!(order.delivery_status, "Order in progress");
        assert!(!order.paid);
        assert!(!order.closed);
        assert_eq!(order.cart_items, vec![first.uuid, second.uuid]);
        assert_eq!(order.coupons, vec![coupon.uuid]);

        let lines = ctx.orders.list_order_items(order.uuid).await?;

        assert_eq!(lines.len(), 2);
        assert!(
            lines
                .iter()
                .any(|line| line.product_uuid == kettle.uuid && line.quantity == 2 && line.price == 500)
        );

        assert!(ctx.carts.list_items(CartOwner::User(user)).await?.is_empty());

        assert_eq!(ctx.orders.get_order(order.uuid).await?, order);
        assert_eq!(ctx.orders.get_order_by_order_id(&order.order_id).await?, order);

        Ok(())
    }

    #[tokio::test]
    async fn discount_above_gross_clamps_net_to_zero() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let product = ctx.create_product("Mug", 400).await?;

        let item = add_to_cart(&ctx, user, product.uuid, 1).await?;
        let coupon = create_coupon(&ctx, 1_000).await?;

        let order = ctx
            .orders
            .place_order(new_order(user, vec![item.uuid], vec![coupon.uuid]))
            .await?;

        assert_eq!(order.gross_price, 400);
        assert_eq!(order.net_price, 0);

        Ok(())
    }

    #[tokio::test]
    async fn repeated_ids_count_once() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let product = ctx.create_product("Mug", 400).await?;

        let item = add_to_cart(&ctx, user, product.uuid, 1).await?;
        let coupon = create_coupon(&ctx, 100).await?;

        let order = ctx
            .orders
            .place_order(new_order(
                user,
                vec![item.uuid, item.uuid],
                vec![coupon.uuid, coupon.uuid],
            ))
            .await?;

        assert_eq!(order.gross_price, 400);
        assert_eq!(order.net_price, 300);
        assert_eq!(order.cart_items.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn empty_order_is_rejected() {
        let ctx = TestContext::new().await;

        let result = ctx
            .orders
            .place_order(new_order(UserUuid::new(), Vec::new(), Vec::new()))
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::EmptyOrder)),
            "expected EmptyOrder, got {result:?}"
        );
    }

    #[tokio::test]
    async fn overlong_methods_are_invalid_data() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let product = ctx.create_product("Mug", 400).await?;

        let item = add_to_cart(&ctx, user, product.uuid, 1).await?;

        let mut order = new_order(user, vec![item.uuid], Vec::new());
        order.payment_method = "p".repeat(31);

        let result = ctx.orders.place_order(order).await;

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidData)),
            "expected InvalidData, got {result:?}"
        );

        let mut order = new_order(user, vec![item.uuid], Vec::new());
        order.delivery_method = "d".repeat(31);

        let result = ctx.orders.place_order(order).await;

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidData)),
            "expected InvalidData, got {result:?}"
        );

        assert_eq!(ctx.carts.list_items(CartOwner::User(user)).await?.len(), 1);

        let mut order = new_order(user, vec![item.uuid], Vec::new());
        order.delivery_method = "d".repeat(30);

        ctx.orders.place_order(order).await?;

        Ok(())
    }

    #[tokio::test]
    async fn unknown_or_foreign_cart_item_leaves_cart_untouched() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let someone_else = UserUuid::new();
        let product = ctx.create_product("Lamp", 900).await?;

        let mine = add_to_cart(&ctx, user, product.uuid, 1).await?;
        let theirs = add_to_cart(&ctx, someone_else, product.uuid, 1).await?;

        let result = ctx
            .orders
            .place_order(new_order(user, vec![mine.uuid, theirs.uuid], Vec::new()))
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::CartItemNotFound(uuid)) if uuid == theirs.uuid),
            "expected CartItemNotFound, got {result:?}"
        );

        let unknown = CartItemUuid::new();

        let result = ctx
            .orders
            .place_order(new_order(user, vec![unknown], Vec::new()))
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::CartItemNotFound(uuid)) if uuid == unknown),
            "expected CartItemNotFound, got {result:?}"
        );

        assert_eq!(ctx.carts.list_items(CartOwner::User(user)).await?.len(), 1);
        assert!(ctx.orders.list_orders(user).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn unknown_coupon_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let product = ctx.create_product("Lamp", 900).await?;

        let item = add_to_cart(&ctx, user, product.uuid, 1).await?;
        let unknown = CouponUuid::new();

        let result = ctx
            .orders
            .place_order(new_order(user, vec![item.uuid], vec![unknown]))
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::CouponNotFound(uuid)) if uuid == unknown),
            "expected CouponNotFound, got {result:?}"
        );

        assert_eq!(ctx.carts.list_items(CartOwner::User(user)).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn order_prices_are_a_snapshot() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let product = ctx.create_product("Lamp", 900).await?;

        let item = add_to_cart(&ctx, user, product.uuid, 1).await?;

        let order = ctx
            .orders
            .place_order(new_order(user, vec![item.uuid], Vec::new()))
            .await?;

        ctx.products
            .update_product(
                product.uuid,
                ProductUpdate {
                    title: "Lamp".to_string(),
                    price: 1_900,
                },
            )
            .await?;

        let reloaded = ctx.orders.get_order(order.uuid).await?;

        assert_eq!(reloaded.gross_price, 900);
        assert_eq!(reloaded.net_price, 900);

        let result = query("UPDATE orders SET gross_price = gross_price + 1 WHERE uuid = $1")
            .bind(order.uuid.into_uuid())
            .execute(ctx.db.pool())
            .await;

        assert!(result.is_err(), "order prices must not change after placement");

        Ok(())
    }

    #[tokio::test]
    async fn mark_paid_requires_verified_unused_payment() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let product = ctx.create_product("Lamp", 900).await?;

        let first_item = add_to_cart(&ctx, user, product.uuid, 1).await?;
        let first = ctx
            .orders
            .place_order(new_order(user, vec![first_item.uuid], Vec::new()))
            .await?;

        let payment = ctx
            .payments
            .create_payment(NewPayment::new(user, 900))
            .await?;

        let result = ctx.orders.mark_paid(first.uuid, &payment.reference).await;

        assert!(
            matches!(result, Err(OrdersServiceError::PaymentNotVerified)),
            "expected PaymentNotVerified, got {result:?}"
        );

        ctx.payments.verify_payment(&payment.reference).await?;

        let paid = ctx.orders.mark_paid(first.uuid, &payment.reference).await?;

        assert!(paid.paid);
        assert_eq!(paid.payment_uuid, Some(payment.uuid));
        assert_eq!(paid.gross_price, first.gross_price);
        assert!(ctx.payments.get_payment(payment.uuid).await?.used);

        let result = ctx.orders.mark_paid(first.uuid, &payment.reference).await;

        assert!(
            matches!(result, Err(OrdersServiceError::AlreadyPaid)),
            "expected AlreadyPaid, got {result:?}"
        );

        let second_item = add_to_cart(&ctx, user, product.uuid, 1).await?;
        let second = ctx
            .orders
            .place_order(new_order(user, vec![second_item.uuid], Vec::new()))
            .await?;

        let result = ctx.orders.mark_paid(second.uuid, &payment.reference).await;

        assert!(
            matches!(result, Err(OrdersServiceError::PaymentAlreadyUsed)),
            "expected PaymentAlreadyUsed, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn mark_paid_rejects_short_or_foreign_payments() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let product = ctx.create_product("Lamp", 900).await?;

        let item = add_to_cart(&ctx, user, product.uuid, 1).await?;
        let order = ctx
            .orders
            .place_order(new_order(user, vec![item.uuid], Vec::new()))
            .await?;

        let short = ctx.payments.create_payment(NewPayment::new(user, 899)).await?;
        ctx.payments.verify_payment(&short.reference).await?;

        let result = ctx.orders.mark_paid(order.uuid, &short.reference).await;

        assert!(
            matches!(result, Err(OrdersServiceError::InsufficientPayment)),
            "expected InsufficientPayment, got {result:?}"
        );

        let foreign = ctx
            .payments
            .create_payment(NewPayment::new(UserUuid::new(), 900))
            .await?;
        ctx.payments.verify_payment(&foreign.reference).await?;

        let result = ctx.orders.mark_paid(order.uuid, &foreign.reference).await;

        assert!(
            matches!(result, Err(OrdersServiceError::PaymentOwnerMismatch)),
            "expected PaymentOwnerMismatch, got {result:?}"
        );

        let result = ctx.orders.mark_paid(order.uuid, "no-such-ref").await;

        assert!(
            matches!(result, Err(OrdersServiceError::PaymentNotFound)),
            "expected PaymentNotFound, got {result:?}"
        );

        assert!(!ctx.payments.get_payment(short.uuid).await?.used);

        Ok(())
    }

    #[tokio::test]
    async fn closed_orders_keep_their_delivery_status() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let product = ctx.create_product("Lamp", 900).await?;

        let item = add_to_cart(&ctx, user, product.uuid, 1).await?;
        let order = ctx
            .orders
            .place_order(new_order(user, vec![item.uuid], Vec::new()))
            .await?;

        let shipped = ctx
            .orders
            .update_delivery_status(order.uuid, "Shipped")
            .await?;

        assert_eq!(shipped.delivery_status, "Shipped");

        let closed = ctx.orders.close_order(order.uuid).await?;
        let closed_again = ctx.orders.close_order(order.uuid).await?;

        assert!(closed.closed);
        assert_eq!(closed_again, closed);

        let result = ctx
            .orders
            .update_delivery_status(order.uuid, "Returned")
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::OrderClosed)),
            "expected OrderClosed, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn list_orders_only_returns_the_users_orders() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();
        let other = UserUuid::new();
        let product = ctx.create_product("Lamp", 900).await?;

        let mine = add_to_cart(&ctx, user, product.uuid, 1).await?;
        let theirs = add_to_cart(&ctx, other, product.uuid, 1).await?;

        let placed = ctx
            .orders
            .place_order(new_order(user, vec![mine.uuid], Vec::new()))
            .await?;
        ctx.orders
            .place_order(new_order(other, vec![theirs.uuid], Vec::new()))
            .await?;

        let listed: Vec<_> = ctx
            .orders
            .list_orders(user)
            .await?
            .into_iter()
            .map(|order| order.uuid)
            .collect();

        assert_eq!(listed, vec![placed.uuid]);

        Ok(())
    }

    #[test]
    fn distinct_keeps_first_occurrence() {
        assert_eq!(distinct(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(distinct::<u8>(&[]).is_empty());
    }
}
