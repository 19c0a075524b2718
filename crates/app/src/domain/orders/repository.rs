//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    database::{amount_to_i64, quantity_to_i32, try_get_amount, try_get_quantity},
    domain::{
        carts::records::{CartItemRecord, CartItemUuid},
        coupons::records::CouponUuid,
        orders::{
            data::NewOrder,
            pricing::OrderPricing,
            records::{OrderItemRecord, OrderItemUuid, OrderRecord, OrderUuid},
        },
        payments::records::PaymentUuid,
        products::records::ProductUuid,
        users::UserUuid,
    },
};

/// Unique constraint guarding order identifiers.
pub(crate) const ORDER_ID_CONSTRAINT: &str = "orders_order_id_key";

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const CREATE_ORDER_ITEM_SQL: &str = include_str!("sql/create_order_item.sql");
const ORDER_ID_EXISTS_SQL: &str = include_str!("sql/order_id_exists.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const GET_ORDER_BY_ORDER_ID_SQL: &str = include_str!("sql/get_order_by_order_id.sql");
const LOCK_ORDER_SQL: &str = include_str!("sql/lock_order.sql");
const LIST_USER_ORDERS_SQL: &str = include_str!("sql/list_user_orders.sql");
const LIST_ORDER_ITEMS_SQL: &str = include_str!("sql/list_order_items.sql");
const MARK_ORDER_PAID_SQL: &str = include_str!("sql/mark_order_paid.sql");
const SET_DELIVERY_STATUS_SQL: &str = include_str!("sql/set_delivery_status.sql");
const CLOSE_ORDER_SQL: &str = include_str!("sql/close_order.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &NewOrder,
        order_id: &str,
        pricing: OrderPricing,
    ) -> Result<OrderRecord, sqlx::Error> {
        let cart_items: Vec<Uuid> = order.cart_items.iter().map(|item| item.into_uuid()).collect();
        let coupons: Vec<Uuid> = order.coupons.iter().map(|coupon| coupon.into_uuid()).collect();

        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order_id)
            .bind(order.user_uuid.into_uuid())
            .bind(cart_items)
            .bind(coupons)
            .bind(order.payment_method.as_str())
            .bind(order.delivery_method.as_str())
            .bind(amount_to_i64("gross_price", pricing.gross)?)
            .bind(amount_to_i64("net_price", pricing.net)?)
            .fetch_one(&mut **tx)
            .await
    }

    /// Copy a cart line onto the order.
    pub(crate) async fn create_order_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        item: &CartItemRecord,
    ) -> Result<OrderItemRecord, sqlx::Error> {
        query_as::<Postgres, OrderItemRecord>(CREATE_ORDER_ITEM_SQL)
            .bind(OrderItemUuid::new().into_uuid())
            .bind(order.into_uuid())
            .bind(item.product_uuid.into_uuid())
            .bind(quantity_to_i32("quantity", item.quantity)?)
            .bind(amount_to_i64("price", item.price)?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn order_id_exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order_id: &str,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(ORDER_ID_EXISTS_SQL)
            .bind(order_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_order_by_order_id(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order_id: &str,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_ORDER_BY_ORDER_ID_SQL)
            .bind(order_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LOCK_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_user_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_USER_ORDERS_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_order_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<OrderItemRecord>, sqlx::Error> {
        query_as::<Postgres, OrderItemRecord>(LIST_ORDER_ITEMS_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn mark_paid(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        payment: PaymentUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(MARK_ORDER_PAID_SQL)
            .bind(order.into_uuid())
            .bind(payment.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_delivery_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        status: &str,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(SET_DELIVERY_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(status)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn close_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(CLOSE_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let cart_items: Vec<Uuid> = row.try_get("cart_items")?;
        let coupons: Vec<Uuid> = row.try_get("coupons")?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            order_id: row.try_get("order_id")?,
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            cart_items: cart_items.into_iter().map(CartItemUuid::from_uuid).collect(),
            coupons: coupons.into_iter().map(CouponUuid::from_uuid).collect(),
            payment_method: row.try_get("payment_method")?,
            delivery_method: row.try_get("delivery_method")?,
            delivery_status: row.try_get("delivery_status")?,
            gross_price: try_get_amount(row, "gross_price")?,
            net_price: try_get_amount(row, "net_price")?,
            payment_uuid: row
                .try_get::<Option<Uuid>, _>("payment_uuid")?
                .map(PaymentUuid::from_uuid),
            closed: row.try_get("closed")?,
            paid: row.try_get("paid")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OrderItemUuid::from_uuid(row.try_get("uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: try_get_quantity(row, "quantity")?,
            price: try_get_amount(row, "price")?,
        })
    }
}
