//! Cart Items Repository

use std::net::IpAddr;

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::{amount_to_i64, quantity_to_i32, try_get_amount, try_get_quantity},
    domain::{
        carts::records::{CartItemRecord, CartItemUuid, CartOwner},
        products::records::ProductUuid,
        users::UserUuid,
    },
};

const LIST_OWNER_ITEMS_SQL: &str = include_str!("sql/list_owner_items.sql");
const LOCK_OWNER_ITEMS_SQL: &str = include_str!("sql/lock_owner_items.sql");
const LOCK_USER_ITEMS_BY_UUID_SQL: &str = include_str!("sql/lock_user_items_by_uuid.sql");
const UPSERT_USER_ITEM_SQL: &str = include_str!("sql/upsert_user_item.sql");
const UPSERT_IP_ITEM_SQL: &str = include_str!("sql/upsert_ip_item.sql");
const INSERT_USER_ITEM_SQL: &str = include_str!("sql/insert_user_item.sql");
const SET_ITEM_QUANTITY_SQL: &str = include_str!("sql/set_item_quantity.sql");
const DELETE_OWNER_ITEM_SQL: &str = include_str!("sql/delete_owner_item.sql");
const DELETE_ITEMS_SQL: &str = include_str!("sql/delete_items.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartItemsRepository;

impl PgCartItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: CartOwner,
    ) -> Result<Vec<CartItemRecord>, sqlx::Error> {
        let (user_uuid, ip_address) = owner_columns(owner);

        query_as::<Postgres, CartItemRecord>(LIST_OWNER_ITEMS_SQL)
            .bind(user_uuid)
            .bind(ip_address)
            .fetch_all(&mut **tx)
            .await
    }

    /// List an owner's items, locking them until the transaction ends.
    pub(crate) async fn lock_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: CartOwner,
    ) -> Result<Vec<CartItemRecord>, sqlx::Error> {
        let (user_uuid, ip_address) = owner_columns(owner);

        query_as::<Postgres, CartItemRecord>(LOCK_OWNER_ITEMS_SQL)
            .bind(user_uuid)
            .bind(ip_address)
            .fetch_all(&mut **tx)
            .await
    }

    /// Lock the user's items among `items`. Unknown or foreign items are skipped.
    pub(crate) async fn lock_user_items_by_uuid(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        items: &[CartItemUuid],
    ) -> Result<Vec<CartItemRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = items.iter().map(|item| item.into_uuid()).collect();

        query_as::<Postgres, CartItemRecord>(LOCK_USER_ITEMS_BY_UUID_SQL)
            .bind(uuids)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Add a product line, raising the quantity when the owner already holds it.
    pub(crate) async fn upsert_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: CartOwner,
        item: CartItemUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartItemRecord, sqlx::Error> {
        let quantity = quantity_to_i32("quantity", quantity)?;

        let (sql, user_uuid, ip_address) = match owner {
            CartOwner::User(user) => (UPSERT_USER_ITEM_SQL, Some(user.into_uuid()), None),
            CartOwner::Ip(ip) => (UPSERT_IP_ITEM_SQL, None, Some(ip.to_string())),
        };

        let builder = query_as::<Postgres, CartItemRecord>(sql)
            .bind(item.into_uuid())
            .bind(product.into_uuid());

        // The owner column is the third placeholder in both statements.
        let builder = match (user_uuid, ip_address) {
            (Some(user_uuid), _) => builder.bind(user_uuid),
            (None, ip_address) => builder.bind(ip_address),
        };

        builder.bind(quantity).fetch_one(&mut **tx).await
    }

    pub(crate) async fn insert_user_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        item: CartItemUuid,
        product: ProductUuid,
        quantity: u32,
        price: u64,
    ) -> Result<(), sqlx::Error> {
        query(INSERT_USER_ITEM_SQL)
            .bind(item.into_uuid())
            .bind(product.into_uuid())
            .bind(user.into_uuid())
            .bind(quantity_to_i32("quantity", quantity)?)
            .bind(amount_to_i64("price", price)?)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn set_quantity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: CartItemUuid,
        quantity: u32,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_ITEM_QUANTITY_SQL)
            .bind(item.into_uuid())
            .bind(quantity_to_i32("quantity", quantity)?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn delete_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: CartOwner,
        item: CartItemUuid,
    ) -> Result<u64, sqlx::Error> {
        let (user_uuid, ip_address) = owner_columns(owner);

        let rows_affected = query(DELETE_OWNER_ITEM_SQL)
            .bind(item.into_uuid())
            .bind(user_uuid)
            .bind(ip_address)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn delete_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        items: &[CartItemUuid],
    ) -> Result<u64, sqlx::Error> {
        let uuids: Vec<Uuid> = items.iter().map(|item| item.into_uuid()).collect();

        let rows_affected = query(DELETE_ITEMS_SQL)
            .bind(uuids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn owner_columns(owner: CartOwner) -> (Option<Uuid>, Option<String>) {
    match owner {
        CartOwner::User(user) => (Some(user.into_uuid()), None),
        CartOwner::Ip(ip) => (None, Some(ip.to_string())),
    }
}

fn try_get_owner(row: &PgRow) -> Result<CartOwner, sqlx::Error> {
    let user_uuid: Option<Uuid> = row.try_get("user_uuid")?;
    let ip_address: Option<String> = row.try_get("ip_address")?;

    match (user_uuid, ip_address) {
        (Some(user), None) => Ok(CartOwner::User(UserUuid::from_uuid(user))),
        (None, Some(ip)) => ip
            .parse::<IpAddr>()
            .map(CartOwner::Ip)
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "ip_address".to_string(),
                source: Box::new(e),
            }),
        _ => Err(sqlx::Error::ColumnDecode {
            index: "user_uuid".to_string(),
            source: "cart item must have exactly one owner".into(),
        }),
    }
}

impl<'r> FromRow<'r, PgRow> for CartItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CartItemUuid::from_uuid(row.try_get("uuid")?),
            owner: try_get_owner(row)?,
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: try_get_quantity(row, "quantity")?,
            price: try_get_amount(row, "price")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
