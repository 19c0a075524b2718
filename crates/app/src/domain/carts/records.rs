//! Cart Records

use std::{fmt, net::IpAddr};

use jiff::Timestamp;
use serde::Serialize;

use crate::{
    domain::{products::records::ProductUuid, users::UserUuid},
    uuids::TypedUuid,
};

/// Cart Item UUID
pub type CartItemUuid = TypedUuid<CartItemRecord>;

/// Who a cart belongs to.
///
/// Anonymous shoppers are keyed by the address their requests come from until
/// they sign in and their cart is merged into the user's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CartOwner {
    User(UserUuid),
    Ip(IpAddr),
}

impl fmt::Display for CartOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(user) => write!(f, "user:{user}"),
            Self::Ip(ip) => write!(f, "ip:{ip}"),
        }
    }
}

/// CartItem Record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItemRecord {
    pub uuid: CartItemUuid,
    pub owner: CartOwner,
    pub product_uuid: ProductUuid,
    pub quantity: u32,

    /// Unit price captured when the product was first added.
    pub price: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
