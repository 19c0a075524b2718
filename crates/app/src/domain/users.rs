//! Users
//!
//! Accounts belong to the authentication layer. Only their identifiers cross
//! into this crate, already resolved from whatever credential the caller held.

use crate::uuids::TypedUuid;

/// Marker for identifiers issued by the authentication layer.
#[derive(Debug)]
pub struct User;

/// User UUID
pub type UserUuid = TypedUuid<User>;
