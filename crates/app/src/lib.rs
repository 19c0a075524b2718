//! Marketplace order, coupon and cart core.
//!
//! Services are invoked by an outer API layer with already-authenticated user
//! identifiers. Each operation runs in its own database transaction.

pub mod clock;
pub mod context;
pub mod database;
pub mod domain;
pub mod identifiers;
pub mod logging;

#[cfg(test)]
mod test;

mod uuids;

pub use uuids::TypedUuid;
