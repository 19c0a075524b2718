//! Orders

pub mod data;
mod errors;
pub mod pricing;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use errors::OrdersServiceError;
pub use service::*;
