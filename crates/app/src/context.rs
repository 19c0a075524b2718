//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    clock::{Clock, SystemClock},
    database::{self, Db},
    domain::{
        carts::{CartsService, PgCartsService},
        coupons::{CouponsService, PgCouponsService},
        orders::{OrdersService, PgOrdersService},
        payments::{PaymentsService, PgPaymentsService},
        products::{PgProductsService, ProductsService},
    },
    identifiers::IdentifierGenerator,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub coupons: Arc<dyn CouponsService>,
    pub orders: Arc<dyn OrdersService>,
    pub payments: Arc<dyn PaymentsService>,
}

impl AppContext {
    /// Build application context from a database URL, using the wall clock and
    /// an entropy-seeded identifier generator.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(
        url: &str,
        identifier_max_attempts: usize,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        let identifiers = IdentifierGenerator::from_entropy().with_max_attempts(identifier_max_attempts);

        Ok(Self::new(
            Db::new(pool),
            Arc::new(SystemClock),
            Arc::new(identifiers),
        ))
    }

    /// Wire every service onto `db` with the given clock and generator.
    #[must_use]
    pub fn new(db: Db, clock: Arc<dyn Clock>, identifiers: Arc<IdentifierGenerator>) -> Self {
        Self {
            products: Arc::new(PgProductsService::new(db.clone())),
            carts: Arc::new(PgCartsService::new(db.clone())),
            coupons: Arc::new(PgCouponsService::new(
                db.clone(),
                Arc::clone(&clock),
                Arc::clone(&identifiers),
            )),
            orders: Arc::new(PgOrdersService::new(db.clone(), Arc::clone(&identifiers))),
            payments: Arc::new(PgPaymentsService::new(db, clock, identifiers)),
        }
    }
}
