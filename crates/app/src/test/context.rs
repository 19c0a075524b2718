//! Test context for service-level integration tests.

use std::sync::Arc;

use jiff::Timestamp;

use crate::{
    clock::{Clock, ManualClock},
    database::Db,
    domain::{
        carts::PgCartsService, coupons::PgCouponsService, orders::PgOrdersService,
        payments::PgPaymentsService, products::PgProductsService,
    },
    identifiers::IdentifierGenerator,
};

use super::db::TestDb;

/// Seed used by [`TestContext::new`].
const DEFAULT_SEED: u64 = 0x6d61_726b_6574;

/// Whole-second start time, so stamps survive Postgres' microsecond precision.
const START_SECOND: i64 = 1_767_225_600;

pub(crate) struct TestContext {
    pub db: TestDb,
    pub clock: Arc<ManualClock>,
    pub products: PgProductsService,
    pub carts: PgCartsService,
    pub coupons: PgCouponsService,
    pub orders: PgOrdersService,
    pub payments: PgPaymentsService,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_seed(DEFAULT_SEED).await
    }

    /// Context whose identifier generator replays `IdentifierGenerator::seeded(seed)`.
    pub async fn with_seed(seed: u64) -> Self {
        Self::with_generator(IdentifierGenerator::seeded(seed)).await
    }

    pub async fn with_generator(identifiers: IdentifierGenerator) -> Self {
        let test_db = TestDb::new().await;
        let db = Db::new(test_db.pool().clone());

        let clock = Arc::new(ManualClock::new(
            Timestamp::from_second(START_SECOND).expect("start time in range"),
        ));
        let identifiers = Arc::new(identifiers);

        let shared_clock: Arc<dyn Clock> = clock.clone();

        Self {
            products: PgProductsService::new(db.clone()),
            carts: PgCartsService::new(db.clone()),
            coupons: PgCouponsService::new(
                db.clone(),
                Arc::clone(&shared_clock),
                Arc::clone(&identifiers),
            ),
            orders: PgOrdersService::new(db.clone(), Arc::clone(&identifiers)),
            payments: PgPaymentsService::new(db, shared_clock, Arc::clone(&identifiers)),
            clock,
            db: test_db,
        }
    }

    /// A handle on the test database for building extra services.
    pub fn app_db(&self) -> Db {
        Db::new(self.db.pool().clone())
    }
}
