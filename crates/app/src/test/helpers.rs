//! Test Helpers

use jiff::{SignedDuration, Timestamp};

use crate::{
    clock::Clock,
    domain::products::{
        ProductsService, ProductsServiceError,
        data::NewProduct,
        records::{ProductRecord, ProductUuid},
    },
    test::TestContext,
};

impl TestContext {
    pub(crate) async fn create_product(
        &self,
        title: &str,
        price: u64,
    ) -> Result<ProductRecord, ProductsServiceError> {
        self.products
            .create_product(NewProduct {
                uuid: ProductUuid::new(),
                title: title.to_string(),
                price,
            })
            .await
    }

    /// The test clock's current time plus `days`.
    pub(crate) fn days_from_now(&self, days: i64) -> Result<Timestamp, jiff::Error> {
        self.clock
            .now()
            .checked_add(SignedDuration::from_hours(days * 24))
    }
}
