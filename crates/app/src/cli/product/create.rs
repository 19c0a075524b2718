use clap::Args;
use market_app::domain::products::{data::NewProduct, records::ProductUuid};
use uuid::Uuid;

use crate::cli::{ServiceArgs, print_json};

#[derive(Debug, Args)]
pub(crate) struct CreateProductArgs {
    #[command(flatten)]
    service: ServiceArgs,

    /// Product title
    #[arg(long)]
    title: String,

    /// Unit price in minor units
    #[arg(long)]
    price: u64,

    /// Optional product UUID; generated when omitted
    #[arg(long)]
    product_uuid: Option<Uuid>,
}

pub(crate) async fn run(args: CreateProductArgs) -> Result<(), String> {
    if args.title.trim().is_empty() {
        return Err("title cannot be empty".to_string());
    }

    let app = args.service.context().await?;

    let product = app
        .products
        .create_product(NewProduct {
            uuid: args
                .product_uuid
                .map_or_else(ProductUuid::new, ProductUuid::from_uuid),
            title: args.title,
            price: args.price,
        })
        .await
        .map_err(|error| format!("failed to create product: {error}"))?;

    print_json(&product)
}
