// database/shops/model.rs - model for the shops collection
use super::SHOPS_COLLECTION;
use crate::ShopError;
use mongodb::{
    bson::{doc, DateTime},
    options::IndexOptions,
    Client, IndexModel,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SHOP_MESSAGE: &str =
    "Thank you for your purchase! You'll receive a special discount code via email for your next order.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopModel {
    pub shop_domain: String,
    pub installed_at: DateTime,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl ShopModel {
    /// A freshly installed shop carrying the default message.
    pub fn new(shop_domain: &str) -> Self {
        Self {
            shop_domain: shop_domain.to_string(),
            installed_at: DateTime::now(),
            message: DEFAULT_SHOP_MESSAGE.to_string(),
            access_token: None,
        }
    }
}

pub async fn create_shop_index(client: &Client, database: &str) -> Result<(), ShopError> {
    let options = IndexOptions::builder().unique(true).build();

    let model = IndexModel::builder()
        .keys(doc! { "shopDomain": 1 })
        .options(options)
        .build();

    client
        .database(database)
        .collection::<ShopModel>(SHOPS_COLLECTION)
        .create_index(model, None)
        .await?;

    Ok(())
}
