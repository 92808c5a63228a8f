// database/shops/query.rs - query functions for the shops collection
use super::model::ShopModel;
use super::SHOPS_COLLECTION;
use crate::ShopError;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Client, Collection,
};

fn shops(client: &Client, database: &str) -> Collection<ShopModel> {
    client.database(database).collection(SHOPS_COLLECTION)
}

pub async fn find_shop(
    client: &Client,
    database: &str,
    shop_domain: &str,
) -> Result<Option<ShopModel>, ShopError> {
    let collection = shops(client, database);

    let result = collection
        .find_one(doc! { "shopDomain": shop_domain }, None)
        .await?;

    Ok(result)
}

// Get or create. A concurrent create for the same domain surfaces as a conflict
pub async fn ensure_shop(
    client: &Client,
    database: &str,
    shop_domain: &str,
) -> Result<ShopModel, ShopError> {
    if let Some(shop) = find_shop(client, database, shop_domain).await? {
        return Ok(shop);
    }

    let shop = ShopModel::new(shop_domain);

    shops(client, database)
        .insert_one(&shop, None)
        .await
        .map_err(|e| ShopError::from_write(shop_domain, e))?;

    Ok(shop)
}

pub async fn set_message(
    client: &Client,
    database: &str,
    shop_domain: &str,
    message: &str,
) -> Result<ShopModel, ShopError> {
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();

    let result = shops(client, database)
        .find_one_and_update(
            doc! { "shopDomain": shop_domain },
            doc! { "$set": { "message": message } },
            options,
        )
        .await
        .map_err(|e| ShopError::from_write(shop_domain, e))?;

    match result {
        Some(shop) => Ok(shop),
        None => Err(ShopError::NotFound(shop_domain.to_string())),
    }
}

// Returns whether a record was removed
pub async fn delete_shop(
    client: &Client,
    database: &str,
    shop_domain: &str,
) -> Result<bool, ShopError> {
    let result = shops(client, database)
        .delete_one(doc! { "shopDomain": shop_domain }, None)
        .await?;

    Ok(result.deleted_count > 0)
}

// Ordered by domain, matching the in-memory store
fn list_options() -> FindOptions {
    FindOptions::builder().sort(doc! { "shopDomain": 1 }).build()
}

pub async fn list_shops(client: &Client, database: &str) -> Result<Vec<ShopModel>, ShopError> {
    let mut cursor = shops(client, database).find(None, list_options()).await?;

    let mut records: Vec<ShopModel> = vec![];

    while let Some(shop) = cursor.try_next().await? {
        records.push(shop);
    }

    Ok(records)
}
