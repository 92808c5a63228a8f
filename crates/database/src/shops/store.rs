// database/shops/store.rs - repository over shop records

use super::model::ShopModel;
use super::query;
use crate::{Connection, ShopError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Typed operations on shop records. Every write commits immediately.
#[async_trait]
pub trait ShopStore: Send + Sync {
    async fn find_shop(&self, shop_domain: &str) -> Result<Option<ShopModel>, ShopError>;

    /// Idempotent get-or-create.
    async fn ensure_shop(&self, shop_domain: &str) -> Result<ShopModel, ShopError>;

    /// Overwrites the message. A missing domain is `ShopError::NotFound`.
    async fn set_message(&self, shop_domain: &str, message: &str)
        -> Result<ShopModel, ShopError>;

    /// Removes the record. Returns whether one existed.
    async fn delete_shop(&self, shop_domain: &str) -> Result<bool, ShopError>;

    async fn list_shops(&self) -> Result<Vec<ShopModel>, ShopError>;

    async fn is_connected(&self) -> bool;

    /// The stored message, or an empty string when the domain is unknown.
    async fn get_message(&self, shop_domain: &str) -> Result<String, ShopError> {
        let shop = self.find_shop(shop_domain).await?;
        Ok(shop.map(|shop| shop.message).unwrap_or_default())
    }
}

#[derive(Debug)]
pub struct MongoShopStore {
    connection: Connection,
}

impl MongoShopStore {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl ShopStore for MongoShopStore {
    async fn find_shop(&self, shop_domain: &str) -> Result<Option<ShopModel>, ShopError> {
        let client = self.connection.client().await?;
        query::find_shop(client, self.connection.database(), shop_domain).await
    }

    async fn ensure_shop(&self, shop_domain: &str) -> Result<ShopModel, ShopError> {
        let client = self.connection.client().await?;
        query::ensure_shop(client, self.connection.database(), shop_domain).await
    }

    async fn set_message(
        &self,
        shop_domain: &str,
        message: &str,
    ) -> Result<ShopModel, ShopError> {
        let client = self.connection.client().await?;
        query::set_message(client, self.connection.database(), shop_domain, message).await
    }

    async fn delete_shop(&self, shop_domain: &str) -> Result<bool, ShopError> {
        let client = self.connection.client().await?;
        query::delete_shop(client, self.connection.database(), shop_domain).await
    }

    async fn list_shops(&self) -> Result<Vec<ShopModel>, ShopError> {
        let client = self.connection.client().await?;
        query::list_shops(client, self.connection.database()).await
    }

    async fn is_connected(&self) -> bool {
        if !self.connection.is_initialized() {
            return false;
        }

        match self.connection.ping().await {
            Ok(()) => true,
            Err(e) => {
                debug!("Database ping failed: {}", e);
                false
            }
        }
    }
}

/// Process-local store for development and tests. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryShopStore {
    shops: Mutex<HashMap<String, ShopModel>>,
}

#[async_trait]
impl ShopStore for MemoryShopStore {
    async fn find_shop(&self, shop_domain: &str) -> Result<Option<ShopModel>, ShopError> {
        let shops = self.shops.lock().await;
        Ok(shops.get(shop_domain).cloned())
    }

    async fn ensure_shop(&self, shop_domain: &str) -> Result<ShopModel, ShopError> {
        let mut shops = self.shops.lock().await;
        let shop = shops
            .entry(shop_domain.to_string())
            .or_insert_with(|| ShopModel::new(shop_domain));
        Ok(shop.clone())
    }

    async fn set_message(
        &self,
        shop_domain: &str,
        message: &str,
    ) -> Result<ShopModel, ShopError> {
        let mut shops = self.shops.lock().await;
        match shops.get_mut(shop_domain) {
            Some(shop) => {
                shop.message = message.to_string();
                Ok(shop.clone())
            }
            None => Err(ShopError::NotFound(shop_domain.to_string())),
        }
    }

    async fn delete_shop(&self, shop_domain: &str) -> Result<bool, ShopError> {
        let mut shops = self.shops.lock().await;
        Ok(shops.remove(shop_domain).is_some())
    }

    async fn list_shops(&self) -> Result<Vec<ShopModel>, ShopError> {
        let shops = self.shops.lock().await;
        let mut records: Vec<ShopModel> = shops.values().cloned().collect();
        records.sort_by(|a, b| a.shop_domain.cmp(&b.shop_domain));
        Ok(records)
    }

    async fn is_connected(&self) -> bool {
        true
    }
}
