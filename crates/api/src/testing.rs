// testing.rs - shared fixtures for handler tests

use super::config::{Config, ExtensionConfig};
use async_trait::async_trait;
use database::{ShopError, ShopModel, ShopStore, DEFAULT_SHOP_MESSAGE};
use std::sync::Arc;

pub fn config(store: Arc<dyn ShopStore>) -> Config {
    Config {
        store,
        extension: ExtensionConfig {
            live_message: false,
            static_message: DEFAULT_SHOP_MESSAGE.to_string(),
        },
    }
}

pub fn live_config(store: Arc<dyn ShopStore>) -> Config {
    let mut config = config(store);
    config.extension.live_message = true;
    config
}

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Unreachable,
    Conflict,
    NotFound,
}

pub fn failing(failure: Failure) -> Arc<dyn ShopStore> {
    Arc::new(FailingShopStore(failure))
}

/// Store whose every operation fails the same way.
pub struct FailingShopStore(pub Failure);

impl FailingShopStore {
    fn error(&self, shop_domain: &str) -> ShopError {
        match self.0 {
            Failure::Unreachable => ShopError::Db("connection refused".to_string()),
            Failure::Conflict => ShopError::Conflict(shop_domain.to_string()),
            Failure::NotFound => ShopError::NotFound(shop_domain.to_string()),
        }
    }
}

#[async_trait]
impl ShopStore for FailingShopStore {
    async fn find_shop(&self, shop_domain: &str) -> Result<Option<ShopModel>, ShopError> {
        Err(self.error(shop_domain))
    }

    async fn ensure_shop(&self, shop_domain: &str) -> Result<ShopModel, ShopError> {
        Err(self.error(shop_domain))
    }

    async fn set_message(&self, shop_domain: &str, _message: &str) -> Result<ShopModel, ShopError> {
        Err(self.error(shop_domain))
    }

    async fn delete_shop(&self, shop_domain: &str) -> Result<bool, ShopError> {
        Err(self.error(shop_domain))
    }

    async fn list_shops(&self) -> Result<Vec<ShopModel>, ShopError> {
        Err(self.error(""))
    }

    async fn is_connected(&self) -> bool {
        false
    }
}
