// config.rs - Configuration type for the API

use database::ShopStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct Config {
    pub store: Arc<dyn ShopStore>,
    pub extension: ExtensionConfig,
}

#[derive(Clone, Debug)]
pub struct ExtensionConfig {
    /// Resolve the checkout message from the store instead of `static_message`
    pub live_message: bool,
    pub static_message: String,
}
