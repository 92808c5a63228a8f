// lib.rs - persistence layer and repository for shop records

pub mod connection;
pub mod error;
pub mod shops;

pub use connection::Connection;
pub use error::ShopError;
pub use shops::model::{ShopModel, DEFAULT_SHOP_MESSAGE};
pub use shops::store::{MemoryShopStore, MongoShopStore, ShopStore};
