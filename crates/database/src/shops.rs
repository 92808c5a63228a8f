// database/shops.rs - shop records: one document per storefront

pub mod model;
pub mod query;
pub mod store;

pub const SHOPS_COLLECTION: &str = "shops";
