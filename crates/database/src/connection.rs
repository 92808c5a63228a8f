// database/connection.rs - lazily opened client shared by every query

use super::shops::model::create_shop_index;
use super::ShopError;
use mongodb::{bson::doc, Client};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Handle to the document store.
///
/// The client is opened by the first caller and reused afterwards. Concurrent
/// first callers wait on the same initialization. A failed initialization is
/// not cached, so the next call tries again.
#[derive(Debug)]
pub struct Connection {
    uri: String,
    database: String,
    client: OnceCell<Client>,
}

impl Connection {
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            client: OnceCell::new(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Whether a previous call already opened the client.
    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    pub async fn client(&self) -> Result<&Client, ShopError> {
        self.client
            .get_or_try_init(|| async {
                info!("Connecting to database {}", self.database);
                let client = Client::with_uri_str(&self.uri).await?;

                debug!("Creating shop indexes");
                create_shop_index(&client, &self.database).await?;

                info!("Database connected");
                Ok::<Client, ShopError>(client)
            })
            .await
    }

    /// Round trip to the server. Never opens the client.
    pub async fn ping(&self) -> Result<(), ShopError> {
        let Some(client) = self.client.get() else {
            return Err(ShopError::Db("Client not initialized".to_string()));
        };

        client
            .database(&self.database)
            .run_command(doc! { "ping": 1 }, None)
            .await?;

        Ok(())
    }
}
