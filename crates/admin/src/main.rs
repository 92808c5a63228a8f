// admin/main.rs - scripts for initializing the database and inspecting shop records

use clap::{Parser, Subcommand};
use database::shops::{
    model::{create_shop_index, ShopModel},
    query::{delete_shop, ensure_shop, find_shop, list_shops, set_message},
};
use dotenvy::dotenv;
use mongodb::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(name = "admin")]
struct Args {
    #[clap(subcommand)]
    subcommand: Subcommands,
    #[arg(short, long, env = "ENVIRONMENT", default_value = "local")]
    environment: String,
    #[arg(
        long,
        env = "DATABASE_URI",
        default_value = "mongodb://localhost:27017"
    )]
    database_uri: String,
    #[arg(long, env = "DATABASE_NAME", default_value = "shopify-post-purchase")]
    database_name: String,
}

#[derive(Debug, Subcommand)]
enum Subcommands {
    #[clap(name = "init-db")]
    InitDatabase {
        /// Drop every existing record first
        #[arg(long)]
        drop: bool,
    },
    #[clap(name = "list-shops")]
    ListShops,
    #[clap(name = "show-shop")]
    ShowShop { domain: String },
    #[clap(name = "ensure-shop")]
    EnsureShop { domain: String },
    #[clap(name = "set-message")]
    SetMessage { domain: String, message: String },
    #[clap(name = "delete-shop")]
    DeleteShop { domain: String },
}

fn describe(shop: &ShopModel) -> String {
    let installed_at = shop
        .installed_at
        .try_to_rfc3339_string()
        .unwrap_or_else(|_| shop.installed_at.to_string());
    format!(
        "{} (installed {}): {}",
        shop.shop_domain, installed_at, shop.message
    )
}

#[tokio::main]
async fn main() -> Result<(), String> {
    // Load environment variables from .env file
    dotenv().ok();

    // Parse CLI args, using ENV vars if not provided
    let args = Args::parse();

    // Set up tracing and parse args.
    let env_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| e.to_string())?;
    tracing_subscriber::fmt()
        .with_env_filter(env_layer)
        .with_target(true)
        .init();

    // Create database client
    let db_client = Client::with_uri_str(args.database_uri)
        .await
        .map_err(|e| format!("Failed to connect to database: {}", e))?;
    let database = args.database_name.as_str();

    // Perform subcommand logic
    match args.subcommand {
        Subcommands::InitDatabase { drop } => {
            // 1. Optionally drop the database on the provided client
            if drop {
                warn!("Dropping database {}", database);
                db_client
                    .database(database)
                    .drop(None)
                    .await
                    .map_err(|e| format!("Failed to drop database: {}", e))?;
            }

            // 2. Create the database indexes defined in the database models
            info!("Creating database indexes.");
            create_shop_index(&db_client, database)
                .await
                .map_err(|e| e.to_string())?;

            info!("Database initialized for {} environment.", args.environment);
        }
        Subcommands::ListShops => {
            let shops = list_shops(&db_client, database)
                .await
                .map_err(|e| e.to_string())?;

            for shop in &shops {
                info!("{}", describe(shop));
            }
            info!("{} shop(s) installed.", shops.len());
        }
        Subcommands::ShowShop { domain } => {
            match find_shop(&db_client, database, &domain)
                .await
                .map_err(|e| e.to_string())?
            {
                Some(shop) => info!("{}", describe(&shop)),
                None => warn!("No shop found for {}", domain),
            }
        }
        Subcommands::EnsureShop { domain } => {
            let shop = ensure_shop(&db_client, database, &domain)
                .await
                .map_err(|e| e.to_string())?;

            info!("Shop ensured: {}", describe(&shop));
        }
        Subcommands::SetMessage { domain, message } => {
            let shop = set_message(&db_client, database, &domain, &message)
                .await
                .map_err(|e| e.to_string())?;

            info!("Message updated: {}", describe(&shop));
        }
        Subcommands::DeleteShop { domain } => {
            let deleted = delete_shop(&db_client, database, &domain)
                .await
                .map_err(|e| e.to_string())?;

            if deleted {
                info!("Shop removed: {}", domain);
            } else {
                warn!("No shop found for {}", domain);
            }
        }
    }

    Ok(())
}
