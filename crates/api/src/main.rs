// main.rs - entry point to run the API server

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::subscriber::set_global_default;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

mod admin;
mod config;
mod error;
mod extension;
mod routes;
#[cfg(test)]
mod testing;

use config::{Config, ExtensionConfig};
use database::{Connection, MemoryShopStore, MongoShopStore, ShopStore, DEFAULT_SHOP_MESSAGE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Environment {
    Local,
    Production,
}

#[derive(Parser, Debug)]
struct Args {
    /// Database URI and Name
    #[arg(
        long,
        env = "DATABASE_URI",
        default_value = "mongodb://localhost:27017"
    )]
    database_uri: String,
    #[arg(long, env = "DATABASE_NAME", default_value = "shopify-post-purchase")]
    database_name: String,
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
    /// Environment
    #[arg(long, env = "ENVIRONMENT", value_enum, default_value_t = Environment::Local)]
    environment: Environment,
    /// Checkout page reads the shop's saved message instead of the default one
    #[arg(long, env = "EXTENSION_LIVE_MESSAGE")]
    extension_live_message: bool,
    /// Keep shop records in process memory instead of the database
    #[arg(long, env = "IN_MEMORY")]
    in_memory: bool,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file if local
    dotenv().ok();

    // Parse CLI args, using ENV vars if not provided
    let args = Args::parse();

    // Setup tracing for our API
    // Adds log tracer as the default tracer for the log crate
    LogTracer::init().expect("Failed to set log tracer");
    // Set log level based on env variable
    let env_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .expect("Failed to build log filter");
    let fmt_layer = fmt::layer().with_target(false);
    let subscriber = Registry::default().with(env_layer).with(fmt_layer);
    set_global_default(subscriber).expect("Failed to set global default subscriber");

    // The database is contacted by the first request, not here
    let store: Arc<dyn ShopStore> = if args.in_memory {
        warn!("Using in-memory shop store, records are lost on exit");
        Arc::new(MemoryShopStore::default())
    } else {
        let connection = Connection::new(args.database_uri.clone(), args.database_name.clone());
        Arc::new(MongoShopStore::new(connection))
    };

    // Set api config
    let config = Config {
        store,
        extension: ExtensionConfig {
            live_message: args.extension_live_message,
            static_message: DEFAULT_SHOP_MESSAGE.to_string(),
        },
    };

    // Create and run http server
    let environment = args.environment;
    let binding = match environment {
        Environment::Local => ("127.0.0.1", args.port),
        Environment::Production => ("0.0.0.0", args.port),
    };
    info!("Server listening on http://{}:{}", binding.0, binding.1);

    HttpServer::new(move || {
        // The checkout extension calls in from the storefront's own origin
        let cors = match environment {
            Environment::Local => Cors::permissive(),
            Environment::Production => Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST"])
                .allow_any_header()
                .max_age(3600),
        };
        App::new()
            .app_data(web::Data::new(config.clone()))
            .wrap(TracingLogger::default())
            .wrap(cors)
            .configure(routes::configure)
    })
    .bind(binding)?
    .run()
    .await
}
