// admin.rs - install, landing and message editor pages for merchants

use super::config::Config;
use super::error::ApiError;
use super::routes::{ensure_record, present, ShopQuery};
use actix_web::{
    get,
    http::header::ContentType,
    web::{Data, Query},
    HttpResponse,
};
use askama::Template;
use tracing::{error, info};

// Linked from the landing page when no shop is at hand
const DEMO_SHOP: &str = "example-store.myshopify.com";

#[derive(Template)]
#[template(path = "admin.html")]
struct AdminPage<'a> {
    shop: &'a str,
    message: &'a str,
}

#[derive(Template)]
#[template(path = "install.html")]
struct InstallPage<'a> {
    shop: &'a str,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexPage<'a> {
    shop: &'a str,
}

fn html(page: &impl Template) -> Result<HttpResponse, ApiError> {
    let body = page.render().map_err(|e| {
        error!("Error rendering page: {}", e);
        ApiError::Internal("Failed to render page")
    })?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(body))
}

#[get("/")]
pub async fn index_page() -> Result<HttpResponse, ApiError> {
    html(&IndexPage { shop: DEMO_SHOP })
}

// Stand-in for the platform's OAuth redirect: confirming calls /auth/callback
#[tracing::instrument(name = "/auth - Renders the install confirmation page")]
#[get("/auth")]
pub async fn install_page(query: Query<ShopQuery>) -> Result<HttpResponse, ApiError> {
    let Some(shop_domain) = present(&query.shop) else {
        return Err(ApiError::BadRequest("Shop parameter is required"));
    };

    html(&InstallPage { shop: shop_domain })
}

// The shop comes from the authenticated admin session, never from a form field
#[tracing::instrument(name = "/app - Renders the post-purchase message editor", skip(config))]
#[get("/app")]
pub async fn app_page(
    config: Data<Config>,
    query: Query<ShopQuery>,
) -> Result<HttpResponse, ApiError> {
    let Some(shop_domain) = present(&query.shop) else {
        return Err(ApiError::BadRequest("Shop parameter is required"));
    };

    ensure_record(config.store.as_ref(), shop_domain).await?;

    let message = match config.store.get_message(shop_domain).await {
        Ok(message) => message,
        Err(e) => {
            error!("Error fetching message for {}: {}", shop_domain, e);
            return Err(e.into());
        }
    };

    info!("Editor opened for shop: {}", shop_domain);
    html(&AdminPage {
        shop: shop_domain,
        message: &message,
    })
}
