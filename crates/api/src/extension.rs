// extension.rs - buyer-facing surface for the post-purchase checkout step
//
// Nothing here answers with an error status. Every failure degrades to a
// fallback message so checkout never shows a broken page.

use super::config::Config;
use super::routes::{shop_param, MessageBody};
use actix_web::{
    get,
    http::header::ContentType,
    route,
    web::Data,
    HttpRequest, HttpResponse,
};
use askama::Template;
use database::ShopStore;
use serde_json::json;
use tracing::{debug, error, warn};

pub const FALLBACK_MESSAGE: &str = "Thank you for your purchase!";

// Shown when the host does not say which shop is rendering
const PREVIEW_SHOP: &str = "example-store.myshopify.com";

#[derive(Template)]
#[template(path = "post_purchase.html")]
struct PostPurchasePage<'a> {
    shop: &'a str,
    message: &'a str,
}

pub async fn resolve_message(store: &dyn ShopStore, shop_domain: Option<&str>) -> String {
    let Some(shop_domain) = shop_domain else {
        debug!("No shop provided, using fallback message");
        return FALLBACK_MESSAGE.to_string();
    };

    match store.find_shop(shop_domain).await {
        Ok(Some(shop)) => shop.message,
        Ok(None) => {
            debug!("Unknown shop {}, using fallback message", shop_domain);
            FALLBACK_MESSAGE.to_string()
        }
        Err(e) => {
            warn!("Error fetching extension message for {}: {}", shop_domain, e);
            FALLBACK_MESSAGE.to_string()
        }
    }
}

#[tracing::instrument(
    name = "/api/extension/message - Returns the message shown after checkout",
    skip(config, req)
)]
#[get("/api/extension/message")]
pub async fn extension_message(config: Data<Config>, req: HttpRequest) -> HttpResponse {
    let shop_domain = shop_param(&req);
    let message = resolve_message(config.store.as_ref(), shop_domain.as_deref()).await;

    HttpResponse::Ok().json(MessageBody { message })
}

#[route("/extension/should-render", method = "GET", method = "POST")]
pub async fn should_render() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "render": true }))
}

#[tracing::instrument(
    name = "/extension/post-purchase - Renders the thank-you step",
    skip(config, req)
)]
#[get("/extension/post-purchase")]
pub async fn post_purchase(config: Data<Config>, req: HttpRequest) -> HttpResponse {
    let shop_domain = shop_param(&req);

    let message = if config.extension.live_message {
        resolve_message(config.store.as_ref(), shop_domain.as_deref()).await
    } else {
        config.extension.static_message.clone()
    };

    let page = PostPurchasePage {
        shop: shop_domain.as_deref().unwrap_or(PREVIEW_SHOP),
        message: &message,
    };

    match page.render() {
        Ok(body) => HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(body),
        Err(e) => {
            error!("Error rendering post-purchase page: {}", e);
            HttpResponse::Ok()
                .content_type(ContentType::plaintext())
                .body(message)
        }
    }
}
