// routes.rs - API routes for shop records and their post-purchase message

use super::admin::{app_page, index_page, install_page};
use super::config::Config;
use super::error::ApiError;
use super::extension::{extension_message, post_purchase, should_render};
use actix_web::{
    get, post,
    web::{self, Bytes, Data, Either, Form, Json, Query, ServiceConfig},
    HttpRequest, HttpResponse,
};
use database::{ShopError, ShopModel, ShopStore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

#[derive(Debug, Deserialize)]
pub struct ShopQuery {
    pub shop: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageForm {
    pub shop: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UninstallPayload {
    shop_domain: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShopView {
    shop_domain: String,
    installed_at: Option<String>,
    message: String,
}

impl From<ShopModel> for ShopView {
    fn from(shop: ShopModel) -> Self {
        Self {
            shop_domain: shop.shop_domain,
            installed_at: shop.installed_at.try_to_rfc3339_string().ok(),
            message: shop.message,
        }
    }
}

// Blank and whitespace-only values count as missing
pub fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

// Unparseable query strings are treated as a missing shop
pub fn shop_param(req: &HttpRequest) -> Option<String> {
    let query = Query::<ShopQuery>::from_query(req.query_string()).ok()?;
    present(&query.shop).map(str::to_string)
}

// Get-or-create where losing a concurrent create to another request is fine
pub async fn ensure_record(store: &dyn ShopStore, shop_domain: &str) -> Result<(), ApiError> {
    match store.ensure_shop(shop_domain).await {
        Ok(_) => Ok(()),
        Err(ShopError::Conflict(_)) => {
            debug!("Shop created concurrently: {}", shop_domain);
            Ok(())
        }
        Err(e) => {
            error!("Error ensuring shop {}: {}", shop_domain, e);
            Err(e.into())
        }
    }
}

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        warn!("Rejected query string: {}", err);
        ApiError::BadRequest("Invalid query string").into()
    }))
    // Registered ahead of the /api scope, which would otherwise claim the path
    .service(extension_message)
    .service(web::scope("/api").configure(message_routes))
    .configure(message_routes)
    .service(app_uninstalled)
    .service(index_page)
    .service(install_page)
    .service(auth_callback)
    .service(health)
    .service(app_page)
    .service(should_render)
    .service(post_purchase);
}

// Mounted both at the root and under /api
fn message_routes(cfg: &mut ServiceConfig) {
    cfg.service(ensure_shop)
        .service(get_message)
        .service(update_message);
}

#[tracing::instrument(
    name = "/ensure-shop - Creates the shop record if it does not exist",
    skip(config, req)
)]
#[get("/ensure-shop")]
pub async fn ensure_shop(config: Data<Config>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let Some(shop_domain) = shop_param(&req) else {
        warn!("No shop provided, nothing to ensure");
        return Ok(HttpResponse::Ok().finish());
    };

    match config.store.ensure_shop(&shop_domain).await {
        Ok(shop) => {
            info!("Shop ensured: {}", shop.shop_domain);
            Ok(HttpResponse::Ok().finish())
        }
        Err(e) => {
            error!("Error ensuring shop {}: {}", shop_domain, e);
            Err(e.into())
        }
    }
}

#[tracing::instrument(
    name = "/message - Returns the saved message for a shop",
    skip(config, req)
)]
#[get("/message")]
pub async fn get_message(config: Data<Config>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let Some(shop_domain) = shop_param(&req) else {
        debug!("No shop provided, returning empty message");
        return Ok(HttpResponse::Ok().json(MessageBody {
            message: String::new(),
        }));
    };

    match config.store.get_message(&shop_domain).await {
        Ok(message) => Ok(HttpResponse::Ok().json(MessageBody { message })),
        Err(e) => {
            error!("Error fetching message for {}: {}", shop_domain, e);
            Err(e.into())
        }
    }
}

#[tracing::instrument(
    name = "/message - Updates the post-purchase message for a shop",
    skip(config, payload)
)]
#[post("/message")]
pub async fn update_message(
    config: Data<Config>,
    payload: Result<Either<Json<MessageForm>, Form<MessageForm>>, actix_web::Error>,
) -> Result<HttpResponse, ApiError> {
    // Bodies that are neither JSON nor form data get the same answer as missing fields
    let form = match payload {
        Ok(Either::Left(Json(form))) => form,
        Ok(Either::Right(Form(form))) => form,
        Err(e) => {
            warn!("Unreadable message update body: {}", e);
            return Err(ApiError::BadRequest("Shop and message are required"));
        }
    };

    let shop_domain = present(&form.shop);
    let message = form.message.as_deref().filter(|message| !message.is_empty());
    let (Some(shop_domain), Some(message)) = (shop_domain, message) else {
        warn!("Message update without shop or message");
        return Err(ApiError::BadRequest("Shop and message are required"));
    };

    ensure_record(config.store.as_ref(), shop_domain).await?;

    // An uninstall may still remove the record between the two calls
    match config.store.set_message(shop_domain, message).await {
        Ok(shop) => {
            info!("Message updated for shop: {}", shop.shop_domain);
            Ok(HttpResponse::Ok().json(json!({ "success": true })))
        }
        Err(ShopError::NotFound(_)) => {
            warn!("Shop disappeared before its message was saved: {}", shop_domain);
            Err(ApiError::NotFound)
        }
        Err(e) => {
            error!("Error updating message for {}: {}", shop_domain, e);
            Err(e.into())
        }
    }
}

// Deliveries are at-least-once: a repeated or unusable payload still answers 200
#[tracing::instrument(
    name = "/webhooks/app/uninstalled - Removes the shop record on uninstall",
    skip(config, body)
)]
#[post("/webhooks/app/uninstalled")]
pub async fn app_uninstalled(config: Data<Config>, body: Bytes) -> Result<HttpResponse, ApiError> {
    let payload = serde_json::from_slice::<UninstallPayload>(&body).ok();
    let shop_domain = payload.as_ref().and_then(|payload| present(&payload.shop_domain));

    let Some(shop_domain) = shop_domain else {
        warn!("Uninstall webhook without a shop domain, ignoring");
        return Ok(HttpResponse::Ok().body("No shop domain"));
    };

    match config.store.delete_shop(shop_domain).await {
        Ok(true) => info!("App uninstalled, shop removed: {}", shop_domain),
        Ok(false) => info!("App uninstalled, shop already removed: {}", shop_domain),
        Err(e) => {
            error!("Error removing shop {}: {}", shop_domain, e);
            return Err(ApiError::Internal("Failed to remove shop"));
        }
    }

    Ok(HttpResponse::Ok().body("OK"))
}

#[tracing::instrument(
    name = "/auth/callback - Records the shop once installation completes",
    skip(config)
)]
#[get("/auth/callback")]
pub async fn auth_callback(
    config: Data<Config>,
    query: Query<ShopQuery>,
) -> Result<HttpResponse, ApiError> {
    let Some(shop_domain) = present(&query.shop) else {
        return Err(ApiError::BadRequest("Shop parameter is required"));
    };

    let shop = match config.store.find_shop(shop_domain).await {
        Ok(Some(shop)) => {
            info!("Shop already installed: {}", shop_domain);
            shop
        }
        Ok(None) => match config.store.ensure_shop(shop_domain).await {
            Ok(shop) => {
                info!("New shop installed: {}", shop_domain);
                shop
            }
            Err(e) => {
                error!("Error installing shop {}: {}", shop_domain, e);
                return Err(ApiError::Internal("Installation failed"));
            }
        },
        Err(e) => {
            error!("Error looking up shop {}: {}", shop_domain, e);
            return Err(ApiError::Internal("Installation failed"));
        }
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "shop": ShopView::from(shop),
    })))
}

#[tracing::instrument(name = "/health - Reports process and database state", skip(config))]
#[get("/health")]
pub async fn health(config: Data<Config>) -> HttpResponse {
    let database = if config.store.is_connected().await {
        "connected"
    } else {
        "disconnected"
    };

    HttpResponse::Ok().json(json!({ "status": "ok", "database": database }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{config, failing, Failure};
    use actix_web::{
        http::{header::ContentType, StatusCode},
        test, App,
    };
    use database::{MemoryShopStore, DEFAULT_SHOP_MESSAGE};
    use serde_json::Value;
    use std::sync::Arc;

    const SHOP: &str = "a.myshopify.com";

    #[actix_web::test]
    async fn posted_message_is_returned() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(Arc::new(MemoryShopStore::default()))))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/message")
            .set_json(json!({ "shop": SHOP, "message": "Hi!" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "success": true }));

        let req = test::TestRequest::get()
            .uri("/message?shop=a.myshopify.com")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "message": "Hi!" }));
    }

    #[actix_web::test]
    async fn form_posts_update_the_message() {
        let store = Arc::new(MemoryShopStore::default());
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(store.clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/message")
            .set_form([("shop", SHOP), ("message", "See you soon")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        assert_eq!(store.get_message(SHOP).await.unwrap(), "See you soon");
    }

    #[actix_web::test]
    async fn later_post_overwrites_message() {
        let store = Arc::new(MemoryShopStore::default());
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(store.clone())))
                .configure(configure),
        )
        .await;

        for message in ["First", "Second"] {
            let req = test::TestRequest::post()
                .uri("/message")
                .set_json(json!({ "shop": SHOP, "message": message }))
                .to_request();
            assert!(test::call_service(&app, req).await.status().is_success());
        }

        assert_eq!(store.get_message(SHOP).await.unwrap(), "Second");
    }

    #[actix_web::test]
    async fn post_without_message_is_rejected() {
        let store = Arc::new(MemoryShopStore::default());
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(store.clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/message")
            .set_json(json!({ "shop": SHOP }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Shop and message are required"));

        assert!(store.find_shop(SHOP).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn unreadable_bodies_get_json_errors() {
        let store = Arc::new(MemoryShopStore::default());
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(store.clone())))
                .configure(configure),
        )
        .await;

        let requests = [
            test::TestRequest::post().uri("/message"),
            test::TestRequest::post()
                .uri("/message")
                .insert_header(ContentType::json())
                .set_payload("{not json"),
            test::TestRequest::post()
                .uri("/message")
                .set_json(json!({ "shop": 1, "message": "Hi!" })),
            test::TestRequest::post()
                .uri("/message")
                .set_json(json!({ "message": "Hi!" })),
        ];

        for req in requests {
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(
                body,
                json!({ "success": false, "error": "Shop and message are required" })
            );
        }

        assert!(store.list_shops().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn repeated_shop_param_is_treated_as_missing() {
        let store = Arc::new(MemoryShopStore::default());
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(store.clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/ensure-shop?shop=a.myshopify.com&shop=b.myshopify.com")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(store.list_shops().await.unwrap().is_empty());

        let req = test::TestRequest::get()
            .uri("/message?shop=a.myshopify.com&shop=b.myshopify.com")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "message": "" }));
    }

    #[actix_web::test]
    async fn message_without_shop_is_empty() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(Arc::new(MemoryShopStore::default()))))
                .configure(configure),
        )
        .await;

        for uri in ["/message", "/message?shop=", "/message?shop=unknown.myshopify.com"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body, json!({ "message": "" }), "{uri}");
        }
    }

    #[actix_web::test]
    async fn ensured_shop_reads_default_message() {
        let store = Arc::new(MemoryShopStore::default());
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(store.clone())))
                .configure(configure),
        )
        .await;

        for _ in 0..2 {
            let req = test::TestRequest::get()
                .uri("/api/ensure-shop?shop=a.myshopify.com")
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert!(test::read_body(resp).await.is_empty());
        }

        let req = test::TestRequest::get()
            .uri("/api/message?shop=a.myshopify.com")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], json!(DEFAULT_SHOP_MESSAGE));
        assert_eq!(store.list_shops().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn ensure_without_shop_does_nothing() {
        let store = Arc::new(MemoryShopStore::default());
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(store.clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/ensure-shop").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        assert!(store.list_shops().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn ensure_race_is_a_conflict() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(failing(Failure::Conflict))))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/ensure-shop?shop=a.myshopify.com")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn vanished_shop_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(failing(Failure::NotFound))))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/message")
            .set_json(json!({ "shop": SHOP, "message": "Hi!" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], json!("Shop not found"));
    }

    #[actix_web::test]
    async fn database_failures_are_generic_errors() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(failing(Failure::Unreachable))))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/message?shop=a.myshopify.com")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], json!("Internal Server Error"));

        let req = test::TestRequest::post()
            .uri("/webhooks/app/uninstalled")
            .set_json(json!({ "shop_domain": SHOP }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn repeated_uninstall_succeeds() {
        let store = Arc::new(MemoryShopStore::default());
        store.ensure_shop(SHOP).await.unwrap();
        store.set_message(SHOP, "Custom").await.unwrap();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(store.clone())))
                .configure(configure),
        )
        .await;

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/webhooks/app/uninstalled")
                .set_json(json!({ "shop_domain": SHOP }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri("/api/extension/message?shop=a.myshopify.com")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "message": "Thank you for your purchase!" }));
    }

    #[actix_web::test]
    async fn malformed_uninstall_is_acknowledged() {
        let store = Arc::new(MemoryShopStore::default());
        store.ensure_shop(SHOP).await.unwrap();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(store.clone())))
                .configure(configure),
        )
        .await;

        let payloads: [&[u8]; 3] = [b"not json", b"{}", br#"{"shop_domain":""}"#];
        for payload in payloads {
            let req = test::TestRequest::post()
                .uri("/webhooks/app/uninstalled")
                .set_payload(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(test::read_body(resp).await, "No shop domain");
        }

        assert!(store.find_shop(SHOP).await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn auth_callback_installs_shop() {
        let store = Arc::new(MemoryShopStore::default());
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(store.clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/auth/callback").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/auth/callback?shop=a.myshopify.com")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["shop"]["shopDomain"], json!(SHOP));
        assert_eq!(body["shop"]["message"], json!(DEFAULT_SHOP_MESSAGE));
        assert!(body["shop"]["installedAt"].is_string());

        assert!(store.find_shop(SHOP).await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn health_reports_store_state() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(Arc::new(MemoryShopStore::default()))))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "status": "ok", "database": "connected" }));

        let app = test::init_service(
            App::new()
                .app_data(Data::new(config(failing(Failure::Unreachable))))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["database"], json!("disconnected"));
    }

    #[actix_web::test]
    async fn blank_values_are_missing() {
        assert_eq!(present(&None), None);
        assert_eq!(present(&Some("  ".to_string())), None);
        assert_eq!(present(&Some(" a.myshopify.com ".to_string())), Some("a.myshopify.com"));
    }
}
