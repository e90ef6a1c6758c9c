//! REST API over the catalog store.

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use crate::auth::AuthError;
use crate::config::ShopSettings;
use crate::domain::DomainEvent;
use crate::store::{AccountStore, CatalogStore};
use crate::StorefrontError;

mod accounts;
mod admin;
mod banners;
mod orders;
mod products;
mod upload;

/// 3D models are far larger than axum's default body limit.
const UPLOAD_BODY_LIMIT: usize = 64 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub nats: Option<async_nats::Client>,
    pub shop: ShopSettings,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CatalogStore>, accounts: Arc<dyn AccountStore>, shop: ShopSettings, upload_dir: PathBuf) -> Self {
        Self { catalog, accounts, nats: None, shop, upload_dir }
    }

    pub fn with_nats(mut self, nats: Option<async_nats::Client>) -> Self {
        self.nats = nats;
        self
    }

    /// Best effort: a failed publish is logged and never fails the request.
    pub async fn publish(&self, event: DomainEvent) {
        tracing::debug!(subject = event.subject(), ?event, "domain event");
        let Some(nats) = &self.nats else { return };
        let payload = match serde_json::to_vec(&event) {
            Ok(p) => p,
            Err(e) => { tracing::warn!(error = %e, "failed to encode domain event"); return; }
        };
        if let Err(e) = nats.publish(event.subject().to_string(), payload.into()).await {
            tracing::warn!(error = %e, subject = event.subject(), "failed to publish domain event");
        }
    }
}

pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(state.upload_dir.join("products"));
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "arfurniture"})) }))
        .route("/api/auth/signup", post(accounts::signup))
        .route("/api/auth/login", post(accounts::login))
        .route("/api/admins/login", post(accounts::admin_login))
        .route("/api/users/:id/address", put(accounts::update_address))
        .route("/api/products", get(products::list_products).post(products::create_product))
        .route("/api/products/:id", get(products::get_product).put(products::update_product).delete(products::delete_product))
        .route("/api/orders", get(orders::list_orders).post(orders::create_order))
        .route("/api/orders/:id", get(orders::get_order))
        .route("/api/orders/:id/status", patch(orders::update_status))
        .route("/api/banners", get(banners::list_banners).post(banners::create_banner))
        .route("/api/banners/:id", put(banners::update_banner).delete(banners::delete_banner))
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/upload/image", post(upload::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)))
        .route("/api/upload/model", post(upload::upload_model).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)))
        .nest_service("/products", assets)
        .with_state(state)
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::ProductNotFound | Self::OrderNotFound | Self::BannerNotFound | Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::Auth(err) => match err {
                AuthError::MissingFields => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::PasswordHash | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Storage(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "Internal error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
