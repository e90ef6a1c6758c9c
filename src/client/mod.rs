//! HTTP client for the storefront REST API.
//!
//! Reads degrade gracefully: when `fallback_on_read_error` is set, a failed
//! product or banner read returns the built-in sample data (orders return an
//! empty list) so the shop stays populated while the API is down. Writes,
//! status changes, auth and uploads always surface their errors, since a
//! failed write must never look like a success.

mod fallback;

use async_trait::async_trait;
use rust_decimal::Decimal;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use validator::Validate;
use crate::catalog::{CatalogParams, ProductFilter};
use crate::checkout::OrderSink;
use crate::config::ShopSettings;
use crate::{
    Address, AdminLoginRequest, BannerPatch, LoginRequest, MarketingBanner, NewBanner, NewOrder, NewProduct, Order,
    OrderStatus, Product, ProductPatch, SignupRequest, StatusUpdate, StoreStats, UploadResponse, User,
    validation_message,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

/// Errors that can occur when talking to the storefront API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request could not be sent or the connection failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status.
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Parse error: {0}")]
    Parse(String),

    /// Payload rejected locally; nothing was sent.
    #[error("{0}")]
    Validation(String),
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub fallback_on_read_error: bool,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), fallback_on_read_error: true, timeout: Duration::from_secs(10) }
    }
}

impl ClientConfig {
    /// Reads `STOREFRONT_API_BASE`, falling back to the local dev server.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(base) = std::env::var("STOREFRONT_API_BASE").ok().filter(|v| !v.trim().is_empty()) {
            config.base_url = base.trim().trim_end_matches('/').to_string();
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_on_read_error = enabled;
        self
    }
}

/// Storefront API client. Cheap to clone.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    config: ClientConfig,
}

impl CatalogClient {
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { inner: Arc::new(CatalogClientInner { client, config }) })
    }

    pub fn config(&self) -> &ClientConfig { &self.inner.config }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        let result = self.get("/api/products").await;
        self.read_or("products", result, fallback::products)
    }

    /// Server-side shop filtering. The fallback applies the same filter locally.
    pub async fn search_products(&self, params: &CatalogParams) -> Result<Vec<Product>, ClientError> {
        let url = self.url("/api/products");
        let result = match self.inner.client.get(&url).query(params).send().await {
            Ok(response) => self.handle_response(response).await,
            Err(e) => Err(e.into()),
        };
        self.read_or("products", result, || {
            let all = fallback::products();
            let filter = ProductFilter::from_params(params, ShopSettings::default().sale_threshold);
            filter.apply(&all).into_iter().cloned().collect()
        })
    }

    /// `Ok(None)` when the product does not exist.
    pub async fn get_product(&self, id: &str) -> Result<Option<Product>, ClientError> {
        match self.get(&format!("/api/products/{id}")).await {
            Ok(product) => Ok(Some(product)),
            Err(ClientError::Status { status: 404, .. }) => Ok(None),
            Err(e) if self.inner.config.fallback_on_read_error => {
                tracing::warn!(error = %e, product_id = %id, "using fallback product");
                Ok(fallback::product(id))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, ClientError> {
        product.validate().map_err(|e| ClientError::Validation(validation_message(&e)))?;
        self.post("/api/products", product).await
    }

    /// Fields present in the patch are checked locally; the merged product is
    /// validated again by the API.
    pub async fn update_product(&self, id: &str, patch: &ProductPatch) -> Result<Product, ClientError> {
        check_product_patch(patch)?;
        self.put(&format!("/api/products/{id}"), patch).await
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&format!("/api/products/{id}")).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    pub async fn list_orders(&self) -> Result<Vec<Order>, ClientError> {
        let result = self.get("/api/orders").await;
        self.read_or("orders", result, Vec::new)
    }

    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, ClientError> {
        self.post("/api/orders", order).await
    }

    pub async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<(), ClientError> {
        let url = self.url(&format!("/api/orders/{id}/status"));
        let response = self.inner.client.patch(&url).json(&StatusUpdate { status }).send().await?;
        self.expect_success(response).await
    }

    // =========================================================================
    // Banners
    // =========================================================================

    pub async fn list_banners(&self) -> Result<Vec<MarketingBanner>, ClientError> {
        let result = self.get("/api/banners").await;
        self.read_or("banners", result, fallback::banners)
    }

    pub async fn create_banner(&self, banner: &NewBanner) -> Result<MarketingBanner, ClientError> {
        banner.validate().map_err(|e| ClientError::Validation(validation_message(&e)))?;
        self.post("/api/banners", banner).await
    }

    pub async fn update_banner(&self, id: &str, patch: &BannerPatch) -> Result<MarketingBanner, ClientError> {
        if is_blank(&patch.title) { return Err(ClientError::Validation("Title is required".into())); }
        if is_blank(&patch.image_url) { return Err(ClientError::Validation("Image URL is required".into())); }
        self.put(&format!("/api/banners/{id}"), patch).await
    }

    pub async fn delete_banner(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&format!("/api/banners/{id}")).await
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    pub async fn signup(&self, request: &SignupRequest) -> Result<User, ClientError> {
        self.post("/api/auth/signup", request).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        self.post("/api/auth/login", &LoginRequest { email: email.into(), password: password.into() }).await
    }

    /// `identifier` is the admin's email or username.
    pub async fn admin_login(&self, identifier: &str, password: &str) -> Result<User, ClientError> {
        self.post("/api/admins/login", &AdminLoginRequest { identifier: identifier.into(), password: password.into() }).await
    }

    pub async fn update_address(&self, user_id: &str, address: &Address) -> Result<User, ClientError> {
        self.put(&format!("/api/users/{user_id}/address"), address).await
    }

    // =========================================================================
    // Uploads and back office
    // =========================================================================

    pub async fn upload_image(&self, product_name: &str, file_name: &str, bytes: Vec<u8>) -> Result<String, ClientError> {
        self.upload("/api/upload/image", product_name, file_name, bytes).await
    }

    pub async fn upload_model(&self, product_name: &str, file_name: &str, bytes: Vec<u8>) -> Result<String, ClientError> {
        self.upload("/api/upload/model", product_name, file_name, bytes).await
    }

    pub async fn stats(&self) -> Result<StoreStats, ClientError> {
        self.get("/api/admin/stats").await
    }

    async fn upload(&self, path: &str, product_name: &str, file_name: &str, bytes: Vec<u8>) -> Result<String, ClientError> {
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        let response = self.inner.client
            .post(self.url(path))
            .query(&[("productName", product_name)])
            .multipart(form)
            .send()
            .await?;
        let uploaded: UploadResponse = self.handle_response(response).await?;
        Ok(uploaded.url)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    fn url(&self, path: &str) -> String { format!("{}{path}", self.inner.config.base_url) }

    fn read_or<T>(&self, what: &str, result: Result<T, ClientError>, fallback: impl FnOnce() -> T) -> Result<T, ClientError> {
        match result {
            Ok(value) => Ok(value),
            Err(e) if self.inner.config.fallback_on_read_error => {
                tracing::warn!(error = %e, "using fallback {what}");
                Ok(fallback())
            }
            Err(e) => Err(e),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.inner.client.get(self.url(path)).send().await?;
        self.handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        let response = self.inner.client.post(self.url(path)).json(body).send().await?;
        self.handle_response(response).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        let response = self.inner.client.put(self.url(path)).json(body).send().await?;
        self.handle_response(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self.inner.client.delete(self.url(path)).send().await?;
        self.expect_success(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, ClientError> {
        if response.status().is_success() {
            return response.json().await.map_err(|e| ClientError::Parse(format!("Failed to parse response: {e}")));
        }
        Err(parse_error(response).await)
    }

    async fn expect_success(&self, response: reqwest::Response) -> Result<(), ClientError> {
        if response.status().is_success() { Ok(()) } else { Err(parse_error(response).await) }
    }
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| v.trim().is_empty())
}

fn check_product_patch(patch: &ProductPatch) -> Result<(), ClientError> {
    let invalid = |message: &str| -> Result<(), ClientError> { Err(ClientError::Validation(message.to_string())) };
    if is_blank(&patch.name) { return invalid("Product name is required"); }
    if patch.price.is_some_and(|p| p < Decimal::ZERO) { return invalid("Price cannot be negative"); }
    if patch.stock.is_some_and(|s| s < 0) { return invalid("Stock cannot be negative"); }
    if is_blank(&patch.image_url) { return invalid("Image URL is required"); }
    Ok(())
}

/// Turns an error response into a [`ClientError`], preferring the API's `{"error": ...}` message.
async fn parse_error(response: reqwest::Response) -> ClientError {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED { return ClientError::InvalidCredentials; }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(text);
    ClientError::Status { status: status.as_u16(), message }
}

#[async_trait]
impl OrderSink for CatalogClient {
    async fn submit_order(&self, order: &NewOrder) -> Result<Order, ClientError> {
        self.create_order(order).await
    }
}
