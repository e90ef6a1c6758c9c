//! ARFurniture Storefront
//!
//! AR-enabled furniture shop: catalog REST API, cart and checkout engine,
//! and the catalog client the shop front end talks through.
//!
//! ## Features
//! - Product catalog with 3D/AR model references
//! - Selective cart checkout with per-order recipient capture
//! - Order management with admin status transitions
//! - Marketing banners
//! - Image and 3D model uploads

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::{Validate, ValidationError};

pub mod api;
pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod client;
pub mod config;
pub mod domain;
pub mod session;
pub mod store;

// =============================================================================
// Core Types
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub stock: i64,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default)]
    pub ar_model_url: String,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_new_arrival: bool,
    pub created_at: DateTime<Utc>,
}

/// Product payload for creation; identity and timestamp are server-assigned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Product name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[validate(custom(function = "non_negative", message = "Price cannot be negative"))]
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i64,
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Image URL is required"))]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default)]
    pub ar_model_url: String,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_new_arrival: bool,
}

/// Partial product update; absent fields keep their stored value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ar_model_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_new_arrival: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub unit: DimensionUnit,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionUnit {
    #[default]
    Cm,
    In,
}

/// A product snapshot plus the quantity held in a cart or an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn id(&self) -> &str { &self.product.id }
    pub fn line_total(&self) -> Decimal { self.product.price * Decimal::from(self.quantity) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub customer_name: String,
    pub recipient_name: String,
    pub contact_number: String,
    pub items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Order payload as submitted by checkout; the store assigns identity, status and timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: String,
    pub customer_name: String,
    pub recipient_name: String,
    pub contact_number: String,
    pub items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = StorefrontError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(StorefrontError::BadRequest(format!("unknown order status: {other}"))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    #[serde(rename = "zipCode")]
    pub zip: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    #[serde(alias = "user")]
    Customer,
    Admin,
}

/// Normalized identity returned by every auth endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

impl User {
    pub fn is_admin(&self) -> bool { self.role == UserRole::Admin }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingBanner {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_text: Option<String>,
    pub button_text: String,
    pub link: String,
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewBanner {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Title is required"))]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Image URL is required"))]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_text: Option<String>,
    #[serde(default = "default_button_text")]
    pub button_text: String,
    #[serde(default = "default_link")]
    pub link: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

fn default_button_text() -> String { "SHOP NOW".to_string() }
fn default_link() -> String { "/".to_string() }
fn default_active() -> bool { true }

// =============================================================================
// Request / Response Payloads
// =============================================================================

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub fname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mname: Option<String>,
    #[serde(default)]
    pub lname: String,
    #[serde(default)]
    pub contact_number: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Back-office dashboard figures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub product_count: usize,
    pub order_count: usize,
    pub pending_orders: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    pub low_stock_products: usize,
}

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Banner not found")]
    BannerNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Auth(#[from] auth::AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] store::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

// =============================================================================
// Validation Helpers
// =============================================================================

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() { Err(ValidationError::new("required")) } else { Ok(()) }
}

fn non_negative(value: &Decimal) -> std::result::Result<(), ValidationError> {
    if *value < Decimal::ZERO { Err(ValidationError::new("range")) } else { Ok(()) }
}

/// First human-readable message from a validation failure, field order stable.
pub fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(name, _)| *name);
    fields
        .into_iter()
        .flat_map(|(name, errs)| errs.iter().map(move |e| (name, e)))
        .map(|(name, e)| e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| format!("{name} is invalid")))
        .next()
        .unwrap_or_else(|| "Invalid input".to_string())
}
