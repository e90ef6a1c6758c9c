//! Catalog and account persistence.
//!
//! The REST API only talks to these traits. `PgStore` is the production
//! backend; `MemoryStore` backs local runs without a database and the tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::{Address, MarketingBanner, Order, OrderStatus, Product, User, UserRole};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {0}")]
    Duplicate(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Products, orders and banners. Writes are last-write-wins.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self) -> StoreResult<Vec<Product>>;
    async fn find_product(&self, id: &str) -> StoreResult<Option<Product>>;
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;
    /// Returns `false` when no product has that id.
    async fn replace_product(&self, product: &Product) -> StoreResult<bool>;
    async fn delete_product(&self, id: &str) -> StoreResult<bool>;

    /// Newest first.
    async fn list_orders(&self) -> StoreResult<Vec<Order>>;
    async fn find_order(&self, id: &str) -> StoreResult<Option<Order>>;
    async fn insert_order(&self, order: &Order) -> StoreResult<()>;
    async fn set_order_status(&self, id: &str, status: OrderStatus) -> StoreResult<bool>;

    async fn list_banners(&self) -> StoreResult<Vec<MarketingBanner>>;
    async fn find_banner(&self, id: &str) -> StoreResult<Option<MarketingBanner>>;
    async fn insert_banner(&self, banner: &MarketingBanner) -> StoreResult<()>;
    async fn replace_banner(&self, banner: &MarketingBanner) -> StoreResult<bool>;
    async fn delete_banner(&self, id: &str) -> StoreResult<bool>;
}

/// Customer and admin accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert_user(&self, user: &UserRecord) -> StoreResult<()>;
    async fn find_user(&self, id: &str) -> StoreResult<Option<UserRecord>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;
    async fn set_user_address(&self, id: &str, address: &Address) -> StoreResult<bool>;

    /// Looks an admin up by email or username.
    async fn find_admin(&self, identifier: &str) -> StoreResult<Option<AdminRecord>>;
    /// Inserts the admin unless one with the same email already exists.
    async fn upsert_admin(&self, admin: &AdminRecord) -> StoreResult<()>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub fname: String,
    pub mname: String,
    pub lname: String,
    pub contact_number: String,
    pub address: Option<Address>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRecord {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub fname: String,
    pub mname: String,
    pub lname: String,
}

/// "First Middle Last" with empty parts skipped.
pub fn display_name(fname: &str, mname: &str, lname: &str) -> String {
    [fname, mname, lname].iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ")
}

impl UserRecord {
    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(), name: display_name(&self.fname, &self.mname, &self.lname), email: self.email.clone(),
            role: UserRole::Customer, username: None, contact_number: self.contact_number.clone(), address: self.address.clone(),
        }
    }
}

impl AdminRecord {
    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(), name: display_name(&self.fname, &self.mname, &self.lname), email: self.email.clone(),
            role: UserRole::Admin, username: Some(self.username.clone()), contact_number: String::new(), address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_skips_blank_parts() {
        assert_eq!(display_name("Store", "", "Admin"), "Store Admin");
        assert_eq!(display_name("Jose", "P.", "Rizal"), "Jose P. Rizal");
    }
}
