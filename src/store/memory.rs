use async_trait::async_trait;
use tokio::sync::RwLock;
use super::{AccountStore, AdminRecord, CatalogStore, StoreError, StoreResult, UserRecord};
use crate::{Address, MarketingBanner, Order, OrderStatus, Product};

/// In-process store. Collections keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

#[derive(Debug, Default)]
struct Collections {
    products: Vec<Product>,
    orders: Vec<Order>,
    banners: Vec<MarketingBanner>,
    users: Vec<UserRecord>,
    admins: Vec<AdminRecord>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Store pre-populated with the given products and banners.
    pub fn seeded(products: Vec<Product>, banners: Vec<MarketingBanner>) -> Self {
        Self { inner: RwLock::new(Collections { products, banners, ..Default::default() }) }
    }
}

fn replace<T>(items: &mut [T], id: &str, key: impl Fn(&T) -> &str, value: &T) -> bool
where
    T: Clone,
{
    match items.iter_mut().find(|i| key(i) == id) {
        Some(slot) => { *slot = value.clone(); true }
        None => false,
    }
}

fn remove<T>(items: &mut Vec<T>, id: &str, key: impl Fn(&T) -> &str) -> bool {
    let before = items.len();
    items.retain(|i| key(i) != id);
    items.len() != before
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(&self) -> StoreResult<Vec<Product>> { Ok(self.inner.read().await.products.clone()) }

    async fn find_product(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.inner.read().await.products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.products.iter().any(|p| p.id == product.id) { return Err(StoreError::Duplicate(format!("product {}", product.id))); }
        inner.products.push(product.clone());
        Ok(())
    }

    async fn replace_product(&self, product: &Product) -> StoreResult<bool> {
        Ok(replace(&mut self.inner.write().await.products, &product.id, |p| p.id.as_str(), product))
    }

    async fn delete_product(&self, id: &str) -> StoreResult<bool> {
        Ok(remove(&mut self.inner.write().await.products, id, |p| p.id.as_str()))
    }

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        // Later inserts win ties on equal timestamps.
        let mut orders: Vec<Order> = self.inner.read().await.orders.iter().rev().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn find_order(&self, id: &str) -> StoreResult<Option<Order>> {
        Ok(self.inner.read().await.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.orders.iter().any(|o| o.id == order.id) { return Err(StoreError::Duplicate(format!("order {}", order.id))); }
        inner.orders.push(order.clone());
        Ok(())
    }

    async fn set_order_status(&self, id: &str, status: OrderStatus) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.orders.iter_mut().find(|o| o.id == id).map(|o| o.status = status).is_some())
    }

    async fn list_banners(&self) -> StoreResult<Vec<MarketingBanner>> { Ok(self.inner.read().await.banners.clone()) }

    async fn find_banner(&self, id: &str) -> StoreResult<Option<MarketingBanner>> {
        Ok(self.inner.read().await.banners.iter().find(|b| b.id == id).cloned())
    }

    async fn insert_banner(&self, banner: &MarketingBanner) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.banners.iter().any(|b| b.id == banner.id) { return Err(StoreError::Duplicate(format!("banner {}", banner.id))); }
        inner.banners.push(banner.clone());
        Ok(())
    }

    async fn replace_banner(&self, banner: &MarketingBanner) -> StoreResult<bool> {
        Ok(replace(&mut self.inner.write().await.banners, &banner.id, |b| b.id.as_str(), banner))
    }

    async fn delete_banner(&self, id: &str) -> StoreResult<bool> {
        Ok(remove(&mut self.inner.write().await.banners, id, |b| b.id.as_str()))
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert_user(&self, user: &UserRecord) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == user.email) { return Err(StoreError::Duplicate(format!("email {}", user.email))); }
        inner.users.push(user.clone());
        Ok(())
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.inner.read().await.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.inner.read().await.users.iter().find(|u| u.email == email).cloned())
    }

    async fn set_user_address(&self, id: &str, address: &Address) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.iter_mut().find(|u| u.id == id).map(|u| u.address = Some(address.clone())).is_some())
    }

    async fn find_admin(&self, identifier: &str) -> StoreResult<Option<AdminRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.admins.iter().find(|a| a.email.eq_ignore_ascii_case(identifier) || a.username.eq_ignore_ascii_case(identifier)).cloned())
    }

    async fn upsert_admin(&self, admin: &AdminRecord) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.admins.iter().any(|a| a.email == admin.email) { inner.admins.push(admin.clone()); }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CartItem, Dimensions};
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    fn order(id: &str, minutes_ago: i64) -> Order {
        let product = Product {
            id: "p".into(), name: "Sofa".into(), description: String::new(), price: Decimal::ONE, category: String::new(), stock: 1,
            image_url: String::new(), images: vec![], ar_model_url: String::new(), dimensions: Dimensions::default(),
            is_featured: false, is_new_arrival: false, created_at: Utc::now(),
        };
        Order {
            id: id.into(), user_id: "u".into(), customer_name: "C".into(), recipient_name: "R".into(), contact_number: "1".into(),
            items: vec![CartItem { product, quantity: 1 }], total_amount: Decimal::ONE, shipping_address: None,
            status: OrderStatus::Pending, created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_orders_newest_first() {
        let store = MemoryStore::new();
        store.insert_order(&order("old", 30)).await.unwrap();
        store.insert_order(&order("new", 1)).await.unwrap();
        store.insert_order(&order("mid", 10)).await.unwrap();
        let ids: Vec<_> = store.list_orders().await.unwrap().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        assert!(store.set_order_status("mid", OrderStatus::Shipped).await.unwrap());
        assert!(!store.set_order_status("ghost", OrderStatus::Shipped).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        let user = UserRecord {
            id: "1".into(), email: "a@b.ph".into(), password_hash: "h".into(), fname: "A".into(), mname: String::new(),
            lname: "B".into(), contact_number: String::new(), address: None, created_at: Utc::now(),
        };
        store.insert_user(&user).await.unwrap();
        let again = UserRecord { id: "2".into(), ..user };
        assert!(matches!(store.insert_user(&again).await, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_admin_lookup_by_email_or_username() {
        let store = MemoryStore::new();
        let admin = AdminRecord {
            id: "a1".into(), email: "admin@arfurniture.com".into(), username: "admin".into(), password_hash: "h".into(),
            fname: "Store".into(), mname: String::new(), lname: "Admin".into(),
        };
        store.upsert_admin(&admin).await.unwrap();
        store.upsert_admin(&AdminRecord { id: "a2".into(), ..admin.clone() }).await.unwrap();
        assert_eq!(store.find_admin("ADMIN").await.unwrap().map(|a| a.id), Some("a1".into()));
        assert!(store.find_admin("admin@arfurniture.com").await.unwrap().is_some());
        assert!(store.find_admin("nobody").await.unwrap().is_none());
    }
}
