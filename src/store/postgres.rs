use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use super::{AccountStore, AdminRecord, CatalogStore, StoreError, StoreResult, UserRecord};
use crate::{Address, CartItem, Dimensions, MarketingBanner, Order, OrderStatus, Product};

/// Postgres backend. Nested documents (dimensions, order lines, addresses) are JSONB.
#[derive(Clone, Debug)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let db = PgPoolOptions::new().max_connections(10).connect(url).await?;
        Ok(Self { db })
    }

    pub fn from_pool(db: PgPool) -> Self { Self { db } }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String, name: String, description: String, price: Decimal, category: String, stock: i64, image_url: String,
    images: Vec<String>, ar_model_url: String, dimensions: Json<Dimensions>, is_featured: bool, is_new_arrival: bool,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id, name: r.name, description: r.description, price: r.price, category: r.category, stock: r.stock,
            image_url: r.image_url, images: r.images, ar_model_url: r.ar_model_url, dimensions: r.dimensions.0,
            is_featured: r.is_featured, is_new_arrival: r.is_new_arrival, created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String, user_id: String, customer_name: String, recipient_name: String, contact_number: String,
    items: Json<Vec<CartItem>>, total_amount: Decimal, shipping_address: Option<Json<Address>>, status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;
    fn try_from(r: OrderRow) -> StoreResult<Self> {
        let status: OrderStatus = r.status.parse().map_err(|_| StoreError::Corrupt(format!("order {} has status {:?}", r.id, r.status)))?;
        Ok(Order {
            id: r.id, user_id: r.user_id, customer_name: r.customer_name, recipient_name: r.recipient_name,
            contact_number: r.contact_number, items: r.items.0, total_amount: r.total_amount,
            shipping_address: r.shipping_address.map(|a| a.0), status, created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BannerRow {
    id: String, title: String, subtitle: Option<String>, description: String, image_url: String,
    badge_text: Option<String>, button_text: String, link: String, is_active: bool,
}

impl From<BannerRow> for MarketingBanner {
    fn from(r: BannerRow) -> Self {
        MarketingBanner {
            id: r.id, title: r.title, subtitle: r.subtitle, description: r.description, image_url: r.image_url,
            badge_text: r.badge_text, button_text: r.button_text, link: r.link, is_active: r.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String, email: String, password_hash: String, fname: String, mname: String, lname: String,
    contact_number: String, address: Option<Json<Address>>, created_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(r: UserRow) -> Self {
        UserRecord {
            id: r.id, email: r.email, password_hash: r.password_hash, fname: r.fname, mname: r.mname, lname: r.lname,
            contact_number: r.contact_number, address: r.address.map(|a| a.0), created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AdminRow { id: String, email: String, username: String, password_hash: String, fname: String, mname: String, lname: String }

impl From<AdminRow> for AdminRecord {
    fn from(r: AdminRow) -> Self {
        AdminRecord { id: r.id, email: r.email, username: r.username, password_hash: r.password_hash, fname: r.fname, mname: r.mname, lname: r.lname }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, category, stock, image_url, images, ar_model_url, dimensions, is_featured, is_new_arrival, created_at";
const ORDER_COLUMNS: &str = "id, user_id, customer_name, recipient_name, contact_number, items, total_amount, shipping_address, status, created_at";
const BANNER_COLUMNS: &str = "id, title, subtitle, description, image_url, badge_text, button_text, link, is_active";
const USER_COLUMNS: &str = "id, email, password_hash, fname, mname, lname, contact_number, address, created_at";

fn duplicate_or(e: sqlx::Error, what: impl FnOnce() -> String) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(what()),
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at"))
            .fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find_product(&self, id: &str) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id).fetch_optional(&self.db).await?;
        Ok(row.map(Product::from))
    }

    async fn insert_product(&self, p: &Product) -> StoreResult<()> {
        sqlx::query(&format!("INSERT INTO products ({PRODUCT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"))
            .bind(&p.id).bind(&p.name).bind(&p.description).bind(p.price).bind(&p.category).bind(p.stock).bind(&p.image_url)
            .bind(&p.images).bind(&p.ar_model_url).bind(Json(&p.dimensions)).bind(p.is_featured).bind(p.is_new_arrival).bind(p.created_at)
            .execute(&self.db).await.map_err(|e| duplicate_or(e, || format!("product {}", p.id)))?;
        Ok(())
    }

    async fn replace_product(&self, p: &Product) -> StoreResult<bool> {
        let done = sqlx::query("UPDATE products SET name = $2, description = $3, price = $4, category = $5, stock = $6, image_url = $7, images = $8, ar_model_url = $9, dimensions = $10, is_featured = $11, is_new_arrival = $12 WHERE id = $1")
            .bind(&p.id).bind(&p.name).bind(&p.description).bind(p.price).bind(&p.category).bind(p.stock).bind(&p.image_url)
            .bind(&p.images).bind(&p.ar_model_url).bind(Json(&p.dimensions)).bind(p.is_featured).bind(p.is_new_arrival)
            .execute(&self.db).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_product(&self, id: &str) -> StoreResult<bool> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.db).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"))
            .fetch_all(&self.db).await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn find_order(&self, id: &str) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id).fetch_optional(&self.db).await?;
        row.map(Order::try_from).transpose()
    }

    async fn insert_order(&self, o: &Order) -> StoreResult<()> {
        sqlx::query(&format!("INSERT INTO orders ({ORDER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"))
            .bind(&o.id).bind(&o.user_id).bind(&o.customer_name).bind(&o.recipient_name).bind(&o.contact_number)
            .bind(Json(&o.items)).bind(o.total_amount).bind(o.shipping_address.as_ref().map(Json)).bind(o.status.as_str()).bind(o.created_at)
            .execute(&self.db).await.map_err(|e| duplicate_or(e, || format!("order {}", o.id)))?;
        Ok(())
    }

    async fn set_order_status(&self, id: &str, status: OrderStatus) -> StoreResult<bool> {
        let done = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1").bind(id).bind(status.as_str()).execute(&self.db).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn list_banners(&self) -> StoreResult<Vec<MarketingBanner>> {
        let rows = sqlx::query_as::<_, BannerRow>(&format!("SELECT {BANNER_COLUMNS} FROM banners ORDER BY created_at"))
            .fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(MarketingBanner::from).collect())
    }

    async fn find_banner(&self, id: &str) -> StoreResult<Option<MarketingBanner>> {
        let row = sqlx::query_as::<_, BannerRow>(&format!("SELECT {BANNER_COLUMNS} FROM banners WHERE id = $1"))
            .bind(id).fetch_optional(&self.db).await?;
        Ok(row.map(MarketingBanner::from))
    }

    async fn insert_banner(&self, b: &MarketingBanner) -> StoreResult<()> {
        sqlx::query(&format!("INSERT INTO banners ({BANNER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"))
            .bind(&b.id).bind(&b.title).bind(&b.subtitle).bind(&b.description).bind(&b.image_url).bind(&b.badge_text)
            .bind(&b.button_text).bind(&b.link).bind(b.is_active)
            .execute(&self.db).await.map_err(|e| duplicate_or(e, || format!("banner {}", b.id)))?;
        Ok(())
    }

    async fn replace_banner(&self, b: &MarketingBanner) -> StoreResult<bool> {
        let done = sqlx::query("UPDATE banners SET title = $2, subtitle = $3, description = $4, image_url = $5, badge_text = $6, button_text = $7, link = $8, is_active = $9 WHERE id = $1")
            .bind(&b.id).bind(&b.title).bind(&b.subtitle).bind(&b.description).bind(&b.image_url).bind(&b.badge_text)
            .bind(&b.button_text).bind(&b.link).bind(b.is_active)
            .execute(&self.db).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_banner(&self, id: &str) -> StoreResult<bool> {
        let done = sqlx::query("DELETE FROM banners WHERE id = $1").bind(id).execute(&self.db).await?;
        Ok(done.rows_affected() > 0)
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn insert_user(&self, u: &UserRecord) -> StoreResult<()> {
        sqlx::query(&format!("INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"))
            .bind(&u.id).bind(&u.email).bind(&u.password_hash).bind(&u.fname).bind(&u.mname).bind(&u.lname)
            .bind(&u.contact_number).bind(u.address.as_ref().map(Json)).bind(u.created_at)
            .execute(&self.db).await.map_err(|e| duplicate_or(e, || format!("email {}", u.email)))?;
        Ok(())
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id).fetch_optional(&self.db).await?;
        Ok(row.map(UserRecord::from))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email).fetch_optional(&self.db).await?;
        Ok(row.map(UserRecord::from))
    }

    async fn set_user_address(&self, id: &str, address: &Address) -> StoreResult<bool> {
        let done = sqlx::query("UPDATE users SET address = $2 WHERE id = $1").bind(id).bind(Json(address)).execute(&self.db).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn find_admin(&self, identifier: &str) -> StoreResult<Option<AdminRecord>> {
        let row = sqlx::query_as::<_, AdminRow>("SELECT id, email, username, password_hash, fname, mname, lname FROM admins WHERE lower(email) = lower($1) OR lower(username) = lower($1)")
            .bind(identifier).fetch_optional(&self.db).await?;
        Ok(row.map(AdminRecord::from))
    }

    async fn upsert_admin(&self, a: &AdminRecord) -> StoreResult<()> {
        sqlx::query("INSERT INTO admins (id, email, username, password_hash, fname, mname, lname) VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (email) DO NOTHING")
            .bind(&a.id).bind(&a.email).bind(&a.username).bind(&a.password_hash).bind(&a.fname).bind(&a.mname).bind(&a.lname)
            .execute(&self.db).await?;
        Ok(())
    }
}
