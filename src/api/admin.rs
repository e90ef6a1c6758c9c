use axum::{extract::State, Json};
use rust_decimal::Decimal;
use super::AppState;
use crate::{OrderStatus, Result, StoreStats};

/// Dashboard figures. Cancelled orders do not count towards revenue.
pub async fn stats(State(s): State<AppState>) -> Result<Json<StoreStats>> {
    let products = s.catalog.list_products().await?;
    let orders = s.catalog.list_orders().await?;
    let revenue: Decimal = orders.iter().filter(|o| o.status != OrderStatus::Cancelled).map(|o| o.total_amount).sum();
    Ok(Json(StoreStats {
        product_count: products.len(),
        order_count: orders.len(),
        pending_orders: orders.iter().filter(|o| o.status == OrderStatus::Pending).count(),
        revenue,
        low_stock_products: products.iter().filter(|p| p.stock < s.shop.low_stock_threshold).count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app_with, call, parse};
    use crate::store::{CatalogStore, MemoryStore};
    use crate::{CartItem, Dimensions, Order, OrderStatus, Product, StoreStats};
    use axum::http::{Method, StatusCode};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.into(), name: format!("Item {id}"), description: String::new(), price: dec!(1000), category: "Tables".into(),
            stock, image_url: "x.jpg".into(), images: vec![], ar_model_url: String::new(), dimensions: Dimensions::default(),
            is_featured: false, is_new_arrival: false, created_at: Utc::now(),
        }
    }

    fn order(id: &str, total: rust_decimal::Decimal, status: OrderStatus) -> Order {
        Order {
            id: id.into(), user_id: "u1".into(), customer_name: "Juan".into(), recipient_name: "Juan".into(),
            contact_number: "09170000000".into(), items: vec![CartItem { product: product("p1", 3), quantity: 1 }],
            total_amount: total, shipping_address: None, status, created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_stats_skip_cancelled_revenue() {
        let store = MemoryStore::new();
        store.insert_product(&product("p1", 3)).await.unwrap();
        store.insert_product(&product("p2", 40)).await.unwrap();
        store.insert_order(&order("o1", dec!(1120), OrderStatus::Pending)).await.unwrap();
        store.insert_order(&order("o2", dec!(2240), OrderStatus::Delivered)).await.unwrap();
        store.insert_order(&order("o3", dec!(999), OrderStatus::Cancelled)).await.unwrap();

        let app = app_with(store, std::env::temp_dir());
        let (status, body) = call(&app, Method::GET, "/api/admin/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        let stats: StoreStats = parse(body);
        assert_eq!(stats.product_count, 2);
        assert_eq!(stats.order_count, 3);
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.revenue, dec!(3360));
        assert_eq!(stats.low_stock_products, 1);
    }
}
