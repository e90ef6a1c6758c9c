use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use super::AppState;
use crate::domain::OrderQuery;
use crate::{NewOrder, Order, Result, StatusUpdate, StorefrontError, SuccessResponse};

/// Orders newest first, optionally filtered by `search` and `status`.
pub async fn list_orders(State(s): State<AppState>, Query(q): Query<OrderQuery>) -> Result<Json<Vec<Order>>> {
    let orders = s.catalog.list_orders().await?;
    Ok(Json(q.apply(orders)))
}

pub async fn get_order(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<Order>> {
    s.catalog.find_order(&id).await?.map(Json).ok_or(StorefrontError::OrderNotFound)
}

pub async fn create_order(State(s): State<AppState>, Json(r): Json<NewOrder>) -> Result<(StatusCode, Json<Order>)> {
    let (order, event) = Order::place(r)?;
    s.catalog.insert_order(&order).await?;
    tracing::info!(order_id = %order.id, user_id = %order.user_id, total = %order.total_amount, items = order.item_count(), "order placed");
    s.publish(event).await;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn update_status(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<StatusUpdate>) -> Result<Json<SuccessResponse>> {
    let mut order = s.catalog.find_order(&id).await?.ok_or(StorefrontError::OrderNotFound)?;
    let event = order.transition_to(r.status)?;
    if let Some(event) = event {
        if !s.catalog.set_order_status(&id, order.status).await? { return Err(StorefrontError::OrderNotFound); }
        tracing::info!(order_id = %id, status = %order.status, "order status changed");
        s.publish(event).await;
    }
    Ok(Json(SuccessResponse { success: true }))
}
