use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use super::AppState;
use crate::catalog::{CatalogParams, ProductFilter};
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::{NewProduct, Product, ProductPatch, Result, StorefrontError, SuccessResponse};

/// Every product, optionally narrowed by the shop filters (`q`, `category`, `filter`).
pub async fn list_products(State(s): State<AppState>, Query(p): Query<CatalogParams>) -> Result<Json<Vec<Product>>> {
    let filter = ProductFilter::from_params(&p, s.shop.sale_threshold);
    let products = s.catalog.list_products().await?;
    Ok(Json(filter.apply(&products).into_iter().cloned().collect()))
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    s.catalog.find_product(&id).await?.map(Json).ok_or(StorefrontError::ProductNotFound)
}

pub async fn create_product(State(s): State<AppState>, Json(r): Json<NewProduct>) -> Result<(StatusCode, Json<Product>)> {
    let (product, event) = Product::create(r)?;
    s.catalog.insert_product(&product).await?;
    tracing::info!(product_id = %product.id, name = %product.name, "product created");
    s.publish(event).await;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<ProductPatch>) -> Result<Json<Product>> {
    let mut product = s.catalog.find_product(&id).await?.ok_or(StorefrontError::ProductNotFound)?;
    let event = product.apply(r)?;
    if !s.catalog.replace_product(&product).await? { return Err(StorefrontError::ProductNotFound); }
    s.publish(event).await;
    Ok(Json(product))
}

pub async fn delete_product(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<SuccessResponse>> {
    if !s.catalog.delete_product(&id).await? { return Err(StorefrontError::ProductNotFound); }
    tracing::info!(product_id = %id, "product deleted");
    s.publish(DomainEvent::Product(ProductEvent::Deleted { product_id: id })).await;
    Ok(Json(SuccessResponse { success: true }))
}
