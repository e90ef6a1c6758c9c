use axum::{extract::{Path, State}, http::StatusCode, Json};
use super::AppState;
use crate::domain::events::{BannerEvent, DomainEvent};
use crate::{BannerPatch, MarketingBanner, NewBanner, Result, StorefrontError, SuccessResponse};

pub async fn list_banners(State(s): State<AppState>) -> Result<Json<Vec<MarketingBanner>>> {
    Ok(Json(s.catalog.list_banners().await?))
}

pub async fn create_banner(State(s): State<AppState>, Json(r): Json<NewBanner>) -> Result<(StatusCode, Json<MarketingBanner>)> {
    let (banner, event) = MarketingBanner::create(r)?;
    s.catalog.insert_banner(&banner).await?;
    tracing::info!(banner_id = %banner.id, title = %banner.title, "banner created");
    s.publish(event).await;
    Ok((StatusCode::CREATED, Json(banner)))
}

pub async fn update_banner(State(s): State<AppState>, Path(id): Path<String>, Json(r): Json<BannerPatch>) -> Result<Json<MarketingBanner>> {
    let mut banner = s.catalog.find_banner(&id).await?.ok_or(StorefrontError::BannerNotFound)?;
    let event = banner.apply(r)?;
    if !s.catalog.replace_banner(&banner).await? { return Err(StorefrontError::BannerNotFound); }
    s.publish(event).await;
    Ok(Json(banner))
}

pub async fn delete_banner(State(s): State<AppState>, Path(id): Path<String>) -> Result<Json<SuccessResponse>> {
    if !s.catalog.delete_banner(&id).await? { return Err(StorefrontError::BannerNotFound); }
    tracing::info!(banner_id = %id, "banner deleted");
    s.publish(DomainEvent::Banner(BannerEvent::Deleted { banner_id: id })).await;
    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{app, call, parse};
    use crate::MarketingBanner;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_banner_lifecycle() {
        let app = app();
        let (status, body) = call(&app, Method::POST, "/api/banners", Some(json!({
            "title": "Pinoy Craftsmanship Sale", "subtitle": "Support Local", "imageUrl": "banner.jpg", "badgeText": "SALE"
        }))).await;
        assert_eq!(status, StatusCode::CREATED);
        let banner: MarketingBanner = parse(body);
        assert_eq!(banner.button_text, "SHOP NOW");

        let (status, body) = call(&app, Method::PUT, &format!("/api/banners/{}", banner.id), Some(json!({"isActive": false}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!parse::<MarketingBanner>(body).is_active);

        let (_, body) = call(&app, Method::GET, "/api/banners", None).await;
        assert_eq!(parse::<Vec<MarketingBanner>>(body).len(), 1);

        let (status, _) = call(&app, Method::DELETE, &format!("/api/banners/{}", banner.id), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, Method::DELETE, &format!("/api/banners/{}", banner.id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_banner_requires_title() {
        let (status, body) = call(&app(), Method::POST, "/api/banners", Some(json!({"imageUrl": "banner.jpg"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Title is required");
    }
}
