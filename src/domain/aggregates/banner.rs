//! Marketing banner aggregate

use thiserror::Error;
use uuid::Uuid;
use validator::Validate;
use crate::domain::events::{BannerEvent, DomainEvent};
use crate::{validation_message, BannerPatch, MarketingBanner, NewBanner, StorefrontError};

impl MarketingBanner {
    pub fn create(new: NewBanner) -> Result<(MarketingBanner, DomainEvent), BannerError> {
        new.validate().map_err(|e| BannerError::Invalid(validation_message(&e)))?;
        let banner = MarketingBanner {
            id: Uuid::now_v7().to_string(), title: new.title.trim().to_string(), subtitle: new.subtitle,
            description: new.description, image_url: new.image_url, badge_text: new.badge_text,
            button_text: new.button_text, link: new.link, is_active: new.is_active,
        };
        let event = DomainEvent::Banner(BannerEvent::Created { banner_id: banner.id.clone() });
        Ok((banner, event))
    }

    pub fn apply(&mut self, patch: BannerPatch) -> Result<DomainEvent, BannerError> {
        let mut next = NewBanner::from(&*self);
        if let Some(v) = patch.title { next.title = v; }
        if let Some(v) = patch.subtitle { next.subtitle = Some(v).filter(|s| !s.is_empty()); }
        if let Some(v) = patch.description { next.description = v; }
        if let Some(v) = patch.image_url { next.image_url = v; }
        if let Some(v) = patch.badge_text { next.badge_text = Some(v).filter(|s| !s.is_empty()); }
        if let Some(v) = patch.button_text { next.button_text = v; }
        if let Some(v) = patch.link { next.link = v; }
        if let Some(v) = patch.is_active { next.is_active = v; }
        next.validate().map_err(|e| BannerError::Invalid(validation_message(&e)))?;

        *self = MarketingBanner {
            id: std::mem::take(&mut self.id), title: next.title.trim().to_string(), subtitle: next.subtitle,
            description: next.description, image_url: next.image_url, badge_text: next.badge_text,
            button_text: next.button_text, link: next.link, is_active: next.is_active,
        };
        Ok(DomainEvent::Banner(BannerEvent::Updated { banner_id: self.id.clone() }))
    }
}

impl From<&MarketingBanner> for NewBanner {
    fn from(b: &MarketingBanner) -> Self {
        NewBanner {
            title: b.title.clone(), subtitle: b.subtitle.clone(), description: b.description.clone(),
            image_url: b.image_url.clone(), badge_text: b.badge_text.clone(), button_text: b.button_text.clone(),
            link: b.link.clone(), is_active: b.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BannerError {
    #[error("{0}")]
    Invalid(String),
}

impl From<BannerError> for StorefrontError {
    fn from(e: BannerError) -> Self { StorefrontError::Validation(e.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_json() {
        let new: NewBanner = serde_json::from_value(serde_json::json!({
            "title": "Pinoy Craftsmanship Sale", "imageUrl": "https://example.test/banner.jpg"
        })).unwrap();
        let (banner, _) = MarketingBanner::create(new).unwrap();
        assert_eq!(banner.button_text, "SHOP NOW");
        assert_eq!(banner.link, "/");
        assert!(banner.is_active);
    }

    #[test]
    fn test_title_required() {
        let new: NewBanner = serde_json::from_value(serde_json::json!({ "imageUrl": "x.jpg" })).unwrap();
        assert_eq!(MarketingBanner::create(new).unwrap_err(), BannerError::Invalid("Title is required".into()));
    }

    #[test]
    fn test_patch_keeps_identity() {
        let new: NewBanner = serde_json::from_value(serde_json::json!({ "title": "A", "imageUrl": "x.jpg" })).unwrap();
        let (mut banner, _) = MarketingBanner::create(new).unwrap();
        let id = banner.id.clone();
        banner.apply(BannerPatch { is_active: Some(false), ..Default::default() }).unwrap();
        assert_eq!(banner.id, id);
        assert!(!banner.is_active);
        assert!(banner.apply(BannerPatch { image_url: Some(String::new()), ..Default::default() }).is_err());
        assert_eq!(banner.image_url, "x.jpg");
    }
}
