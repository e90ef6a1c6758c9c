//! Built-in sample data served when the API cannot be reached.

use chrono::Utc;
use rust_decimal::Decimal;
use crate::{DimensionUnit, Dimensions, MarketingBanner, Product};

pub fn products() -> Vec<Product> {
    vec![Product {
        id: "1".into(),
        name: "Eames Style Lounge Chair".into(),
        description: "A classic mid-century modern chair. Perfect for lounging and reading in style.".into(),
        price: Decimal::from(18500),
        category: "Chairs".into(),
        stock: 15,
        image_url: "https://images.unsplash.com/photo-1567538096630-e0c55bd6374c?auto=format&fit=crop&w=800&q=80".into(),
        images: vec![],
        ar_model_url: "products/3dmodels/white_mesh.glb".into(),
        dimensions: Dimensions { width: 84.0, height: 84.0, depth: 85.0, unit: DimensionUnit::Cm },
        is_featured: true,
        is_new_arrival: false,
        created_at: Utc::now(),
    }]
}

pub fn banners() -> Vec<MarketingBanner> {
    vec![MarketingBanner {
        id: "banner-1".into(),
        title: "Pinoy Craftsmanship Sale".into(),
        subtitle: Some("Support Local".into()),
        description: "Get the best Palochina deals from Valenzuela directly to your home. Up to 30% off.".into(),
        image_url: "https://images.unsplash.com/photo-1618220179428-22790b461013?auto=format&fit=crop&w=1200&q=80".into(),
        badge_text: Some("SALE".into()),
        button_text: "SHOP NOW".into(),
        link: "/".into(),
        is_active: true,
    }]
}

pub fn product(id: &str) -> Option<Product> {
    products().into_iter().find(|p| p.id == id)
}
