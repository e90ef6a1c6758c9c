//! Product Aggregate

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;
use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::Money;
use crate::{validation_message, NewProduct, Product, ProductPatch, StorefrontError};

impl Product {
    pub fn create(new: NewProduct) -> Result<(Product, DomainEvent), ProductError> {
        new.validate().map_err(|e| ProductError::Invalid(validation_message(&e)))?;
        let product = Product {
            id: Uuid::now_v7().to_string(), name: new.name.trim().to_string(), description: new.description,
            price: Money::new(new.price).round_to_cents().amount(), category: new.category.trim().to_string(), stock: new.stock, image_url: new.image_url,
            images: new.images, ar_model_url: new.ar_model_url, dimensions: new.dimensions,
            is_featured: new.is_featured, is_new_arrival: new.is_new_arrival, created_at: Utc::now(),
        };
        let event = DomainEvent::Product(ProductEvent::Created { product_id: product.id.clone(), name: product.name.clone() });
        Ok((product, event))
    }

    /// Merges a partial update. The merged result is validated before it
    /// replaces `self`, so a rejected patch leaves the product untouched.
    pub fn apply(&mut self, patch: ProductPatch) -> Result<DomainEvent, ProductError> {
        let mut next = self.clone();
        if let Some(v) = patch.name { next.name = v.trim().to_string(); }
        if let Some(v) = patch.description { next.description = v; }
        if let Some(v) = patch.price { next.price = v; }
        if let Some(v) = patch.category { next.category = v.trim().to_string(); }
        if let Some(v) = patch.stock { next.stock = v; }
        if let Some(v) = patch.image_url { next.image_url = v; }
        if let Some(v) = patch.images { next.images = v; }
        if let Some(v) = patch.ar_model_url { next.ar_model_url = v; }
        if let Some(v) = patch.dimensions { next.dimensions = v; }
        if let Some(v) = patch.is_featured { next.is_featured = v; }
        if let Some(v) = patch.is_new_arrival { next.is_new_arrival = v; }

        NewProduct::from(&next).validate().map_err(|e| ProductError::Invalid(validation_message(&e)))?;
        next.price = Money::new(next.price).round_to_cents().amount();
        *self = next;
        Ok(DomainEvent::Product(ProductEvent::Updated { product_id: self.id.clone() }))
    }

    pub fn is_in_stock(&self) -> bool { self.stock > 0 }
}

impl From<&Product> for NewProduct {
    fn from(p: &Product) -> Self {
        NewProduct {
            name: p.name.clone(), description: p.description.clone(), price: p.price, category: p.category.clone(),
            stock: p.stock, image_url: p.image_url.clone(), images: p.images.clone(), ar_model_url: p.ar_model_url.clone(),
            dimensions: p.dimensions.clone(), is_featured: p.is_featured, is_new_arrival: p.is_new_arrival,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProductError {
    #[error("{0}")]
    Invalid(String),
}

impl From<ProductError> for StorefrontError {
    fn from(e: ProductError) -> Self { StorefrontError::Validation(e.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dimensions;
    use rust_decimal_macros::dec;

    fn new_product() -> NewProduct {
        NewProduct {
            name: "Narra Dining Table".into(), description: "Solid wood".into(), price: dec!(24999), category: "Tables".into(),
            stock: 4, image_url: "products/narra/images/table.jpg".into(), images: vec![], ar_model_url: "products/narra/3dmodels/table.glb".into(),
            dimensions: Dimensions::default(), is_featured: true, is_new_arrival: false,
        }
    }

    #[test]
    fn test_product_create() {
        let (p, _) = Product::create(new_product()).unwrap();
        assert_eq!(p.name, "Narra Dining Table");
        assert!(p.is_in_stock());
    }

    #[test]
    fn test_validation_messages() {
        let mut n = new_product();
        n.name = "  ".into();
        assert_eq!(Product::create(n).unwrap_err(), ProductError::Invalid("Product name is required".into()));

        let mut n = new_product();
        n.price = dec!(-1);
        assert_eq!(Product::create(n).unwrap_err(), ProductError::Invalid("Price cannot be negative".into()));

        let mut n = new_product();
        n.stock = -3;
        assert_eq!(Product::create(n).unwrap_err(), ProductError::Invalid("Stock cannot be negative".into()));
    }

    #[test]
    fn test_rejected_patch_leaves_product() {
        let (mut p, _) = Product::create(new_product()).unwrap();
        let before = p.clone();
        let patch = ProductPatch { price: Some(dec!(-5)), name: Some("Renamed".into()), ..Default::default() };
        assert!(p.apply(patch).is_err());
        assert_eq!(p, before);

        p.apply(ProductPatch { stock: Some(0), ..Default::default() }).unwrap();
        assert!(!p.is_in_stock());
        assert_eq!(p.name, before.name);
    }

    #[test]
    fn test_price_is_kept_in_centavos() {
        let mut n = new_product();
        n.price = dec!(17999.555);
        let (mut p, _) = Product::create(n).unwrap();
        assert_eq!(p.price, dec!(17999.56));

        p.apply(ProductPatch { price: Some(dec!(1250.004)), ..Default::default() }).unwrap();
        assert_eq!(p.price, dec!(1250.00));
    }
}
