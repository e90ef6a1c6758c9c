//! Shop browsing filters.
//!
//! A product is shown when it passes the search term, the category filter and
//! the special filter together. Filtering preserves input order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use crate::{Product, StorefrontError};

/// Category filter value that matches every product.
pub const ALL_CATEGORIES: &str = "All";

/// Number of products shown on the unfiltered home view.
pub const HOME_VIEW_LIMIT: usize = 8;

/// Number of products in each home section (new arrivals, featured).
pub const HOME_SECTION_LIMIT: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialFilter {
    New,
    Featured,
    Sale,
}

impl FromStr for SpecialFilter {
    type Err = StorefrontError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "featured" => Ok(Self::Featured),
            "sale" => Ok(Self::Sale),
            other => Err(StorefrontError::BadRequest(format!("unknown filter: {other}"))),
        }
    }
}

/// Query-string shape of the shop view: `?q=&category=&filter=`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductFilter {
    pub search: String,
    pub category: String,
    pub special: Option<SpecialFilter>,
    /// Products priced strictly below this are "on sale".
    pub sale_threshold: Decimal,
}

impl ProductFilter {
    pub fn new(sale_threshold: Decimal) -> Self {
        Self { search: String::new(), category: ALL_CATEGORIES.to_string(), special: None, sale_threshold }
    }

    /// Unrecognized `filter` values are ignored, so the shop still lists everything.
    pub fn from_params(params: &CatalogParams, sale_threshold: Decimal) -> Self {
        let special = params.filter.as_deref().and_then(|s| s.parse().ok());
        Self {
            search: params.q.clone().unwrap_or_default(),
            category: params.category.clone().filter(|c| !c.is_empty()).unwrap_or_else(|| ALL_CATEGORIES.to_string()),
            special,
            sale_threshold,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self { self.search = term.into(); self }
    pub fn category(mut self, category: impl Into<String>) -> Self { self.category = category.into(); self }
    pub fn special(mut self, special: Option<SpecialFilter>) -> Self { self.special = special; self }

    pub fn matches_search(&self, product: &Product) -> bool {
        let term = self.search.to_lowercase();
        product.name.to_lowercase().contains(&term) || product.category.to_lowercase().contains(&term)
    }

    pub fn matches_category(&self, product: &Product) -> bool {
        self.category == ALL_CATEGORIES || product.category == self.category
    }

    pub fn matches_special(&self, product: &Product) -> bool {
        match self.special {
            None => true,
            Some(SpecialFilter::New) => product.is_new_arrival,
            Some(SpecialFilter::Featured) => product.is_featured,
            Some(SpecialFilter::Sale) => product.price < self.sale_threshold,
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.matches_search(product) && self.matches_category(product) && self.matches_special(product)
    }

    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }

    /// No search, every category, no special filter.
    pub fn is_home_view(&self) -> bool {
        self.search.is_empty() && self.category == ALL_CATEGORIES && self.special.is_none()
    }

    /// Filtered products as the shop shows them: capped on the home view.
    pub fn shop_view<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let mut found = self.apply(products);
        if self.is_home_view() { found.truncate(HOME_VIEW_LIMIT); }
        found
    }
}

/// First [`HOME_SECTION_LIMIT`] new arrivals, in catalog order.
pub fn new_arrivals(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.is_new_arrival).take(HOME_SECTION_LIMIT).collect()
}

pub fn featured(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.is_featured).take(HOME_SECTION_LIMIT).collect()
}

/// Distinct non-empty categories, sorted.
pub fn categories(products: &[Product]) -> Vec<String> {
    products.iter().map(|p| p.category.clone()).filter(|c| !c.is_empty()).collect::<BTreeSet<_>>().into_iter().collect()
}
