//! Cart Aggregate
//!
//! Holds the session cart and the selection set used for selective checkout.
//! Lines are unique per product id. The selection is always kept a subset of
//! the ids currently in the cart, and totals only ever cover selected lines.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use crate::domain::value_objects::{Money, TaxRate};
use crate::{CartItem, Product};

/// Persists as its list of lines. Loading goes through [`Cart::restore`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
    selected: BTreeSet<String>,
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self { Self::restore(items) }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self { cart.items }
}

/// Checkout figures for the selected lines. Shipping is always free.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
}

impl Totals {
    pub fn compute<'a>(items: impl IntoIterator<Item = &'a CartItem>, rate: TaxRate) -> Self {
        let subtotal: Money = items.into_iter().map(|i| Money::new(i.product.price).multiply(i.quantity)).sum();
        let tax = subtotal.apply_rate(rate).round_to_cents();
        Self { subtotal, tax, shipping: Money::ZERO, total: subtotal + tax }
    }
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Rebuilds a cart from persisted lines. Duplicate product lines are merged
    /// and every line starts selected.
    pub fn restore(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items.into_iter().filter(|i| i.quantity > 0) {
            match cart.items.iter_mut().find(|i| i.id() == item.id()) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
                None => cart.items.push(item),
            }
        }
        cart.select_all();
        cart
    }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn contains(&self, product_id: &str) -> bool { self.items.iter().any(|i| i.id() == product_id) }
    pub fn quantity_of(&self, product_id: &str) -> u32 { self.items.iter().find(|i| i.id() == product_id).map_or(0, |i| i.quantity) }
    pub fn unit_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }

    pub fn selected_ids(&self) -> &BTreeSet<String> { &self.selected }
    pub fn is_selected(&self, product_id: &str) -> bool { self.selected.contains(product_id) }
    pub fn has_selection(&self) -> bool { !self.selected.is_empty() }

    pub fn all_selected(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| self.selected.contains(i.id()))
    }

    /// Selected lines in cart order.
    pub fn selected_items(&self) -> impl Iterator<Item = &CartItem> + '_ {
        self.items.iter().filter(|i| self.selected.contains(i.id()))
    }

    /// Adds one unit of `product`. An existing line is incremented, otherwise a
    /// new line is appended. The first line added to an empty cart is selected.
    pub fn add_item(&mut self, product: &Product) {
        let was_empty = self.items.is_empty();
        if let Some(existing) = self.items.iter_mut().find(|i| i.id() == product.id) {
            existing.quantity = existing.quantity.saturating_add(1);
        } else {
            self.items.push(CartItem { product: product.clone(), quantity: 1 });
        }
        if was_empty { self.select_all(); }
    }

    /// Removes the line for `product_id`, dropping it from the selection too.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        self.selected.remove(product_id);
        let before = self.items.len();
        self.items.retain(|i| i.id() != product_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selected.clear();
    }

    /// Flips selection of a line. Ids not in the cart are ignored.
    pub fn toggle_selected(&mut self, product_id: &str) {
        if !self.contains(product_id) {
            self.selected.remove(product_id);
            return;
        }
        if !self.selected.remove(product_id) {
            self.selected.insert(product_id.to_string());
        }
    }

    pub fn toggle_select_all(&mut self) {
        if self.all_selected() { self.selected.clear(); } else { self.select_all(); }
    }

    pub fn totals(&self, rate: TaxRate) -> Totals { Totals::compute(self.selected_items(), rate) }

    /// Drops every selected line and empties the selection. Used once the
    /// store has confirmed an order for those lines.
    pub fn remove_selected(&mut self) -> Vec<CartItem> {
        let selected = std::mem::take(&mut self.selected);
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items).into_iter().partition(|i| selected.contains(i.id()));
        self.items = kept;
        taken
    }

    /// Drops selection entries whose line no longer exists.
    pub fn prune_selection(&mut self) {
        let items = &self.items;
        self.selected.retain(|id| items.iter().any(|i| i.id() == id));
    }

    fn select_all(&mut self) {
        self.selected = self.items.iter().map(|i| i.id().to_string()).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dimensions;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn product(id: &str, price: Decimal) -> Product {
        Product {
            id: id.into(), name: format!("Item {id}"), description: String::new(), price, category: "Chairs".into(),
            stock: 10, image_url: "img.jpg".into(), images: vec![], ar_model_url: String::new(),
            dimensions: Dimensions::default(), is_featured: false, is_new_arrival: false, created_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_merges_same_product() {
        let mut cart = Cart::new();
        let p = product("P1", dec!(10));
        cart.add_item(&p);
        cart.add_item(&p);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_first_add_selects_later_adds_do_not() {
        let mut cart = Cart::new();
        cart.add_item(&product("A", dec!(1)));
        assert!(cart.is_selected("A"));
        cart.add_item(&product("B", dec!(1)));
        assert!(!cart.is_selected("B"));
        cart.toggle_selected("A");
        cart.add_item(&product("C", dec!(1)));
        assert!(!cart.has_selection());
    }

    #[test]
    fn test_remove_keeps_selection_subset() {
        let mut cart = Cart::new();
        cart.add_item(&product("A", dec!(1)));
        cart.add_item(&product("B", dec!(1)));
        cart.toggle_select_all();
        assert!(cart.all_selected());
        assert!(cart.remove_item("A"));
        assert!(!cart.remove_item("A"));
        assert!(cart.selected_ids().iter().all(|id| cart.contains(id)));
        assert_eq!(cart.selected_ids().len(), 1);
    }

    #[test]
    fn test_toggle_unknown_id_is_ignored() {
        let mut cart = Cart::new();
        cart.add_item(&product("A", dec!(1)));
        cart.toggle_selected("ghost");
        assert!(!cart.is_selected("ghost"));
    }

    #[test]
    fn test_toggle_select_all() {
        let mut cart = Cart::new();
        cart.add_item(&product("A", dec!(1)));
        cart.add_item(&product("B", dec!(1)));
        cart.toggle_select_all();
        assert!(cart.all_selected());
        cart.toggle_select_all();
        assert!(!cart.has_selection());
    }

    #[test]
    fn test_totals_over_selection() {
        let mut cart = Cart::new();
        let a = product("A", dec!(100));
        cart.add_item(&a);
        cart.add_item(&a);
        cart.add_item(&product("B", dec!(50)));
        cart.toggle_selected("B");

        let t = cart.totals(TaxRate::default());
        assert_eq!(t.subtotal.amount(), dec!(250));
        assert_eq!(t.tax.amount(), dec!(30));
        assert_eq!(t.total.amount(), dec!(280));
        assert!(t.shipping.is_zero());

        cart.toggle_selected("B");
        let t = cart.totals(TaxRate::default());
        assert_eq!(t.subtotal.amount(), dec!(200));
        assert_eq!(t.tax.amount(), dec!(24));
        assert_eq!(t.total.amount(), dec!(224));
    }

    #[test]
    fn test_tax_rounds_to_centavos() {
        let mut cart = Cart::new();
        cart.add_item(&product("A", dec!(0.01)));
        let t = cart.totals(TaxRate::default());
        assert_eq!(t.tax.amount(), dec!(0.00));
        assert_eq!(t.total.amount(), dec!(0.01));

        let t = Totals::compute(&[CartItem { product: product("B", dec!(0.05)), quantity: 1 }], TaxRate::default());
        assert_eq!(t.tax.amount(), dec!(0.01));
        assert_eq!(t.total.amount(), dec!(0.06));
    }

    #[test]
    fn test_remove_selected_leaves_unselected() {
        let mut cart = Cart::new();
        for id in ["A", "B", "C"] { cart.add_item(&product(id, dec!(5))); }
        cart.toggle_selected("C");
        let taken = cart.remove_selected();
        assert_eq!(taken.iter().map(|i| i.id()).collect::<Vec<_>>(), vec!["A", "C"]);
        assert_eq!(cart.items().iter().map(|i| i.id()).collect::<Vec<_>>(), vec!["B"]);
        assert!(!cart.has_selection());
    }

    #[test]
    fn test_restore_selects_everything() {
        let p = product("A", dec!(3));
        let cart = Cart::restore(vec![CartItem { product: p.clone(), quantity: 1 }, CartItem { product: p, quantity: 2 }]);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of("A"), 3);
        assert!(cart.all_selected());
    }

    #[test]
    fn test_deserialize_goes_through_restore() {
        let p = product("A", dec!(3));
        let lines = vec![CartItem { product: p.clone(), quantity: 1 }, CartItem { product: p, quantity: 2 }];
        let cart: Cart = serde_json::from_value(serde_json::to_value(&lines).unwrap()).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of("A"), 3);
        assert!(cart.all_selected());

        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        assert_eq!(serde_json::from_value::<Cart>(json).unwrap(), cart);
    }
}
