//! Per-session shopper state: who is signed in and what is in their cart.
//!
//! Cart changes are published on a `watch` channel so views (cart badge,
//! checkout summary) can follow along without polling.

use tokio::sync::watch;
use crate::checkout::{Checkout, CheckoutError, CheckoutForm, CheckoutPhase, OrderSink};
use crate::domain::{Cart, TaxRate, Totals};
use crate::{Order, Product, User};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CartSummary {
    /// Units across all lines.
    pub units: u32,
    pub lines: usize,
    pub selected: usize,
    pub totals: Totals,
}

impl CartSummary {
    fn of(cart: &Cart, rate: TaxRate) -> Self {
        Self { units: cart.unit_count(), lines: cart.len(), selected: cart.selected_ids().len(), totals: cart.totals(rate) }
    }
}

pub struct Session {
    user: Option<User>,
    cart: Cart,
    checkout: Checkout,
    summary: watch::Sender<CartSummary>,
}

impl Session {
    pub fn new(tax_rate: TaxRate) -> Self {
        let (summary, _) = watch::channel(CartSummary::default());
        Self { user: None, cart: Cart::new(), checkout: Checkout::new(tax_rate), summary }
    }

    pub fn user(&self) -> Option<&User> { self.user.as_ref() }
    pub fn is_authenticated(&self) -> bool { self.user.is_some() }
    pub fn is_admin(&self) -> bool { self.user.as_ref().is_some_and(User::is_admin) }
    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn checkout_phase(&self) -> &CheckoutPhase { self.checkout.phase() }
    pub fn totals(&self) -> Totals { self.checkout.totals(&self.cart) }

    pub fn subscribe(&self) -> watch::Receiver<CartSummary> { self.summary.subscribe() }

    pub fn login(&mut self, user: User) {
        tracing::debug!(user_id = %user.id, role = ?user.role, "session started");
        self.user = Some(user);
    }

    /// Signs out and empties the cart.
    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::debug!(user_id = %user.id, "session ended");
        }
        self.cart.clear();
        self.checkout.reset();
        self.notify();
    }

    pub fn add_to_cart(&mut self, product: &Product) {
        self.cart.add_item(product);
        self.notify();
    }

    pub fn remove_from_cart(&mut self, product_id: &str) {
        if self.cart.remove_item(product_id) { self.notify(); }
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.notify();
    }

    pub fn toggle_selected(&mut self, product_id: &str) {
        self.cart.toggle_selected(product_id);
        self.notify();
    }

    pub fn toggle_select_all(&mut self) {
        self.cart.toggle_select_all();
        self.notify();
    }

    /// Prefilled from the signed-in user, empty otherwise.
    pub fn checkout_form(&self) -> CheckoutForm {
        self.user.as_ref().map(CheckoutForm::prefill).unwrap_or_default()
    }

    pub async fn place_order(&mut self, form: &CheckoutForm, sink: &dyn OrderSink) -> Result<Order, CheckoutError> {
        let result = self.checkout.place_order(self.user.as_ref(), &mut self.cart, form, sink).await;
        if result.is_ok() { self.notify(); }
        result
    }

    fn notify(&self) {
        self.summary.send_replace(CartSummary::of(&self.cart, self.checkout.tax_rate()));
    }
}

impl Default for Session {
    fn default() -> Self { Self::new(TaxRate::default()) }
}
