//! Checkout: recipient capture and all-or-nothing order placement.
//!
//! The cart is only touched after the order sink confirms the order. Any
//! failure before or during submission leaves cart and selection exactly as
//! they were.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError};
use crate::client::ClientError;
use crate::domain::{Cart, TaxRate, Totals};
use crate::{validation_message, Address, NewOrder, Order, User};

pub const DEFAULT_COUNTRY: &str = "Philippines";

/// Recipient and delivery details captured per order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    #[serde(default)]
    #[validate(custom(function = "required", message = "Recipient name is required"))]
    pub recipient_name: String,
    #[serde(default)]
    #[validate(custom(function = "phone_number", message = "Enter a valid contact number"))]
    pub contact_number: String,
    #[serde(default)]
    #[validate(custom(function = "required", message = "Street address is required"))]
    pub street: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "required", message = "City is required"))]
    pub city: String,
    #[serde(default)]
    #[validate(custom(function = "required", message = "Province is required"))]
    pub state: String,
    #[serde(default)]
    #[validate(custom(function = "required", message = "ZIP code is required"))]
    pub zip_code: String,
    #[serde(default)]
    #[validate(custom(function = "required", message = "Country is required"))]
    pub country: String,
}

impl CheckoutForm {
    /// Starts from the user's name, contact number and saved address.
    pub fn prefill(user: &User) -> Self {
        let address = user.address.clone().unwrap_or_default();
        let country = if address.country.trim().is_empty() { DEFAULT_COUNTRY.to_string() } else { address.country };
        Self {
            recipient_name: user.name.clone(),
            contact_number: user.contact_number.clone(),
            street: address.street,
            landmark: address.landmark,
            city: address.city,
            state: address.state,
            zip_code: address.zip,
            country,
        }
    }

    pub fn to_address(&self) -> Address {
        Address {
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            zip: self.zip_code.trim().to_string(),
            country: self.country.trim().to_string(),
            landmark: self.landmark.as_deref().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string),
        }
    }
}

fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() { Err(ValidationError::new("required")) } else { Ok(()) }
}

// 7 to 15 digits, optional leading '+', spaces and dashes allowed between.
fn phone_number(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    let body = value.strip_prefix('+').unwrap_or(value);
    let digits = body.chars().filter(char::is_ascii_digit).count();
    let well_formed = body.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-');
    if well_formed && (7..=15).contains(&digits) { Ok(()) } else { Err(ValidationError::new("phone")) }
}

/// Where the order goes once the form is valid.
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn submit_order(&self, order: &NewOrder) -> Result<Order, ClientError>;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum CheckoutPhase {
    #[default]
    Editing,
    Submitting,
    Succeeded(Order),
    Failed(String),
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Please log in to place an order")]
    NotAuthenticated,
    #[error("Select at least one item to check out")]
    NothingSelected,
    #[error("{0}")]
    Invalid(String),
    #[error("An order is already being submitted")]
    AlreadySubmitting,
    #[error("Failed to place order: {0}")]
    Submit(#[from] ClientError),
}

#[derive(Clone, Debug, Default)]
pub struct Checkout {
    phase: CheckoutPhase,
    tax_rate: TaxRate,
}

impl Checkout {
    pub fn new(tax_rate: TaxRate) -> Self { Self { phase: CheckoutPhase::Editing, tax_rate } }

    pub fn phase(&self) -> &CheckoutPhase { &self.phase }
    pub fn tax_rate(&self) -> TaxRate { self.tax_rate }
    pub fn is_submitting(&self) -> bool { self.phase == CheckoutPhase::Submitting }

    /// Back to editing, e.g. after the success screen is dismissed.
    pub fn reset(&mut self) { self.phase = CheckoutPhase::Editing; }

    pub fn totals(&self, cart: &Cart) -> Totals { cart.totals(self.tax_rate) }

    /// Snapshot of the selected lines with the computed total and recipient details.
    pub fn build_order(&self, user: &User, cart: &Cart, form: &CheckoutForm) -> Result<NewOrder, CheckoutError> {
        let items: Vec<_> = cart.selected_items().cloned().collect();
        if items.is_empty() { return Err(CheckoutError::NothingSelected); }
        form.validate().map_err(|e| CheckoutError::Invalid(validation_message(&e)))?;
        Ok(NewOrder {
            user_id: user.id.clone(),
            customer_name: user.name.clone(),
            recipient_name: form.recipient_name.trim().to_string(),
            contact_number: form.contact_number.trim().to_string(),
            total_amount: Totals::compute(&items, self.tax_rate).total.amount(),
            items,
            shipping_address: Some(form.to_address()),
        })
    }

    /// Submits the selected lines. Only a confirmed order removes them from the cart.
    pub async fn place_order(&mut self, user: Option<&User>, cart: &mut Cart, form: &CheckoutForm, sink: &dyn OrderSink) -> Result<Order, CheckoutError> {
        if self.is_submitting() { return Err(CheckoutError::AlreadySubmitting); }
        let user = user.ok_or(CheckoutError::NotAuthenticated)?;
        let new_order = self.build_order(user, cart, form)?;

        let in_flight = InFlight::start(&mut self.phase);
        match sink.submit_order(&new_order).await {
            Ok(order) => {
                cart.remove_selected();
                tracing::info!(order_id = %order.id, user_id = %user.id, total = %order.total_amount, "checkout complete");
                in_flight.settle(CheckoutPhase::Succeeded(order.clone()));
                Ok(order)
            }
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user.id, "order submission failed");
                in_flight.settle(CheckoutPhase::Failed(e.to_string()));
                Err(e.into())
            }
        }
    }
}

/// Holds the phase at `Submitting` while an order is outstanding. If the
/// submission future is dropped before settling, the phase returns to
/// `Editing` so the shopper can try again.
struct InFlight<'a> {
    phase: &'a mut CheckoutPhase,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn start(phase: &'a mut CheckoutPhase) -> Self {
        *phase = CheckoutPhase::Submitting;
        Self { phase, settled: false }
    }

    fn settle(mut self, next: CheckoutPhase) {
        *self.phase = next;
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!("order submission abandoned");
            *self.phase = CheckoutPhase::Editing;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dimensions, OrderStatus, Product, UserRole};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;
    use std::time::Duration;

    struct AcceptingSink {
        received: Mutex<Vec<NewOrder>>,
    }

    #[async_trait]
    impl OrderSink for AcceptingSink {
        async fn submit_order(&self, order: &NewOrder) -> Result<Order, ClientError> {
            self.received.lock().unwrap().push(order.clone());
            Ok(Order::place(order.clone()).unwrap().0)
        }
    }

    struct HangingSink;

    #[async_trait]
    impl OrderSink for HangingSink {
        async fn submit_order(&self, _order: &NewOrder) -> Result<Order, ClientError> {
            std::future::pending().await
        }
    }

    struct FailingSink;

    #[async_trait]
    impl OrderSink for FailingSink {
        async fn submit_order(&self, _order: &NewOrder) -> Result<Order, ClientError> {
            Err(ClientError::Status { status: 500, message: "Internal error".into() })
        }
    }

    fn product(id: &str, price: Decimal) -> Product {
        Product {
            id: id.into(), name: format!("Item {id}"), description: String::new(), price, category: "Sofas".into(),
            stock: 5, image_url: "s.jpg".into(), images: vec![], ar_model_url: String::new(),
            dimensions: Dimensions::default(), is_featured: false, is_new_arrival: false, created_at: Utc::now(),
        }
    }

    fn customer() -> User {
        User {
            id: "CUST001".into(), name: "Juan Dela Cruz".into(), email: "juan@example.ph".into(), role: UserRole::Customer,
            username: None, contact_number: "0917 123 4567".into(),
            address: Some(Address { street: "123 Paso de Blas".into(), city: "Valenzuela City".into(), state: "Metro Manila".into(), zip: "1442".into(), country: String::new(), landmark: None }),
        }
    }

    fn cart_abc() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(&product("A", dec!(100)));
        cart.add_item(&product("B", dec!(50)));
        cart.add_item(&product("C", dec!(25)));
        cart.toggle_select_all();
        cart.toggle_selected("B");
        cart
    }

    #[test]
    fn test_prefill_defaults_country() {
        let form = CheckoutForm::prefill(&customer());
        assert_eq!(form.recipient_name, "Juan Dela Cruz");
        assert_eq!(form.zip_code, "1442");
        assert_eq!(form.country, DEFAULT_COUNTRY);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_form_validation() {
        let mut form = CheckoutForm::prefill(&customer());
        form.landmark = None;
        assert!(form.validate().is_ok());

        form.contact_number = "12-34".into();
        let err = form.validate().unwrap_err();
        assert_eq!(validation_message(&err), "Enter a valid contact number");

        form.contact_number = "+63 917-123-4567".into();
        form.city = "  ".into();
        assert_eq!(validation_message(&form.validate().unwrap_err()), "City is required");
    }

    #[test]
    fn test_phone_number_rules() {
        assert!(phone_number("09171234567").is_ok());
        assert!(phone_number("+639171234567").is_ok());
        assert!(phone_number("1234567").is_ok());
        assert!(phone_number("123456").is_err());
        assert!(phone_number("1234567890123456").is_err());
        assert!(phone_number("0917+1234567").is_err());
        assert!(phone_number("call me").is_err());
    }

    #[tokio::test]
    async fn test_successful_checkout_removes_only_selected() {
        let sink = AcceptingSink { received: Mutex::new(vec![]) };
        let mut checkout = Checkout::default();
        let mut cart = cart_abc();
        let user = customer();

        let order = checkout.place_order(Some(&user), &mut cart, &CheckoutForm::prefill(&user), &sink).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.iter().map(|i| i.id()).collect::<Vec<_>>(), vec!["A", "C"]);
        assert_eq!(order.total_amount, dec!(140));
        assert_eq!(order.shipping_address.as_ref().unwrap().country, "Philippines");
        assert_eq!(cart.items().iter().map(|i| i.id()).collect::<Vec<_>>(), vec!["B"]);
        assert!(!cart.has_selection());
        assert!(matches!(checkout.phase(), CheckoutPhase::Succeeded(o) if o.id == order.id));
        assert_eq!(sink.received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_checkout_leaves_cart_untouched() {
        let mut checkout = Checkout::default();
        let mut cart = cart_abc();
        let before = cart.clone();
        let user = customer();

        let err = checkout.place_order(Some(&user), &mut cart, &CheckoutForm::prefill(&user), &FailingSink).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Submit(_)));
        assert_eq!(cart, before);
        assert!(matches!(checkout.phase(), CheckoutPhase::Failed(_)));
    }

    #[tokio::test]
    async fn test_preconditions() {
        let sink = AcceptingSink { received: Mutex::new(vec![]) };
        let mut checkout = Checkout::default();
        let user = customer();
        let form = CheckoutForm::prefill(&user);

        let mut cart = cart_abc();
        let err = checkout.place_order(None, &mut cart, &form, &sink).await.unwrap_err();
        assert!(matches!(err, CheckoutError::NotAuthenticated));

        cart.toggle_select_all();
        cart.toggle_select_all();
        assert!(!cart.has_selection());
        let err = checkout.place_order(Some(&user), &mut cart, &form, &sink).await.unwrap_err();
        assert!(matches!(err, CheckoutError::NothingSelected));

        cart.toggle_selected("A");
        let bad = CheckoutForm { street: String::new(), ..form };
        let err = checkout.place_order(Some(&user), &mut cart, &bad, &sink).await.unwrap_err();
        assert_eq!(err.to_string(), "Street address is required");
        assert!(sink.received.lock().unwrap().is_empty());
        assert_eq!(cart.len(), 3);
    }

    #[tokio::test]
    async fn test_abandoned_submission_can_be_retried() {
        let mut checkout = Checkout::default();
        let mut cart = cart_abc();
        let before = cart.clone();
        let user = customer();
        let form = CheckoutForm::prefill(&user);

        let attempt = checkout.place_order(Some(&user), &mut cart, &form, &HangingSink);
        assert!(tokio::time::timeout(Duration::from_millis(50), attempt).await.is_err());
        assert_eq!(checkout.phase(), &CheckoutPhase::Editing);
        assert_eq!(cart, before);

        let sink = AcceptingSink { received: Mutex::new(vec![]) };
        let order = checkout.place_order(Some(&user), &mut cart, &form, &sink).await.unwrap();
        assert_eq!(order.items.len(), 2);
        assert_eq!(cart.len(), 1);
    }
}
