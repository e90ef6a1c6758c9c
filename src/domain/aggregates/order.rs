//! Order Aggregate

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::Money;
use crate::{NewOrder, Order, OrderStatus, StorefrontError};

impl OrderStatus {
    /// `pending -> shipped | cancelled`, `shipped -> delivered | cancelled`.
    /// Re-applying the current status is accepted.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        self == next || matches!((self, next), (Pending, Shipped) | (Pending, Cancelled) | (Shipped, Delivered) | (Shipped, Cancelled))
    }

    pub fn is_terminal(self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }
}

impl Order {
    /// Stamps identity, `pending` status and creation time onto a submitted snapshot.
    pub fn place(new: NewOrder) -> Result<(Order, DomainEvent), OrderError> {
        if new.items.is_empty() { return Err(OrderError::NoItems); }
        if new.items.iter().any(|i| i.quantity == 0) { return Err(OrderError::InvalidQuantity); }
        if new.recipient_name.trim().is_empty() || new.contact_number.trim().is_empty() { return Err(OrderError::MissingContact); }
        if new.total_amount < Decimal::ZERO { return Err(OrderError::NegativeTotal); }

        let order = Order {
            id: Uuid::now_v7().to_string(), user_id: new.user_id, customer_name: new.customer_name,
            recipient_name: new.recipient_name, contact_number: new.contact_number, items: new.items,
            total_amount: Money::new(new.total_amount).round_to_cents().amount(), shipping_address: new.shipping_address,
            status: OrderStatus::Pending, created_at: Utc::now(),
        };
        let event = DomainEvent::Order(OrderEvent::Placed { order_id: order.id.clone(), user_id: order.user_id.clone(), total: order.total_amount.to_string() });
        Ok((order, event))
    }

    pub fn transition_to(&mut self, next: OrderStatus) -> Result<Option<DomainEvent>, OrderError> {
        let from = self.status;
        if !from.can_transition_to(next) { return Err(OrderError::InvalidTransition { from, to: next }); }
        if from == next { return Ok(None); }
        self.status = next;
        Ok(Some(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.id.clone(), from, to: next })))
    }

    /// Units across all lines.
    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }
}

/// Back-office order filter: search over id or customer name, plus status.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OrderQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "status_filter")]
    pub status: Option<OrderStatus>,
}

impl OrderQuery {
    pub fn matches(&self, order: &Order) -> bool {
        let search = self.search.as_deref().map(str::to_lowercase).unwrap_or_default();
        let matches_search = order.id.to_lowercase().contains(&search) || order.customer_name.to_lowercase().contains(&search);
        let matches_status = self.status.map_or(true, |s| order.status == s);
        matches_search && matches_status
    }

    /// Matching orders, newest first.
    pub fn apply(&self, orders: Vec<Order>) -> Vec<Order> {
        let mut found: Vec<Order> = orders.into_iter().filter(|o| self.matches(o)).collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }
}

// "All" and an empty value both mean no status filter.
fn status_filter<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<OrderStatus>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("Order has no items")]
    NoItems,
    #[error("Order item quantity must be at least 1")]
    InvalidQuantity,
    #[error("Recipient name and contact number are required")]
    MissingContact,
    #[error("Order total cannot be negative")]
    NegativeTotal,
    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

impl From<OrderError> for StorefrontError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::InvalidTransition { from, to } => StorefrontError::InvalidTransition { from, to },
            other => StorefrontError::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CartItem, Dimensions, Product};
    use rust_decimal_macros::dec;

    fn new_order() -> NewOrder {
        let product = Product {
            id: "P1".into(), name: "Widget".into(), description: String::new(), price: dec!(10), category: "Tables".into(),
            stock: 3, image_url: "w.jpg".into(), images: vec![], ar_model_url: String::new(), dimensions: Dimensions::default(),
            is_featured: false, is_new_arrival: false, created_at: Utc::now(),
        };
        NewOrder {
            user_id: "CUST001".into(), customer_name: "Juan Dela Cruz".into(), recipient_name: "Juan".into(),
            contact_number: "09171234567".into(), items: vec![CartItem { product, quantity: 2 }],
            total_amount: dec!(22.40), shipping_address: None,
        }
    }

    #[test]
    fn test_order_workflow() {
        let (mut order, _) = Order::place(new_order()).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.item_count(), 2);
        assert!(order.transition_to(OrderStatus::Shipped).unwrap().is_some());
        assert!(order.transition_to(OrderStatus::Shipped).unwrap().is_none());
        order.transition_to(OrderStatus::Delivered).unwrap();
        assert_eq!(order.transition_to(OrderStatus::Cancelled), Err(OrderError::InvalidTransition { from: OrderStatus::Delivered, to: OrderStatus::Cancelled }));
    }

    #[test]
    fn test_total_is_kept_in_centavos() {
        let mut o = new_order();
        o.total_amount = dec!(0.0112);
        assert_eq!(Order::place(o).unwrap().0.total_amount, dec!(0.01));
    }

    #[test]
    fn test_place_rejects_empty() {
        let mut o = new_order();
        o.items.clear();
        assert_eq!(Order::place(o).unwrap_err(), OrderError::NoItems);
    }

    #[test]
    fn test_query_filters_and_sorts() {
        let (mut older, _) = Order::place(new_order()).unwrap();
        older.created_at = older.created_at - chrono::Duration::hours(1);
        let (mut newer, _) = Order::place(new_order()).unwrap();
        newer.customer_name = "Maria Clara".into();
        newer.transition_to(OrderStatus::Cancelled).unwrap();

        let all = OrderQuery::default().apply(vec![older.clone(), newer.clone()]);
        assert_eq!(all[0].id, newer.id);

        let q = OrderQuery { search: Some("maria".into()), status: None };
        assert_eq!(q.apply(vec![older.clone(), newer.clone()]).len(), 1);

        let q: OrderQuery = serde_json::from_value(serde_json::json!({"status": "All"})).unwrap();
        assert_eq!(q.status, None);
        let q: OrderQuery = serde_json::from_value(serde_json::json!({"status": "pending"})).unwrap();
        assert_eq!(q.apply(vec![older, newer]).len(), 1);
    }
}
