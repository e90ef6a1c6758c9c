//! Domain events
use crate::OrderStatus;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
    Banner(BannerEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProductEvent {
    Created { product_id: String, name: String },
    Updated { product_id: String },
    Deleted { product_id: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: String, user_id: String, total: String },
    StatusChanged { order_id: String, from: OrderStatus, to: OrderStatus },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BannerEvent {
    Created { banner_id: String },
    Updated { banner_id: String },
    Deleted { banner_id: String },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Product(_) => "arfurniture.products",
            Self::Order(OrderEvent::Placed { .. }) => "arfurniture.orders.placed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "arfurniture.orders.status",
            Self::Banner(_) => "arfurniture.banners",
        }
    }
}
