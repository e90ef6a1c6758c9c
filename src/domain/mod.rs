//! Storefront domain: aggregates, value objects and events
pub mod aggregates;
pub mod events;
pub mod value_objects;

pub use aggregates::{Cart, OrderQuery, Totals};
pub use events::DomainEvent;
pub use value_objects::{Money, TaxRate};
