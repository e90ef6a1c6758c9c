//! Aggregates module
pub mod banner;
pub mod cart;
pub mod order;
pub mod product;

pub use banner::BannerError;
pub use cart::{Cart, Totals};
pub use order::{OrderError, OrderQuery};
pub use product::ProductError;
