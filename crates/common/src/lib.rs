//! Shared value types for the checkout core.
//!
//! These types are used by both the payment orchestrator and the quote
//! cache: opaque identifiers, money amounts in integer minor units, and
//! order line items.

pub mod ids;
pub mod items;
pub mod money;

pub use ids::{CustomerId, OrderId, Symbol, TransactionId};
pub use items::LineItem;
pub use money::Money;
