//! Payment request value object.

use common::{CustomerId, LineItem, Money, OrderId};
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;

/// An immutable request to process a payment for one logical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Unique identifier of the logical order being paid for.
    pub order_id: OrderId,

    /// The customer placing the order.
    pub customer_id: CustomerId,

    /// Amount to charge, in integer minor units.
    pub amount: Money,

    /// ISO-style currency code (e.g. "USD").
    pub currency: String,

    /// Opaque card token issued by the gateway's tokenization layer.
    /// Raw card data never enters this system.
    pub card_token: String,

    /// Address for success/failure notifications.
    pub customer_email: String,

    /// Ordered line items to reserve.
    pub items: Vec<LineItem>,
}

impl PaymentRequest {
    /// Creates a new payment request.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: impl Into<OrderId>,
        customer_id: impl Into<CustomerId>,
        amount: Money,
        currency: impl Into<String>,
        card_token: impl Into<String>,
        customer_email: impl Into<String>,
        items: Vec<LineItem>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            customer_id: customer_id.into(),
            amount,
            currency: currency.into(),
            card_token: card_token.into(),
            customer_email: customer_email.into(),
            items,
        }
    }

    /// Checks the request invariants.
    ///
    /// A violation is a programmer/contract error: the orchestrator
    /// rejects the request before any collaborator is invoked.
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.order_id.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "order id must not be empty".to_string(),
            ));
        }
        if !self.amount.is_positive() {
            return Err(PaymentError::InvalidRequest(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if self.currency.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "currency must not be empty".to_string(),
            ));
        }
        if self.card_token.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "card token must not be empty".to_string(),
            ));
        }
        if self.items.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "request must contain at least one line item".to_string(),
            ));
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity == 0) {
            return Err(PaymentError::InvalidRequest(format!(
                "line item {} has zero quantity",
                item.sku
            )));
        }
        Ok(())
    }
}
