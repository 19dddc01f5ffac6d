//! Payment gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, TransactionId};
use uuid::Uuid;

use crate::error::PaymentError;

/// Outcome of a charge attempt that reached the gateway.
///
/// A decline is a business outcome, not an error; technical failures
/// (gateway unreachable, timeout) are surfaced as `Err` instead.
#[derive(Debug, Clone)]
pub enum ChargeOutcome {
    /// The charge was captured.
    Approved {
        /// Gateway-assigned transaction identifier.
        transaction_id: TransactionId,
        /// Opaque gateway response payload.
        response: serde_json::Value,
    },
    /// The gateway refused the charge.
    Declined {
        /// Gateway-supplied decline reason.
        reason: String,
    },
}

/// Response to a successful refund.
#[derive(Debug, Clone)]
pub struct RefundResponse {
    /// Gateway-assigned refund identifier.
    pub refund_id: String,
}

/// Trait for payment gateway operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Attempts to capture a charge against a card token.
    async fn charge(
        &self,
        amount: Money,
        currency: &str,
        card_token: &str,
        metadata: serde_json::Value,
    ) -> Result<ChargeOutcome, PaymentError>;

    /// Refunds a previously captured charge.
    async fn refund(
        &self,
        transaction_id: &TransactionId,
        amount: Money,
    ) -> Result<RefundResponse, PaymentError>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    charges: HashMap<TransactionId, Money>,
    refunds: Vec<(TransactionId, Money)>,
    charge_count: usize,
    refund_count: usize,
    decline_next: bool,
    fail_next: bool,
    fail_refund: bool,
    latency: Option<std::time::Duration>,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to decline the next charge.
    pub fn set_decline_next(&self, decline: bool) {
        self.state.write().unwrap().decline_next = decline;
    }

    /// Configures the gateway to fail technically on the next charge.
    pub fn set_fail_next(&self, fail: bool) {
        self.state.write().unwrap().fail_next = fail;
    }

    /// Configures the gateway to fail refund calls.
    pub fn set_fail_refund(&self, fail: bool) {
        self.state.write().unwrap().fail_refund = fail;
    }

    /// Adds artificial latency to each charge, to widen concurrency
    /// windows in tests.
    pub fn set_latency(&self, latency: std::time::Duration) {
        self.state.write().unwrap().latency = Some(latency);
    }

    /// Returns how many times `charge` was invoked.
    pub fn charge_count(&self) -> usize {
        self.state.read().unwrap().charge_count
    }

    /// Returns how many times `refund` was invoked.
    pub fn refund_count(&self) -> usize {
        self.state.read().unwrap().refund_count
    }

    /// Returns the number of charges that have not been refunded.
    pub fn outstanding_charges(&self) -> usize {
        self.state.read().unwrap().charges.len()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn charge(
        &self,
        amount: Money,
        currency: &str,
        _card_token: &str,
        _metadata: serde_json::Value,
    ) -> Result<ChargeOutcome, PaymentError> {
        let latency = self.state.read().unwrap().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.write().unwrap();
        state.charge_count += 1;

        if state.fail_next {
            state.fail_next = false;
            return Err(PaymentError::Gateway("gateway unreachable".to_string()));
        }

        if state.decline_next {
            state.decline_next = false;
            return Ok(ChargeOutcome::Declined {
                reason: "card declined".to_string(),
            });
        }

        let transaction_id =
            TransactionId::new(format!("txn_{}", &Uuid::new_v4().simple().to_string()[..16]));
        state.charges.insert(transaction_id.clone(), amount);

        let response = serde_json::json!({
            "status": "succeeded",
            "amount_captured": amount.cents(),
            "currency": currency,
        });

        Ok(ChargeOutcome::Approved {
            transaction_id,
            response,
        })
    }

    async fn refund(
        &self,
        transaction_id: &TransactionId,
        amount: Money,
    ) -> Result<RefundResponse, PaymentError> {
        let mut state = self.state.write().unwrap();
        state.refund_count += 1;

        if state.fail_refund {
            return Err(PaymentError::Gateway("refund rejected".to_string()));
        }

        state.charges.remove(transaction_id);
        state.refunds.push((transaction_id.clone(), amount));

        Ok(RefundResponse {
            refund_id: format!("ref_{}", &Uuid::new_v4().simple().to_string()[..16]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_charge_and_refund() {
        let gateway = InMemoryGateway::new();
        let outcome = gateway
            .charge(
                Money::from_cents(5000),
                "USD",
                "tok_visa",
                serde_json::json!({}),
            )
            .await
            .unwrap();

        let transaction_id = match outcome {
            ChargeOutcome::Approved { transaction_id, .. } => transaction_id,
            other => panic!("expected approval, got {other:?}"),
        };
        assert!(transaction_id.as_str().starts_with("txn_"));
        assert_eq!(gateway.outstanding_charges(), 1);

        let refund = gateway
            .refund(&transaction_id, Money::from_cents(5000))
            .await
            .unwrap();
        assert!(refund.refund_id.starts_with("ref_"));
        assert_eq!(gateway.outstanding_charges(), 0);
    }

    #[tokio::test]
    async fn test_decline_is_not_an_error() {
        let gateway = InMemoryGateway::new();
        gateway.set_decline_next(true);

        let outcome = gateway
            .charge(Money::from_cents(100), "USD", "tok", serde_json::json!({}))
            .await
            .unwrap();
        assert!(matches!(outcome, ChargeOutcome::Declined { .. }));
        assert_eq!(gateway.outstanding_charges(), 0);
        assert_eq!(gateway.charge_count(), 1);
    }

    #[tokio::test]
    async fn test_technical_failure() {
        let gateway = InMemoryGateway::new();
        gateway.set_fail_next(true);

        let result = gateway
            .charge(Money::from_cents(100), "USD", "tok", serde_json::json!({}))
            .await;
        assert!(matches!(result, Err(PaymentError::Gateway(_))));
        assert_eq!(gateway.charge_count(), 1);
    }
}
