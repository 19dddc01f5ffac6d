//! Payment result value objects.

use chrono::{DateTime, Utc};
use common::{Money, TransactionId};
use serde::{Deserialize, Serialize};

use crate::status::PaymentStatus;

/// The terminal outcome of one processed payment request.
///
/// Constructed once by the orchestrator and immutable afterwards. A
/// transaction identifier is present only when the status is
/// [`PaymentStatus::Approved`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    /// Gateway-assigned transaction identifier; `Some` only on Approved.
    pub transaction_id: Option<TransactionId>,

    /// Terminal status of the pipeline.
    pub status: PaymentStatus,

    /// The amount the request asked to charge.
    pub amount: Money,

    /// When the result was produced.
    pub created_at: DateTime<Utc>,

    /// Opaque payload returned by the gateway, if a charge was attempted.
    pub gateway_response: Option<serde_json::Value>,

    /// Risk score recorded at the fraud screening step.
    pub fraud_score: Option<f64>,

    /// Human-readable failure reason for non-approved outcomes.
    pub error_message: Option<String>,
}

impl PaymentResult {
    /// Returns true if the payment was approved.
    pub fn is_successful(&self) -> bool {
        self.status == PaymentStatus::Approved
    }
}

/// Outcome of a best-effort refund.
///
/// The forward pipeline is all-or-nothing with compensation; the refund
/// path deliberately is not. Every reachable step runs even when an
/// earlier one fails, and this report says which ones succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundOutcome {
    /// The gateway accepted the refund.
    pub gateway_refunded: bool,

    /// The inventory reservation for the order's items was released.
    pub inventory_released: bool,

    /// The ledger order status was updated to refunded.
    pub ledger_updated: bool,
}

impl RefundOutcome {
    /// Returns true if every refund step succeeded.
    pub fn is_complete(&self) -> bool {
        self.gateway_refunded && self.inventory_released && self.ledger_updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approved_result_is_successful() {
        let result = PaymentResult {
            transaction_id: Some(TransactionId::new("txn_1")),
            status: PaymentStatus::Approved,
            amount: Money::from_cents(5000),
            created_at: Utc::now(),
            gateway_response: None,
            fraud_score: Some(0.1),
            error_message: None,
        };
        assert!(result.is_successful());
    }

    #[test]
    fn declined_result_is_not_successful() {
        let result = PaymentResult {
            transaction_id: None,
            status: PaymentStatus::Declined,
            amount: Money::from_cents(5000),
            created_at: Utc::now(),
            gateway_response: None,
            fraud_score: Some(0.1),
            error_message: Some("card declined".to_string()),
        };
        assert!(!result.is_successful());
    }

    #[test]
    fn refund_outcome_completeness() {
        let full = RefundOutcome {
            gateway_refunded: true,
            inventory_released: true,
            ledger_updated: true,
        };
        assert!(full.is_complete());

        let partial = RefundOutcome {
            gateway_refunded: false,
            inventory_released: true,
            ledger_updated: true,
        };
        assert!(!partial.is_complete());
    }

    #[test]
    fn result_serialization_roundtrip() {
        let result = PaymentResult {
            transaction_id: Some(TransactionId::new("txn_2")),
            status: PaymentStatus::Approved,
            amount: Money::from_cents(123),
            created_at: Utc::now(),
            gateway_response: Some(serde_json::json!({"status": "succeeded"})),
            fraud_score: Some(0.05),
            error_message: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: PaymentResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
