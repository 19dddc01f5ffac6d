//! Payment error types.
//!
//! Business-level outcomes (declines, fraud holds) are never errors; they
//! are terminal statuses on [`crate::PaymentResult`]. The variants here
//! cover contract violations, duplicate submissions, and technical
//! collaborator failures that the orchestrator translates at each step
//! boundary.

use common::OrderId;
use thiserror::Error;

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The request violates its own invariants; rejected before any
    /// collaborator is invoked.
    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),

    /// A pipeline run for this order is already in flight and the
    /// duplicate policy is set to reject.
    #[error("Payment for order {0} is already in progress")]
    DuplicateInFlight(OrderId),

    /// The run we were waiting on ended without publishing a result.
    #[error("Payment for order {0} was interrupted before completing")]
    Interrupted(OrderId),

    /// Payment gateway technical failure (unreachable, timeout). A
    /// decline is not an error.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Fraud screening service failure.
    #[error("Fraud screen error: {0}")]
    FraudScreen(String),

    /// Inventory reservation failure, with the SKUs that could not be
    /// reserved when the service reports them.
    #[error("Inventory error: {message}")]
    Inventory {
        message: String,
        failed_skus: Vec<String>,
    },

    /// Ledger store failure.
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Notification delivery failure. Never propagated out of the
    /// orchestrator; logged and carried for the notifier impls.
    #[error("Notification error: {0}")]
    Notification(String),
}

/// Convenience type alias for payment results.
pub type Result<T> = std::result::Result<T, PaymentError>;
