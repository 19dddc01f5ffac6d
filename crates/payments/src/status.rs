//! Payment status state machine.

use serde::{Deserialize, Serialize};

/// The status of a payment in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Approved
///           ├──► Declined
///           ├──► FraudSuspected
///           └──► Failed
/// ```
///
/// Every status except `Pending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// The pipeline has not reached a terminal outcome yet.
    #[default]
    Pending,

    /// Charge captured and persisted (terminal).
    Approved,

    /// The gateway declined the charge (terminal).
    Declined,

    /// The fraud screen flagged the request before any charge (terminal).
    FraudSuspected,

    /// A technical failure stopped the pipeline; completed steps were
    /// compensated (terminal).
    Failed,
}

impl PaymentStatus {
    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Approved => "Approved",
            PaymentStatus::Declined => "Declined",
            PaymentStatus::FraudSuspected => "FraudSuspected",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_pending() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Approved.is_terminal());
        assert!(PaymentStatus::Declined.is_terminal());
        assert!(PaymentStatus::FraudSuspected.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }

    #[test]
    fn display() {
        assert_eq!(PaymentStatus::Approved.to_string(), "Approved");
        assert_eq!(PaymentStatus::FraudSuspected.to_string(), "FraudSuspected");
    }

    #[test]
    fn serialization_roundtrip() {
        let status = PaymentStatus::Declined;
        let json = serde_json::to_string(&status).unwrap();
        let back: PaymentStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
