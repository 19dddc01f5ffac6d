//! Notification trait and in-memory implementation.
//!
//! Notification delivery is best-effort: the orchestrator logs failures
//! but never reverts a payment over them.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, TransactionId};

use crate::error::PaymentError;

/// A notification captured by the in-memory notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentNotification {
    /// Payment confirmation.
    Success {
        email: String,
        transaction_id: TransactionId,
    },
    /// Payment failure notice.
    Failure { email: String, reason: String },
}

/// Trait for customer notification operations.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a payment confirmation.
    async fn send_success(
        &self,
        email: &str,
        transaction_id: &TransactionId,
        amount: Money,
    ) -> Result<(), PaymentError>;

    /// Sends a payment failure notice.
    async fn send_failure(&self, email: &str, reason: &str) -> Result<(), PaymentError>;
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<SentNotification>,
    fail_next: bool,
}

/// In-memory notifier for testing; records every message.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail its next send.
    pub fn set_fail_next(&self, fail: bool) {
        self.state.write().unwrap().fail_next = fail;
    }

    /// Returns all captured notifications in send order.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.state.read().unwrap().sent.clone()
    }

    /// Returns the number of success notifications sent.
    pub fn success_count(&self) -> usize {
        self.state
            .read()
            .unwrap()
            .sent
            .iter()
            .filter(|n| matches!(n, SentNotification::Success { .. }))
            .count()
    }

    /// Returns the number of failure notifications sent.
    pub fn failure_count(&self) -> usize {
        self.state
            .read()
            .unwrap()
            .sent
            .iter()
            .filter(|n| matches!(n, SentNotification::Failure { .. }))
            .count()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send_success(
        &self,
        email: &str,
        transaction_id: &TransactionId,
        _amount: Money,
    ) -> Result<(), PaymentError> {
        let mut state = self.state.write().unwrap();
        if state.fail_next {
            state.fail_next = false;
            return Err(PaymentError::Notification("smtp unavailable".to_string()));
        }
        state.sent.push(SentNotification::Success {
            email: email.to_string(),
            transaction_id: transaction_id.clone(),
        });
        Ok(())
    }

    async fn send_failure(&self, email: &str, reason: &str) -> Result<(), PaymentError> {
        let mut state = self.state.write().unwrap();
        if state.fail_next {
            state.fail_next = false;
            return Err(PaymentError::Notification("smtp unavailable".to_string()));
        }
        state.sent.push(SentNotification::Failure {
            email: email.to_string(),
            reason: reason.to_string(),
        });
        Ok(())
    }
}
