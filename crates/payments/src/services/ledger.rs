//! Ledger store trait and in-memory implementation.
//!
//! The ledger exposes a scoped transactional unit: writes staged through a
//! [`LedgerTransaction`] become visible only on commit and are discarded
//! on rollback or drop.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{CustomerId, Money, OrderId, TransactionId};
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;

/// A persisted payment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Gateway transaction identifier for the captured charge.
    pub transaction_id: TransactionId,
    /// The order this payment belongs to.
    pub order_id: OrderId,
    /// The paying customer.
    pub customer_id: CustomerId,
    /// Amount captured.
    pub amount: Money,
    /// Currency of the charge.
    pub currency: String,
}

/// A scoped ledger transaction; writes are staged until commit.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Stages a payment record write.
    async fn save_payment_record(&mut self, record: &PaymentRecord) -> Result<(), PaymentError>;

    /// Stages an order status update.
    async fn update_order_status(
        &mut self,
        order_id: &OrderId,
        status: &str,
    ) -> Result<(), PaymentError>;

    /// Commits all staged writes atomically.
    async fn commit(self: Box<Self>) -> Result<(), PaymentError>;

    /// Discards all staged writes.
    async fn rollback(self: Box<Self>) -> Result<(), PaymentError>;
}

/// Trait for ledger store operations.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a scoped transaction.
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, PaymentError>;

    /// Updates an order status outside any scoped transaction. Used by
    /// the best-effort refund path.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: &str,
    ) -> Result<(), PaymentError>;
}

#[derive(Debug, Default)]
struct InMemoryLedgerState {
    records: HashMap<OrderId, PaymentRecord>,
    order_statuses: HashMap<OrderId, String>,
    commit_count: usize,
    rollback_count: usize,
    fail_on_save: bool,
    fail_on_commit: bool,
}

/// In-memory ledger store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<InMemoryLedgerState>>,
}

impl InMemoryLedger {
    /// Creates a new in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures transactions to fail when saving a payment record.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.state.write().unwrap().fail_on_save = fail;
    }

    /// Configures transactions to fail at commit.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.state.write().unwrap().fail_on_commit = fail;
    }

    /// Returns the number of committed payment records.
    pub fn record_count(&self) -> usize {
        self.state.read().unwrap().records.len()
    }

    /// Returns the committed payment record for an order, if any.
    pub fn record_for(&self, order_id: &OrderId) -> Option<PaymentRecord> {
        self.state.read().unwrap().records.get(order_id).cloned()
    }

    /// Returns the committed status of an order, if any.
    pub fn order_status(&self, order_id: &OrderId) -> Option<String> {
        self.state
            .read()
            .unwrap()
            .order_statuses
            .get(order_id)
            .cloned()
    }

    /// Returns how many transactions were committed.
    pub fn commit_count(&self) -> usize {
        self.state.read().unwrap().commit_count
    }

    /// Returns how many transactions were rolled back.
    pub fn rollback_count(&self) -> usize {
        self.state.read().unwrap().rollback_count
    }
}

/// Transaction over the in-memory ledger; staged writes live here until
/// commit copies them into the shared state.
struct InMemoryLedgerTransaction {
    state: Arc<RwLock<InMemoryLedgerState>>,
    staged_records: Vec<PaymentRecord>,
    staged_statuses: Vec<(OrderId, String)>,
}

#[async_trait]
impl LedgerTransaction for InMemoryLedgerTransaction {
    async fn save_payment_record(&mut self, record: &PaymentRecord) -> Result<(), PaymentError> {
        if self.state.read().unwrap().fail_on_save {
            return Err(PaymentError::Ledger("write failed".to_string()));
        }
        self.staged_records.push(record.clone());
        Ok(())
    }

    async fn update_order_status(
        &mut self,
        order_id: &OrderId,
        status: &str,
    ) -> Result<(), PaymentError> {
        self.staged_statuses
            .push((order_id.clone(), status.to_string()));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PaymentError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_commit {
            return Err(PaymentError::Ledger("commit failed".to_string()));
        }
        for record in self.staged_records {
            state.records.insert(record.order_id.clone(), record);
        }
        for (order_id, status) in self.staged_statuses {
            state.order_statuses.insert(order_id, status);
        }
        state.commit_count += 1;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PaymentError> {
        // Staged writes are simply dropped.
        self.state.write().unwrap().rollback_count += 1;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, PaymentError> {
        Ok(Box::new(InMemoryLedgerTransaction {
            state: Arc::clone(&self.state),
            staged_records: Vec::new(),
            staged_statuses: Vec::new(),
        }))
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: &str,
    ) -> Result<(), PaymentError> {
        self.state
            .write()
            .unwrap()
            .order_statuses
            .insert(order_id.clone(), status.to_string());
        Ok(())
    }
}
