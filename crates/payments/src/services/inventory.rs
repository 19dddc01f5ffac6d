//! Inventory reservation trait and in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{LineItem, OrderId};

use crate::error::PaymentError;

/// Ownership token for a reservation.
///
/// Returned by a successful reserve call and required to release the
/// reserved items. It stays with the pipeline run that created it until
/// released or the order completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationHandle {
    /// The reservation identifier assigned by the inventory service.
    pub reservation_id: String,
}

/// Trait for inventory reservation operations.
#[async_trait]
pub trait InventoryReservation: Send + Sync {
    /// Reserves all items atomically: either every line is reserved or
    /// none is. A failure reports the SKUs that could not be reserved.
    async fn reserve(
        &self,
        order_id: &OrderId,
        items: &[LineItem],
    ) -> Result<ReservationHandle, PaymentError>;

    /// Releases a previously made reservation.
    async fn release(&self, handle: &ReservationHandle) -> Result<(), PaymentError>;

    /// Releases whatever is held for an order by item list. Used by the
    /// refund path, where the original handle is no longer available.
    async fn release_for_order(
        &self,
        order_id: &OrderId,
        items: &[LineItem],
    ) -> Result<(), PaymentError>;
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    reservations: HashMap<String, (OrderId, Vec<LineItem>)>,
    unavailable_skus: HashSet<String>,
    next_id: u32,
    reserve_count: usize,
    fail_on_reserve: bool,
}

/// In-memory inventory service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventory {
    /// Creates a new in-memory inventory service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail every reserve call.
    pub fn set_fail_on_reserve(&self, fail: bool) {
        self.state.write().unwrap().fail_on_reserve = fail;
    }

    /// Marks a SKU as out of stock; reserves including it fail and name it.
    pub fn mark_unavailable(&self, sku: impl Into<String>) {
        self.state.write().unwrap().unavailable_skus.insert(sku.into());
    }

    /// Returns the number of active reservations.
    pub fn reservation_count(&self) -> usize {
        self.state.read().unwrap().reservations.len()
    }

    /// Returns how many times `reserve` was invoked.
    pub fn reserve_count(&self) -> usize {
        self.state.read().unwrap().reserve_count
    }

    /// Returns true if a reservation exists with the given ID.
    pub fn has_reservation(&self, reservation_id: &str) -> bool {
        self.state
            .read()
            .unwrap()
            .reservations
            .contains_key(reservation_id)
    }
}

#[async_trait]
impl InventoryReservation for InMemoryInventory {
    async fn reserve(
        &self,
        order_id: &OrderId,
        items: &[LineItem],
    ) -> Result<ReservationHandle, PaymentError> {
        let mut state = self.state.write().unwrap();
        state.reserve_count += 1;

        if state.fail_on_reserve {
            return Err(PaymentError::Inventory {
                message: "inventory service unavailable".to_string(),
                failed_skus: Vec::new(),
            });
        }

        let failed: Vec<String> = items
            .iter()
            .filter(|i| state.unavailable_skus.contains(&i.sku))
            .map(|i| i.sku.clone())
            .collect();
        if !failed.is_empty() {
            // All-or-nothing: nothing is held when any line fails.
            return Err(PaymentError::Inventory {
                message: "insufficient stock".to_string(),
                failed_skus: failed,
            });
        }

        state.next_id += 1;
        let reservation_id = format!("RES-{:04}", state.next_id);
        state
            .reservations
            .insert(reservation_id.clone(), (order_id.clone(), items.to_vec()));

        Ok(ReservationHandle { reservation_id })
    }

    async fn release(&self, handle: &ReservationHandle) -> Result<(), PaymentError> {
        let mut state = self.state.write().unwrap();
        state.reservations.remove(&handle.reservation_id);
        Ok(())
    }

    async fn release_for_order(
        &self,
        order_id: &OrderId,
        _items: &[LineItem],
    ) -> Result<(), PaymentError> {
        let mut state = self.state.write().unwrap();
        state.reservations.retain(|_, (held_order, _)| held_order != order_id);
        Ok(())
    }
}
