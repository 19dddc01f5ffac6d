//! Payment processing orchestration.
//!
//! This crate coordinates fraud screening, inventory reservation, charge
//! capture, ledger persistence, and customer notification behind one
//! entry point. The pipeline runs in a strict order:
//!
//! 1. Fraud screen
//! 2. Reserve inventory
//! 3. Capture charge
//! 4. Persist payment record and order status
//! 5. Notify the customer
//!
//! When a later step fails, completed steps are compensated in reverse:
//! a captured charge is refunded, a reservation is released. Business
//! declines surface as terminal statuses on the result, never as errors,
//! and at most one pipeline run exists per order identifier at any time.

pub mod error;
pub mod orchestrator;
pub mod request;
pub mod result;
pub mod services;
pub mod status;

pub use error::PaymentError;
pub use orchestrator::{DuplicatePolicy, OrchestratorConfig, PaymentOrchestrator};
pub use request::PaymentRequest;
pub use result::{PaymentResult, RefundOutcome};
pub use services::{
    ChargeOutcome, FraudAssessment, FraudScreen, FraudVerdict, InMemoryFraudScreen,
    InMemoryGateway, InMemoryInventory, InMemoryLedger, InMemoryNotifier, InventoryReservation,
    LedgerStore, LedgerTransaction, Notifier, PaymentGateway, PaymentRecord, RefundResponse,
    ReservationHandle, SentNotification,
};
pub use status::PaymentStatus;
