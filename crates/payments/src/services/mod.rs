//! Collaborator capability traits and in-memory implementations.
//!
//! The orchestrator only ever sees these traits; the real gateway,
//! database, fraud, and email transports live outside this crate. The
//! in-memory implementations back the test suites and expose failure
//! toggles and call counters.

pub mod fraud;
pub mod gateway;
pub mod inventory;
pub mod ledger;
pub mod notifier;

pub use fraud::{FraudAssessment, FraudScreen, FraudVerdict, InMemoryFraudScreen};
pub use gateway::{ChargeOutcome, InMemoryGateway, PaymentGateway, RefundResponse};
pub use inventory::{InMemoryInventory, InventoryReservation, ReservationHandle};
pub use ledger::{InMemoryLedger, LedgerStore, LedgerTransaction, PaymentRecord};
pub use notifier::{InMemoryNotifier, Notifier, SentNotification};
