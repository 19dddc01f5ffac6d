//! Payment orchestrator: drives the payment pipeline across collaborators
//! with compensating rollback on partial failure.

use std::collections::HashMap;
use std::sync::Mutex;

use common::{LineItem, Money, OrderId, TransactionId};
use tokio::sync::watch;

use crate::error::PaymentError;
use crate::request::PaymentRequest;
use crate::result::{PaymentResult, RefundOutcome};
use crate::services::{
    ChargeOutcome, FraudScreen, InventoryReservation, LedgerStore, Notifier, PaymentGateway,
    PaymentRecord, ReservationHandle,
};
use crate::status::PaymentStatus;

/// What to do when `process` is called for an order that already has a
/// pipeline run in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Wait for the in-flight run and return its result.
    #[default]
    Join,
    /// Reject the duplicate call immediately.
    Reject,
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    /// Requests whose fraud risk score reaches this value are held as
    /// `FraudSuspected` before any reservation or charge. The screen's
    /// own verdict is advisory; this threshold decides.
    pub fraud_threshold: f64,

    /// Policy for concurrent duplicate submissions of one order.
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fraud_threshold: 0.8,
            duplicate_policy: DuplicatePolicy::Join,
        }
    }
}

/// Per-order dedup slot. A `Running` slot marks an in-flight pipeline;
/// `Done` memoizes the terminal result so a repeat submission returns the
/// same transaction without re-charging.
enum OrderSlot {
    Running(watch::Receiver<Option<PaymentResult>>),
    Done(PaymentResult),
}

/// What `process` decided to do after consulting the dedup table.
enum Admission {
    Lead(watch::Sender<Option<PaymentResult>>),
    Wait(watch::Receiver<Option<PaymentResult>>),
    Replay(PaymentResult),
}

/// Coordinates fraud screening, inventory reservation, charge capture,
/// persistence, and notification for payment requests.
///
/// The pipeline is strictly ordered and every business failure maps to a
/// terminal [`PaymentStatus`] on the returned result; `Err` is reserved
/// for contract violations and duplicate rejections. Completed steps are
/// compensated in reverse when a later step fails: a captured charge is
/// refunded if its record cannot be persisted, and a reservation is
/// released if the charge does not go through.
pub struct PaymentOrchestrator<G, F, L, I, N>
where
    G: PaymentGateway,
    F: FraudScreen,
    L: LedgerStore,
    I: InventoryReservation,
    N: Notifier,
{
    gateway: G,
    fraud: F,
    ledger: L,
    inventory: I,
    notifier: N,
    config: OrchestratorConfig,
    orders: Mutex<HashMap<OrderId, OrderSlot>>,
}

impl<G, F, L, I, N> PaymentOrchestrator<G, F, L, I, N>
where
    G: PaymentGateway,
    F: FraudScreen,
    L: LedgerStore,
    I: InventoryReservation,
    N: Notifier,
{
    /// Creates a new orchestrator with the default configuration.
    pub fn new(gateway: G, fraud: F, ledger: L, inventory: I, notifier: N) -> Self {
        Self::with_config(gateway, fraud, ledger, inventory, notifier, OrchestratorConfig::default())
    }

    /// Creates a new orchestrator with an explicit configuration.
    pub fn with_config(
        gateway: G,
        fraud: F,
        ledger: L,
        inventory: I,
        notifier: N,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            gateway,
            fraud,
            ledger,
            inventory,
            notifier,
            config,
            orders: Mutex::new(HashMap::new()),
        }
    }

    /// Processes one payment request to a terminal result.
    ///
    /// At most one pipeline runs per order identifier. A repeat call for
    /// a completed order replays the memoized result; a concurrent call
    /// for an in-flight order follows [`DuplicatePolicy`].
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn process(&self, request: PaymentRequest) -> Result<PaymentResult, PaymentError> {
        request.validate()?;

        let admission = {
            let mut orders = self.orders.lock().unwrap();
            match orders.get(&request.order_id) {
                Some(OrderSlot::Done(result)) => Admission::Replay(result.clone()),
                Some(OrderSlot::Running(rx)) => {
                    let rx = rx.clone();
                    if rx.has_changed().is_err() {
                        // The previous leader dropped without publishing
                        // (cancelled mid pipeline). Replace the dead slot
                        // and take over, so the order is not wedged.
                        let (tx, new_rx) = watch::channel(None);
                        orders.insert(request.order_id.clone(), OrderSlot::Running(new_rx));
                        Admission::Lead(tx)
                    } else {
                        match self.config.duplicate_policy {
                            DuplicatePolicy::Join => Admission::Wait(rx),
                            DuplicatePolicy::Reject => {
                                return Err(PaymentError::DuplicateInFlight(
                                    request.order_id.clone(),
                                ));
                            }
                        }
                    }
                }
                None => {
                    let (tx, rx) = watch::channel(None);
                    orders.insert(request.order_id.clone(), OrderSlot::Running(rx));
                    Admission::Lead(tx)
                }
            }
        };

        match admission {
            Admission::Replay(result) => {
                tracing::debug!("replaying memoized result");
                Ok(result)
            }
            Admission::Wait(rx) => self.wait_for_leader(request.order_id.clone(), rx).await,
            Admission::Lead(tx) => {
                let result = self.run_pipeline(&request).await;
                {
                    let mut orders = self.orders.lock().unwrap();
                    orders.insert(request.order_id.clone(), OrderSlot::Done(result.clone()));
                }
                // Waiters still hold receivers cloned before the slot
                // was replaced; send errors just mean nobody is waiting.
                let _ = tx.send(Some(result.clone()));
                Ok(result)
            }
        }
    }

    /// Waits for the in-flight run of `order_id` and returns its result.
    async fn wait_for_leader(
        &self,
        order_id: OrderId,
        mut rx: watch::Receiver<Option<PaymentResult>>,
    ) -> Result<PaymentResult, PaymentError> {
        loop {
            {
                let value = rx.borrow();
                if let Some(result) = value.as_ref() {
                    return Ok(result.clone());
                }
            }
            if rx.changed().await.is_err() {
                // The leader dropped without publishing. Clear the dead
                // slot so a later submission can retry.
                let mut orders = self.orders.lock().unwrap();
                if let Some(OrderSlot::Running(slot_rx)) = orders.get(&order_id) {
                    if slot_rx.has_changed().is_err() {
                        orders.remove(&order_id);
                    }
                }
                return Err(PaymentError::Interrupted(order_id));
            }
        }
    }

    /// Runs the pipeline for a validated request. Always produces a
    /// terminal result; collaborator failures are absorbed at each step
    /// boundary.
    async fn run_pipeline(&self, request: &PaymentRequest) -> PaymentResult {
        let started = std::time::Instant::now();
        metrics::counter!("payments_processed_total").increment(1);
        tracing::info!(amount = %request.amount, currency = %request.currency, "payment attempt");

        // Step 1: fraud screen. Nothing to compensate on failure.
        let assessment = match self.fraud.analyze(request).await {
            Ok(a) => a,
            Err(e) => {
                return self
                    .fail(request, PaymentStatus::Failed, None, e.to_string(), started)
                    .await;
            }
        };
        if assessment.score >= self.config.fraud_threshold {
            tracing::warn!(
                customer_id = %request.customer_id,
                score = assessment.score,
                "fraud alert: transaction held for review"
            );
            metrics::counter!("payments_fraud_suspected_total").increment(1);
            self.notify_failure(request, "transaction flagged for review")
                .await;
            metrics::histogram!("payment_pipeline_duration_seconds")
                .record(started.elapsed().as_secs_f64());
            return PaymentResult {
                transaction_id: None,
                status: PaymentStatus::FraudSuspected,
                amount: request.amount,
                created_at: chrono::Utc::now(),
                gateway_response: None,
                fraud_score: Some(assessment.score),
                error_message: Some("transaction flagged for review".to_string()),
            };
        }
        let fraud_score = Some(assessment.score);

        // Step 2: reserve inventory. All-or-nothing, so a failure here
        // leaves nothing to compensate.
        let reservation = match self.inventory.reserve(&request.order_id, &request.items).await {
            Ok(handle) => handle,
            Err(e) => {
                return self
                    .fail(request, PaymentStatus::Failed, fraud_score, e.to_string(), started)
                    .await;
            }
        };

        // Step 3: charge. A decline and a technical failure both release
        // the reservation; they differ only in terminal status.
        let metadata = serde_json::json!({
            "order_id": request.order_id.as_str(),
            "customer_id": request.customer_id.as_str(),
        });
        let (transaction_id, gateway_response) = match self
            .gateway
            .charge(request.amount, &request.currency, &request.card_token, metadata)
            .await
        {
            Ok(ChargeOutcome::Approved {
                transaction_id,
                response,
            }) => (transaction_id, response),
            Ok(ChargeOutcome::Declined { reason }) => {
                self.release_reservation(&reservation).await;
                metrics::counter!("payments_declined_total").increment(1);
                tracing::info!(reason = %reason, "gateway declined charge");
                self.notify_failure(request, &reason).await;
                metrics::histogram!("payment_pipeline_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                return PaymentResult {
                    transaction_id: None,
                    status: PaymentStatus::Declined,
                    amount: request.amount,
                    created_at: chrono::Utc::now(),
                    gateway_response: None,
                    fraud_score,
                    error_message: Some(reason),
                };
            }
            Err(e) => {
                self.release_reservation(&reservation).await;
                return self
                    .fail(request, PaymentStatus::Failed, fraud_score, e.to_string(), started)
                    .await;
            }
        };

        // Step 4: persist. A charge must never outlive its persisted
        // record, so a failure here refunds before anything else.
        if let Err(e) = self.persist(request, &transaction_id).await {
            let mut message = e.to_string();
            if let Err(refund_err) = self.gateway.refund(&transaction_id, request.amount).await {
                tracing::error!(
                    transaction_id = %transaction_id,
                    error = %refund_err,
                    "compensating refund failed after persistence error; \
                     charge is orphaned and needs manual reconciliation"
                );
                metrics::counter!("payment_compensation_failures_total").increment(1);
                message = format!("{message}; compensating refund also failed: {refund_err}");
            }
            self.release_reservation(&reservation).await;
            return self
                .fail(request, PaymentStatus::Failed, fraud_score, message, started)
                .await;
        }

        // Step 5: notify. Best-effort; financial consistency outranks
        // notification delivery.
        if let Err(e) = self
            .notifier
            .send_success(&request.customer_email, &transaction_id, request.amount)
            .await
        {
            tracing::warn!(error = %e, "success notification failed; payment remains approved");
        }

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("payment_pipeline_duration_seconds").record(duration);
        metrics::counter!("payments_approved_total").increment(1);
        tracing::info!(transaction_id = %transaction_id, duration, "payment approved");

        PaymentResult {
            transaction_id: Some(transaction_id),
            status: PaymentStatus::Approved,
            amount: request.amount,
            created_at: chrono::Utc::now(),
            gateway_response: Some(gateway_response),
            fraud_score,
            error_message: None,
        }
    }

    /// Best-effort reversal of an approved payment.
    ///
    /// Unlike the forward pipeline, every reachable step runs even when
    /// an earlier one fails; the outcome reports each step separately.
    #[tracing::instrument(skip(self, items), fields(transaction_id = %transaction_id, order_id = %order_id))]
    pub async fn refund(
        &self,
        transaction_id: &TransactionId,
        amount: Money,
        order_id: &OrderId,
        items: &[LineItem],
    ) -> RefundOutcome {
        metrics::counter!("payment_refunds_total").increment(1);

        let gateway_refunded = match self.gateway.refund(transaction_id, amount).await {
            Ok(response) => {
                tracing::info!(refund_id = %response.refund_id, "gateway refund accepted");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "gateway refund failed");
                false
            }
        };

        let inventory_released = match self.inventory.release_for_order(order_id, items).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "inventory release failed during refund");
                false
            }
        };

        let ledger_updated = match self.ledger.update_order_status(order_id, "refunded").await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "ledger update failed during refund");
                false
            }
        };

        let outcome = RefundOutcome {
            gateway_refunded,
            inventory_released,
            ledger_updated,
        };
        if outcome.is_complete() {
            tracing::info!("refund completed");
        } else {
            metrics::counter!("payment_refunds_partial_total").increment(1);
            tracing::warn!(?outcome, "refund completed partially");
        }
        outcome
    }

    /// Drops any memoized result for an order, allowing it to be
    /// processed again. Intended for operational resets after an
    /// out-of-band reversal.
    pub fn forget_order(&self, order_id: &OrderId) {
        self.orders.lock().unwrap().remove(order_id);
    }

    /// Writes the payment record and order status inside one scoped
    /// ledger transaction.
    async fn persist(
        &self,
        request: &PaymentRequest,
        transaction_id: &TransactionId,
    ) -> Result<(), PaymentError> {
        let mut tx = self.ledger.begin().await?;
        let record = PaymentRecord {
            transaction_id: transaction_id.clone(),
            order_id: request.order_id.clone(),
            customer_id: request.customer_id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
        };

        if let Err(e) = tx.save_payment_record(&record).await {
            if let Err(rb) = tx.rollback().await {
                tracing::warn!(error = %rb, "ledger rollback failed");
            }
            return Err(e);
        }
        if let Err(e) = tx.update_order_status(&request.order_id, "paid").await {
            if let Err(rb) = tx.rollback().await {
                tracing::warn!(error = %rb, "ledger rollback failed");
            }
            return Err(e);
        }
        tx.commit().await
    }

    /// Produces a terminal failure result after logging and notifying.
    async fn fail(
        &self,
        request: &PaymentRequest,
        status: PaymentStatus,
        fraud_score: Option<f64>,
        message: String,
        started: std::time::Instant,
    ) -> PaymentResult {
        metrics::counter!("payments_failed_total").increment(1);
        tracing::warn!(reason = %message, "payment failed");
        self.notify_failure(request, &message).await;
        metrics::histogram!("payment_pipeline_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        PaymentResult {
            transaction_id: None,
            status,
            amount: request.amount,
            created_at: chrono::Utc::now(),
            gateway_response: None,
            fraud_score,
            error_message: Some(message),
        }
    }

    /// Releases a reservation taken earlier in the pipeline. A failure
    /// here leaves inventory held externally, so it is surfaced at error
    /// severity rather than swallowed.
    async fn release_reservation(&self, reservation: &ReservationHandle) {
        if let Err(e) = self.inventory.release(reservation).await {
            tracing::error!(
                reservation_id = %reservation.reservation_id,
                error = %e,
                "compensating release failed; reservation needs manual cleanup"
            );
            metrics::counter!("payment_compensation_failures_total").increment(1);
        }
    }

    /// Sends a failure notification, logging delivery problems.
    async fn notify_failure(&self, request: &PaymentRequest, reason: &str) {
        if let Err(e) = self
            .notifier
            .send_failure(&request.customer_email, reason)
            .await
        {
            tracing::warn!(error = %e, "failure notification could not be delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        InMemoryFraudScreen, InMemoryGateway, InMemoryInventory, InMemoryLedger, InMemoryNotifier,
    };

    type TestOrchestrator = PaymentOrchestrator<
        InMemoryGateway,
        InMemoryFraudScreen,
        InMemoryLedger,
        InMemoryInventory,
        InMemoryNotifier,
    >;

    struct Setup {
        orchestrator: TestOrchestrator,
        gateway: InMemoryGateway,
        fraud: InMemoryFraudScreen,
        ledger: InMemoryLedger,
        inventory: InMemoryInventory,
        notifier: InMemoryNotifier,
    }

    fn setup() -> Setup {
        setup_with(OrchestratorConfig::default())
    }

    fn setup_with(config: OrchestratorConfig) -> Setup {
        let gateway = InMemoryGateway::new();
        let fraud = InMemoryFraudScreen::with_score(0.1);
        let ledger = InMemoryLedger::new();
        let inventory = InMemoryInventory::new();
        let notifier = InMemoryNotifier::new();

        let orchestrator = PaymentOrchestrator::with_config(
            gateway.clone(),
            fraud.clone(),
            ledger.clone(),
            inventory.clone(),
            notifier.clone(),
            config,
        );

        Setup {
            orchestrator,
            gateway,
            fraud,
            ledger,
            inventory,
            notifier,
        }
    }

    fn request(order: &str) -> PaymentRequest {
        PaymentRequest::new(
            order,
            "CUST-789",
            Money::from_cents(5000),
            "USD",
            "tok_visa_4242",
            "customer@example.com",
            vec![LineItem::new("PROD-001", 2)],
        )
    }

    #[tokio::test]
    async fn test_happy_path_approves() {
        let s = setup();
        let result = s.orchestrator.process(request("O1")).await.unwrap();

        assert_eq!(result.status, PaymentStatus::Approved);
        assert!(result.is_successful());
        assert!(result.transaction_id.is_some());
        assert_eq!(result.amount, Money::from_cents(5000));
        assert_eq!(result.fraud_score, Some(0.1));
        assert!(result.gateway_response.is_some());
        assert!(result.error_message.is_none());

        assert_eq!(s.gateway.charge_count(), 1);
        assert_eq!(s.ledger.record_count(), 1);
        assert_eq!(
            s.ledger.order_status(&OrderId::new("O1")).as_deref(),
            Some("paid")
        );
        // Reservation is consumed by the approved order, not released.
        assert_eq!(s.inventory.reservation_count(), 1);
        assert_eq!(s.notifier.success_count(), 1);
    }

    #[tokio::test]
    async fn test_fraud_hold_skips_all_downstream_calls() {
        let s = setup();
        s.fraud.set_score(0.95);

        let result = s.orchestrator.process(request("O1")).await.unwrap();

        assert_eq!(result.status, PaymentStatus::FraudSuspected);
        assert_eq!(result.fraud_score, Some(0.95));
        assert!(result.transaction_id.is_none());

        assert_eq!(s.inventory.reserve_count(), 0);
        assert_eq!(s.gateway.charge_count(), 0);
        assert_eq!(s.ledger.record_count(), 0);
        assert_eq!(s.notifier.failure_count(), 1);
    }

    #[tokio::test]
    async fn test_score_below_threshold_is_not_held() {
        let mut config = OrchestratorConfig::default();
        config.fraud_threshold = 0.8;
        let s = setup_with(config);
        s.fraud.set_score(0.79);

        let result = s.orchestrator.process(request("O1")).await.unwrap();
        assert_eq!(result.status, PaymentStatus::Approved);
    }

    #[tokio::test]
    async fn test_reservation_failure_fails_without_charge() {
        let s = setup();
        s.inventory.set_fail_on_reserve(true);

        let result = s.orchestrator.process(request("O1")).await.unwrap();

        assert_eq!(result.status, PaymentStatus::Failed);
        assert!(result.error_message.is_some());
        assert_eq!(s.gateway.charge_count(), 0);
        assert_eq!(s.inventory.reservation_count(), 0);
        assert_eq!(s.notifier.failure_count(), 1);
    }

    #[tokio::test]
    async fn test_decline_releases_reservation() {
        let s = setup();
        s.gateway.set_decline_next(true);

        let result = s.orchestrator.process(request("O1")).await.unwrap();

        assert_eq!(result.status, PaymentStatus::Declined);
        assert_eq!(result.error_message.as_deref(), Some("card declined"));
        assert!(result.transaction_id.is_none());
        assert_eq!(s.inventory.reservation_count(), 0);
        assert_eq!(s.ledger.record_count(), 0);
        assert_eq!(s.notifier.failure_count(), 1);
    }

    #[tokio::test]
    async fn test_gateway_technical_failure_releases_reservation() {
        let s = setup();
        s.gateway.set_fail_next(true);

        let result = s.orchestrator.process(request("O1")).await.unwrap();

        assert_eq!(result.status, PaymentStatus::Failed);
        assert_eq!(s.inventory.reservation_count(), 0);
        assert_eq!(s.ledger.record_count(), 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_refunds_charge() {
        let s = setup();
        s.ledger.set_fail_on_save(true);

        let result = s.orchestrator.process(request("O1")).await.unwrap();

        assert_eq!(result.status, PaymentStatus::Failed);
        assert_eq!(s.gateway.charge_count(), 1);
        assert_eq!(s.gateway.refund_count(), 1);
        assert_eq!(s.gateway.outstanding_charges(), 0);
        assert_eq!(s.inventory.reservation_count(), 0);
        assert_eq!(s.ledger.record_count(), 0);
        assert_eq!(s.notifier.failure_count(), 1);
    }

    #[tokio::test]
    async fn test_commit_failure_refunds_charge() {
        let s = setup();
        s.ledger.set_fail_on_commit(true);

        let result = s.orchestrator.process(request("O1")).await.unwrap();

        assert_eq!(result.status, PaymentStatus::Failed);
        assert_eq!(s.gateway.refund_count(), 1);
        assert_eq!(s.ledger.record_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_compensating_refund_is_reported() {
        let s = setup();
        s.ledger.set_fail_on_save(true);
        s.gateway.set_fail_refund(true);

        let result = s.orchestrator.process(request("O1")).await.unwrap();

        assert_eq!(result.status, PaymentStatus::Failed);
        let message = result.error_message.unwrap();
        assert!(message.contains("compensating refund also failed"));
        // The charge is still outstanding at the gateway.
        assert_eq!(s.gateway.outstanding_charges(), 1);
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_approval() {
        let s = setup();
        s.notifier.set_fail_next(true);

        let result = s.orchestrator.process(request("O1")).await.unwrap();

        assert_eq!(result.status, PaymentStatus::Approved);
        assert!(result.transaction_id.is_some());
        assert_eq!(s.ledger.record_count(), 1);
        assert_eq!(s.gateway.refund_count(), 0);
    }

    #[tokio::test]
    async fn test_fraud_screen_outage_fails_before_reserve() {
        let s = setup();
        s.fraud.set_fail_next(true);

        let result = s.orchestrator.process(request("O1")).await.unwrap();

        assert_eq!(result.status, PaymentStatus::Failed);
        assert_eq!(s.inventory.reserve_count(), 0);
        assert_eq!(s.gateway.charge_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_request_fails_fast() {
        let s = setup();
        let mut req = request("O1");
        req.amount = Money::zero();

        let result = s.orchestrator.process(req).await;
        assert!(matches!(result, Err(PaymentError::InvalidRequest(_))));
        assert_eq!(s.fraud.analyze_count(), 0);
        assert_eq!(s.gateway.charge_count(), 0);
    }

    #[tokio::test]
    async fn test_repeat_submission_replays_without_recharging() {
        let s = setup();

        let first = s.orchestrator.process(request("O1")).await.unwrap();
        let second = s.orchestrator.process(request("O1")).await.unwrap();

        assert_eq!(first.transaction_id, second.transaction_id);
        assert_eq!(s.gateway.charge_count(), 1);
        assert_eq!(s.inventory.reserve_count(), 1);
    }

    #[tokio::test]
    async fn test_forget_order_allows_reprocessing() {
        let s = setup();

        let first = s.orchestrator.process(request("O1")).await.unwrap();
        s.orchestrator.forget_order(&OrderId::new("O1"));
        let second = s.orchestrator.process(request("O1")).await.unwrap();

        assert_ne!(first.transaction_id, second.transaction_id);
        assert_eq!(s.gateway.charge_count(), 2);
    }

    #[tokio::test]
    async fn test_refund_is_best_effort() {
        let s = setup();
        let result = s.orchestrator.process(request("O1")).await.unwrap();
        let transaction_id = result.transaction_id.unwrap();

        s.gateway.set_fail_refund(true);
        let outcome = s
            .orchestrator
            .refund(
                &transaction_id,
                Money::from_cents(5000),
                &OrderId::new("O1"),
                &[LineItem::new("PROD-001", 2)],
            )
            .await;

        // Gateway failed, but the later steps still ran.
        assert!(!outcome.gateway_refunded);
        assert!(outcome.inventory_released);
        assert!(outcome.ledger_updated);
        assert!(!outcome.is_complete());
        assert_eq!(s.inventory.reservation_count(), 0);
        assert_eq!(
            s.ledger.order_status(&OrderId::new("O1")).as_deref(),
            Some("refunded")
        );
    }

    #[tokio::test]
    async fn test_full_refund_after_approval() {
        let s = setup();
        let result = s.orchestrator.process(request("O1")).await.unwrap();
        let transaction_id = result.transaction_id.unwrap();

        let outcome = s
            .orchestrator
            .refund(
                &transaction_id,
                Money::from_cents(5000),
                &OrderId::new("O1"),
                &[LineItem::new("PROD-001", 2)],
            )
            .await;

        assert!(outcome.is_complete());
        assert_eq!(s.gateway.outstanding_charges(), 0);
        assert_eq!(s.inventory.reservation_count(), 0);
    }
}
