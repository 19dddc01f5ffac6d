//! Fraud screening trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::PaymentError;
use crate::request::PaymentRequest;

/// Recommendation produced by the fraud screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FraudVerdict {
    /// Proceed with the payment.
    Approve,
    /// Hold the payment for manual review.
    Review,
}

/// The result of screening one payment request.
#[derive(Debug, Clone)]
pub struct FraudAssessment {
    /// Risk score in `[0.0, 1.0]`; higher is riskier.
    pub score: f64,
    /// The service's recommendation.
    pub verdict: FraudVerdict,
}

/// Trait for fraud screening operations.
#[async_trait]
pub trait FraudScreen: Send + Sync {
    /// Scores a payment request for fraud risk.
    async fn analyze(&self, request: &PaymentRequest) -> Result<FraudAssessment, PaymentError>;
}

#[derive(Debug)]
struct InMemoryFraudState {
    score: f64,
    analyze_count: usize,
    fail_next: bool,
}

/// In-memory fraud screen for testing; returns a configurable score.
#[derive(Debug, Clone)]
pub struct InMemoryFraudScreen {
    state: Arc<RwLock<InMemoryFraudState>>,
    review_threshold: f64,
}

impl InMemoryFraudScreen {
    /// Creates a fraud screen that scores every request at `score`.
    ///
    /// The verdict is `Review` when the score reaches 0.5, mirroring a
    /// typical provider default.
    pub fn with_score(score: f64) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryFraudState {
                score,
                analyze_count: 0,
                fail_next: false,
            })),
            review_threshold: 0.5,
        }
    }

    /// Changes the score returned for subsequent requests.
    pub fn set_score(&self, score: f64) {
        self.state.write().unwrap().score = score;
    }

    /// Configures the screen to fail technically on the next call.
    pub fn set_fail_next(&self, fail: bool) {
        self.state.write().unwrap().fail_next = fail;
    }

    /// Returns how many requests were analyzed.
    pub fn analyze_count(&self) -> usize {
        self.state.read().unwrap().analyze_count
    }
}

impl Default for InMemoryFraudScreen {
    fn default() -> Self {
        Self::with_score(0.1)
    }
}

#[async_trait]
impl FraudScreen for InMemoryFraudScreen {
    async fn analyze(&self, _request: &PaymentRequest) -> Result<FraudAssessment, PaymentError> {
        let mut state = self.state.write().unwrap();
        state.analyze_count += 1;

        if state.fail_next {
            state.fail_next = false;
            return Err(PaymentError::FraudScreen(
                "fraud service unavailable".to_string(),
            ));
        }

        let score = state.score;
        let verdict = if score < self.review_threshold {
            FraudVerdict::Approve
        } else {
            FraudVerdict::Review
        };

        Ok(FraudAssessment { score, verdict })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{LineItem, Money};

    fn request() -> PaymentRequest {
        PaymentRequest::new(
            "O1",
            "C1",
            Money::from_cents(1000),
            "USD",
            "tok",
            "a@example.com",
            vec![LineItem::new("SKU-001", 1)],
        )
    }

    #[tokio::test]
    async fn test_low_score_approves() {
        let screen = InMemoryFraudScreen::with_score(0.1);
        let assessment = screen.analyze(&request()).await.unwrap();
        assert_eq!(assessment.verdict, FraudVerdict::Approve);
        assert!((assessment.score - 0.1).abs() < f64::EPSILON);
        assert_eq!(screen.analyze_count(), 1);
    }

    #[tokio::test]
    async fn test_high_score_flags_review() {
        let screen = InMemoryFraudScreen::with_score(0.85);
        let assessment = screen.analyze(&request()).await.unwrap();
        assert_eq!(assessment.verdict, FraudVerdict::Review);
    }

    #[tokio::test]
    async fn test_technical_failure() {
        let screen = InMemoryFraudScreen::default();
        screen.set_fail_next(true);
        let result = screen.analyze(&request()).await;
        assert!(matches!(result, Err(PaymentError::FraudScreen(_))));
    }
}
