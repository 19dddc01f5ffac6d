//! Quote source trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, Symbol};
use serde::{Deserialize, Serialize};

use crate::error::QuoteError;

/// A point-in-time quote for one symbol. Callers always receive their
/// own copy; cache internals are never exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// The quoted symbol.
    pub symbol: Symbol,

    /// Quoted price in integer minor units.
    pub price: Money,

    /// When the value was fetched from the source.
    pub as_of: DateTime<Utc>,
}

/// Trait for the slow, rate-limit-sensitive quote source.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetches the current value for a symbol.
    async fn fetch(&self, symbol: &Symbol) -> Result<Quote, QuoteError>;
}

#[derive(Debug, Default)]
struct InMemoryQuoteSourceState {
    prices: HashMap<Symbol, Money>,
    fetch_count: usize,
    fail_next: bool,
    latency: Option<Duration>,
}

/// In-memory quote source for testing, with a seedable price table,
/// failure toggle, and optional artificial latency to widen concurrency
/// windows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuoteSource {
    state: Arc<RwLock<InMemoryQuoteSourceState>>,
}

impl InMemoryQuoteSource {
    /// Creates a new in-memory quote source with an empty price table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds or updates the price for a symbol.
    pub fn set_price(&self, symbol: impl Into<Symbol>, price: Money) {
        self.state.write().unwrap().prices.insert(symbol.into(), price);
    }

    /// Configures the source to fail its next fetch.
    pub fn set_fail_next(&self, fail: bool) {
        self.state.write().unwrap().fail_next = fail;
    }

    /// Adds artificial latency to each fetch.
    pub fn set_latency(&self, latency: Duration) {
        self.state.write().unwrap().latency = Some(latency);
    }

    /// Returns how many times `fetch` was invoked.
    pub fn fetch_count(&self) -> usize {
        self.state.read().unwrap().fetch_count
    }
}

#[async_trait]
impl QuoteSource for InMemoryQuoteSource {
    async fn fetch(&self, symbol: &Symbol) -> Result<Quote, QuoteError> {
        let latency = {
            let mut state = self.state.write().unwrap();
            state.fetch_count += 1;
            state.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.write().unwrap();
        if state.fail_next {
            state.fail_next = false;
            return Err(QuoteError::Source {
                symbol: symbol.clone(),
                message: "quote source unavailable".to_string(),
            });
        }

        let price = state
            .prices
            .get(symbol)
            .copied()
            .ok_or_else(|| QuoteError::UnknownSymbol(symbol.clone()))?;

        Ok(Quote {
            symbol: symbol.clone(),
            price,
            as_of: Utc::now(),
        })
    }
}
