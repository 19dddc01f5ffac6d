//! TTL caching proxy with single-flight fetch deduplication.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use common::Symbol;
use tokio::sync::watch;

use crate::error::QuoteError;
use crate::source::{Quote, QuoteSource};

/// Outcome of a source fetch, cloned to every waiter on the same flight.
type FetchOutcome = Result<Quote, SharedFetchError>;

/// A source failure in cloneable form, so one failed fetch can resolve
/// many waiters.
#[derive(Debug, Clone)]
struct SharedFetchError(String);

/// A cached value with the age bookkeeping that applied at fetch time.
struct CacheEntry {
    quote: Quote,
    fetched_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.duration_since(self.fetched_at) < self.ttl
    }
}

struct CacheState {
    entries: HashMap<Symbol, CacheEntry>,
    in_flight: HashMap<Symbol, watch::Receiver<Option<FetchOutcome>>>,
}

/// What `get` decided to do after one atomic look at the cache state.
enum Admission {
    Hit(Quote),
    Wait(watch::Receiver<Option<FetchOutcome>>),
    Lead(watch::Sender<Option<FetchOutcome>>),
}

/// Caching proxy in front of a slow, expensive quote source.
///
/// A fresh entry (age below the TTL) is served without touching the
/// source. On a miss or a stale entry, exactly one caller becomes the
/// leader and invokes the source; every concurrent caller for the same
/// symbol waits on that flight and receives the same outcome. A failed
/// fetch resolves all waiters with the shared failure, writes no entry,
/// and leaves the key clear so the next call retries.
///
/// The TTL is fixed per instance, staleness is pure age comparison, and
/// the key count is unbounded; eviction is out of scope here.
pub struct QuoteCache<S: QuoteSource> {
    source: S,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl<S: QuoteSource> QuoteCache<S> {
    /// Creates a caching proxy over `source` with the given TTL.
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
            }),
        }
    }

    /// Returns the configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a quote for `symbol`, from cache when fresh.
    #[tracing::instrument(skip(self), fields(symbol = %symbol))]
    pub async fn get(&self, symbol: &Symbol) -> Result<Quote, QuoteError> {
        let admission = {
            let mut state = self.state.lock().unwrap();
            let fresh = state
                .entries
                .get(symbol)
                .filter(|entry| entry.is_fresh(Instant::now()))
                .map(|entry| entry.quote.clone());
            match fresh {
                Some(quote) => Admission::Hit(quote),
                None => self.admit_miss(&mut state, symbol),
            }
        };

        match admission {
            Admission::Hit(quote) => {
                metrics::counter!("quote_cache_hits_total").increment(1);
                tracing::debug!("cache hit");
                Ok(quote)
            }
            Admission::Wait(rx) => self.wait_for_flight(symbol, rx).await,
            Admission::Lead(tx) => self.lead_fetch(symbol, tx).await,
        }
    }

    /// Drops the entry for a symbol, forcing the next `get` to refetch.
    /// An in-flight fetch is unaffected.
    pub fn invalidate(&self, symbol: &Symbol) {
        self.state.lock().unwrap().entries.remove(symbol);
    }

    /// Returns the number of cached entries, fresh or stale.
    pub fn entry_count(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    /// Decides, under the state lock, whether this caller waits on an
    /// existing flight or leads a new one. The existence check and the
    /// marker installation are one critical section, so two callers can
    /// never both decide to fetch the same symbol.
    fn admit_miss(&self, state: &mut CacheState, symbol: &Symbol) -> Admission {
        match state.in_flight.get(symbol) {
            Some(rx) => Admission::Wait(rx.clone()),
            None => {
                let (tx, rx) = watch::channel(None);
                state.in_flight.insert(symbol.clone(), rx);
                Admission::Lead(tx)
            }
        }
    }

    /// Leader path: invoke the source once, publish the entry, resolve
    /// every waiter.
    async fn lead_fetch(
        &self,
        symbol: &Symbol,
        tx: watch::Sender<Option<FetchOutcome>>,
    ) -> Result<Quote, QuoteError> {
        metrics::counter!("quote_cache_misses_total").increment(1);
        metrics::counter!("quote_source_fetches_total").increment(1);
        tracing::debug!("cache miss, fetching from source");

        let outcome: FetchOutcome = match self.source.fetch(symbol).await {
            Ok(quote) => Ok(quote),
            Err(e) => {
                metrics::counter!("quote_source_failures_total").increment(1);
                tracing::warn!(error = %e, "quote source fetch failed");
                Err(SharedFetchError(e.to_string()))
            }
        };

        {
            let mut state = self.state.lock().unwrap();
            // The marker dies the instant the fetch resolves. On success
            // the entry replaces it under the same lock, so no caller can
            // observe neither; on failure the key is simply clear again.
            state.in_flight.remove(symbol);
            if let Ok(quote) = &outcome {
                state.entries.insert(
                    symbol.clone(),
                    CacheEntry {
                        quote: quote.clone(),
                        fetched_at: Instant::now(),
                        ttl: self.ttl,
                    },
                );
            }
        }

        // Send errors only mean no waiter is left listening.
        let _ = tx.send(Some(outcome.clone()));

        outcome.map_err(|e| QuoteError::Source {
            symbol: symbol.clone(),
            message: e.0,
        })
    }

    /// Waiter path: share the outcome of the flight already in progress.
    async fn wait_for_flight(
        &self,
        symbol: &Symbol,
        mut rx: watch::Receiver<Option<FetchOutcome>>,
    ) -> Result<Quote, QuoteError> {
        loop {
            {
                let value = rx.borrow();
                if let Some(outcome) = value.as_ref() {
                    return outcome.clone().map_err(|e| QuoteError::Source {
                        symbol: symbol.clone(),
                        message: e.0,
                    });
                }
            }
            if rx.changed().await.is_err() {
                // The leader dropped without resolving (cancelled mid
                // fetch). Clear the dead marker so the next call retries.
                let mut state = self.state.lock().unwrap();
                if let Some(slot_rx) = state.in_flight.get(symbol) {
                    if slot_rx.has_changed().is_err() {
                        state.in_flight.remove(symbol);
                    }
                }
                return Err(QuoteError::FetchInterrupted(symbol.clone()));
            }
        }
    }
}
