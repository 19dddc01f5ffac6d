//! TTL-based quote caching with single-flight fetch deduplication.
//!
//! [`QuoteCache`] sits in front of a slow, rate-limit-sensitive
//! [`QuoteSource`]. Fresh values are served from memory; misses for the
//! same symbol are collapsed into one source call whose outcome every
//! concurrent caller shares.

pub mod cache;
pub mod error;
pub mod source;

pub use cache::QuoteCache;
pub use error::QuoteError;
pub use source::{InMemoryQuoteSource, Quote, QuoteSource};
