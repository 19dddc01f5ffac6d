//! Quote error types.

use common::Symbol;
use thiserror::Error;

/// Errors that can occur during quote lookups.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// The quote source does not know the symbol.
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(Symbol),

    /// The quote source failed; shared by every caller waiting on the
    /// same fetch.
    #[error("Quote source failed for {symbol}: {message}")]
    Source { symbol: Symbol, message: String },

    /// The fetch we were waiting on ended without resolving. The next
    /// call for the symbol starts a fresh fetch.
    #[error("Fetch for {0} was interrupted before resolving")]
    FetchInterrupted(Symbol),
}

/// Convenience type alias for quote results.
pub type Result<T> = std::result::Result<T, QuoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_symbol() {
        let err = QuoteError::UnknownSymbol(Symbol::new("ZZZZ"));
        assert_eq!(err.to_string(), "Unknown symbol: ZZZZ");

        let err = QuoteError::Source {
            symbol: Symbol::new("AAPL"),
            message: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "Quote source failed for AAPL: timeout");
    }
}
