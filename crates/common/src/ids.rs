//! Opaque string identifiers.
//!
//! Each identifier wraps a `String` to prevent mixing up, say, an order
//! identifier with a customer identifier at a call site. Validity rules
//! (such as non-emptiness) are enforced where the identifier is first
//! accepted, not by the constructor, since the values themselves are
//! opaque to this system.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is empty.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Identifier of a logical order; unique per payment transaction.
    OrderId
}

string_id! {
    /// Identifier of the customer placing an order.
    CustomerId
}

string_id! {
    /// Transaction identifier assigned by the payment gateway on a
    /// successful charge.
    TransactionId
}

string_id! {
    /// Ticker symbol understood by the quote source (e.g. "AAPL").
    Symbol
}
