//! Ledger address type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An address on the external ledger.
///
/// Addresses are assigned by the ledger (derived from a wallet's public key
/// by the crypto collaborator) and treated as opaque identifiers here. They
/// key the contract's `stakes` map and the vote-batch dedup check.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create an address from a raw string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the address is non-empty. The ledger never issues empty
    /// addresses, so an empty string always indicates malformed input.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
