//! External-ledger collaborator boundary.
//!
//! The node core never talks to the ledger directly; it goes through the
//! [`LedgerReader`] and [`LedgerWriter`] traits defined here. The
//! [`HttpGateway`] implementation speaks to a bundler-style HTTP gateway.
//! The [`Cache`] trait covers the opportunistic state cache; its
//! unavailability degrades to direct ledger reads and never crashes the
//! loop.

pub mod cache;
pub mod error;
pub mod http;
pub mod state_cache;
pub mod traits;

pub use cache::{Cache, MemoryCache};
pub use error::GatewayError;
pub use http::HttpGateway;
pub use traits::{LedgerReader, LedgerWriter, TrafficLogArgs, TxRecord, VoteArgs, VoteOutcome};

use std::sync::Arc;

/// Shared handle to a ledger reader.
pub type ReaderHandle = Arc<dyn LedgerReader>;
/// Shared handle to a ledger writer.
pub type WriterHandle = Arc<dyn LedgerWriter>;
/// Shared handle to a cache.
pub type CacheHandle = Arc<dyn Cache>;
