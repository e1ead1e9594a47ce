//! The Koru node core.
//!
//! A node observes the shared attention-contract state and the ledger's
//! block height, and performs a sequence of time-windowed, idempotent
//! on-chain actions exactly once per epoch: submit a traffic log, cast
//! votes, rank the reward proposal, distribute rewards, or propose
//! slashing a misbehaving bundler.
//!
//! The pieces:
//! - [`epoch`] — pure block-height window classification
//! - [`state`] — per-epoch idempotency flags and the `evaluate` transition
//! - [`tx_waiter`] — the single confirmation-polling retry primitive
//! - [`role`] — Service / Witness capability gating
//! - [`node`] — the outer action loop and periodic background tasks

pub mod config;
pub mod epoch;
pub mod error;
pub mod node;
pub mod role;
pub mod shutdown;
pub mod state;
pub mod traffic;
pub mod tx_waiter;

pub use config::NodeConfig;
pub use error::NodeError;
pub use node::{KoruNode, NodeDeps};
pub use role::Role;
pub use shutdown::ShutdownController;
pub use state::{DueAction, NodeIdentity, NodeRunState};
pub use traffic::{FileLogSource, TrafficLogSource};
pub use tx_waiter::TxWaiter;
