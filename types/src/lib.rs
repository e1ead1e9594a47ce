//! Fundamental types for the Koru attention network.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: addresses, block heights, the observed contract state, vote
//! submissions and receipts, node registrations, and the network-wide
//! protocol parameters (epoch window offsets).

pub mod address;
pub mod network;
pub mod params;
pub mod registration;
pub mod state;
pub mod vote;

pub use address::Address;
pub use network::NetworkId;
pub use params::ProtocolParams;
pub use registration::{NodeRegistration, RegistrationData};
pub use state::{ContractState, EpochRecord, LogProposal, TrafficEpoch, Vote};
pub use vote::{Receipt, VotePayload, VoteSubmission};

/// A block height on the external ledger. Monotonically increasing.
pub type BlockHeight = u64;

/// A Unix timestamp in milliseconds, as carried in registration payloads.
pub type UnixMillis = u64;

/// A transaction id on the external ledger (opaque string).
pub type TxId = String;
