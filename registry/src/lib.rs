//! Peer registry gossip.
//!
//! Each node keeps a registry mapping owner public keys to their latest
//! signed registration, filtered to owners holding stake. Registries
//! converge by periodic anti-entropy rounds: pull a random peer's
//! registry, merge by recency, and push a fresh self-registration back.

pub mod error;
pub mod gossip;
pub mod merge;
pub mod store;

pub use error::RegistryError;
pub use gossip::{Gossip, GossipClient};
pub use merge::merge;
pub use store::Registry;
