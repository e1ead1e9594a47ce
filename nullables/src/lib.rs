//! Configurable test doubles.
//!
//! Scripted stand-ins for the collaborators at the node's boundary, so
//! the action loop, the waiter, and the HTTP handlers can be exercised
//! without a ledger or a cache backend. They implement the real traits
//! and record every write for assertion.

mod cache;
mod gateway;

pub use cache::NullCache;
pub use gateway::NullGateway;
