//! HTTP surface of a service node.
//!
//! Peers and voters talk to a service node over plain JSON HTTP: vote
//! submission, registry gossip, batch retrieval, and a cached view of the
//! contract state. Witness nodes do not serve this surface.

pub mod error;
pub mod server;

pub use error::RpcError;
pub use server::{router, RpcServer, RpcState};
