//! Node roles and the capabilities they grant.

use std::fmt;

/// What kind of participant this node is.
///
/// Roles only widen or narrow which actions the run loop executes; the
/// epoch windows and state machine are identical for all of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Full participant: serves the RPC surface, collects votes, submits
    /// traffic logs and vote batches, and gossips the registry.
    Service,
    /// Observes gateway traffic directly and submits traffic logs, but
    /// collects no votes and serves no RPC.
    WitnessDirect,
    /// Audits without direct gateway access; its only ledger write is the
    /// slash proposal.
    WitnessIndirect,
}

impl Role {
    /// Whether this role submits traffic logs.
    pub fn submits_traffic_logs(&self) -> bool {
        matches!(self, Self::Service | Self::WitnessDirect)
    }

    /// Whether this role collects votes and publishes vote batches.
    pub fn submits_vote_batches(&self) -> bool {
        matches!(self, Self::Service)
    }

    /// Whether this role proposes slashes.
    pub fn proposes_slashes(&self) -> bool {
        matches!(self, Self::WitnessIndirect)
    }

    /// Whether this role participates in registry gossip and serves the
    /// HTTP surface.
    pub fn serves_network(&self) -> bool {
        matches!(self, Self::Service)
    }

    /// Whether ballots go straight to the ledger instead of through a
    /// bundler relay.
    pub fn casts_direct_votes(&self) -> bool {
        matches!(self, Self::WitnessDirect)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Service => "service",
            Self::WitnessDirect => "witness-direct",
            Self::WitnessIndirect => "witness-indirect",
        };
        write!(f, "{name}")
    }
}
