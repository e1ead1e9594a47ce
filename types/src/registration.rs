//! Node registry registrations.

use serde::{Deserialize, Serialize};

use crate::UnixMillis;

/// The signed portion of a node registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationData {
    /// Publicly reachable base URL of the registering node.
    pub url: String,
    /// When the registration was signed. For a fixed owner only the
    /// registration with the greatest timestamp is retained.
    pub timestamp: UnixMillis,
}

/// A node's self-registration as gossiped between peers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRegistration {
    /// Hex-encoded public key of the registering node. The registry keeps
    /// one entry per owner.
    pub owner: String,
    /// Hex-encoded signature over the serialized `data`.
    pub signature: String,
    /// The advertised URL and its freshness timestamp.
    pub data: RegistrationData,
}

impl NodeRegistration {
    /// Structural validity: owner, signature, and URL are all present.
    /// Registrations failing this are dropped before signature checks.
    pub fn is_well_formed(&self) -> bool {
        !self.owner.is_empty() && !self.signature.is_empty() && !self.data.url.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> NodeRegistration {
        NodeRegistration {
            owner: "aa".repeat(32),
            signature: "bb".repeat(64),
            data: RegistrationData {
                url: "https://node.example:8887".into(),
                timestamp: 1_700_000_000_000,
            },
        }
    }

    #[test]
    fn well_formed_registration() {
        assert!(registration().is_well_formed());
    }

    #[test]
    fn empty_url_is_malformed() {
        let mut reg = registration();
        reg.data.url.clear();
        assert!(!reg.is_well_formed());
    }

    #[test]
    fn wire_format_nests_data() {
        let json = serde_json::to_value(registration()).unwrap();
        assert!(json["data"].get("url").is_some());
        assert!(json["data"].get("timestamp").is_some());
    }
}
