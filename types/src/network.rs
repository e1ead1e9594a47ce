//! Network identifier.

use serde::{Deserialize, Serialize};

use crate::ProtocolParams;

/// Which Koru network a node participates in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The live network.
    Main,
    /// Local development network with compressed epoch windows.
    Dev,
}

impl NetworkId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Dev => "dev",
        }
    }

    /// The protocol parameters this network runs with.
    pub fn params(&self) -> ProtocolParams {
        match self {
            Self::Main => ProtocolParams::mainnet(),
            Self::Dev => ProtocolParams::devnet(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&NetworkId::Main).unwrap(), "\"main\"");
        let parsed: NetworkId = serde_json::from_str("\"dev\"").unwrap();
        assert_eq!(parsed, NetworkId::Dev);
    }
}
