//! Ed25519 wallet keys.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

use koru_types::Address;

use crate::error::CryptoError;
use crate::sign::address_from_public_bytes;

/// On-disk wallet format: a single hex-encoded Ed25519 seed.
#[derive(Serialize, Deserialize)]
struct WalletFile {
    secret_key: String,
}

/// An Ed25519 key pair identifying this node on the network.
#[derive(Clone)]
pub struct KeyPair {
    signing: SigningKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the OS random source.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Derive a key pair from a 32-byte seed (deterministic, for tests).
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(seed),
        }
    }

    /// Load a key pair from a wallet JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CryptoError> {
        let contents = std::fs::read_to_string(path)?;
        let wallet: WalletFile = serde_json::from_str(&contents)
            .map_err(|e| CryptoError::Wallet(format!("unparseable wallet file: {e}")))?;
        let bytes = hex::decode(&wallet.secret_key)
            .map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSecretKey("seed must be 32 bytes".into()))?;
        Ok(Self::from_seed(&seed))
    }

    /// Write the key pair to a wallet JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CryptoError> {
        let wallet = WalletFile {
            secret_key: hex::encode(self.signing.to_bytes()),
        };
        std::fs::write(path, serde_json::to_string_pretty(&wallet)?)?;
        Ok(())
    }

    /// Hex-encoded public key — the `owner` field of wire payloads.
    pub fn owner(&self) -> String {
        hex::encode(self.signing.verifying_key().to_bytes())
    }

    /// The ledger address this key pair controls.
    pub fn address(&self) -> Address {
        address_from_public_bytes(&self.signing.verifying_key().to_bytes())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_seed_is_deterministic() {
        let a = KeyPair::from_seed(&[7u8; 32]);
        let b = KeyPair::from_seed(&[7u8; 32]);
        assert_eq!(a.owner(), b.owner());
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn distinct_seeds_give_distinct_owners() {
        let a = KeyPair::from_seed(&[1u8; 32]);
        let b = KeyPair::from_seed(&[2u8; 32]);
        assert_ne!(a.owner(), b.owner());
    }

    #[test]
    fn wallet_file_round_trip() {
        let dir = std::env::temp_dir().join("koru-wallet-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("wallet.json");

        let kp = KeyPair::from_seed(&[9u8; 32]);
        kp.save(&path).unwrap();
        let loaded = KeyPair::load(&path).unwrap();
        assert_eq!(kp.owner(), loaded.owner());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = std::env::temp_dir().join("koru-wallet-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("garbage.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(KeyPair::load(&path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
