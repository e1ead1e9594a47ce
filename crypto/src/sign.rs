//! Payload signing, verification, and address derivation.
//!
//! Payloads are signed over their canonical `serde_json` byte form. Both
//! sides serialize with the same serde definitions, so the bytes match.

use ed25519_dalek::{Signature, Signer, Verifier, VerifyingKey};
use serde::Serialize;
use sha2::{Digest, Sha256};

use koru_types::Address;

use crate::error::CryptoError;
use crate::keys::KeyPair;

/// Sign a payload, returning the hex-encoded detached signature.
pub fn sign_payload<T: Serialize>(keypair: &KeyPair, payload: &T) -> Result<String, CryptoError> {
    let bytes = serde_json::to_vec(payload)?;
    let sig = keypair.signing_key().sign(&bytes);
    Ok(hex::encode(sig.to_bytes()))
}

/// Verify a hex-encoded signature over a payload against a hex-encoded
/// owner public key.
///
/// Returns `false` for any malformed key, signature, or payload rather
/// than erroring: callers treat verification failure uniformly.
pub fn verify_signature<T: Serialize>(owner_hex: &str, payload: &T, signature_hex: &str) -> bool {
    let Ok(key_bytes) = hex::decode(owner_hex) else {
        return false;
    };
    let key_bytes: [u8; 32] = match key_bytes.try_into() {
        Ok(b) => b,
        Err(_) => return false,
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let sig_bytes: [u8; 64] = match sig_bytes.try_into() {
        Ok(b) => b,
        Err(_) => return false,
    };
    let Ok(payload_bytes) = serde_json::to_vec(payload) else {
        return false;
    };
    verifying_key
        .verify(&payload_bytes, &Signature::from_bytes(&sig_bytes))
        .is_ok()
}

/// Derive the ledger address for a hex-encoded owner public key.
///
/// Addresses are the hex-encoded SHA-256 of the raw public key bytes.
pub fn owner_to_address(owner_hex: &str) -> Result<Address, CryptoError> {
    let key_bytes =
        hex::decode(owner_hex).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    if key_bytes.len() != 32 {
        return Err(CryptoError::InvalidPublicKey(format!(
            "expected 32 bytes, got {}",
            key_bytes.len()
        )));
    }
    Ok(address_from_public_bytes(&key_bytes))
}

pub(crate) fn address_from_public_bytes(public: &[u8]) -> Address {
    let digest = Sha256::digest(public);
    Address::new(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Ballot {
        vote_id: u64,
        user_vote: bool,
    }

    #[test]
    fn sign_and_verify() {
        let kp = KeyPair::from_seed(&[3u8; 32]);
        let ballot = Ballot {
            vote_id: 7,
            user_vote: true,
        };
        let sig = sign_payload(&kp, &ballot).unwrap();
        assert!(verify_signature(&kp.owner(), &ballot, &sig));
    }

    #[test]
    fn tampered_payload_fails() {
        let kp = KeyPair::from_seed(&[3u8; 32]);
        let sig = sign_payload(
            &kp,
            &Ballot {
                vote_id: 7,
                user_vote: true,
            },
        )
        .unwrap();
        assert!(!verify_signature(
            &kp.owner(),
            &Ballot {
                vote_id: 7,
                user_vote: false,
            },
            &sig
        ));
    }

    #[test]
    fn wrong_owner_fails() {
        let kp = KeyPair::from_seed(&[3u8; 32]);
        let other = KeyPair::from_seed(&[4u8; 32]);
        let ballot = Ballot {
            vote_id: 1,
            user_vote: false,
        };
        let sig = sign_payload(&kp, &ballot).unwrap();
        assert!(!verify_signature(&other.owner(), &ballot, &sig));
    }

    #[test]
    fn malformed_inputs_verify_false_not_panic() {
        let ballot = Ballot {
            vote_id: 1,
            user_vote: true,
        };
        assert!(!verify_signature("zz-not-hex", &ballot, "00"));
        assert!(!verify_signature(&"aa".repeat(32), &ballot, "not-hex"));
        assert!(!verify_signature("aabb", &ballot, &"00".repeat(64)));
    }

    #[test]
    fn owner_to_address_matches_keypair_address() {
        let kp = KeyPair::from_seed(&[5u8; 32]);
        let derived = owner_to_address(&kp.owner()).unwrap();
        assert_eq!(derived, kp.address());
    }

    #[test]
    fn owner_to_address_rejects_short_keys() {
        assert!(owner_to_address("aabb").is_err());
    }
}
