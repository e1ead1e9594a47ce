//! Cryptographic collaborator for the Koru node.
//!
//! Everything here operates on the hex-encoded keys and signatures carried
//! in wire payloads: payload signing, signature verification, and
//! owner-key-to-address derivation. The node core treats this crate as an
//! external collaborator and never touches key material directly.

pub mod error;
pub mod keys;
pub mod sign;

pub use error::CryptoError;
pub use keys::KeyPair;
pub use sign::{owner_to_address, sign_payload, verify_signature};
