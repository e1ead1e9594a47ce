//! The vote-batch ledger.
//!
//! Inbound vote submissions are persisted as one append-only JSON-lines
//! file per vote id under a bundles directory. The ledger enforces the
//! no-duplicate-sender invariant per batch and issues a signed receipt
//! only after the submission has durably reached disk.

pub mod error;
pub mod ledger;

pub use error::VoteError;
pub use ledger::{SubmitOutcome, VoteLedger};
