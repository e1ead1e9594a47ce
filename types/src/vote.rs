//! Vote submissions and receipts.

use serde::{Deserialize, Serialize};

use crate::{Address, BlockHeight};

/// The signed inner payload of a vote submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePayload {
    /// Which contract vote this ballot belongs to.
    pub vote_id: u64,
    /// The voter's yes/no verdict on the proposal.
    pub user_vote: bool,
}

/// A vote submitted to this node's vote endpoint.
///
/// The signature must validate against `sender_address`'s key over the
/// serialized `vote` payload; the vote ledger rejects it otherwise.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSubmission {
    /// Ledger address of the voter.
    pub sender_address: Address,
    /// The ballot itself.
    pub vote: VotePayload,
    /// Hex-encoded Ed25519 signature over the serialized ballot.
    pub signature: String,
    /// Hex-encoded public key of the voter, used to verify `signature`
    /// and from which `sender_address` must derive.
    pub owner: String,
}

impl VoteSubmission {
    /// Structural validity: every field the ledger relies on is present.
    /// Signature validity is checked separately by the crypto collaborator.
    pub fn is_well_formed(&self) -> bool {
        self.sender_address.is_valid() && !self.signature.is_empty() && !self.owner.is_empty()
    }
}

/// A signed acknowledgement that a vote was durably recorded.
///
/// Issued only after the submission has been appended to the batch file,
/// so a receipt can never reference a vote that was not stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// The recorded submission.
    pub vote: VoteSubmission,
    /// Block height observed when the receipt was issued.
    pub block_height: BlockHeight,
    /// Hex-encoded signature by this node over `(vote, block_height)`.
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> VoteSubmission {
        VoteSubmission {
            sender_address: Address::new("voter-1"),
            vote: VotePayload {
                vote_id: 7,
                user_vote: true,
            },
            signature: "ab".repeat(64),
            owner: "cd".repeat(32),
        }
    }

    #[test]
    fn well_formed_submission_passes() {
        assert!(submission().is_well_formed());
    }

    #[test]
    fn missing_signature_is_malformed() {
        let mut sub = submission();
        sub.signature.clear();
        assert!(!sub.is_well_formed());
    }

    #[test]
    fn submission_uses_camel_case_wire_names() {
        let json = serde_json::to_value(submission()).unwrap();
        assert!(json.get("senderAddress").is_some());
        assert!(json["vote"].get("voteId").is_some());
        assert!(json["vote"].get("userVote").is_some());
    }
}
