//! Append-only vote batch files with sender dedup and receipt issuance.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use koru_crypto::{owner_to_address, sign_payload, verify_signature, KeyPair};
use koru_types::{BlockHeight, Receipt, VoteSubmission};

use crate::error::VoteError;

/// Result of a vote submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// First submission from this sender for this vote: stored and receipted.
    Accepted(Box<Receipt>),
    /// This sender already has an entry in the batch. Idempotent, not an
    /// error: the original entry stands.
    Duplicate,
    /// The signature does not validate against the claimed sender.
    InvalidSignature,
}

/// The unsigned receipt body; the receipt's signature covers exactly this.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptBody<'a> {
    vote: &'a VoteSubmission,
    block_height: BlockHeight,
}

/// Vote batch store: one append-only JSON-lines file per vote id.
///
/// `submit` serializes read-check-append per vote id behind an async
/// mutex, so concurrent submissions from the HTTP boundary cannot both
/// pass the dedup check. Distinct vote ids proceed in parallel.
pub struct VoteLedger {
    /// Directory holding one file per vote id.
    bundle_dir: PathBuf,
    /// This node's key pair, used to sign receipts.
    keypair: KeyPair,
    /// Per-vote-id write locks, created on first use.
    batch_locks: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
}

impl VoteLedger {
    /// Open (creating if needed) a vote ledger rooted at `bundle_dir`.
    pub fn open(bundle_dir: impl AsRef<Path>, keypair: KeyPair) -> Result<Self, VoteError> {
        let bundle_dir = bundle_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&bundle_dir)?;
        Ok(Self {
            bundle_dir,
            keypair,
            batch_locks: Mutex::new(HashMap::new()),
        })
    }

    fn batch_path(&self, vote_id: u64) -> PathBuf {
        self.bundle_dir.join(vote_id.to_string())
    }

    async fn lock_for(&self, vote_id: u64) -> Arc<Mutex<()>> {
        let mut locks = self.batch_locks.lock().await;
        locks.entry(vote_id).or_default().clone()
    }

    /// Submit a vote to its batch.
    ///
    /// Validates the signature against the claimed sender, appends unless
    /// the sender already has an entry, and signs a receipt only after the
    /// append has durably succeeded, so a receipt is never issued for
    /// data that was not recorded.
    pub async fn submit(
        &self,
        submission: VoteSubmission,
        block_height: BlockHeight,
    ) -> Result<SubmitOutcome, VoteError> {
        if !verify_signature(&submission.owner, &submission.vote, &submission.signature) {
            return Ok(SubmitOutcome::InvalidSignature);
        }
        match owner_to_address(&submission.owner) {
            Ok(derived) if derived == submission.sender_address => {}
            _ => return Ok(SubmitOutcome::InvalidSignature),
        }

        let vote_id = submission.vote.vote_id;
        let batch_lock = self.lock_for(vote_id).await;
        let _guard = batch_lock.lock().await;

        // Read-check-append under the batch lock.
        match self.read(vote_id).await {
            Ok(existing) => {
                if existing
                    .iter()
                    .any(|e| e.sender_address == submission.sender_address)
                {
                    tracing::debug!(
                        vote_id,
                        sender = %submission.sender_address,
                        "duplicate vote submission ignored"
                    );
                    return Ok(SubmitOutcome::Duplicate);
                }
            }
            Err(VoteError::BatchNotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let line = serde_json::to_string(&submission)?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.batch_path(vote_id))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.sync_data().await?;

        let signature = sign_payload(
            &self.keypair,
            &ReceiptBody {
                vote: &submission,
                block_height,
            },
        )?;
        tracing::info!(vote_id, sender = %submission.sender_address, "vote recorded");
        Ok(SubmitOutcome::Accepted(Box::new(Receipt {
            vote: submission,
            block_height,
            signature,
        })))
    }

    /// Drop write locks for vote ids not in `active`.
    ///
    /// The lock map otherwise grows by one entry per vote id ever
    /// submitted to. Batch files stay readable after pruning; an entry
    /// still held by an in-flight submit is kept and pruned on a later
    /// pass.
    pub async fn prune_locks(&self, active: &[u64]) {
        let mut locks = self.batch_locks.lock().await;
        locks.retain(|id, lock| active.contains(id) || Arc::strong_count(lock) > 1);
    }

    /// Read a vote batch in submission order.
    pub async fn read(&self, vote_id: u64) -> Result<Vec<VoteSubmission>, VoteError> {
        let raw = match tokio::fs::read_to_string(self.batch_path(vote_id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VoteError::BatchNotFound(vote_id));
            }
            Err(e) => return Err(e.into()),
        };

        raw.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|source| VoteError::CorruptBatch {
                    vote_id,
                    source,
                })
            })
            .collect()
    }

    /// Bundle the batches for `vote_ids` into one JSON export for the
    /// batch-submit transaction. Votes with no recorded batch are skipped.
    pub async fn export(&self, vote_ids: &[u64]) -> Result<String, VoteError> {
        let mut batches: HashMap<u64, Vec<VoteSubmission>> = HashMap::new();
        for &vote_id in vote_ids {
            match self.read(vote_id).await {
                Ok(batch) => {
                    batches.insert(vote_id, batch);
                }
                Err(VoteError::BatchNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(serde_json::to_string(&batches)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use koru_types::{Address, VotePayload};

    fn signed_submission(seed: u8, vote_id: u64, user_vote: bool) -> VoteSubmission {
        let kp = KeyPair::from_seed(&[seed; 32]);
        let vote = VotePayload { vote_id, user_vote };
        let signature = sign_payload(&kp, &vote).unwrap();
        VoteSubmission {
            sender_address: kp.address(),
            vote,
            signature,
            owner: kp.owner(),
        }
    }

    fn ledger(dir: &Path) -> VoteLedger {
        VoteLedger::open(dir, KeyPair::from_seed(&[200u8; 32])).unwrap()
    }

    #[tokio::test]
    async fn first_submission_is_accepted_with_receipt() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(dir.path());
        let sub = signed_submission(1, 7, true);

        let outcome = ledger.submit(sub.clone(), 1500).await.unwrap();
        let receipt = match outcome {
            SubmitOutcome::Accepted(r) => r,
            other => panic!("expected acceptance, got {other:?}"),
        };
        assert_eq!(receipt.block_height, 1500);
        assert_eq!(receipt.vote.sender_address, sub.sender_address);

        // Receipt signature verifies against this node's key.
        let node_kp = KeyPair::from_seed(&[200u8; 32]);
        assert!(verify_signature(
            &node_kp.owner(),
            &ReceiptBody {
                vote: &receipt.vote,
                block_height: receipt.block_height,
            },
            &receipt.signature
        ));
    }

    #[tokio::test]
    async fn same_sender_twice_is_duplicate_with_one_stored_entry() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(dir.path());

        let first = signed_submission(1, 7, true);
        let second = signed_submission(1, 7, false); // same sender, flipped vote

        assert!(matches!(
            ledger.submit(first, 1500).await.unwrap(),
            SubmitOutcome::Accepted(_)
        ));
        assert!(matches!(
            ledger.submit(second, 1501).await.unwrap(),
            SubmitOutcome::Duplicate
        ));

        let batch = ledger.read(7).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch[0].vote.user_vote);
    }

    #[tokio::test]
    async fn distinct_senders_share_a_batch() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(dir.path());

        for seed in 1..=3 {
            let outcome = ledger
                .submit(signed_submission(seed, 9, seed % 2 == 0), 100)
                .await
                .unwrap();
            assert!(matches!(outcome, SubmitOutcome::Accepted(_)));
        }
        assert_eq!(ledger.read(9).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn bad_signature_is_rejected_and_not_stored() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(dir.path());

        let mut sub = signed_submission(1, 7, true);
        sub.vote.user_vote = false; // invalidates the signature
        assert!(matches!(
            ledger.submit(sub, 100).await.unwrap(),
            SubmitOutcome::InvalidSignature
        ));
        assert!(matches!(
            ledger.read(7).await.unwrap_err(),
            VoteError::BatchNotFound(7)
        ));
    }

    #[tokio::test]
    async fn mismatched_sender_address_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(dir.path());

        let mut sub = signed_submission(1, 7, true);
        sub.sender_address = Address::new("someone-else");
        assert!(matches!(
            ledger.submit(sub, 100).await.unwrap(),
            SubmitOutcome::InvalidSignature
        ));
    }

    #[tokio::test]
    async fn read_missing_batch_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(dir.path());
        assert!(matches!(
            ledger.read(42).await.unwrap_err(),
            VoteError::BatchNotFound(42)
        ));
    }

    #[tokio::test]
    async fn concurrent_duplicates_store_exactly_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(ledger(dir.path()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = Arc::clone(&ledger);
            let sub = signed_submission(5, 11, true);
            handles.push(tokio::spawn(
                async move { ledger.submit(sub, 100).await },
            ));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                SubmitOutcome::Accepted(_) => accepted += 1,
                SubmitOutcome::Duplicate => {}
                SubmitOutcome::InvalidSignature => panic!("unexpected rejection"),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(ledger.read(11).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn export_skips_missing_batches() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(dir.path());
        ledger
            .submit(signed_submission(1, 7, true), 100)
            .await
            .unwrap();

        let export = ledger.export(&[7, 8]).await.unwrap();
        let parsed: HashMap<u64, Vec<VoteSubmission>> = serde_json::from_str(&export).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[&7].len(), 1);
    }

    #[tokio::test]
    async fn pruning_drops_idle_locks_for_inactive_votes() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(dir.path());
        for (seed, vote_id) in [(1u8, 7u64), (2, 8), (3, 9)] {
            ledger
                .submit(signed_submission(seed, vote_id, true), 100)
                .await
                .unwrap();
        }
        assert_eq!(ledger.batch_locks.lock().await.len(), 3);

        ledger.prune_locks(&[9]).await;
        let kept: Vec<u64> = ledger.batch_locks.lock().await.keys().copied().collect();
        assert_eq!(kept, vec![9]);

        // Pruned batches stay readable and writable.
        assert_eq!(ledger.read(7).await.unwrap().len(), 1);
        assert!(matches!(
            ledger.submit(signed_submission(4, 7, false), 101).await.unwrap(),
            SubmitOutcome::Accepted(_)
        ));
    }
}
