//! Bounded polling for ledger transaction confirmation.

use std::time::Duration;

use koru_gateway::{GatewayError, ReaderHandle};
use koru_utils::format_duration;

/// How often to re-query the gateway for an unmined transaction.
const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Give up waiting for a transaction after this long. A transaction that
/// has not mined in thirty minutes is treated as dropped; the action flag
/// stays unset and the action retries next epoch pass.
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Log a progress line roughly once a minute while waiting.
const POLLS_PER_PROGRESS_LOG: u32 = 6;

/// Polls the ledger until a submitted transaction is mined or a deadline
/// passes.
pub struct TxWaiter {
    reader: ReaderHandle,
    poll_interval: Duration,
    timeout: Duration,
}

impl TxWaiter {
    pub fn new(reader: ReaderHandle) -> Self {
        Self {
            reader,
            poll_interval: POLL_INTERVAL,
            timeout: CONFIRM_TIMEOUT,
        }
    }

    #[cfg(test)]
    fn with_intervals(reader: ReaderHandle, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            reader,
            poll_interval,
            timeout,
        }
    }

    /// Wait until `tx_id` appears mined on the ledger.
    ///
    /// Returns `true` on confirmation and `false` if the deadline passed
    /// first. `TxNotFound` and transient gateway failures both keep the
    /// poll going; only the clock ends it.
    pub async fn await_confirmation(&self, tx_id: &str, label: &str) -> bool {
        let started = tokio::time::Instant::now();
        let mut polls: u32 = 0;
        loop {
            if started.elapsed() >= self.timeout {
                tracing::warn!(
                    tx_id,
                    label,
                    waited = %format_duration(started.elapsed().as_secs()),
                    "gave up waiting for transaction confirmation"
                );
                return false;
            }

            match self.reader.get_transaction(tx_id).await {
                Ok(record) if record.block_height.is_some() => {
                    tracing::info!(
                        tx_id,
                        label,
                        block_height = record.block_height,
                        waited = %format_duration(started.elapsed().as_secs()),
                        "transaction confirmed"
                    );
                    return true;
                }
                Ok(_) | Err(GatewayError::TxNotFound(_)) => {
                    // Not mined yet.
                }
                Err(err) if err.is_transient() => {
                    tracing::debug!(tx_id, label, error = %err, "gateway hiccup while polling, retrying");
                }
                Err(err) => {
                    tracing::warn!(tx_id, label, error = %err, "gateway error while polling, retrying");
                }
            }

            polls += 1;
            if polls % POLLS_PER_PROGRESS_LOG == 0 {
                tracing::info!(
                    tx_id,
                    label,
                    waited = %format_duration(started.elapsed().as_secs()),
                    "still waiting for transaction confirmation"
                );
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
