//! Ledger collaborator interface.
//!
//! The on-chain pool is the single source of truth: the client reads its
//! append-only event log and state views and submits calls, nothing more.
//! Nullifier uniqueness is enforced by the ledger, so a spend raced by
//! another client surfaces as a rejection here, not as a client bug.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::Address;
use crate::error::{ClientError, Result};
use crate::spend::{RewardArgs, WithdrawArgs};

/// One `Deposit` event per accepted commitment, emitted in acceptance
/// order. Leaf indices are dense, zero-based, monotonically assigned.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommitmentEvent {
    pub commitment: [u8; 32],
    pub leaf_index: u64,
    pub timestamp: u64,
    pub block_number: u64,
    pub tx_hash: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WithdrawalEvent {
    pub nullifier_hash: [u8; 32],
    pub to: Address,
    pub fee: u128,
    pub block_number: u64,
    pub tx_hash: String,
}

/// Marks the ledger height as of which the reward tree was last frozen.
/// Only commitments at or before this height are reward-eligible.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RewardCheckpointEvent {
    pub update_at_block: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: u64,
    pub from: Address,
}

/// Gateway to the pool contract. Implementations wrap a node RPC; the
/// in-memory implementation used by the scenario tests lives with them.
#[allow(async_fn_in_trait)]
pub trait LedgerGateway {
    async fn net_id(&self) -> Result<u64>;

    /// Commitment events in `[from_block, to_block]`; `None` means latest.
    async fn commitment_events(
        &self,
        from_block: u64,
        to_block: Option<u64>,
    ) -> Result<Vec<CommitmentEvent>>;

    async fn withdrawal_events(&self) -> Result<Vec<WithdrawalEvent>>;

    async fn reward_checkpoints(&self) -> Result<Vec<RewardCheckpointEvent>>;

    async fn is_known_root(&self, root: &[u8; 32]) -> Result<bool>;

    async fn is_reward_root(&self, root: &[u8; 32]) -> Result<bool>;

    async fn is_spent(&self, withdraw_nullifier_hash: &[u8; 32]) -> Result<bool>;

    async fn is_redeemed(&self, reward_nullifier_hash: &[u8; 32]) -> Result<bool>;

    async fn submit_deposit(&self, commitment: &[u8; 32], value: u128) -> Result<String>;

    async fn submit_withdraw(&self, proof: &str, args: &WithdrawArgs) -> Result<String>;

    async fn submit_reward(&self, proof: &str, args: &RewardArgs) -> Result<String>;

    async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>>;
}

/// Receipt queries before giving up on a submitted transaction.
pub const RECEIPT_RETRY_ATTEMPTS: u32 = 60;

/// Delay between receipt queries.
pub const RECEIPT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Poll the ledger until the transaction is mined. Bounded: fails with
/// `TransactionNotMined` once the attempt budget is exhausted; the caller
/// may re-query manually afterwards.
pub async fn wait_for_receipt<L: LedgerGateway>(ledger: &L, tx_hash: &str) -> Result<TxReceipt> {
    for attempt in 0..RECEIPT_RETRY_ATTEMPTS {
        if let Some(receipt) = ledger.transaction_receipt(tx_hash).await? {
            debug!("transaction {} mined in block {}", tx_hash, receipt.block_number);
            return Ok(receipt);
        }
        if attempt + 1 < RECEIPT_RETRY_ATTEMPTS {
            tokio::time::sleep(RECEIPT_RETRY_DELAY).await;
        }
    }
    Err(ClientError::TransactionNotMined(tx_hash.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Answers receipt queries with `None` until the configured attempt.
    struct SlowLedger {
        ready_after: u32,
        queries: AtomicU32,
    }

    impl SlowLedger {
        fn new(ready_after: u32) -> Self {
            Self {
                ready_after,
                queries: AtomicU32::new(0),
            }
        }
    }

    impl LedgerGateway for SlowLedger {
        async fn net_id(&self) -> Result<u64> {
            Ok(1)
        }

        async fn commitment_events(
            &self,
            _from_block: u64,
            _to_block: Option<u64>,
        ) -> Result<Vec<CommitmentEvent>> {
            Ok(Vec::new())
        }

        async fn withdrawal_events(&self) -> Result<Vec<WithdrawalEvent>> {
            Ok(Vec::new())
        }

        async fn reward_checkpoints(&self) -> Result<Vec<RewardCheckpointEvent>> {
            Ok(Vec::new())
        }

        async fn is_known_root(&self, _root: &[u8; 32]) -> Result<bool> {
            Ok(false)
        }

        async fn is_reward_root(&self, _root: &[u8; 32]) -> Result<bool> {
            Ok(false)
        }

        async fn is_spent(&self, _nullifier_hash: &[u8; 32]) -> Result<bool> {
            Ok(false)
        }

        async fn is_redeemed(&self, _nullifier_hash: &[u8; 32]) -> Result<bool> {
            Ok(false)
        }

        async fn submit_deposit(&self, _commitment: &[u8; 32], _value: u128) -> Result<String> {
            Err(ClientError::Ledger("not supported".into()))
        }

        async fn submit_withdraw(&self, _proof: &str, _args: &WithdrawArgs) -> Result<String> {
            Err(ClientError::Ledger("not supported".into()))
        }

        async fn submit_reward(&self, _proof: &str, _args: &RewardArgs) -> Result<String> {
            Err(ClientError::Ledger("not supported".into()))
        }

        async fn transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>> {
            let n = self.queries.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= self.ready_after {
                Ok(Some(TxReceipt {
                    tx_hash: tx_hash.to_string(),
                    block_number: 10,
                    from: Address::ZERO,
                }))
            } else {
                Ok(None)
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_receipt_retries_until_mined() {
        let ledger = SlowLedger::new(5);
        let receipt = wait_for_receipt(&ledger, "0xabc").await.unwrap();
        assert_eq!(receipt.block_number, 10);
        assert_eq!(ledger.queries.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_receipt_bounded() {
        let ledger = SlowLedger::new(RECEIPT_RETRY_ATTEMPTS + 1);
        match wait_for_receipt(&ledger, "0xdead").await {
            Err(ClientError::TransactionNotMined(hash)) => assert_eq!(hash, "0xdead"),
            other => panic!("expected TransactionNotMined, got {:?}", other.map(|r| r.tx_hash)),
        }
        assert_eq!(ledger.queries.load(Ordering::SeqCst), RECEIPT_RETRY_ATTEMPTS);
    }
}
