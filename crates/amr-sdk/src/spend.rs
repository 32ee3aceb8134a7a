//! Spend assembly: the structured prover request plus the ordered argument
//! tuple the pool's spend entry points expect.
//!
//! The withdraw path exposes both nullifier hashes publicly even though only
//! the withdraw nullifier is consumed - the pool can then reject a note
//! whose withdraw path is spent while leaving the reward path independently
//! spendable. The reward path exposes only the reward nullifier hash; the
//! withdraw hash moves to the private witness.

use serde::{Deserialize, Serialize};

use crate::crypto::{to_hex, u128_to_hex32, Address, SECRET_BYTES};
use crate::deposit::Deposit;
use crate::merkle::MerkleProof;

#[derive(Clone, Debug, Serialize)]
pub struct WithdrawPublicInputs {
    pub root: [u8; 32],
    pub withdraw_nullifier_hash: [u8; 32],
    pub reward_nullifier_hash: [u8; 32],
    pub recipient: Address,
    pub relayer: Address,
    pub fee: u128,
    pub refund: u128,
}

/// Never leaves the client except inside a proof request to the local prover.
#[derive(Clone, Serialize)]
pub struct WithdrawPrivateInputs {
    pub withdraw_nullifier: [u8; SECRET_BYTES],
    pub reward_nullifier: [u8; SECRET_BYTES],
    pub secret: [u8; SECRET_BYTES],
    pub path_elements: Vec<[u8; 32]>,
    pub path_indices: Vec<u8>,
}

#[derive(Clone, Serialize)]
pub struct WithdrawProofRequest {
    pub public: WithdrawPublicInputs,
    pub private: WithdrawPrivateInputs,
}

#[derive(Clone, Debug, Serialize)]
pub struct RewardPublicInputs {
    pub root: [u8; 32],
    pub reward_nullifier_hash: [u8; 32],
    pub recipient: Address,
    pub relayer: Address,
    pub fee: u128,
    pub refund: u128,
}

#[derive(Clone, Serialize)]
pub struct RewardPrivateInputs {
    pub withdraw_nullifier_hash: [u8; 32],
    pub withdraw_nullifier: [u8; SECRET_BYTES],
    pub reward_nullifier: [u8; SECRET_BYTES],
    pub secret: [u8; SECRET_BYTES],
    pub path_elements: Vec<[u8; 32]>,
    pub path_indices: Vec<u8>,
}

#[derive(Clone, Serialize)]
pub struct RewardProofRequest {
    pub public: RewardPublicInputs,
    pub private: RewardPrivateInputs,
}

/// Ordered argument tuple for the pool's `withdraw` entry point.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WithdrawArgs {
    pub root: [u8; 32],
    pub withdraw_nullifier_hash: [u8; 32],
    pub reward_nullifier_hash: [u8; 32],
    pub recipient: Address,
    pub relayer: Address,
    pub fee: u128,
    pub refund: u128,
}

impl WithdrawArgs {
    /// Wire encoding in entry-point order: 32-byte big-endian hex for field
    /// and numeric values, 20-byte hex for addresses.
    pub fn to_hex_tuple(&self) -> Vec<String> {
        vec![
            to_hex(&self.root),
            to_hex(&self.withdraw_nullifier_hash),
            to_hex(&self.reward_nullifier_hash),
            self.recipient.to_hex(),
            self.relayer.to_hex(),
            u128_to_hex32(self.fee),
            u128_to_hex32(self.refund),
        ]
    }
}

/// Ordered argument tuple for the pool's `reward` entry point.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewardArgs {
    pub root: [u8; 32],
    pub reward_nullifier_hash: [u8; 32],
    pub recipient: Address,
    pub relayer: Address,
    pub fee: u128,
    pub refund: u128,
}

impl RewardArgs {
    pub fn to_hex_tuple(&self) -> Vec<String> {
        vec![
            to_hex(&self.root),
            to_hex(&self.reward_nullifier_hash),
            self.recipient.to_hex(),
            self.relayer.to_hex(),
            u128_to_hex32(self.fee),
            u128_to_hex32(self.refund),
        ]
    }
}

pub struct WithdrawSpend {
    pub request: WithdrawProofRequest,
    pub args: WithdrawArgs,
}

pub struct RewardSpend {
    pub request: RewardProofRequest,
    pub args: RewardArgs,
}

pub fn assemble_withdraw(
    deposit: &Deposit,
    merkle_proof: &MerkleProof,
    recipient: Address,
    relayer: Address,
    fee: u128,
    refund: u128,
) -> WithdrawSpend {
    let public = WithdrawPublicInputs {
        root: merkle_proof.root,
        withdraw_nullifier_hash: deposit.withdraw_nullifier_hash(),
        reward_nullifier_hash: deposit.reward_nullifier_hash(),
        recipient,
        relayer,
        fee,
        refund,
    };
    let private = WithdrawPrivateInputs {
        withdraw_nullifier: *deposit.withdraw_nullifier(),
        reward_nullifier: *deposit.reward_nullifier(),
        secret: *deposit.secret(),
        path_elements: merkle_proof.path_elements.clone(),
        path_indices: merkle_proof.path_indices.clone(),
    };
    let args = WithdrawArgs {
        root: public.root,
        withdraw_nullifier_hash: public.withdraw_nullifier_hash,
        reward_nullifier_hash: public.reward_nullifier_hash,
        recipient,
        relayer,
        fee,
        refund,
    };

    WithdrawSpend {
        request: WithdrawProofRequest { public, private },
        args,
    }
}

pub fn assemble_reward(
    deposit: &Deposit,
    merkle_proof: &MerkleProof,
    recipient: Address,
    relayer: Address,
    fee: u128,
    refund: u128,
) -> RewardSpend {
    let public = RewardPublicInputs {
        root: merkle_proof.root,
        reward_nullifier_hash: deposit.reward_nullifier_hash(),
        recipient,
        relayer,
        fee,
        refund,
    };
    let private = RewardPrivateInputs {
        withdraw_nullifier_hash: deposit.withdraw_nullifier_hash(),
        withdraw_nullifier: *deposit.withdraw_nullifier(),
        reward_nullifier: *deposit.reward_nullifier(),
        secret: *deposit.secret(),
        path_elements: merkle_proof.path_elements.clone(),
        path_indices: merkle_proof.path_indices.clone(),
    };
    let args = RewardArgs {
        root: public.root,
        reward_nullifier_hash: public.reward_nullifier_hash,
        recipient,
        relayer,
        fee,
        refund,
    };

    RewardSpend {
        request: RewardProofRequest { public, private },
        args,
    }
}
