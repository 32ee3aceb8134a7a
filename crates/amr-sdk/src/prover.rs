//! External prover collaborator.
//!
//! Circuit artifacts are injected at construction; the protocol core never
//! loads build outputs from file paths. The prover's contract ends at a
//! serialized proof plus its public signals - argument encoding stays here.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};
use crate::spend::{RewardProofRequest, WithdrawProofRequest};

/// A compiled circuit and its proving key, as opaque bytes.
#[derive(Clone)]
pub struct CircuitArtifacts {
    pub circuit: Vec<u8>,
    pub proving_key: Vec<u8>,
}

/// Supplies artifacts for each spend path.
pub trait CircuitProvider {
    fn withdraw_circuit(&self) -> Result<&CircuitArtifacts>;
    fn reward_circuit(&self) -> Result<&CircuitArtifacts>;
}

/// Artifacts held in memory, handed over at construction.
pub struct StaticCircuitProvider {
    withdraw: CircuitArtifacts,
    reward: CircuitArtifacts,
}

impl StaticCircuitProvider {
    pub fn new(withdraw: CircuitArtifacts, reward: CircuitArtifacts) -> Self {
        Self { withdraw, reward }
    }
}

impl CircuitProvider for StaticCircuitProvider {
    fn withdraw_circuit(&self) -> Result<&CircuitArtifacts> {
        Ok(&self.withdraw)
    }

    fn reward_circuit(&self) -> Result<&CircuitArtifacts> {
        Ok(&self.reward)
    }
}

/// A serialized proof with its derived public signals, as the prover
/// returned them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofBundle {
    /// 0x-prefixed hex, ready for the spend entry point.
    pub proof: String,
    #[serde(default)]
    pub public_signals: Vec<String>,
}

/// Proof computation collaborator. Implementations should surface failures
/// as `ProofGenerationFailed`; they are never retried at this layer.
#[allow(async_fn_in_trait)]
pub trait SpendProver {
    async fn prove_withdraw(
        &self,
        artifacts: &CircuitArtifacts,
        request: &WithdrawProofRequest,
    ) -> Result<ProofBundle>;

    async fn prove_reward(
        &self,
        artifacts: &CircuitArtifacts,
        request: &RewardProofRequest,
    ) -> Result<ProofBundle>;
}

/// Reject malformed prover responses before they reach the ledger.
pub fn validate_proof_bundle(bundle: &ProofBundle) -> Result<()> {
    let body = bundle
        .proof
        .strip_prefix("0x")
        .ok_or_else(|| ClientError::ProofGenerationFailed("proof is not 0x-prefixed".into()))?;
    if body.is_empty() || hex::decode(body).is_err() {
        return Err(ClientError::ProofGenerationFailed(
            "proof is not valid hex".into(),
        ));
    }
    Ok(())
}
