//! Explicit session context.
//!
//! Every operation receives this immutable view of the active network and
//! its deployments; there is no process-wide mutable state.

use std::collections::HashMap;

use crate::crypto::Address;
use crate::error::{ClientError, Result};
use crate::ledger::LedgerGateway;
use crate::merkle::DEFAULT_TREE_HEIGHT;

/// Blocks between reward checkpoints unless the deployment says otherwise.
pub const DEFAULT_REWARD_CHECKPOINT_INTERVAL: u64 = 100;

/// One deployed pool: a fixed currency and denomination.
#[derive(Clone, Debug)]
pub struct Instance {
    pub address: Address,
    /// Token contract for non-native pools.
    pub token_address: Option<Address>,
    pub decimals: u32,
}

/// Deployment registry: (currency, denomination) -> pool instance.
#[derive(Clone, Debug, Default)]
pub struct InstanceRegistry {
    instances: HashMap<(String, String), Instance>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(mut self, currency: &str, amount: &str, instance: Instance) -> Self {
        self.instances
            .insert((currency.to_string(), amount.to_string()), instance);
        self
    }

    pub fn lookup(&self, currency: &str, amount: &str) -> Result<&Instance> {
        self.instances
            .get(&(currency.to_string(), amount.to_string()))
            .ok_or_else(|| ClientError::UnknownInstance(format!("{} {}", amount, currency)))
    }
}

#[derive(Clone, Debug)]
pub struct Session {
    pub net_id: u64,
    pub tree_height: usize,
    /// Deployment parameter bounding how often the reward tree is frozen.
    pub reward_checkpoint_interval: u64,
    pub registry: InstanceRegistry,
}

impl Session {
    pub fn new(net_id: u64, registry: InstanceRegistry) -> Self {
        Self {
            net_id,
            tree_height: DEFAULT_TREE_HEIGHT,
            reward_checkpoint_interval: DEFAULT_REWARD_CHECKPOINT_INTERVAL,
            registry,
        }
    }

    /// Build a session on the network the ledger actually reports.
    pub async fn from_ledger<L: LedgerGateway>(
        ledger: &L,
        registry: InstanceRegistry,
    ) -> Result<Self> {
        Ok(Self::new(ledger.net_id().await?, registry))
    }

    pub fn with_tree_height(mut self, height: usize) -> Self {
        self.tree_height = height;
        self
    }

    pub fn with_reward_checkpoint_interval(mut self, blocks: u64) -> Self {
        self.reward_checkpoint_interval = blocks;
        self
    }

    pub fn instance(&self, currency: &str, amount: &str) -> Result<&Instance> {
        self.registry.lookup(currency, amount)
    }

    /// A note minted on another ledger cannot be spent in this session.
    pub fn ensure_note_network(&self, note_net_id: u64) -> Result<()> {
        if note_net_id != self.net_id {
            return Err(ClientError::NetworkMismatch {
                expected: self.net_id,
                actual: note_net_id.to_string(),
            });
        }
        Ok(())
    }
}
