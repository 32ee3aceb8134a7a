//! High-level pool operations: deposit, withdraw, redeem.
//!
//! Each spend runs through the same sequence - parse the note, rebuild the
//! anonymity set, run the safety checks, assemble and prove, then submit
//! either directly or through a relayer. Submission and confirmation are
//! two explicit await points; the result carries the mined receipt.

use tracing::info;

use amr_net::HttpClient;

use crate::anonymity::{build_reward_tree, build_withdraw_tree, prove_membership};
use crate::crypto::Address;
use crate::deposit::Deposit;
use crate::error::{ClientError, Result};
use crate::fee::{compute_relayer_fee, ensure_affordable, from_decimals, to_decimals, FeeQuote, NATIVE_CURRENCY};
use crate::ledger::{wait_for_receipt, LedgerGateway};
use crate::merkle::MerkleProof;
use crate::note::{parse_note, serialize_note, ParsedNote};
use crate::prover::{validate_proof_bundle, CircuitProvider, SpendProver};
use crate::relayer::RelayerClient;
use crate::session::{Instance, Session};
use crate::spend::{assemble_reward, assemble_withdraw};

/// How a spend is submitted and what rides along with it.
#[derive(Clone, Debug, Default)]
pub struct SpendOptions {
    /// Route the transaction through this relayer; `None` submits directly.
    pub relayer_url: Option<String>,
    /// Native-asset refund forwarded with a token spend, in base units.
    pub refund: u128,
}

#[derive(Clone, Debug)]
pub struct DepositReceipt {
    /// The shareable note string. The only way to spend the deposit.
    pub note: String,
    pub commitment: [u8; 32],
    pub tx_hash: String,
    pub block_number: u64,
}

#[derive(Clone, Debug)]
pub struct SpendReceipt {
    pub tx_hash: String,
    pub block_number: u64,
}

/// On-chain facts about a parsed note's deposit.
#[derive(Clone, Debug)]
pub struct DepositInfo {
    pub commitment: [u8; 32],
    pub leaf_index: u64,
    pub timestamp: u64,
    pub tx_hash: String,
    pub spent: bool,
    /// First block at which the deposit can appear behind a checkpoint.
    pub reward_eligible_at_block: u64,
}

/// Settled withdrawal details for a note.
#[derive(Clone, Debug)]
pub struct WithdrawalInfo {
    pub tx_hash: String,
    pub to: Address,
    pub fee: u128,
    /// Net amount after the relayer fee, human-readable.
    pub amount_received: String,
}

pub struct PoolClient<L, P, C> {
    session: Session,
    ledger: L,
    prover: P,
    circuits: C,
    http: HttpClient,
}

impl<L, P, C> PoolClient<L, P, C>
where
    L: LedgerGateway,
    P: SpendProver,
    C: CircuitProvider,
{
    pub fn new(session: Session, ledger: L, prover: P, circuits: C) -> Result<Self> {
        Self::with_net_config(session, ledger, prover, circuits, amr_net::Config::default())
    }

    pub fn with_net_config(
        session: Session,
        ledger: L,
        prover: P,
        circuits: C,
        net: amr_net::Config,
    ) -> Result<Self> {
        let http = HttpClient::new(net).map_err(ClientError::Network)?;
        Ok(Self {
            session,
            ledger,
            prover,
            circuits,
            http,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn prover(&self) -> &P {
        &self.prover
    }

    /// Create a fresh deposit, submit its commitment and wait for the
    /// receipt. The returned note string is the only spend credential.
    pub async fn deposit(&self, currency: &str, amount: &str) -> Result<DepositReceipt> {
        let instance = self.session.instance(currency, amount)?;
        let value = from_decimals(amount, instance.decimals)?;

        let deposit = Deposit::random()?;
        let note = serialize_note(&deposit, currency, amount, self.session.net_id);
        info!("created deposit note for {} {}", amount, currency);

        let tx_hash = self.ledger.submit_deposit(&deposit.commitment(), value).await?;
        let receipt = wait_for_receipt(&self.ledger, &tx_hash).await?;
        info!("deposit mined in block {}", receipt.block_number);

        Ok(DepositReceipt {
            note,
            commitment: deposit.commitment(),
            tx_hash,
            block_number: receipt.block_number,
        })
    }

    /// Spend the withdraw path of a note.
    pub async fn withdraw(
        &self,
        note: &str,
        recipient: Address,
        options: &SpendOptions,
    ) -> Result<SpendReceipt> {
        let parsed = self.open_note(note, options)?;
        let instance = self.session.instance(&parsed.currency, &parsed.amount)?;

        match &options.relayer_url {
            Some(url) => {
                let (relayer, relayer_address, fee) =
                    self.negotiate(url, &parsed, instance, options.refund).await?;
                let merkle_proof = self.prepare_withdraw_proof(&parsed.deposit).await?;

                let spend = assemble_withdraw(
                    &parsed.deposit,
                    &merkle_proof,
                    recipient,
                    relayer_address,
                    fee,
                    options.refund,
                );
                info!("generating withdraw proof");
                let bundle = self
                    .prover
                    .prove_withdraw(self.circuits.withdraw_circuit()?, &spend.request)
                    .await?;
                validate_proof_bundle(&bundle)?;

                info!("sending withdraw transaction through relayer {}", relayer.url());
                let tx_hash = relayer
                    .relay(&instance.address.to_hex(), &bundle.proof, &spend.args.to_hex_tuple())
                    .await?;
                self.confirm(tx_hash).await
            }
            None => {
                let merkle_proof = self.prepare_withdraw_proof(&parsed.deposit).await?;
                let spend = assemble_withdraw(
                    &parsed.deposit,
                    &merkle_proof,
                    recipient,
                    Address::ZERO,
                    0,
                    options.refund,
                );
                info!("generating withdraw proof");
                let bundle = self
                    .prover
                    .prove_withdraw(self.circuits.withdraw_circuit()?, &spend.request)
                    .await?;
                validate_proof_bundle(&bundle)?;

                info!("submitting withdraw transaction");
                let tx_hash = self.ledger.submit_withdraw(&bundle.proof, &spend.args).await?;
                self.confirm(tx_hash).await
            }
        }
    }

    /// Spend the reward path of a note. Independent of the withdraw path:
    /// a withdrawn note can still redeem, and vice versa.
    pub async fn redeem(
        &self,
        note: &str,
        recipient: Address,
        options: &SpendOptions,
    ) -> Result<SpendReceipt> {
        let parsed = self.open_note(note, options)?;
        let instance = self.session.instance(&parsed.currency, &parsed.amount)?;

        match &options.relayer_url {
            Some(url) => {
                let (relayer, relayer_address, fee) =
                    self.negotiate(url, &parsed, instance, options.refund).await?;
                let merkle_proof = self.prepare_reward_proof(&parsed.deposit).await?;

                let spend = assemble_reward(
                    &parsed.deposit,
                    &merkle_proof,
                    recipient,
                    relayer_address,
                    fee,
                    options.refund,
                );
                info!("generating reward proof");
                let bundle = self
                    .prover
                    .prove_reward(self.circuits.reward_circuit()?, &spend.request)
                    .await?;
                validate_proof_bundle(&bundle)?;

                info!("sending reward transaction through relayer {}", relayer.url());
                let tx_hash = relayer
                    .relay(&instance.address.to_hex(), &bundle.proof, &spend.args.to_hex_tuple())
                    .await?;
                self.confirm(tx_hash).await
            }
            None => {
                let merkle_proof = self.prepare_reward_proof(&parsed.deposit).await?;
                let spend = assemble_reward(
                    &parsed.deposit,
                    &merkle_proof,
                    recipient,
                    Address::ZERO,
                    0,
                    options.refund,
                );
                info!("generating reward proof");
                let bundle = self
                    .prover
                    .prove_reward(self.circuits.reward_circuit()?, &spend.request)
                    .await?;
                validate_proof_bundle(&bundle)?;

                info!("submitting reward transaction");
                let tx_hash = self.ledger.submit_reward(&bundle.proof, &spend.args).await?;
                self.confirm(tx_hash).await
            }
        }
    }

    /// Locate the deposit event for a note and report its current state.
    pub async fn deposit_info(&self, note: &str) -> Result<DepositInfo> {
        let parsed = parse_note(note)?;
        self.session.ensure_note_network(parsed.net_id)?;

        let events = self.ledger.commitment_events(0, None).await?;
        let event = events
            .iter()
            .find(|e| e.commitment == parsed.deposit.commitment())
            .ok_or(ClientError::CommitmentNotFound)?;
        let spent = self
            .ledger
            .is_spent(&parsed.deposit.withdraw_nullifier_hash())
            .await?;

        Ok(DepositInfo {
            commitment: event.commitment,
            leaf_index: event.leaf_index,
            timestamp: event.timestamp,
            tx_hash: event.tx_hash.clone(),
            spent,
            reward_eligible_at_block: event.block_number + self.session.reward_checkpoint_interval,
        })
    }

    /// Locate the withdrawal that consumed a note's withdraw path and
    /// report the net amount the recipient received.
    pub async fn withdrawal_info(&self, note: &str) -> Result<WithdrawalInfo> {
        let parsed = parse_note(note)?;
        self.session.ensure_note_network(parsed.net_id)?;
        let instance = self.session.instance(&parsed.currency, &parsed.amount)?;

        let events = self.ledger.withdrawal_events().await?;
        let event = events
            .into_iter()
            .find(|e| e.nullifier_hash == parsed.deposit.withdraw_nullifier_hash())
            .ok_or_else(|| ClientError::Ledger("no withdrawal recorded for this note".into()))?;

        let total = from_decimals(&parsed.amount, instance.decimals)?;
        let received = total.saturating_sub(event.fee);

        Ok(WithdrawalInfo {
            tx_hash: event.tx_hash,
            to: event.to,
            fee: event.fee,
            amount_received: to_decimals(received, instance.decimals, 9),
        })
    }

    /// Parse and screen a note for this session.
    fn open_note(&self, note: &str, options: &SpendOptions) -> Result<ParsedNote> {
        let parsed = parse_note(note)?;
        self.session.ensure_note_network(parsed.net_id)?;
        if parsed.currency == NATIVE_CURRENCY && options.refund != 0 {
            return Err(ClientError::InvalidAmount(
                "refund must be zero for native-asset spends".into(),
            ));
        }
        Ok(parsed)
    }

    /// Rebuild the withdraw anonymity set and run the checks that must
    /// precede any spend: recognized root, unspent nullifier, present leaf.
    /// Skipping them would allow proving against an inconsistent tree.
    async fn prepare_withdraw_proof(&self, deposit: &Deposit) -> Result<MerkleProof> {
        let tree = build_withdraw_tree(&self.ledger, self.session.tree_height).await?;
        if !self.ledger.is_known_root(&tree.root()).await? {
            return Err(ClientError::MerkleTreeCorrupted);
        }
        if self.ledger.is_spent(&deposit.withdraw_nullifier_hash()).await? {
            return Err(ClientError::AlreadySpent);
        }
        prove_membership(&tree, &deposit.commitment())
    }

    async fn prepare_reward_proof(&self, deposit: &Deposit) -> Result<MerkleProof> {
        let tree = build_reward_tree(&self.ledger, self.session.tree_height).await?;
        if !self.ledger.is_reward_root(&tree.root()).await? {
            return Err(ClientError::MerkleTreeCorrupted);
        }
        if self.ledger.is_redeemed(&deposit.reward_nullifier_hash()).await? {
            return Err(ClientError::AlreadyRedeemed);
        }
        prove_membership(&tree, &deposit.commitment())
    }

    /// Fetch relayer status, verify its network, and settle on a fee.
    /// Runs before proof generation so a mismatched or unaffordable relayer
    /// costs nothing.
    async fn negotiate(
        &self,
        url: &str,
        parsed: &ParsedNote,
        instance: &Instance,
        refund: u128,
    ) -> Result<(RelayerClient, Address, u128)> {
        let relayer = RelayerClient::new(self.http.clone(), url);
        let status = relayer.status().await?;
        status.ensure_network(self.session.net_id)?;
        info!("relayer address {}", status.relayer_address);

        let fee = compute_relayer_fee(&FeeQuote {
            gas_price_fast_gwei: status.gas_prices.fast,
            currency: &parsed.currency,
            amount: &parsed.amount,
            refund,
            asset_prices: &status.eth_prices,
            relayer_service_percent: status.relayer_service_fee,
            decimals: instance.decimals,
        })?;
        ensure_affordable(fee, from_decimals(&parsed.amount, instance.decimals)?)?;

        let relayer_address = Address::from_hex(&status.relayer_address)?;
        Ok((relayer, relayer_address, fee))
    }

    async fn confirm(&self, tx_hash: String) -> Result<SpendReceipt> {
        let receipt = wait_for_receipt(&self.ledger, &tx_hash).await?;
        info!("transaction mined in block {}", receipt.block_number);
        Ok(SpendReceipt {
            tx_hash,
            block_number: receipt.block_number,
        })
    }
}
