//! Client SDK for the AMR shielded pool.
//!
//! Users deposit funds under a hiding commitment and later spend through
//! two independent, unlinkable paths - withdraw and reward - each gated by
//! its own one-time nullifier against the same commitment. The anonymity
//! set is rebuilt from the ledger's event log on every operation; spends
//! are submitted directly or through a fee-charging relayer.

pub mod anonymity;
pub mod client;
pub mod crypto;
pub mod deposit;
pub mod error;
pub mod fee;
pub mod ledger;
pub mod merkle;
pub mod note;
pub mod prover;
pub mod relayer;
pub mod session;
pub mod spend;

pub use client::{PoolClient, SpendOptions};
pub use crypto::Address;
pub use deposit::Deposit;
pub use error::{ClientError, Result};
pub use note::{parse_note, serialize_note, ParsedNote};
pub use session::{Instance, InstanceRegistry, Session};
