use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Protocol failures, one distinguishable kind per outcome the caller may
/// need to react to. None of these are retried automatically.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid note format: {0}")]
    InvalidNoteFormat(String),

    #[error("Network mismatch: session is net {expected}, target is net {actual}")]
    NetworkMismatch { expected: u64, actual: String },

    #[error("Merkle tree is corrupted: rebuilt root is not known to the ledger")]
    MerkleTreeCorrupted,

    #[error("The withdraw note is already spent")]
    AlreadySpent,

    #[error("The reward note is already redeemed")]
    AlreadyRedeemed,

    #[error("The deposit is not found in the tree")]
    CommitmentNotFound,

    #[error("No reward checkpoint has been published yet")]
    NoRewardCheckpoint,

    #[error("Relayer fee {fee} exceeds the deposit amount {amount}")]
    FeeTooHigh { fee: u128, amount: u128 },

    #[error("Proof generation failed: {0}")]
    ProofGenerationFailed(String),

    #[error("Transaction was not mined: {0}")]
    TransactionNotMined(String),

    #[error("Relayer error: {0}")]
    Relayer(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("No pool instance for {0}")]
    UnknownInstance(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Network error: {0}")]
    Network(#[from] amr_net::NetError),

    #[error("Ledger error: {0}")]
    Ledger(String),
}
