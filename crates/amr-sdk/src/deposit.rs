/// A deposit binds three independent one-time secrets under one commitment:
/// the withdraw nullifier, the reward nullifier, and a shared blinding
/// secret. Revealing one nullifier hash at spend time does not expose the
/// other path or the commitment's position in the anonymity set.
use crate::crypto::{poseidon_hash, random_secret, secret_to_element, SECRET_BYTES};
use crate::error::Result;

/// Width of the note preimage: the three secrets, little-endian, concatenated.
pub const PREIMAGE_BYTES: usize = 3 * SECRET_BYTES;

#[derive(Clone, PartialEq, Eq)]
pub struct Deposit {
    withdraw_nullifier: [u8; SECRET_BYTES],
    reward_nullifier: [u8; SECRET_BYTES],
    secret: [u8; SECRET_BYTES],
    commitment: [u8; 32],
    withdraw_nullifier_hash: [u8; 32],
    reward_nullifier_hash: [u8; 32],
}

impl Deposit {
    /// Derive a deposit from its three secrets. Pure and deterministic:
    /// re-deriving from a parsed note must reproduce the exact commitment
    /// and nullifier hashes used at deposit time.
    pub fn new(
        withdraw_nullifier: [u8; SECRET_BYTES],
        reward_nullifier: [u8; SECRET_BYTES],
        secret: [u8; SECRET_BYTES],
    ) -> Result<Self> {
        let w = secret_to_element(&withdraw_nullifier);
        let r = secret_to_element(&reward_nullifier);
        let s = secret_to_element(&secret);

        let commitment = poseidon_hash(&[&w, &r, &s])?;
        let withdraw_nullifier_hash = poseidon_hash(&[&w])?;
        let reward_nullifier_hash = poseidon_hash(&[&r])?;

        Ok(Self {
            withdraw_nullifier,
            reward_nullifier,
            secret,
            commitment,
            withdraw_nullifier_hash,
            reward_nullifier_hash,
        })
    }

    pub fn random() -> Result<Self> {
        Self::new(random_secret(), random_secret(), random_secret())
    }

    /// The 93-byte note payload: w ‖ r ‖ s, each little-endian.
    pub fn preimage(&self) -> [u8; PREIMAGE_BYTES] {
        let mut preimage = [0u8; PREIMAGE_BYTES];
        preimage[..SECRET_BYTES].copy_from_slice(&self.withdraw_nullifier);
        preimage[SECRET_BYTES..2 * SECRET_BYTES].copy_from_slice(&self.reward_nullifier);
        preimage[2 * SECRET_BYTES..].copy_from_slice(&self.secret);
        preimage
    }

    pub fn commitment(&self) -> [u8; 32] {
        self.commitment
    }

    pub fn withdraw_nullifier_hash(&self) -> [u8; 32] {
        self.withdraw_nullifier_hash
    }

    pub fn reward_nullifier_hash(&self) -> [u8; 32] {
        self.reward_nullifier_hash
    }

    pub fn withdraw_nullifier(&self) -> &[u8; SECRET_BYTES] {
        &self.withdraw_nullifier
    }

    pub fn reward_nullifier(&self) -> &[u8; SECRET_BYTES] {
        &self.reward_nullifier
    }

    pub fn secret(&self) -> &[u8; SECRET_BYTES] {
        &self.secret
    }
}

impl std::fmt::Debug for Deposit {
    // secrets stay out of logs
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deposit")
            .field("commitment", &crate::crypto::to_hex(&self.commitment))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_deterministic() {
        let w = random_secret();
        let r = random_secret();
        let s = random_secret();

        let d1 = Deposit::new(w, r, s).unwrap();
        let d2 = Deposit::new(w, r, s).unwrap();

        assert_eq!(d1.commitment(), d2.commitment());
        assert_eq!(d1.withdraw_nullifier_hash(), d2.withdraw_nullifier_hash());
        assert_eq!(d1.reward_nullifier_hash(), d2.reward_nullifier_hash());
    }

    #[test]
    fn test_nullifier_hashes_independent() {
        let deposit = Deposit::random().unwrap();

        // the two spend tags never coincide and neither equals the commitment
        assert_ne!(
            deposit.withdraw_nullifier_hash(),
            deposit.reward_nullifier_hash()
        );
        assert_ne!(deposit.commitment(), deposit.withdraw_nullifier_hash());
        assert_ne!(deposit.commitment(), deposit.reward_nullifier_hash());
    }

    #[test]
    fn test_preimage_layout() {
        let deposit = Deposit::random().unwrap();
        let preimage = deposit.preimage();

        assert_eq!(&preimage[..SECRET_BYTES], deposit.withdraw_nullifier());
        assert_eq!(
            &preimage[SECRET_BYTES..2 * SECRET_BYTES],
            deposit.reward_nullifier()
        );
        assert_eq!(&preimage[2 * SECRET_BYTES..], deposit.secret());
    }

    #[test]
    fn test_different_secrets_different_commitments() {
        let d1 = Deposit::random().unwrap();
        let d2 = Deposit::random().unwrap();
        assert_ne!(d1.commitment(), d2.commitment());
    }
}
