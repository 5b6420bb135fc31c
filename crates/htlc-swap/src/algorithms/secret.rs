//! # Secret Generation and Commit-Reveal
//!
//! Pure functions: secret generation, hashlock derivation and the
//! `(secret, nonce)` commitment used for MEV protection.

use crate::domain::{Bytes32, Hash, Nonce, SecretError, SecureSecret};
use rand::RngCore;
use sha3::{Digest, Keccak256};

/// keccak256 over the concatenation of `parts`.
pub fn keccak256(parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Generate a cryptographically secure random secret.
pub fn generate_secret() -> SecureSecret {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    SecureSecret::new(bytes)
}

/// Generate a random commitment nonce.
pub fn generate_nonce() -> Nonce {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    Nonce::new(bytes)
}

/// Hashlock of a secret: keccak256(secret).
pub fn hash_secret(secret: &SecureSecret) -> Hash {
    keccak256(&[&secret.as_bytes()[..]])
}

/// Hashlock of raw secret bytes; anything but 32 bytes is rejected.
pub fn hash_secret_bytes(secret: &[u8]) -> Result<Hash, SecretError> {
    let secret = SecureSecret::from_slice(secret)?;
    Ok(hash_secret(&secret))
}

/// Commitment binding a secret to a nonce: keccak256(secret || nonce).
pub fn secret_commitment(secret: &SecureSecret, nonce: &Nonce) -> Bytes32 {
    keccak256(&[&secret.as_bytes()[..], &nonce.as_bytes()[..]])
}

/// Commitment from raw bytes; both inputs must be exactly 32 bytes.
pub fn secret_commitment_bytes(secret: &[u8], nonce: &[u8]) -> Result<Bytes32, SecretError> {
    let secret = SecureSecret::from_slice(secret)?;
    let nonce = Nonce::from_slice(nonce)?;
    Ok(secret_commitment(&secret, &nonce))
}

/// Verify that a secret matches a hashlock.
pub fn verify_secret(secret: &SecureSecret, hashlock: &Hash) -> bool {
    hash_secret(secret) == *hashlock
}
