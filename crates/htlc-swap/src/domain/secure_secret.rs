//! # Secure Secret Types
//!
//! Wrappers for the swap preimage and its commitment nonce. Both zeroize on
//! drop and never print their bytes.

use super::errors::SecretError;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The 32-byte hashlock preimage.
///
/// Held only by the initiating process until it is revealed on-chain.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecureSecret {
    inner: [u8; 32],
}

impl SecureSecret {
    /// Create a new secure secret from bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { inner: bytes }
    }

    /// Create from a slice; anything but 32 bytes is rejected.
    pub fn from_slice(slice: &[u8]) -> Result<Self, SecretError> {
        let inner: [u8; 32] = slice
            .try_into()
            .map_err(|_| SecretError::InvalidSecretLength(slice.len()))?;
        Ok(Self { inner })
    }

    /// Get the secret bytes.
    ///
    /// Avoid keeping references to the returned slice.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.inner
    }

    /// Copy out the raw bytes.
    pub fn expose(&self) -> [u8; 32] {
        self.inner
    }
}

impl PartialEq for SecureSecret {
    fn eq(&self, other: &Self) -> bool {
        self.inner[..].ct_eq(&other.inner[..]).into()
    }
}

impl Eq for SecureSecret {}

impl std::fmt::Debug for SecureSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecureSecret(***)")
    }
}

impl Serialize for SecureSecret {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.inner))
    }
}

impl<'de> Deserialize<'de> for SecureSecret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        Self::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Random nonce binding a secret commitment.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Nonce {
    inner: [u8; 32],
}

impl Nonce {
    /// Wrap nonce bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { inner: bytes }
    }

    /// Create from a slice; anything but 32 bytes is rejected.
    pub fn from_slice(slice: &[u8]) -> Result<Self, SecretError> {
        let inner: [u8; 32] = slice
            .try_into()
            .map_err(|_| SecretError::InvalidNonceLength(slice.len()))?;
        Ok(Self { inner })
    }

    /// Get the nonce bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.inner
    }
}

impl PartialEq for Nonce {
    fn eq(&self, other: &Self) -> bool {
        self.inner[..].ct_eq(&other.inner[..]).into()
    }
}

impl Eq for Nonce {}

impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Nonce(***)")
    }
}

impl Serialize for Nonce {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.inner))
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        Self::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_secret_debug_hides_value() {
        let secret = SecureSecret::new([0xABu8; 32]);
        let debug_str = format!("{:?}", secret);
        assert!(!debug_str.to_lowercase().contains("ab"));
        assert!(debug_str.contains("***"));
    }

    #[test]
    fn test_secure_secret_from_slice() {
        let bytes = [0xCDu8; 32];
        let secret = SecureSecret::from_slice(&bytes).unwrap();
        assert_eq!(secret.expose(), bytes);
    }

    #[test]
    fn test_secure_secret_from_slice_wrong_length() {
        assert_eq!(
            SecureSecret::from_slice(&[0u8; 16]).unwrap_err(),
            SecretError::InvalidSecretLength(16)
        );
        assert_eq!(
            SecureSecret::from_slice(&[0u8; 33]).unwrap_err(),
            SecretError::InvalidSecretLength(33)
        );
    }

    #[test]
    fn test_nonce_from_slice_wrong_length() {
        assert_eq!(
            Nonce::from_slice(&[1u8; 31]).unwrap_err(),
            SecretError::InvalidNonceLength(31)
        );
    }

    #[test]
    fn test_secret_serde_hex() {
        let secret = SecureSecret::new([0x11u8; 32]);
        let json = serde_json::to_string(&secret).unwrap();
        assert_eq!(json, format!("\"{}\"", "11".repeat(32)));
        let back: SecureSecret = serde_json::from_str(&json).unwrap();
        assert_eq!(back, secret);
    }

    #[test]
    fn test_equality_compares_every_byte() {
        let mut last = [0x42u8; 32];
        last[31] = 0x43;
        assert_eq!(SecureSecret::new([0x42; 32]), SecureSecret::new([0x42; 32]));
        assert_ne!(SecureSecret::new([0x42; 32]), SecureSecret::new(last));
        assert_ne!(Nonce::new([0x42; 32]), Nonce::new(last));
    }
}
