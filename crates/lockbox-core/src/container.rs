//! Encrypted container format.
//!
//! Layout:
//! - salt: 32 bytes (scrypt)
//! - nonce: 12 bytes (AES-256-GCM)
//! - ciphertext: AEAD output (ciphertext + 16-byte tag)
//!
//! No associated data, no length prefixes. Salt and nonce are drawn fresh for
//! every encode, so a key is never used twice.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use crate::error::{VaultError, VaultResult};
use crate::kdf::{derive_key, KdfParams, SALT_LEN};

/// AES-GCM nonce size in bytes.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag size in bytes.
pub const TAG_LEN: usize = 16;

/// Seals and opens containers with a fixed KDF cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec {
    params: KdfParams,
}

impl Codec {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    /// Encrypt `plaintext` under a key derived from `password`.
    pub fn encode(&self, plaintext: &[u8], password: &str) -> VaultResult<Vec<u8>> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let key = derive_key(password.as_bytes(), &salt, &self.params)?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let cipher = Aes256Gcm::new_from_slice(key.as_slice()).map_err(|_| VaultError::Encryption)?;
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| VaultError::Encryption)?;

        let mut container = Vec::with_capacity(SALT_LEN + NONCE_LEN + sealed.len());
        container.extend_from_slice(&salt);
        container.extend_from_slice(&nonce);
        container.extend_from_slice(&sealed);
        Ok(container)
    }

    /// Authenticate and decrypt a container.
    ///
    /// A failed tag check is reported as [`VaultError::AuthenticationFailed`]
    /// whether the password is wrong or the bytes were modified.
    pub fn decode(&self, container: &[u8], password: &str) -> VaultResult<Vec<u8>> {
        if container.len() < SALT_LEN {
            return Err(VaultError::CorruptContainer(format!(
                "{} bytes is too short to hold a salt",
                container.len()
            )));
        }
        let (salt, rest) = container.split_at(SALT_LEN);
        if rest.len() < NONCE_LEN {
            return Err(VaultError::CorruptContainer(format!(
                "{} bytes is too short to hold a nonce",
                container.len()
            )));
        }
        let (nonce, sealed) = rest.split_at(NONCE_LEN);

        let mut salt_bytes = [0u8; SALT_LEN];
        salt_bytes.copy_from_slice(salt);
        let key = derive_key(password.as_bytes(), &salt_bytes, &self.params)?;

        let cipher = Aes256Gcm::new_from_slice(key.as_slice()).map_err(|_| VaultError::AuthenticationFailed)?;
        cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| VaultError::AuthenticationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> Codec {
        Codec::new(KdfParams::new(10, 8, 1).unwrap())
    }

    #[test]
    fn test_roundtrip() {
        let codec = codec();
        let plaintext = br#"{"user":{"name":"User"},"categories":[],"entries":[]}"#;

        let container = codec.encode(plaintext, "master").unwrap();
        assert_eq!(container.len(), SALT_LEN + NONCE_LEN + plaintext.len() + TAG_LEN);

        let decoded = codec.decode(&container, "master").unwrap();
        assert_eq!(decoded, plaintext);
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let codec = codec();
        let container = codec.encode(b"", "master").unwrap();
        assert_eq!(container.len(), SALT_LEN + NONCE_LEN + TAG_LEN);
        assert!(codec.decode(&container, "master").unwrap().is_empty());
    }

    #[test]
    fn test_wrong_password_fails_authentication() {
        let codec = codec();
        let container = codec.encode(b"secret data", "password1").unwrap();

        let result = codec.decode(&container, "password2");
        assert!(matches!(result, Err(VaultError::AuthenticationFailed)));
    }

    #[test]
    fn test_tampering_fails_authentication() {
        let codec = codec();
        let container = codec.encode(b"secret data", "master").unwrap();

        for offset in [0, SALT_LEN, SALT_LEN + NONCE_LEN, container.len() - 1] {
            let mut tampered = container.clone();
            tampered[offset] ^= 0x01;
            assert!(
                matches!(codec.decode(&tampered, "master"), Err(VaultError::AuthenticationFailed)),
                "flipping byte {offset} went unnoticed"
            );
        }
    }

    #[test]
    fn test_short_input_is_corrupt() {
        let codec = codec();
        for len in [0, 1, SALT_LEN - 1] {
            let result = codec.decode(&vec![0u8; len], "master");
            assert!(matches!(result, Err(VaultError::CorruptContainer(_))), "len {len}");
        }
        for len in [SALT_LEN, SALT_LEN + NONCE_LEN - 1] {
            let result = codec.decode(&vec![0u8; len], "master");
            assert!(matches!(result, Err(VaultError::CorruptContainer(_))), "len {len}");
        }
    }

    #[test]
    fn test_missing_tag_fails_authentication() {
        let codec = codec();
        let result = codec.decode(&[0u8; SALT_LEN + NONCE_LEN + 3], "master");
        assert!(matches!(result, Err(VaultError::AuthenticationFailed)));
    }

    #[test]
    fn test_encoding_is_randomized() {
        let codec = codec();
        let a = codec.encode(b"same plaintext", "master").unwrap();
        let b = codec.encode(b"same plaintext", "master").unwrap();

        assert_ne!(a[..SALT_LEN], b[..SALT_LEN]);
        assert_ne!(a[SALT_LEN..SALT_LEN + NONCE_LEN], b[SALT_LEN..SALT_LEN + NONCE_LEN]);
        assert_ne!(a[SALT_LEN + NONCE_LEN..], b[SALT_LEN + NONCE_LEN..]);
    }
}
