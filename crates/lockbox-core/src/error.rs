//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur while loading, mutating or saving the vault.
///
/// Every variant is scoped to the operation that raised it: the in-memory
/// catalog and the container on disk stay at their last good state.
#[derive(Error, Debug)]
pub enum VaultError {
    /// The KDF could not run (working memory unavailable or work parameters
    /// beyond the sanity ceiling).
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Container is corrupted: {0}")]
    CorruptContainer(String),

    /// Wrong master password or tampered ciphertext. The two cannot be told
    /// apart.
    #[error("Wrong master password or tampered container")]
    AuthenticationFailed,

    #[error("Encryption failed")]
    Encryption,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to persist container: {0}")]
    Persistence(#[source] std::io::Error),

    #[error("Current master password does not match")]
    InvalidCredential,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),
}

pub type VaultResult<T> = Result<T, VaultError>;
