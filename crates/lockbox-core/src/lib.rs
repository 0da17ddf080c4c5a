//! Core of lockbox, a single-user secrets store.
//!
//! This crate provides:
//! - scrypt key derivation from the master password
//! - AES-256-GCM containers (`salt || nonce || ciphertext`)
//! - The plaintext catalog of categories and entries
//! - Atomic load/save and master password rotation behind a single lock

pub mod container;
pub mod error;
pub mod generator;
pub mod kdf;
pub mod models;
pub mod storage;
pub mod vault;

pub use container::Codec;
pub use error::{VaultError, VaultResult};
pub use generator::{generate_password, new_category_id, new_entry_id, MIN_PASSWORD_LENGTH};
pub use kdf::KdfParams;
pub use models::{Catalog, Category, Entry, User, UNKNOWN_CATEGORY};
pub use storage::{load, save, DEFAULT_VAULT_FILE};
pub use vault::{EntryChanges, Vault};
