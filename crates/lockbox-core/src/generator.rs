//! Identifier and password generation.
//!
//! Everything here draws from the operating system CSPRNG.

use rand::{distributions::Alphanumeric, rngs::OsRng, Rng, RngCore};

/// Shortest password [`generate_password`] will produce.
pub const MIN_PASSWORD_LENGTH: usize = 10;

/// Random bytes behind every identifier (128 bits).
const ID_BYTES: usize = 16;

/// A fresh entry id: `p` followed by 32 hex digits.
pub fn new_entry_id() -> String {
    random_id('p')
}

/// A fresh category id: `c` followed by 32 hex digits.
pub fn new_category_id() -> String {
    random_id('c')
}

fn random_id(prefix: char) -> String {
    let mut bytes = [0u8; ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    format!("{prefix}{}", hex::encode(bytes))
}

/// Generate an alphanumeric password of `length` characters.
///
/// Lengths below [`MIN_PASSWORD_LENGTH`] are raised to it.
pub fn generate_password(length: usize) -> String {
    let length = length.max(MIN_PASSWORD_LENGTH);
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
