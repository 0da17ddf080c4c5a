//! Password-based key derivation (scrypt).

use std::time::{Duration, Instant};

use zeroize::Zeroizing;

use crate::error::{VaultError, VaultResult};

/// Size of the derived AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Size of the per-container salt in bytes.
pub const SALT_LEN: usize = 32;

/// Largest accepted `log2(N)`.
const MAX_LOG_N: u8 = 20;

/// Largest amount of working memory a derivation may ask for (1 GiB).
const MAX_MEMORY: u64 = 1 << 30;

/// Largest accepted parallelism. scrypt runs the lanes one after another.
const MAX_PARALLELISM: u32 = 16;

/// Ceiling on total memory traffic (128 * r * N * p), 4 GiB.
const MAX_WORK: u64 = 4 << 30;

/// Derivations slower than this are logged.
const SLOW_DERIVATION: Duration = Duration::from_secs(1);

/// A derived encryption key, wiped on drop.
pub type DerivedKey = Zeroizing<[u8; KEY_LEN]>;

/// scrypt work parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    log_n: u8,
    r: u32,
    p: u32,
}

impl KdfParams {
    /// Parameters every container is written with: N = 2^15, r = 8, p = 1
    /// (32 MiB of working memory).
    pub const DEFAULT: KdfParams = KdfParams {
        log_n: 15,
        r: 8,
        p: 1,
    };

    /// Build a custom parameter set.
    ///
    /// Rejects costs that would hang or exhaust memory instead of letting the
    /// derivation run for minutes.
    pub fn new(log_n: u8, r: u32, p: u32) -> VaultResult<Self> {
        if log_n == 0 || log_n > MAX_LOG_N {
            return Err(VaultError::KeyDerivation(format!(
                "log_n must be within 1..={MAX_LOG_N}, got {log_n}"
            )));
        }
        if r == 0 || p == 0 {
            return Err(VaultError::KeyDerivation(
                "r and p must be non-zero".to_string(),
            ));
        }
        if p > MAX_PARALLELISM {
            return Err(VaultError::KeyDerivation(format!(
                "p must be at most {MAX_PARALLELISM}, got {p}"
            )));
        }

        let params = Self { log_n, r, p };
        if params.memory_bytes() > MAX_MEMORY {
            return Err(VaultError::KeyDerivation(format!(
                "parameters need {} bytes of working memory, limit is {MAX_MEMORY}",
                params.memory_bytes()
            )));
        }
        if params.work_bytes() > MAX_WORK {
            return Err(VaultError::KeyDerivation(format!(
                "parameters need {} bytes of total work, limit is {MAX_WORK}",
                params.work_bytes()
            )));
        }
        Ok(params)
    }

    /// Working memory scrypt allocates for these parameters (128 * r * N).
    pub fn memory_bytes(&self) -> u64 {
        128 * u64::from(self.r) * (1u64 << self.log_n)
    }

    /// Memory traffic across all lanes; derivation time scales with this.
    pub fn work_bytes(&self) -> u64 {
        self.memory_bytes() * u64::from(self.p)
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Derive a 32-byte key from `password` and `salt`.
///
/// Deterministic for a given (password, salt, params) triple.
pub fn derive_key(password: &[u8], salt: &[u8; SALT_LEN], params: &KdfParams) -> VaultResult<DerivedKey> {
    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, KEY_LEN)
        .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;

    // scrypt aborts the process when its allocation fails, so make sure the
    // memory is there before handing over.
    let mut probe: Vec<u8> = Vec::new();
    probe
        .try_reserve_exact(params.memory_bytes() as usize)
        .map_err(|e| VaultError::KeyDerivation(format!("cannot reserve working memory: {e}")))?;
    drop(probe);

    let started = Instant::now();
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt::scrypt(password, salt, &scrypt_params, &mut key[..])
        .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;

    let elapsed = started.elapsed();
    if elapsed > SLOW_DERIVATION {
        tracing::warn!("Key derivation took {:?}", elapsed);
    } else {
        tracing::debug!("Key derivation took {:?}", elapsed);
    }

    Ok(key)
}
