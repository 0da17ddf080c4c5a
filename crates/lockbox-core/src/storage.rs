//! Container file handling.
//!
//! - Load treats a missing file as a first run and returns an empty catalog
//! - Save writes to a temp file in the same directory, syncs it, then renames
//!   it over the target, so the file on disk is always a complete container

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use zeroize::Zeroize;

use crate::container::Codec;
use crate::error::{VaultError, VaultResult};
use crate::models::Catalog;

/// File name the container is stored under by default.
pub const DEFAULT_VAULT_FILE: &str = "passwords.json.encrypted";

/// Read and decrypt the catalog at `path`.
///
/// A missing file yields an empty catalog and nothing is written.
pub fn load(path: &Path, password: &str, codec: &Codec) -> VaultResult<Catalog> {
    let container = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!("No container at {}, starting with an empty catalog", path.display());
            return Ok(Catalog::new());
        }
        Err(e) => return Err(VaultError::Io(e)),
    };

    let mut plaintext = codec.decode(&container, password)?;
    let parsed = serde_json::from_slice::<Catalog>(&plaintext);
    plaintext.zeroize();

    let catalog = parsed.map_err(|e| VaultError::CorruptContainer(format!("invalid catalog: {e}")))?;
    tracing::debug!(
        "Loaded {} entries in {} categories from {}",
        catalog.entries.len(),
        catalog.categories.len(),
        path.display()
    );
    Ok(catalog)
}

/// Encrypt `catalog` under `password` and atomically replace the file at
/// `path`.
///
/// On error the previous container, if any, is left untouched.
pub fn save(path: &Path, catalog: &Catalog, password: &str, codec: &Codec) -> VaultResult<()> {
    let mut plaintext = serde_json::to_vec(catalog)
        .map_err(|e| VaultError::CorruptContainer(format!("cannot serialize catalog: {e}")))?;
    let container = codec.encode(&plaintext, password);
    plaintext.zeroize();
    let container = container?;

    write_atomic(path, &container).map_err(|e| {
        tracing::warn!("Failed to write container {}: {}", path.display(), e);
        VaultError::Persistence(e)
    })?;

    tracing::debug!("Saved {} bytes to {}", container.len(), path.display());
    Ok(())
}

/// Write `bytes` to a sibling temp file, fsync it and rename it over `path`.
///
/// Any error is raised before the rename, so an `Err` always means the old
/// container is still in place. Once the rename succeeded the new container
/// is the committed one.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    // NamedTempFile is created with mode 0600 on Unix.
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    sync_dir(dir);
    Ok(())
}

/// Flush the rename to disk. The new container is already visible, so a
/// failure here is only logged.
fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        tracing::warn!("Failed to sync directory {}: {}", dir.display(), e);
    }
    #[cfg(not(unix))]
    let _ = dir;
}
