//! The live store: one catalog and one master password behind one lock.
//!
//! Every mutation runs the whole read-modify-write cycle under the write
//! lock. Changes are staged on a copy of the catalog and only committed once
//! the container has been durably replaced, so a failed save leaves memory
//! and disk exactly as they were.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use zeroize::Zeroizing;

use crate::container::Codec;
use crate::error::{VaultError, VaultResult};
use crate::generator::new_entry_id;
use crate::models::{Catalog, Category, Entry, User};
use crate::storage;

/// Changes applied by [`Vault::update_entry`].
///
/// Absent fields keep their current value. The secret is always replaced.
#[derive(Debug, Clone, Default)]
pub struct EntryChanges {
    pub service: Option<String>,
    pub category: Option<String>,
    pub secret: String,
}

struct State {
    catalog: Catalog,
    master_password: Zeroizing<String>,
}

/// Encrypted catalog bound to a container file.
pub struct Vault {
    path: PathBuf,
    codec: Codec,
    state: RwLock<State>,
}

impl Vault {
    /// Open the container at `path` with the default KDF cost.
    pub fn open(path: impl AsRef<Path>, password: &str) -> VaultResult<Self> {
        Self::open_with_codec(path, password, Codec::default())
    }

    /// Open the container at `path`.
    ///
    /// A missing file opens as an empty catalog; nothing is written until
    /// the first mutation.
    pub fn open_with_codec(path: impl AsRef<Path>, password: &str, codec: Codec) -> VaultResult<Self> {
        let path = path.as_ref().to_path_buf();
        let catalog = storage::load(&path, password, &codec)?;

        Ok(Self {
            path,
            codec,
            state: RwLock::new(State {
                catalog,
                master_password: Zeroizing::new(password.to_string()),
            }),
        })
    }

    /// Path of the backing container file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // Committed state is always consistent, so a poisoned lock is safe to reuse.
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the whole catalog.
    pub fn snapshot(&self) -> Catalog {
        self.read().catalog.clone()
    }

    pub fn user(&self) -> User {
        self.read().catalog.user.clone()
    }

    /// All entries, in insertion order.
    pub fn entries(&self) -> Vec<Entry> {
        self.read().catalog.entries.clone()
    }

    pub fn entry(&self, id: &str) -> Option<Entry> {
        let state = self.read();
        let index = state.catalog.find_entry_index(id)?;
        Some(state.catalog.entries[index].clone())
    }

    /// All categories, in creation order.
    pub fn categories(&self) -> Vec<Category> {
        self.read().catalog.categories.clone()
    }

    /// Name of the category with `id`; see [`Catalog::category_name`].
    pub fn category_name(&self, id: &str) -> String {
        self.read().catalog.category_name(id).to_string()
    }

    /// Id of the category called `name`, creating and saving it if needed.
    pub fn resolve_category(&self, name: &str) -> VaultResult<String> {
        self.mutate(|catalog| Ok(catalog.resolve_category(name)))
    }

    /// Store a new entry under `category` (created if unknown).
    pub fn create_entry(&self, service: &str, category: &str, secret: &str) -> VaultResult<Entry> {
        self.mutate(|catalog| {
            let category_id = catalog.resolve_category(category);
            let entry = Entry::new(new_entry_id(), service.to_string(), secret.to_string(), category_id);
            catalog.create_entry(entry.clone());
            Ok(entry)
        })
    }

    /// Replace the entry with `id`, re-stamping its timestamp.
    pub fn update_entry(&self, id: &str, changes: EntryChanges) -> VaultResult<Entry> {
        self.mutate(|catalog| {
            let index = catalog
                .find_entry_index(id)
                .ok_or_else(|| VaultError::EntryNotFound(id.to_string()))?;

            let current = &catalog.entries[index];
            let service = changes.service.unwrap_or_else(|| current.service.clone());
            let current_category = current.category_id.clone();
            let category_id = match changes.category {
                Some(name) => catalog.resolve_category(&name),
                None => current_category,
            };

            Ok(catalog.update_entry(index, service, changes.secret, category_id).clone())
        })
    }

    /// Remove the entry with `id` and return it.
    pub fn delete_entry(&self, id: &str) -> VaultResult<Entry> {
        self.mutate(|catalog| {
            let index = catalog
                .find_entry_index(id)
                .ok_or_else(|| VaultError::EntryNotFound(id.to_string()))?;
            Ok(catalog.delete_entry(index))
        })
    }

    /// Write the current catalog under the current master password.
    pub fn save(&self) -> VaultResult<()> {
        let state = self.write();
        storage::save(&self.path, &state.catalog, &state.master_password, &self.codec)
    }

    /// Re-encrypt the container under `new_password`.
    ///
    /// The in-memory password only changes after the new container is on
    /// disk. If the save fails the old password stays active and the old
    /// container stays readable with it.
    pub fn change_master_password(&self, current: &str, new_password: &str, confirm: &str) -> VaultResult<()> {
        let mut state = self.write();

        if !constant_time_eq(current.as_bytes(), state.master_password.as_bytes()) {
            return Err(VaultError::InvalidCredential);
        }
        if new_password.is_empty() {
            return Err(VaultError::Validation("new master password is empty".to_string()));
        }
        if new_password != confirm {
            return Err(VaultError::Validation(
                "new master password and confirmation differ".to_string(),
            ));
        }

        storage::save(&self.path, &state.catalog, new_password, &self.codec).map_err(|e| {
            tracing::warn!("Master password rotation aborted: {}", e);
            e
        })?;
        state.master_password = Zeroizing::new(new_password.to_string());

        tracing::info!("Master password changed for {}", self.path.display());
        Ok(())
    }

    /// Run `f` on a copy of the catalog, save the copy, then commit it.
    fn mutate<T>(&self, f: impl FnOnce(&mut Catalog) -> VaultResult<T>) -> VaultResult<T> {
        let mut state = self.write();

        let mut staged = state.catalog.clone();
        let result = f(&mut staged)?;
        storage::save(&self.path, &staged, &state.master_password, &self.codec)?;

        state.catalog = staged;
        Ok(result)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
