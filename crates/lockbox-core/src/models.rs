//! Plaintext catalog: user profile, categories and entries.
//!
//! Category links are advisory. An entry may point at a category id that no
//! longer exists; lookups fall back to [`UNKNOWN_CATEGORY`] rather than
//! failing, and nothing here enforces referential integrity.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};

use crate::generator::new_category_id;

/// Display name returned for category ids with no matching category.
pub const UNKNOWN_CATEGORY: &str = "—";

/// Display name of a freshly created catalog's user.
pub const DEFAULT_USER_NAME: &str = "User";

/// The catalog owner. Display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
}

impl Default for User {
    fn default() -> Self {
        Self {
            name: DEFAULT_USER_NAME.to_string(),
        }
    }
}

/// A named group of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// A stored credential.
///
/// Serialized with the field names `password`, `category` and `created` so
/// existing containers stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub service: String,
    #[serde(rename = "password")]
    pub secret: String,
    #[serde(rename = "category")]
    pub category_id: String,
    #[serde(rename = "created", with = "timestamp")]
    pub created_at: NaiveDateTime,
}

impl Entry {
    /// Create an entry stamped with the current local time.
    pub fn new(id: String, service: String, secret: String, category_id: String) -> Self {
        Self {
            id,
            service,
            secret,
            category_id,
            created_at: now(),
        }
    }
}

/// Root of the plaintext that gets encrypted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub user: User,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub categories: Vec<Category>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub entries: Vec<Entry>,
}

/// Older writers emit `null` for lists that were never populated.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Catalog {
    /// Create an empty catalog with the default user.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the first category called `name`, creating it if none exists.
    ///
    /// New categories are appended, so display order is creation order.
    pub fn resolve_category(&mut self, name: &str) -> String {
        if let Some(category) = self.categories.iter().find(|c| c.name == name) {
            return category.id.clone();
        }

        let id = new_category_id();
        tracing::debug!("Creating category {:?} ({})", name, id);
        self.categories.push(Category {
            id: id.clone(),
            name: name.to_string(),
        });
        id
    }

    /// Name of the category with `id`, or [`UNKNOWN_CATEGORY`].
    pub fn category_name(&self, id: &str) -> &str {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
            .unwrap_or(UNKNOWN_CATEGORY)
    }

    /// Position of the entry with `id` in [`Catalog::entries`].
    pub fn find_entry_index(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Append an entry.
    pub fn create_entry(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Replace every field of the entry at `index` except its id, and
    /// re-stamp its timestamp. Returns the updated entry.
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds; obtain it from [`Catalog::find_entry_index`].
    pub fn update_entry(&mut self, index: usize, service: String, secret: String, category_id: String) -> &Entry {
        let entry = &mut self.entries[index];
        entry.service = service;
        entry.secret = secret;
        entry.category_id = category_id;
        entry.created_at = now();
        entry
    }

    /// Remove and return the entry at `index`, keeping the order of the rest.
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds.
    pub fn delete_entry(&mut self, index: usize) -> Entry {
        self.entries.remove(index)
    }
}

/// Current local time truncated to whole seconds, the stored precision.
fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// `YYYY-MM-DD HH:MM:SS` timestamps.
mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(de::Error::custom)
    }
}
