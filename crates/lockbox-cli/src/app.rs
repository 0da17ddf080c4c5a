//! Command implementations on top of an unlocked vault.

use anyhow::{Context, Result};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use lockbox_core::{generate_password, Entry, EntryChanges, Vault};
use std::io::Write;

use crate::config::Config;

/// Maximum number of search results shown.
const SEARCH_LIMIT: usize = 10;

/// Timestamp format used for display.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Main application model.
pub struct App {
    /// Loaded configuration.
    pub config: Config,
    /// The unlocked vault.
    pub vault: Vault,
}

/// A search result.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched entry.
    pub entry: Entry,
    /// Category name (for display).
    pub category: String,
    /// Match score for sorting.
    pub score: i64,
}

/// Fields accepted by `update`.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    pub service: Option<String>,
    pub category: Option<String>,
    pub secret: Option<String>,
    pub length: Option<usize>,
}

impl App {
    /// Unlock the vault configured in `config`.
    pub fn unlock(config: Config, password: &str) -> Result<Self> {
        let vault = Vault::open(&config.vault_path, password)
            .with_context(|| format!("Failed to unlock vault: {}", config.vault_path.display()))?;
        tracing::info!("Unlocked {} ({} entries)", config.vault_path.display(), vault.entries().len());
        Ok(Self { config, vault })
    }

    /// Print every entry, optionally only those in `category`.
    pub fn list(&self, category: Option<&str>, out: &mut impl Write) -> Result<()> {
        let mut shown = 0;
        for entry in self.vault.entries() {
            let category_name = self.vault.category_name(&entry.category_id);
            if category.is_some_and(|wanted| wanted != category_name) {
                continue;
            }
            writeln!(
                out,
                "{}  {:<28}  {:<14}  {}",
                entry.id,
                entry.service,
                category_name,
                entry.created_at.format(TIME_FORMAT)
            )?;
            shown += 1;
        }
        if shown == 0 {
            writeln!(out, "No entries")?;
        }
        Ok(())
    }

    /// Print one entry including its secret.
    pub fn show(&self, id: &str, out: &mut impl Write) -> Result<()> {
        let entry = self
            .vault
            .entry(id)
            .with_context(|| format!("Entry not found: {id}"))?;
        self.print_entry(&entry, out)
    }

    /// Create an entry with a generated secret.
    pub fn add(&self, service: &str, category: Option<&str>, length: Option<usize>, out: &mut impl Write) -> Result<()> {
        let service = service.trim();
        if service.is_empty() {
            anyhow::bail!("Service name is required");
        }
        let category = match category.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => self.config.default_category.as_str(),
        };
        let secret = generate_password(length.unwrap_or(self.config.password_length));

        let entry = self
            .vault
            .create_entry(service, category, &secret)
            .context("Failed to save new entry")?;
        tracing::info!("Created entry {} for {}", entry.id, entry.service);
        self.print_entry(&entry, out)
    }

    /// Replace an entry. Without an explicit secret a new one is generated.
    pub fn update(&self, id: &str, request: UpdateRequest, out: &mut impl Write) -> Result<()> {
        let secret = match request.secret {
            Some(secret) if !secret.is_empty() => secret,
            _ => generate_password(request.length.unwrap_or(self.config.password_length)),
        };
        let changes = EntryChanges {
            service: request.service.filter(|s| !s.trim().is_empty()),
            category: request.category.filter(|c| !c.trim().is_empty()),
            secret,
        };

        let entry = self
            .vault
            .update_entry(id, changes)
            .with_context(|| format!("Failed to update entry {id}"))?;
        tracing::info!("Updated entry {}", entry.id);
        self.print_entry(&entry, out)
    }

    /// Delete an entry.
    pub fn delete(&self, id: &str, out: &mut impl Write) -> Result<()> {
        let entry = self
            .vault
            .delete_entry(id)
            .with_context(|| format!("Failed to delete entry {id}"))?;
        tracing::info!("Deleted entry {}", entry.id);
        writeln!(out, "Deleted {} ({})", entry.id, entry.service)?;
        Ok(())
    }

    /// Print all categories in creation order.
    pub fn categories(&self, out: &mut impl Write) -> Result<()> {
        let categories = self.vault.categories();
        if categories.is_empty() {
            writeln!(out, "No categories")?;
        }
        for category in categories {
            writeln!(out, "{}  {}", category.id, category.name)?;
        }
        Ok(())
    }

    /// Perform fuzzy search over service and category names.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();

        let mut scored: Vec<_> = self
            .vault
            .entries()
            .into_iter()
            .filter_map(|entry| {
                let category = self.vault.category_name(&entry.category_id);
                let search_text = format!("{} {}", entry.service, category);
                matcher
                    .fuzzy_match(&search_text, query)
                    .map(|score| SearchResult { entry, category, score })
            })
            .collect();

        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(SEARCH_LIMIT);
        scored
    }

    /// Print search results.
    pub fn print_search(&self, query: &str, out: &mut impl Write) -> Result<()> {
        let results = self.search(query);
        if results.is_empty() {
            writeln!(out, "No matches for {query:?}")?;
        }
        for result in results {
            writeln!(out, "{}  {:<28}  {}", result.entry.id, result.entry.service, result.category)?;
        }
        Ok(())
    }

    /// Rotate the master password.
    pub fn change_master(&self, current: &str, new_password: &str, confirm: &str, out: &mut impl Write) -> Result<()> {
        self.vault
            .change_master_password(current, new_password, confirm)
            .context("Failed to change master password")?;
        writeln!(out, "Master password changed")?;
        Ok(())
    }

    /// Print where the vault lives and what it holds.
    pub fn status(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "Vault:      {}", self.vault.path().display())?;
        writeln!(out, "On disk:    {}", if self.vault.path().exists() { "yes" } else { "not yet saved" })?;
        writeln!(out, "User:       {}", self.vault.user().name)?;
        writeln!(out, "Categories: {}", self.vault.categories().len())?;
        writeln!(out, "Entries:    {}", self.vault.entries().len())?;
        Ok(())
    }

    fn print_entry(&self, entry: &Entry, out: &mut impl Write) -> Result<()> {
        writeln!(out, "ID:       {}", entry.id)?;
        writeln!(out, "Service:  {}", entry.service)?;
        writeln!(out, "Password: {}", entry.secret)?;
        writeln!(out, "Category: {}", self.vault.category_name(&entry.category_id))?;
        writeln!(out, "Created:  {}", entry.created_at.format(TIME_FORMAT))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockbox_core::{Codec, KdfParams, DEFAULT_VAULT_FILE, MIN_PASSWORD_LENGTH};
    use tempfile::TempDir;

    fn app(temp_dir: &TempDir) -> App {
        let config = Config {
            vault_path: temp_dir.path().join(DEFAULT_VAULT_FILE),
            ..Config::default()
        };
        let codec = Codec::new(KdfParams::new(10, 8, 1).unwrap());
        let vault = Vault::open_with_codec(&config.vault_path, "master", codec).unwrap();
        App { config, vault }
    }

    fn output(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_add_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(&temp_dir);

        let printed = output(|out| app.add("github.com", None, None, out));
        assert!(printed.contains("Service:  github.com"));
        assert!(printed.contains("Category: other"));

        let entry = &app.vault.entries()[0];
        assert_eq!(entry.secret.len(), app.config.password_length);
    }

    #[test]
    fn test_add_rejects_empty_service() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(&temp_dir);

        let mut out = Vec::new();
        assert!(app.add("   ", Some("social"), None, &mut out).is_err());
        assert!(app.vault.entries().is_empty());
    }

    #[test]
    fn test_add_clamps_short_length() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(&temp_dir);

        output(|out| app.add("github.com", Some("social"), Some(4), out));
        assert_eq!(app.vault.entries()[0].secret.len(), MIN_PASSWORD_LENGTH);
    }

    #[test]
    fn test_list_filters_by_category() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(&temp_dir);
        output(|out| app.add("github.com", Some("social"), None, out));
        output(|out| app.add("bank.example", Some("finance"), None, out));

        let all = output(|out| app.list(None, out));
        assert_eq!(all.lines().count(), 2);

        let social = output(|out| app.list(Some("social"), out));
        assert!(social.contains("github.com"));
        assert!(!social.contains("bank.example"));

        let none = output(|out| app.list(Some("travel"), out));
        assert_eq!(none.trim(), "No entries");
    }

    #[test]
    fn test_update_generates_secret_when_absent() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(&temp_dir);
        output(|out| app.add("github.com", Some("social"), None, out));
        let before = app.vault.entries()[0].clone();

        output(|out| app.update(&before.id, UpdateRequest::default(), out));
        let after = app.vault.entry(&before.id).unwrap();
        assert_ne!(after.secret, before.secret);
        assert_eq!(after.service, before.service);
        assert_eq!(after.category_id, before.category_id);

        let request = UpdateRequest {
            secret: Some("chosen-secret".to_string()),
            category: Some("work".to_string()),
            ..Default::default()
        };
        output(|out| app.update(&before.id, request, out));
        let after = app.vault.entry(&before.id).unwrap();
        assert_eq!(after.secret, "chosen-secret");
        assert_eq!(app.vault.category_name(&after.category_id), "work");
    }

    #[test]
    fn test_delete_unknown_entry_fails() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(&temp_dir);

        let mut out = Vec::new();
        assert!(app.delete("p-missing", &mut out).is_err());
        assert!(app.show("p-missing", &mut out).is_err());
    }

    #[test]
    fn test_search_ranks_matches() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(&temp_dir);
        output(|out| app.add("github.com", Some("social"), None, out));
        output(|out| app.add("gitlab.com", Some("work"), None, out));
        output(|out| app.add("bank.example", Some("finance"), None, out));

        let results = app.search("github");
        assert_eq!(results[0].entry.service, "github.com");
        assert!(results.iter().all(|r| r.entry.service != "bank.example"));

        assert!(app.search("  ").is_empty());
        let by_category = app.search("finance");
        assert_eq!(by_category[0].entry.service, "bank.example");
    }

    #[test]
    fn test_change_master_requires_current_password() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(&temp_dir);

        let mut out = Vec::new();
        assert!(app.change_master("nope", "next", "next", &mut out).is_err());
        let printed = output(|out| app.change_master("master", "next", "next", out));
        assert_eq!(printed.trim(), "Master password changed");
    }

    #[test]
    fn test_status_before_first_save() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(&temp_dir);

        let printed = output(|out| app.status(out));
        assert!(printed.contains("not yet saved"));
        assert!(printed.contains("Entries:    0"));
        assert!(printed.contains("User:       User"));
    }
}
