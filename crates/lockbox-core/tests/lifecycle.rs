use lockbox_core::{
    container::{NONCE_LEN, TAG_LEN},
    kdf::SALT_LEN,
    load, save, Catalog, Codec, KdfParams, Vault, VaultError, DEFAULT_VAULT_FILE,
};
use tempfile::TempDir;

fn codec() -> Codec {
    Codec::new(KdfParams::new(10, 8, 1).unwrap())
}

#[test]
fn first_run_then_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(DEFAULT_VAULT_FILE);

    let vault = Vault::open_with_codec(&path, "correct horse", codec()).unwrap();
    assert_eq!(vault.snapshot(), Catalog::new());
    assert!(!path.exists());

    let entry = vault.create_entry("github.com", "social", "Zk2pQ9x7Lm").unwrap();
    drop(vault);

    let reopened = Vault::open_with_codec(&path, "correct horse", codec()).unwrap();
    let entries = reopened.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].service, "github.com");
    assert_eq!(entries[0], entry);

    let categories = reopened.categories();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "social");
    assert_eq!(reopened.category_name(&entries[0].category_id), "social");

    let wrong = Vault::open_with_codec(&path, "battery staple", codec());
    assert!(matches!(wrong, Err(VaultError::AuthenticationFailed)));
}

#[test]
fn container_layout_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(DEFAULT_VAULT_FILE);
    let codec = codec();

    let catalog = Catalog::new();
    save(&path, &catalog, "master", &codec).unwrap();

    let raw = std::fs::read(&path).unwrap();
    let plaintext = codec.decode(&raw, "master").unwrap();
    assert_eq!(raw.len(), SALT_LEN + NONCE_LEN + plaintext.len() + TAG_LEN);

    let json: serde_json::Value = serde_json::from_slice(&plaintext).unwrap();
    assert_eq!(json["user"]["name"], "User");
    assert!(json["categories"].as_array().unwrap().is_empty());
    assert!(json["entries"].as_array().unwrap().is_empty());
}

#[test]
fn rotation_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(DEFAULT_VAULT_FILE);

    let vault = Vault::open_with_codec(&path, "first", codec()).unwrap();
    vault.create_entry("mail.example", "other", "aaaaaaaaaa").unwrap();
    vault.change_master_password("first", "second", "second").unwrap();
    drop(vault);

    assert!(matches!(
        load(&path, "first", &codec()),
        Err(VaultError::AuthenticationFailed)
    ));
    let catalog = load(&path, "second", &codec()).unwrap();
    assert_eq!(catalog.entries[0].service, "mail.example");
}
