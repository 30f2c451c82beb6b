//! Integration tests for vaultfs
//!
//! End-to-end behavior of the engine on a real directory.

use std::sync::Arc;
use tempfile::TempDir;
use vaultfs::{
    crypto::KdfParams,
    store::{LocalStorage, MemoryStorage, Storage},
    FileInfoPatch, Vault, VaultConfig,
};

fn fast_config(root: &std::path::Path) -> VaultConfig {
    VaultConfig {
        root_dir: root.to_path_buf(),
        kdf: KdfParams {
            mem_cost_kib: 64,
            time_cost: 1,
            parallelism: 1,
        },
        ..VaultConfig::default()
    }
}

fn local_vault() -> (Vault, TempDir) {
    let dir = TempDir::new().unwrap();
    let vault = Vault::open(fast_config(dir.path())).unwrap();
    (vault, dir)
}

/// The walkthrough from creating a user to revoking a share
#[test]
fn test_report_scenario() {
    let (vault, _dir) = local_vault();
    let key = vault.create_user().unwrap();

    vault.write_file(&key, "docs/report.txt", b"hello").unwrap();
    let entries = vault.list(&key, "docs").unwrap().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "report.txt");
    assert!(!entries[0].is_directory);
    assert_eq!(entries[0].info.as_ref().unwrap().size, 5);

    let hash = vault.create_share(&key, "docs/report.txt").unwrap();
    let shared = vault.resolve_share(&hash).unwrap().unwrap();
    assert_eq!(shared.blob, b"hello");
    assert_eq!(shared.name, "report.txt");

    assert!(vault.delete_file(&key, "docs/report.txt").unwrap());
    assert_eq!(vault.resolve_share(&hash).unwrap(), None);
}

/// Layout on disk: namespace tree, metadata, profile, registry, share copies
#[test]
fn test_persisted_layout() {
    let (vault, dir) = local_vault();
    let key = vault.create_user().unwrap();
    vault.write_file(&key, "a/b.txt", b"x").unwrap();
    let hash = vault.create_share(&key, "a/b.txt").unwrap();

    let ns = dir.path().join(vault.namespace_id(&key));
    assert!(ns.join("files").is_dir());
    assert!(ns.join("infos.json").is_file());
    assert!(ns.join("user.json").is_file());
    assert!(dir.path().join("shares.json").is_file());
    assert!(dir.path().join("shares").join(&hash).is_file());
}

/// A reopened vault sees everything the previous one wrote
#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let (key, hash) = {
        let vault = Vault::open(fast_config(dir.path())).unwrap();
        let key = vault.create_user().unwrap();
        vault.write_file(&key, "notes/todo", b"buy milk").unwrap();
        let hash = vault.create_share(&key, "notes/todo").unwrap();
        (key, hash)
    };

    let vault = Vault::open(fast_config(dir.path())).unwrap();
    assert_eq!(
        vault.read_file(&key, "notes/todo", false).unwrap(),
        Some(b"buy milk".to_vec())
    );
    assert_eq!(vault.resolve_share(&hash).unwrap().unwrap().blob, b"buy milk");
    assert_eq!(vault.login(&key).unwrap(), 8);
}

/// Location hashes are relative to the storage root, so a moved root keeps working
#[test]
fn test_root_can_move() {
    let first = TempDir::new().unwrap();
    let vault = Vault::open(fast_config(first.path())).unwrap();
    let key = vault.create_user().unwrap();
    vault.write_file(&key, "f", b"data").unwrap();
    let hash = vault.create_share(&key, "f").unwrap();
    drop(vault);

    let second = TempDir::new().unwrap();
    let moved = second.path().join("moved");
    std::fs::rename(first.path(), &moved).unwrap();

    let vault = Vault::open(fast_config(&moved)).unwrap();
    assert_eq!(vault.location_hash(&key, "f").unwrap(), hash);
    assert_eq!(vault.resolve_share(&hash).unwrap().unwrap().blob, b"data");
}

#[test]
fn test_metadata_accuracy() {
    let (vault, _dir) = local_vault();
    let key = vault.create_user().unwrap();
    let payloads: [&[u8]; 3] = [b"a", b"bbbb", b"cc"];
    for payload in payloads {
        vault.write_file(&key, "f", payload).unwrap();
    }
    for _ in 0..4 {
        vault.read_file(&key, "f", true).unwrap();
    }

    let info = vault.get_file_info(&key, "f").unwrap().unwrap();
    assert_eq!(info.size, 2);
    assert_eq!(info.downloads.len(), 4);
}

#[test]
fn test_extra_metadata_survives_writes() {
    let (vault, _dir) = local_vault();
    let key = vault.create_user().unwrap();
    vault.write_file(&key, "f", b"1").unwrap();
    vault
        .set_file_info(
            &key,
            "f",
            Some(FileInfoPatch::default().with_extra("label", serde_json::json!("blue"))),
        )
        .unwrap();
    vault.write_file(&key, "f", b"22").unwrap();

    let info = vault.get_file_info(&key, "f").unwrap().unwrap();
    assert_eq!(info.size, 2);
    assert_eq!(info.extra["label"], "blue");
}

#[test]
fn test_recursive_delete_on_disk() {
    let (vault, dir) = local_vault();
    let key = vault.create_user().unwrap();
    for path in ["p/a", "p/q/b", "p/q/r/c"] {
        vault.write_file(&key, path, path.as_bytes()).unwrap();
    }
    vault.create_share(&key, "p/q/r/c").unwrap();

    assert!(vault.delete_folder(&key, "p").unwrap());
    assert_eq!(vault.list(&key, "p").unwrap(), None);
    assert!(vault.get_user_infos(&key).unwrap().is_empty());
    assert!(vault.load_registry().unwrap().is_empty());
    let copies = std::fs::read_dir(dir.path().join("shares")).unwrap().count();
    assert_eq!(copies, 0);
}

/// Concurrent writers to one namespace never lose metadata records
#[test]
fn test_concurrent_writes_keep_every_record() {
    let dir = TempDir::new().unwrap();
    let vault = Arc::new(Vault::open(fast_config(dir.path())).unwrap());
    let key = vault.create_user().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let vault = Arc::clone(&vault);
            let key = key.clone();
            std::thread::spawn(move || {
                for j in 0..5 {
                    vault
                        .write_file(&key, &format!("t{i}/f{j}"), b"x")
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(vault.get_user_infos(&key).unwrap().len(), 40);
    assert_eq!(vault.login(&key).unwrap(), 40);
}

/// Concurrent share creation never loses registry entries
#[test]
fn test_concurrent_shares_keep_every_entry() {
    let vault = Arc::new(Vault::with_storage(
        Arc::new(MemoryStorage::new()),
        fast_config(std::path::Path::new("unused")),
    ));
    let key = vault.create_user().unwrap();
    for i in 0..6 {
        vault.write_file(&key, &format!("f{i}"), b"x").unwrap();
    }

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let vault = Arc::clone(&vault);
            let key = key.clone();
            std::thread::spawn(move || vault.create_share(&key, &format!("f{i}")).unwrap())
        })
        .collect();
    let hashes: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let registry = vault.load_registry().unwrap();
    assert_eq!(registry.len(), 6);
    assert!(hashes.iter().all(|h| registry.contains_key(h)));
}

/// Both backends behave the same through the vault
#[test]
fn test_backends_agree() {
    let dir = TempDir::new().unwrap();
    let backends: Vec<Arc<dyn Storage>> = vec![
        Arc::new(LocalStorage::open(dir.path()).unwrap()),
        Arc::new(MemoryStorage::new()),
    ];
    let mut listings = Vec::new();
    for storage in backends {
        let vault = Vault::with_storage(storage, fast_config(dir.path()));
        vault.write_file("k", "x/1", b"1").unwrap();
        vault.create_folder("k", "x/sub").unwrap();
        let names: Vec<_> = vault
            .list("k", "x")
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|e| (e.name, e.is_directory, e.hash))
            .collect();
        listings.push(names);
    }
    assert_eq!(listings[0], listings[1]);
}

/// The command-line front end drives the same engine
#[test]
fn test_cli_against_local_root() {
    use vaultfs_cli::{run, Command};

    let (vault, _dir) = local_vault();
    let mut out = Vec::new();
    run(&vault, None, Command::CreateUser { lifetime_hours: None }, &mut out).unwrap();
    let created: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let key = created["key"].as_str().unwrap();

    out.clear();
    run(&vault, Some(key), Command::Mkdir { path: "inbox".into() }, &mut out).unwrap();
    out.clear();
    run(&vault, Some(key), Command::Ls { path: String::new() }, &mut out).unwrap();
    let listing: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(listing[0]["name"], "inbox");
    assert_eq!(listing[0]["is_directory"], true);
}
