//! Security Tests
//!
//! Confidentiality and isolation properties of stored data.

use std::sync::Arc;
use vaultfs::{
    crypto::KdfParams,
    store::{MemoryStorage, Storage},
    ShareEntry, ShareRegistry, Vault, VaultConfig, VaultError,
};

fn vault() -> (Vault, MemoryStorage) {
    let storage = MemoryStorage::new();
    let config = VaultConfig {
        kdf: KdfParams {
            mem_cost_kib: 64,
            time_cost: 1,
            parallelism: 1,
        },
        ..VaultConfig::default()
    };
    (Vault::with_storage(Arc::new(storage.clone()), config), storage)
}

/// Nothing a user names or writes is visible in storage
mod confidentiality {
    use super::*;

    #[test]
    fn test_no_plaintext_names_in_storage() {
        let (vault, storage) = vault();
        let key = vault.create_user().unwrap();
        vault
            .write_file(&key, "Taxes 2024/return-final.pdf", b"1040")
            .unwrap();
        vault.create_folder(&key, "Medical").unwrap();

        for path in storage.paths() {
            assert!(!path.contains("Taxes"), "{path}");
            assert!(!path.contains("return"), "{path}");
            assert!(!path.contains("Medical"), "{path}");
        }
    }

    #[test]
    fn test_no_plaintext_content_in_storage() {
        let (vault, storage) = vault();
        let key = vault.create_user().unwrap();
        let secret = b"the launch code is 0000";
        vault.write_file(&key, "f", secret).unwrap();
        vault.create_share(&key, "f").unwrap();

        for path in storage.paths() {
            if let Ok(bytes) = storage.read(&path) {
                assert!(
                    !bytes.windows(secret.len()).any(|w| w == secret),
                    "plaintext found in {path}"
                );
            }
        }
    }

    #[test]
    fn test_rewrites_use_fresh_nonces() {
        let (vault, storage) = vault();
        vault.write_file("k", "f", b"same").unwrap();
        let location = vault.true_location("k", "f").unwrap();
        let first = storage.read(&location).unwrap();
        vault.write_file("k", "f", b"same").unwrap();
        assert_ne!(first, storage.read(&location).unwrap());
    }

    #[test]
    fn test_same_name_differs_across_keys() {
        let (vault, _) = vault();
        let a = vault.true_location("k1", "shared-name").unwrap();
        let b = vault.true_location("k2", "shared-name").unwrap();
        let token = |p: &str| p.rsplit('/').next().unwrap().to_string();
        assert_ne!(token(&a), token(&b));
    }
}

/// One key never reaches another key's data
mod isolation {
    use super::*;

    #[test]
    fn test_same_path_different_keys() {
        let (vault, _) = vault();
        vault.write_file("alice", "diary.txt", b"alice's").unwrap();
        vault.write_file("bob", "diary.txt", b"bob's").unwrap();

        assert_eq!(
            vault.read_file("alice", "diary.txt", false).unwrap(),
            Some(b"alice's".to_vec())
        );
        assert_eq!(
            vault.read_file("bob", "diary.txt", false).unwrap(),
            Some(b"bob's".to_vec())
        );
        assert_eq!(vault.read_file("mallory", "diary.txt", false).unwrap(), None);
    }

    #[test]
    fn test_copied_blob_fails_integrity_under_wrong_key() {
        let (vault, storage) = vault();
        vault.write_file("alice", "f", b"private").unwrap();
        vault.create_folder("mallory", "").unwrap();

        let stolen = storage
            .read(&vault.true_location("alice", "f").unwrap())
            .unwrap();
        let target = vault.true_location("mallory", "f").unwrap();
        storage.write(&target, &stolen).unwrap();

        let err = vault.read_file("mallory", "f", false).unwrap_err();
        assert!(matches!(err, VaultError::Integrity(_)));
        // Indistinguishable from a missing file at the boundary
        assert!(err.is_not_found());
    }

    #[test]
    fn test_foreign_key_cannot_remove_share_or_redirect() {
        let (vault, _) = vault();
        vault.write_file("alice", "f", b"x").unwrap();
        let hash = vault.create_share("alice", "f").unwrap();
        vault.create_redirect("alias", &hash).unwrap();

        assert!(!vault.remove_share("mallory", &hash).unwrap());
        assert!(!vault.remove_share("mallory", "alias").unwrap());
        assert!(vault.resolve_share("alias").unwrap().is_some());
    }

    #[test]
    fn test_destroy_leaves_other_users_untouched() {
        let (vault, _) = vault();
        vault.write_file("alice", "f", b"a").unwrap();
        vault.write_file("bob", "f", b"b").unwrap();
        let bob_share = vault.create_share("bob", "f").unwrap();

        vault.destroy_user("alice").unwrap();
        assert_eq!(vault.read_file("bob", "f", false).unwrap(), Some(b"b".to_vec()));
        assert!(vault.resolve_share(&bob_share).unwrap().is_some());
    }
}

/// Stored data that was altered is rejected, never returned
mod tampering {
    use super::*;

    #[test]
    fn test_flipped_bit_in_blob() {
        let (vault, storage) = vault();
        vault.write_file("k", "f", b"important").unwrap();
        let location = vault.true_location("k", "f").unwrap();
        let mut bytes = storage.read(&location).unwrap().to_vec();
        bytes[14] ^= 0x80;
        storage.write(&location, &bytes).unwrap();

        assert!(matches!(
            vault.read_file("k", "f", false),
            Err(VaultError::Integrity(_))
        ));
    }

    #[test]
    fn test_truncated_blob() {
        let (vault, storage) = vault();
        vault.write_file("k", "f", b"important").unwrap();
        let location = vault.true_location("k", "f").unwrap();
        storage.write(&location, b"short").unwrap();

        assert!(matches!(
            vault.read_file("k", "f", false),
            Err(VaultError::Integrity(_))
        ));
    }

    #[test]
    fn test_planted_entry_breaks_listing_loudly() {
        let (vault, storage) = vault();
        vault.create_folder("k", "d").unwrap();
        let dir = vault.true_location("k", "d").unwrap();
        storage.write(&format!("{dir}/not-a-token"), b"x").unwrap();

        assert!(matches!(vault.list("k", "d"), Err(VaultError::Integrity(_))));
    }
}

/// Share registry documents written by hand cannot hang resolution
mod redirects {
    use super::*;

    #[test]
    fn test_hand_written_cycle_is_rejected() {
        let (vault, storage) = vault();
        let mut registry = ShareRegistry::new();
        for (from, to) in [("a", "b"), ("b", "c"), ("c", "a")] {
            registry.insert(from.into(), ShareEntry::Redirect { redirect: to.into() });
        }
        storage
            .write("shares.json", &serde_json::to_vec(&registry).unwrap())
            .unwrap();

        for start in ["a", "b", "c"] {
            assert!(matches!(
                vault.resolve_share(start),
                Err(VaultError::RedirectLimit { .. })
            ));
        }
    }

    #[test]
    fn test_self_redirect_is_rejected() {
        let (vault, storage) = vault();
        storage
            .write("shares.json", br#"{"loop": {"redirect": "loop"}}"#)
            .unwrap();
        assert!(matches!(
            vault.resolve_share("loop"),
            Err(VaultError::RedirectLimit { .. })
        ));
    }

    #[test]
    fn test_dangling_redirect_is_not_found() {
        let (vault, storage) = vault();
        storage
            .write("shares.json", br#"{"old": {"redirect": "gone"}}"#)
            .unwrap();
        assert_eq!(vault.resolve_share("old").unwrap(), None);
    }
}
