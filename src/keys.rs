// src/keys.rs
use crate::crypto::{self, KEY_LEN};
use crate::error::{CryptoResult, KeyError, KeyResult};

use std::fs;
use std::path::Path;

/// Owns the symmetric encryption key for the lifetime of the process.
///
/// The key is read from a key file at startup; if the file does not exist a
/// fresh random key is generated and persisted first. The file is never
/// rewritten after that, so repeated initialization leaves it byte-for-byte
/// unchanged.
pub struct KeyManager {
    key: [u8; KEY_LEN],
}

impl KeyManager {
    /// Loads the key from `path`, generating and persisting a new one on
    /// first use.
    pub fn init(path: &Path) -> KeyResult<Self> {
        let key = if path.exists() {
            Self::read_key_file(path)?
        } else {
            log::info!("Key file {:?} not found, generating a new key", path);
            let key = crypto::generate_key();
            Self::write_key_file(path, &key)?;
            key
        };
        Ok(KeyManager { key })
    }

    fn read_key_file(path: &Path) -> KeyResult<[u8; KEY_LEN]> {
        let bytes = fs::read(path).map_err(|e| {
            log::error!("Failed to read key file {:?}: {}", path, e);
            KeyError::Io(e)
        })?;
        let found = bytes.len();
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            log::error!(
                "Key file {:?} has invalid length: expected {}, found {}",
                path,
                KEY_LEN,
                found
            );
            KeyError::InvalidLength { expected: KEY_LEN, found }
        })?;
        log::info!("Loaded encryption key from {:?}", path);
        Ok(key)
    }

    fn write_key_file(path: &Path, key: &[u8; KEY_LEN]) -> KeyResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    log::error!("Failed to create key directory {:?}: {}", parent, e);
                    KeyError::Io(e)
                })?;
            }
        }
        fs::write(path, key).map_err(|e| {
            log::error!("Failed to write key file {:?}: {}", path, e);
            KeyError::Io(e)
        })?;
        restrict_permissions(path)?;
        log::info!("Generated new encryption key at {:?}", path);
        Ok(())
    }

    /// Encrypts `plaintext` to an opaque hex token.
    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<String> {
        crypto::seal(plaintext, &self.key)
    }

    /// Decrypts a token produced by `encrypt`. Fails when the token is
    /// malformed, tampered with, or was sealed under a different key.
    pub fn decrypt(&self, token: &str) -> CryptoResult<String> {
        crypto::open(token, &self.key)
    }
}

/// The key file must only be readable by its owner.
fn restrict_permissions(path: &Path) -> KeyResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_key_file_on_first_use() {
        let dir = tempdir().unwrap();
        let key_path = dir.path().join("vault.key");
        assert!(!key_path.exists());

        let manager = KeyManager::init(&key_path).expect("init failed");
        assert!(key_path.exists());
        assert_eq!(fs::read(&key_path).unwrap().len(), KEY_LEN);

        let token = manager.encrypt("s3cret").unwrap();
        assert_eq!(manager.decrypt(&token).unwrap(), "s3cret");
    }

    #[test]
    fn test_init_is_idempotent() {
        let dir = tempdir().unwrap();
        let key_path = dir.path().join("vault.key");

        KeyManager::init(&key_path).expect("first init failed");
        let first = fs::read(&key_path).unwrap();

        KeyManager::init(&key_path).expect("second init failed");
        let second = fs::read(&key_path).unwrap();
        assert_eq!(first, second, "existing key file must not be rewritten");
    }

    #[test]
    fn test_tokens_survive_reload() {
        let dir = tempdir().unwrap();
        let key_path = dir.path().join("vault.key");

        let manager = KeyManager::init(&key_path).unwrap();
        let token = manager.encrypt("persisted secret").unwrap();
        drop(manager);

        let reloaded = KeyManager::init(&key_path).unwrap();
        assert_eq!(reloaded.decrypt(&token).unwrap(), "persisted secret");
    }

    #[test]
    fn test_init_rejects_truncated_key_file() {
        let dir = tempdir().unwrap();
        let key_path = dir.path().join("vault.key");
        fs::write(&key_path, b"way too short").unwrap();

        match KeyManager::init(&key_path) {
            Err(KeyError::InvalidLength { expected, found }) => {
                assert_eq!(expected, KEY_LEN);
                assert_eq!(found, 13);
            }
            other => panic!("Expected InvalidLength, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_init_creates_missing_parent_directory() {
        let dir = tempdir().unwrap();
        let key_path = dir.path().join("nested").join("keys").join("vault.key");

        KeyManager::init(&key_path).expect("init with missing parents failed");
        assert!(key_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let key_path = dir.path().join("vault.key");
        KeyManager::init(&key_path).unwrap();

        let mode = fs::metadata(&key_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
