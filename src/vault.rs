// src/vault.rs
use crate::error::{VaultError, VaultResult};
use crate::keys::KeyManager;
use crate::models::{
    AccountKey, AccountRecord, AccountSummary, AccountView, ReminderRecord, Repeat, VaultData,
};

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of `add_account`. "Already exists" is a reported result, not an
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyExists,
}

/// Outcome of `get_account`. A record whose ciphertext fails to decrypt is
/// NOT reported here; that surfaces as `VaultError::Crypto` so callers can
/// tell a missing record from a corrupted one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetOutcome {
    Found(AccountView),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Outcome of `delete_reminder`. Titles are not unique, so a single delete
/// can remove several records; `Deleted` carries the count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderDeleteOutcome {
    Deleted(usize),
    NotFound,
}

/// The persistent credential store.
///
/// Owns the record file and the key manager; constructed once at startup and
/// handed to the calling layer. Mutating operations take `&mut self`, which
/// serializes every check-then-act sequence within the process.
pub struct Vault {
    path: PathBuf,
    keys: KeyManager,
    data: VaultData,
}

impl Vault {
    /// Opens the vault at `vault_path`, initializing the key file at
    /// `key_path` on first use. A missing record file yields an empty vault;
    /// an unreadable or unparseable one is an error.
    pub fn open(vault_path: &Path, key_path: &Path) -> VaultResult<Self> {
        let keys = KeyManager::init(key_path)?;

        let data = if vault_path.exists() {
            let contents = std::fs::read_to_string(vault_path).map_err(|e| {
                log::error!("Failed to read vault file {:?}: {}", vault_path, e);
                VaultError::Io(e)
            })?;
            serde_json::from_str(&contents).map_err(|e| {
                let msg = format!("Vault file {:?} is not valid JSON: {}", vault_path, e);
                log::error!("open: {}", msg);
                VaultError::Deserialization(msg)
            })?
        } else {
            log::info!("Vault file {:?} not found, starting empty", vault_path);
            VaultData::default()
        };

        log::info!(
            "Opened vault {:?} ({} accounts, {} reminders)",
            vault_path,
            data.accounts.len(),
            data.reminders.len()
        );
        Ok(Vault { path: vault_path.to_path_buf(), keys, data })
    }

    /// Writes the full record collection back to disk. Called after every
    /// mutation so the store survives process restarts.
    fn persist(&self) -> VaultResult<()> {
        let serialized = serde_json::to_string_pretty(&self.data).map_err(|e| {
            let msg = format!("Vault serialization failed: {}", e);
            log::error!("persist: {}", msg);
            VaultError::Serialization(msg)
        })?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| {
                log::error!("Failed to open vault file {:?} for writing: {}", self.path, e);
                VaultError::Io(e)
            })?;
        file.write_all(serialized.as_bytes()).map_err(|e| {
            log::error!("Failed to write vault file {:?}: {}", self.path, e);
            VaultError::Io(e)
        })?;

        log::debug!("Persisted vault to {:?}", self.path);
        Ok(())
    }

    fn find_account(&self, key: &AccountKey) -> Option<usize> {
        self.data.accounts.iter().position(|record| key.matches(record))
    }

    /// Stores a new account with an encrypted password. Reports
    /// `AlreadyExists` when the normalized (platform, username) pair is
    /// already present.
    pub fn add_account(
        &mut self,
        platform: &str,
        username: &str,
        password: &str,
    ) -> VaultResult<AddOutcome> {
        let key = AccountKey::new(platform, username);
        if self.find_account(&key).is_some() {
            log::info!("add_account: {}/{} already exists", key.platform, key.username);
            return Ok(AddOutcome::AlreadyExists);
        }

        let ciphertext = self.keys.encrypt(password)?;
        self.data.accounts.push(AccountRecord {
            platform: key.platform.clone(),
            username: key.username.clone(),
            password: ciphertext,
            timestamp: now_stamp(),
        });
        self.persist()?;
        log::info!("add_account: stored {}/{}", key.platform, key.username);
        Ok(AddOutcome::Added)
    }

    /// Looks up an account and decrypts its password.
    ///
    /// Returns `NotFound` when no record matches. A matching record whose
    /// ciphertext cannot be authenticated propagates as
    /// `VaultError::Crypto(CryptoError::Decryption)`.
    pub fn get_account(&self, platform: &str, username: &str) -> VaultResult<GetOutcome> {
        let key = AccountKey::new(platform, username);
        let record = match self.find_account(&key) {
            Some(index) => &self.data.accounts[index],
            None => {
                log::info!("get_account: {}/{} not found", key.platform, key.username);
                return Ok(GetOutcome::NotFound);
            }
        };

        let plaintext = self.keys.decrypt(&record.password).map_err(|e| {
            log::warn!(
                "get_account: stored ciphertext for {}/{} failed to decrypt",
                key.platform,
                key.username
            );
            e
        })?;

        Ok(GetOutcome::Found(AccountView {
            platform: record.platform.clone(),
            username: record.username.clone(),
            password: plaintext,
            timestamp: record.timestamp.clone(),
        }))
    }

    /// Re-encrypts and overwrites the password (and timestamp) of an
    /// existing account.
    pub fn update_account(
        &mut self,
        platform: &str,
        username: &str,
        new_password: &str,
    ) -> VaultResult<UpdateOutcome> {
        let key = AccountKey::new(platform, username);
        let index = match self.find_account(&key) {
            Some(index) => index,
            None => {
                log::info!("update_account: {}/{} not found", key.platform, key.username);
                return Ok(UpdateOutcome::NotFound);
            }
        };

        let ciphertext = self.keys.encrypt(new_password)?;
        let record = &mut self.data.accounts[index];
        record.password = ciphertext;
        record.timestamp = now_stamp();
        self.persist()?;
        log::info!("update_account: updated {}/{}", key.platform, key.username);
        Ok(UpdateOutcome::Updated)
    }

    /// Removes an account record.
    pub fn delete_account(
        &mut self,
        platform: &str,
        username: &str,
    ) -> VaultResult<DeleteOutcome> {
        let key = AccountKey::new(platform, username);
        let index = match self.find_account(&key) {
            Some(index) => index,
            None => {
                log::info!("delete_account: {}/{} not found", key.platform, key.username);
                return Ok(DeleteOutcome::NotFound);
            }
        };

        self.data.accounts.remove(index);
        self.persist()?;
        log::info!("delete_account: removed {}/{}", key.platform, key.username);
        Ok(DeleteOutcome::Deleted)
    }

    /// Lists all accounts without password material, encrypted or not.
    pub fn list_accounts(&self) -> Vec<AccountSummary> {
        self.data
            .accounts
            .iter()
            .map(|record| AccountSummary {
                platform: record.platform.clone(),
                username: record.username.clone(),
                timestamp: record.timestamp.clone(),
            })
            .collect()
    }

    /// Inserts a reminder unconditionally. Duplicate titles are allowed;
    /// `delete_reminder` later removes every match at once.
    pub fn add_reminder(
        &mut self,
        title: &str,
        datetime: &str,
        name: &str,
        note: &str,
        repeat: Repeat,
    ) -> VaultResult<()> {
        self.data.reminders.push(ReminderRecord {
            name: name.to_lowercase(),
            title: title.to_string(),
            datetime: datetime.to_string(),
            note: note.to_string(),
            repeat,
        });
        self.persist()?;
        log::info!("add_reminder: stored '{}' at {}", title, datetime);
        Ok(())
    }

    /// Returns all reminders, optionally filtered to those whose normalized
    /// owner tag matches `name`.
    pub fn get_reminders(&self, name: Option<&str>) -> Vec<ReminderRecord> {
        match name {
            Some(name) => {
                let name = name.to_lowercase();
                self.data
                    .reminders
                    .iter()
                    .filter(|reminder| reminder.name == name)
                    .cloned()
                    .collect()
            }
            None => self.data.reminders.clone(),
        }
    }

    /// Removes every reminder whose title matches exactly.
    pub fn delete_reminder(&mut self, title: &str) -> VaultResult<ReminderDeleteOutcome> {
        let before = self.data.reminders.len();
        self.data.reminders.retain(|reminder| reminder.title != title);
        let removed = before - self.data.reminders.len();

        if removed == 0 {
            log::info!("delete_reminder: no reminder titled '{}'", title);
            return Ok(ReminderDeleteOutcome::NotFound);
        }
        self.persist()?;
        log::info!("delete_reminder: removed {} reminder(s) titled '{}'", removed, title);
        Ok(ReminderDeleteOutcome::Deleted(removed))
    }
}

fn now_stamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}
