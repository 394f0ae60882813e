// src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored credential. `platform` and `username` are lowercased before
/// storage; `password` holds the encrypted token, never plaintext.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AccountRecord {
    pub platform: String,
    pub username: String,
    pub password: String,
    pub timestamp: String,
}

/// A reminder. `name` is a lowercased owner tag and may be empty; `title`
/// is the lookup and delete key (not required to be unique).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReminderRecord {
    pub name: String,
    pub title: String,
    pub datetime: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub repeat: Repeat,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Repeat::None => "none",
            Repeat::Daily => "daily",
            Repeat::Weekly => "weekly",
            Repeat::Monthly => "monthly",
        };
        write!(f, "{}", s)
    }
}

/// Everything the vault persists, as one JSON document. Accounts and
/// reminders live in separate collections.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct VaultData {
    #[serde(default)]
    pub accounts: Vec<AccountRecord>,
    #[serde(default)]
    pub reminders: Vec<ReminderRecord>,
}

/// Normalized (platform, username) pair. The single place where case
/// normalization happens, so lookups and inserts cannot disagree on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountKey {
    pub platform: String,
    pub username: String,
}

impl AccountKey {
    pub fn new(platform: &str, username: &str) -> Self {
        AccountKey {
            platform: platform.to_lowercase(),
            username: username.to_lowercase(),
        }
    }

    pub fn matches(&self, record: &AccountRecord) -> bool {
        record.platform == self.platform && record.username == self.username
    }
}

/// Listing row: identity and timestamp only, no password material.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub platform: String,
    pub username: String,
    pub timestamp: String,
}

/// A fully resolved account as returned by a successful lookup, with the
/// password decrypted back to plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountView {
    pub platform: String,
    pub username: String,
    pub password: String,
    pub timestamp: String,
}
