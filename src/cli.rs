// src/cli.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::{AppError, AppResult, CryptoError, VaultError};
use crate::models::Repeat;
use crate::vault::{
    AddOutcome, DeleteOutcome, GetOutcome, ReminderDeleteOutcome, UpdateOutcome, Vault,
};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// An encrypted credential vault with a reminder store on the side.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the vault record file (overrides the config file)
    #[clap(short, long, value_parser, global = true)]
    pub file: Option<PathBuf>,

    /// Path to the encryption key file (overrides the config file)
    #[clap(short, long, value_parser, global = true)]
    pub key_file: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a new account
    Add {
        platform: String,
        username: String,
        /// Password to store; prompted for when omitted
        #[clap(short, long)]
        password: Option<String>,
    },
    /// Look up an account and print its password
    Get { platform: String, username: String },
    /// Replace the password of an existing account
    Update {
        platform: String,
        username: String,
        /// New password; prompted for when omitted
        #[clap(short, long)]
        password: Option<String>,
    },
    /// Remove an account
    Delete { platform: String, username: String },
    /// List stored accounts (passwords are never shown)
    List,
    /// Manage reminders
    #[clap(subcommand)]
    Remind(RemindCommand),
}

#[derive(Subcommand, Debug)]
pub enum RemindCommand {
    /// Add a reminder
    Add {
        title: String,
        /// Due time, formatted YYYY-MM-DD HH:MM
        datetime: String,
        /// Owner tag used for filtering
        #[clap(short, long, default_value = "")]
        name: String,
        /// Free-text note
        #[clap(long, default_value = "")]
        note: String,
        #[clap(long, value_enum, default_value_t = Repeat::None)]
        repeat: Repeat,
    },
    /// List reminders, optionally only those owned by a name
    List {
        #[clap(short, long)]
        name: Option<String>,
    },
    /// Delete every reminder with this exact title
    Delete { title: String },
}

/// Handles the parsed CLI command against the vault named by `config`
/// (or the `--file`/`--key-file` overrides).
pub fn handle_cli_command(cli: Cli, config: &Config) -> AppResult<()> {
    log::debug!("Handling CLI command: {:?}", cli.command);

    let vault_path = cli.file.unwrap_or_else(|| config.vault_file.clone());
    let key_path = cli.key_file.unwrap_or_else(|| config.key_file.clone());
    // A key file that cannot be read or created aborts right here; there is
    // no useful vault to run without it.
    let mut vault = Vault::open(&vault_path, &key_path)?;

    match cli.command {
        Commands::Add { platform, username, password } => {
            require_non_blank(&platform, "platform")?;
            require_non_blank(&username, "username")?;
            let password = obtain_password(password, "Password to store: ")?;

            match vault.add_account(&platform, &username, &password)? {
                AddOutcome::Added => println!("Account added"),
                AddOutcome::AlreadyExists => println!("Account already exists"),
            }
        }
        Commands::Get { platform, username } => {
            require_non_blank(&platform, "platform")?;
            require_non_blank(&username, "username")?;

            match vault.get_account(&platform, &username) {
                Ok(GetOutcome::Found(view)) => {
                    println!("Platform: {}", view.platform);
                    println!("Username: {}", view.username);
                    println!("Password: {}", view.password);
                    println!("Stored:   {}", view.timestamp);
                }
                Ok(GetOutcome::NotFound) => println!("Account not found"),
                Err(VaultError::Crypto(CryptoError::Decryption(_))) => {
                    log::warn!(
                        "Stored password for {}/{} failed to decrypt",
                        platform,
                        username
                    );
                    return Err(AppError::Cli(
                        "Stored password could not be decrypted. The record is corrupted or the key file has changed."
                            .to_string(),
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Update { platform, username, password } => {
            require_non_blank(&platform, "platform")?;
            require_non_blank(&username, "username")?;
            let password = obtain_password(password, "New password: ")?;

            match vault.update_account(&platform, &username, &password)? {
                UpdateOutcome::Updated => println!("Password updated"),
                UpdateOutcome::NotFound => println!("Account not found"),
            }
        }
        Commands::Delete { platform, username } => {
            require_non_blank(&platform, "platform")?;
            require_non_blank(&username, "username")?;

            match vault.delete_account(&platform, &username)? {
                DeleteOutcome::Deleted => println!("Account deleted"),
                DeleteOutcome::NotFound => println!("Account not found"),
            }
        }
        Commands::List => {
            let accounts = vault.list_accounts();
            if accounts.is_empty() {
                println!("No accounts stored.");
            } else {
                println!("Stored accounts:");
                for account in &accounts {
                    println!(
                        "  - Platform: {}, Username: {} (stored {})",
                        account.platform, account.username, account.timestamp
                    );
                }
            }
            log::info!("Listed {} account(s)", accounts.len());
        }
        Commands::Remind(remind) => handle_remind_command(remind, &mut vault)?,
    }

    Ok(())
}

fn handle_remind_command(command: RemindCommand, vault: &mut Vault) -> AppResult<()> {
    match command {
        RemindCommand::Add { title, datetime, name, note, repeat } => {
            require_non_blank(&title, "title")?;
            validate_datetime(&datetime)?;

            vault.add_reminder(&title, &datetime, &name, &note, repeat)?;
            println!("Reminder added");
        }
        RemindCommand::List { name } => {
            let reminders = vault.get_reminders(name.as_deref());
            if reminders.is_empty() {
                println!("No reminders found.");
            } else {
                for reminder in &reminders {
                    let mut line = format!("  - {} at {}", reminder.title, reminder.datetime);
                    if !reminder.name.is_empty() {
                        line.push_str(&format!(" [{}]", reminder.name));
                    }
                    if reminder.repeat != Repeat::None {
                        line.push_str(&format!(" (repeats {})", reminder.repeat));
                    }
                    if !reminder.note.is_empty() {
                        line.push_str(&format!(": {}", reminder.note));
                    }
                    println!("{}", line);
                }
            }
        }
        RemindCommand::Delete { title } => {
            require_non_blank(&title, "title")?;

            match vault.delete_reminder(&title)? {
                ReminderDeleteOutcome::Deleted(1) => println!("Deleted 1 reminder"),
                ReminderDeleteOutcome::Deleted(count) => println!("Deleted {} reminders", count),
                ReminderDeleteOutcome::NotFound => println!("Reminder not found"),
            }
        }
    }
    Ok(())
}

/// Required-field check the store itself deliberately does not perform.
fn require_non_blank(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        log::warn!("Rejected blank {}", field);
        return Err(AppError::Cli(format!("Please provide a non-empty {}.", field)));
    }
    Ok(())
}

fn validate_datetime(datetime: &str) -> AppResult<()> {
    chrono::NaiveDateTime::parse_from_str(datetime, DATETIME_FORMAT).map_err(|e| {
        log::warn!("Rejected reminder datetime '{}': {}", datetime, e);
        AppError::Cli(format!(
            "Invalid datetime '{}': expected the format YYYY-MM-DD HH:MM.",
            datetime
        ))
    })?;
    Ok(())
}

fn obtain_password(flag_value: Option<String>, prompt: &str) -> AppResult<String> {
    let password = match flag_value {
        Some(password) => password,
        None => rpassword::prompt_password(prompt).map_err(|e| {
            log::error!("Failed to read password from terminal: {}", e);
            AppError::Cli(format!("Failed to read password: {}", e))
        })?,
    };
    if password.is_empty() {
        return Err(AppError::Cli("Password cannot be empty.".to_string()));
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_non_blank() {
        assert!(require_non_blank("github", "platform").is_ok());
        assert!(require_non_blank("", "platform").is_err());
        assert!(require_non_blank("   ", "username").is_err());
    }

    #[test]
    fn test_validate_datetime() {
        assert!(validate_datetime("2025-01-01 09:00").is_ok());
        assert!(validate_datetime("2025-01-01").is_err());
        assert!(validate_datetime("tomorrow at nine").is_err());
        assert!(validate_datetime("2025-13-01 09:00").is_err());
    }
}
