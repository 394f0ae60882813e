// src/config.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::{info, warn};

/// Locations of the two persisted files. Defaults match the conventional
/// sibling layout: records in `vault.json`, key in `vault.key`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub vault_file: PathBuf,
    pub key_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            vault_file: PathBuf::from("vault.json"),
            key_file: PathBuf::from("vault.key"),
        }
    }
}

fn get_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "CredVault", "CredVault")
        .map(|proj_dirs| proj_dirs.config_dir().join("credvault.toml"))
}

fn save_default_config(config_path: &Path, config: &Config) -> Result<(), String> {
    if let Some(parent_dir) = config_path.parent() {
        if !parent_dir.exists() {
            fs::create_dir_all(parent_dir)
                .map_err(|e| format!("Failed to create config directory {:?}: {}", parent_dir, e))?;
        }
    }

    let toml_string = toml::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize default config to TOML: {}", e))?;

    let mut file = fs::File::create(config_path)
        .map_err(|e| format!("Failed to create config file {:?}: {}", config_path, e))?;
    file.write_all(toml_string.as_bytes())
        .map_err(|e| format!("Failed to write config to {:?}: {}", config_path, e))?;

    info!("Saved default configuration to {:?}", config_path);
    Ok(())
}

/// Loads the configuration, falling back to defaults on any problem. A
/// missing config file is created with the defaults on first run.
pub fn load_config() -> Config {
    if let Some(config_path) = get_config_path() {
        if config_path.exists() {
            match fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(loaded_config) => {
                        info!("Configuration loaded from {:?}", config_path);
                        return loaded_config;
                    }
                    Err(e) => {
                        warn!(
                            "Failed to parse config file at {:?}: {}. Using default configuration.",
                            config_path, e
                        );
                    }
                },
                Err(e) => {
                    warn!(
                        "Failed to read config file at {:?}: {}. Using default configuration.",
                        config_path, e
                    );
                }
            }
        } else {
            info!(
                "Config file not found at {:?}. Creating and using default configuration.",
                config_path
            );
            let default_config = Config::default();
            if let Err(e) = save_default_config(&config_path, &default_config) {
                warn!("Failed to save default configuration: {}", e);
            }
            return default_config;
        }
    } else {
        warn!("Could not determine config directory. Using default configuration.");
    }
    Config::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.vault_file, PathBuf::from("vault.json"));
        assert_eq!(config.key_file, PathBuf::from("vault.key"));
    }

    #[test]
    fn test_save_and_reload_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("credvault.toml");

        let default_config = Config::default();
        save_default_config(&config_path, &default_config).unwrap();
        assert!(config_path.exists());

        let content = fs::read_to_string(&config_path).unwrap();
        let loaded_config: Config = toml::from_str(&content).unwrap();
        assert_eq!(loaded_config.vault_file, default_config.vault_file);
        assert_eq!(loaded_config.key_file, default_config.key_file);
    }

    #[test]
    fn test_save_config_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nested").join("credvault.toml");

        save_default_config(&config_path, &Config::default()).unwrap();
        assert!(config_path.exists());
    }

    #[test]
    fn test_invalid_toml_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("broken.toml");
        fs::write(&config_path, "vault_file = [this is not valid").unwrap();

        // The lenient path in load_config: parse failure keeps the defaults.
        let mut loaded_config = Config::default();
        if let Ok(content) = fs::read_to_string(&config_path) {
            if let Ok(cfg) = toml::from_str(&content) {
                loaded_config = cfg;
            }
        }
        assert_eq!(loaded_config.vault_file, Config::default().vault_file);
    }

    #[test]
    fn test_custom_paths_round_trip() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("credvault.toml");
        let custom = Config {
            vault_file: PathBuf::from("/srv/secrets/records.json"),
            key_file: PathBuf::from("/srv/secrets/master.key"),
        };

        save_default_config(&config_path, &custom).unwrap();
        let loaded: Config = toml::from_str(&fs::read_to_string(&config_path).unwrap()).unwrap();
        assert_eq!(loaded.vault_file, custom.vault_file);
        assert_eq!(loaded.key_file, custom.key_file);
    }
}
