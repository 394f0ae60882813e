// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Encryption failed: {0}")]
    Encryption(String),
    #[error("Decryption failed: {0}")]
    Decryption(String),
}

/// Failures while reading or writing the key file. Unrecoverable for the
/// process: a vault without a usable key must not start.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Key file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Key file must hold exactly {expected} bytes, found {found}")]
    InvalidLength { expected: usize, found: usize },
}

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Vault file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Key storage error: {0}")]
    Key(#[from] KeyError),
    #[error("Cryptography error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),
    #[error("CLI error: {0}")]
    Cli(String),
}

// Result type aliases for convenience
pub type CryptoResult<T> = Result<T, CryptoError>;
pub type KeyResult<T> = Result<T, KeyError>;
pub type VaultResult<T> = Result<T, VaultError>;
pub type AppResult<T> = Result<T, AppError>;
