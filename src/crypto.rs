// src/crypto.rs
use crate::error::{CryptoError, CryptoResult};

use chacha20poly1305::{
    aead::{Aead, NewAead, Payload},
    ChaCha20Poly1305, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

/// Generates a cryptographically secure random 32-byte key for
/// ChaCha20Poly1305.
pub fn generate_key() -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut key);
    key
}

fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Encrypts `plaintext` under `key` and encodes the result as a hex token.
///
/// Token layout: `hex(nonce || ciphertext)`, with a fresh random nonce per
/// call. The Poly1305 tag rides at the end of the ciphertext, so `open`
/// rejects any modification of the token.
pub fn seal(plaintext: &str, key: &[u8; KEY_LEN]) -> CryptoResult<String> {
    let cipher = ChaCha20Poly1305::new(key.into());
    let nonce_bytes = generate_nonce();
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, Payload { msg: plaintext.as_bytes(), aad: &[] })
        .map_err(|e| {
            let msg = format!("AEAD encryption failed: {}", e);
            log::error!("seal: {}", msg);
            CryptoError::Encryption(msg)
        })?;

    let mut token = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    token.extend_from_slice(&nonce_bytes);
    token.extend_from_slice(&ciphertext);
    Ok(hex::encode(token))
}

/// Decrypts a token produced by `seal`.
///
/// Fails with `CryptoError::Decryption` when the token is not valid hex, is
/// too short to carry a nonce, was sealed under a different key, or has been
/// tampered with (authentication failure).
pub fn open(token: &str, key: &[u8; KEY_LEN]) -> CryptoResult<String> {
    let raw = hex::decode(token).map_err(|e| {
        let msg = format!("Token is not valid hex: {}", e);
        log::warn!("open: {}", msg);
        CryptoError::Decryption(msg)
    })?;

    if raw.len() < NONCE_LEN {
        let msg = format!("Token too short to contain a nonce (len: {})", raw.len());
        log::warn!("open: {}", msg);
        return Err(CryptoError::Decryption(msg));
    }
    let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);

    let cipher = ChaCha20Poly1305::new(key.into());
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext = cipher
        .decrypt(nonce, Payload { msg: ciphertext, aad: &[] })
        .map_err(|e| {
            // Wrong key, truncated data or a flipped byte all land here.
            let msg = format!("AEAD authentication failed: {}", e);
            log::warn!("open: {}", msg);
            CryptoError::Decryption(msg)
        })?;

    String::from_utf8(plaintext).map_err(|e| {
        let msg = format!("Decrypted bytes are not valid UTF-8: {}", e);
        log::error!("open: {}", msg);
        CryptoError::Decryption(msg)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_round_trip() {
        let key = generate_key();
        let long = "a".repeat(4096);
        for plaintext in ["hunter2", "", "pa ss wörd ☃", long.as_str()] {
            let token = seal(plaintext, &key).expect("seal failed");
            assert_ne!(token, plaintext);
            let recovered = open(&token, &key).expect("open failed");
            assert_eq!(recovered, plaintext);
        }
    }

    #[test]
    fn test_nonces_are_fresh_per_seal() {
        let key = generate_key();
        let token1 = seal("same input", &key).unwrap();
        let token2 = seal("same input", &key).unwrap();
        assert_ne!(token1, token2, "two seals of the same plaintext should not collide");
    }

    #[test]
    fn test_open_with_wrong_key() {
        let key1 = generate_key();
        let key2 = generate_key();
        let token = seal("secret", &key1).unwrap();
        let result = open(&token, &key2);
        assert!(matches!(result, Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn test_flipping_any_byte_fails_authentication() {
        let key = generate_key();
        let token = seal("integrity matters", &key).unwrap();
        let raw = hex::decode(&token).unwrap();

        for i in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[i] ^= 0x01;
            let result = open(&hex::encode(tampered), &key);
            assert!(
                matches!(result, Err(CryptoError::Decryption(_))),
                "flipping byte {} should fail authentication",
                i
            );
        }
    }

    #[test]
    fn test_open_rejects_malformed_tokens() {
        let key = generate_key();
        assert!(matches!(open("not hex at all!", &key), Err(CryptoError::Decryption(_))));
        // Valid hex, but shorter than a nonce.
        assert!(matches!(open("deadbeef", &key), Err(CryptoError::Decryption(_))));
        // Nonce present, ciphertext truncated below the tag length.
        let token = seal("short", &key).unwrap();
        let raw = hex::decode(&token).unwrap();
        let truncated = hex::encode(&raw[..NONCE_LEN + 2]);
        assert!(matches!(open(&truncated, &key), Err(CryptoError::Decryption(_))));
    }
}
