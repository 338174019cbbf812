//! Password-based authenticated encryption and auth-token derivation.
//!
//! Each ENCRYPTED packet carries a self-contained cipher-blob
//! `salt(16) ‖ nonce(12) ‖ ciphertext ‖ tag(16)`: the key is re-derived from
//! the password and the transmitted salt on every decryption, so no key
//! material is cached between packets.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{ModemError, Result};

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const KEY_LEN: usize = 32;
pub const PBKDF2_ITERATIONS: u32 = 100_000;
pub const TOKEN_LEN: usize = 4;

/// Fixed bytes of every cipher-blob: salt + nonce + GCM tag.
pub const BLOB_OVERHEAD: usize = SALT_LEN + NONCE_LEN + TAG_LEN; // 44

/// Derive a 256-bit AES key from a password with PBKDF2-HMAC-SHA256.
pub fn derive_key(password: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}

/// Encrypt `plaintext` under a password-derived key.
///
/// Returns `salt ‖ nonce ‖ ciphertext ‖ tag` with a fresh random salt and
/// nonce per call, so encrypting the same plaintext twice never produces the
/// same blob. Empty passwords are rejected.
pub fn encrypt(password: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
    if password.is_empty() {
        return Err(ModemError::AuthFailure);
    }

    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(password, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

    // The aead crate appends the 16-byte tag to the ciphertext
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| ModemError::AuthFailure)?;

    let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a cipher-blob produced by [`encrypt`].
///
/// Fails with `AuthFailure` when the blob is shorter than the fixed
/// salt/nonce/tag layout, the password is empty or wrong, or the GCM tag
/// does not verify.
pub fn decrypt(password: &str, blob: &[u8]) -> Result<Vec<u8>> {
    if password.is_empty() || blob.len() < BLOB_OVERHEAD {
        return Err(ModemError::AuthFailure);
    }

    let (salt, rest) = blob.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_key(password, salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| ModemError::AuthFailure)
}

/// Proof-of-knowledge token: the first 4 bytes of SHA-256 over the secret.
pub fn auth_token(secret: &str) -> [u8; TOKEN_LEN] {
    let digest = Sha256::digest(secret.as_bytes());
    let mut token = [0u8; TOKEN_LEN];
    token.copy_from_slice(&digest[..TOKEN_LEN]);
    token
}

/// Constant-time comparison of a received token against the token derived
/// from the expected secret.
pub fn auth_verify(received: &[u8; TOKEN_LEN], expected_secret: &str) -> bool {
    let expected = auth_token(expected_secret);
    bool::from(received[..].ct_eq(&expected[..]))
}
