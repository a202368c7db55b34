//! Key derivation: passphrase → 256-bit container key
//!
//! There is no salt, so the same passphrase always opens the same containers.
//! Both schedules are plain SHA-256 stretching and are cheap to brute-force
//! compared to a memory-hard KDF.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use roe_core::config::KeySchedule;

use crate::KEY_SIZE;

/// Number of stretching rounds applied after the initial hash.
pub const STRETCH_ROUNDS: usize = 256;

/// A 256-bit AES key derived from a passphrase.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct Key {
    bytes: [u8; KEY_SIZE],
}

impl Key {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key").field("bytes", &"[REDACTED]").finish()
    }
}

/// Derive the container key from a passphrase.
pub fn derive_key(passphrase: &SecretString, schedule: KeySchedule) -> Key {
    derive_key_from_bytes(passphrase.expose_secret().as_bytes(), schedule)
}

/// Derive the container key from raw passphrase bytes.
///
/// An empty passphrase is accepted here; interactive callers reject it earlier.
pub fn derive_key_from_bytes(passphrase: &[u8], schedule: KeySchedule) -> Key {
    let bytes = match schedule {
        KeySchedule::Rehash => rehash(passphrase),
        KeySchedule::Running => running(passphrase),
    };
    Key::from_bytes(bytes)
}

fn rehash(passphrase: &[u8]) -> [u8; KEY_SIZE] {
    let mut digest: [u8; KEY_SIZE] = Sha256::digest(passphrase).into();
    for _ in 0..STRETCH_ROUNDS {
        digest = Sha256::digest(digest).into();
    }
    digest
}

// The hasher is never reset: each round appends the digest of everything fed so far.
fn running(passphrase: &[u8]) -> [u8; KEY_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(passphrase);
    for _ in 0..STRETCH_ROUNDS {
        let intermediate = hasher.clone().finalize();
        hasher.update(intermediate);
    }
    hasher.finalize().into()
}
