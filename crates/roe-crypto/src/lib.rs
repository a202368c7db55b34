//! roe-crypto: passphrase keys, bitmap containers, and the AES-256-CBC codec
//!
//! Container file:
//! ```text
//! [54 bytes: bitmap header][16 bytes: IV][16 bytes: encrypted length block]
//! [ciphertext, 16-byte blocks][32 bytes: SHA-256 of cleartext][random filler]
//! ```
//!
//! Randomness is always passed in by the caller (`rand::thread_rng()` in
//! production, a seeded `StdRng` in tests).

pub mod bmp;
pub mod codec;
mod io;
pub mod kdf;

pub use bmp::{header_for, ContainerHeader, HEADER_SIZE};
pub use codec::{decrypt, encrypt, encrypted_size, EncryptSummary};
pub use kdf::{derive_key, derive_key_from_bytes, Key};

/// Size of the AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// AES block size; also the streaming granularity of the codec
pub const BLOCK_SIZE: usize = 16;

/// Size of the CBC initialization vector
pub const IV_SIZE: usize = 16;

/// Size of the SHA-256 cleartext checksum
pub const CHECKSUM_SIZE: usize = 32;
