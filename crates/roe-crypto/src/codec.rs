//! Streaming AES-256-CBC container codec
//!
//! Container body (pixel-data region, after the 54-byte bitmap header):
//! ```text
//! [16 bytes: IV][16 bytes: E(clear_size u32 LE || 12 random bytes)]
//! [E(cleartext, last block tail-filled with random bytes)]
//! [32 bytes: SHA-256 of the cleartext][random filler up to the pixel-data size]
//! ```
//!
//! The checksum covers only the real cleartext bytes. It is not keyed, so it
//! detects corruption and wrong passwords but not a deliberate rewrite of both
//! ciphertext and checksum.

use std::io::{Read, Write};

use aes::Aes256;
use cbc::cipher::{generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use roe_core::{RoeError, RoeResult};

use crate::bmp::{header_for, ContainerHeader};
use crate::io::{read_exact_or_truncated, read_full};
use crate::kdf::Key;
use crate::{BLOCK_SIZE, CHECKSUM_SIZE, IV_SIZE};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const FILLER_CHUNK: usize = 64 * 1024;

/// Outcome of writing one container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptSummary {
    /// Cleartext bytes consumed from the source
    pub clear_size: u64,
    /// IV + length block + ciphertext + checksum
    pub payload_size: u64,
    /// Total bytes written, header included
    pub container_size: u64,
}

/// Encrypted size used to pick the image geometry.
///
/// A cleartext length that is already a multiple of 16 still accounts one
/// padding block; the random filler absorbs the difference.
pub fn encrypted_size(clear_size: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    (IV_SIZE + BLOCK_SIZE + CHECKSUM_SIZE) as u64 + clear_size + (block - clear_size % block)
}

/// Bytes actually written before the trailing filler.
pub fn payload_size(clear_size: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    (IV_SIZE + BLOCK_SIZE + CHECKSUM_SIZE) as u64 + clear_size.div_ceil(block) * block
}

/// Encrypt exactly `clear_size` bytes of `src` into a complete container on `dst`.
///
/// `rng` supplies the IV, the length-block filler, the last-block tail and
/// the trailing pixel filler. `src` ending early is a `Truncated` error; bytes
/// past `clear_size` are not read.
pub fn encrypt<R, W, G>(
    src: R,
    mut dst: W,
    key: &Key,
    clear_size: u64,
    rng: &mut G,
) -> RoeResult<EncryptSummary>
where
    R: Read,
    W: Write,
    G: RngCore + CryptoRng,
{
    let length = u32::try_from(clear_size).map_err(|_| RoeError::PayloadTooLarge(clear_size))?;
    let (header, pixel_data_size) = header_for(encrypted_size(clear_size))?;
    header.write_to(&mut dst)?;

    let mut cipher = write_iv(&mut dst, key, rng)?;
    write_length_block(&mut dst, &mut cipher, length, rng)?;
    let checksum = encrypt_body(src.take(clear_size), &mut dst, &mut cipher, clear_size, rng)?;
    dst.write_all(&checksum)?;

    let payload = payload_size(clear_size);
    write_filler(&mut dst, pixel_data_size - payload, rng)?;
    dst.flush()?;

    Ok(EncryptSummary {
        clear_size,
        payload_size: payload,
        container_size: u64::from(header.file_size),
    })
}

/// Decrypt one container from `src`, streaming the cleartext into `dst`.
///
/// Returns the number of cleartext bytes written. On `Integrity` the bytes
/// already written to `dst` must be discarded by the caller.
pub fn decrypt<R, W>(mut src: R, mut dst: W, key: &Key) -> RoeResult<u64>
where
    R: Read,
    W: Write,
{
    ContainerHeader::read_from(&mut src)?;
    let mut cipher = read_iv(&mut src, key)?;
    let clear_size = read_length_block(&mut src, &mut cipher)?;
    let checksum = decrypt_body(&mut src, &mut dst, &mut cipher, clear_size)?;
    verify_checksum(&mut src, &checksum)?;
    dst.flush()?;
    Ok(clear_size)
}

fn write_iv<G: RngCore + CryptoRng>(
    dst: &mut impl Write,
    key: &Key,
    rng: &mut G,
) -> RoeResult<Aes256CbcEnc> {
    let mut iv = [0u8; IV_SIZE];
    rng.fill_bytes(&mut iv);
    dst.write_all(&iv)?;
    Ok(Aes256CbcEnc::new(key.as_bytes().into(), &iv.into()))
}

fn write_length_block<G: RngCore + CryptoRng>(
    dst: &mut impl Write,
    cipher: &mut Aes256CbcEnc,
    length: u32,
    rng: &mut G,
) -> RoeResult<()> {
    let mut block = [0u8; BLOCK_SIZE];
    block[..4].copy_from_slice(&length.to_le_bytes());
    rng.fill_bytes(&mut block[4..]);
    cipher.encrypt_block_mut(GenericArray::from_mut_slice(&mut block));
    dst.write_all(&block)?;
    Ok(())
}

fn encrypt_body<G: RngCore + CryptoRng>(
    mut src: impl Read,
    dst: &mut impl Write,
    cipher: &mut Aes256CbcEnc,
    clear_size: u64,
    rng: &mut G,
) -> RoeResult<[u8; CHECKSUM_SIZE]> {
    let mut hasher = Sha256::new();
    let mut block = [0u8; BLOCK_SIZE];
    let mut consumed = 0u64;

    loop {
        let n = read_full(&mut src, &mut block)?;
        if n == 0 {
            break;
        }
        consumed += n as u64;
        hasher.update(&block[..n]);

        let last = n < BLOCK_SIZE;
        if last {
            if consumed != clear_size {
                break;
            }
            rng.fill_bytes(&mut block[n..]);
        }
        cipher.encrypt_block_mut(GenericArray::from_mut_slice(&mut block));
        dst.write_all(&block)?;
        if last {
            break;
        }
    }

    if consumed != clear_size {
        return Err(RoeError::Truncated {
            context: "cleartext source",
            expected: clear_size,
            found: consumed,
        });
    }
    Ok(hasher.finalize().into())
}

fn write_filler<G: RngCore + CryptoRng>(
    dst: &mut impl Write,
    mut remaining: u64,
    rng: &mut G,
) -> RoeResult<()> {
    let mut buf = vec![0u8; FILLER_CHUNK.min(remaining as usize)];
    while remaining > 0 {
        let n = remaining.min(buf.len() as u64) as usize;
        rng.fill_bytes(&mut buf[..n]);
        dst.write_all(&buf[..n])?;
        remaining -= n as u64;
    }
    Ok(())
}

fn read_iv(src: &mut impl Read, key: &Key) -> RoeResult<Aes256CbcDec> {
    let mut iv = [0u8; IV_SIZE];
    read_exact_or_truncated(src, &mut iv, "IV")?;
    Ok(Aes256CbcDec::new(key.as_bytes().into(), &iv.into()))
}

fn read_length_block(src: &mut impl Read, cipher: &mut Aes256CbcDec) -> RoeResult<u64> {
    let mut block = [0u8; BLOCK_SIZE];
    read_exact_or_truncated(src, &mut block, "length block")?;
    cipher.decrypt_block_mut(GenericArray::from_mut_slice(&mut block));
    let length = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
    Ok(u64::from(length))
}

fn decrypt_body(
    src: &mut impl Read,
    dst: &mut impl Write,
    cipher: &mut Aes256CbcDec,
    clear_size: u64,
) -> RoeResult<[u8; CHECKSUM_SIZE]> {
    let mut hasher = Sha256::new();
    let mut block = [0u8; BLOCK_SIZE];
    let mut remaining = clear_size;

    while remaining > 0 {
        read_exact_or_truncated(src, &mut block, "ciphertext block")?;
        cipher.decrypt_block_mut(GenericArray::from_mut_slice(&mut block));

        let real = remaining.min(BLOCK_SIZE as u64) as usize;
        hasher.update(&block[..real]);
        dst.write_all(&block[..real])?;
        remaining -= real as u64;
    }

    Ok(hasher.finalize().into())
}

fn verify_checksum(src: &mut impl Read, computed: &[u8; CHECKSUM_SIZE]) -> RoeResult<()> {
    let mut stored = [0u8; CHECKSUM_SIZE];
    read_exact_or_truncated(src, &mut stored, "checksum")?;
    if &stored != computed {
        return Err(RoeError::Integrity);
    }
    Ok(())
}
