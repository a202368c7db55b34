//! Single-file encryption and decryption
//!
//! - `encrypt_file`: stat → plan ranges → one container per range
//! - `decrypt_file`: plain container, or every part of a split file joined
//! - `decrypt_joined`: decrypt an ordered part list into one destination

use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use rand::{CryptoRng, RngCore};
use tracing::{debug, info, warn};

use roe_chunks::{
    container_file_name, discover_and_order_parts, parse_container_name, parse_split_name,
    plan_ranges,
};
use roe_core::{ByteRange, RoeError, RoeResult};
use roe_crypto::Key;

/// Result of encrypting a single source file
#[derive(Debug)]
pub struct EncryptResult {
    pub source: PathBuf,
    /// Containers written, in part order; empty for an empty source
    pub containers: Vec<PathBuf>,
    /// Cleartext bytes encrypted
    pub bytes: u64,
}

/// Result of reconstructing a single original file
#[derive(Debug)]
pub struct DecryptResult {
    pub destination: PathBuf,
    /// Containers read, in part order
    pub parts: Vec<PathBuf>,
    /// Cleartext bytes written
    pub bytes: u64,
}

/// Encrypt `src` into `outdir`, one container per `max_chunk_size` slice.
///
/// A single slice is written as `name.bmp`, several as `name.K-N.bmp`. An
/// empty source writes nothing. If a slice fails, its partial container is
/// removed; containers of earlier slices are kept.
pub fn encrypt_file<G: RngCore + CryptoRng>(
    src: &Path,
    outdir: &Path,
    key: &Key,
    max_chunk_size: NonZeroU64,
    rng: &mut G,
) -> RoeResult<EncryptResult> {
    let size = std::fs::metadata(src)
        .map_err(|e| RoeError::io(src, e))?
        .len();
    let ranges = plan_ranges(size, max_chunk_size);

    let mut result = EncryptResult {
        source: src.to_path_buf(),
        containers: Vec::with_capacity(ranges.len()),
        bytes: 0,
    };
    if ranges.is_empty() {
        debug!(path = %src.display(), "skip: empty file");
        return Ok(result);
    }

    let base = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| RoeError::NotAContainer(src.display().to_string()))?;
    std::fs::create_dir_all(outdir).map_err(|e| RoeError::io(outdir, e))?;
    let source = File::open(src).map_err(|e| RoeError::io(src, e))?;

    for range in &ranges {
        let dest = outdir.join(container_file_name(&base, range.index, ranges.len()));
        info!(
            source = %src.display(),
            dest = %dest.display(),
            bytes = range.length,
            "encrypt"
        );
        encrypt_range(&source, range, &dest, key, rng).map_err(|e| {
            remove_partial(&dest);
            RoeError::encrypting(src, e)
        })?;
        result.bytes += range.length;
        result.containers.push(dest);
    }

    Ok(result)
}

fn encrypt_range<G: RngCore + CryptoRng>(
    mut source: &File,
    range: &ByteRange,
    dest: &Path,
    key: &Key,
    rng: &mut G,
) -> RoeResult<()> {
    source.seek(SeekFrom::Start(range.offset))?;
    let out = File::create(dest).map_err(|e| RoeError::io(dest, e))?;
    roe_crypto::encrypt(
        BufReader::new(source),
        BufWriter::new(out),
        key,
        range.length,
        rng,
    )?;
    Ok(())
}

/// Decrypt the container `src` into `outdir`.
///
/// A split name (`name.K-N.bmp`) pulls in all sibling parts and writes the
/// joined cleartext to `outdir/name`; a plain `name.bmp` writes `outdir/name`.
pub fn decrypt_file(src: &Path, outdir: &Path, key: &Key) -> RoeResult<DecryptResult> {
    let name = parse_container_name(src)?;
    let parts = if parse_split_name(src).is_ok() {
        discover_and_order_parts(src)?
    } else {
        vec![src.to_path_buf()]
    };

    std::fs::create_dir_all(outdir).map_err(|e| RoeError::io(outdir, e))?;
    let destination = outdir.join(&name.base);
    let bytes = decrypt_joined(&parts, &destination, key)?;

    Ok(DecryptResult {
        destination,
        parts,
        bytes,
    })
}

/// Decrypt `ordered` containers one after another into the single file `dest`.
///
/// Each part's checksum is verified on its own. On any failure `dest` is
/// removed. Read and integrity errors name the failing part; write errors
/// name `dest`.
pub fn decrypt_joined(ordered: &[PathBuf], dest: &Path, key: &Key) -> RoeResult<u64> {
    let file = File::create(dest).map_err(|e| RoeError::io(dest, e))?;
    let mut out = BufWriter::new(file);
    let mut total = 0u64;

    for path in ordered {
        info!(source = %path.display(), dest = %dest.display(), "decrypt");
        match decrypt_part(path, dest, &mut out, key) {
            Ok(n) => total += n,
            Err(e) => {
                drop(out);
                remove_partial(dest);
                return Err(e);
            }
        }
    }

    if let Err(e) = out.flush() {
        drop(out);
        remove_partial(dest);
        return Err(RoeError::io(dest, e));
    }
    Ok(total)
}

fn decrypt_part<W: Write>(path: &Path, dest: &Path, out: &mut W, key: &Key) -> RoeResult<u64> {
    let src = File::open(path).map_err(|e| RoeError::io(path, e))?;
    let mut sink = DestWriter {
        inner: out,
        failed: false,
    };
    match roe_crypto::decrypt(BufReader::new(src), &mut sink, key) {
        Ok(n) => Ok(n),
        Err(RoeError::Stream(e)) if sink.failed => Err(RoeError::io(dest, e)),
        Err(e) => Err(RoeError::decrypting(path, e)),
    }
}

/// Records whether an I/O error came from the destination side.
struct DestWriter<'a, W> {
    inner: &'a mut W,
    failed: bool,
}

impl<W: Write> Write for DestWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf).inspect_err(|_| self.failed = true)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush().inspect_err(|_| self.failed = true)
    }
}

fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => warn!(path = %path.display(), "removed partial output"),
        Err(e) => warn!(path = %path.display(), "failed to remove partial output: {e}"),
    }
}
