//! Batch operations over input lists and directory trees
//!
//! Zero-length files are skipped. Every batch stops at the first error.
//! On decrypt, several inputs that rebuild the same original file (the parts
//! `foo.1-3.bmp`, `foo.2-3.bmp`, `foo.3-3.bmp` all rebuild `foo`) trigger one
//! reconstruction, keyed by destination path.

use std::collections::HashSet;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use rand::{CryptoRng, RngCore};
use tracing::debug;
use walkdir::WalkDir;

use roe_chunks::{has_container_ext, output_name};
use roe_core::{RoeError, RoeResult};
use roe_crypto::Key;

use crate::engine::{decrypt_file, encrypt_file};

/// Progress callback type (files_done, files_total, message)
pub type ProgressFn = Box<dyn Fn(u64, u64, &str) + Send + Sync>;

/// Totals for a batch run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Source files encrypted, or original files reconstructed
    pub processed: usize,
    /// Empty, non-container, or already-reconstructed inputs
    pub skipped: usize,
    /// Cleartext bytes processed
    pub bytes: u64,
    /// Containers written or read
    pub containers: usize,
}

/// Encrypt each file of `inputs` into `outdir`.
pub fn encrypt_inputs<G: RngCore + CryptoRng>(
    inputs: &[PathBuf],
    outdir: &Path,
    key: &Key,
    max_chunk_size: NonZeroU64,
    rng: &mut G,
    progress: Option<&ProgressFn>,
) -> RoeResult<BatchSummary> {
    let jobs: Vec<_> = inputs.iter().map(|p| (p.clone(), outdir.to_path_buf())).collect();
    encrypt_jobs(&jobs, key, max_chunk_size, rng, progress)
}

/// Encrypt every file under `src_dir`, mirroring its relative layout under `outdir`.
pub fn encrypt_tree<G: RngCore + CryptoRng>(
    src_dir: &Path,
    outdir: &Path,
    key: &Key,
    max_chunk_size: NonZeroU64,
    rng: &mut G,
    progress: Option<&ProgressFn>,
) -> RoeResult<BatchSummary> {
    let jobs = mirrored(src_dir, outdir, collect_files(src_dir)?);
    encrypt_jobs(&jobs, key, max_chunk_size, rng, progress)
}

/// Decrypt each container of `inputs` into `outdir`.
///
/// An input without a `.bmp` extension fails the batch.
pub fn decrypt_inputs(
    inputs: &[PathBuf],
    outdir: &Path,
    key: &Key,
    progress: Option<&ProgressFn>,
) -> RoeResult<BatchSummary> {
    let jobs: Vec<_> = inputs.iter().map(|p| (p.clone(), outdir.to_path_buf())).collect();
    decrypt_jobs(&jobs, key, progress)
}

/// Decrypt every container under `src_dir`, mirroring its relative layout
/// under `outdir`. Files without a `.bmp` extension are skipped.
pub fn decrypt_tree(
    src_dir: &Path,
    outdir: &Path,
    key: &Key,
    progress: Option<&ProgressFn>,
) -> RoeResult<BatchSummary> {
    let files: Vec<PathBuf> = collect_files(src_dir)?
        .into_iter()
        .filter(|p| {
            let keep = has_container_ext(p);
            if !keep {
                debug!(path = %p.display(), "skip: not a container");
            }
            keep
        })
        .collect();
    let jobs = mirrored(src_dir, outdir, files);
    decrypt_jobs(&jobs, key, progress)
}

/// Collect all regular files under `root` recursively, in sorted order.
pub fn collect_files(root: &Path) -> RoeResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            RoeError::io(path, e.into())
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Pair each file with `outdir` joined to the file's parent relative to `root`.
fn mirrored(root: &Path, outdir: &Path, files: Vec<PathBuf>) -> Vec<(PathBuf, PathBuf)> {
    files
        .into_iter()
        .map(|path| {
            let rel = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .unwrap_or(Path::new(""));
            let target = outdir.join(rel);
            (path, target)
        })
        .collect()
}

fn encrypt_jobs<G: RngCore + CryptoRng>(
    jobs: &[(PathBuf, PathBuf)],
    key: &Key,
    max_chunk_size: NonZeroU64,
    rng: &mut G,
    progress: Option<&ProgressFn>,
) -> RoeResult<BatchSummary> {
    let mut summary = BatchSummary::default();
    let total = jobs.len() as u64;

    for (i, (src, target)) in jobs.iter().enumerate() {
        report(progress, i as u64, total, src);
        if is_empty(src)? {
            debug!(path = %src.display(), "skip: empty file");
            summary.skipped += 1;
            continue;
        }

        let result = encrypt_file(src, target, key, max_chunk_size, rng)?;
        summary.processed += 1;
        summary.bytes += result.bytes;
        summary.containers += result.containers.len();
    }

    if let Some(cb) = progress {
        cb(total, total, "done");
    }
    Ok(summary)
}

fn decrypt_jobs(
    jobs: &[(PathBuf, PathBuf)],
    key: &Key,
    progress: Option<&ProgressFn>,
) -> RoeResult<BatchSummary> {
    let mut summary = BatchSummary::default();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let total = jobs.len() as u64;

    for (i, (src, target)) in jobs.iter().enumerate() {
        report(progress, i as u64, total, src);
        if is_empty(src)? {
            debug!(path = %src.display(), "skip: empty file");
            summary.skipped += 1;
            continue;
        }

        let dest = target.join(output_name(src)?);
        if !seen.insert(dest.clone()) {
            debug!(path = %src.display(), dest = %dest.display(), "skip: already reconstructed");
            summary.skipped += 1;
            continue;
        }

        let result = decrypt_file(src, target, key)?;
        summary.processed += 1;
        summary.bytes += result.bytes;
        summary.containers += result.parts.len();
    }

    if let Some(cb) = progress {
        cb(total, total, "done");
    }
    Ok(summary)
}

fn is_empty(path: &Path) -> RoeResult<bool> {
    let meta = std::fs::metadata(path).map_err(|e| RoeError::io(path, e))?;
    Ok(meta.len() == 0)
}

fn report(progress: Option<&ProgressFn>, done: u64, total: u64, path: &Path) {
    if let Some(cb) = progress {
        cb(done, total, &format!("[{}/{}] {}", done + 1, total, path.display()));
    }
}
