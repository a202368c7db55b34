//! Container filenames
//!
//! `name.bmp` holds a whole file; `name.K-N.bmp` holds part `K` of `N`
//! (one-based in the filename, zero-based in [`PartName::index`]). The
//! `.bmp` extension is matched case-insensitively.

use std::path::Path;

use roe_core::types::CONTAINER_EXT;
use roe_core::{PartName, RoeError, RoeResult};

/// Filename of the container for part `index` of `count` of `base`.
pub fn container_file_name(base: &str, index: usize, count: usize) -> String {
    PartName::new(base, index, count).to_string()
}

/// True when the final path component ends in `.bmp` (any case).
pub fn has_container_ext(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(CONTAINER_EXT))
}

/// Parse `base.K-N.bmp`; anything else is [`RoeError::NotAPart`].
pub fn parse_split_name(path: &Path) -> RoeResult<PartName> {
    let name = file_name(path).ok_or_else(|| RoeError::NotAPart(path.display().to_string()))?;
    split_components(name).ok_or_else(|| RoeError::NotAPart(name.to_string()))
}

/// Parse any container filename: a split name, or a plain `name.bmp` as the
/// only part of `name`.
pub fn parse_container_name(path: &Path) -> RoeResult<PartName> {
    let name = file_name(path)
        .filter(|_| has_container_ext(path))
        .ok_or_else(|| RoeError::NotAContainer(path.display().to_string()))?;

    Ok(split_components(name).unwrap_or_else(|| PartName::new(strip_ext(name), 0, 1)))
}

/// Name of the cleartext file reconstructed from a container: `name.bmp` → `name`,
/// `name.K-N.bmp` → `name`.
pub fn output_name(path: &Path) -> RoeResult<String> {
    parse_container_name(path).map(|part| part.base)
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

/// `name` minus its trailing `.bmp`; callers check the extension first.
fn strip_ext(name: &str) -> &str {
    &name[..name.len() - CONTAINER_EXT.len() - 1]
}

fn split_components(name: &str) -> Option<PartName> {
    if !has_container_ext(Path::new(name)) {
        return None;
    }
    let (base, numbers) = strip_ext(name).rsplit_once('.')?;
    let (k, n) = numbers.split_once('-')?;
    if base.is_empty() || !all_digits(k) || !all_digits(n) {
        return None;
    }

    let k: usize = k.parse().ok()?;
    let count: usize = n.parse().ok()?;
    if k == 0 || k > count {
        return None;
    }
    Some(PartName::new(base, k - 1, count))
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
