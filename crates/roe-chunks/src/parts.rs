//! Part-set discovery for split containers
//!
//! Given any one part of a split file, find its siblings in the same
//! directory, check that the set is complete, and order it by part index.

use std::path::{Path, PathBuf};

use tracing::debug;

use roe_core::{PartName, RoeError, RoeResult};

use crate::naming::parse_split_name;

/// Paths of every part of the split file `any_part` belongs to, ordered by index.
///
/// Fails with `NotAPart` if `any_part` is not a split name, `IncompleteParts`
/// if the directory holds fewer or more same-base parts than the declared
/// count, and `DuplicatePart` if two entries claim the same index.
pub fn discover_and_order_parts(any_part: &Path) -> RoeResult<Vec<PathBuf>> {
    let target = parse_split_name(any_part)?;
    let dir = match any_part.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut siblings = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| RoeError::io(dir, e))? {
        let entry = entry.map_err(|e| RoeError::io(dir, e))?;
        let path = entry.path();
        match parse_split_name(&path) {
            Ok(part) if part.base == target.base => {
                if !path.is_file() {
                    debug!(path = %path.display(), "skip: part name is not a regular file");
                    continue;
                }
                siblings.push((part, path));
            }
            _ => {}
        }
    }

    debug!(
        base = %target.base,
        expected = target.count,
        found = siblings.len(),
        "discovered parts"
    );
    order_parts(&target, siblings)
}

/// Scatter `siblings` into slots by their declared index.
fn order_parts(target: &PartName, siblings: Vec<(PartName, PathBuf)>) -> RoeResult<Vec<PathBuf>> {
    if siblings.len() != target.count {
        return Err(RoeError::IncompleteParts {
            base: target.base.clone(),
            expected: target.count,
            found: siblings.len(),
        });
    }

    let agreeing = siblings.iter().filter(|(p, _)| p.count == target.count).count();
    if agreeing != target.count {
        return Err(RoeError::IncompleteParts {
            base: target.base.clone(),
            expected: target.count,
            found: agreeing,
        });
    }

    let mut slots: Vec<Option<PathBuf>> = vec![None; target.count];
    for (part, path) in siblings {
        let slot = &mut slots[part.index];
        if slot.is_some() {
            return Err(RoeError::DuplicatePart {
                base: target.base.clone(),
                index: part.index,
            });
        }
        *slot = Some(path);
    }

    // count distinct, in-range indices filled exactly `count` slots
    Ok(slots.into_iter().flatten().collect())
}
