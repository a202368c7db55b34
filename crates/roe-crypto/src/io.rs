use std::io::{ErrorKind, Read};

use roe_core::{RoeError, RoeResult};

/// Read until `buf` is full or the reader is exhausted; returns the bytes read.
pub(crate) fn read_full(r: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Fill `buf` completely or fail with [`RoeError::Truncated`].
pub(crate) fn read_exact_or_truncated(
    r: &mut impl Read,
    buf: &mut [u8],
    context: &'static str,
) -> RoeResult<()> {
    let n = read_full(r, buf)?;
    if n < buf.len() {
        return Err(RoeError::Truncated {
            context,
            expected: buf.len() as u64,
            found: n as u64,
        });
    }
    Ok(())
}
