use std::path::PathBuf;

use thiserror::Error;

pub type RoeResult<T> = Result<T, RoeError>;

#[derive(Debug, Error)]
pub enum RoeError {
    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Stream(#[from] std::io::Error),

    /// A short read where a full block or a declared byte count was expected.
    #[error("truncated {context}: expected {expected} bytes, found {found}")]
    Truncated {
        context: &'static str,
        expected: u64,
        found: u64,
    },

    #[error("sha256 checksum mismatch (wrong password or corrupted container)")]
    Integrity,

    #[error("there should be {expected} parts of '{base}', found {found}")]
    IncompleteParts {
        base: String,
        expected: usize,
        found: usize,
    },

    #[error("part {} of '{base}' is present more than once", index + 1)]
    DuplicatePart { base: String, index: usize },

    #[error("'{0}' is not a split container name")]
    NotAPart(String),

    #[error("'{0}' is not a .bmp container")]
    NotAContainer(String),

    #[error("payload of {0} bytes does not fit in a bitmap container")]
    PayloadTooLarge(u64),

    #[error("failed to encrypt '{}'", path.display())]
    Encrypt {
        path: PathBuf,
        #[source]
        source: Box<RoeError>,
    },

    #[error("failed to decrypt '{}'", path.display())]
    Decrypt {
        path: PathBuf,
        #[source]
        source: Box<RoeError>,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl RoeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn encrypting(path: impl Into<PathBuf>, source: RoeError) -> Self {
        Self::Encrypt {
            path: path.into(),
            source: Box::new(source),
        }
    }

    pub fn decrypting(path: impl Into<PathBuf>, source: RoeError) -> Self {
        Self::Decrypt {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// True when the error is, or wraps, a checksum mismatch.
    pub fn is_integrity(&self) -> bool {
        match self {
            Self::Integrity => true,
            Self::Encrypt { source, .. } | Self::Decrypt { source, .. } => source.is_integrity(),
            _ => false,
        }
    }

    /// True when the error is, or wraps, a short read of container data.
    pub fn is_truncated(&self) -> bool {
        match self {
            Self::Truncated { .. } => true,
            Self::Encrypt { source, .. } | Self::Decrypt { source, .. } => source.is_truncated(),
            _ => false,
        }
    }
}
