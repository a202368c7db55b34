use std::fmt;

/// File extension of every container, compared case-insensitively.
pub const CONTAINER_EXT: &str = "bmp";

/// One contiguous slice of an original file, encrypted as one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Byte offset within the source file
    pub offset: u64,
    /// Slice length in bytes
    pub length: u64,
    /// Zero-based position of this slice
    pub index: usize,
}

/// "Part `index` of `count` of an original named `base`", as carried by a
/// container filename.
///
/// Rendered as `base.bmp` when `count == 1`, otherwise as
/// `base.{index+1}-{count}.bmp`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartName {
    pub base: String,
    /// Zero-based; the textual form is one-based
    pub index: usize,
    pub count: usize,
}

impl PartName {
    pub fn new(base: impl Into<String>, index: usize, count: usize) -> Self {
        Self {
            base: base.into(),
            index,
            count,
        }
    }

    pub fn is_split(&self) -> bool {
        self.count > 1
    }
}

impl fmt::Display for PartName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 1 {
            write!(f, "{}.{CONTAINER_EXT}", self.base)
        } else {
            write!(
                f,
                "{}.{}-{}.{CONTAINER_EXT}",
                self.base,
                self.index + 1,
                self.count
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_part_renders_plain_extension() {
        assert_eq!(PartName::new("jazz.mp3", 0, 1).to_string(), "jazz.mp3.bmp");
    }

    #[test]
    fn split_part_renders_one_based_index() {
        assert_eq!(
            PartName::new("foo.mp4", 1, 3).to_string(),
            "foo.mp4.2-3.bmp"
        );
        assert!(PartName::new("foo.mp4", 1, 3).is_split());
    }
}
