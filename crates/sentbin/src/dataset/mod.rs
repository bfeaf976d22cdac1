//! # Indexed Binary Dataset
//!
//! An encoded corpus is persisted as two artifacts:
//!
//! - a data blob (``.bin``): every item's elements as fixed-width
//!   little-endian integers, concatenated with no separators,
//! - an index artifact (``.idx``): a self-describing binary header that
//!   recovers item boundaries without scanning the blob.
//!
//! ## Index layout (all fields little-endian)
//!
//! ```text
//! magic            8 bytes   b"SBINIDX\0"
//! version          u64       1
//! dtype code       u64       element type, see [`ElementType`]
//! element size     u64       bytes per element
//! item count       u64
//! element count    u64       sum of item lengths
//! offsets          (item count + 1) x u64   prefix sums of item lengths
//! sizes            item count x u64         per-item lengths
//! ```
//!
//! The reader contract: `get(i)` equals, bit for bit, the `i`-th sequence
//! passed to [`IndexedDatasetBuilder::add_item`].

pub mod builder;
pub mod reader;

pub use builder::IndexedDatasetBuilder;
pub use reader::IndexedDataset;

use anyhow::bail;

/// Magic tag at the head of every index artifact.
pub const INDEX_MAGIC: &[u8; 8] = b"SBINIDX\0";

/// Index artifact format version.
pub const INDEX_VERSION: u64 = 1;

/// Fixed-width element storage types for the data blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 2-byte unsigned elements.
    U16,
    /// 4-byte unsigned elements.
    U32,
    /// 8-byte unsigned elements.
    U64,
}

impl ElementType {
    /// The dtype code persisted in the index artifact.
    pub fn code(self) -> u64 {
        match self {
            ElementType::U16 => 2,
            ElementType::U32 => 3,
            ElementType::U64 => 4,
        }
    }

    /// Bytes per stored element.
    pub fn width(self) -> usize {
        match self {
            ElementType::U16 => 2,
            ElementType::U32 => 4,
            ElementType::U64 => 8,
        }
    }

    /// Resolve a persisted dtype code.
    pub fn from_code(code: u64) -> anyhow::Result<Self> {
        match code {
            2 => Ok(ElementType::U16),
            3 => Ok(ElementType::U32),
            4 => Ok(ElementType::U64),
            _ => bail!("unknown element dtype code: {}", code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_codes() {
        for et in [ElementType::U16, ElementType::U32, ElementType::U64] {
            assert_eq!(ElementType::from_code(et.code()).unwrap(), et);
        }
        assert!(ElementType::from_code(0).is_err());
        assert!(ElementType::from_code(99).is_err());
    }

    #[test]
    fn test_element_widths() {
        assert_eq!(ElementType::U16.width(), 2);
        assert_eq!(ElementType::U32.width(), 4);
        assert_eq!(ElementType::U64.width(), 8);
    }
}
