//! Page and frame identifiers.

use std::fmt;

/// Identifies a page on disk.
///
/// Pages never hold references to each other in memory; a tree node names
/// its children and siblings by `PageId` and every traversal re-pins by id.
///
/// # Example
/// ```
/// use bplusdb::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert_eq!(PageId::from_le_bytes(page_id.to_le_bytes()), page_id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// Invalid/sentinel page ID.
    ///
    /// Stored wherever a link is absent: an empty tree's root, the ends of
    /// the leaf sibling chain.
    pub const INVALID: PageId = PageId(u32::MAX);

    /// Encoded size on a page.
    pub const SIZE: usize = 4;

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    #[inline]
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        PageId(u32::from_le_bytes(bytes))
    }

    /// Read a page id stored at `offset` in `data`.
    #[inline]
    pub fn read_at(data: &[u8], offset: usize) -> Self {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&data[offset..offset + Self::SIZE]);
        Self::from_le_bytes(raw)
    }

    /// Write this page id at `offset` in `data`.
    #[inline]
    pub fn write_at(self, data: &mut [u8], offset: usize) {
        data[offset..offset + Self::SIZE].copy_from_slice(&self.to_le_bytes());
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}

/// Identifies a frame in the buffer pool.
///
/// A plain index into the pool's frame vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub usize);

impl FrameId {
    #[inline]
    pub fn new(id: usize) -> Self {
        FrameId(id)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_invalid() {
        assert!(!PageId::INVALID.is_valid());
        assert_eq!(PageId::INVALID.0, u32::MAX);
        assert_eq!(PageId::default(), PageId::INVALID);
    }

    #[test]
    fn test_page_id_read_write_at() {
        let mut buf = [0u8; 16];
        PageId::new(0x0A0B0C0D).write_at(&mut buf, 6);
        assert_eq!(&buf[6..10], &[0x0D, 0x0C, 0x0B, 0x0A]);
        assert_eq!(PageId::read_at(&buf, 6), PageId::new(0x0A0B0C0D));

        PageId::INVALID.write_at(&mut buf, 0);
        assert!(!PageId::read_at(&buf, 0).is_valid());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", PageId::new(42)), "Page(42)");
        assert_eq!(format!("{}", PageId::INVALID), "Page(INVALID)");
        assert_eq!(format!("{}", FrameId::new(3)), "Frame(3)");
    }
}
