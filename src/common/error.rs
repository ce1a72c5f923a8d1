//! Error types for bplusdb.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of every [`Error`].
///
/// Callers that only need to decide "retry, reject, or give up" match on
/// this instead of the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request conflicts with how the tree was configured.
    Configuration,
    /// A key or entry does not fit the limits recorded for the tree.
    Capacity,
    /// A page holds something the tree never writes there.
    Corruption,
    /// The page cache, disk manager or file directory failed.
    Collaborator,
}

/// All possible errors in bplusdb.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist on disk (or was freed).
    #[error("Page {0} not found")]
    PageNotFound(u32),

    /// Buffer pool has no free frames and cannot evict any pages.
    ///
    /// This happens when all frames are pinned.
    #[error("No free frames available in buffer pool")]
    NoFreeFrames,

    /// A page that must be unpinned is still pinned.
    #[error("Page {0} is still pinned")]
    PagePinned(u32),

    /// Stored checksum does not match the page contents.
    #[error("Page {0} checksum mismatch")]
    ChecksumMismatch(u32),

    /// No file-directory entry with this name.
    #[error("File entry {0:?} not found")]
    FileNotFound(String),

    /// A file-directory entry with this name already exists.
    #[error("File entry {0:?} already exists")]
    FileExists(String),

    /// The file directory page has no free slot.
    #[error("File directory is full")]
    DirectoryFull,

    /// File name is empty or too long for a directory slot.
    #[error("Invalid file name {0:?}")]
    InvalidFileName(String),

    /// Key type of the call does not match the tree's key type.
    #[error("Key type mismatch: tree stores {expected} keys, got {found}")]
    KeyTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Delete requested on a tree whose delete mode is not implemented.
    #[error("Unsupported delete mode: {0}")]
    UnsupportedDeleteMode(&'static str),

    /// Tree configuration rejected at creation time.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Encoded key is longer than the tree's maximum key size.
    #[error("Key too long: {size} bytes (max {max})")]
    KeyTooLong { size: usize, max: usize },

    /// Structural corruption detected on a page.
    #[error("Corrupted page {page_id}: {reason}")]
    Corrupted { page_id: u32, reason: String },

    /// Operation attempted on a closed tree.
    #[error("B+ tree {0:?} is closed")]
    Closed(String),
}

impl Error {
    /// Shorthand for a [`Error::Corrupted`] error.
    pub fn corrupted(page_id: u32, reason: impl Into<String>) -> Self {
        Error::Corrupted {
            page_id,
            reason: reason.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::KeyTypeMismatch { .. }
            | Error::UnsupportedDeleteMode(_)
            | Error::InvalidConfig(_)
            | Error::Closed(_) => ErrorKind::Configuration,
            Error::KeyTooLong { .. } => ErrorKind::Capacity,
            Error::Corrupted { .. } | Error::ChecksumMismatch(_) => ErrorKind::Corruption,
            Error::Io(_)
            | Error::PageNotFound(_)
            | Error::NoFreeFrames
            | Error::PagePinned(_)
            | Error::FileNotFound(_)
            | Error::FileExists(_)
            | Error::DirectoryFull
            | Error::InvalidFileName(_) => ErrorKind::Collaborator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageNotFound(42);
        assert_eq!(format!("{}", err), "Page 42 not found");

        let err = Error::KeyTooLong { size: 12, max: 8 };
        assert_eq!(format!("{}", err), "Key too long: 12 bytes (max 8)");

        let err = Error::corrupted(7, "unexpected page type Free");
        assert_eq!(
            format!("{}", err),
            "Corrupted page 7: unexpected page type Free"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Collaborator);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::UnsupportedDeleteMode("full").kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            Error::KeyTypeMismatch {
                expected: "integer",
                found: "string"
            }
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(Error::KeyTooLong { size: 9, max: 4 }.kind(), ErrorKind::Capacity);
        assert_eq!(Error::ChecksumMismatch(3).kind(), ErrorKind::Corruption);
        assert_eq!(Error::NoFreeFrames.kind(), ErrorKind::Collaborator);
    }
}
