//! Disk Manager - low-level file I/O for database pages.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing pages (with checksums)
//! - Allocating and deallocating pages
//! - Formatting page 0 as the file directory

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, trace};

use crate::common::config::{DIRECTORY_PAGE_ID, MAX_PAGES, PAGE_SIZE};
use crate::common::{Error, PageId, Result};
use crate::storage::directory::DirectoryPage;
use crate::storage::page::{Page, PageType};

/// Manages disk I/O for a single database file.
///
/// # File Layout
/// ```text
/// ┌───────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0    │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ directory │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └───────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Freed pages stay in the file tagged [`PageType::Free`] and are handed
/// out again by [`allocate_page`](Self::allocate_page), lowest id first.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**. The `BufferPoolManager` serializes
/// access to it.
///
/// # Durability
/// All writes are followed by `fsync()`.
pub struct DiskManager {
    file: File,
    /// Number of pages in the file.
    page_count: u32,
    /// Deallocated pages available for reuse.
    free_pages: BTreeSet<PageId>,
}

impl DiskManager {
    /// Create a new database file with an empty directory in page 0.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        let mut dm = Self {
            file,
            page_count: 0,
            free_pages: BTreeSet::new(),
        };

        let directory_id = dm.allocate_page()?;
        debug_assert_eq!(directory_id, DIRECTORY_PAGE_ID);

        let mut page = Page::new();
        DirectoryPage::format(&mut page);
        dm.write_page(directory_id, &page)?;

        debug!(pages = dm.page_count, "created database file");
        Ok(dm)
    }

    /// Open an existing database file.
    ///
    /// Rebuilds the free-page list by scanning every page's type tag.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist, cannot be opened, or
    /// page 0 is not a directory page.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let file_size = file.metadata()?.len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        let mut dm = Self {
            file,
            page_count,
            free_pages: BTreeSet::new(),
        };

        if page_count == 0 {
            return Err(Error::corrupted(DIRECTORY_PAGE_ID.0, "database file has no pages"));
        }
        if !DirectoryPage::is_directory(&dm.read_page(DIRECTORY_PAGE_ID)?) {
            return Err(Error::corrupted(DIRECTORY_PAGE_ID.0, "page 0 is not a directory page"));
        }

        for pid in 1..page_count {
            let page_id = PageId::new(pid);
            if dm.read_page(page_id)?.page_type() == PageType::Free {
                dm.free_pages.insert(page_id);
            }
        }

        debug!(
            pages = dm.page_count,
            free = dm.free_pages.len(),
            "opened database file"
        );
        Ok(dm)
    }

    /// Open an existing database file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Read a page from disk.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page doesn't exist
    /// - `Error::ChecksumMismatch` if a formatted page fails verification
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        self.check_range(page_id)?;

        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;
        let mut page = Page::new();
        self.file.read_exact(page.as_mut_slice())?;

        if page.page_type().is_checksummed() && !page.verify_checksum() {
            return Err(Error::ChecksumMismatch(page_id.0));
        }

        Ok(page)
    }

    /// Write a page to disk.
    ///
    /// Formatted pages are written with a freshly computed checksum; the
    /// caller's copy is left untouched.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page hasn't been allocated.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        self.check_range(page_id)?;

        let mut out = Page::new();
        out.as_mut_slice().copy_from_slice(page.as_slice());
        if out.page_type().is_checksummed() {
            out.update_checksum();
        }

        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;
        self.file.write_all(out.as_slice())?;
        self.file.sync_all()?;

        Ok(())
    }

    /// Allocate a page, reusing a freed one when possible.
    ///
    /// The returned page is zeroed on disk.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        if let Some(page_id) = self.free_pages.pop_first() {
            self.write_zeros(page_id)?;
            trace!(page_id = %page_id, "reused free page");
            return Ok(page_id);
        }

        if u64::from(self.page_count) >= MAX_PAGES {
            return Err(Error::InvalidConfig("database file is at maximum size".into()));
        }

        let page_id = PageId::new(self.page_count);
        self.write_zeros(page_id)?;
        self.page_count += 1;
        Ok(page_id)
    }

    /// Release a page's storage for reuse.
    ///
    /// # Errors
    /// - `Error::PageNotFound` for page 0, an unallocated page, or a page
    ///   that is already free
    pub fn deallocate_page(&mut self, page_id: PageId) -> Result<()> {
        if page_id == DIRECTORY_PAGE_ID || self.free_pages.contains(&page_id) {
            return Err(Error::PageNotFound(page_id.0));
        }
        self.check_range(page_id)?;

        let mut page = Page::new();
        page.format(PageType::Free);
        self.write_page(page_id, &page)?;
        self.free_pages.insert(page_id);

        trace!(page_id = %page_id, "deallocated page");
        Ok(())
    }

    /// Whether `page_id` is allocated (in range and not on the free list).
    pub fn is_allocated(&self, page_id: PageId) -> bool {
        page_id.0 < self.page_count && !self.free_pages.contains(&page_id)
    }

    /// Get the number of pages in the database file, free ones included.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Number of deallocated pages awaiting reuse.
    #[inline]
    pub fn free_page_count(&self) -> usize {
        self.free_pages.len()
    }

    /// Get the total size of the database file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }

    fn check_range(&self, page_id: PageId) -> Result<()> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }
        Ok(())
    }

    fn write_zeros(&mut self, page_id: PageId) -> Result<()> {
        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;
        self.file.write_all(&[0u8; PAGE_SIZE])?;
        self.file.sync_all()?;
        Ok(())
    }

    #[inline]
    fn offset(page_id: PageId) -> u64 {
        (page_id.0 as u64) * (PAGE_SIZE as u64)
    }
}
