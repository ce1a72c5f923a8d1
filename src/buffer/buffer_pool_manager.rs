//! Buffer Pool Manager - the page cache the B+ tree runs on.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between disk and memory
//! - Pin-based reference counting through RAII guards
//! - Dirty page write-back
//! - Page allocation and freeing
//! - The file directory (index name → header page)

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};
use tracing::{trace, warn};

use crate::buffer::replacer::LruReplacer;
use crate::buffer::{Frame, PagePin, PageReadGuard, PageWriteGuard};
use crate::common::config::{DEFAULT_POOL_SIZE, DIRECTORY_PAGE_ID};
use crate::common::{Error, FrameId, PageId, Result};
use crate::storage::{DirectoryPage, DiskManager};

/// Manages a pool of buffer frames for caching disk pages.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                    BufferPoolManager                        │
/// │  ┌──────────────┐  ┌───────────────────────────────────┐   │
/// │  │ page_table   │  │        frames: Vec<Frame>         │   │
/// │  │PageId → Fid  │─▶│  [Frame0] [Frame1] [Frame2] ...   │   │
/// │  └──────────────┘  └───────────────────────────────────┘   │
/// │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
/// │  │  free_list   │  │   replacer   │  │disk_manager  │      │
/// │  │ Vec<FrameId> │  │ LruReplacer  │  │   Mutex      │      │
/// │  └──────────────┘  └──────────────┘  └──────────────┘      │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Pin protocol
/// Every fetch pins the page; the returned guard unpins it on drop. A page
/// is only evictable while its pin count is zero, so leaking a guard leaks
/// a frame. [`pinned_frame_count`](Self::pinned_frame_count) lets callers
/// check that an operation released everything it pinned.
///
/// # Usage
/// ```ignore
/// let dm = DiskManager::create("test.db")?;
/// let bpm = BufferPoolManager::new(10, dm);
///
/// let mut guard = bpm.new_page()?;
/// guard.as_mut_slice()[100] = 0xAB;
/// // guard drops: page marked dirty, unpinned
/// ```
pub struct BufferPoolManager {
    /// Fixed pool of frames allocated at startup.
    frames: Vec<Frame>,

    /// Maps page IDs to frame IDs.
    page_table: RwLock<HashMap<PageId, FrameId>>,

    /// Stack of free frame IDs.
    free_list: Mutex<Vec<FrameId>>,

    /// Eviction policy for selecting victim frames.
    replacer: Mutex<LruReplacer>,

    /// Handles all disk I/O.
    disk_manager: Mutex<DiskManager>,

    pool_size: usize,
}

impl BufferPoolManager {
    /// Create a new buffer pool manager.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize, disk_manager: DiskManager) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        let frames: Vec<Frame> = (0..pool_size).map(|_| Frame::new()).collect();
        let free_list: Vec<FrameId> = (0..pool_size).rev().map(FrameId::new).collect();

        Self {
            frames,
            page_table: RwLock::new(HashMap::new()),
            free_list: Mutex::new(free_list),
            replacer: Mutex::new(LruReplacer::new()),
            disk_manager: Mutex::new(disk_manager),
            pool_size,
        }
    }

    /// Create a pool of [`DEFAULT_POOL_SIZE`] frames.
    pub fn with_default_size(disk_manager: DiskManager) -> Self {
        Self::new(DEFAULT_POOL_SIZE, disk_manager)
    }

    // ========================================================================
    // Public API: Fetch pages
    // ========================================================================

    /// Fetch a page for reading (shared access).
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page doesn't exist on disk
    /// - `Error::NoFreeFrames` if all frames are pinned
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<PageReadGuard<'_>> {
        let frame_id = self.fetch_page_internal(page_id)?;
        let lock = self.frames[frame_id.0].page();

        Ok(PageReadGuard::new(self, frame_id, page_id, lock))
    }

    /// Fetch a page for writing (exclusive access).
    ///
    /// The page is unpinned dirty only if the guard was used to modify it.
    ///
    /// # Errors
    /// Same as [`fetch_page_read`](Self::fetch_page_read).
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<PageWriteGuard<'_>> {
        let frame_id = self.fetch_page_internal(page_id)?;
        let lock = self.frames[frame_id.0].page_mut();

        Ok(PageWriteGuard::new(self, frame_id, page_id, lock))
    }

    /// Pin a page without locking it.
    ///
    /// # Errors
    /// Same as [`fetch_page_read`](Self::fetch_page_read).
    pub fn pin_page(&self, page_id: PageId) -> Result<PagePin<'_>> {
        let frame_id = self.fetch_page_internal(page_id)?;
        Ok(PagePin::new(self, frame_id, page_id))
    }

    // ========================================================================
    // Public API: Create and free pages
    // ========================================================================

    /// Allocate a new page on disk and load it into the buffer pool.
    ///
    /// Returns a write guard over a zeroed page.
    ///
    /// # Errors
    /// - `Error::NoFreeFrames` if all frames are pinned
    /// - I/O errors from disk allocation
    pub fn new_page(&self) -> Result<PageWriteGuard<'_>> {
        let frame_id = self.get_free_frame()?;

        let page_id = match self.disk_manager.lock().allocate_page() {
            Ok(page_id) => page_id,
            Err(e) => {
                self.free_list.lock().push(frame_id);
                return Err(e);
            }
        };

        let frame = &self.frames[frame_id.0];
        frame.page_mut().reset();
        frame.load(page_id);

        self.page_table.write().insert(page_id, frame_id);
        {
            let mut replacer = self.replacer.lock();
            replacer.record_access(frame_id);
            replacer.set_evictable(frame_id, false);
        }

        trace!(page_id = %page_id, frame_id = %frame_id, "new page");
        let lock = frame.page_mut();
        Ok(PageWriteGuard::new(self, frame_id, page_id, lock))
    }

    /// Drop a page from the pool and release its disk storage.
    ///
    /// Any cached contents are discarded without write-back.
    ///
    /// # Errors
    /// - `Error::PagePinned` if the page is still pinned
    /// - `Error::PageNotFound` if the page is not allocated on disk
    pub fn free_page(&self, page_id: PageId) -> Result<()> {
        let mut pt = self.page_table.write();
        let resident = pt.get(&page_id).copied();
        if let Some(frame_id) = resident {
            let frame = &self.frames[frame_id.0];
            if frame.is_pinned() {
                warn!(page_id = %page_id, pins = frame.pin_count(), "refusing to free pinned page");
                return Err(Error::PagePinned(page_id.0));
            }

            pt.remove(&page_id);
            drop(pt);

            frame.reset();
            self.replacer.lock().remove(frame_id);
            self.free_list.lock().push(frame_id);
        } else {
            drop(pt);
        }

        self.disk_manager.lock().deallocate_page(page_id)?;
        trace!(page_id = %page_id, "freed page");
        Ok(())
    }

    // ========================================================================
    // Public API: File directory
    // ========================================================================

    /// Look up the header page registered under `name`.
    pub fn get_file_entry(&self, name: &str) -> Result<Option<PageId>> {
        let guard = self.fetch_directory_read()?;
        Ok(DirectoryPage::lookup(&guard, name))
    }

    /// Register `name` → `page_id` in the directory.
    ///
    /// # Errors
    /// `Error::FileExists`, `Error::InvalidFileName`, `Error::DirectoryFull`.
    pub fn add_file_entry(&self, name: &str, page_id: PageId) -> Result<()> {
        let mut guard = self.fetch_directory_write()?;
        DirectoryPage::insert(&mut guard, name, page_id)
    }

    /// Remove `name` from the directory.
    ///
    /// # Errors
    /// `Error::FileNotFound` if no such entry exists.
    pub fn delete_file_entry(&self, name: &str) -> Result<()> {
        let mut guard = self.fetch_directory_write()?;
        if DirectoryPage::lookup(&guard, name).is_none() {
            return Err(Error::FileNotFound(name.to_string()));
        }
        DirectoryPage::remove(&mut guard, name)
    }

    /// All directory entries.
    pub fn file_entries(&self) -> Result<Vec<(String, PageId)>> {
        let guard = self.fetch_directory_read()?;
        Ok(DirectoryPage::entries(&guard))
    }

    // ========================================================================
    // Public API: Flush pages
    // ========================================================================

    /// Flush a specific page to disk if it's dirty.
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let frame_id = match self.page_table.read().get(&page_id) {
            Some(&fid) => fid,
            None => return Ok(()),
        };

        self.flush_frame(frame_id, page_id)
    }

    /// Flush all dirty pages to disk.
    pub fn flush_all_pages(&self) -> Result<()> {
        let pages: Vec<(PageId, FrameId)> = {
            let pt = self.page_table.read();
            pt.iter().map(|(&pid, &fid)| (pid, fid)).collect()
        };

        for (page_id, frame_id) in pages {
            self.flush_frame(frame_id, page_id)?;
        }

        Ok(())
    }

    // ========================================================================
    // Public API: Pool state
    // ========================================================================

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn free_frame_count(&self) -> usize {
        self.free_list.lock().len()
    }

    /// Number of pages resident in the pool.
    pub fn page_count(&self) -> usize {
        self.page_table.read().len()
    }

    /// Pin count of a resident page, or `None` if it is not in the pool.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        let frame_id = *self.page_table.read().get(&page_id)?;
        Some(self.frames[frame_id.0].pin_count())
    }

    /// Number of frames currently pinned by anyone.
    pub fn pinned_frame_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_pinned()).count()
    }

    /// Whether `page_id` is allocated on disk.
    pub fn is_allocated(&self, page_id: PageId) -> bool {
        self.disk_manager.lock().is_allocated(page_id)
    }

    // ========================================================================
    // Internal: Called by guards on drop
    // ========================================================================

    pub(crate) fn unpin_page_internal(&self, frame_id: FrameId, is_dirty: bool) {
        let frame = &self.frames[frame_id.0];

        if frame.unpin(is_dirty) == 0 {
            self.replacer.lock().set_evictable(frame_id, true);
        }
    }

    // ========================================================================
    // Internal: Core fetch logic
    // ========================================================================

    fn fetch_directory_read(&self) -> Result<PageReadGuard<'_>> {
        let guard = self.fetch_page_read(DIRECTORY_PAGE_ID)?;
        if !DirectoryPage::is_directory(&guard) {
            return Err(Error::corrupted(DIRECTORY_PAGE_ID.0, "page 0 is not a directory page"));
        }
        Ok(guard)
    }

    fn fetch_directory_write(&self) -> Result<PageWriteGuard<'_>> {
        let guard = self.fetch_page_write(DIRECTORY_PAGE_ID)?;
        if !DirectoryPage::is_directory(&guard) {
            return Err(Error::corrupted(DIRECTORY_PAGE_ID.0, "page 0 is not a directory page"));
        }
        Ok(guard)
    }

    /// Fetch a page into the buffer pool, pin it, and return its frame ID.
    fn fetch_page_internal(&self, page_id: PageId) -> Result<FrameId> {
        if !page_id.is_valid() {
            return Err(Error::PageNotFound(page_id.0));
        }

        {
            let pt = self.page_table.read();
            if let Some(&frame_id) = pt.get(&page_id) {
                self.frames[frame_id.0].pin();
                let mut replacer = self.replacer.lock();
                replacer.record_access(frame_id);
                replacer.set_evictable(frame_id, false);
                return Ok(frame_id);
            }
        }

        self.handle_cache_miss(page_id)
    }

    /// Handle a cache miss: get a frame, load from disk, update mappings.
    fn handle_cache_miss(&self, page_id: PageId) -> Result<FrameId> {
        let frame_id = self.get_free_frame()?;

        let read = {
            let mut dm = self.disk_manager.lock();
            if dm.is_allocated(page_id) {
                dm.read_page(page_id)
            } else {
                Err(Error::PageNotFound(page_id.0))
            }
        };
        let page_data = match read {
            Ok(page) => page,
            Err(e) => {
                self.free_list.lock().push(frame_id);
                return Err(e);
            }
        };

        let frame = &self.frames[frame_id.0];
        frame
            .page_mut()
            .as_mut_slice()
            .copy_from_slice(page_data.as_slice());
        frame.load(page_id);

        self.page_table.write().insert(page_id, frame_id);
        {
            let mut replacer = self.replacer.lock();
            replacer.record_access(frame_id);
            replacer.set_evictable(frame_id, false);
        }

        trace!(page_id = %page_id, frame_id = %frame_id, "loaded page from disk");
        Ok(frame_id)
    }

    // ========================================================================
    // Internal: Frame allocation and eviction
    // ========================================================================

    /// Get a free frame, evicting if necessary.
    fn get_free_frame(&self) -> Result<FrameId> {
        if let Some(frame_id) = self.free_list.lock().pop() {
            return Ok(frame_id);
        }

        self.evict_page()
    }

    /// Evict a page and return its frame.
    fn evict_page(&self) -> Result<FrameId> {
        let frame_id = self.replacer.lock().evict().ok_or(Error::NoFreeFrames)?;
        let frame = &self.frames[frame_id.0];
        let old_page_id = frame.page_id();

        if let Some(pid) = old_page_id {
            if let Err(e) = self.flush_frame(frame_id, pid) {
                // Keep the victim resident; it is still the only copy.
                let mut replacer = self.replacer.lock();
                replacer.record_access(frame_id);
                replacer.set_evictable(frame_id, true);
                return Err(e);
            }
            self.page_table.write().remove(&pid);
            trace!(page_id = %pid, frame_id = %frame_id, "evicted page");
        }

        frame.reset();
        Ok(frame_id)
    }

    /// Flush a frame to disk if dirty.
    fn flush_frame(&self, frame_id: FrameId, page_id: PageId) -> Result<()> {
        let frame = &self.frames[frame_id.0];

        if frame.is_dirty() {
            let page = frame.page();
            self.disk_manager.lock().write_page(page_id, &page)?;
            drop(page);

            frame.clear_dirty();
        }

        Ok(())
    }
}
