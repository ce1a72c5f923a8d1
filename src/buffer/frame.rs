//! Frame - a slot in the buffer pool.
//!
//! A [`Frame`] holds a [`Page`] plus the bookkeeping the pool needs:
//! which page is loaded, how many pins are outstanding, and whether the
//! buffer differs from disk.

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::PageId;
use crate::storage::page::Page;

/// Bookkeeping for one frame, updated as a unit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct FrameState {
    page_id: Option<PageId>,
    pin_count: u32,
    dirty: bool,
}

/// A frame in the buffer pool.
///
/// The page buffer sits behind an `RwLock` so guards can hand out shared
/// or exclusive access; the bookkeeping sits behind its own `Mutex` so a
/// pin or unpin never waits on a page lock.
pub struct Frame {
    page: RwLock<Page>,
    state: Mutex<FrameState>,
}

impl Frame {
    /// Create a new empty frame.
    pub fn new() -> Self {
        Self {
            page: RwLock::new(Page::new()),
            state: Mutex::new(FrameState::default()),
        }
    }

    /// Acquire read lock on the page.
    #[inline]
    pub fn page(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    /// Acquire write lock on the page.
    #[inline]
    pub fn page_mut(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }

    /// The page loaded in this frame, if any.
    #[inline]
    pub fn page_id(&self) -> Option<PageId> {
        self.state.lock().page_id
    }

    /// Bind the frame to `page_id` with a single pin and a clean buffer.
    pub fn load(&self, page_id: PageId) {
        *self.state.lock() = FrameState {
            page_id: Some(page_id),
            pin_count: 1,
            dirty: false,
        };
    }

    /// Increment the pin count. Returns the new pin count.
    #[inline]
    pub fn pin(&self) -> u32 {
        let mut state = self.state.lock();
        state.pin_count += 1;
        state.pin_count
    }

    /// Decrement the pin count, recording a modification if `dirty`.
    /// Returns the new pin count.
    ///
    /// # Panics
    /// Panics if pin count is already 0.
    pub fn unpin(&self, dirty: bool) -> u32 {
        let mut state = self.state.lock();
        assert!(state.pin_count > 0, "pin count underflow");
        state.pin_count -= 1;
        state.dirty |= dirty;
        state.pin_count
    }

    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.state.lock().pin_count
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    #[inline]
    pub fn clear_dirty(&self) {
        self.state.lock().dirty = false;
    }

    /// Check if the frame is empty (no page loaded).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.page_id().is_none()
    }

    /// Check if the frame can be evicted.
    #[inline]
    pub fn is_evictable(&self) -> bool {
        let state = self.state.lock();
        state.page_id.is_some() && state.pin_count == 0
    }

    /// Detach the frame from its page and zero the buffer.
    pub fn reset(&self) {
        self.page_mut().reset();
        *self.state.lock() = FrameState::default();
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}
