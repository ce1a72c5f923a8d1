//! LRU (Least Recently Used) replacement policy.
//!
//! B+ tree descents touch the root on every operation, so recency keeps the
//! upper levels resident while cold leaves are evicted.

use std::collections::HashMap;

use crate::common::FrameId;

#[derive(Debug, Clone, Copy)]
struct Entry {
    last_access: u64,
    evictable: bool,
}

/// Least-recently-used eviction policy.
///
/// Each access stamps the frame with a logical clock; the victim is the
/// evictable frame with the oldest stamp. Pinned frames are never chosen.
pub struct LruReplacer {
    clock: u64,
    entries: HashMap<FrameId, Entry>,
}

impl LruReplacer {
    pub fn new() -> Self {
        Self {
            clock: 0,
            entries: HashMap::new(),
        }
    }

    /// Record that a frame was accessed.
    pub fn record_access(&mut self, frame_id: FrameId) {
        self.clock += 1;
        let clock = self.clock;
        self.entries
            .entry(frame_id)
            .and_modify(|e| e.last_access = clock)
            .or_insert(Entry {
                last_access: clock,
                evictable: false,
            });
    }

    /// Mark a frame evictable (pin count dropped to 0) or not.
    ///
    /// Frames the replacer has never seen are ignored.
    pub fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        if let Some(entry) = self.entries.get_mut(&frame_id) {
            entry.evictable = evictable;
        }
    }

    /// Select and forget the least recently used evictable frame.
    pub fn evict(&mut self) -> Option<FrameId> {
        let victim = self
            .entries
            .iter()
            .filter(|(_, e)| e.evictable)
            .min_by_key(|(_, e)| e.last_access)
            .map(|(&fid, _)| fid)?;
        self.entries.remove(&victim);
        Some(victim)
    }

    /// Forget a frame entirely (its page was freed).
    pub fn remove(&mut self, frame_id: FrameId) {
        self.entries.remove(&frame_id);
    }

    /// Number of evictable frames.
    pub fn size(&self) -> usize {
        self.entries.values().filter(|e| e.evictable).count()
    }
}

impl Default for LruReplacer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replacer_with(frames: &[usize]) -> LruReplacer {
        let mut replacer = LruReplacer::new();
        for &f in frames {
            replacer.record_access(FrameId::new(f));
            replacer.set_evictable(FrameId::new(f), true);
        }
        replacer
    }

    #[test]
    fn test_lru_order() {
        let mut replacer = replacer_with(&[0, 1, 2]);
        assert_eq!(replacer.size(), 3);

        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), Some(FrameId::new(2)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_reaccess_moves_to_back() {
        let mut replacer = replacer_with(&[0, 1, 2]);
        replacer.record_access(FrameId::new(0));

        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), Some(FrameId::new(2)));
        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
    }

    #[test]
    fn test_pinned_frames_skipped() {
        let mut replacer = replacer_with(&[0, 1, 2]);
        replacer.set_evictable(FrameId::new(0), false);
        replacer.set_evictable(FrameId::new(2), false);

        assert_eq!(replacer.size(), 1);
        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), None);
    }

    #[test]
    fn test_remove() {
        let mut replacer = replacer_with(&[0, 1]);
        replacer.remove(FrameId::new(0));
        replacer.set_evictable(FrameId::new(0), true);

        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), None);
    }
}
