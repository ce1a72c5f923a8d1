//! BTreeFileScan - forward range scan over the leaf chain.

use crate::buffer::{BufferPoolManager, PagePin};
use crate::common::Result;

use super::file::RunStart;
use super::key::{Key, KeyType, RecordId};
use super::leaf_page::LeafPage;

/// Iterator over `(key, record id)` pairs with `lo <= key <= hi`.
///
/// Holds a pin on the current leaf only; it is released when the scan runs
/// past `hi`, reaches the end of the chain, hits an error, or is dropped.
pub struct BTreeFileScan<'a> {
    bpm: &'a BufferPoolManager,
    key_type: KeyType,
    current: Option<PagePin<'a>>,
    slot: usize,
    hi: Option<Key>,
}

impl<'a> BTreeFileScan<'a> {
    pub(super) fn new(
        bpm: &'a BufferPoolManager,
        key_type: KeyType,
        start: Option<RunStart<'a>>,
        hi: Option<Key>,
    ) -> Self {
        let (current, slot) = match start {
            Some(start) => {
                let (pin, slot) = start.into_parts();
                (Some(pin), slot)
            }
            None => (None, 0),
        };
        Self {
            bpm,
            key_type,
            current,
            slot,
            hi,
        }
    }

    /// Whether the scan has finished and released its pin.
    pub fn is_done(&self) -> bool {
        self.current.is_none()
    }

    fn advance(&mut self) -> Result<Option<(Key, RecordId)>> {
        loop {
            let Some(pin) = self.current.as_ref() else {
                return Ok(None);
            };

            let (entry, next) = {
                let guard = pin.read()?;
                let leaf = LeafPage::new(&*guard, self.key_type);
                if self.slot < leaf.len() {
                    (Some(leaf.entry(self.slot)?), None)
                } else {
                    (None, Some(leaf.next_page()))
                }
            };

            if let Some((key, rid)) = entry {
                if self.hi.as_ref().is_some_and(|hi| key > *hi) {
                    self.current = None;
                    return Ok(None);
                }
                self.slot += 1;
                return Ok(Some((key, rid)));
            }

            // Leaf exhausted (or emptied by deletes): hop to the next one.
            self.current = None;
            self.slot = 0;
            match next {
                Some(next) if next.is_valid() => self.current = Some(self.bpm.pin_page(next)?),
                _ => return Ok(None),
            }
        }
    }
}

impl Iterator for BTreeFileScan<'_> {
    type Item = Result<(Key, RecordId)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(entry) => entry.map(Ok),
            Err(e) => {
                self.current = None;
                Some(Err(e))
            }
        }
    }
}
