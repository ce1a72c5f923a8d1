//! File directory - maps index names to their header pages.
//!
//! The directory occupies page 0 of every database file. It is read and
//! written through the buffer pool like any other page; this module only
//! knows the byte layout.

use crate::common::config::MAX_FILE_NAME_LEN;
use crate::common::{Error, PageId, Result};
use crate::storage::page::{Page, PageHeader, PageType};

/// Layout of the directory page.
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       13    PageHeader (type = Directory)
/// 13      2     entry count
/// 15      55*N  entries: name_len u8 | name [u8; 50] | header page id u32
/// ```
///
/// Entries are kept dense; removing one moves the last entry into its slot.
pub struct DirectoryPage;

impl DirectoryPage {
    const OFFSET_COUNT: usize = PageHeader::SIZE;
    const OFFSET_ENTRIES: usize = Self::OFFSET_COUNT + 2;
    const ENTRY_SIZE: usize = 1 + MAX_FILE_NAME_LEN + PageId::SIZE;

    /// Maximum number of entries one directory page holds.
    pub const CAPACITY: usize = (Page::size() - Self::OFFSET_ENTRIES) / Self::ENTRY_SIZE;

    /// Initialize an empty directory.
    pub fn format(page: &mut Page) {
        page.format(PageType::Directory);
        page.write_u16(Self::OFFSET_COUNT, 0);
    }

    pub fn is_directory(page: &Page) -> bool {
        page.page_type() == PageType::Directory
    }

    pub fn len(page: &Page) -> usize {
        page.read_u16(Self::OFFSET_COUNT) as usize
    }

    pub fn is_empty(page: &Page) -> bool {
        Self::len(page) == 0
    }

    /// Find the header page registered under `name`.
    pub fn lookup(page: &Page, name: &str) -> Option<PageId> {
        Self::position(page, name).map(|slot| Self::page_id_at(page, slot))
    }

    /// Register `name` -> `page_id`.
    ///
    /// # Errors
    /// - `Error::InvalidFileName` if the name is empty or too long
    /// - `Error::FileExists` if the name is already registered
    /// - `Error::DirectoryFull` if every slot is taken
    pub fn insert(page: &mut Page, name: &str, page_id: PageId) -> Result<()> {
        Self::validate_name(name)?;
        if Self::position(page, name).is_some() {
            return Err(Error::FileExists(name.to_string()));
        }

        let len = Self::len(page);
        if len >= Self::CAPACITY {
            return Err(Error::DirectoryFull);
        }

        let offset = Self::entry_offset(len);
        let bytes = name.as_bytes();
        let data = page.as_mut_slice();
        data[offset] = bytes.len() as u8;
        data[offset + 1..offset + 1 + MAX_FILE_NAME_LEN].fill(0);
        data[offset + 1..offset + 1 + bytes.len()].copy_from_slice(bytes);
        page_id.write_at(data, offset + 1 + MAX_FILE_NAME_LEN);

        page.write_u16(Self::OFFSET_COUNT, (len + 1) as u16);
        Ok(())
    }

    /// Remove the entry registered under `name`.
    ///
    /// # Errors
    /// - `Error::FileNotFound` if no such entry exists
    pub fn remove(page: &mut Page, name: &str) -> Result<()> {
        let slot = Self::position(page, name).ok_or_else(|| Error::FileNotFound(name.to_string()))?;
        let last = Self::len(page) - 1;

        if slot != last {
            let src = Self::entry_offset(last);
            let dst = Self::entry_offset(slot);
            page.as_mut_slice()
                .copy_within(src..src + Self::ENTRY_SIZE, dst);
        }
        let tail = Self::entry_offset(last);
        page.as_mut_slice()[tail..tail + Self::ENTRY_SIZE].fill(0);
        page.write_u16(Self::OFFSET_COUNT, last as u16);
        Ok(())
    }

    /// All registered `(name, header page)` pairs in slot order.
    pub fn entries(page: &Page) -> Vec<(String, PageId)> {
        (0..Self::len(page))
            .map(|slot| (Self::name_at(page, slot), Self::page_id_at(page, slot)))
            .collect()
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() || name.len() > MAX_FILE_NAME_LEN {
            return Err(Error::InvalidFileName(name.to_string()));
        }
        Ok(())
    }

    fn position(page: &Page, name: &str) -> Option<usize> {
        (0..Self::len(page)).find(|&slot| Self::name_bytes_at(page, slot) == name.as_bytes())
    }

    #[inline]
    fn entry_offset(slot: usize) -> usize {
        Self::OFFSET_ENTRIES + slot * Self::ENTRY_SIZE
    }

    fn name_bytes_at(page: &Page, slot: usize) -> &[u8] {
        let offset = Self::entry_offset(slot);
        let data = page.as_slice();
        let len = (data[offset] as usize).min(MAX_FILE_NAME_LEN);
        &data[offset + 1..offset + 1 + len]
    }

    fn name_at(page: &Page, slot: usize) -> String {
        String::from_utf8_lossy(Self::name_bytes_at(page, slot)).into_owned()
    }

    fn page_id_at(page: &Page, slot: usize) -> PageId {
        PageId::read_at(page.as_slice(), Self::entry_offset(slot) + 1 + MAX_FILE_NAME_LEN)
    }
}
