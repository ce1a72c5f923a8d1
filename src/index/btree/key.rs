//! Keys, record locators and the per-tree enums stored in the header.

use std::cmp::Ordering;
use std::fmt;

use crate::common::PageId;

/// Type of every key in one tree, fixed at creation.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    String = 0,
    Integer = 1,
}

impl KeyType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(KeyType::String),
            1 => Some(KeyType::Integer),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            KeyType::String => "string",
            KeyType::Integer => "integer",
        }
    }

    /// Smallest `max_key_size` that can hold any key of this type.
    pub(crate) fn min_key_size(self) -> usize {
        match self {
            KeyType::Integer => 4,
            // Length prefix plus at least one byte.
            KeyType::String => 3,
        }
    }
}

/// How `delete` behaves; recorded once when the tree is created.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeleteMode {
    /// Remove the entry; never merge, redistribute or shrink.
    Naive = 0,
    /// Merge and redistribute on underflow. Not implemented.
    Full = 1,
}

impl DeleteMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DeleteMode::Naive),
            1 => Some(DeleteMode::Full),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DeleteMode::Naive => "naive",
            DeleteMode::Full => "full",
        }
    }
}

/// A search key.
///
/// # On-page encoding
/// - `Int`: 4 bytes, little-endian two's complement
/// - `Str`: u16 little-endian byte length, then the UTF-8 bytes
///
/// The encoded length is what a tree's `max_key_size` limits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i32),
    Str(String),
}

impl Key {
    pub fn key_type(&self) -> KeyType {
        match self {
            Key::Int(_) => KeyType::Integer,
            Key::Str(_) => KeyType::String,
        }
    }

    /// Bytes this key occupies on a page.
    pub fn encoded_len(&self) -> usize {
        match self {
            Key::Int(_) => 4,
            Key::Str(s) => 2 + s.len(),
        }
    }

    /// Append the on-page encoding to `out`.
    ///
    /// String keys longer than `u16::MAX` bytes never get here: they exceed
    /// every valid `max_key_size`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Key::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
            Key::Str(s) => {
                out.extend_from_slice(&(s.len() as u16).to_le_bytes());
                out.extend_from_slice(s.as_bytes());
            }
        }
    }

    pub(crate) fn as_key_ref(&self) -> KeyRef<'_> {
        match self {
            Key::Int(v) => KeyRef::Int(*v),
            Key::Str(s) => KeyRef::Str(s.as_bytes()),
        }
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(v) => write!(f, "{v}"),
            Key::Str(s) => write!(f, "{s}"),
        }
    }
}

/// A key borrowed straight out of a page buffer.
///
/// Orders exactly like the owned [`Key`] it decodes to, so page searches
/// compare without allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum KeyRef<'a> {
    Int(i32),
    Str(&'a [u8]),
}

impl<'a> KeyRef<'a> {
    /// Decode the key at the start of `bytes`, returning it and its length.
    pub(crate) fn decode(bytes: &'a [u8], key_type: KeyType) -> Option<(Self, usize)> {
        match key_type {
            KeyType::Integer => {
                let raw: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
                Some((KeyRef::Int(i32::from_le_bytes(raw)), 4))
            }
            KeyType::String => {
                let len = u16::from_le_bytes([*bytes.first()?, *bytes.get(1)?]) as usize;
                let body = bytes.get(2..2 + len)?;
                Some((KeyRef::Str(body), 2 + len))
            }
        }
    }

    pub(crate) fn to_key(self) -> Option<Key> {
        match self {
            KeyRef::Int(v) => Some(Key::Int(v)),
            KeyRef::Str(b) => std::str::from_utf8(b).ok().map(|s| Key::Str(s.to_string())),
        }
    }

    pub(crate) fn cmp_key(self, key: &Key) -> Ordering {
        self.cmp(&key.as_key_ref())
    }
}

/// Opaque locator of a data record outside the index.
///
/// Stored verbatim as a leaf entry's payload; the tree only copies it and
/// compares it for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: u32,
}

impl RecordId {
    /// Encoded size on a page.
    pub const SIZE: usize = 8;

    pub fn new(page_id: PageId, slot: u32) -> Self {
        Self { page_id, slot }
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..4].copy_from_slice(&self.page_id.to_le_bytes());
        out[4..].copy_from_slice(&self.slot.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let page: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        let slot: [u8; 4] = bytes.get(4..8)?.try_into().ok()?;
        Some(Self {
            page_id: PageId::from_le_bytes(page),
            slot: u32::from_le_bytes(slot),
        })
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.page_id.0, self.slot)
    }
}
