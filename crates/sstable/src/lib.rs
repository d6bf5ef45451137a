//! # SSTable - Sorted String Table
//!
//! Immutable, on-disk data files of a region store.
//!
//! When a store's write buffer reaches its flush threshold it is written out
//! as an SSTable. SSTables are *write-once, read-many*. Besides point lookups
//! they answer the one question split-point selection asks of a data file:
//! which cell sits in the middle, and how big is the file?
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ DATA SECTION (sorted cells)                                   │
//! │                                                               │
//! │ crc32 (u32) | key_len (u32) | key | seq (u64)                 │
//! │ present (u8) | [val_len (u32) | val]                          │
//! │                                                               │
//! │ The CRC32 covers everything after itself in the record.       │
//! ├───────────────────────────────────────────────────────────────┤
//! │ INDEX SECTION (key -> data_offset mapping)                    │
//! │                                                               │
//! │ key_len (u32) | key | data_offset (u64)                       │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FOOTER (always last 28 bytes)                                 │
//! │                                                               │
//! │ entry_count (u64 LE) | max_seq (u64 LE)                       │
//! │ index_offset (u64 LE) | magic (u32 LE) "MSF1"                 │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian.

mod format;
mod reader;
mod writer;

pub use format::{Footer, FOOTER_BYTES, SSTABLE_MAGIC};
pub use reader::SSTableReader;
pub use writer::SSTableWriter;

/// A versioned cell. `value == None` is a tombstone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub seq: u64,
    pub value: Option<Vec<u8>>,
}

impl Cell {
    pub fn put(seq: u64, value: Vec<u8>) -> Self {
        Self {
            seq,
            value: Some(value),
        }
    }

    pub fn tombstone(seq: u64) -> Self {
        Self { seq, value: None }
    }

    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

#[cfg(test)]
mod tests;
