//! The view of a region the split computation needs. The host engine
//! implements these; nothing here mutates the region.

use std::io;

/// An immutable on-disk unit of sorted cells.
pub trait DataFile {
    /// Human-readable identity used in diagnostics (usually the path).
    fn describe(&self) -> String;

    /// Reads the encoded [`CellKey`](crate::CellKey) at the middle of the
    /// file's sorted contents.
    ///
    /// # Errors
    ///
    /// Fails if the file is empty, corrupt, or cannot be read.
    fn midpoint_key(&self) -> io::Result<Vec<u8>>;

    /// Size of the file in bytes.
    fn length(&self) -> u64;
}

/// A group of data files inside a region (one per column family).
pub trait Store {
    fn name(&self) -> &str;

    /// Data files in the store's natural order.
    fn data_files(&self) -> Vec<&dyn DataFile>;
}

/// A contiguous, sorted key-range partition.
pub trait Region {
    fn name(&self) -> &str;

    /// Inclusive lower bound. Empty means unbounded.
    fn start_key(&self) -> &[u8];

    /// Exclusive upper bound. Empty means unbounded.
    fn end_key(&self) -> &[u8];

    fn stores(&self) -> Vec<&dyn Store>;
}
