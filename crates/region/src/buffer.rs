use sstable::Cell;
use std::collections::BTreeMap;

/// Sorted in-memory write buffer of a store.
///
/// Holds at most one cell per key: the one with the highest sequence number.
#[derive(Debug, Default)]
pub struct WriteBuffer {
    cells: BTreeMap<Vec<u8>, Cell>,
    /// Key plus value bytes of the live cells. Tombstones count their key
    /// so delete-only workloads still reach the flush threshold.
    approx_size: usize,
}

impl WriteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `cell` under `key` unless a newer cell is already buffered.
    pub fn insert(&mut self, key: Vec<u8>, cell: Cell) {
        if let Some(old) = self.cells.get(&key) {
            if old.seq >= cell.seq {
                return;
            }
            self.approx_size = self.approx_size.saturating_sub(Self::footprint(&key, old));
        }
        self.approx_size += Self::footprint(&key, &cell);
        self.cells.insert(key, cell);
    }

    pub fn get(&self, key: &[u8]) -> Option<&Cell> {
        self.cells.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Cell)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn approx_size(&self) -> usize {
        self.approx_size
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.approx_size = 0;
    }

    fn footprint(key: &[u8], cell: &Cell) -> usize {
        key.len() + cell.value.as_ref().map_or(0, |v| v.len())
    }
}
