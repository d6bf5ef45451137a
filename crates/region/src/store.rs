//! A store: one column family of a region.
//!
//! Writes land in a sorted [`WriteBuffer`]; once the buffer reaches the flush
//! threshold it is persisted as a new SSTable. Reads check the buffer first
//! and then the SSTables from newest to oldest, so the first hit wins and a
//! tombstone shadows anything older.
use anyhow::{Context, Result};
use sstable::{Cell, SSTableReader, SSTableWriter};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::buffer::WriteBuffer;
use crate::{MAX_KEY_SIZE, MAX_VALUE_SIZE};

pub struct Store {
    name: String,
    dir: PathBuf,
    buffer: WriteBuffer,
    /// Ordered newest-first.
    files: Vec<SSTableReader>,
    /// Current monotonic sequence number.
    seq: u64,
    /// Buffer byte size that triggers a flush.
    flush_threshold: usize,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name)
            .field("seq", &self.seq)
            .field("buffer_entries", &self.buffer.len())
            .field("buffer_size", &self.buffer.approx_size())
            .field("file_count", &self.files.len())
            .field("total_bytes", &self.total_bytes())
            .finish()
    }
}

impl Store {
    /// Opens (or creates) the store living in `dir`.
    ///
    /// # Recovery Steps
    ///
    /// 1. Create the directory if it does not exist.
    /// 2. Remove leftover `.sst.tmp` files from interrupted flushes.
    /// 3. Open every `.sst` file, newest first (file names sort by sequence).
    /// 4. Resume the sequence number from the highest one on disk.
    ///
    /// A table whose footer or index is corrupt fails the whole open; only
    /// record-level damage is left for readers (and the sampler) to find.
    pub fn open<P: AsRef<Path>>(dir: P, flush_threshold: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("store directory {} has no usable name", dir.display()))?
            .to_string();

        std::fs::create_dir_all(&dir)?;
        Self::cleanup_tmp_files(&dir);

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|e| e == "sst").unwrap_or(false))
            .collect();
        paths.sort();
        paths.reverse();

        let mut files = Vec::with_capacity(paths.len());
        let mut seq = 0u64;
        for path in &paths {
            let reader = SSTableReader::open(path)
                .with_context(|| format!("failed to open sstable {}", path.display()))?;
            seq = seq.max(reader.max_seq());
            files.push(reader);
        }

        debug!(store = %name, files = files.len(), seq, "opened store");

        Ok(Self {
            name,
            dir,
            buffer: WriteBuffer::new(),
            files,
            seq,
            flush_threshold,
        })
    }

    /// Writes `value` under `key`, flushing if the buffer is full.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        Self::check_key(&key)?;
        anyhow::ensure!(
            value.len() <= MAX_VALUE_SIZE,
            "value too large: {} bytes (max {})",
            value.len(),
            MAX_VALUE_SIZE
        );

        let seq = self.next_seq()?;
        self.buffer.insert(key, Cell::put(seq, value));
        self.maybe_flush()
    }

    /// Writes a tombstone for `key`, flushing if the buffer is full.
    pub fn delete(&mut self, key: Vec<u8>) -> Result<()> {
        Self::check_key(&key)?;

        let seq = self.next_seq()?;
        self.buffer.insert(key, Cell::tombstone(seq));
        self.maybe_flush()
    }

    /// Looks up a key, returning `Some((seq, value))` if it is live.
    ///
    /// # Errors
    ///
    /// Returns an error if an SSTable read fails.
    pub fn get(&self, key: &[u8]) -> Result<Option<(u64, Vec<u8>)>> {
        if let Some(cell) = self.buffer.get(key) {
            return Ok(cell.value.as_ref().map(|v| (cell.seq, v.clone())));
        }

        for sst in &self.files {
            if let Some(cell) = sst.get(key)? {
                return Ok(cell.value.map(|v| (cell.seq, v)));
            }
        }

        Ok(None)
    }

    /// Persists the write buffer as a new SSTable. No-op when it is empty.
    ///
    /// The file is named `sst-{seq:020}-{timestamp_ms}.sst` so that names
    /// sort oldest to newest.
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let ts = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
        let sst_name = format!("sst-{:020}-{}.sst", self.seq, ts);
        let sst_path = self.dir.join(&sst_name);

        let cells = self.buffer.iter().map(|(k, c)| (k.clone(), c.clone()));
        SSTableWriter::write_from_iterator(&sst_path, cells)?;

        let entries = self.buffer.len();
        self.buffer.clear();

        let reader = SSTableReader::open(&sst_path)?;
        debug!(
            store = %self.name,
            file = %sst_name,
            entries,
            bytes = reader.length(),
            "flushed write buffer"
        );
        self.files.insert(0, reader);
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    #[must_use]
    pub fn flush_threshold(&self) -> usize {
        self.flush_threshold
    }

    pub fn set_flush_threshold(&mut self, threshold: usize) {
        self.flush_threshold = threshold;
    }

    /// SSTables of this store, newest first.
    #[must_use]
    pub fn files(&self) -> &[SSTableReader] {
        &self.files
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Total on-disk size of this store's SSTables.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.length()).sum()
    }

    #[must_use]
    pub fn buffered_entries(&self) -> usize {
        self.buffer.len()
    }

    fn maybe_flush(&mut self) -> Result<()> {
        if self.buffer.approx_size() >= self.flush_threshold {
            self.flush()?;
        }
        Ok(())
    }

    fn next_seq(&mut self) -> Result<u64> {
        self.seq = self
            .seq
            .checked_add(1)
            .ok_or_else(|| anyhow::anyhow!("sequence number overflow (u64::MAX reached)"))?;
        Ok(self.seq)
    }

    fn check_key(key: &[u8]) -> Result<()> {
        anyhow::ensure!(!key.is_empty(), "key must not be empty");
        anyhow::ensure!(
            key.len() <= MAX_KEY_SIZE,
            "key too large: {} bytes (max {})",
            key.len(),
            MAX_KEY_SIZE
        );
        Ok(())
    }

    fn cleanup_tmp_files(dir: &Path) {
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let p = entry.path();
                let is_tmp = p
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.ends_with(".sst.tmp"))
                    .unwrap_or(false);
                if is_tmp {
                    warn!(file = %p.display(), "removing leftover temp file from interrupted flush");
                    let _ = std::fs::remove_file(&p);
                }
            }
        }
    }
}

impl split::Store for Store {
    fn name(&self) -> &str {
        &self.name
    }

    fn data_files(&self) -> Vec<&dyn split::DataFile> {
        self.files.iter().map(|f| f as &dyn split::DataFile).collect()
    }
}
