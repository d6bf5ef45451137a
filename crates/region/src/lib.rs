//! # Region - a key-range partition made of stores
//!
//! A region owns the half-open key range `[start_key, end_key)` and one
//! [`Store`] per column family. Each store lives in its own sub-directory:
//!
//! ```text
//! <region dir>/
//!   ├── default/
//!   │     ├── sst-00000000000000000042-1718000000000.sst
//!   │     └── sst-00000000000000000007-1717999999000.sst
//!   └── meta/
//!         └── sst-00000000000000000013-1718000000500.sst
//! ```
//!
//! The region exposes itself to split-point selection through
//! [`split::Region`]: stores in name order, each store's SSTables newest
//! first.
//!
//! ## Module Responsibilities
//!
//! | Module     | Purpose                                                  |
//! |------------|----------------------------------------------------------|
//! | [`lib.rs`] | `Region`: open, key-range checks, routing, split point   |
//! | [`store`]  | `Store`: write buffer, flush, recovery, reads            |
//! | [`buffer`] | `WriteBuffer`: sorted, seq-aware in-memory cells         |
mod buffer;
mod store;

use anyhow::{bail, Result};
use config::RegionConfig;
use split::SplitPointStrategy;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

pub use buffer::WriteBuffer;
pub use store::Store;

/// Maximum allowed key size in bytes (64 KiB).
pub const MAX_KEY_SIZE: usize = 64 * 1024;
/// Maximum allowed value size in bytes (10 MiB).
pub const MAX_VALUE_SIZE: usize = 10 * 1024 * 1024;

pub struct Region {
    name: String,
    dir: PathBuf,
    start_key: Vec<u8>,
    end_key: Vec<u8>,
    /// Keyed by store name, which also fixes the sampling order.
    stores: BTreeMap<String, Store>,
    flush_threshold: usize,
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("start_key", &String::from_utf8_lossy(&self.start_key))
            .field("end_key", &String::from_utf8_lossy(&self.end_key))
            .field("flush_threshold", &self.flush_threshold)
            .field("stores", &self.stores.values().collect::<Vec<_>>())
            .finish()
    }
}

impl Region {
    /// Opens the region described by `cfg`.
    ///
    /// Every existing sub-directory of `cfg.dir` is loaded as a store, then
    /// any family listed in `cfg.families` that is still missing is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the key range is inverted or a store fails to open.
    pub fn open(cfg: &RegionConfig) -> Result<Self> {
        if !cfg.end_key.is_empty() && cfg.start_key >= cfg.end_key {
            bail!("region start key must sort before its end key");
        }

        std::fs::create_dir_all(&cfg.dir)?;

        let mut stores = BTreeMap::new();
        for entry in std::fs::read_dir(&cfg.dir)?.flatten() {
            let path = entry.path();
            if path.is_dir() {
                let store = Store::open(&path, cfg.flush_threshold)?;
                stores.insert(store.name().to_string(), store);
            }
        }

        let mut region = Self {
            name: cfg.name.clone(),
            dir: cfg.dir.clone(),
            start_key: cfg.start_key.clone(),
            end_key: cfg.end_key.clone(),
            stores,
            flush_threshold: cfg.flush_threshold,
        };
        for family in &cfg.families {
            region.create_store(family)?;
        }

        info!(
            region = %region.name,
            stores = region.stores.len(),
            files = region.file_count(),
            bytes = region.total_bytes(),
            "opened region"
        );
        Ok(region)
    }

    /// Returns the store named `family`, creating it if needed.
    pub fn create_store(&mut self, family: &str) -> Result<&mut Store> {
        if family.is_empty() || family.contains(['/', '\\']) || family.starts_with('.') {
            bail!("invalid store name '{}'", family);
        }
        if !self.stores.contains_key(family) {
            let store = Store::open(self.dir.join(family), self.flush_threshold)?;
            self.stores.insert(family.to_string(), store);
        }
        self.store_mut(family)
    }

    pub fn store(&self, family: &str) -> Option<&Store> {
        self.stores.get(family)
    }

    fn store_mut(&mut self, family: &str) -> Result<&mut Store> {
        match self.stores.get_mut(family) {
            Some(s) => Ok(s),
            None => bail!("unknown store '{}' in region {}", family, self.name),
        }
    }

    /// Stores in name order.
    pub fn stores(&self) -> impl Iterator<Item = &Store> {
        self.stores.values()
    }

    /// `true` if `key` falls inside `[start_key, end_key)`.
    #[must_use]
    pub fn contains_key(&self, key: &[u8]) -> bool {
        key >= self.start_key.as_slice() && (self.end_key.is_empty() || key < self.end_key.as_slice())
    }

    /// Writes a cell to `family`.
    ///
    /// # Errors
    ///
    /// Fails if the key is outside the region, the store does not exist, or
    /// the write itself fails.
    pub fn put(&mut self, family: &str, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.check_in_range(&key)?;
        self.store_mut(family)?.put(key, value)
    }

    /// Writes a tombstone to `family`.
    pub fn delete(&mut self, family: &str, key: Vec<u8>) -> Result<()> {
        self.check_in_range(&key)?;
        self.store_mut(family)?.delete(key)
    }

    /// Reads the live value of `key` in `family`.
    pub fn get(&self, family: &str, key: &[u8]) -> Result<Option<(u64, Vec<u8>)>> {
        match self.stores.get(family) {
            Some(s) => s.get(key),
            None => bail!("unknown store '{}' in region {}", family, self.name),
        }
    }

    /// Flushes the write buffer of every store.
    pub fn flush_all(&mut self) -> Result<()> {
        for store in self.stores.values_mut() {
            store.flush()?;
        }
        Ok(())
    }

    /// Flushes a single store.
    pub fn flush(&mut self, family: &str) -> Result<()> {
        self.store_mut(family)?.flush()
    }

    /// Asks `strategy` where this region should be split.
    ///
    /// # Errors
    ///
    /// Propagates the strategy's [`split::SplitError`].
    pub fn split_point(&self, strategy: &dyn SplitPointStrategy) -> Result<Vec<u8>> {
        Ok(strategy.split_point(self)?)
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
    pub fn start_key(&self) -> &[u8] {
        &self.start_key
    }

    #[must_use]
    pub fn end_key(&self) -> &[u8] {
        &self.end_key
    }

    /// Number of SSTables across all stores.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.stores.values().map(|s| s.file_count()).sum()
    }

    /// On-disk bytes across all stores.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.stores.values().map(|s| s.total_bytes()).sum()
    }

    fn check_in_range(&self, key: &[u8]) -> Result<()> {
        if !self.contains_key(key) {
            bail!(
                "key {:?} is outside region {} [{:?}, {:?})",
                String::from_utf8_lossy(key),
                self.name,
                String::from_utf8_lossy(&self.start_key),
                String::from_utf8_lossy(&self.end_key)
            );
        }
        Ok(())
    }
}

impl split::Region for Region {
    fn name(&self) -> &str {
        &self.name
    }

    fn start_key(&self) -> &[u8] {
        &self.start_key
    }

    fn end_key(&self) -> &[u8] {
        &self.end_key
    }

    fn stores(&self) -> Vec<&dyn split::Store> {
        self.stores.values().map(|s| s as &dyn split::Store).collect()
    }
}

#[cfg(test)]
mod tests;
