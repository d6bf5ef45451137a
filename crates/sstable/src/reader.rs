use anyhow::{bail, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use crc32fast::Hasher as Crc32;
use split::{CellKey, CellKind, DataFile};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::format::{read_footer, Footer, FOOTER_BYTES};
use crate::Cell;

/// Maximum key size we'll allocate during reads (64 KiB). Prevents OOM on corrupt files.
const MAX_KEY_BYTES: usize = 64 * 1024;
/// Maximum value size we'll allocate during reads (10 MiB). Prevents OOM on corrupt files.
const MAX_VALUE_BYTES: usize = 10 * 1024 * 1024;

/// Reads an SSTable file.
///
/// On [`open`](SSTableReader::open) the whole index is loaded into memory as
/// a `BTreeMap<Vec<u8>, u64>` (key → data-section byte offset). The file
/// handle stays open behind a `Mutex` so reads work through `&self`.
pub struct SSTableReader {
    path: PathBuf,
    index: BTreeMap<Vec<u8>, u64>,
    file: Mutex<BufReader<File>>,
    footer: Footer,
    /// File size captured at open; SSTables never change after being written.
    length: u64,
}

impl std::fmt::Debug for SSTableReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SSTableReader")
            .field("path", &self.path)
            .field("entries", &self.index.len())
            .field("max_seq", &self.footer.max_seq)
            .field("length", &self.length)
            .finish()
    }
}

impl SSTableReader {
    /// Opens an SSTable file and loads its index into memory.
    ///
    /// # Validation
    ///
    /// - The file must hold at least a footer and carry the `MSF1` magic.
    /// - `index_offset` must fall before the footer.
    /// - The index must contain exactly `entry_count` keys.
    ///
    /// # Errors
    ///
    /// Returns an error if any check fails or on I/O failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let mut f = File::open(&path_buf)?;
        let filesize = f.metadata()?.len();

        if filesize < FOOTER_BYTES {
            bail!("sstable file too small");
        }

        let footer = read_footer(&mut f)?;
        let index_end = filesize - FOOTER_BYTES;
        if footer.index_offset > index_end {
            bail!("invalid index_offset");
        }

        f.seek(SeekFrom::Start(footer.index_offset))?;
        let mut index = BTreeMap::new();
        while f.stream_position()? < index_end {
            let key_len = f.read_u32::<LittleEndian>()? as usize;
            if key_len > MAX_KEY_BYTES {
                bail!("corrupt index: key_len {} exceeds maximum {}", key_len, MAX_KEY_BYTES);
            }
            let mut key = vec![0u8; key_len];
            f.read_exact(&mut key)?;
            let data_offset = f.read_u64::<LittleEndian>()?;
            if data_offset >= footer.index_offset {
                bail!("corrupt index: data_offset {} points past data section", data_offset);
            }
            index.insert(key, data_offset);
        }

        if index.len() as u64 != footer.entry_count {
            bail!(
                "corrupt index: footer says {} entries, index holds {}",
                footer.entry_count,
                index.len()
            );
        }

        f.seek(SeekFrom::Start(0))?;

        Ok(Self {
            path: path_buf,
            index,
            file: Mutex::new(BufReader::new(f)),
            footer,
            length: filesize,
        })
    }

    /// Point lookup for a single key.
    ///
    /// Returns `Ok(Some(cell))` if the key exists (the cell may be a
    /// tombstone) and `Ok(None)` if it is not in the index.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure, CRC mismatch, or if the record at the
    /// indexed offset holds a different key.
    pub fn get(&self, key: &[u8]) -> Result<Option<Cell>> {
        let offset = match self.index.get(key) {
            Some(&o) => o,
            None => return Ok(None),
        };

        let (found, cell) = self.read_record(offset)?;
        if found.as_slice() != key {
            bail!("index pointed to mismatching key at offset {}", offset);
        }
        Ok(Some(cell))
    }

    /// Reads the cell in the middle of the file (index position `len / 2`)
    /// and returns its encoded [`CellKey`].
    ///
    /// # Errors
    ///
    /// Fails on an empty table, I/O failure or CRC mismatch.
    pub fn midkey(&self) -> Result<Vec<u8>> {
        let (key, offset) = match self.index.iter().nth(self.index.len() / 2) {
            Some((k, &o)) => (k, o),
            None => bail!("empty sstable {} has no midkey", self.path.display()),
        };

        let (row, cell) = self.read_record(offset)?;
        if row != *key {
            bail!("index pointed to mismatching key at offset {}", offset);
        }
        let kind = if cell.is_tombstone() {
            CellKind::Delete
        } else {
            CellKind::Put
        };
        Ok(CellKey::new(row, cell.seq, kind).encode())
    }

    /// Reads and CRC-checks the record at `offset`.
    ///
    /// Record layout: `[crc32: u32][key_len: u32][key][seq: u64][present: u8][val_len: u32][val]`
    fn read_record(&self, offset: u64) -> Result<(Vec<u8>, Cell)> {
        let mut f = self.file.lock().map_err(|e| anyhow::anyhow!("lock poisoned: {}", e))?;
        f.seek(SeekFrom::Start(offset))?;

        let stored_crc = f.read_u32::<LittleEndian>()?;

        let key_len = f.read_u32::<LittleEndian>()? as usize;
        if key_len > MAX_KEY_BYTES {
            bail!("corrupt data: key_len {} exceeds maximum {}", key_len, MAX_KEY_BYTES);
        }
        let mut key = vec![0u8; key_len];
        f.read_exact(&mut key)?;

        let seq = f.read_u64::<LittleEndian>()?;
        let present = f.read_u8()?;
        let value = if present == 1 {
            let val_len = f.read_u32::<LittleEndian>()? as usize;
            if val_len > MAX_VALUE_BYTES {
                bail!("corrupt data: val_len {} exceeds maximum {}", val_len, MAX_VALUE_BYTES);
            }
            let mut val = vec![0u8; val_len];
            f.read_exact(&mut val)?;
            Some(val)
        } else {
            None
        };

        let mut hasher = Crc32::new();
        hasher.update(&(key_len as u32).to_le_bytes());
        hasher.update(&key);
        hasher.update(&seq.to_le_bytes());
        hasher.update(&[present]);
        if let Some(ref v) = value {
            hasher.update(&(v.len() as u32).to_le_bytes());
            hasher.update(v);
        }
        let actual_crc = hasher.finalize();
        if actual_crc != stored_crc {
            bail!(
                "CRC32 mismatch at offset {}: expected {:#010x}, got {:#010x} (data corruption)",
                offset,
                stored_crc,
                actual_crc
            );
        }

        Ok((key, Cell { seq, value }))
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Highest sequence number stored in this table.
    #[must_use]
    pub fn max_seq(&self) -> u64 {
        self.footer.max_seq
    }

    /// Size of the file in bytes.
    #[must_use]
    pub fn length(&self) -> u64 {
        self.length
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Smallest key in the table.
    #[must_use]
    pub fn first_key(&self) -> Option<&[u8]> {
        self.index.keys().next().map(|k| k.as_slice())
    }

    /// Largest key in the table.
    #[must_use]
    pub fn last_key(&self) -> Option<&[u8]> {
        self.index.keys().next_back().map(|k| k.as_slice())
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.index.keys().map(|k| k.as_slice())
    }
}

impl DataFile for SSTableReader {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn midpoint_key(&self) -> io::Result<Vec<u8>> {
        self.midkey().map_err(|e| io::Error::other(format!("{:#}", e)))
    }

    fn length(&self) -> u64 {
        self.length
    }
}
