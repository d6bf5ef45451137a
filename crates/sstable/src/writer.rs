use anyhow::Result;
use byteorder::{LittleEndian, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::{rename, OpenOptions};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use crate::format::{write_footer, Footer};
use crate::Cell;

/// Writes sorted cells to disk as an immutable SSTable file.
///
/// The write is crash-safe: data goes to `path.sst.tmp`, is fsynced, and is
/// then atomically renamed into place.
pub struct SSTableWriter {}

impl SSTableWriter {
    /// Writes an SSTable from an iterator of `(key, Cell)` pairs.
    ///
    /// The iterator must yield keys in **ascending order** without
    /// duplicates. Entries are streamed straight to disk; only the index is
    /// held in memory.
    ///
    /// # File Layout
    ///
    /// ```text
    /// [DATA]   repeated: crc32(u32) | key_len(u32) | key | seq(u64) | present(u8) | [val_len(u32) | val]
    /// [INDEX]  repeated: key_len(u32) | key | data_offset(u64)
    /// [FOOTER] entry_count(u64) | max_seq(u64) | index_offset(u64) | magic(u32 = "MSF1")
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the iterator yields nothing (the temp file is
    /// removed and no table is created) or on any I/O failure.
    pub fn write_from_iterator<I>(path: &Path, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = (Vec<u8>, Cell)>,
    {
        let tmp_path = path.with_extension("sst.tmp");
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut file = BufWriter::new(raw_file);

        let mut index: Vec<(Vec<u8>, u64)> = Vec::new();
        let mut max_seq: u64 = 0;
        let mut record_buf: Vec<u8> = Vec::with_capacity(256);

        // DATA section
        for (key, cell) in iter {
            max_seq = max_seq.max(cell.seq);

            record_buf.clear();
            record_buf.write_u32::<LittleEndian>(key.len() as u32)?;
            record_buf.extend_from_slice(&key);
            record_buf.write_u64::<LittleEndian>(cell.seq)?;
            match &cell.value {
                Some(v) => {
                    record_buf.write_u8(1)?;
                    record_buf.write_u32::<LittleEndian>(v.len() as u32)?;
                    record_buf.extend_from_slice(v);
                }
                None => record_buf.write_u8(0)?,
            }

            let mut hasher = Crc32::new();
            hasher.update(&record_buf);
            let crc = hasher.finalize();

            let offset = file.stream_position()?;
            file.write_u32::<LittleEndian>(crc)?;
            file.write_all(&record_buf)?;

            index.push((key, offset));
        }

        if index.is_empty() {
            drop(file);
            let _ = std::fs::remove_file(&tmp_path);
            anyhow::bail!("refusing to write an empty SSTable (no entries)");
        }

        // INDEX section
        let index_offset = file.stream_position()?;
        for (key, data_offset) in &index {
            file.write_u32::<LittleEndian>(key.len() as u32)?;
            file.write_all(key)?;
            file.write_u64::<LittleEndian>(*data_offset)?;
        }

        write_footer(
            &mut file,
            &Footer {
                entry_count: index.len() as u64,
                max_seq,
                index_offset,
            },
        )?;

        file.flush()?;
        file.into_inner()?.sync_all()?;

        rename(&tmp_path, path)?;

        // Make the rename durable on filesystems that need a directory fsync.
        if let Some(parent) = path.parent() {
            if let Ok(dir) = std::fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }
}
