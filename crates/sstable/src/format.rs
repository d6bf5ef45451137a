//! SSTable footer layout and read/write helpers.
//!
//! ```text
//! [entry_count: u64 LE][max_seq: u64 LE][index_offset: u64 LE][magic: u32 LE]
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Result as IoResult, Seek, SeekFrom, Write};

/// Magic number identifying SSTable files (ASCII "MSF1").
pub const SSTABLE_MAGIC: u32 = 0x4D53_4631;

/// Size of the footer in bytes: 8 (`entry_count`) + 8 (`max_seq`) + 8 (`index_offset`) + 4 (`magic`).
pub const FOOTER_BYTES: u64 = 8 + 8 + 8 + 4;

/// Parsed SSTable footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub entry_count: u64,
    pub max_seq: u64,
    pub index_offset: u64,
}

/// Writes the footer to `w`.
pub fn write_footer<W: Write>(w: &mut W, footer: &Footer) -> IoResult<()> {
    w.write_u64::<LittleEndian>(footer.entry_count)?;
    w.write_u64::<LittleEndian>(footer.max_seq)?;
    w.write_u64::<LittleEndian>(footer.index_offset)?;
    w.write_u32::<LittleEndian>(SSTABLE_MAGIC)?;
    Ok(())
}

/// Reads the footer from the end of `r`, checking the magic first.
pub fn read_footer<R: Read + Seek>(r: &mut R) -> IoResult<Footer> {
    let filesize = r.seek(SeekFrom::End(0))?;
    if filesize < FOOTER_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "file too small for SSTable footer",
        ));
    }

    r.seek(SeekFrom::End(-4))?;
    let magic = r.read_u32::<LittleEndian>()?;
    if magic != SSTABLE_MAGIC {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unknown SSTable magic: {:#x}", magic),
        ));
    }

    r.seek(SeekFrom::End(-(FOOTER_BYTES as i64)))?;
    let entry_count = r.read_u64::<LittleEndian>()?;
    let max_seq = r.read_u64::<LittleEndian>()?;
    let index_offset = r.read_u64::<LittleEndian>()?;
    Ok(Footer {
        entry_count,
        max_seq,
        index_offset,
    })
}
