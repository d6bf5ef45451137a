//! Structured cell keys.
//!
//! A data file's midpoint is reported as a full cell key, not just a row.
//! The sampler only needs the row, so it decodes the key and drops the rest.
//!
//! ```text
//! [row_len: u32 LE][row: row_len bytes][seq: u64 LE][kind: u8]
//! ```

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Result, SplitError};

/// Bytes taken by the `row_len` prefix.
pub const CELL_KEY_PREFIX_BYTES: usize = 4;

/// Bytes following the row: 8 (`seq`) + 1 (`kind`).
pub const CELL_KEY_TRAILER_BYTES: usize = 8 + 1;

/// Whether a cell carries a value or shadows one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Delete,
    Put,
}

impl CellKind {
    fn to_byte(self) -> u8 {
        match self {
            CellKind::Delete => 0,
            CellKind::Put => 1,
        }
    }

    fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(CellKind::Delete),
            1 => Ok(CellKind::Put),
            other => Err(SplitError::MalformedKey(format!(
                "unknown cell kind {:#04x}",
                other
            ))),
        }
    }
}

/// A decoded cell key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellKey {
    pub row: Vec<u8>,
    pub seq: u64,
    pub kind: CellKind,
}

impl CellKey {
    pub fn new(row: Vec<u8>, seq: u64, kind: CellKind) -> Self {
        Self { row, seq, kind }
    }

    /// Serializes the key into its on-wire form.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf =
            Vec::with_capacity(CELL_KEY_PREFIX_BYTES + self.row.len() + CELL_KEY_TRAILER_BYTES);
        buf.extend_from_slice(&(self.row.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.row);
        buf.extend_from_slice(&self.seq.to_le_bytes());
        buf.push(self.kind.to_byte());
        buf
    }

    /// Parses a full cell key.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::MalformedKey`] if the buffer is truncated, has
    /// trailing bytes, or carries an unknown kind byte.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let row = Self::row_of(bytes)?;
        let mut trailer = &bytes[CELL_KEY_PREFIX_BYTES + row.len()..];
        let seq = trailer
            .read_u64::<LittleEndian>()
            .map_err(|e| SplitError::MalformedKey(e.to_string()))?;
        let kind = trailer
            .read_u8()
            .map_err(|e| SplitError::MalformedKey(e.to_string()))
            .and_then(CellKind::from_byte)?;
        Ok(Self {
            row: row.to_vec(),
            seq,
            kind,
        })
    }

    /// Borrows the row component of an encoded cell key without copying.
    ///
    /// Validates the framing (length prefix and trailer size) but not the
    /// kind byte.
    pub fn row_of(bytes: &[u8]) -> Result<&[u8]> {
        let mut prefix = bytes;
        let row_len = prefix.read_u32::<LittleEndian>().map_err(|_| {
            SplitError::MalformedKey(format!(
                "{} bytes is too short for the row length prefix",
                bytes.len()
            ))
        })? as usize;

        let body = &bytes[CELL_KEY_PREFIX_BYTES..];
        if row_len > body.len() {
            return Err(SplitError::MalformedKey(format!(
                "row length {} exceeds remaining {} bytes",
                row_len,
                body.len()
            )));
        }
        let trailer_len = body.len() - row_len;
        if trailer_len != CELL_KEY_TRAILER_BYTES {
            return Err(SplitError::MalformedKey(format!(
                "expected {} trailer bytes after the row, found {}",
                CELL_KEY_TRAILER_BYTES, trailer_len
            )));
        }
        Ok(&body[..row_len])
    }
}
