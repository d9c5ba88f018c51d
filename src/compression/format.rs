//! Container framing for compressed raw data
//!
//! A packed block is framed by a 24-byte header: the magic, the format
//! version, and big-endian size and flag words describing the stream.

use crate::error::{Result, ShrinklerError};

/// Magic bytes opening every container
pub const MAGIC: [u8; 4] = *b"Shri";

/// Major format version written and accepted
pub const MAJOR_VERSION: u8 = 4;

/// Minor format version written
pub const MINOR_VERSION: u8 = 7;

/// Header flag bit: the stream was coded with parity contexts
pub const FLAG_PARITY_CONTEXT: u32 = 1 << 0;

/// Size of the serialized header in bytes
pub const HEADER_SIZE: usize = 24;

/// The header size field excludes the magic, version bytes and itself
const HEADER_SIZE_FIELD: u16 = (HEADER_SIZE - 8) as u16;

/// Container header of a compressed data block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    /// Size of the range-coded stream in bytes
    pub compressed_size: u32,
    /// Size of the original block in bytes
    pub uncompressed_size: u32,
    /// Extra buffer space needed for in-place decompression (always 0 for
    /// raw data)
    pub safety_margin: u32,
    /// Stream option flags
    pub flags: u32,
}

impl DataHeader {
    /// Header describing a freshly packed stream
    pub fn new(compressed_size: u32, uncompressed_size: u32, parity_context: bool) -> Self {
        Self {
            compressed_size,
            uncompressed_size,
            safety_margin: 0,
            flags: if parity_context {
                FLAG_PARITY_CONTEXT
            } else {
                0
            },
        }
    }

    /// Whether the stream was coded with parity contexts
    pub fn parity_context(&self) -> bool {
        self.flags & FLAG_PARITY_CONTEXT != 0
    }

    /// Append the serialized header to `out`
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        out.push(MAJOR_VERSION);
        out.push(MINOR_VERSION);
        out.extend_from_slice(&HEADER_SIZE_FIELD.to_be_bytes());
        out.extend_from_slice(&self.compressed_size.to_be_bytes());
        out.extend_from_slice(&self.uncompressed_size.to_be_bytes());
        out.extend_from_slice(&self.safety_margin.to_be_bytes());
        out.extend_from_slice(&self.flags.to_be_bytes());
    }

    /// Parse and validate a header from the start of `bytes`
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ShrinklerError::invalid_data("header truncated"));
        }
        if bytes[0..4] != MAGIC {
            return Err(ShrinklerError::invalid_data("bad magic"));
        }
        if bytes[4] != MAJOR_VERSION {
            return Err(ShrinklerError::invalid_data(format!(
                "unsupported major version {}",
                bytes[4]
            )));
        }
        let word = |at: usize| u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let header_size = u16::from_be_bytes([bytes[6], bytes[7]]);
        if header_size != HEADER_SIZE_FIELD {
            return Err(ShrinklerError::invalid_data(format!(
                "unexpected header size {}",
                header_size
            )));
        }
        Ok(Self {
            compressed_size: word(8),
            uncompressed_size: word(12),
            safety_margin: word(16),
            flags: word(20),
        })
    }
}
