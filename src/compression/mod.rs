//! The compression pipeline
//!
//! Everything between raw bytes and the framed Shrinkler container lives
//! here: match finding, the graph-search parser, the LZ symbol encoding,
//! the iterative pack driver and the container format.

pub mod format;
pub mod lz_encoder;
pub mod match_finder;
pub mod pack;
pub mod parser;

pub use format::DataHeader;
pub use lz_encoder::{LZEncoder, LZState, NUM_CONTEXTS};
pub use match_finder::{Match, MatchFinder};
pub use pack::{pack_data, PackResult};
pub use parser::{LZParseResult, LZParser, LZResultEdge};

use log::debug;

use crate::config::PackConfig;
use crate::error::Result;

/// Compress a block into a complete container: header followed by the
/// range-coded stream
pub fn compress(data: &[u8], config: &PackConfig) -> Result<Vec<u8>> {
    let packed = pack_data(data, config)?;
    let header = DataHeader::new(
        packed.stream.len() as u32,
        data.len() as u32,
        config.parity_context,
    );
    let mut out = Vec::with_capacity(format::HEADER_SIZE + packed.stream.len());
    header.write_to(&mut out);
    out.extend_from_slice(&packed.stream);
    debug!(
        "compressed {} bytes into a {} byte container ({} header + {} stream)",
        data.len(),
        out.len(),
        format::HEADER_SIZE,
        packed.stream.len()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_frames_the_stream() {
        let data = b"framed framed framed framed";
        let out = compress(data, &PackConfig::default()).unwrap();
        let header = DataHeader::parse(&out).unwrap();
        assert_eq!(header.uncompressed_size as usize, data.len());
        assert_eq!(
            header.compressed_size as usize,
            out.len() - format::HEADER_SIZE
        );
        assert!(header.parity_context());
        assert_eq!(header.safety_margin, 0);
    }

    #[test]
    fn test_compress_respects_parity_flag() {
        let mut config = PackConfig::default();
        config.parity_context = false;
        let out = compress(b"some data", &config).unwrap();
        let header = DataHeader::parse(&out).unwrap();
        assert!(!header.parity_context());
    }
}
