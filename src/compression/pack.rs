//! Iterative pack driver
//!
//! Each pass re-parses the block against a cost oracle built from the
//! statistics of the previous passes, then measures the true range-coded
//! size of the new parse. The best parse seen is finally encoded for
//! real. Statistics are blended 3:1 across passes so one odd parse does
//! not destabilize the model.

use log::debug;

use crate::compression::lz_encoder::{
    LZEncoder, NUMBER_CONTEXT_OFFSET, NUM_CONTEXTS, NUM_NUMBER_CONTEXTS,
};
use crate::compression::match_finder::MatchFinder;
use crate::compression::parser::{LZParseResult, LZParser};
use crate::config::PackConfig;
use crate::entropy::{CountingCoder, RangeCoder, SizeMeasuringCoder, BIT_PRECISION};
use crate::error::Result;

/// Minimum reference length considered by the match finder
const MIN_MATCH_LENGTH: u32 = 2;

/// A packed block and the search statistics behind it
#[derive(Debug)]
pub struct PackResult {
    /// The range-coded stream (without container header)
    pub stream: Vec<u8>,
    /// Length of the original block
    pub uncompressed_size: usize,
    /// Range-coded size of the winning parse, in fractional bits
    pub real_size_bits: u64,
    /// Highest number of simultaneously live reference edges
    pub max_edge_count: usize,
    /// Highest number of reference edges evicted within one pass
    pub max_cleaned_edges: usize,
}

impl PackResult {
    /// Range-coded size of the winning parse in bytes, rounded up
    pub fn real_size_bytes(&self) -> u64 {
        self.real_size_bits.div_ceil(8u64 << BIT_PRECISION)
    }
}

/// Compress a block into a raw Shrinkler stream
pub fn pack_data(data: &[u8], config: &PackConfig) -> Result<PackResult> {
    config.validate()?;

    let mut finder = MatchFinder::new(
        data,
        MIN_MATCH_LENGTH,
        config.match_patience,
        config.max_same_length as usize,
    );
    let mut parser = LZParser::new(
        data,
        config.length_margin,
        config.skip_length,
        config.references as usize,
    );

    let mut counting = CountingCoder::new(NUM_CONTEXTS);
    let mut best_size = u64::MAX;
    let mut best_result: Option<LZParseResult> = None;

    for pass in 1..=config.iterations {
        let mut measurer = SizeMeasuringCoder::new(&counting);
        measurer.set_number_contexts(
            NUMBER_CONTEXT_OFFSET,
            NUM_NUMBER_CONTEXTS,
            data.len() as u32,
        );

        finder.reset();
        let mut parse_encoder = LZEncoder::new(measurer, config.parity_context);
        let result = parser.parse(&mut parse_encoder, &mut finder);

        // The oracle's estimate is optimistic; judge the parse by what an
        // actual range coder makes of it
        let mut measuring_encoder =
            LZEncoder::new(RangeCoder::new(NUM_CONTEXTS), config.parity_context);
        let real_size = result.encode(data, &mut measuring_encoder);

        debug!(
            "pass {}: {} references, real size {:.3} bytes",
            pass,
            result.edges().len(),
            real_size as f64 / (8 << BIT_PRECISION) as f64
        );

        // Gather this pass's symbol statistics and damp them into the
        // accumulated model
        let mut counting_encoder =
            LZEncoder::new(CountingCoder::new(NUM_CONTEXTS), config.parity_context);
        result.encode(data, &mut counting_encoder);
        counting = CountingCoder::merge(&counting, &counting_encoder.into_inner());

        if real_size < best_size {
            best_size = real_size;
            best_result = Some(result);
        }
    }

    // iterations >= 1 is enforced by validate, so a best result exists
    let best = best_result.expect("at least one pass ran");

    let mut output_encoder = LZEncoder::new(RangeCoder::new(NUM_CONTEXTS), config.parity_context);
    best.encode(data, &mut output_encoder);
    let mut output_coder = output_encoder.into_inner();
    output_coder.finish();

    let result = PackResult {
        stream: output_coder.into_bytes(),
        uncompressed_size: data.len(),
        real_size_bits: best_size,
        max_edge_count: parser.pool().max_edge_count(),
        max_cleaned_edges: parser.pool().max_cleaned_edges(),
    };
    debug!(
        "packed {} bytes into {} ({} references considered, {} discarded)",
        data.len(),
        result.stream.len(),
        result.max_edge_count,
        result.max_cleaned_edges
    );
    Ok(result)
}
