//! Static cost oracle derived from gathered frequencies
//!
//! The size-measuring coder converts the counts of a [`CountingCoder`]
//! into fixed per-context bit costs using Shannon coding with count-1
//! smoothing. Coding through it never produces output and never changes
//! state, which makes it a pure cost oracle for the parse search.

use super::{Coder, CountingCoder, BIT_PRECISION};

/// Upper clamp for a single bit cost, in fractional bits
const MAX_BIT_SIZE: u32 = 12 << BIT_PRECISION;
/// Lower clamp for a single bit cost, in fractional bits
const MIN_BIT_SIZE: u32 = 2;
/// Largest payload bit count the number-size cache expands to
const MAX_CACHED_DATA_BITS: usize = 30;

/// Shannon cost of a bit seen `count` times out of `total`, rounded to
/// fractional bits and clamped
fn size_for_count(count: u32, total: u32) -> u16 {
    let size = (0.5 + (total as f64 / count as f64).log2() * (1u64 << BIT_PRECISION) as f64)
        .floor() as i64;
    size.clamp(MIN_BIT_SIZE as i64, MAX_BIT_SIZE as i64) as u16
}

/// Cached sizes of `encode_number` results, indexed by context group and
/// then by the number itself
struct NumberSizeCache {
    context_offset: usize,
    groups: Vec<Vec<u16>>,
}

/// Entropy back-end that reports precomputed bit costs
pub struct SizeMeasuringCoder {
    context_sizes: Vec<[u16; 2]>,
    number_cache: Option<NumberSizeCache>,
}

impl SizeMeasuringCoder {
    /// Build a cost oracle from the frequencies gathered by a counting
    /// coder. Each count is smoothed by one before conversion, so unseen
    /// bits stay representable.
    pub fn new(counting_coder: &CountingCoder) -> Self {
        let context_sizes = (0..counting_coder.num_contexts())
            .map(|context| {
                let [zeros, ones] = counting_coder.counts(context);
                let count0 = 1 + zeros;
                let count1 = 1 + ones;
                let total = count0 + count1;
                [
                    size_for_count(count0, total),
                    size_for_count(count1, total),
                ]
            })
            .collect();
        Self {
            context_sizes,
            number_cache: None,
        }
    }

    fn bit_size(&self, context: usize, bit: u32) -> u16 {
        // Contexts beyond the tracked range cost a flat one bit; the
        // number cache touches banks the symbol encoding never uses
        self.context_sizes
            .get(context)
            .map(|sizes| sizes[bit as usize])
            .unwrap_or(1 << BIT_PRECISION)
    }

    /// Precompute `encode_number` sizes for all values up to `max_number`
    /// in `n_groups` context banks starting at `context_offset`.
    ///
    /// This is a pure lookup acceleration; coding results are identical
    /// with or without the cache.
    pub fn set_number_contexts(
        &mut self,
        context_offset: usize,
        n_groups: usize,
        max_number: u32,
    ) {
        let groups = (0..n_groups)
            .map(|group| self.build_group(context_offset + (group << 8), max_number))
            .collect();
        self.number_cache = Some(NumberSizeCache {
            context_offset,
            groups,
        });
    }

    /// Expand the size table for one context bank. The cost of a number is
    /// derived from the cost of the same number with its second-most
    /// significant bit removed: the old stop bit turns into a continuation
    /// bit, a new stop bit and the new payload bit are added.
    fn build_group(&self, base_context: usize, max_number: u32) -> Vec<u16> {
        let code = |context: usize, bit: u32| self.bit_size(context, bit) as i64;
        // Entries are indexed by the number; values below 2 are never coded
        let limit = (max_number as usize).saturating_add(1).max(4);

        let mut sizes: Vec<u16> = Vec::with_capacity(limit.min(4096));
        sizes.push(0);
        sizes.push(0);
        sizes.push((code(base_context + 2, 0) + code(base_context + 1, 0)) as u16);
        sizes.push((code(base_context + 2, 0) + code(base_context + 1, 1)) as u16);

        let mut prev_base = 2;
        for data_bits in 2..MAX_CACHED_DATA_BITS {
            if sizes.len() >= limit {
                break;
            }
            let base = sizes.len();
            debug_assert_eq!(base, 1 << data_bits);
            let base_sizedif = -code(base_context + data_bits * 2 - 2, 0)
                + code(base_context + data_bits * 2 - 2, 1)
                + code(base_context + data_bits * 2, 0);
            'halves: for msb in 0..=1u32 {
                let sizedif = base_sizedif + code(base_context + data_bits * 2 - 1, msb);
                for tail in 0..1usize << (data_bits - 1) {
                    if sizes.len() >= limit {
                        break 'halves;
                    }
                    sizes.push((sizes[prev_base + tail] as i64 + sizedif) as u16);
                }
            }
            prev_base = base;
        }
        sizes
    }
}

impl Coder for SizeMeasuringCoder {
    fn code(&mut self, context: usize, bit: u32) -> u64 {
        self.bit_size(context, bit) as u64
    }

    fn encode_number(&mut self, base_context: usize, number: u32) -> u64 {
        debug_assert!(number >= 2);
        if let Some(cache) = &self.number_cache {
            if let Some(group) = base_context
                .checked_sub(cache.context_offset)
                .map(|delta| delta >> 8)
                .and_then(|index| cache.groups.get(index))
            {
                if let Some(&size) = group.get(number as usize) {
                    return size as u64;
                }
            }
        }

        // Fall back to coding bit by bit through the cost table
        let mut size = 0;
        let mut i = 0;
        while (4u64 << i) <= number as u64 {
            size += self.code(base_context + i * 2 + 2, 1);
            i += 1;
        }
        size += self.code(base_context + i * 2 + 2, 0);
        loop {
            let bit = (number >> i) & 1;
            size += self.code(base_context + i * 2 + 1, bit);
            if i == 0 {
                break;
            }
            i -= 1;
        }
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_for_count_uniform() {
        // Equal counts cost one bit either way
        assert_eq!(size_for_count(1, 2), 1 << BIT_PRECISION);
        assert_eq!(size_for_count(8, 16), 1 << BIT_PRECISION);
    }

    #[test]
    fn test_size_for_count_clamps() {
        // A certain bit still costs the minimum
        assert_eq!(size_for_count(1_000_000, 1_000_001), MIN_BIT_SIZE as u16);
        // A very rare bit is capped at 12 bits
        assert_eq!(size_for_count(1, 1 << 20), MAX_BIT_SIZE as u16);
    }

    #[test]
    fn test_fresh_counts_give_uniform_costs() {
        let counting = CountingCoder::new(16);
        let mut coder = SizeMeasuringCoder::new(&counting);
        // With no statistics both bit values cost one bit
        assert_eq!(coder.code(0, 0), 1u64 << BIT_PRECISION);
        assert_eq!(coder.code(0, 1), 1u64 << BIT_PRECISION);
    }

    #[test]
    fn test_skewed_counts_bias_costs() {
        let mut counting = CountingCoder::new(4);
        for _ in 0..30 {
            counting.code(2, 1);
        }
        let mut coder = SizeMeasuringCoder::new(&counting);
        assert!(coder.code(2, 1) < coder.code(2, 0));
    }

    #[test]
    fn test_coding_is_stateless() {
        let counting = CountingCoder::new(8);
        let mut coder = SizeMeasuringCoder::new(&counting);
        let first = coder.code(3, 1);
        for _ in 0..100 {
            coder.code(3, 1);
        }
        assert_eq!(coder.code(3, 1), first);
    }

    #[test]
    fn test_number_cache_matches_direct_encoding() {
        let mut counting = CountingCoder::new(1025);
        // Skew a few of the number contexts so the test is not trivially
        // uniform
        for _ in 0..10 {
            counting.code(515, 1);
            counting.code(517, 0);
            counting.code(770, 1);
        }
        let mut plain = SizeMeasuringCoder::new(&counting);
        let mut cached = SizeMeasuringCoder::new(&counting);
        cached.set_number_contexts(513, 16, 2000);

        for base in [513, 769] {
            for n in 2..2100u32 {
                assert_eq!(
                    plain.encode_number(base, n),
                    cached.encode_number(base, n),
                    "size mismatch for number {} in base {}",
                    n,
                    base
                );
            }
        }
    }
}
