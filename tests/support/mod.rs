//! Shared integration test support: a reference bitstream decoder and
//! test data generators.
//!
//! The decoder is intentionally independent of the library's coder types;
//! it mirrors the published decompressor so a passing round-trip means
//! the produced stream is really Shrinkler-compatible.

/// Number of probability contexts used by the bitstream
const NUM_CONTEXTS: usize = 1025;

const ADJUST_SHIFT: u32 = 4;

const CONTEXT_GROUP_OFFSET: usize = 2;
const CONTEXT_GROUP_LENGTH: usize = 3;

/// Minimal range decoder over a byte stream, reading 32-bit big-endian
/// words and zero-extending past the end
struct RangeDecoder<'a> {
    contexts: Vec<u16>,
    intervalsize: u32,
    intervalvalue: u64,
    src: &'a [u8],
    offset: usize,
    bits_left: u32,
}

impl<'a> RangeDecoder<'a> {
    fn new(src: &'a [u8]) -> Self {
        let mut decoder = Self {
            contexts: vec![0x8000; NUM_CONTEXTS],
            intervalsize: 0x8000,
            intervalvalue: 0,
            src,
            offset: 0,
            bits_left: 1,
        };
        let first = decoder.next_word();
        decoder.intervalvalue = first << 31;
        decoder
    }

    fn next_word(&mut self) -> u64 {
        let mut word = 0u64;
        for _ in 0..4 {
            let byte = self.src.get(self.offset).copied().unwrap_or(0);
            word = (word << 8) | byte as u64;
            self.offset += 1;
        }
        word
    }

    fn decode_bit(&mut self, context_index: usize) -> u32 {
        while self.intervalsize < 0x8000 {
            if self.bits_left == 0 {
                let word = self.next_word();
                self.intervalvalue |= word;
                self.bits_left = 32;
            }
            self.bits_left -= 1;
            self.intervalsize <<= 1;
            self.intervalvalue <<= 1;
        }

        let prob = self.contexts[context_index] as u32;
        let value = (self.intervalvalue >> 48) as u32;
        let threshold = (self.intervalsize * prob) >> 16;

        if value >= threshold {
            self.intervalvalue -= (threshold as u64) << 48;
            self.intervalsize -= threshold;
            self.contexts[context_index] = (prob - (prob >> ADJUST_SHIFT)) as u16;
            0
        } else {
            self.intervalsize = threshold;
            self.contexts[context_index] =
                (prob + (0xffff >> ADJUST_SHIFT) - (prob >> ADJUST_SHIFT)) as u16;
            1
        }
    }

    fn decode_number(&mut self, base_context: usize) -> usize {
        let mut i = 0;
        while self.decode_bit(base_context + i * 2 + 2) == 1 {
            i += 1;
        }
        let mut number = 1;
        loop {
            let bit = self.decode_bit(base_context + i * 2 + 1) as usize;
            number = (number << 1) | bit;
            if i == 0 {
                break;
            }
            i -= 1;
        }
        number
    }
}

/// Decode a raw Shrinkler stream produced with the given parity setting.
///
/// `uncompressed_size` settles the one ambiguity of the format: an empty
/// block's stream opens with the terminator where a literal is otherwise
/// expected.
pub fn decompress(stream: &[u8], uncompressed_size: usize, parity_context: bool) -> Vec<u8> {
    let parity_mask = if parity_context { 1usize } else { 0 };
    let mut out: Vec<u8> = Vec::with_capacity(uncompressed_size);
    if uncompressed_size == 0 {
        return out;
    }

    let mut decoder = RangeDecoder::new(stream);
    let mut is_ref = false;
    let mut prev_was_ref = false;
    let mut offset = 0usize;

    loop {
        if is_ref {
            let mut repeated = false;
            if !prev_was_ref {
                repeated = decoder.decode_bit(0) == 1;
            }
            if !repeated {
                let field = decoder.decode_number(1 + (CONTEXT_GROUP_OFFSET << 8));
                assert!(field >= 2, "offset field below terminator value");
                offset = field - 2;
                if offset == 0 {
                    break;
                }
            }
            let length = decoder.decode_number(1 + (CONTEXT_GROUP_LENGTH << 8));
            prev_was_ref = true;
            assert!(offset <= out.len(), "reference reaches before block start");
            for _ in 0..length {
                let byte = out[out.len() - offset];
                out.push(byte);
            }
        } else {
            let parity = out.len() & parity_mask;
            let mut context = 1usize;
            for _ in 0..8 {
                let bit = decoder.decode_bit(1 + ((parity << 8) | context)) as usize;
                context = (context << 1) | bit;
            }
            out.push(context as u8);
            prev_was_ref = false;
        }

        assert!(
            out.len() <= uncompressed_size,
            "decoded past the expected size"
        );
        let parity = out.len() & parity_mask;
        is_ref = decoder.decode_bit(1 + (parity << 8)) == 1;
    }

    out
}

/// Decode a full container (header plus stream) and check the header's
/// description of the stream
pub fn decompress_container(packed: &[u8]) -> Vec<u8> {
    let header = shrinkler::DataHeader::parse(packed).unwrap();
    let stream = &packed[24..];
    assert_eq!(stream.len(), header.compressed_size as usize);
    decompress(
        stream,
        header.uncompressed_size as usize,
        header.parity_context(),
    )
}

/// Seeded pseudo-random bytes
pub fn random_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..len).map(|_| rng.u8(..)).collect()
}

/// A few kilobytes of realistic C source text
pub fn source_corpus() -> Vec<u8> {
    let fragment = br#"static int flush_buffer(struct writer *w, size_t want) {
    if (w->fill + want <= w->capacity)
        return 0;
    size_t written = fwrite(w->data, 1, w->fill, w->file);
    if (written != w->fill) {
        report_error(w, "short write: %zu of %zu", written, w->fill);
        return -1;
    }
    w->total += w->fill;
    w->fill = 0;
    return 0;
}

"#;
    let mut corpus = Vec::new();
    while corpus.len() < 4096 {
        corpus.extend_from_slice(fragment);
    }
    corpus.truncate(4096);
    corpus
}
