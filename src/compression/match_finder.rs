//! Suffix-array based match finder
//!
//! For each query position the finder walks outward from the position's
//! rank in the suffix array, clamping a running length by the LCP gaps it
//! crosses. This enumerates earlier occurrences in order of decreasing
//! match length. Same-length candidates are buffered and pruned down to
//! the ones closest behind the query position.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::algorithms::{LcpArray, SuffixArray};

/// An earlier occurrence usable as a back-reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Start of the earlier occurrence
    pub pos: u32,
    /// Number of matching bytes
    pub length: u32,
}

/// Enumerates back-reference candidates for successive positions of one
/// block
pub struct MatchFinder<'a> {
    data: &'a [u8],
    min_length: u32,
    match_patience: u32,
    max_same_length: usize,

    suffix_array: SuffixArray,
    lcp: LcpArray,

    current_pos: u32,
    min_pos: u32,

    left_index: usize,
    left_length: u32,
    right_index: usize,
    right_length: u32,
    current_length: u32,

    /// Keep-K pruning buffer over candidate positions; smallest on top so
    /// a closer candidate can displace it
    match_buffer: BinaryHeap<Reverse<u32>>,
    /// Pruned same-length batch, sorted ascending; served from the back
    batch: Vec<u32>,
}

impl<'a> MatchFinder<'a> {
    /// Build the suffix structures for `data` and return a finder
    pub fn new(data: &'a [u8], min_length: u32, match_patience: u32, max_same_length: usize) -> Self {
        let suffix_array = SuffixArray::new(data);
        let lcp = LcpArray::new(data, &suffix_array);
        Self {
            data,
            min_length,
            match_patience,
            max_same_length,
            suffix_array,
            lcp,
            current_pos: 0,
            min_pos: 0,
            left_index: 0,
            left_length: 0,
            right_index: 0,
            right_length: 0,
            current_length: 0,
            match_buffer: BinaryHeap::new(),
            batch: Vec::new(),
        }
    }

    /// Forget per-pass matching state
    pub fn reset(&mut self) {
        self.match_buffer.clear();
        self.batch.clear();
    }

    /// Start enumerating matches for the given position
    pub fn begin_matching(&mut self, pos: usize) {
        debug_assert!(self.match_buffer.is_empty() && self.batch.is_empty());
        self.current_pos = pos as u32;
        self.min_pos = 0;

        let rank = self.suffix_array.rank()[pos] as usize;
        let remaining = (self.data.len() - pos) as u32;

        self.left_index = rank;
        self.left_length = remaining;
        self.extend_left();
        self.right_index = rank;
        self.right_length = remaining;
        self.extend_right();
    }

    fn extend_left(&mut self) {
        let sa = self.suffix_array.as_slice();
        let lcp = self.lcp.as_slice();
        let mut iterations = 0;
        while self.left_length >= self.min_length {
            self.left_index -= 1;
            self.left_length = self.left_length.min(lcp[self.left_index]);
            let pos = sa[self.left_index];
            if pos < self.current_pos && pos >= self.min_pos {
                break;
            }
            iterations += 1;
            if iterations > self.match_patience {
                self.left_length = 0;
                break;
            }
        }
    }

    fn extend_right(&mut self) {
        let sa = self.suffix_array.as_slice();
        let lcp = self.lcp.as_slice();
        let mut iterations = 0;
        loop {
            self.right_length = self.right_length.min(lcp[self.right_index]);
            if self.right_length < self.min_length {
                break;
            }
            self.right_index += 1;
            let pos = sa[self.right_index];
            if pos < self.current_pos && pos >= self.min_pos {
                break;
            }
            iterations += 1;
            if iterations > self.match_patience {
                self.right_length = 0;
                break;
            }
        }
    }

    fn next_length(&self) -> u32 {
        self.left_length.max(self.right_length)
    }

    /// Yield the next candidate, or `None` when no match of at least the
    /// minimum length remains. Lengths are non-increasing across one
    /// position's enumeration; candidates of equal length arrive in
    /// decreasing position order.
    pub fn next_match(&mut self) -> Option<Match> {
        if self.batch.is_empty() {
            self.current_length = self.next_length();
            if self.current_length < self.min_length {
                return None;
            }
            let mut new_min_pos = self.min_pos;
            loop {
                let match_pos = if self.left_length > self.right_length {
                    let pos = self.suffix_array.as_slice()[self.left_index];
                    self.extend_left();
                    pos
                } else {
                    let pos = self.suffix_array.as_slice()[self.right_index];
                    self.extend_right();
                    pos
                };
                new_min_pos = new_min_pos.max(match_pos);
                if self.match_buffer.len() < self.max_same_length {
                    self.match_buffer.push(Reverse(match_pos));
                } else {
                    if match_pos > self.match_buffer.peek().map(|r| r.0).unwrap_or(0) {
                        self.match_buffer.pop();
                        self.match_buffer.push(Reverse(match_pos));
                    }
                    if let Some(&Reverse(top)) = self.match_buffer.peek() {
                        self.min_pos = top;
                    }
                }
                if self.next_length() != self.current_length {
                    break;
                }
            }
            self.min_pos = new_min_pos;

            debug_assert!(!self.match_buffer.is_empty());
            self.batch.clear();
            while let Some(Reverse(pos)) = self.match_buffer.pop() {
                self.batch.push(pos);
            }
        }

        let pos = self.batch.pop()?;
        debug_assert!(pos < self.current_pos);
        Some(Match {
            pos,
            length: self.current_length,
        })
    }
}
