//! Graph-search LZ parser
//!
//! The parser picks a symbol sequence of minimal estimated size under the
//! cost oracle it is given. Candidate parses are kept as chains of
//! reference edges: an edge extends the best known parse at its position
//! and carries the full cost of reaching its end, with the remaining tail
//! priced as literals. Per offset only the cheapest finished edge
//! survives, so a later reference can reuse the previous offset through
//! the cheap repeated-offset path.

use crate::compression::lz_encoder::{LZEncoder, LZState};
use crate::compression::match_finder::MatchFinder;
use crate::containers::{EdgeHeap, OffsetMap};
use crate::entropy::Coder;
use crate::memory::{EdgeId, EdgePool};

/// One reference of a finished parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LZResultEdge {
    /// Position the reference is emitted at
    pub pos: u32,
    /// Back-reference offset
    pub offset: u32,
    /// Reference length
    pub length: u32,
}

/// A finished parse: the chosen references, in reverse stream order
#[derive(Debug, Clone, Default)]
pub struct LZParseResult {
    edges: Vec<LZResultEdge>,
}

impl LZParseResult {
    /// The chosen references, last one first
    pub fn edges(&self) -> &[LZResultEdge] {
        &self.edges
    }

    /// Re-encode the parse over `data` through the given encoder,
    /// filling the gaps between references with literals and closing the
    /// stream with the terminator. Returns the total coded size in
    /// fractional bits.
    pub fn encode<C: Coder>(&self, data: &[u8], encoder: &mut LZEncoder<C>) -> u64 {
        let mut size = 0;
        let mut pos = 0;
        let mut state = LZState::initial();
        for edge in self.edges.iter().rev() {
            while pos < edge.pos as usize {
                size += encoder.encode_literal(data[pos], &mut state);
                pos += 1;
            }
            size += encoder.encode_reference(edge.offset, edge.length, &mut state);
            pos += edge.length as usize;
        }
        while pos < data.len() {
            size += encoder.encode_literal(data[pos], &mut state);
            pos += 1;
        }
        size += encoder.finish(&state);
        size
    }
}

/// Which of the parser's two edge stores an operation addresses
#[derive(Debug, Clone, Copy)]
enum Store {
    /// Best already-processed edge per offset
    BestForOffset,
    /// Edges whose references end at the given future position
    ToPos(usize),
}

/// Optimal-parse searcher over one data block
pub struct LZParser<'a> {
    data: &'a [u8],
    length_margin: u32,
    skip_length: u32,

    /// Cumulative all-literals cost up to each position, refreshed per
    /// parse from the current cost oracle
    literal_size: Vec<u64>,
    edges_to_pos: Vec<OffsetMap>,
    best_for_offset: OffsetMap,
    root_edges: EdgeHeap,
    pool: EdgePool,
    best: Option<EdgeId>,
}

impl<'a> LZParser<'a> {
    /// Create a parser for `data` with the given search parameters and
    /// edge pool capacity
    pub fn new(data: &'a [u8], length_margin: u32, skip_length: u32, edge_capacity: usize) -> Self {
        let mut edges_to_pos = Vec::new();
        edges_to_pos.resize_with(data.len() + 1, OffsetMap::new);
        Self {
            data,
            length_margin,
            skip_length,
            literal_size: vec![0; data.len() + 1],
            edges_to_pos,
            best_for_offset: OffsetMap::new(),
            root_edges: EdgeHeap::new(),
            pool: EdgePool::new(edge_capacity),
            best: None,
        }
    }

    /// Edge pool statistics accumulated over all parses
    pub fn pool(&self) -> &EdgePool {
        &self.pool
    }

    /// Find a low-cost parse of the whole block under the cost oracle
    /// wrapped by `encoder`
    pub fn parse<C: Coder>(
        &mut self,
        encoder: &mut LZEncoder<C>,
        finder: &mut MatchFinder<'_>,
    ) -> LZParseResult {
        let n = self.data.len();

        self.best_for_offset.clear();
        self.root_edges.clear();
        self.pool.reset();

        // Price the all-literals parse; the tail cost from any position
        // falls out as a difference of prefix sums
        let mut size = 0;
        let mut literal_state = LZState::initial();
        for i in 0..n {
            self.literal_size[i] = size;
            size += encoder.encode_literal(self.data[i], &mut literal_state);
        }
        self.literal_size[n] = size;

        let root = self.pool.create(0, 0, 0, size, None);
        self.set_best(root);

        let mut pos = 1;
        while pos <= n {
            // Assimilate edges ending here
            let arriving: Vec<EdgeId> =
                self.edges_to_pos[pos].iter().map(|(_, edge)| edge).collect();
            self.edges_to_pos[pos].clear();
            for edge in arriving {
                let best = self.best.unwrap_or(root);
                let (edge_size, edge_offset) = {
                    let e = self.pool.get(edge);
                    (e.total_size, e.offset)
                };
                let (best_size, best_offset) = {
                    let b = self.pool.get(best);
                    (b.total_size, b.offset)
                };
                if edge_size < best_size || (edge_size == best_size && edge_offset < best_offset)
                {
                    self.set_best(edge);
                }
                self.root_edges.remove(&mut self.pool, edge);
                self.put_by_offset(Store::BestForOffset, edge);
            }

            // Open new edges for the matches at this position
            finder.begin_matching(pos);
            let mut max_match_length = 0;
            while let Some(candidate) = finder.next_match() {
                let offset = (pos - candidate.pos as usize) as u32;
                let match_length = (candidate.length as usize).min(n - pos);
                let min_length = (match_length.saturating_sub(self.length_margin as usize)).max(2);
                for length in min_length..=match_length {
                    let best = self.best.unwrap_or(root);
                    self.new_edge(encoder, best, pos, offset, length as u32);
                    // Also extend the finished edge that already uses this
                    // offset: its successor gets the repeated-offset path
                    if self.pool.get(self.best.unwrap_or(root)).offset != offset {
                        if let Some(previous) = self.best_for_offset.get(offset) {
                            debug_assert!(self.pool.get(previous).pos <= pos as u32);
                            self.new_edge(encoder, previous, pos, offset, length as u32);
                        }
                    }
                }
                max_match_length = max_match_length.max(match_length);
            }

            // Inside a very long match nothing can beat taking it whole:
            // drop all open lineages and fast-forward to its end
            if max_match_length >= self.skip_length as usize
                && !self.edges_to_pos[pos + max_match_length].is_empty()
            {
                self.root_edges.clear();
                let open: Vec<EdgeId> =
                    self.best_for_offset.iter().map(|(_, edge)| edge).collect();
                for edge in open {
                    self.pool.release(edge, false);
                }
                self.best_for_offset.clear();

                let target = pos + max_match_length;
                while pos < target - 1 {
                    pos += 1;
                    let dropped: Vec<EdgeId> =
                        self.edges_to_pos[pos].iter().map(|(_, edge)| edge).collect();
                    for edge in dropped {
                        self.pool.release(edge, false);
                    }
                    self.edges_to_pos[pos].clear();
                }
                self.set_best(root);
            }

            pos += 1;
        }

        // Only the winning chain stays; everything else is released
        self.root_edges.clear();
        let best = self.best.unwrap_or(root);
        // The winner usually still occupies its offset slot, but it may
        // have lost a cost tie there and live on through the best handle
        // alone
        let best_in_map =
            best != root && self.best_for_offset.get(self.pool.get(best).offset) == Some(best);
        let open: Vec<EdgeId> = self.best_for_offset.iter().map(|(_, edge)| edge).collect();
        for edge in open {
            if edge != best {
                self.pool.release(edge, false);
            }
        }
        self.best_for_offset.clear();

        let mut edges = Vec::new();
        let mut walk = best;
        while self.pool.get(walk).length > 0 {
            let e = self.pool.get(walk);
            edges.push(LZResultEdge {
                pos: e.pos,
                offset: e.offset,
                length: e.length,
            });
            walk = e.source.expect("non-root edge always has a source");
        }

        // Give up the map handle of the winner, the best handle, and the
        // parser's root handle
        if best_in_map {
            self.pool.release(best, false);
        }
        self.clear_best();
        self.pool.release(root, false);
        debug_assert_eq!(self.pool.edge_count(), 0);

        LZParseResult { edges }
    }

    fn set_best(&mut self, edge: EdgeId) {
        self.pool.add_ref(edge);
        if let Some(old) = self.best.replace(edge) {
            self.pool.release(old, false);
        }
    }

    fn clear_best(&mut self) {
        if let Some(old) = self.best.take() {
            self.pool.release(old, false);
        }
    }

    /// Cost a reference continuing `source` and store the resulting edge,
    /// evicting the globally worst open lineage while the pool is at
    /// capacity
    fn new_edge<C: Coder>(
        &mut self,
        encoder: &mut LZEncoder<C>,
        source: EdgeId,
        pos: usize,
        offset: u32,
        length: u32,
    ) {
        let n = self.data.len();
        let (source_offset, source_target, source_total) = {
            let s = self.pool.get(source);
            (s.offset, s.target(), s.total_size)
        };
        // A reference directly following a reference cannot keep its
        // offset; that continuation is already covered by a longer edge
        if offset == source_offset && pos as u32 == source_target {
            return;
        }

        let new_target = pos + length as usize;
        let mut state = LZState::construct(pos, pos as u32 == source_target, source_offset);

        let size_before = source_total - (self.literal_size[n] - self.literal_size[pos]);
        let edge_size = encoder.encode_reference(offset, length, &mut state);
        let size_after = self.literal_size[n] - self.literal_size[new_target];

        while self.pool.is_full() {
            if !self.clean_worst(pos, source) {
                break;
            }
        }

        let edge = self
            .pool
            .create(pos as u32, offset, length, size_before + edge_size + size_after, Some(source));
        self.put_by_offset(Store::ToPos(new_target), edge);
    }

    /// Evict the worst edge from the root heap, skipping the current best
    /// and the source of the edge being created. Returns false when the
    /// heap has nothing left to offer.
    fn clean_worst(&mut self, pos: usize, exclude: EdgeId) -> bool {
        let worst = match self.root_edges.remove_worst(&mut self.pool) {
            Some(edge) => edge,
            None => return false,
        };
        if Some(worst) == self.best || worst == exclude {
            return true;
        }
        let target = self.pool.target(worst) as usize;
        let offset = self.pool.get(worst).offset;
        let store = if target > pos {
            Store::ToPos(target)
        } else {
            Store::BestForOffset
        };
        if self.store(store).get(offset) == Some(worst) {
            self.store_mut(store).remove(offset);
            self.pool.release(worst, true);
        }
        true
    }

    fn store(&self, store: Store) -> &OffsetMap {
        match store {
            Store::BestForOffset => &self.best_for_offset,
            Store::ToPos(target) => &self.edges_to_pos[target],
        }
    }

    fn store_mut(&mut self, store: Store) -> &mut OffsetMap {
        match store {
            Store::BestForOffset => &mut self.best_for_offset,
            Store::ToPos(target) => &mut self.edges_to_pos[target],
        }
    }

    /// Keep `edge` as the entry for its offset if it is new or cheaper;
    /// the loser of a same-offset collision is released
    fn put_by_offset(&mut self, store: Store, edge: EdgeId) {
        let offset = self.pool.get(edge).offset;
        match self.store(store).get(offset) {
            None => {
                self.store_mut(store).insert(offset, edge);
                self.root_edges.insert(&mut self.pool, edge);
            }
            Some(existing) => {
                if self.pool.get(edge).total_size < self.pool.get(existing).total_size {
                    self.root_edges.remove(&mut self.pool, existing);
                    self.pool.release(existing, false);
                    self.store_mut(store).insert(offset, edge);
                    self.root_edges.insert(&mut self.pool, edge);
                } else {
                    self.pool.release(edge, false);
                }
            }
        }
    }
}
