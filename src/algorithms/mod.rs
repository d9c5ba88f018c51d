//! Algorithmic primitives for the compression pipeline
//!
//! This module provides the suffix-array machinery the match finder is
//! built on: linear-time SA-IS construction and LCP computation.

pub mod suffix_array;

pub use suffix_array::{LcpArray, SuffixArray};
