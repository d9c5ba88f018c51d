//! # Shrinkler: ratio-first LZ compression
//!
//! This crate implements the compression side of the Shrinkler bitstream
//! format: an LZ77-style scheme layered over a binary range coder with
//! probabilistic context modeling. It trades time for ratio, running
//! multiple refinement passes and exploring many factorizations per
//! position before committing to a parse.
//!
//! ## Key pieces
//!
//! - **Suffix-array match finder**: SA-IS construction plus LCP-guided
//!   candidate enumeration in decreasing length order
//! - **Graph-search parser**: a bounded pool of reference edges tracks the
//!   cheapest way to reach each position per offset
//! - **Entropy back-ends**: counting, size-measuring and range coders
//!   behind one coding contract, so parse costs and output bits agree
//! - **Iterative driver**: parse statistics feed the next pass's cost
//!   oracle; the best pass wins
//!
//! ## Quick start
//!
//! ```rust
//! use shrinkler::{compress, PackConfig};
//!
//! let data = b"a very compressible compressible compressible block";
//! let packed = compress(data, &PackConfig::default()).unwrap();
//! assert!(packed.len() < data.len() + 24);
//! ```
//!
//! Presets `1..=9` trade compression time for ratio;
//! [`PackConfig::preset`] and the individual fields expose the search
//! parameters of the legacy tool.

#![warn(missing_docs)]

pub mod algorithms;
pub mod compression;
pub mod config;
pub mod containers;
pub mod entropy;
pub mod error;
pub mod memory;

// Re-export core types
pub use compression::{compress, pack_data, DataHeader, PackResult};
pub use config::PackConfig;
pub use error::{Result, ShrinklerError};
