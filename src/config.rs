//! Compression parameters and presets
//!
//! All knobs that influence the parse search and the context model live in
//! [`PackConfig`]. The numeric presets `1..=9` scale the search effort the
//! same way the legacy command-line tool does; preset 3 is the default.

use crate::error::{Result, ShrinklerError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a compression run
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackConfig {
    /// Split literal and kind contexts on byte parity. Improves ratio on
    /// word-structured data; disable for byte-oriented data.
    pub parity_context: bool,
    /// Number of parse/statistics refinement passes
    pub iterations: u32,
    /// How many shorter-length variants of each match are tried
    pub length_margin: u32,
    /// Work cap per suffix-array extension side in the match finder
    pub match_patience: u32,
    /// How many same-length matches per position survive pruning
    pub max_same_length: u32,
    /// Match length above which the parser greedily skips ahead
    pub skip_length: u32,
    /// Capacity of the reference edge pool
    pub references: u32,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self::preset(3).expect("preset 3 is in range")
    }
}

impl PackConfig {
    /// Create a configuration from a numeric preset in `1..=9`.
    ///
    /// The preset scales the search-effort parameters multiplicatively:
    /// `iterations = p`, `length_margin = p`, `max_same_length = 10p`,
    /// `match_patience = 100p`, `skip_length = 1000p`. A preset outside
    /// `1..=9` is rejected with a configuration error.
    pub fn preset(preset: u32) -> Result<Self> {
        if !(1..=9).contains(&preset) {
            return Err(ShrinklerError::configuration("preset must be in 1..=9"));
        }
        Ok(Self {
            parity_context: true,
            iterations: preset,
            length_margin: preset,
            match_patience: 100 * preset,
            max_same_length: 10 * preset,
            skip_length: 1000 * preset,
            references: 100_000,
        })
    }

    /// Validate parameter ranges, returning a configuration error for the
    /// first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.iterations < 1 {
            return Err(ShrinklerError::configuration(
                "iterations must be at least 1",
            ));
        }
        if self.max_same_length < 1 {
            return Err(ShrinklerError::configuration(
                "max_same_length must be at least 1",
            ));
        }
        if self.skip_length < 2 {
            return Err(ShrinklerError::configuration(
                "skip_length must be at least 2",
            ));
        }
        if self.references < 1000 {
            return Err(ShrinklerError::configuration(
                "references must be at least 1000",
            ));
        }
        Ok(())
    }
}
