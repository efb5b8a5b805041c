//! Pairwise similarity scoring.
//!
//! A score is the average of per-attribute contributions, each on a 0-100
//! scale:
//! - Numeric attributes: 100 minus the difference as a percentage of the
//!   catalog-wide range
//! - Categorical attributes (artist, genre): depends on the strategy
//!
//! The title never contributes, but it is counted in the divisor.

use crate::models::{AttributeValues, NumericAttribute, Song, NUMERIC_ATTRIBUTE_COUNT};
use crate::ranges::PropertyRangeIndex;

// ============================================================================
// Score Constants
// ============================================================================

/// Every attribute of a song: the numeric ones plus genre, artist and title.
pub const TOTAL_ATTRIBUTE_COUNT: usize = NUMERIC_ATTRIBUTE_COUNT + 3;

/// Best possible contribution of a single attribute.
pub const MAX_CONTRIBUTION: f64 = 100.0;

// ============================================================================
// Scoring Strategy
// ============================================================================

/// How the categorical attributes (artist, genre) contribute to a score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ScoringStrategy {
    /// Artist and genre always contribute 100, so only numeric attributes
    /// affect ranking.
    #[default]
    Flat,
    /// Artist and genre contribute 100 when equal, 0 otherwise.
    Exact,
}

impl ScoringStrategy {
    fn categorical(self, a: &str, b: &str) -> f64 {
        match self {
            ScoringStrategy::Flat => MAX_CONTRIBUTION,
            ScoringStrategy::Exact if a == b => MAX_CONTRIBUTION,
            ScoringStrategy::Exact => 0.0,
        }
    }

    /// Similarity of two songs in [0, 100], given ranges computed from a
    /// catalog containing both.
    pub fn score(self, a: &Song, b: &Song, ranges: &PropertyRangeIndex) -> f64 {
        let mut sum = self.categorical(a.artist(), b.artist());
        sum += self.categorical(a.genre(), b.genre());

        for attr in NumericAttribute::ALL {
            sum += numeric_contribution(a.value(attr), b.value(attr), ranges.range(attr));
        }

        sum / (TOTAL_ATTRIBUTE_COUNT - 1) as f64
    }
}

// ============================================================================
// Attribute Contributions
// ============================================================================

/// Contribution of one numeric attribute.
/// A zero range means every song shares the value, which is a perfect match.
pub fn numeric_contribution(a: f64, b: f64, range: f64) -> f64 {
    if range == 0.0 {
        return MAX_CONTRIBUTION;
    }
    let percent_diff = (a - b).abs() / range * 100.0;
    MAX_CONTRIBUTION - percent_diff
}

/// Score with the default (flat) strategy.
pub fn score(a: &Song, b: &Song, ranges: &PropertyRangeIndex) -> f64 {
    ScoringStrategy::Flat.score(a, b, ranges)
}
