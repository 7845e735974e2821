use serde::{Deserialize, Serialize};

use crate::{DNA_GAP, DNA_MATCH, DNA_MISMATCH};

/// Gap marker written into aligned strings.
pub const GAP: u8 = b'-';

/// Linear-gap scoring constants. All three values are added to a cell score,
/// so penalties are stored as negative numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringScheme {
    pub match_score: i32,
    pub mismatch: i32,
    pub gap: i32,
}

impl Default for ScoringScheme {
    fn default() -> Self {
        Self {
            match_score: DNA_MATCH,
            mismatch: DNA_MISMATCH,
            gap: DNA_GAP,
        }
    }
}

impl ScoringScheme {
    pub fn new(match_score: i32, mismatch: i32, gap: i32) -> Self {
        Self { match_score, mismatch, gap }
    }

    #[inline]
    pub fn substitution(&self, a: u8, b: u8) -> i32 {
        if a == b {
            self.match_score
        } else {
            self.mismatch
        }
    }
}

/// Matrix coordinate, 0-based residue offsets into each input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub i: usize,
    pub j: usize,
}

impl Position {
    pub fn new(i: usize, j: usize) -> Self {
        Self { i, j }
    }
}

/// Column counts over a finished aligned pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlignmentStats {
    pub matches: u32,
    pub mismatches: u32,
    pub gaps: u32,
    /// Columns where at least one side is a residue.
    pub comparable: u32,
}

impl AlignmentStats {
    pub fn from_aligned(aligned_a: &[u8], aligned_b: &[u8]) -> Self {
        let mut stats = AlignmentStats::default();
        for (&c1, &c2) in aligned_a.iter().zip(aligned_b) {
            if c1 == GAP && c2 == GAP {
                continue;
            }
            stats.comparable += 1;
            if c1 == GAP || c2 == GAP {
                stats.gaps += 1;
            } else if c1 == c2 {
                stats.matches += 1;
            } else {
                stats.mismatches += 1;
            }
        }
        stats
    }

    pub fn identity_percent(&self) -> f64 {
        if self.comparable == 0 {
            0.0
        } else {
            self.matches as f64 * 100.0 / self.comparable as f64
        }
    }
}

/// Percent identity of an aligned pair in `[0, 100]`.
///
/// Gap-gap columns are ignored; a gap facing a residue counts as a
/// comparable, non-matching column. An alignment with no comparable
/// columns (including the empty one) has identity `0.0`.
pub fn identity(aligned_a: &str, aligned_b: &str) -> f64 {
    AlignmentStats::from_aligned(aligned_a.as_bytes(), aligned_b.as_bytes()).identity_percent()
}
