use serde::{Deserialize, Serialize};

use crate::alignment_mode::AlignmentMode;
use crate::scoring::{AlignmentStats, Position, GAP};

/// Per-cell traceback tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Direction {
    Diagonal,
    Up,
    Left,
    #[default]
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TracebackOperation {
    Match,
    Mismatch,
    /// Residue present only in the second sequence.
    Insertion,
    /// Residue present only in the first sequence.
    Deletion,
}

impl TracebackOperation {
    fn cigar_symbol(&self) -> char {
        match self {
            TracebackOperation::Match => '=',
            TracebackOperation::Mismatch => 'X',
            TracebackOperation::Insertion => 'I',
            TracebackOperation::Deletion => 'D',
        }
    }
}

/// Score and direction grid of `(len_a + 1) x (len_b + 1)` cells, stored
/// row-major in two flat buffers. Row and column 0 are the empty prefixes.
pub struct DpMatrix {
    scores: Vec<i32>,
    directions: Vec<Direction>,
    rows: usize,
    cols: usize,
}

impl DpMatrix {
    pub fn new(len_a: usize, len_b: usize) -> Self {
        let rows = len_a + 1;
        let cols = len_b + 1;
        Self {
            scores: vec![0; rows * cols],
            directions: vec![Direction::Stop; rows * cols],
            rows,
            cols,
        }
    }

    /// Bytes held by a matrix for inputs of the given lengths.
    pub fn estimated_bytes(len_a: usize, len_b: usize) -> usize {
        let cells = (len_a + 1).saturating_mul(len_b + 1);
        cells.saturating_mul(std::mem::size_of::<i32>() + std::mem::size_of::<Direction>())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, score: i32, direction: Direction) {
        let idx = self.offset(row, col);
        self.scores[idx] = score;
        self.directions[idx] = direction;
    }

    #[inline]
    pub fn score(&self, row: usize, col: usize) -> i32 {
        self.scores[self.offset(row, col)]
    }

    #[inline]
    pub fn direction(&self, row: usize, col: usize) -> Direction {
        self.directions[self.offset(row, col)]
    }
}

/// Aligned pair recovered from a filled matrix, in left-to-right order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracedPath {
    pub aligned_a: Vec<u8>,
    pub aligned_b: Vec<u8>,
    pub start: Position,
    pub end: Position,
}

pub struct Traceback<'a> {
    matrix: &'a DpMatrix,
    seq1: &'a [u8],
    seq2: &'a [u8],
}

impl<'a> Traceback<'a> {
    pub fn new(matrix: &'a DpMatrix, seq1: &'a [u8], seq2: &'a [u8]) -> Self {
        debug_assert_eq!(matrix.rows(), seq1.len() + 1);
        debug_assert_eq!(matrix.cols(), seq2.len() + 1);
        Self { matrix, seq1, seq2 }
    }

    /// Walk back from `end`. Global paths run to the origin; local paths stop
    /// at the first zero-valued or `Stop` cell.
    pub fn reconstruct_alignment(&self, end: Position, mode: AlignmentMode) -> TracedPath {
        let mut aligned_a = Vec::with_capacity(end.i + end.j);
        let mut aligned_b = Vec::with_capacity(end.i + end.j);
        let (mut i, mut j) = (end.i, end.j);

        loop {
            let finished = match mode {
                AlignmentMode::Global => i == 0 && j == 0,
                AlignmentMode::Local => i == 0 || j == 0 || self.matrix.score(i, j) <= 0,
            };
            if finished {
                break;
            }

            match self.matrix.direction(i, j) {
                Direction::Diagonal => {
                    aligned_a.push(self.seq1[i - 1]);
                    aligned_b.push(self.seq2[j - 1]);
                    i -= 1;
                    j -= 1;
                }
                Direction::Up => {
                    aligned_a.push(self.seq1[i - 1]);
                    aligned_b.push(GAP);
                    i -= 1;
                }
                Direction::Left => {
                    aligned_a.push(GAP);
                    aligned_b.push(self.seq2[j - 1]);
                    j -= 1;
                }
                Direction::Stop => break,
            }
        }

        // Built backwards
        aligned_a.reverse();
        aligned_b.reverse();

        TracedPath {
            aligned_a,
            aligned_b,
            start: Position::new(i, j),
            end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentResult {
    pub mode: AlignmentMode,
    pub aligned_seq1: String,
    pub aligned_seq2: String,
    pub score: i32,
    pub identity_percent: f64,
    pub stats: AlignmentStats,
    /// Half-open span consumed in each input: `start` inclusive, `end` exclusive.
    pub start_position: Position,
    pub end_position: Position,
}

impl AlignmentResult {
    /// The degenerate local result: nothing aligned, score 0, identity 0.
    pub fn empty(mode: AlignmentMode) -> Self {
        Self {
            mode,
            aligned_seq1: String::new(),
            aligned_seq2: String::new(),
            score: 0,
            identity_percent: 0.0,
            stats: AlignmentStats::default(),
            start_position: Position::default(),
            end_position: Position::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.aligned_seq1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aligned_seq1.is_empty()
    }

    pub fn operations(&self) -> Vec<TracebackOperation> {
        self.aligned_seq1
            .bytes()
            .zip(self.aligned_seq2.bytes())
            .filter(|&(a, b)| !(a == GAP && b == GAP))
            .map(|(a, b)| {
                if a == GAP {
                    TracebackOperation::Insertion
                } else if b == GAP {
                    TracebackOperation::Deletion
                } else if a == b {
                    TracebackOperation::Match
                } else {
                    TracebackOperation::Mismatch
                }
            })
            .collect()
    }

    /// Run-length CIGAR using `=`, `X`, `I`, `D`.
    pub fn cigar(&self) -> String {
        let mut cigar = String::new();
        let mut run: Option<(TracebackOperation, usize)> = None;
        for op in self.operations() {
            run = match run {
                Some((prev, n)) if prev == op => Some((prev, n + 1)),
                Some((prev, n)) => {
                    cigar.push_str(&format!("{}{}", n, prev.cigar_symbol()));
                    Some((op, 1))
                }
                None => Some((op, 1)),
            };
        }
        if let Some((prev, n)) = run {
            cigar.push_str(&format!("{}{}", n, prev.cigar_symbol()));
        }
        cigar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_is_row_major() {
        let mut m = DpMatrix::new(2, 3);
        assert_eq!(m.rows(), 3);
        assert_eq!(m.cols(), 4);
        m.set(1, 2, 7, Direction::Up);
        assert_eq!(m.score(1, 2), 7);
        assert_eq!(m.direction(1, 2), Direction::Up);
        assert_eq!(m.direction(2, 1), Direction::Stop);
        assert_eq!(m.scores[1 * 4 + 2], 7);
    }

    #[test]
    fn test_estimated_bytes() {
        assert_eq!(DpMatrix::estimated_bytes(0, 0), 5);
        assert_eq!(DpMatrix::estimated_bytes(9, 9), 500);
    }

    #[test]
    fn test_global_traceback_follows_boundary() {
        // a = "A", b = "" : one Up step from (1, 0)
        let mut m = DpMatrix::new(1, 0);
        m.set(1, 0, -2, Direction::Up);
        let path = Traceback::new(&m, b"A", b"").reconstruct_alignment(Position::new(1, 0), AlignmentMode::Global);
        assert_eq!(path.aligned_a, b"A");
        assert_eq!(path.aligned_b, b"-");
        assert_eq!(path.start, Position::new(0, 0));
    }

    #[test]
    fn test_local_traceback_stops_at_zero() {
        let mut m = DpMatrix::new(2, 2);
        m.set(1, 1, 0, Direction::Stop);
        m.set(2, 2, 1, Direction::Diagonal);
        let path = Traceback::new(&m, b"CA", b"GA").reconstruct_alignment(Position::new(2, 2), AlignmentMode::Local);
        assert_eq!(path.aligned_a, b"A");
        assert_eq!(path.aligned_b, b"A");
        assert_eq!(path.start, Position::new(1, 1));
    }

    #[test]
    fn test_cigar_and_operations() {
        let mut result = AlignmentResult::empty(AlignmentMode::Global);
        result.aligned_seq1 = "AAC-GT".to_string();
        result.aligned_seq2 = "AAGTG-".to_string();
        assert_eq!(
            result.operations(),
            vec![
                TracebackOperation::Match,
                TracebackOperation::Match,
                TracebackOperation::Mismatch,
                TracebackOperation::Insertion,
                TracebackOperation::Match,
                TracebackOperation::Deletion,
            ]
        );
        assert_eq!(result.cigar(), "2=1X1I1=1D");
        assert_eq!(AlignmentResult::empty(AlignmentMode::Local).cigar(), "");
    }
}
