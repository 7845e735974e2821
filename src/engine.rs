//! Dynamic-programming fill passes for global and local alignment.
//!
//! Both passes break score ties in the order diagonal, up, left. Local
//! alignment additionally clamps at zero and tags clamped cells `Stop`.

use crate::alignment_mode::AlignmentMode;
use crate::scoring::{AlignmentStats, Position, ScoringScheme};
use crate::sequence::Sequence;
use crate::traceback::{AlignmentResult, Direction, DpMatrix, TracedPath, Traceback};

#[inline]
fn best_of(diag: i32, up: i32, left: i32) -> (i32, Direction) {
    let mut best = (diag, Direction::Diagonal);
    if up > best.0 {
        best = (up, Direction::Up);
    }
    if left > best.0 {
        best = (left, Direction::Left);
    }
    best
}

/// Needleman-Wunsch over the full length of both inputs.
pub fn global_align(a: &Sequence, b: &Sequence, scheme: &ScoringScheme) -> AlignmentResult {
    let (sa, sb) = (a.as_bytes(), b.as_bytes());
    let (n, m) = (sa.len(), sb.len());
    let matrix = fill_global(sa, sb, scheme);

    let path = Traceback::new(&matrix, sa, sb).reconstruct_alignment(Position::new(n, m), AlignmentMode::Global);
    finish(AlignmentMode::Global, path, matrix.score(n, m))
}

pub(crate) fn fill_global(sa: &[u8], sb: &[u8], scheme: &ScoringScheme) -> DpMatrix {
    let (n, m) = (sa.len(), sb.len());
    let mut matrix = DpMatrix::new(n, m);

    for i in 1..=n {
        matrix.set(i, 0, i as i32 * scheme.gap, Direction::Up);
    }
    for j in 1..=m {
        matrix.set(0, j, j as i32 * scheme.gap, Direction::Left);
    }

    for i in 1..=n {
        let ai = sa[i - 1];
        for j in 1..=m {
            let diag = matrix.score(i - 1, j - 1) + scheme.substitution(ai, sb[j - 1]);
            let up = matrix.score(i - 1, j) + scheme.gap;
            let left = matrix.score(i, j - 1) + scheme.gap;
            let (score, direction) = best_of(diag, up, left);
            matrix.set(i, j, score, direction);
        }
    }

    log::trace!("global fill done: {}x{} cells, final score {}", n + 1, m + 1, matrix.score(n, m));
    matrix
}

/// Smith-Waterman: best-scoring pair of contiguous subregions.
///
/// When no cell rises above zero the result is empty with score 0.
pub fn local_align(a: &Sequence, b: &Sequence, scheme: &ScoringScheme) -> AlignmentResult {
    let (sa, sb) = (a.as_bytes(), b.as_bytes());
    let (matrix, best_score, best_pos) = fill_local(sa, sb, scheme);

    if best_score <= 0 {
        log::debug!("local alignment found no positive-scoring cell");
        return AlignmentResult::empty(AlignmentMode::Local);
    }

    let path = Traceback::new(&matrix, sa, sb).reconstruct_alignment(best_pos, AlignmentMode::Local);
    finish(AlignmentMode::Local, path, best_score)
}

pub(crate) fn fill_local(sa: &[u8], sb: &[u8], scheme: &ScoringScheme) -> (DpMatrix, i32, Position) {
    let (n, m) = (sa.len(), sb.len());
    // Row and column 0 stay at score 0 / Stop
    let mut matrix = DpMatrix::new(n, m);
    let mut best_score = 0;
    let mut best_pos = Position::default();

    for i in 1..=n {
        let ai = sa[i - 1];
        for j in 1..=m {
            let diag = matrix.score(i - 1, j - 1) + scheme.substitution(ai, sb[j - 1]);
            let up = matrix.score(i - 1, j) + scheme.gap;
            let left = matrix.score(i, j - 1) + scheme.gap;
            let (score, direction) = match best_of(diag, up, left) {
                (score, direction) if score > 0 => (score, direction),
                _ => (0, Direction::Stop),
            };
            matrix.set(i, j, score, direction);

            // Strict comparison keeps the first maximum in row-major order
            if score > best_score {
                best_score = score;
                best_pos = Position::new(i, j);
            }
        }
    }

    log::trace!("local fill done: best score {} at ({}, {})", best_score, best_pos.i, best_pos.j);
    (matrix, best_score, best_pos)
}

fn finish(mode: AlignmentMode, path: TracedPath, score: i32) -> AlignmentResult {
    let stats = AlignmentStats::from_aligned(&path.aligned_a, &path.aligned_b);
    AlignmentResult {
        mode,
        // Aligned bytes are residues from validated input or the ASCII gap marker
        aligned_seq1: String::from_utf8_lossy(&path.aligned_a).into_owned(),
        aligned_seq2: String::from_utf8_lossy(&path.aligned_b).into_owned(),
        score,
        identity_percent: stats.identity_percent(),
        stats,
        start_position: path.start,
        end_position: path.end,
    }
}
