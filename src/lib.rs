use thiserror::Error;

pub mod alignment_mode;
pub mod config;
pub mod engine;
pub mod fasta;
pub mod mutation;
pub mod report;
pub mod scoring;
pub mod sequence;
pub mod similarity;
pub mod traceback;
pub mod worker_pool;

pub use alignment_mode::{AlignmentMode, AlignmentParams};
pub use config::AlignerConfig;
pub use mutation::{MutationKind, MutationReport, MutationRequest, MutationSimulator, MutationVariant};
pub use scoring::{identity, AlignmentStats, Position, ScoringScheme};
pub use sequence::{clean, clean_with_bounds, LengthBounds, Sequence};
pub use similarity::{Candidate, CandidateSource, InMemorySource, SearchReport, SearchRequest, SimilarityHit, SimilarityRanker};
pub use traceback::{AlignmentResult, Direction, TracebackOperation};
pub use worker_pool::WorkerPool;

pub const MAX_SEQUENCE_SIZE: usize = 10_000;
pub const MIN_STORED_SEQUENCE_SIZE: usize = 5;

// DNA scoring parameters
pub const DNA_MATCH: i32 = 1;
pub const DNA_MISMATCH: i32 = -1;
pub const DNA_GAP: i32 = -2;

/// Matrices above this size are logged as a warning before allocation.
pub const LARGE_MATRIX_BYTES: usize = 256 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum AlignerError {
    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),
    #[error("Sequence too long: {length} (max {max})")]
    SequenceTooLong { length: usize, max: usize },
    #[error("Sequence too short: {length} (min {min})")]
    SequenceTooShort { length: usize, min: usize },
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Sequence source error: {0}")]
    Source(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AlignerError {
    /// Whether the caller can fix this by resubmitting corrected input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AlignerError::InvalidSequence(_)
                | AlignerError::SequenceTooLong { .. }
                | AlignerError::SequenceTooShort { .. }
        )
    }
}

/// Validate, align and score a sequence pair.
///
/// Holds only immutable parameters, so one `Aligner` can be shared across
/// threads and reused for any number of calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aligner {
    params: AlignmentParams,
    bounds: LengthBounds,
}

impl Aligner {
    pub fn new(params: AlignmentParams) -> Self {
        Self {
            params,
            bounds: LengthBounds::default(),
        }
    }

    pub fn with_alignment_mode(mut self, mode: AlignmentMode) -> Self {
        self.params.mode = mode;
        self
    }

    pub fn with_scoring(mut self, scheme: ScoringScheme) -> Self {
        self.params.scheme = scheme;
        self
    }

    pub fn with_bounds(mut self, bounds: LengthBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn mode(&self) -> AlignmentMode {
        self.params.mode
    }

    pub fn bounds(&self) -> LengthBounds {
        self.bounds
    }

    /// Clean both inputs, then align them. Only validation can fail.
    pub fn align(&self, seq1: &str, seq2: &str) -> Result<AlignmentResult, AlignerError> {
        let a = clean_with_bounds(seq1, self.bounds)?;
        let b = clean_with_bounds(seq2, self.bounds)?;
        Ok(self.align_sequences(&a, &b))
    }

    /// Align two already-validated sequences.
    pub fn align_sequences(&self, a: &Sequence, b: &Sequence) -> AlignmentResult {
        let bytes = traceback::DpMatrix::estimated_bytes(a.len(), b.len());
        if bytes > LARGE_MATRIX_BYTES {
            log::warn!(
                "aligning {} x {} needs about {} MiB of matrix memory",
                a.len(),
                b.len(),
                bytes / (1024 * 1024)
            );
        }
        log::debug!(
            "{} alignment of {} x {} residues",
            self.params.mode.algorithm_name(),
            a.len(),
            b.len()
        );

        let result = match self.params.mode {
            AlignmentMode::Global => engine::global_align(a, b, &self.params.scheme),
            AlignmentMode::Local => engine::local_align(a, b, &self.params.scheme),
        };

        log::debug!(
            "score {} identity {:.2}% over {} columns",
            result.score,
            result.identity_percent,
            result.len()
        );
        result
    }
}

/// Align with the default scoring scheme and direct-alignment bounds.
pub fn align(seq1: &str, seq2: &str, mode: AlignmentMode) -> Result<AlignmentResult, AlignerError> {
    Aligner::default().with_alignment_mode(mode).align(seq1, seq2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_scenarios() {
        let r = align("ATCG", "ATCG", AlignmentMode::Global).unwrap();
        assert_eq!((r.aligned_seq1.as_str(), r.aligned_seq2.as_str()), ("ATCG", "ATCG"));
        assert_eq!(r.score, 4);
        assert_eq!(r.identity_percent, 100.0);

        let r = align("ATCG", "ATGG", AlignmentMode::Global).unwrap();
        assert_eq!(r.score, 2);
        assert_eq!(r.identity_percent, 75.0);

        let r = align("AAATTT", "TTT", AlignmentMode::Local).unwrap();
        assert_eq!((r.aligned_seq1.as_str(), r.aligned_seq2.as_str()), ("TTT", "TTT"));
        assert_eq!(r.score, 3);
        assert_eq!(r.identity_percent, 100.0);
    }

    #[test]
    fn test_align_cleans_input() {
        let r = align(" atc g\n", "ATCG", AlignmentMode::Global).unwrap();
        assert_eq!(r.aligned_seq1, "ATCG");
        assert_eq!(r.score, 4);
    }

    #[test]
    fn test_align_validation_failures() {
        let err = align("ATCX", "ATCG", AlignmentMode::Global).unwrap_err();
        assert!(matches!(err, AlignerError::InvalidSequence(_)));
        assert!(err.is_validation());

        let long = "G".repeat(MAX_SEQUENCE_SIZE + 1);
        let err = align("ATCG", &long, AlignmentMode::Local).unwrap_err();
        assert!(matches!(err, AlignerError::SequenceTooLong { .. }));
        assert!(err.is_validation());
    }

    #[test]
    fn test_custom_scoring() {
        let aligner = Aligner::default()
            .with_scoring(ScoringScheme::new(2, -1, -3))
            .with_alignment_mode(AlignmentMode::Local);
        assert_eq!(aligner.mode(), AlignmentMode::Local);
        let r = aligner.align("ATCG", "ATCG").unwrap();
        assert_eq!(r.score, 8);
    }

    #[test]
    fn test_custom_bounds() {
        let aligner = Aligner::default().with_bounds(LengthBounds::STORED);
        assert_eq!(aligner.bounds(), LengthBounds::STORED);
        assert_eq!(aligner.mode(), AlignmentMode::Global);
        let err = aligner.align("ATC", "ATCGA").unwrap_err();
        assert!(matches!(err, AlignerError::SequenceTooShort { length: 3, min: 5 }));
    }

    #[test]
    fn test_error_display() {
        let err = AlignerError::SequenceTooLong { length: 10_001, max: 10_000 };
        assert_eq!(err.to_string(), "Sequence too long: 10001 (max 10000)");
        assert!(!AlignerError::Config("x".into()).is_validation());
    }
}
