//! Rank stored sequences by similarity to a query.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::sequence::{clean_with_bounds, LengthBounds, Sequence};
use crate::worker_pool::WorkerPool;
use crate::{AlignerError, Aligner, AlignmentMode, AlignmentResult};

pub const MAX_RESULTS_LIMIT: usize = 500;
pub const DEFAULT_MAX_RESULTS: usize = 100;
pub const DEFAULT_DATABASE: &str = "nr";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub classification: Option<String>,
    pub sequence: String,
}

impl Candidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            classification: None,
            sequence: sequence.into(),
        }
    }

    pub fn with_classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = Some(classification.into());
        self
    }
}

/// Anything that can list the candidate sequences of a search.
pub trait CandidateSource {
    fn candidates(&self) -> Result<Vec<Candidate>, AlignerError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    candidates: Vec<Candidate>,
}

impl InMemorySource {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }
}

impl CandidateSource for InMemorySource {
    fn candidates(&self) -> Result<Vec<Candidate>, AlignerError> {
        Ok(self.candidates.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub mode: AlignmentMode,
    pub max_results: usize,
    /// Label echoed in the report; not used for ranking.
    pub database: String,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            mode: AlignmentMode::Local,
            max_results: DEFAULT_MAX_RESULTS,
            database: DEFAULT_DATABASE.to_string(),
        }
    }
}

impl SearchRequest {
    pub fn new(mode: AlignmentMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    fn validate(&self) -> Result<(), AlignerError> {
        if self.max_results == 0 || self.max_results > MAX_RESULTS_LIMIT {
            return Err(AlignerError::InvalidParameter(format!(
                "max results {} outside 1..={}",
                self.max_results, MAX_RESULTS_LIMIT
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityHit {
    pub target_id: String,
    pub target_name: String,
    pub target_classification: Option<String>,
    pub target_length: usize,
    pub similarity_percent: f64,
    pub score: i32,
    pub aligned_query: String,
    pub aligned_target: String,
    pub e_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    pub query_sequence: String,
    pub query_length: usize,
    pub database: String,
    pub mode: AlignmentMode,
    pub hits: Vec<SimilarityHit>,
}

/// Display-only E-value label. Not a statistical estimate.
pub fn e_value_label(score: i32) -> String {
    let v = (-(score.max(1) as f64) / 10.0).exp();
    let exp = ((-v.log10()) * 10.0).round().max(0.0) as i64;
    format!("1e-{}", exp)
}

pub struct SimilarityRanker {
    aligner: Aligner,
    bounds: LengthBounds,
}

impl Default for SimilarityRanker {
    fn default() -> Self {
        Self::new(Aligner::default())
    }
}

impl SimilarityRanker {
    /// The aligner's mode is replaced per request; its scoring is kept.
    pub fn new(aligner: Aligner) -> Self {
        Self {
            aligner,
            bounds: LengthBounds::STORED,
        }
    }

    pub fn with_bounds(mut self, bounds: LengthBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn search<S: CandidateSource + ?Sized>(
        &self,
        query: &str,
        source: &S,
        request: &SearchRequest,
    ) -> Result<SearchReport, AlignerError> {
        let (query, targets) = self.prepare(query, source, request)?;
        let aligner = self.aligner.with_alignment_mode(request.mode);
        let alignments = targets
            .iter()
            .map(|(_, seq)| aligner.align_sequences(&query, seq))
            .collect();
        Ok(self.rank(query, targets, alignments, request))
    }

    pub fn search_parallel<S: CandidateSource + ?Sized>(
        &self,
        query: &str,
        source: &S,
        request: &SearchRequest,
        pool: &mut WorkerPool,
    ) -> Result<SearchReport, AlignerError> {
        let (query, targets) = self.prepare(query, source, request)?;
        let aligner = self.aligner.with_alignment_mode(request.mode);
        let query = Arc::new(query);
        let pairs: Vec<_> = targets
            .iter()
            .map(|(_, seq)| (Arc::clone(&query), Arc::new(seq.clone())))
            .collect();
        let alignments = pool.align_all(&aligner, pairs)?;

        let query = Arc::try_unwrap(query).unwrap_or_else(|shared| (*shared).clone());
        Ok(self.rank(query, targets, alignments, request))
    }

    fn prepare<S: CandidateSource + ?Sized>(
        &self,
        query: &str,
        source: &S,
        request: &SearchRequest,
    ) -> Result<(Sequence, Vec<(Candidate, Sequence)>), AlignerError> {
        request.validate()?;
        let query = clean_with_bounds(query, self.bounds)?;

        let mut targets = Vec::new();
        for candidate in source.candidates()? {
            let seq = match clean_with_bounds(&candidate.sequence, self.bounds) {
                Ok(seq) => seq,
                Err(e) => {
                    log::warn!("skipping candidate {}: {}", candidate.id, e);
                    continue;
                }
            };
            if seq == query {
                log::debug!("skipping candidate {}: identical to query", candidate.id);
                continue;
            }
            targets.push((candidate, seq));
        }

        log::info!(
            "searching {} candidates with a {} bp query ({})",
            targets.len(),
            query.len(),
            request.mode.algorithm_name()
        );
        Ok((query, targets))
    }

    fn rank(
        &self,
        query: Sequence,
        targets: Vec<(Candidate, Sequence)>,
        alignments: Vec<AlignmentResult>,
        request: &SearchRequest,
    ) -> SearchReport {
        let mut hits: Vec<SimilarityHit> = targets
            .into_iter()
            .zip(alignments)
            .map(|((candidate, seq), ar)| SimilarityHit {
                target_id: candidate.id,
                target_name: candidate.name,
                target_classification: candidate.classification,
                target_length: seq.len(),
                similarity_percent: ar.identity_percent,
                score: ar.score,
                e_value: e_value_label(ar.score),
                aligned_query: ar.aligned_seq1,
                aligned_target: ar.aligned_seq2,
            })
            .collect();

        // Stable: equal keys keep source order
        hits.sort_by(|a, b| {
            b.similarity_percent
                .total_cmp(&a.similarity_percent)
                .then_with(|| b.score.cmp(&a.score))
        });
        hits.truncate(request.max_results);

        SearchReport {
            query_length: query.len(),
            query_sequence: query.into_string(),
            database: request.database.clone(),
            mode: request.mode,
            hits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemorySource {
        InMemorySource::new(vec![
            Candidate::new("1", "far", "TTTTTTTTTT"),
            Candidate::new("2", "same", "ACGTACGTAC"),
            Candidate::new("3", "close", "ACGTACGTTC").with_classification("bacteria"),
            Candidate::new("4", "bad", "ACGTNNNNAC"),
            Candidate::new("5", "short", "ACG"),
            Candidate::new("6", "closest", "acgtacgtac gg"),
        ])
    }

    #[test]
    fn test_search_ranks_and_filters() {
        let ranker = SimilarityRanker::default();
        let request = SearchRequest::new(AlignmentMode::Global);
        let report = ranker.search("ACGTACGTAC", &store(), &request).unwrap();

        let ids: Vec<&str> = report.hits.iter().map(|h| h.target_id.as_str()).collect();
        // identical, invalid and too-short candidates are dropped
        assert_eq!(ids, vec!["3", "6", "1"]);
        assert_eq!(report.query_length, 10);
        assert_eq!(report.database, "nr");
        assert_eq!(report.hits[0].target_classification.as_deref(), Some("bacteria"));
        assert_eq!(report.hits[0].similarity_percent, 90.0);
        assert_eq!(report.hits[1].target_length, 12);

        for pair in report.hits.windows(2) {
            assert!(pair[0].similarity_percent >= pair[1].similarity_percent);
        }
    }

    #[test]
    fn test_score_breaks_identity_ties() {
        let mut source = InMemorySource::default();
        source.push(Candidate::new("short", "s", "ACGTA"));
        source.push(Candidate::new("long", "l", "ACGTACGTAC"));
        let ranker = SimilarityRanker::default();
        let request = SearchRequest::new(AlignmentMode::Local);
        let report = ranker.search("ACGTACGTACGG", &source, &request).unwrap();

        assert_eq!(report.hits[0].similarity_percent, 100.0);
        assert_eq!(report.hits[1].similarity_percent, 100.0);
        assert_eq!(report.hits[0].target_id, "long");
        assert!(report.hits[0].score > report.hits[1].score);
    }

    #[test]
    fn test_max_results_truncates() {
        let ranker = SimilarityRanker::default();
        let request = SearchRequest::new(AlignmentMode::Global).with_max_results(1);
        let report = ranker.search("ACGTACGTAC", &store(), &request).unwrap();
        assert_eq!(report.hits.len(), 1);
        assert_eq!(report.hits[0].target_id, "3");
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let ranker = SimilarityRanker::default();
        let request = SearchRequest::new(AlignmentMode::Local).with_database("refseq");
        let mut pool = WorkerPool::new(2, 1).unwrap();

        let seq = ranker.search("ACGTACGTAC", &store(), &request).unwrap();
        let par = ranker.search_parallel("ACGTACGTAC", &store(), &request, &mut pool).unwrap();
        assert_eq!(seq, par);
        assert_eq!(par.database, "refseq");
    }

    #[test]
    fn test_invalid_query_and_request() {
        let ranker = SimilarityRanker::default();
        let request = SearchRequest::new(AlignmentMode::Global);
        assert!(matches!(
            ranker.search("ACGU", &store(), &request),
            Err(AlignerError::InvalidSequence(_))
        ));

        let request = SearchRequest::new(AlignmentMode::Global).with_max_results(0);
        assert!(matches!(
            ranker.search("ACGTACGTAC", &store(), &request),
            Err(AlignerError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_e_value_label() {
        // exponent works out to round(max(1, score) / ln 10)
        assert_eq!(e_value_label(-5), "1e-0");
        assert_eq!(e_value_label(10), "1e-4");
        assert_eq!(e_value_label(100), "1e-43");
    }
}
