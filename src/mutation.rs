//! Random point-mutation variants of a source sequence, each aligned back
//! against the original.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sequence::{clean_with_bounds, LengthBounds, Sequence, ALPHABET};
use crate::worker_pool::WorkerPool;
use crate::{AlignerError, Aligner, AlignmentMode, AlignmentResult};

pub const MAX_VARIANTS: usize = 50;
pub const DEFAULT_VARIANTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationKind {
    Substitution,
    Insertion,
    Deletion,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationKind::Substitution => "substitution",
            MutationKind::Insertion => "insertion",
            MutationKind::Deletion => "deletion",
        };
        f.write_str(name)
    }
}

impl FromStr for MutationKind {
    type Err = AlignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substitution" | "sub" => Ok(MutationKind::Substitution),
            "insertion" | "ins" => Ok(MutationKind::Insertion),
            "deletion" | "del" => Ok(MutationKind::Deletion),
            other => Err(AlignerError::InvalidParameter(format!(
                "unknown mutation kind '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    pub mutation_kind: MutationKind,
    /// Fraction of the source length to mutate, in `[0, 1]`.
    pub mutation_rate: f64,
    pub variants: usize,
    pub mode: AlignmentMode,
}

impl MutationRequest {
    pub fn new(mutation_kind: MutationKind, mutation_rate: f64, mode: AlignmentMode) -> Self {
        Self {
            mutation_kind,
            mutation_rate,
            variants: DEFAULT_VARIANTS,
            mode,
        }
    }

    pub fn with_variants(mut self, variants: usize) -> Self {
        self.variants = variants;
        self
    }

    fn validate(&self) -> Result<(), AlignerError> {
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(AlignerError::InvalidParameter(format!(
                "mutation rate {} outside [0, 1]",
                self.mutation_rate
            )));
        }
        if self.variants == 0 || self.variants > MAX_VARIANTS {
            return Err(AlignerError::InvalidParameter(format!(
                "variant count {} outside 1..={}",
                self.variants, MAX_VARIANTS
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationVariant {
    pub mutated_sequence: String,
    pub alignment: AlignmentResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationReport {
    pub original_sequence: String,
    pub mutation_kind: MutationKind,
    pub mutations_per_variant: usize,
    pub variants: Vec<MutationVariant>,
}

/// Edits applied per variant: `round(len * rate)`, at least one.
pub fn mutation_count(length: usize, rate: f64) -> usize {
    ((length as f64 * rate).round() as usize).max(1)
}

/// Apply `count` random edits of one kind. Each edit picks a uniform position
/// in the current string; editing stops early once the string is empty.
pub fn mutate<R: Rng + ?Sized>(original: &[u8], kind: MutationKind, count: usize, rng: &mut R) -> Vec<u8> {
    let mut seq = original.to_vec();
    for _ in 0..count {
        if seq.is_empty() {
            break;
        }
        let pos = rng.gen_range(0..seq.len());
        match kind {
            MutationKind::Substitution => {
                seq[pos] = random_base_other_than(seq[pos], rng);
            }
            MutationKind::Insertion => {
                let base = ALPHABET[rng.gen_range(0..ALPHABET.len())];
                seq.insert(pos, base);
            }
            MutationKind::Deletion => {
                seq.remove(pos);
            }
        }
    }
    seq
}

fn random_base_other_than<R: Rng + ?Sized>(old: u8, rng: &mut R) -> u8 {
    let others: Vec<u8> = ALPHABET.iter().copied().filter(|&b| b != old).collect();
    others[rng.gen_range(0..others.len())]
}

pub struct MutationSimulator {
    aligner: Aligner,
    bounds: LengthBounds,
}

impl Default for MutationSimulator {
    fn default() -> Self {
        Self::new(Aligner::default())
    }
}

impl MutationSimulator {
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

    /// Generate and align variants sequentially.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        source: &str,
        request: &MutationRequest,
        rng: &mut R,
    ) -> Result<MutationReport, AlignerError> {
        let (original, n, mutated) = self.prepare(source, request, rng)?;
        let aligner = self.aligner.with_alignment_mode(request.mode);

        let variants = mutated
            .into_iter()
            .map(|m| {
                let alignment = match &m {
                    Some(seq) => aligner.align_sequences(&original, seq),
                    None => AlignmentResult::empty(request.mode),
                };
                to_variant(m, alignment)
            })
            .collect();

        Ok(report(original, request.mutation_kind, n, variants))
    }

    /// Same as [`simulate`](Self::simulate) but aligns variants on a pool.
    /// The RNG is consumed on the calling thread, so results match the
    /// sequential run for the same seed.
    pub fn simulate_parallel<R: Rng + ?Sized>(
        &self,
        source: &str,
        request: &MutationRequest,
        rng: &mut R,
        pool: &mut WorkerPool,
    ) -> Result<MutationReport, AlignerError> {
        let (original, n, mutated) = self.prepare(source, request, rng)?;
        let aligner = self.aligner.with_alignment_mode(request.mode);
        let original = Arc::new(original);

        let pairs: Vec<_> = mutated
            .iter()
            .flatten()
            .map(|seq| (Arc::clone(&original), Arc::new(seq.clone())))
            .collect();
        let mut aligned = pool.align_all(&aligner, pairs)?.into_iter();

        let variants = mutated
            .into_iter()
            .map(|m| {
                let alignment = match m {
                    Some(_) => aligned.next().unwrap_or_else(|| AlignmentResult::empty(request.mode)),
                    None => AlignmentResult::empty(request.mode),
                };
                to_variant(m, alignment)
            })
            .collect();

        let original = Arc::try_unwrap(original).unwrap_or_else(|shared| (*shared).clone());
        Ok(report(original, request.mutation_kind, n, variants))
    }

    /// Clean the source and draw every variant. A variant whose bases were all
    /// deleted is `None`.
    fn prepare<R: Rng + ?Sized>(
        &self,
        source: &str,
        request: &MutationRequest,
        rng: &mut R,
    ) -> Result<(Sequence, usize, Vec<Option<Sequence>>), AlignerError> {
        request.validate()?;
        let original = clean_with_bounds(source, self.bounds)?;
        let n = mutation_count(original.len(), request.mutation_rate);
        log::info!(
            "simulating {} {} variants of a {} bp sequence ({} edits each)",
            request.variants,
            request.mutation_kind,
            original.len(),
            n
        );

        let mut mutated = Vec::with_capacity(request.variants);
        for _ in 0..request.variants {
            let bytes = mutate(original.as_bytes(), request.mutation_kind, n, rng);
            let text = String::from_utf8_lossy(&bytes);
            // Insertions may push past the stored-sequence ceiling
            let variant = if bytes.is_empty() {
                None
            } else {
                Some(clean_with_bounds(&text, LengthBounds::new(1, usize::MAX)?)?)
            };
            mutated.push(variant);
        }
        Ok((original, n, mutated))
    }
}

fn to_variant(mutated: Option<Sequence>, alignment: AlignmentResult) -> MutationVariant {
    MutationVariant {
        mutated_sequence: mutated.map(Sequence::into_string).unwrap_or_default(),
        alignment,
    }
}

fn report(original: Sequence, kind: MutationKind, n: usize, variants: Vec<MutationVariant>) -> MutationReport {
    MutationReport {
        original_sequence: original.into_string(),
        mutation_kind: kind,
        mutations_per_variant: n,
        variants,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SOURCE: &str = "ATCGATCGGCTAGCTAGGCTTACG";

    #[test]
    fn test_mutation_count() {
        assert_eq!(mutation_count(100, 0.05), 5);
        assert_eq!(mutation_count(10, 0.0), 1);
        assert_eq!(mutation_count(10, 0.25), 3);
        assert_eq!(mutation_count(7, 1.0), 7);
    }

    #[test]
    fn test_substitution_keeps_length_and_changes_bases() {
        let mut rng = StdRng::seed_from_u64(7);
        let out = mutate(SOURCE.as_bytes(), MutationKind::Substitution, 1, &mut rng);
        assert_eq!(out.len(), SOURCE.len());
        let diffs = out.iter().zip(SOURCE.as_bytes()).filter(|(a, b)| a != b).count();
        assert_eq!(diffs, 1);
    }

    #[test]
    fn test_insertion_and_deletion_lengths() {
        let mut rng = StdRng::seed_from_u64(11);
        let ins = mutate(SOURCE.as_bytes(), MutationKind::Insertion, 4, &mut rng);
        assert_eq!(ins.len(), SOURCE.len() + 4);
        assert!(ins.iter().all(|b| ALPHABET.contains(b)));

        let del = mutate(SOURCE.as_bytes(), MutationKind::Deletion, 4, &mut rng);
        assert_eq!(del.len(), SOURCE.len() - 4);
    }

    #[test]
    fn test_deletion_stops_when_empty() {
        let mut rng = StdRng::seed_from_u64(3);
        let out = mutate(b"ATCGA", MutationKind::Deletion, 10, &mut rng);
        assert!(out.is_empty());
    }

    #[test]
    fn test_simulation_is_reproducible() {
        let sim = MutationSimulator::default();
        let request = MutationRequest::new(MutationKind::Substitution, 0.1, AlignmentMode::Global).with_variants(4);

        let a = sim.simulate(SOURCE, &request, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = sim.simulate(SOURCE, &request, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.variants.len(), 4);
        assert_eq!(a.mutations_per_variant, 2);
        for v in &a.variants {
            assert_eq!(v.mutated_sequence.len(), SOURCE.len());
            assert_eq!(v.alignment.aligned_seq1.len(), v.alignment.aligned_seq2.len());
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sim = MutationSimulator::default();
        let request = MutationRequest::new(MutationKind::Insertion, 0.2, AlignmentMode::Local).with_variants(6);
        let mut pool = WorkerPool::new(3, 2).unwrap();

        let seq = sim.simulate(SOURCE, &request, &mut StdRng::seed_from_u64(9)).unwrap();
        let par = sim
            .simulate_parallel(SOURCE, &request, &mut StdRng::seed_from_u64(9), &mut pool)
            .unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_fully_deleted_variant_has_empty_alignment() {
        let sim = MutationSimulator::default();
        let request = MutationRequest::new(MutationKind::Deletion, 1.0, AlignmentMode::Global).with_variants(1);
        let report = sim.simulate("ATCGA", &request, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(report.variants[0].mutated_sequence, "");
        assert!(report.variants[0].alignment.is_empty());
        assert_eq!(report.variants[0].alignment.score, 0);
    }

    #[test]
    fn test_request_validation() {
        let sim = MutationSimulator::default();
        let mut rng = StdRng::seed_from_u64(0);

        let bad_rate = MutationRequest::new(MutationKind::Deletion, 1.5, AlignmentMode::Global);
        assert!(matches!(
            sim.simulate(SOURCE, &bad_rate, &mut rng),
            Err(AlignerError::InvalidParameter(_))
        ));

        let bad_variants = MutationRequest::new(MutationKind::Deletion, 0.1, AlignmentMode::Global).with_variants(51);
        assert!(matches!(
            sim.simulate(SOURCE, &bad_variants, &mut rng),
            Err(AlignerError::InvalidParameter(_))
        ));

        let ok = MutationRequest::new(MutationKind::Deletion, 0.1, AlignmentMode::Global);
        assert!(matches!(
            sim.simulate("ATCG", &ok, &mut rng),
            Err(AlignerError::SequenceTooShort { .. })
        ));
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("SUB".parse::<MutationKind>().unwrap(), MutationKind::Substitution);
        assert_eq!("deletion".parse::<MutationKind>().unwrap(), MutationKind::Deletion);
        assert!("swap".parse::<MutationKind>().is_err());
    }
}
