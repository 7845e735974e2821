//! Configuration loaded from `dna_aligner.toml`, with CLI overrides applied
//! on top by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::mutation::DEFAULT_VARIANTS;
use crate::sequence::LengthBounds;
use crate::similarity::{DEFAULT_DATABASE, DEFAULT_MAX_RESULTS};
use crate::{AlignerError, Aligner, AlignmentMode, AlignmentParams, ScoringScheme};
use crate::{DNA_GAP, DNA_MATCH, DNA_MISMATCH, MAX_SEQUENCE_SIZE, MIN_STORED_SEQUENCE_SIZE};

pub const DEFAULT_CONFIG_FILE: &str = "dna_aligner.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AlignerConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub workers: WorkerConfig,
    #[serde(default)]
    pub mutation: MutationConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_match")]
    pub match_score: i32,

    #[serde(default = "default_mismatch")]
    pub mismatch: i32,

    /// Linear penalty added per gap column
    #[serde(default = "default_gap")]
    pub gap: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Longest sequence accepted for direct alignment
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Shortest sequence accepted from a sequence store
    #[serde(default = "default_min_stored_length")]
    pub min_stored_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Jobs allowed to wait for a free worker
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    #[serde(default = "default_variants")]
    pub variants: usize,

    #[serde(default = "default_mode")]
    pub mode: AlignmentMode,

    /// Fixed RNG seed; unset means seeded from entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_search_mode")]
    pub mode: AlignmentMode,

    #[serde(default = "default_database")]
    pub database: String,
}

fn default_match() -> i32 { DNA_MATCH }
fn default_mismatch() -> i32 { DNA_MISMATCH }
fn default_gap() -> i32 { DNA_GAP }
fn default_max_length() -> usize { MAX_SEQUENCE_SIZE }
fn default_min_stored_length() -> usize { MIN_STORED_SEQUENCE_SIZE }
fn default_threads() -> usize { num_cpus::get() }
fn default_queue_depth() -> usize { default_threads() * 2 }
fn default_variants() -> usize { DEFAULT_VARIANTS }
fn default_mode() -> AlignmentMode { AlignmentMode::Global }
fn default_search_mode() -> AlignmentMode { AlignmentMode::Local }
fn default_max_results() -> usize { DEFAULT_MAX_RESULTS }
fn default_database() -> String { DEFAULT_DATABASE.to_string() }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            match_score: default_match(),
            mismatch: default_mismatch(),
            gap: default_gap(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            min_stored_length: default_min_stored_length(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            queue_depth: default_queue_depth(),
        }
    }
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            variants: default_variants(),
            mode: default_mode(),
            seed: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            mode: default_search_mode(),
            database: default_database(),
        }
    }
}

impl AlignerConfig {
    /// Load from `config_path`, else `dna_aligner.toml` in the working
    /// directory, else defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self, AlignerError> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, AlignerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AlignerError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| AlignerError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self, AlignerError> {
        toml::from_str(content).map_err(|e| AlignerError::Config(format!("TOML parsing error: {}", e)))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), AlignerError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AlignerError::Config(format!("TOML serialization error: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn example_toml() -> Result<String, AlignerError> {
        toml::to_string_pretty(&Self::default())
            .map_err(|e| AlignerError::Config(format!("TOML serialization error: {}", e)))
    }

    pub fn validate(&self) -> Result<(), AlignerError> {
        self.direct_bounds()?;
        self.stored_bounds()?;
        self.validate_scoring()?;
        if self.workers.threads == 0 {
            return Err(AlignerError::Config("workers.threads must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Every DP cell is a sum of at most `2 * max_length` scoring terms, so
    /// that bound must fit in an `i32`.
    fn validate_scoring(&self) -> Result<(), AlignerError> {
        let ScoringConfig { match_score, mismatch, gap } = self.scoring;
        if gap > 0 {
            return Err(AlignerError::Config(format!("scoring.gap must not be positive, got {}", gap)));
        }
        if mismatch > match_score {
            return Err(AlignerError::Config(format!(
                "scoring.mismatch ({}) must not exceed scoring.match_score ({})",
                mismatch, match_score
            )));
        }

        let largest = match_score
            .unsigned_abs()
            .max(mismatch.unsigned_abs())
            .max(gap.unsigned_abs()) as u64;
        let fits = (self.limits.max_length as u64)
            .checked_mul(2)
            .and_then(|terms| terms.checked_mul(largest))
            .map_or(false, |bound| bound <= i32::MAX as u64);
        if !fits {
            return Err(AlignerError::Config(format!(
                "scoring values up to {} overflow alignment scores at limits.max_length = {}",
                largest, self.limits.max_length
            )));
        }
        Ok(())
    }

    pub fn scheme(&self) -> ScoringScheme {
        ScoringScheme::new(self.scoring.match_score, self.scoring.mismatch, self.scoring.gap)
    }

    pub fn direct_bounds(&self) -> Result<LengthBounds, AlignerError> {
        LengthBounds::new(1, self.limits.max_length)
            .map_err(|e| AlignerError::Config(e.to_string()))
    }

    pub fn stored_bounds(&self) -> Result<LengthBounds, AlignerError> {
        LengthBounds::new(self.limits.min_stored_length, self.limits.max_length)
            .map_err(|e| AlignerError::Config(e.to_string()))
    }

    /// Aligner for direct requests in the given mode.
    pub fn aligner(&self, mode: AlignmentMode) -> Result<Aligner, AlignerError> {
        Ok(Aligner::new(AlignmentParams::new(mode, self.scheme())).with_bounds(self.direct_bounds()?))
    }
}
