use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::scoring::ScoringScheme;
use crate::AlignerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlignmentMode {
    #[default]
    Global, // Needleman-Wunsch
    Local,  // Smith-Waterman
}

impl AlignmentMode {
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            AlignmentMode::Global => "Needleman-Wunsch",
            AlignmentMode::Local => "Smith-Waterman",
        }
    }
}

impl fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentMode::Global => write!(f, "global"),
            AlignmentMode::Local => write!(f, "local"),
        }
    }
}

impl FromStr for AlignmentMode {
    type Err = AlignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "global" | "nw" | "needleman-wunsch" => Ok(AlignmentMode::Global),
            "local" | "sw" | "smith-waterman" => Ok(AlignmentMode::Local),
            other => Err(AlignerError::InvalidParameter(format!(
                "unknown alignment mode '{}' (expected global or local)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlignmentParams {
    pub mode: AlignmentMode,
    pub scheme: ScoringScheme,
}

impl AlignmentParams {
    pub fn new(mode: AlignmentMode, scheme: ScoringScheme) -> Self {
        Self { mode, scheme }
    }
}
