//! Normalisation and validation of raw nucleotide text.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::{AlignerError, MAX_SEQUENCE_SIZE, MIN_STORED_SEQUENCE_SIZE};

pub const ALPHABET: [u8; 4] = [b'A', b'T', b'C', b'G'];

/// Inclusive length bounds applied after cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl LengthBounds {
    /// Bounds for sequences submitted directly for alignment.
    pub const DIRECT: LengthBounds = LengthBounds { min: 1, max: MAX_SEQUENCE_SIZE };
    /// Bounds for sequences sourced from a sequence store.
    pub const STORED: LengthBounds = LengthBounds { min: MIN_STORED_SEQUENCE_SIZE, max: MAX_SEQUENCE_SIZE };

    pub fn new(min: usize, max: usize) -> Result<Self, AlignerError> {
        if min == 0 || min > max {
            return Err(AlignerError::InvalidParameter(format!(
                "invalid length bounds {}..={}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self::DIRECT
    }
}

/// A validated, non-empty nucleotide sequence over `{A,T,C,G}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    data: String,
}

impl Sequence {
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_string(self) -> String {
        self.data
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data)
    }
}

impl Serialize for Sequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.data)
    }
}

/// Clean `raw` with the direct-alignment bounds.
pub fn clean(raw: &str) -> Result<Sequence, AlignerError> {
    clean_with_bounds(raw, LengthBounds::DIRECT)
}

/// Strip all whitespace, upper-case, then check alphabet and length.
pub fn clean_with_bounds(raw: &str, bounds: LengthBounds) -> Result<Sequence, AlignerError> {
    let data: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if data.is_empty() {
        return Err(AlignerError::InvalidSequence(
            "sequence is empty; only A, T, C, G are allowed".to_string(),
        ));
    }

    if let Some((pos, bad)) = data
        .char_indices()
        .find(|(_, c)| !c.is_ascii() || !ALPHABET.contains(&(*c as u8)))
    {
        return Err(AlignerError::InvalidSequence(format!(
            "invalid character '{}' at position {}; only A, T, C, G are allowed",
            bad, pos
        )));
    }

    let length = data.len();
    if length > bounds.max {
        return Err(AlignerError::SequenceTooLong { length, max: bounds.max });
    }
    if length < bounds.min {
        return Err(AlignerError::SequenceTooShort { length, min: bounds.min });
    }

    log::trace!("cleaned sequence of length {}", length);
    Ok(Sequence { data })
}
