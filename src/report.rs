//! Text and JSON rendering of alignment, mutation and search results.

use std::fmt::Write as _;
use std::str::FromStr;

use serde::Serialize;

use crate::mutation::MutationReport;
use crate::scoring::GAP;
use crate::similarity::SearchReport;
use crate::{AlignerError, AlignmentResult};

/// Columns per block in pairwise text output.
pub const DEFAULT_LINE_LENGTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = AlignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(AlignerError::InvalidParameter(format!("unknown output format '{}'", other))),
        }
    }
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, AlignerError> {
    serde_json::to_string_pretty(value).map_err(|e| AlignerError::InvalidParameter(e.to_string()))
}

pub fn render_alignment(result: &AlignmentResult, format: OutputFormat) -> Result<String, AlignerError> {
    match format {
        OutputFormat::Json => to_json(result),
        OutputFormat::Text => Ok(alignment_text(result, DEFAULT_LINE_LENGTH)),
    }
}

pub fn render_mutation_report(report: &MutationReport, format: OutputFormat) -> Result<String, AlignerError> {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let mut out = String::new();
    let _ = writeln!(out, "Original ({} bp): {}", report.original_sequence.len(), report.original_sequence);
    let _ = writeln!(
        out,
        "{} variants, {} {} edits each",
        report.variants.len(),
        report.mutations_per_variant,
        report.mutation_kind
    );
    for (i, variant) in report.variants.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Variant {}: score {}, identity {:.2}%",
            i + 1,
            variant.alignment.score,
            variant.alignment.identity_percent
        );
        out.push_str(&alignment_text(&variant.alignment, DEFAULT_LINE_LENGTH));
    }
    Ok(out)
}

pub fn render_search_report(report: &SearchReport, format: OutputFormat) -> Result<String, AlignerError> {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Query: {} bp, database {}, {} alignment, {} hits",
        report.query_length,
        report.database,
        report.mode,
        report.hits.len()
    );
    let _ = writeln!(out, "{:<20} {:>10} {:>8} {:>10} {:>8}", "target", "identity", "score", "e-value", "length");
    for hit in &report.hits {
        let _ = writeln!(
            out,
            "{:<20} {:>9.2}% {:>8} {:>10} {:>8}",
            truncate(&hit.target_id, 20),
            hit.similarity_percent,
            hit.score,
            hit.e_value,
            hit.target_length
        );
    }
    Ok(out)
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(width - 1).collect();
        t.push('~');
        t
    }
}

/// Match line: `|` identical, `.` mismatch, space for a gap column.
fn match_line(a: &[u8], b: &[u8]) -> String {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            if x == GAP || y == GAP {
                ' '
            } else if x == y {
                '|'
            } else {
                '.'
            }
        })
        .collect()
}

/// Pairwise block with 1-based residue coordinates on each line.
pub fn alignment_text(result: &AlignmentResult, line_length: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} | score {} | identity {:.2}% ({}/{}) | gaps {}",
        result.mode.algorithm_name(),
        result.score,
        result.identity_percent,
        result.stats.matches,
        result.stats.comparable,
        result.stats.gaps
    );
    if result.is_empty() {
        let _ = writeln!(out, "(no aligned region)");
        return out;
    }

    let a = result.aligned_seq1.as_bytes();
    let b = result.aligned_seq2.as_bytes();
    let width = line_length.max(1);
    let (mut pos_a, mut pos_b) = (result.start_position.i, result.start_position.j);

    for (chunk_a, chunk_b) in a.chunks(width).zip(b.chunks(width)) {
        let residues_a = chunk_a.iter().filter(|&&c| c != GAP).count();
        let residues_b = chunk_b.iter().filter(|&&c| c != GAP).count();

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Seq1 {:>6} {} {}",
            pos_a + 1,
            String::from_utf8_lossy(chunk_a),
            pos_a + residues_a
        );
        let _ = writeln!(out, "     {:>6} {}", "", match_line(chunk_a, chunk_b));
        let _ = writeln!(
            out,
            "Seq2 {:>6} {} {}",
            pos_b + 1,
            String::from_utf8_lossy(chunk_b),
            pos_b + residues_b
        );

        pos_a += residues_a;
        pos_b += residues_b;
    }
    out
}
