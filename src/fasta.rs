//! FASTA/FASTQ candidate stores, read with needletail (gzip handled transparently).

use std::io::Read;
use std::path::{Path, PathBuf};

use needletail::{parse_fastx_file, parse_fastx_reader, FastxReader};

use crate::similarity::{Candidate, CandidateSource};
use crate::AlignerError;

/// Candidate store backed by a sequence file, re-read on every search.
#[derive(Debug, Clone)]
pub struct FastaSource {
    path: PathBuf,
}

impl FastaSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CandidateSource for FastaSource {
    fn candidates(&self) -> Result<Vec<Candidate>, AlignerError> {
        if !self.path.exists() {
            return Err(AlignerError::Source(format!(
                "sequence file not found: {}",
                self.path.display()
            )));
        }
        let reader = parse_fastx_file(&self.path)
            .map_err(|e| AlignerError::Source(format!("{}: {}", self.path.display(), e)))?;
        let candidates = read_records(reader)?;
        log::info!("loaded {} candidates from {}", candidates.len(), self.path.display());
        Ok(candidates)
    }
}

/// Parse candidates from any FASTA/FASTQ byte stream.
pub fn parse_reader<R: Read + Send>(reader: R) -> Result<Vec<Candidate>, AlignerError> {
    let reader = parse_fastx_reader(reader).map_err(|e| AlignerError::Source(e.to_string()))?;
    read_records(reader)
}

fn read_records(mut reader: Box<dyn FastxReader + '_>) -> Result<Vec<Candidate>, AlignerError> {
    let mut candidates = Vec::new();
    while let Some(record) = reader.next() {
        let record = record.map_err(|e| AlignerError::Source(e.to_string()))?;
        let header = String::from_utf8_lossy(record.id()).into_owned();
        let (id, name) = split_header(&header);
        let sequence = String::from_utf8_lossy(&record.seq()).into_owned();
        candidates.push(Candidate::new(id, name, sequence));
    }
    Ok(candidates)
}

/// `>id description` -> (`id`, `description`), falling back to the id as name.
fn split_header(header: &str) -> (String, String) {
    let header = header.trim();
    match header.split_once(char::is_whitespace) {
        Some((id, rest)) if !rest.trim().is_empty() => (id.to_string(), rest.trim().to_string()),
        Some((id, _)) => (id.to_string(), id.to_string()),
        None => (header.to_string(), header.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const FASTA: &str = ">seq1 Escherichia coli fragment\nACGTACGT\nACGT\n>seq2\nttttgggg\n";

    #[test]
    fn test_parse_reader() {
        let candidates = parse_reader(Cursor::new(FASTA.as_bytes().to_vec())).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id, "seq1");
        assert_eq!(candidates[0].name, "Escherichia coli fragment");
        assert_eq!(candidates[0].sequence, "ACGTACGTACGT");
        assert_eq!(candidates[1].name, "seq2");
        assert_eq!(candidates[1].sequence, "ttttgggg");
    }

    #[test]
    fn test_file_source() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FASTA.as_bytes()).unwrap();
        file.flush().unwrap();

        let source = FastaSource::new(file.path());
        assert_eq!(source.path(), file.path());
        let candidates = source.candidates().unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].id, "seq2");
    }

    #[test]
    fn test_missing_file() {
        let source = FastaSource::new("/definitely/not/here.fa");
        assert!(matches!(source.candidates(), Err(AlignerError::Source(_))));
    }

    #[test]
    fn test_split_header() {
        assert_eq!(split_header("id1 some name"), ("id1".into(), "some name".into()));
        assert_eq!(split_header("id2"), ("id2".into(), "id2".into()));
        assert_eq!(split_header("id3   "), ("id3".into(), "id3".into()));
    }
}
