use dna_aligner::report::alignment_text;
use dna_aligner::{Aligner, AlignerError, AlignmentMode, ScoringScheme};

fn main() -> Result<(), AlignerError> {
    env_logger::init();

    let seq1 = "ACGTACGTTTGACCA";
    let seq2 = "ACGTAGCTTGACA";

    // Global alignment
    let aligner = Aligner::default().with_alignment_mode(AlignmentMode::Global);
    let result = aligner.align(seq1, seq2)?;
    print!("{}", alignment_text(&result, 60));
    println!("CIGAR: {}", result.cigar());

    // Local alignment with a harsher gap penalty
    let aligner = aligner
        .with_alignment_mode(AlignmentMode::Local)
        .with_scoring(ScoringScheme::new(2, -1, -3));
    let result = aligner.align(seq1, seq2)?;
    println!();
    print!("{}", alignment_text(&result, 60));
    println!("Operations: {:?}", result.operations());

    Ok(())
}
