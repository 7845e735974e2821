use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use dna_aligner::fasta::FastaSource;
use dna_aligner::report::{render_alignment, render_mutation_report, render_search_report, OutputFormat};
use dna_aligner::{
    AlignerConfig, AlignerError, AlignmentMode, MutationKind, MutationRequest, MutationSimulator, SearchRequest,
    SimilarityRanker, WorkerPool,
};

#[derive(Parser)]
#[command(name = "dna-align")]
#[command(about = "Pairwise DNA alignment, mutation simulation and similarity search")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./dna_aligner.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Align two sequences
    Align {
        #[arg(long)]
        seq1: String,

        #[arg(long)]
        seq2: String,

        /// global (Needleman-Wunsch) or local (Smith-Waterman)
        #[arg(short, long, default_value = "global")]
        mode: AlignmentMode,

        /// text or json
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate random variants of a sequence and align each to the original
    Mutate {
        #[arg(short, long)]
        sequence: String,

        /// substitution, insertion or deletion
        #[arg(short, long)]
        kind: MutationKind,

        /// Fraction of the sequence length to edit, 0.0 to 1.0
        #[arg(short, long)]
        rate: f64,

        /// Number of variants (defaults to the configured value)
        #[arg(long)]
        variants: Option<usize>,

        #[arg(short, long)]
        mode: Option<AlignmentMode>,

        /// RNG seed for reproducible variants
        #[arg(long)]
        seed: Option<u64>,

        /// Worker threads (defaults to the configured value)
        #[arg(short, long)]
        threads: Option<usize>,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Rank the sequences of a FASTA file by similarity to a query
    Search {
        #[arg(short, long)]
        query: String,

        /// FASTA/FASTQ file, optionally gzipped
        #[arg(short, long)]
        db: PathBuf,

        #[arg(short, long)]
        mode: Option<AlignmentMode>,

        #[arg(long)]
        max_results: Option<usize>,

        /// Worker threads (defaults to the configured value)
        #[arg(short, long)]
        threads: Option<usize>,

        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Configuration helpers
    Config {
        /// Print the default configuration as TOML
        #[arg(long)]
        example: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = AlignerConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Align { seq1, seq2, mode, format } => cmd_align(&config, &seq1, &seq2, mode, format),
        Commands::Mutate { sequence, kind, rate, variants, mode, seed, threads, format } => {
            let request = MutationRequest::new(kind, rate, mode.unwrap_or(config.mutation.mode))
                .with_variants(variants.unwrap_or(config.mutation.variants));
            cmd_mutate(
                &config,
                &sequence,
                &request,
                seed.or(config.mutation.seed),
                worker_threads(threads, &config),
                format,
            )
        }
        Commands::Search { query, db, mode, max_results, threads, format } => {
            let request = SearchRequest::new(mode.unwrap_or(config.search.mode))
                .with_max_results(max_results.unwrap_or(config.search.max_results))
                .with_database(config.search.database.clone());
            cmd_search(&config, &query, db, &request, worker_threads(threads, &config), format)
        }
        Commands::Config { example } => cmd_config(&config, example),
    }
}

/// `--threads` when given, else `workers.threads` from the config.
fn worker_threads(flag: Option<usize>, config: &AlignerConfig) -> usize {
    flag.unwrap_or(config.workers.threads)
}

fn cmd_align(config: &AlignerConfig, seq1: &str, seq2: &str, mode: AlignmentMode, format: OutputFormat) -> Result<()> {
    let aligner = config.aligner(mode)?;
    let result = aligner.align(seq1, seq2).map_err(reject)?;
    println!("{}", render_alignment(&result, format)?);
    Ok(())
}

fn cmd_mutate(
    config: &AlignerConfig,
    sequence: &str,
    request: &MutationRequest,
    seed: Option<u64>,
    threads: usize,
    format: OutputFormat,
) -> Result<()> {
    let simulator = MutationSimulator::new(config.aligner(request.mode)?).with_bounds(config.stored_bounds()?);
    let mut rng = match seed {
        Some(seed) => {
            log::debug!("seeding RNG with {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    let report = if threads > 1 {
        let mut pool = WorkerPool::new(threads, config.workers.queue_depth.max(threads))?;
        log::debug!("aligning variants on {} workers", pool.threads());
        simulator.simulate_parallel(sequence, request, &mut rng, &mut pool)
    } else {
        simulator.simulate(sequence, request, &mut rng)
    }
    .map_err(reject)?;

    println!("{}", render_mutation_report(&report, format)?);
    Ok(())
}

fn cmd_search(
    config: &AlignerConfig,
    query: &str,
    db: PathBuf,
    request: &SearchRequest,
    threads: usize,
    format: OutputFormat,
) -> Result<()> {
    let ranker = SimilarityRanker::new(config.aligner(request.mode)?).with_bounds(config.stored_bounds()?);
    let source = FastaSource::new(&db);
    let mut pool = WorkerPool::new(threads, config.workers.queue_depth.max(threads))?;
    log::info!("searching {} on {} workers", source.path().display(), pool.threads());

    let report = ranker
        .search_parallel(query, &source, request, &mut pool)
        .map_err(reject)
        .with_context(|| format!("search against {} failed", db.display()))?;

    println!("{}", render_search_report(&report, format)?);
    Ok(())
}

fn cmd_config(config: &AlignerConfig, example: bool) -> Result<()> {
    if example {
        print!("{}", AlignerConfig::example_toml()?);
    } else {
        print!("{}", toml::to_string_pretty(config).context("failed to render configuration")?);
    }
    Ok(())
}

/// Log validation failures before they are reported to the user.
fn reject(e: AlignerError) -> anyhow::Error {
    if e.is_validation() {
        log::warn!("rejected input: {}", e);
    }
    anyhow::Error::new(e)
}
