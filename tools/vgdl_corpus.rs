/// VGDL Corpus: writes permuted (prompt, block) pairs for a set of games.
///
/// Usage: vgdl_corpus --source-dir <dir> --traits <file.ron> --out-dir <dir>
///        [--config <file.ron>] [--seed <n>] [--game <name>]... [--strict]

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vgdl_permute::core::corpus::CorpusBuilder;
use vgdl_permute::store::{DirSink, DirSource};

#[derive(Parser)]
#[command(name = "vgdl_corpus")]
#[command(version)]
#[command(about = "Generate order-invariant training pairs from VGDL game blocks", long_about = None)]
struct Cli {
    /// Directory holding one `<game>.txt` block per game
    #[arg(long, value_name = "DIR")]
    source_dir: PathBuf,

    /// RON map from game name to trait phrases
    #[arg(long, value_name = "FILE")]
    traits: PathBuf,

    /// Directory that receives `<game>_<index>.txt` files
    #[arg(long, value_name = "DIR")]
    out_dir: PathBuf,

    /// RON corpus configuration; defaults apply when omitted
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Only process these games (repeatable)
    #[arg(long = "game", value_name = "NAME")]
    games: Vec<String>,

    /// Stop at the first failing game
    #[arg(long)]
    strict: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut builder = CorpusBuilder::builder().traits_path(&cli.traits);
    if let Some(ref path) = cli.config {
        builder = builder.config_path(path);
    }
    if let Some(seed) = cli.seed {
        builder = builder.seed(seed);
    }

    let mut corpus = match builder.build() {
        Ok(corpus) => corpus,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if cli.strict {
        corpus.set_strict(true);
    }

    let source = DirSource::new(&cli.source_dir);
    let mut sink = DirSink::new(&cli.out_dir);

    match corpus.run(&source, &mut sink, &cli.games) {
        Ok(summary) => {
            println!(
                "Wrote {} pairs for {} games (seed {})",
                summary.pairs_written,
                summary.games_written,
                corpus.seed()
            );
            for failure in &summary.failures {
                println!("FAILED: {}: {}", failure.game, failure.error);
            }
            if summary.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}
