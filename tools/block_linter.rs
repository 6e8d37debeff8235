/// Block Linter: checks VGDL source blocks before corpus generation.
///
/// Usage: block_linter <source_dir> [--config <file.ron>]

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vgdl_permute::config::CorpusConfig;
use vgdl_permute::core::augment::missing_required_rows;
use vgdl_permute::core::hierarchy::{group_sprite_rows, ChildTokens};
use vgdl_permute::schema::block::{Block, SectionKind};
use vgdl_permute::store::{DirSource, SourceStore};

#[derive(Parser)]
#[command(name = "block_linter")]
#[command(version)]
#[command(about = "Validate VGDL game blocks", long_about = None)]
struct Cli {
    /// Directory holding one `<game>.txt` block per game
    source_dir: PathBuf,

    /// RON corpus configuration (child marker and sprite stem)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = match cli.config {
        Some(ref path) => match CorpusConfig::load_from_ron(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: Failed to load config: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => CorpusConfig::default(),
    };
    let tokens = match ChildTokens::new(config.child_marker, &config.sprite_stem) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let source = DirSource::new(&cli.source_dir);
    let games = match source.games() {
        Ok(games) => games,
        Err(e) => {
            eprintln!("ERROR: Cannot read '{}': {}", cli.source_dir.display(), e);
            return ExitCode::FAILURE;
        }
    };
    println!("Checking {} blocks", games.len());

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    for game in &games {
        let block = match source.load_block(game) {
            Ok(block) => block,
            Err(e) => {
                errors.push(format!("{}: {}", game, e));
                continue;
            }
        };
        lint_block(game, &block, &tokens, &mut errors, &mut warnings);
    }

    println!("\n=== Block Lint Report ===\n");
    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }
    for warning in &warnings {
        println!("WARNING: {}", warning);
    }
    for error in &errors {
        println!("ERROR: {}", error);
    }
    println!("\nSummary: {} errors, {} warnings", errors.len(), warnings.len());

    if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn lint_block(
    game: &str,
    block: &Block,
    tokens: &ChildTokens,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let sprites = block.section(SectionKind::SpriteSet);
    let units = match group_sprite_rows(&sprites.rows, tokens) {
        Ok(units) => units,
        Err(e) => {
            errors.push(format!("{}: {}", game, e));
            return;
        }
    };

    // Missing rows are injected at generation time by default
    let mapping = &block.section(SectionKind::LevelMapping).rows;
    for row in missing_required_rows(&units, mapping) {
        warnings.push(format!("{}: missing {}", game, row));
    }

    for kind in SectionKind::ALL {
        if block.section(kind).rows.is_empty() {
            warnings.push(format!("{}: {} has no rows", game, kind));
        }
    }
}
