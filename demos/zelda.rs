/// Zelda demo: prints a few permuted (prompt, block) pairs for one game.
///
/// Run with: cargo run --example zelda

use vgdl_permute::config::CorpusConfig;
use vgdl_permute::core::corpus::CorpusBuilder;
use vgdl_permute::store::{DirSource, SourceStore};

fn main() {
    let source = DirSource::new("data/vgdl_src");
    let block = source.load_block("zelda").expect("Failed to load zelda block");

    let mut corpus = CorpusBuilder::builder()
        .seed(2026)
        .traits_path("data/traits.ron")
        .with_config(CorpusConfig {
            max_pairs_per_game: 4,
            ..CorpusConfig::default()
        })
        .build()
        .expect("Failed to build corpus");

    // --- Original block ---
    println!("=== Source ===\n{}", block.to_text());
    println!(
        "{} rows, sections in source order: {:?}\n",
        block.row_count(),
        block.source_order()
    );

    // --- Trait phrases ---
    let phrases = corpus.traits().get("zelda").unwrap_or_default();
    let listed: Vec<&str> = phrases.iter().map(|p| p.as_str()).collect();
    println!("Traits: {}\n", listed.join(", "));

    // --- Permuted pairs ---
    let pairs = corpus
        .generate_game("zelda", &block)
        .expect("Failed to generate pairs");
    for (i, pair) in pairs.iter().enumerate() {
        println!("=== zelda_{} ===", i + 1);
        println!("{}", pair.to_text());
    }
}
