/// Corpus building: Block → sampled section pools → block renderings,
/// crossed with shuffled prompt renderings and capped per game.
///
/// Wires together section slicing, row permutation, hierarchy rendering,
/// enumeration, block assembly, and prompt combination.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, CorpusConfig};
use crate::core::assemble::assemble_block;
use crate::core::augment::{inject_required_rows, missing_required_rows, RequiredRowPolicy};
use crate::core::enumerate::enumerate_section;
use crate::core::hierarchy::{expand_units, group_sprite_rows, ChildTokens, HierarchyError, SpriteUnit};
use crate::core::permute::{sample_orderings, shuffle_operands};
use crate::core::prompt::{arrangement_count, prompts, sample_prompts};
use crate::core::slicer::BlockError;
use crate::schema::block::{Block, SectionKind};
use crate::schema::prompt::{CorpusPair, Prompt, TraitPhrase};
use crate::store::{CorpusSink, SourceStore, TraitTable};

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("malformed source: {0}")]
    Block(#[from] BlockError),
    #[error("sprite hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid child token pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("block is missing required rows: {0}")]
    NonConformant(String),
    #[error("no trait phrases for game: {0}")]
    UnknownGame(String),
    #[error("no source block for game: {0}")]
    MissingSource(String),
}

/// A game that could not be processed during a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameFailure {
    pub game: String,
    pub error: String,
}

/// Outcome of [`CorpusBuilder::run`].
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub games_written: usize,
    pub pairs_written: usize,
    pub failures: Vec<GameFailure>,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Generates (prompt, block) pairs for games. Built via `CorpusBuilder::builder()`.
pub struct CorpusBuilder {
    config: CorpusConfig,
    traits: TraitTable,
    child_tokens: ChildTokens,
    rng: StdRng,
    seed: u64,
}

/// Builder for constructing a `CorpusBuilder`.
#[derive(Default)]
pub struct Builder {
    config_path: Option<PathBuf>,
    traits_path: Option<PathBuf>,
    seed: Option<u64>,
    /// Directly provided config (for testing without files).
    config: Option<CorpusConfig>,
    /// Directly provided traits (for testing without files).
    traits: Option<TraitTable>,
}

impl CorpusBuilder {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    pub fn traits(&self) -> &TraitTable {
        &self.traits
    }

    /// Make [`run`](Self::run) stop at the first failing game.
    pub fn set_strict(&mut self, strict: bool) {
        self.config.strict = strict;
    }

    /// The seed the random source was started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Pairs for `game`, using its phrases from the trait table.
    pub fn generate_game(&mut self, game: &str, block: &Block) -> Result<Vec<CorpusPair>, CorpusError> {
        let phrases = self.phrases(game)?;
        self.generate(block, &phrases)
    }

    /// Pairs for one block and phrase list.
    ///
    /// Both pools are built in full (within the caps), then paired
    /// prompt-major and cut to `max_pairs_per_game`.
    pub fn generate(
        &mut self,
        block: &Block,
        phrases: &[TraitPhrase],
    ) -> Result<Vec<CorpusPair>, CorpusError> {
        let mut blocks = self.block_pool(block)?;
        let mut prompts = self.prompt_pool(phrases);

        if self.config.dedup {
            dedup_in_order(&mut blocks);
            dedup_in_order(&mut prompts);
        }

        if prompts.is_empty() {
            warn!(
                phrases = phrases.len(),
                include_empty_prompt = self.config.include_empty_prompt,
                "prompt pool is empty; no pairs generated"
            );
        }

        let pairs: Vec<CorpusPair> = prompts
            .iter()
            .flat_map(|p| blocks.iter().map(move |b| CorpusPair::new(p.as_str(), b.as_str())))
            .take(self.config.max_pairs_per_game)
            .collect();

        info!(
            blocks = blocks.len(),
            prompts = prompts.len(),
            pairs = pairs.len(),
            "generated corpus pairs"
        );
        Ok(pairs)
    }

    /// Every block rendering: the Cartesian product of the four sampled
    /// section pools, each combination assembled once.
    pub fn block_pool(&mut self, block: &Block) -> Result<Vec<String>, CorpusError> {
        let sprite = block.section(SectionKind::SpriteSet);
        let mapping = block.section(SectionKind::LevelMapping);
        let interaction = block.section(SectionKind::InteractionSet);
        let termination = block.section(SectionKind::TerminationSet);

        let mut units = group_sprite_rows(&sprite.rows, &self.child_tokens)?;
        let mut mapping_rows = mapping.rows.clone();
        self.check_required_rows(&mut units, &mut mapping_rows)?;

        let sprite_pool: Vec<Vec<String>> = sample_orderings(
            &units,
            self.config.caps.sprite_set,
            self.config.exhaustive_limit,
            &mut self.rng,
        )
        .iter()
        .map(|ordering| enumerate_section(&sprite.marker, &expand_units(ordering)))
        .collect();
        let mapping_pool = self.row_pool(&mapping.marker, &mapping_rows, SectionKind::LevelMapping);
        let interaction_pool = self.row_pool(&interaction.marker, &interaction.rows, SectionKind::InteractionSet);
        let termination_pool = self.row_pool(&termination.marker, &termination.rows, SectionKind::TerminationSet);

        debug!(
            sprite = sprite_pool.len(),
            mapping = mapping_pool.len(),
            interaction = interaction_pool.len(),
            termination = termination_pool.len(),
            "section pools"
        );

        let total = sprite_pool.len() * mapping_pool.len() * interaction_pool.len() * termination_pool.len();
        let mut blocks = Vec::with_capacity(total);
        for s in &sprite_pool {
            for m in &mapping_pool {
                for i in &interaction_pool {
                    for t in &termination_pool {
                        blocks.push(assemble_block(
                            &self.config.header,
                            &[s.as_slice(), m.as_slice(), i.as_slice(), t.as_slice()],
                            self.config.section_shuffle_probability,
                            &mut self.rng,
                        ));
                    }
                }
            }
        }
        Ok(blocks)
    }

    /// Every prompt rendering for `phrases`, shuffled.
    pub fn prompt_pool(&mut self, phrases: &[TraitPhrase]) -> Vec<String> {
        let mut pool: Vec<Prompt> = match arrangement_count(phrases.len()) {
            Some(n) if n <= self.config.exhaustive_limit => prompts(phrases),
            _ => sample_prompts(phrases, self.config.exhaustive_limit, &mut self.rng),
        };
        if self.config.include_empty_prompt {
            pool.push(Prompt::empty());
        }

        let mut rendered: Vec<String> = pool
            .iter()
            .map(|p| p.render(&self.config.prompt_suffix))
            .collect();
        rendered.shuffle(&mut self.rng);
        rendered
    }

    /// Generate and write pairs for every game in the trait table, or only
    /// for `only` when it is non-empty.
    ///
    /// A failing game is logged and recorded in the summary and the batch
    /// moves on, unless the config is strict. Pairs are numbered from 1
    /// per game.
    pub fn run<S, K>(&mut self, source: &S, sink: &mut K, only: &[String]) -> Result<RunSummary, CorpusError>
    where
        S: SourceStore + ?Sized,
        K: CorpusSink + ?Sized,
    {
        let games: Vec<String> = if only.is_empty() {
            self.traits.games().map(str::to_string).collect()
        } else {
            only.to_vec()
        };

        let mut summary = RunSummary::default();
        for game in &games {
            let span = tracing::info_span!("game", name = %game);
            let _guard = span.enter();

            match self.run_game(source, sink, game) {
                Ok(written) => {
                    summary.games_written += 1;
                    summary.pairs_written += written;
                }
                Err(err) => {
                    if self.config.strict {
                        return Err(err);
                    }
                    warn!(error = %err, "skipping game");
                    summary.failures.push(GameFailure {
                        game: game.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            games = summary.games_written,
            pairs = summary.pairs_written,
            failures = summary.failures.len(),
            "corpus run finished"
        );
        Ok(summary)
    }

    fn run_game<S, K>(&mut self, source: &S, sink: &mut K, game: &str) -> Result<usize, CorpusError>
    where
        S: SourceStore + ?Sized,
        K: CorpusSink + ?Sized,
    {
        let phrases = self.phrases(game)?;
        let block = source.load_block(game)?;
        let pairs = self.generate(&block, &phrases)?;
        for (i, pair) in pairs.iter().enumerate() {
            sink.write_pair(game, i + 1, pair)?;
        }
        Ok(pairs.len())
    }

    fn phrases(&self, game: &str) -> Result<Vec<TraitPhrase>, CorpusError> {
        self.traits
            .get(game)
            .map(<[TraitPhrase]>::to_vec)
            .ok_or_else(|| CorpusError::UnknownGame(game.to_string()))
    }

    fn row_pool(&mut self, marker: &str, rows: &[String], kind: SectionKind) -> Vec<Vec<String>> {
        let orderings = sample_orderings(
            rows,
            self.config.caps.get(kind),
            self.config.exhaustive_limit,
            &mut self.rng,
        );
        let shuffle_ops = kind == SectionKind::InteractionSet && self.config.shuffle_interaction_operands;

        let mut pool = Vec::with_capacity(orderings.len());
        for ordering in orderings {
            let ordering: Vec<String> = if shuffle_ops {
                ordering.iter().map(|row| shuffle_operands(row, &mut self.rng)).collect()
            } else {
                ordering
            };
            pool.push(enumerate_section(marker, &ordering));
        }
        pool
    }

    fn check_required_rows(
        &self,
        units: &mut Vec<SpriteUnit>,
        mapping: &mut Vec<String>,
    ) -> Result<(), CorpusError> {
        match self.config.required_rows {
            RequiredRowPolicy::Ignore => {}
            RequiredRowPolicy::Inject => {
                for row in inject_required_rows(units, mapping) {
                    warn!(row = %row, "injected missing required row");
                }
            }
            RequiredRowPolicy::Reject => {
                let missing = missing_required_rows(units.as_slice(), mapping.as_slice());
                if !missing.is_empty() {
                    let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
                    return Err(CorpusError::NonConformant(names.join(", ")));
                }
            }
        }
        Ok(())
    }
}

fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    items.retain(|item| seen.insert(item.clone()));
}

impl Builder {
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn traits_path(mut self, path: impl AsRef<Path>) -> Self {
        self.traits_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Seed the random source. Without a seed one is drawn from entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Provide the config directly (for testing without files). Takes
    /// precedence over `config_path`.
    pub fn with_config(mut self, config: CorpusConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Provide trait phrases directly (for testing without files).
    /// Entries loaded from `traits_path` override these per game.
    pub fn with_traits(mut self, traits: TraitTable) -> Self {
        self.traits = Some(traits);
        self
    }

    pub fn build(self) -> Result<CorpusBuilder, CorpusError> {
        let config = match (self.config, self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => CorpusConfig::load_from_ron(&path)?,
            (None, None) => CorpusConfig::default(),
        };
        config.validate()?;

        let mut traits = self.traits.unwrap_or_default();
        if let Some(ref path) = self.traits_path {
            traits.merge(TraitTable::load_from_ron(path)?);
        }

        let child_tokens = ChildTokens::new(config.child_marker, &config.sprite_stem)?;
        let seed = self.seed.unwrap_or_else(rand::random);
        info!(seed, games = traits.len(), "corpus builder ready");

        Ok(CorpusBuilder {
            config,
            traits,
            child_tokens,
            rng: StdRng::seed_from_u64(seed),
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAME: &str = "BasicGame
  SpriteSet
    avatar > MovingAvatar
    wall > Immovable
    sprite1 > RandomNPC
    sprite2 > Passive
  LevelMapping
    A > avatar
    w > wall
  InteractionSet
    avatar wall > stepBack
    sprite1 wall > stepBack
  TerminationSet
    SpriteCounter stype=avatar win=False
    Timeout limit=200 win=True
";

    fn phrases() -> Vec<TraitPhrase> {
        vec!["4 sprites".into(), "2 interactions".into(), "2 terminations".into()]
    }

    fn builder(config: CorpusConfig) -> CorpusBuilder {
        CorpusBuilder::builder().seed(42).with_config(config).build().unwrap()
    }

    #[test]
    fn block_pool_is_product_of_capped_pools() {
        let mut corpus = builder(CorpusConfig::default());
        let block = Block::parse(GAME).unwrap();
        // 4 units -> min(24, 5); 2 rows -> 2 each
        assert_eq!(corpus.block_pool(&block).unwrap().len(), 5 * 2 * 2 * 2);
    }

    #[test]
    fn prompt_pool_sizes() {
        let mut corpus = builder(CorpusConfig::default());
        assert_eq!(corpus.prompt_pool(&phrases()).len(), 15);

        let mut with_empty = builder(CorpusConfig {
            include_empty_prompt: true,
            ..CorpusConfig::default()
        });
        let pool = with_empty.prompt_pool(&phrases());
        assert_eq!(pool.len(), 16);
        assert!(pool.contains(&"vgdlgame.".to_string()));
    }

    #[test]
    fn pairs_are_capped() {
        let mut corpus = builder(CorpusConfig::default());
        let block = Block::parse(GAME).unwrap();
        let pairs = corpus.generate(&block, &phrases()).unwrap();
        assert_eq!(pairs.len(), 3);

        let mut more = builder(CorpusConfig {
            max_pairs_per_game: 100,
            ..CorpusConfig::default()
        });
        assert_eq!(more.generate(&block, &phrases()).unwrap().len(), 100);
    }

    #[test]
    fn first_pairs_share_the_first_prompt() {
        let mut corpus = builder(CorpusConfig::default());
        let block = Block::parse(GAME).unwrap();
        let pairs = corpus.generate(&block, &phrases()).unwrap();
        assert!(pairs.iter().all(|p| p.prompt == pairs[0].prompt));
    }

    #[test]
    fn no_phrases_means_no_pairs_unless_empty_prompt() {
        let block = Block::parse(GAME).unwrap();
        let mut corpus = builder(CorpusConfig::default());
        assert!(corpus.generate(&block, &[]).unwrap().is_empty());

        let mut corpus = builder(CorpusConfig {
            include_empty_prompt: true,
            ..CorpusConfig::default()
        });
        let pairs = corpus.generate(&block, &[]).unwrap();
        assert_eq!(pairs.len(), 3);
        assert!(pairs.iter().all(|p| p.prompt == "vgdlgame."));
    }

    #[test]
    fn dedup_removes_repeated_blocks() {
        // one row per section and no section shuffle: every block is identical
        let text = "BasicGame
  SpriteSet
    avatar > MovingAvatar wall
  LevelMapping
    A > avatar
  InteractionSet
    avatar EOS > stepBack
  TerminationSet
    Timeout limit=10 win=True
";
        let block = Block::parse(text).unwrap();
        let config = CorpusConfig {
            section_shuffle_probability: 0.0,
            required_rows: RequiredRowPolicy::Ignore,
            max_pairs_per_game: 50,
            dedup: true,
            ..CorpusConfig::default()
        };
        let mut corpus = builder(config);
        let pairs = corpus.generate(&block, &["one".into(), "two".into()]).unwrap();
        // 4 distinct prompts x 1 distinct block
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn reject_policy_refuses_nonconformant_blocks() {
        let text = GAME.replace("    w > wall\n", "    1 > sprite1\n");
        let block = Block::parse(&text).unwrap();
        let mut corpus = builder(CorpusConfig {
            required_rows: RequiredRowPolicy::Reject,
            ..CorpusConfig::default()
        });
        let err = corpus.generate(&block, &phrases()).unwrap_err();
        assert!(matches!(err, CorpusError::NonConformant(ref m) if m == "wall mapping 'w'"));
    }

    #[test]
    fn unknown_game_is_an_error() {
        let mut corpus = builder(CorpusConfig::default());
        let block = Block::parse(GAME).unwrap();
        assert!(matches!(
            corpus.generate_game("nope", &block),
            Err(CorpusError::UnknownGame(ref g)) if g == "nope"
        ));
    }

    #[test]
    fn invalid_config_fails_build() {
        let result = CorpusBuilder::builder()
            .with_config(CorpusConfig {
                section_shuffle_probability: -0.5,
                ..CorpusConfig::default()
            })
            .build();
        assert!(matches!(result, Err(CorpusError::Config(_))));
    }

    #[test]
    fn zero_exhaustive_limit_fails_build() {
        let result = CorpusBuilder::builder()
            .with_config(CorpusConfig {
                exhaustive_limit: 0,
                ..CorpusConfig::default()
            })
            .build();
        assert!(matches!(result, Err(CorpusError::Config(_))));
    }

    #[test]
    fn prompt_pool_samples_past_the_exhaustive_limit() {
        let phrases: Vec<TraitPhrase> = vec![
            "4 sprites".into(),
            "2 interactions".into(),
            "2 terminations".into(),
            "a key".into(),
        ];
        let config = CorpusConfig {
            exhaustive_limit: 20,
            ..CorpusConfig::default()
        };
        // 4 + 12 + 24 + 24 arrangements
        assert!(arrangement_count(phrases.len()).unwrap() > config.exhaustive_limit);

        let pool = builder(config.clone()).prompt_pool(&phrases);
        assert_eq!(pool.len(), 20);

        let distinct: FxHashSet<&String> = pool.iter().collect();
        assert_eq!(distinct.len(), pool.len());

        let all: Vec<String> = prompts(&phrases).iter().map(|p| p.render("vgdlgame.")).collect();
        for rendered in &pool {
            assert!(rendered.ends_with(" vgdlgame."), "{:?}", rendered);
            assert!(all.contains(rendered), "{:?}", rendered);
        }

        assert_eq!(builder(config).prompt_pool(&phrases), pool);
    }

    #[test]
    fn builder_with_seed() {
        let corpus = CorpusBuilder::builder().seed(12345).build().unwrap();
        assert_eq!(corpus.seed(), 12345);
    }

    #[test]
    fn operand_shuffle_only_touches_interactions() {
        let block = Block::parse(GAME).unwrap();
        let mut swapped = false;
        for seed in 0..20 {
            let mut corpus = CorpusBuilder::builder()
                .seed(seed)
                .with_config(CorpusConfig {
                    shuffle_interaction_operands: true,
                    section_shuffle_probability: 0.0,
                    ..CorpusConfig::default()
                })
                .build()
                .unwrap();
            let blocks = corpus.block_pool(&block).unwrap();
            swapped |= blocks.iter().any(|b| b.contains("wall avatar > stepBack"));
            for b in &blocks {
                assert!(b.contains("Timeout limit=200 win=True"));
                assert!(b.contains("A > avatar"));
            }
        }
        assert!(swapped, "expected some interaction operands to be reordered");
    }
}
