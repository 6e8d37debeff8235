/// Corpus configuration: sampling caps, rendering constants, and policies.
///
/// Every field has a default, so a RON file only needs the values it
/// changes:
///
/// ```ron
/// (
///     caps: (sprite_set: 8),
///     max_pairs_per_game: 10,
///     required_rows: Reject,
/// )
/// ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::augment::RequiredRowPolicy;
use crate::schema::block::SectionKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Maximum number of sampled orderings kept per section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionCaps {
    pub sprite_set: usize,
    pub level_mapping: usize,
    pub interaction_set: usize,
    pub termination_set: usize,
}

impl Default for SectionCaps {
    fn default() -> Self {
        Self {
            sprite_set: 5,
            level_mapping: 10,
            interaction_set: 10,
            termination_set: 2,
        }
    }
}

impl SectionCaps {
    pub fn get(&self, kind: SectionKind) -> usize {
        match kind {
            SectionKind::SpriteSet => self.sprite_set,
            SectionKind::LevelMapping => self.level_mapping,
            SectionKind::InteractionSet => self.interaction_set,
            SectionKind::TerminationSet => self.termination_set,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// First line of every rendered block.
    pub header: String,
    /// Token appended to every prompt.
    pub prompt_suffix: String,
    pub caps: SectionCaps,
    /// Largest `n!` (or prompt arrangement count) that is enumerated in
    /// full before sampling; past it, orderings are drawn at random.
    pub exhaustive_limit: usize,
    pub max_pairs_per_game: usize,
    /// Chance that a block's section order is shuffled.
    pub section_shuffle_probability: f64,
    pub include_empty_prompt: bool,
    /// Drop repeated block and prompt renderings before pairing.
    pub dedup: bool,
    pub shuffle_interaction_operands: bool,
    pub required_rows: RequiredRowPolicy,
    pub child_marker: char,
    pub sprite_stem: String,
    /// Stop the batch at the first failing game.
    pub strict: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            header: "BasicGame".to_string(),
            prompt_suffix: "vgdlgame.".to_string(),
            caps: SectionCaps::default(),
            exhaustive_limit: 40_320,
            max_pairs_per_game: 3,
            section_shuffle_probability: 0.75,
            include_empty_prompt: false,
            dedup: false,
            shuffle_interaction_operands: false,
            required_rows: RequiredRowPolicy::Inject,
            child_marker: 'c',
            sprite_stem: "sprite".to_string(),
            strict: false,
        }
    }
}

impl CorpusConfig {
    /// Load and validate a configuration from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<CorpusConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse and validate a configuration from a RON string.
    pub fn parse_ron(input: &str) -> Result<CorpusConfig, ConfigError> {
        let config: CorpusConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.section_shuffle_probability) {
            return Err(ConfigError::Invalid(format!(
                "section_shuffle_probability must be within 0..=1, got {}",
                self.section_shuffle_probability
            )));
        }
        if self.exhaustive_limit == 0 {
            return Err(ConfigError::Invalid(
                "exhaustive_limit must be at least 1".to_string(),
            ));
        }
        for kind in SectionKind::ALL {
            if self.caps.get(kind) == 0 {
                return Err(ConfigError::Invalid(format!("cap for {} must be at least 1", kind)));
            }
        }
        if self.sprite_stem.trim().is_empty() {
            return Err(ConfigError::Invalid("sprite_stem must not be empty".to_string()));
        }
        if self.child_marker.is_whitespace() {
            return Err(ConfigError::Invalid("child_marker must not be whitespace".to_string()));
        }
        Ok(())
    }
}
