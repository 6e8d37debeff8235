/// Where blocks come from and where pairs go.
///
/// Sources hand out parsed [`Block`]s by game name, sinks persist finished
/// [`CorpusPair`]s. Directory-backed implementations are used by the CLI,
/// in-memory ones by tests and embedders.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::corpus::CorpusError;
use crate::schema::block::Block;
use crate::schema::prompt::{CorpusPair, TraitPhrase};

/// Trait phrases per game, loaded from a RON map:
///
/// ```ron
/// {
///     "zelda": ["7 sprites", "3 terminations"],
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraitTable {
    games: BTreeMap<String, Vec<TraitPhrase>>,
}

impl TraitTable {
    pub fn load_from_ron(path: &Path) -> Result<TraitTable, CorpusError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<TraitTable, CorpusError> {
        let table: TraitTable = ron::from_str(input)?;
        Ok(table)
    }

    /// Merge another table into this one. Entries from `other` replace
    /// existing entries for the same game.
    pub fn merge(&mut self, other: TraitTable) {
        self.games.extend(other.games);
    }

    pub fn insert(&mut self, game: impl Into<String>, phrases: Vec<TraitPhrase>) {
        self.games.insert(game.into(), phrases);
    }

    pub fn get(&self, game: &str) -> Option<&[TraitPhrase]> {
        self.games.get(game).map(Vec::as_slice)
    }

    /// Game names in sorted order.
    pub fn games(&self) -> impl Iterator<Item = &str> {
        self.games.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

pub trait SourceStore {
    fn load_block(&self, game: &str) -> Result<Block, CorpusError>;
}

pub trait CorpusSink {
    /// Persist pair number `index` (1-based) of `game`.
    fn write_pair(&mut self, game: &str, index: usize, pair: &CorpusPair) -> Result<(), CorpusError>;
}

/// Reads `<dir>/<game>.txt`.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, game: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", game))
    }

    /// Names of every `.txt` file in the directory, sorted.
    pub fn games(&self) -> Result<Vec<String>, CorpusError> {
        let mut games = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                games.push(stem.to_string());
            }
        }
        games.sort();
        Ok(games)
    }
}

impl SourceStore for DirSource {
    fn load_block(&self, game: &str) -> Result<Block, CorpusError> {
        let path = self.path_for(game);
        if !path.is_file() {
            return Err(CorpusError::MissingSource(game.to_string()));
        }
        debug!(path = %path.display(), "loading block");
        let text = std::fs::read_to_string(&path)?;
        Ok(Block::parse(&text)?)
    }
}

/// Block texts held in memory, parsed on load.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    blocks: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, game: impl Into<String>, text: impl Into<String>) {
        self.blocks.insert(game.into(), text.into());
    }
}

impl SourceStore for MemorySource {
    fn load_block(&self, game: &str) -> Result<Block, CorpusError> {
        let text = self
            .blocks
            .get(game)
            .ok_or_else(|| CorpusError::MissingSource(game.to_string()))?;
        Ok(Block::parse(text)?)
    }
}

/// Writes each pair to `<dir>/<game>_<index>.txt`, creating `dir` on first
/// write.
#[derive(Debug, Clone)]
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, game: &str, index: usize) -> PathBuf {
        self.dir.join(format!("{}_{}.txt", game, index))
    }
}

impl CorpusSink for DirSink {
    fn write_pair(&mut self, game: &str, index: usize, pair: &CorpusPair) -> Result<(), CorpusError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(game, index);
        debug!(path = %path.display(), "writing pair");
        std::fs::write(&path, pair.to_text())?;
        Ok(())
    }
}

/// Collects pairs in write order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub pairs: Vec<(String, usize, CorpusPair)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_game<'a>(&'a self, game: &'a str) -> impl Iterator<Item = &'a CorpusPair> + 'a {
        self.pairs
            .iter()
            .filter(move |(g, _, _)| g == game)
            .map(|(_, _, pair)| pair)
    }
}

impl CorpusSink for MemorySink {
    fn write_pair(&mut self, game: &str, index: usize, pair: &CorpusPair) -> Result<(), CorpusError> {
        self.pairs.push((game.to_string(), index, pair.clone()));
        Ok(())
    }
}
