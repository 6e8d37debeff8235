use serde::{Deserialize, Serialize};
use std::fmt;

/// One atomic description of a game characteristic, e.g. "7 sprites".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraitPhrase(pub String);

impl TraitPhrase {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TraitPhrase {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TraitPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered selection of trait phrases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Prompt {
    pub phrases: Vec<TraitPhrase>,
}

impl Prompt {
    pub fn new(phrases: Vec<TraitPhrase>) -> Self {
        Self { phrases }
    }

    /// The zero-trait prompt.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Space-joined phrases followed by `suffix`. The empty prompt renders
    /// as the suffix alone.
    pub fn render(&self, suffix: &str) -> String {
        if self.phrases.is_empty() {
            return suffix.to_string();
        }
        let mut out = self
            .phrases
            .iter()
            .map(TraitPhrase::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        out.push(' ');
        out.push_str(suffix);
        out
    }
}

/// A finished (prompt, block) training example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusPair {
    pub prompt: String,
    pub block: String,
}

impl CorpusPair {
    pub fn new(prompt: impl Into<String>, block: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            block: block.into(),
        }
    }

    /// The persisted form: the prompt line followed by the block text.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.prompt.len() + self.block.len() + 1);
        out.push_str(&self.prompt);
        out.push('\n');
        out.push_str(&self.block);
        out
    }
}
