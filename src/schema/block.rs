use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::slicer::{find_marker, slice_section, BlockError};

/// The four named sections every VGDL block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    SpriteSet,
    LevelMapping,
    InteractionSet,
    TerminationSet,
}

impl SectionKind {
    /// All kinds in canonical order.
    pub const ALL: [SectionKind; 4] = [
        Self::SpriteSet,
        Self::LevelMapping,
        Self::InteractionSet,
        Self::TerminationSet,
    ];

    /// The trimmed text of the line that introduces this section.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::SpriteSet => "SpriteSet",
            Self::LevelMapping => "LevelMapping",
            Self::InteractionSet => "InteractionSet",
            Self::TerminationSet => "TerminationSet",
        }
    }

    /// Position of this kind in [`SectionKind::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Self::SpriteSet => 0,
            Self::LevelMapping => 1,
            Self::InteractionSet => 2,
            Self::TerminationSet => 3,
        }
    }

    pub fn from_marker(text: &str) -> Option<SectionKind> {
        Self::ALL.into_iter().find(|kind| kind.marker() == text.trim())
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// One section of a block: its marker line and the rows under it.
///
/// Rows keep their original leading indentation; trailing whitespace is
/// dropped at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub marker: String,
    pub rows: Vec<String>,
}

/// A parsed game description: a header line plus four sections.
///
/// Sections are stored in canonical order regardless of where they
/// appeared in the source; `source_order` remembers the original layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: String,
    sections: Vec<Section>,
    source_order: Vec<SectionKind>,
}

impl Block {
    /// Parse a block from text. Blank lines are skipped.
    pub fn parse(text: &str) -> Result<Block, BlockError> {
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        Self::from_lines(&lines)
    }

    /// Build a block from an ordered line sequence.
    ///
    /// The first non-blank line is the header. Every section marker must
    /// appear exactly once; sections may come in any order and each runs
    /// until the next marker or the end of the sequence.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Block, BlockError> {
        let lines: Vec<&str> = lines
            .iter()
            .map(|l| l.as_ref())
            .filter(|l| !l.trim().is_empty())
            .collect();

        let (header, body) = lines.split_first().ok_or(BlockError::MissingHeader)?;
        if SectionKind::from_marker(header).is_some() {
            return Err(BlockError::MissingHeader);
        }

        let mut positions = Vec::with_capacity(SectionKind::ALL.len());
        for kind in SectionKind::ALL {
            let occurrences = body.iter().filter(|l| l.trim() == kind.marker()).count();
            if occurrences > 1 {
                return Err(BlockError::DuplicateMarker(kind.marker().to_string()));
            }
            positions.push((find_marker(body, kind.marker())?, kind));
        }
        positions.sort_unstable_by_key(|(pos, _)| *pos);

        if let Some(stray) = body[..positions[0].0].first() {
            return Err(BlockError::UnexpectedLine(stray.to_string()));
        }

        let mut sections: Vec<Section> = Vec::with_capacity(positions.len());
        for (i, (pos, kind)) in positions.iter().enumerate() {
            let end = positions.get(i + 1).map(|(_, next)| next.marker());
            let span = slice_section(body, kind.marker(), end)?;
            sections.push(Section {
                kind: *kind,
                marker: body[*pos].trim_end().to_string(),
                rows: body[span].iter().map(|r| r.trim_end().to_string()).collect(),
            });
        }

        let source_order = sections.iter().map(|s| s.kind).collect();
        sections.sort_by_key(|s| s.kind.index());

        Ok(Block {
            header: header.trim_end().to_string(),
            sections,
            source_order,
        })
    }

    pub fn section(&self, kind: SectionKind) -> &Section {
        &self.sections[kind.index()]
    }

    /// Sections in canonical order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Section kinds in the order they appeared in the source.
    pub fn source_order(&self) -> &[SectionKind] {
        &self.source_order
    }

    /// Total number of content rows across all four sections.
    pub fn row_count(&self) -> usize {
        self.sections.iter().map(|s| s.rows.len()).sum()
    }

    /// Render the block back to text in its source layout.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.header);
        out.push('\n');
        for kind in &self.source_order {
            let section = self.section(*kind);
            out.push_str(&section.marker);
            out.push('\n');
            for row in &section.rows {
                out.push_str(row);
                out.push('\n');
            }
        }
        out
    }
}
