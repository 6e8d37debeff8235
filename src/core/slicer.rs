/// Section slicing: locating named sections inside a block's lines.
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("section marker not found: {0}")]
    MissingMarker(String),
    #[error("section marker '{end}' appears before '{start}'")]
    MarkerOrder { start: String, end: String },
    #[error("section marker appears more than once: {0}")]
    DuplicateMarker(String),
    #[error("block has no header line")]
    MissingHeader,
    #[error("unexpected line before the first section: {0:?}")]
    UnexpectedLine(String),
}

/// Index of the first line whose trimmed text equals `marker`.
pub fn find_marker<S: AsRef<str>>(lines: &[S], marker: &str) -> Result<usize, BlockError> {
    lines
        .iter()
        .position(|line| line.as_ref().trim() == marker)
        .ok_or_else(|| BlockError::MissingMarker(marker.to_string()))
}

/// Row span of the section introduced by `start`.
///
/// The span begins on the line after the `start` marker and stops before
/// the `end` marker, or runs to the end of `lines` when `end` is `None`.
/// Both markers are excluded.
pub fn slice_section<S: AsRef<str>>(
    lines: &[S],
    start: &str,
    end: Option<&str>,
) -> Result<Range<usize>, BlockError> {
    let start_idx = find_marker(lines, start)?;
    let end_idx = match end {
        Some(end) => find_marker(lines, end)?,
        None => lines.len(),
    };

    if end_idx <= start_idx {
        return Err(BlockError::MarkerOrder {
            start: start.to_string(),
            end: end.unwrap_or_default().to_string(),
        });
    }

    Ok(start_idx + 1..end_idx)
}

/// The rows of a section, borrowed from `lines`.
pub fn section_rows<'a, S: AsRef<str>>(
    lines: &'a [S],
    start: &str,
    end: Option<&str>,
) -> Result<&'a [S], BlockError> {
    let span = slice_section(lines, start, end)?;
    Ok(&lines[span])
}
