/// Sprite hierarchy: parent/child units for the SpriteSet section.
///
/// SpriteSet rows are grouped once into [`SpriteUnit`]s (a root sprite and
/// every sprite nested under it). Permutation moves whole units, so a child
/// never leaves its parent; rendering turns a unit back into indented lines.

use regex::Regex;
use thiserror::Error;

/// Indentation every child line starts from.
pub const BASE_INDENT: usize = 4;
/// Extra indentation per nesting level.
pub const DEPTH_INDENT: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("row has child sprites but no root sprite: {0:?}")]
    EmptyHierarchy(String),
    #[error("child at depth {depth} skips a nesting level in {row:?}")]
    DepthSkip { row: String, depth: usize },
}

/// Matcher for child-identifier tokens embedded in a row, such as
/// `csprite1` (depth 1) or `ccsprite2` (depth 2).
///
/// A token is one or more `marker` characters, the sprite `stem`, then
/// digits, and must start at the beginning of the row or after whitespace.
#[derive(Debug, Clone)]
pub struct ChildTokens {
    marker: char,
    pattern: Regex,
}

impl ChildTokens {
    pub fn new(marker: char, stem: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"(?:^|\s)((?:{})+{}\d+)\b",
            regex::escape(&marker.to_string()),
            regex::escape(stem)
        ))?;
        Ok(Self { marker, pattern })
    }

    /// Byte offset and depth of every child token in `row`.
    pub fn find(&self, row: &str) -> Vec<(usize, usize)> {
        self.pattern
            .captures_iter(row)
            .filter_map(|caps| caps.get(1))
            .map(|m| {
                let depth = m.as_str().chars().take_while(|c| *c == self.marker).count();
                (m.start(), depth)
            })
            .collect()
    }
}

/// A sprite nested under a root, `depth` levels down (depth >= 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteChild {
    pub depth: usize,
    pub text: String,
}

/// A root sprite row together with all rows nested beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteUnit {
    pub root: String,
    pub children: Vec<SpriteChild>,
}

impl SpriteUnit {
    pub fn root(text: impl Into<String>) -> Self {
        Self {
            root: text.into(),
            children: Vec::new(),
        }
    }

    /// Split a row that folds children into one line.
    ///
    /// `"    sprite2 > Flicker csprite1 > MovingAvatar ccsprite1 > img=x"`
    /// yields root `"    sprite2 > Flicker"` with children `csprite1`
    /// (depth 1) and `ccsprite1` (depth 2). Rows without child tokens are a
    /// unit with no children.
    pub fn parse_composite(row: &str, tokens: &ChildTokens) -> Result<Self, HierarchyError> {
        let found = tokens.find(row);
        let Some(&(first, _)) = found.first() else {
            return Ok(Self::root(row.trim_end()));
        };

        let root = row[..first].trim_end();
        if root.trim().is_empty() {
            return Err(HierarchyError::EmptyHierarchy(row.trim().to_string()));
        }

        let mut unit = Self::root(root);
        for (i, &(start, depth)) in found.iter().enumerate() {
            let end = found.get(i + 1).map_or(row.len(), |&(next, _)| next);
            unit.push_child(depth, row[start..end].trim_end())?;
        }
        Ok(unit)
    }

    /// Attach a child below the last entry of this unit.
    ///
    /// Depth may drop to any level but can only rise one level at a time.
    pub fn push_child(&mut self, depth: usize, text: &str) -> Result<(), HierarchyError> {
        let previous = self.children.last().map_or(0, |c| c.depth);
        if depth == 0 || depth > previous + 1 {
            return Err(HierarchyError::DepthSkip {
                row: text.trim().to_string(),
                depth,
            });
        }
        self.children.push(SpriteChild {
            depth,
            text: text.trim().to_string(),
        });
        Ok(())
    }

    /// Root line followed by one indented line per child.
    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.line_count());
        lines.push(self.root.clone());
        for child in &self.children {
            let width = BASE_INDENT + DEPTH_INDENT * child.depth;
            lines.push(format!("{:width$}{}", "", child.text, width = width));
        }
        lines
    }

    pub fn line_count(&self) -> usize {
        1 + self.children.len()
    }

    /// `(identifier, class)` for the root and each child, where the
    /// identifier is the text before `>` and the class is the first word
    /// after it.
    pub fn definitions(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        std::iter::once(self.root.as_str())
            .chain(self.children.iter().map(|c| c.text.as_str()))
            .map(split_definition)
    }
}

fn split_definition(text: &str) -> (&str, Option<&str>) {
    match text.split_once('>') {
        Some((ident, rest)) => (ident.trim(), rest.split_whitespace().next()),
        None => (text.trim(), None),
    }
}

fn indent_width(row: &str) -> usize {
    row.len() - row.trim_start().len()
}

/// Group SpriteSet rows into units.
///
/// The first row sets the root indentation. Rows at or left of it are
/// roots (split with [`SpriteUnit::parse_composite`]); rows indented further
/// are children of the nearest root above, their depth given by how many
/// distinct indentation levels enclose them.
pub fn group_sprite_rows<S: AsRef<str>>(
    rows: &[S],
    tokens: &ChildTokens,
) -> Result<Vec<SpriteUnit>, HierarchyError> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let root_indent = indent_width(first.as_ref());

    let mut units: Vec<SpriteUnit> = Vec::new();
    let mut indents: Vec<usize> = Vec::new();

    for row in rows {
        let row = row.as_ref();
        let indent = indent_width(row);

        if indent <= root_indent {
            units.push(SpriteUnit::parse_composite(row, tokens)?);
            indents.clear();
            indents.push(indent);
            continue;
        }

        let unit = units
            .last_mut()
            .ok_or_else(|| HierarchyError::EmptyHierarchy(row.trim().to_string()))?;
        while indents.last().is_some_and(|&open| open >= indent) {
            indents.pop();
        }
        let depth = indents.len();
        indents.push(indent);
        unit.push_child(depth, row)?;
    }

    Ok(units)
}

/// Render units in order into one flat row list.
pub fn expand_units(units: &[SpriteUnit]) -> Vec<String> {
    units.iter().flat_map(SpriteUnit::render).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::permute::all_orderings;

    fn tokens() -> ChildTokens {
        ChildTokens::new('c', "sprite").unwrap()
    }

    #[test]
    fn finds_child_tokens_with_depth() {
        let found = tokens().find("    sprite2 > Flicker csprite1 > Door ccsprite3 > img=x");
        assert_eq!(found, vec![(22, 1), (38, 2)]);
    }

    #[test]
    fn ignores_tokens_inside_attributes() {
        assert!(tokens().find("    sprite1 > Missile stype=csprite2").is_empty());
        assert!(tokens().find("    sprite1 > Immovable").is_empty());
    }

    #[test]
    fn plain_row_is_a_lone_root() {
        let unit = SpriteUnit::parse_composite("    sprite1 > Immovable color=BLUE", &tokens()).unwrap();
        assert_eq!(unit, SpriteUnit::root("    sprite1 > Immovable color=BLUE"));
        assert_eq!(unit.render(), vec!["    sprite1 > Immovable color=BLUE"]);
    }

    #[test]
    fn composite_row_splits_into_children() {
        let row = "    sprite2 > physicstype=GridPhysics csprite1 > MovingAvatar csprite2 > RandomNPC speed=0.6";
        let unit = SpriteUnit::parse_composite(row, &tokens()).unwrap();
        assert_eq!(unit.root, "    sprite2 > physicstype=GridPhysics");
        assert_eq!(
            unit.render(),
            vec![
                "    sprite2 > physicstype=GridPhysics",
                "      csprite1 > MovingAvatar",
                "      csprite2 > RandomNPC speed=0.6",
            ]
        );
    }

    #[test]
    fn grandchildren_indent_two_more_per_level() {
        let row = "    sprite3 > Resource csprite1 > Immovable ccsprite1 > img=gem ccsprite2 > img=coin csprite2 > Passive";
        let unit = SpriteUnit::parse_composite(row, &tokens()).unwrap();
        let depths: Vec<usize> = unit.children.iter().map(|c| c.depth).collect();
        assert_eq!(depths, vec![1, 2, 2, 1]);
        assert_eq!(
            unit.render(),
            vec![
                "    sprite3 > Resource",
                "      csprite1 > Immovable",
                "        ccsprite1 > img=gem",
                "        ccsprite2 > img=coin",
                "      csprite2 > Passive",
            ]
        );
    }

    #[test]
    fn depth_skip_is_rejected() {
        let row = "    sprite1 > Immovable ccsprite1 > img=gem";
        let err = SpriteUnit::parse_composite(row, &tokens()).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::DepthSkip {
                row: "ccsprite1 > img=gem".to_string(),
                depth: 2,
            }
        );
    }

    #[test]
    fn child_tokens_without_root_are_rejected() {
        let err = SpriteUnit::parse_composite("    csprite1 > MovingAvatar", &tokens()).unwrap_err();
        assert_eq!(err, HierarchyError::EmptyHierarchy("csprite1 > MovingAvatar".to_string()));
    }

    #[test]
    fn indented_rows_attach_to_nearest_root() {
        let rows = [
            "    wall > Immovable",
            "    moving > physicstype=GridPhysics",
            "      avatar > MovingAvatar",
            "        sword > Flicker",
            "      monster > RandomNPC",
            "    goal > Door",
        ];
        let units = group_sprite_rows(&rows, &tokens()).unwrap();
        assert_eq!(units.len(), 3);
        assert!(units[0].children.is_empty());
        let depths: Vec<usize> = units[1].children.iter().map(|c| c.depth).collect();
        assert_eq!(depths, vec![1, 2, 1]);
        assert_eq!(expand_units(&units), rows);
    }

    #[test]
    fn empty_sprite_set_has_no_units() {
        assert!(group_sprite_rows::<&str>(&[], &tokens()).unwrap().is_empty());
    }

    #[test]
    fn definitions_cover_root_and_children() {
        let unit = SpriteUnit::parse_composite(
            "    sprite2 > physicstype=GridPhysics csprite1 > MovingAvatar",
            &tokens(),
        )
        .unwrap();
        let defs: Vec<_> = unit.definitions().collect();
        assert_eq!(
            defs,
            vec![
                ("sprite2", Some("physicstype=GridPhysics")),
                ("csprite1", Some("MovingAvatar")),
            ]
        );
    }

    #[test]
    fn children_follow_their_root_in_every_ordering() {
        let rows = [
            "    sprite1 > Immovable",
            "    sprite2 > Resource csprite1 > Immovable ccsprite1 > img=gem",
            "    sprite3 > RandomNPC csprite2 > Missile",
        ];
        let units = group_sprite_rows(&rows, &tokens()).unwrap();

        for ordering in all_orderings(&units) {
            let lines = expand_units(&ordering);
            assert_eq!(lines.len(), 6);
            for unit in &units {
                let at = lines.iter().position(|l| *l == unit.root).unwrap();
                assert_eq!(&lines[at..at + unit.line_count()], unit.render().as_slice());
            }
        }
    }
}
