/// Required rows: every game needs an avatar and a wall, both in the
/// SpriteSet and in the LevelMapping.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::hierarchy::SpriteUnit;

/// What to do when a block lacks one of the required rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequiredRowPolicy {
    /// Append the canonical row for whatever is missing.
    #[default]
    Inject,
    /// Refuse the block.
    Reject,
    /// Do not check.
    Ignore,
}

/// A row every conforming block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredRow {
    AvatarSprite,
    WallSprite,
    AvatarMapping,
    WallMapping,
}

impl RequiredRow {
    /// Canonical row text without indentation. Mapping rows point at the
    /// canonical sprite; [`inject_required_rows`] retargets them at the
    /// block's own avatar or wall.
    pub fn canonical(&self) -> &'static str {
        match self {
            Self::AvatarSprite => "avatar > MovingAvatar",
            Self::WallSprite => "wall > Immovable",
            Self::AvatarMapping => "A > avatar",
            Self::WallMapping => "w > wall",
        }
    }
}

impl fmt::Display for RequiredRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AvatarSprite => "avatar sprite",
            Self::WallSprite => "wall sprite",
            Self::AvatarMapping => "avatar mapping 'A'",
            Self::WallMapping => "wall mapping 'w'",
        };
        f.write_str(name)
    }
}

fn avatar_definition(ident: &str, class: Option<&str>) -> bool {
    ident.to_ascii_lowercase().contains("avatar") || class.is_some_and(|c| c.ends_with("Avatar"))
}

fn wall_definition(ident: &str, _class: Option<&str>) -> bool {
    ident.to_ascii_lowercase().contains("wall")
}

/// A unit is avatar-like if any sprite in it is named like an avatar or
/// uses an `*Avatar` class.
pub fn is_avatar_like(unit: &SpriteUnit) -> bool {
    unit.definitions().any(|(ident, class)| avatar_definition(ident, class))
}

/// A unit is wall-like if any sprite in it is named like a wall.
pub fn is_wall_like(unit: &SpriteUnit) -> bool {
    unit.definitions().any(|(ident, class)| wall_definition(ident, class))
}

fn first_identifier<'a>(
    units: &'a [SpriteUnit],
    is_match: fn(&str, Option<&str>) -> bool,
) -> Option<&'a str> {
    units
        .iter()
        .flat_map(SpriteUnit::definitions)
        .find(|&(ident, class)| is_match(ident, class))
        .map(|(ident, _)| ident)
}

/// Identifier of the first avatar-like sprite, root or child.
pub fn avatar_identifier(units: &[SpriteUnit]) -> Option<&str> {
    first_identifier(units, avatar_definition)
}

/// Identifier of the first wall-like sprite, root or child.
pub fn wall_identifier(units: &[SpriteUnit]) -> Option<&str> {
    first_identifier(units, wall_definition)
}

fn mapping_key(row: &str) -> &str {
    row.split_once('>').map_or(row, |(key, _)| key).trim()
}

/// Required rows absent from the given SpriteSet units and LevelMapping
/// rows, in a fixed order.
pub fn missing_required_rows<S: AsRef<str>>(units: &[SpriteUnit], mapping: &[S]) -> Vec<RequiredRow> {
    let mut missing = Vec::new();
    if !units.iter().any(is_avatar_like) {
        missing.push(RequiredRow::AvatarSprite);
    }
    if !units.iter().any(is_wall_like) {
        missing.push(RequiredRow::WallSprite);
    }
    if !mapping.iter().any(|r| mapping_key(r.as_ref()) == "A") {
        missing.push(RequiredRow::AvatarMapping);
    }
    if !mapping.iter().any(|r| mapping_key(r.as_ref()) == "w") {
        missing.push(RequiredRow::WallMapping);
    }
    missing
}

const DEFAULT_INDENT: &str = "    ";

fn leading_whitespace(row: &str) -> &str {
    &row[..row.len() - row.trim_start().len()]
}

/// Append rows for everything missing. Returns what was added.
///
/// Missing sprites get their canonical row. Missing mappings point at the
/// block's first avatar-like or wall-like sprite, which is the canonical
/// `avatar` or `wall` only when that sprite was injected too. Injected rows
/// take the indentation of the section's first row (four spaces for an
/// empty section).
pub fn inject_required_rows(units: &mut Vec<SpriteUnit>, mapping: &mut Vec<String>) -> Vec<RequiredRow> {
    let missing = missing_required_rows(units.as_slice(), mapping.as_slice());
    let sprite_indent = units
        .first()
        .map_or(DEFAULT_INDENT, |u| leading_whitespace(&u.root))
        .to_string();
    let mapping_indent = mapping
        .first()
        .map_or(DEFAULT_INDENT, |r| leading_whitespace(r))
        .to_string();

    for row in &missing {
        if matches!(row, RequiredRow::AvatarSprite | RequiredRow::WallSprite) {
            units.push(SpriteUnit::root(format!("{}{}", sprite_indent, row.canonical())));
        }
    }

    for row in &missing {
        let (key, target) = match row {
            RequiredRow::AvatarMapping => ("A", avatar_identifier(units).unwrap_or("avatar")),
            RequiredRow::WallMapping => ("w", wall_identifier(units).unwrap_or("wall")),
            RequiredRow::AvatarSprite | RequiredRow::WallSprite => continue,
        };
        mapping.push(format!("{}{} > {}", mapping_indent, key, target));
    }
    missing
}
