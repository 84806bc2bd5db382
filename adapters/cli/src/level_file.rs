//! Text level format: TOML metadata plus a character map.
//!
//! ```toml
//! name = "meadow"
//! time_limit = 60
//! food_requirement = 1
//! map = [
//!     "P.f#E",
//!     "~~..<",
//! ]
//! ```

use serde::Deserialize;
use thiserror::Error;
use turtle_core::{ColorType, Direction, Location};
use turtle_world::{slots, BirdParams, ComponentSpec, DoorParams, KeyParams, LevelSpec};

/// Level file could not be turned into a level description.
#[derive(Debug, Error)]
pub(crate) enum LevelFileError {
    /// The TOML document was malformed.
    #[error("invalid level file: {0}")]
    Toml(#[from] toml::de::Error),
    /// The map has no rows or no columns.
    #[error("level map is empty")]
    EmptyMap,
    /// A map row has a different width than the first row.
    #[error("map row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        /// Offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A map character has no meaning.
    #[error("unknown map glyph '{glyph}' at {location}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Slot of the character.
        location: Location,
    },
    /// Construction parameters could not be encoded.
    #[error("could not encode component parameters: {0}")]
    Params(#[from] bincode::Error),
}

#[derive(Debug, Deserialize)]
struct LevelFile {
    #[serde(default)]
    name: String,
    #[serde(default = "default_time_limit")]
    time_limit: i32,
    #[serde(default)]
    food_requirement: u32,
    map: Vec<String>,
}

fn default_time_limit() -> i32 {
    -1
}

enum Glyph {
    Cell(ComponentSpec),
    Actor(ComponentSpec),
    Empty,
}

/// Parses a level file into a level description.
pub(crate) fn parse_level(content: &str) -> Result<LevelSpec, LevelFileError> {
    let file: LevelFile = toml::from_str(content)?;
    let rows: Vec<Vec<char>> = file.map.iter().map(|row| row.chars().collect()).collect();
    let columns = rows.first().map_or(0, Vec::len);
    if rows.is_empty() || columns == 0 {
        return Err(LevelFileError::EmptyMap);
    }

    let mut cells = Vec::new();
    let mut actors = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        if row.len() != columns {
            return Err(LevelFileError::RaggedRow {
                row: row_index,
                expected: columns,
                found: row.len(),
            });
        }
        for (column_index, glyph) in row.iter().enumerate() {
            let location = Location::new(row_index as i32, column_index as i32);
            match glyph_component(*glyph, location)? {
                Glyph::Cell(spec) => cells.push(spec),
                Glyph::Actor(spec) => actors.push(spec),
                Glyph::Empty => {}
            }
        }
    }

    Ok(LevelSpec {
        name: file.name,
        rows: rows.len() as u32,
        columns: columns as u32,
        time_limit: file.time_limit,
        food_requirement: file.food_requirement,
        cells,
        actors,
    })
}

fn glyph_component(glyph: char, location: Location) -> Result<Glyph, LevelFileError> {
    let cell = |slot| Glyph::Cell(ComponentSpec::new(slot, location));
    let actor = |slot| Glyph::Actor(ComponentSpec::new(slot, location));
    let bird = |heading| -> Result<Glyph, LevelFileError> {
        Ok(Glyph::Actor(ComponentSpec::with_params(
            slots::BIRD,
            location,
            &BirdParams { heading },
        )?))
    };

    let component = match glyph {
        '.' => Glyph::Empty,
        ':' => cell(slots::SAND),
        '#' => cell(slots::WALL),
        '~' => cell(slots::WATER),
        '*' => cell(slots::FIRE),
        'E' => cell(slots::EXIT),
        'P' => actor(slots::PLAYER),
        'f' => actor(slots::FOOD),
        '^' => bird(Direction::North)?,
        '>' => bird(Direction::East)?,
        'v' => bird(Direction::South)?,
        '<' => bird(Direction::West)?,
        other => match color_glyph(other) {
            Some((color, true)) => Glyph::Cell(ComponentSpec::with_params(
                slots::DOOR,
                location,
                &DoorParams { color },
            )?),
            Some((color, false)) => Glyph::Actor(ComponentSpec::with_params(
                slots::KEY,
                location,
                &KeyParams { color },
            )?),
            None => return Err(LevelFileError::UnknownGlyph { glyph, location }),
        },
    };
    Ok(component)
}

/// Maps door (uppercase) and key (lowercase) letters to their color.
fn color_glyph(glyph: char) -> Option<(ColorType, bool)> {
    let color = match glyph.to_ascii_lowercase() {
        'y' => ColorType::Yellow,
        'o' => ColorType::Orange,
        'r' => ColorType::Red,
        'u' => ColorType::Purple,
        'b' => ColorType::Blue,
        'g' => ColorType::Green,
        _ => return None,
    };
    Some((color, glyph.is_ascii_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEADOW: &str = r#"
name = "meadow"
time_limit = 60
food_requirement = 1
map = [
    "P.fRE",
    "~:r.<",
]
"#;

    #[test]
    fn parses_metadata_and_layers() {
        let level = parse_level(MEADOW).expect("level parses");
        assert_eq!(level.name, "meadow");
        assert_eq!((level.rows, level.columns), (2, 5));
        assert_eq!(level.time_limit, 60);
        assert_eq!(level.food_requirement, 1);

        let cell_slots: Vec<u16> = level.cells.iter().map(|spec| spec.slot).collect();
        assert_eq!(
            cell_slots,
            vec![slots::DOOR, slots::EXIT, slots::WATER, slots::SAND]
        );
        let actor_slots: Vec<u16> = level.actors.iter().map(|spec| spec.slot).collect();
        assert_eq!(
            actor_slots,
            vec![slots::PLAYER, slots::FOOD, slots::KEY, slots::BIRD]
        );
        assert_eq!(level.actors[3].location, Location::new(1, 4));
    }

    #[test]
    fn time_limit_defaults_to_untimed() {
        let level = parse_level("map = [\"P\"]").expect("level parses");
        assert_eq!(level.time_limit, -1);
        assert_eq!(level.food_requirement, 0);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let error = parse_level("map = [\"P..\", \"..\"]").unwrap_err();
        assert!(matches!(
            error,
            LevelFileError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn unknown_glyphs_are_rejected() {
        let error = parse_level("map = [\"P?\"]").unwrap_err();
        assert!(matches!(
            error,
            LevelFileError::UnknownGlyph { glyph: '?', .. }
        ));
    }

    #[test]
    fn empty_map_is_rejected() {
        assert!(matches!(
            parse_level("map = []").unwrap_err(),
            LevelFileError::EmptyMap
        ));
    }
}
