//! All-or-nothing construction of a grid from level data.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use turtle_core::Location;

use crate::{
    cell::{Cell, CellKind},
    config::GridConfig,
    registry::{Component, ComponentRegistry},
    Grid,
};

/// Placement of a single component in a level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Type slot resolved through the component registry.
    pub slot: u16,
    /// Initial location of the component.
    pub location: Location,
    /// Opaque construction parameters understood by the slot's constructor.
    pub params: Vec<u8>,
}

impl ComponentSpec {
    /// Describes a component without construction parameters.
    #[must_use]
    pub fn new(slot: u16, location: Location) -> Self {
        Self {
            slot,
            location,
            params: Vec::new(),
        }
    }

    /// Describes a component whose parameters are encoded from `params`.
    pub fn with_params<T: Serialize>(
        slot: u16,
        location: Location,
        params: &T,
    ) -> Result<Self, bincode::Error> {
        Ok(Self {
            slot,
            location,
            params: bincode::serialize(params)?,
        })
    }
}

/// Largest number of cells a level may declare.
pub const MAX_SLOTS: u64 = 1 << 20;

/// In-memory level description supplied by a level loader.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSpec {
    /// Display name of the level.
    pub name: String,
    /// Number of rows.
    pub rows: u32,
    /// Number of columns.
    pub columns: u32,
    /// Seconds available, or `-1` for no limit.
    pub time_limit: i32,
    /// Food items the player must collect before the exit opens.
    pub food_requirement: u32,
    /// Terrain placements; unspecified slots become grass.
    pub cells: Vec<ComponentSpec>,
    /// Actor placements in insertion order.
    pub actors: Vec<ComponentSpec>,
}

/// Reasons level data could not be turned into a grid.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The level has no slots or more than [`MAX_SLOTS`].
    #[error("level dimensions {rows}x{columns} are invalid")]
    InvalidDimensions {
        /// Requested rows.
        rows: u32,
        /// Requested columns.
        columns: u32,
    },
    /// No constructor is registered for the slot.
    #[error("no component registered for slot {slot}")]
    UnknownSlot {
        /// Unregistered slot.
        slot: u16,
    },
    /// The constructor rejected the parameters.
    #[error("invalid parameters for slot {slot} at {location}")]
    InvalidParameters {
        /// Slot whose constructor failed.
        slot: u16,
        /// Location of the failing component.
        location: Location,
        /// Decoding failure.
        #[source]
        source: bincode::Error,
    },
    /// A component was placed outside the grid.
    #[error("slot {slot} placed outside the grid at {location}")]
    OutOfBounds {
        /// Slot of the misplaced component.
        slot: u16,
        /// Requested location.
        location: Location,
    },
    /// Two cells were placed in the same slot.
    #[error("more than one cell placed at {location}")]
    DuplicateCell {
        /// Contested location.
        location: Location,
    },
    /// A component was listed in the wrong layer.
    #[error("slot {slot} at {location} does not belong to the {expected} layer")]
    WrongLayer {
        /// Slot of the misplaced component.
        slot: u16,
        /// Location of the misplaced component.
        location: Location,
        /// Layer the component was listed in.
        expected: &'static str,
    },
    /// More than one player was placed.
    #[error("level places more than one player")]
    MultiplePlayers,
}

impl Grid {
    /// Builds a grid from level data, failing without side effects on bad input.
    pub fn from_level(
        level: &LevelSpec,
        registry: &ComponentRegistry,
        config: GridConfig,
    ) -> Result<Grid, LoadError> {
        let invalid = || LoadError::InvalidDimensions {
            rows: level.rows,
            columns: level.columns,
        };
        let slots = u64::from(level.rows) * u64::from(level.columns);
        if slots == 0 || slots > MAX_SLOTS {
            return Err(invalid());
        }
        let slot_count = usize::try_from(slots).map_err(|_| invalid())?;

        let mut grid = Grid::new(level.rows, level.columns, config);
        grid.name = level.name.clone();
        grid.time_left = level.time_limit.max(-1);
        grid.food_requirement = level.food_requirement;

        let mut filled = vec![false; slot_count];
        for spec in &level.cells {
            let index = grid.index(spec.location).ok_or(LoadError::OutOfBounds {
                slot: spec.slot,
                location: spec.location,
            })?;
            if filled[index] {
                return Err(LoadError::DuplicateCell {
                    location: spec.location,
                });
            }
            filled[index] = true;
            match construct(registry, spec)? {
                Component::Cell(mut cell) => {
                    cell.attach(spec.location);
                    grid.cells[index] = cell;
                }
                Component::Actor(_) => {
                    return Err(LoadError::WrongLayer {
                        slot: spec.slot,
                        location: spec.location,
                        expected: "cell",
                    })
                }
            }
        }

        let mut player_seen = false;
        for spec in &level.actors {
            if grid.index(spec.location).is_none() {
                return Err(LoadError::OutOfBounds {
                    slot: spec.slot,
                    location: spec.location,
                });
            }
            match construct(registry, spec)? {
                Component::Actor(actor) => {
                    if actor.is_player() {
                        if player_seen {
                            return Err(LoadError::MultiplePlayers);
                        }
                        player_seen = true;
                    }
                    let _ = grid.insert_actor(actor, spec.location);
                }
                Component::Cell(_) => {
                    return Err(LoadError::WrongLayer {
                        slot: spec.slot,
                        location: spec.location,
                        expected: "actor",
                    })
                }
            }
        }

        debug!(
            name = %grid.name,
            rows = level.rows,
            columns = level.columns,
            actors = grid.actors.len(),
            "level constructed"
        );
        Ok(grid)
    }
}

fn construct(registry: &ComponentRegistry, spec: &ComponentSpec) -> Result<Component, LoadError> {
    registry
        .construct(spec.slot, &spec.params)
        .ok_or(LoadError::UnknownSlot { slot: spec.slot })?
        .map_err(|source| LoadError::InvalidParameters {
            slot: spec.slot,
            location: spec.location,
            source,
        })
}

/// Fills a fresh cell layer with grass.
pub(crate) fn grass_layer(rows: u32, columns: u32) -> Vec<Cell> {
    let mut cells = Vec::new();
    for row in 0..rows {
        for column in 0..columns {
            let mut cell = Cell::new(CellKind::Grass);
            cell.attach(Location::new(row as i32, column as i32));
            cells.push(cell);
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{slots, BirdParams, DoorParams};
    use turtle_core::{ColorType, Direction};

    fn level(cells: Vec<ComponentSpec>, actors: Vec<ComponentSpec>) -> LevelSpec {
        LevelSpec {
            name: "test".to_string(),
            rows: 2,
            columns: 3,
            time_limit: 30,
            food_requirement: 1,
            cells,
            actors,
        }
    }

    fn build(level: &LevelSpec) -> Result<Grid, LoadError> {
        Grid::from_level(level, &ComponentRegistry::default(), GridConfig::default())
    }

    #[test]
    fn unspecified_slots_default_to_grass() {
        let grid = build(&level(
            vec![ComponentSpec::new(slots::WALL, Location::new(1, 2))],
            vec![ComponentSpec::new(slots::PLAYER, Location::new(0, 0))],
        ))
        .expect("level builds");

        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.columns(), 3);
        assert_eq!(grid.time_left(), 30);
        assert_eq!(grid.food_requirement(), 1);
        assert_eq!(
            grid.cell_at(Location::new(1, 2)).map(Cell::kind),
            Some(CellKind::Wall)
        );
        assert_eq!(
            grid.cell_at(Location::new(0, 1)).map(Cell::kind),
            Some(CellKind::Grass)
        );
        let player = grid.player().expect("player placed");
        assert_eq!(player.head_location(), Location::new(0, 0));
        assert!(player.is_attached());
    }

    #[test]
    fn parameterised_components_are_decoded() {
        let door = ComponentSpec::with_params(
            slots::DOOR,
            Location::new(0, 2),
            &DoorParams {
                color: ColorType::Purple,
            },
        )
        .expect("encode door");
        let bird = ComponentSpec::with_params(
            slots::BIRD,
            Location::new(1, 0),
            &BirdParams {
                heading: Direction::East,
            },
        )
        .expect("encode bird");

        let grid = build(&level(vec![door], vec![bird])).expect("level builds");
        assert_eq!(
            grid.cell_at(Location::new(0, 2)).map(Cell::kind),
            Some(CellKind::Door {
                color: ColorType::Purple
            })
        );
        assert_eq!(grid.actors()[0].heading(), Some(Direction::East));
    }

    #[test]
    fn unknown_slot_fails() {
        let error = build(&level(vec![ComponentSpec::new(77, Location::new(0, 0))], vec![]))
            .unwrap_err();
        assert!(matches!(error, LoadError::UnknownSlot { slot: 77 }));
    }

    #[test]
    fn out_of_bounds_fails() {
        let error = build(&level(
            vec![],
            vec![ComponentSpec::new(slots::FOOD, Location::new(5, 0))],
        ))
        .unwrap_err();
        assert!(matches!(error, LoadError::OutOfBounds { .. }));
    }

    #[test]
    fn duplicate_cells_fail() {
        let error = build(&level(
            vec![
                ComponentSpec::new(slots::WALL, Location::new(0, 0)),
                ComponentSpec::new(slots::WATER, Location::new(0, 0)),
            ],
            vec![],
        ))
        .unwrap_err();
        assert!(matches!(error, LoadError::DuplicateCell { .. }));
    }

    #[test]
    fn layers_are_enforced() {
        let error = build(&level(
            vec![ComponentSpec::new(slots::PLAYER, Location::new(0, 0))],
            vec![],
        ))
        .unwrap_err();
        assert!(matches!(error, LoadError::WrongLayer { expected: "cell", .. }));

        let error = build(&level(
            vec![],
            vec![ComponentSpec::new(slots::WALL, Location::new(0, 0))],
        ))
        .unwrap_err();
        assert!(matches!(error, LoadError::WrongLayer { expected: "actor", .. }));
    }

    #[test]
    fn second_player_fails() {
        let error = build(&level(
            vec![],
            vec![
                ComponentSpec::new(slots::PLAYER, Location::new(0, 0)),
                ComponentSpec::new(slots::PLAYER, Location::new(0, 1)),
            ],
        ))
        .unwrap_err();
        assert!(matches!(error, LoadError::MultiplePlayers));
    }

    #[test]
    fn corrupt_params_fail() {
        let mut door = ComponentSpec::new(slots::DOOR, Location::new(0, 0));
        door.params = vec![0xff];
        let error = build(&level(vec![door], vec![])).unwrap_err();
        assert!(matches!(error, LoadError::InvalidParameters { slot: 6, .. }));
    }

    #[test]
    fn empty_dimensions_fail() {
        let mut spec = level(vec![], vec![]);
        spec.rows = 0;
        assert!(matches!(
            build(&spec).unwrap_err(),
            LoadError::InvalidDimensions { .. }
        ));
    }

    #[test]
    fn oversized_dimensions_fail_before_allocating() {
        let mut spec = level(vec![], vec![]);
        spec.rows = i32::MAX as u32;
        spec.columns = i32::MAX as u32;
        assert!(matches!(
            build(&spec).unwrap_err(),
            LoadError::InvalidDimensions { .. }
        ));

        spec.rows = 1;
        spec.columns = MAX_SLOTS as u32 + 1;
        assert!(matches!(
            build(&spec).unwrap_err(),
            LoadError::InvalidDimensions { .. }
        ));
    }
}
