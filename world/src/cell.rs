//! Immovable terrain occupying exactly one grid slot.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use turtle_core::{ColorType, Location};

use crate::{
    actor::{Actor, Attacker},
    config::TileSet,
};

const GRASS_FRAME: u32 = 1;
const WALL_FRAME: u32 = 2;
const SAND_FRAME: u32 = 25;
const DOOR_OFFSET_FRAME: u32 = 32;
const WATER_FRAMES: [u32; 5] = [12, 13, 14, 15, 16];
const FIRE_FRAMES: [u32; 3] = [17, 18, 19];
const EXIT_FRAMES: [u32; 4] = [20, 21, 22, 23];
const WATER_TO_SAND_FRAMES: [u32; 5] = [30, 29, 28, 27, 26];

/// Terrain variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Open ground.
    Grass,
    /// Open ground left behind by drained water.
    Sand,
    /// Impassable terrain.
    Wall,
    /// Drowns every visitor that is not immune.
    Water,
    /// Burns every visitor that is not immune.
    Fire,
    /// Completes the level once the food requirement is met.
    Exit,
    /// Opens for a player carrying a key of the same color.
    Door {
        /// Color of the key that opens the door.
        color: ColorType,
    },
}

/// Level-wide facts a cell may consult while deciding a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileContext {
    /// Food items the player still needs to collect.
    pub food_remaining: u32,
}

/// Misuse of the cell transform protocol.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    /// The cell being transformed does not belong to a grid.
    #[error("cell is not placed on a grid")]
    Detached,
    /// The replacement already belongs to a grid.
    #[error("replacement cell is already placed on a grid")]
    TargetAttached,
    /// The addressed slot lies outside the grid.
    #[error("location {location} is outside the grid")]
    OutOfBounds {
        /// Requested slot.
        location: Location,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct PendingTransform {
    target: Box<Cell>,
    frames_left: u32,
    wait_frames: u32,
}

/// Terrain placed in a single grid slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    kind: CellKind,
    slot: Option<Location>,
    head: Location,
    trailing: Location,
    animation_tick: u32,
    transform: Option<PendingTransform>,
}

impl Cell {
    /// Creates a detached cell of the provided kind.
    #[must_use]
    pub fn new(kind: CellKind) -> Self {
        Self {
            kind,
            slot: None,
            head: Location::INVALID,
            trailing: Location::INVALID,
            animation_tick: 0,
            transform: None,
        }
    }

    /// Terrain variant.
    #[must_use]
    pub fn kind(&self) -> CellKind {
        self.kind
    }

    /// Reports whether the cell belongs to a grid.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.slot.is_some()
    }

    /// Location of the cell.
    #[must_use]
    pub fn head_location(&self) -> Location {
        self.head
    }

    /// Cells never move, so this always equals the head location.
    #[must_use]
    pub fn trailing_location(&self) -> Location {
        self.trailing
    }

    /// Reports whether a transform is pending.
    #[must_use]
    pub fn is_transforming(&self) -> bool {
        self.transform.is_some()
    }

    /// Ticks left before the pending transform swaps the cell out.
    #[must_use]
    pub fn frames_until_transform(&self) -> Option<u32> {
        self.transform.as_ref().map(|pending| pending.frames_left)
    }

    /// Variant the cell will turn into, if a transform is pending.
    #[must_use]
    pub fn transform_target(&self) -> Option<CellKind> {
        self.transform.as_ref().map(|pending| pending.target.kind)
    }

    /// Side-effect-free preview of [`Cell::pass`].
    #[must_use]
    pub fn check_pass(&self, visitor: &Actor, _context: &TileContext) -> bool {
        match self.kind {
            CellKind::Wall => false,
            CellKind::Door { color } => visitor.has_key(color),
            CellKind::Grass
            | CellKind::Sand
            | CellKind::Water
            | CellKind::Fire
            | CellKind::Exit => true,
        }
    }

    /// Executes the passage of `visitor` onto this cell.
    ///
    /// Hazards kill the visitor and still let it through.
    pub fn pass(&mut self, visitor: &mut Actor, context: &TileContext) -> bool {
        match self.kind {
            CellKind::Grass | CellKind::Sand => true,
            CellKind::Wall => false,
            CellKind::Water | CellKind::Fire => {
                let _ = visitor.die(Attacker::Cell(self.kind));
                true
            }
            CellKind::Exit => {
                if visitor.is_player() && !visitor.is_dying() && context.food_remaining == 0 {
                    visitor.mark_winner();
                }
                true
            }
            CellKind::Door { color } => {
                if !visitor.take_key(color) {
                    return false;
                }
                if let Err(error) = self.transform_to(Cell::new(CellKind::Grass), 0) {
                    debug!(%error, location = %self.head, "door could not open");
                }
                true
            }
        }
    }

    /// Schedules replacement of this cell by `other` after `wait_frames` ticks.
    ///
    /// Returns `Ok(false)` without effect when a transform is already pending.
    pub fn transform_to(&mut self, other: Cell, wait_frames: u32) -> Result<bool, TransformError> {
        if self.transform.is_some() {
            return Ok(false);
        }
        if self.slot.is_none() {
            return Err(TransformError::Detached);
        }
        if other.is_attached() {
            return Err(TransformError::TargetAttached);
        }

        self.transform = Some(PendingTransform {
            target: Box::new(other),
            frames_left: wait_frames,
            wait_frames,
        });
        Ok(true)
    }

    /// Drains water into sand over the length of the drain animation.
    ///
    /// Other terrain is left untouched and reports `Ok(false)`.
    pub fn transform_to_sand(&mut self, tile_set: &TileSet) -> Result<bool, TransformError> {
        if self.kind != CellKind::Water {
            return Ok(false);
        }
        let wait = WATER_TO_SAND_FRAMES.len() as u32 * tile_set.animation_frame_change;
        self.transform_to(Cell::new(CellKind::Sand), wait)
    }

    /// Image frame the cell requests from the tile set.
    #[must_use]
    pub fn image_frame(&self, tile_set: &TileSet) -> u32 {
        match self.kind {
            CellKind::Grass => GRASS_FRAME,
            CellKind::Sand => SAND_FRAME,
            CellKind::Wall => WALL_FRAME,
            CellKind::Water => tile_set.animate(&WATER_FRAMES, self.animation_tick),
            CellKind::Fire => tile_set.animate(&FIRE_FRAMES, self.animation_tick),
            CellKind::Exit => tile_set.animate(&EXIT_FRAMES, self.animation_tick),
            CellKind::Door { color } => color.image_frame(DOOR_OFFSET_FRAME),
        }
    }

    /// Frame layered over draining water, once the first drain frame is due.
    #[must_use]
    pub fn overlay_frame(&self, tile_set: &TileSet) -> Option<u32> {
        let pending = self.transform.as_ref()?;
        if self.kind != CellKind::Water || pending.target.kind != CellKind::Sand {
            return None;
        }
        let change = tile_set.animation_frame_change.max(1);
        let elapsed = pending.wait_frames - pending.frames_left;
        let step = (elapsed / change) as usize;
        if step == 0 {
            return None;
        }
        WATER_TO_SAND_FRAMES
            .get(step - 1)
            .or(WATER_TO_SAND_FRAMES.last())
            .copied()
    }

    /// Advances animation and the transform countdown by one tick.
    ///
    /// Returns the replacement once the countdown expires; the owning grid swaps
    /// it into this cell's slot.
    pub fn update_frame(&mut self, _frame: u64) -> Option<Cell> {
        self.animation_tick = self.animation_tick.wrapping_add(1);
        let pending = self.transform.as_mut()?;
        if pending.frames_left > 0 {
            pending.frames_left -= 1;
            return None;
        }
        self.transform.take().map(|pending| *pending.target)
    }

    pub(crate) fn attach(&mut self, location: Location) {
        self.slot = Some(location);
        self.head = location;
        self.trailing = location;
    }

    pub(crate) fn detach(&mut self) {
        self.slot = None;
    }
}
