#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Turtle grid engine.
//!
//! This crate defines the value types and the message surface that connect
//! hosts with the authoritative grid. Hosts submit [`Command`] values, the
//! grid executes them through its `apply` entry point and reports every
//! observable state change as [`Event`] values in deterministic order.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

/// Position of a component on the grid expressed as a row and a column.
///
/// The value `(-1, -1)` marks an unplaced component. Every location with a
/// negative coordinate is considered invalid and all invalid locations
/// compare equal to one another.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Location {
    row: i32,
    column: i32,
}

impl Location {
    /// Canonical unplaced location.
    pub const INVALID: Location = Location::new(-1, -1);

    /// Creates a location at the provided row and column.
    #[must_use]
    pub const fn new(row: i32, column: i32) -> Self {
        Self { row, column }
    }

    /// Row index of the location.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Column index of the location.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Reports whether both coordinates are non-negative.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.row >= 0 && self.column >= 0
    }

    /// Moves the location to the provided row and column.
    pub fn set(&mut self, row: i32, column: i32) {
        self.row = row;
        self.column = column;
    }

    /// Replaces the row index.
    pub fn set_row(&mut self, row: i32) {
        self.row = row;
    }

    /// Replaces the column index.
    pub fn set_column(&mut self, column: i32) {
        self.column = column;
    }

    /// Copies the coordinates of another location into this one.
    pub fn set_from(&mut self, other: Location) {
        self.row = other.row;
        self.column = other.column;
    }

    /// Location one step away in the provided direction.
    #[must_use]
    pub const fn offset(self, direction: Direction) -> Self {
        let (row_delta, column_delta) = direction.delta();
        Self::new(self.row + row_delta, self.column + column_delta)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::INVALID
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        if !self.is_valid() && !other.is_valid() {
            return true;
        }
        self.row == other.row && self.column == other.column
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.is_valid() {
            self.row.hash(state);
            self.column.hash(state);
        } else {
            Self::INVALID.row.hash(state);
            Self::INVALID.column.hash(state);
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}C{}", self.row, self.column)
    }
}

/// Named priority used to arbitrate contested moves.
///
/// Lower priority values take precedence. Equality and ordering consider the
/// priority only; the name is informational.
#[derive(Clone, Copy, Debug)]
pub struct DominanceLevel {
    name: &'static str,
    priority: i32,
}

impl DominanceLevel {
    /// Dominance of the player-controlled actor.
    pub const PLAYER: DominanceLevel = DominanceLevel::new("Player", 0);
    /// Dominance of hostile autonomous actors.
    pub const ENEMY: DominanceLevel = DominanceLevel::new("Enemy", 100);
    /// Dominance of collectible items.
    pub const ITEM: DominanceLevel = DominanceLevel::new("Item", 200);
    /// Dominance of static fixtures.
    pub const FIXTURE: DominanceLevel = DominanceLevel::new("Fixture", 300);

    /// Creates a new dominance level.
    #[must_use]
    pub const fn new(name: &'static str, priority: i32) -> Self {
        Self { name, priority }
    }

    /// Human-readable name of the level.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Numeric priority; lower wins.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }
}

impl PartialEq for DominanceLevel {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Eq for DominanceLevel {}

impl PartialOrd for DominanceLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DominanceLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}

/// Cardinal movement directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All directions in their numeric order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Maps the numeric direction codes `0..=3` to a direction.
    #[must_use]
    pub const fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::North),
            1 => Some(Self::East),
            2 => Some(Self::South),
            3 => Some(Self::West),
            _ => None,
        }
    }

    /// Numeric code of the direction.
    #[must_use]
    pub const fn index(self) -> i32 {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    /// Direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Row and column delta of a single step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (-1, 0),
            Self::East => (0, 1),
            Self::South => (1, 0),
            Self::West => (0, -1),
        }
    }
}

/// Unique identifier assigned to an actor by its grid.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Colors shared by keys and doors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorType {
    /// Yellow variant.
    Yellow,
    /// Orange variant.
    Orange,
    /// Red variant.
    Red,
    /// Purple variant.
    Purple,
    /// Blue variant.
    Blue,
    /// Green variant.
    Green,
}

impl ColorType {
    /// All colors in tile-set order.
    pub const ALL: [ColorType; 6] = [
        ColorType::Yellow,
        ColorType::Orange,
        ColorType::Red,
        ColorType::Purple,
        ColorType::Blue,
        ColorType::Green,
    ];

    /// Image frame of the colored variant given the frame of the yellow one.
    #[must_use]
    pub const fn image_frame(self, offset: u32) -> u32 {
        offset + self as u32
    }
}

/// Single player input captured for deterministic playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordedInput {
    /// Frame during which the input was applied.
    pub frame: u64,
    /// Direction the player attempted to move in.
    pub direction: Direction,
}

/// Terminal result of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The player reached the exit with the food requirement met.
    Won,
    /// The player finished dying.
    PlayerDied,
    /// The time limit reached zero.
    TimeExpired,
    /// Playback ran out of recorded input before the level concluded.
    PlaybackFinished,
}

/// Progress of a level as observed by hosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridStatus {
    /// The level has not concluded yet.
    InProgress,
    /// The level concluded with the provided outcome.
    Concluded(Outcome),
}

/// Commands that express all permissible grid mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation by one tick.
    UpdateFrame {
        /// Frame number the host expects; the grid simulates its own next frame.
        frame: u64,
    },
    /// Requests that the player attempt a single step.
    MovePlayer {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Starts or pauses the simulation.
    SetPlaying {
        /// Whether the grid should be simulating.
        playing: bool,
    },
    /// Clears the recording and begins capturing player input.
    StartRecording,
    /// Stops capturing or replaying input.
    StopRecording,
    /// Replays the loaded recording instead of live input.
    StartPlayback,
}

/// Events broadcast by the grid after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a tick completed.
    FrameAdvanced {
        /// Frame number of the completed tick.
        frame: u64,
    },
    /// Confirms that an actor moved between two locations.
    ActorMoved {
        /// Identifier of the actor that moved.
        actor: ActorId,
        /// Location occupied before the move.
        from: Location,
        /// Location occupied after the move.
        to: Location,
    },
    /// Announces that an actor started dying.
    ActorKilled {
        /// Identifier of the actor that started dying.
        actor: ActorId,
    },
    /// Announces that an actor collected an item.
    ItemCollected {
        /// Identifier of the collecting actor.
        collector: ActorId,
        /// Identifier the item had before it was removed.
        item: ActorId,
    },
    /// Confirms that an actor was removed from the grid.
    ActorRemoved {
        /// Identifier of the removed actor.
        actor: ActorId,
    },
    /// Confirms that a cell was replaced by its pending transform target.
    CellTransformed {
        /// Slot whose cell changed.
        location: Location,
    },
    /// Reports that the remaining time decreased.
    TimeDecremented {
        /// Remaining time after the decrement.
        time_left: i32,
    },
    /// Reports that the food requirement changed.
    FoodRequirementChanged {
        /// Number of food items still required.
        remaining: u32,
    },
    /// Announces that the simulation started or paused.
    PlayingChanged {
        /// Whether the grid is simulating.
        playing: bool,
    },
    /// Announces that the level concluded.
    Concluded {
        /// Terminal result of the level.
        outcome: Outcome,
    },
}
