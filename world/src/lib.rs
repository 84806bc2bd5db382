#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state for Turtle levels.
//!
//! The [`Grid`] owns one terrain [`Cell`] per slot and an ordered list of
//! [`Actor`]s. Every mutation funnels through [`apply`] or the grid's own
//! methods and is reported through [`Event`]s.

mod actor;
mod cell;
mod config;
mod level;
mod recording;
mod registry;
mod snapshot;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use turtle_core::{
    ActorId, Command, Direction, Event, GridStatus, Location, Outcome, RecordedInput,
};

pub use actor::{Actor, ActorKind, Attacker, Interaction, ItemKind, DYING_FRAMES};
pub use cell::{Cell, CellKind, TileContext, TransformError};
pub use config::{ConfigError, GridConfig, TileSet};
pub use level::{ComponentSpec, LevelSpec, LoadError, MAX_SLOTS};
pub use recording::{Recording, RecordingError, RecordingMode, PLAYBACK_GRACE_FRAMES};
pub use registry::{
    slots, BirdParams, Component, ComponentRegistry, Constructor, DoorParams, KeyParams,
};
pub use snapshot::{Snapshot, SnapshotError};

/// Misuse of the grid's placement operations.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// The location lies outside the grid.
    #[error("location {location} is outside the grid")]
    OutOfBounds {
        /// Requested location.
        location: Location,
    },
    /// The actor already belongs to a grid.
    #[error("actor is already placed on a grid")]
    ActorAttached,
    /// The cell already belongs to a grid.
    #[error("cell is already placed on a grid")]
    CellAttached,
    /// The grid already holds a player.
    #[error("grid already holds a player")]
    DuplicatePlayer,
}

/// Level state: terrain, actors, clock, food requirement and recording.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    name: String,
    rows: u32,
    columns: u32,
    cells: Vec<Cell>,
    actors: Vec<Actor>,
    next_actor_id: u32,
    time_left: i32,
    food_requirement: u32,
    playing: bool,
    status: GridStatus,
    recording: Recording,
    frame: u64,
    config: GridConfig,
}

impl Grid {
    /// Creates a grass-filled grid without actors, time limit or food requirement.
    ///
    /// The grid starts playing.
    #[must_use]
    pub fn new(rows: u32, columns: u32, config: GridConfig) -> Self {
        Self {
            name: String::new(),
            rows,
            columns,
            cells: level::grass_layer(rows, columns),
            actors: Vec::new(),
            next_actor_id: 0,
            time_left: -1,
            food_requirement: 0,
            playing: true,
            status: GridStatus::InProgress,
            recording: Recording::new(),
            frame: 0,
            config,
        }
    }

    /// Display name of the level.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Configuration injected at construction.
    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Pixels per tick renderers use to interpolate between trailing and head.
    #[must_use]
    pub fn move_speed(&self) -> f32 {
        self.config.move_speed
    }

    /// Seconds left, or `-1` when the level is untimed.
    #[must_use]
    pub fn time_left(&self) -> i32 {
        self.time_left
    }

    /// Food items the player still needs to collect.
    #[must_use]
    pub fn food_requirement(&self) -> u32 {
        self.food_requirement
    }

    /// Reports whether the simulation is running.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Progress of the level.
    #[must_use]
    pub fn status(&self) -> GridStatus {
        self.status
    }

    /// Number of the next frame to simulate.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Captured or loaded player input.
    #[must_use]
    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Level-wide facts handed to cells while they decide a pass.
    #[must_use]
    pub fn tile_context(&self) -> TileContext {
        TileContext {
            food_remaining: self.food_requirement,
        }
    }

    /// Cell occupying the provided slot.
    #[must_use]
    pub fn cell_at(&self, location: Location) -> Option<&Cell> {
        self.index(location).map(|index| &self.cells[index])
    }

    /// All actors in insertion order.
    #[must_use]
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Actor with the provided identifier.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.id() == Some(id))
    }

    /// Actors whose head occupies the provided slot, in insertion order.
    pub fn actors_at(&self, location: Location) -> impl Iterator<Item = &Actor> + '_ {
        self.actors
            .iter()
            .filter(move |actor| actor.head_location() == location)
    }

    /// The player, if one is placed.
    #[must_use]
    pub fn player(&self) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.is_player())
    }

    /// Identifier of the player, if one is placed.
    #[must_use]
    pub fn player_id(&self) -> Option<ActorId> {
        self.player().and_then(Actor::id)
    }

    /// Replaces the cell in a slot, returning the detached previous cell.
    pub fn place_cell(&mut self, location: Location, cell: Cell) -> Result<Cell, GridError> {
        let index = self
            .index(location)
            .ok_or(GridError::OutOfBounds { location })?;
        if cell.is_attached() {
            return Err(GridError::CellAttached);
        }
        Ok(self.swap_in(index, cell))
    }

    /// Resets a slot to grass, returning the detached previous cell.
    pub fn remove_cell(&mut self, location: Location) -> Result<Cell, GridError> {
        self.place_cell(location, Cell::new(CellKind::Grass))
    }

    /// Places a detached actor and allocates its identifier.
    pub fn add_actor(&mut self, actor: Actor, location: Location) -> Result<ActorId, GridError> {
        if self.index(location).is_none() {
            return Err(GridError::OutOfBounds { location });
        }
        if actor.is_attached() {
            return Err(GridError::ActorAttached);
        }
        if actor.is_player() && self.player().is_some() {
            return Err(GridError::DuplicatePlayer);
        }
        Ok(self.insert_actor(actor, location))
    }

    /// Detaches and returns the actor with the provided identifier.
    pub fn remove_actor(&mut self, id: ActorId) -> Option<Actor> {
        let index = self.actor_index(id)?;
        let mut actor = self.actors.remove(index);
        actor.detach();
        Some(actor)
    }

    /// Removes actors that finished dying. The player is never removed.
    pub fn remove_dead_actors(&mut self, out_events: &mut Vec<Event>) {
        let dead: Vec<ActorId> = self
            .actors
            .iter()
            .filter(|actor| !actor.is_player() && actor.is_dead())
            .filter_map(Actor::id)
            .collect();
        for id in dead {
            if self.remove_actor(id).is_some() {
                out_events.push(Event::ActorRemoved { actor: id });
            }
        }
    }

    /// Attempts to move an actor into the slot at `row`, `column`.
    ///
    /// The destination cell is consulted first, then every other occupant in
    /// dominance order. A rejected precheck leaves the grid untouched.
    pub fn move_actor(
        &mut self,
        id: ActorId,
        row: i32,
        column: i32,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let destination = Location::new(row, column);
        let Some(cell_index) = self.index(destination) else {
            debug!(actor = id.get(), %destination, "move rejected: outside the grid");
            return false;
        };
        let Some(mover_index) = self.actor_index(id) else {
            return false;
        };

        let context = self.tile_context();
        if !self.cells[cell_index].check_pass(&self.actors[mover_index], &context) {
            debug!(actor = id.get(), %destination, "move rejected by terrain");
            return false;
        }

        let occupants = self.occupants_by_dominance(mover_index, destination);
        let mover = &self.actors[mover_index];
        if occupants
            .iter()
            .any(|&occupant| !self.actors[occupant].check_interact(mover))
        {
            debug!(actor = id.get(), %destination, "move rejected by occupant");
            return false;
        }

        let was_dying: Vec<bool> = self.actors.iter().map(Actor::is_dying).collect();
        let mut collected = Vec::new();
        let mut food_collected = false;
        let mut blocked = false;
        for &occupant_index in &occupants {
            let (occupant, mover) = pair_mut(&mut self.actors, occupant_index, mover_index);
            match occupant.interact(mover) {
                Interaction::Block => {
                    blocked = true;
                    break;
                }
                Interaction::Allow => {}
                Interaction::Collect => {
                    if matches!(occupant.kind(), ActorKind::Item(ItemKind::Food)) {
                        self.food_requirement = self.food_requirement.saturating_sub(1);
                        food_collected = true;
                    }
                    collected.push(occupant_index);
                }
            }
        }

        let passed = !blocked && {
            let context = self.tile_context();
            self.cells[cell_index].pass(&mut self.actors[mover_index], &context)
        };

        for (actor, was_dying) in self.actors.iter().zip(was_dying) {
            if actor.is_dying() && !was_dying {
                if let Some(killed) = actor.id() {
                    out_events.push(Event::ActorKilled { actor: killed });
                }
            }
        }

        if passed {
            let mover = &mut self.actors[mover_index];
            let from = mover.head_location();
            mover.relocate(destination);
            out_events.push(Event::ActorMoved {
                actor: id,
                from,
                to: destination,
            });
        } else {
            debug!(actor = id.get(), %destination, "move rejected during passage");
        }

        for &index in &collected {
            if let Some(item) = self.actors[index].id() {
                out_events.push(Event::ItemCollected {
                    collector: id,
                    item,
                });
                out_events.push(Event::ActorRemoved { actor: item });
            }
        }
        collected.sort_unstable_by(|a, b| b.cmp(a));
        for index in collected {
            self.actors.remove(index).detach();
        }
        if food_collected {
            out_events.push(Event::FoodRequirementChanged {
                remaining: self.food_requirement,
            });
        }

        passed
    }

    /// Attempts to move an actor one slot in the provided direction.
    pub fn traverse_direction(
        &mut self,
        id: ActorId,
        direction: Direction,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let Some(actor) = self.actor(id) else {
            return false;
        };
        let destination = actor.head_location().offset(direction);
        self.move_actor(id, destination.row(), destination.column(), out_events)
    }

    /// Attempts a player step from live input.
    ///
    /// Ignored while paused, after the level concluded, during playback, or
    /// once the player started dying. Attempts are captured while recording.
    pub fn move_player(&mut self, direction: Direction, out_events: &mut Vec<Event>) -> bool {
        if !self.playing || self.status != GridStatus::InProgress || self.recording.is_playing() {
            return false;
        }
        self.step_player(direction, true, out_events)
    }

    /// Starts or pauses the simulation. Returns whether the state changed.
    ///
    /// A concluded grid cannot be resumed.
    pub fn set_playing(&mut self, playing: bool, out_events: &mut Vec<Event>) -> bool {
        if self.playing == playing {
            return false;
        }
        if playing && self.status != GridStatus::InProgress {
            return false;
        }
        self.playing = playing;
        out_events.push(Event::PlayingChanged { playing });
        true
    }

    /// Schedules replacement of the cell at `location` after `wait_frames` ticks.
    pub fn transform_cell(
        &mut self,
        location: Location,
        replacement: Cell,
        wait_frames: u32,
    ) -> Result<bool, TransformError> {
        let index = self
            .index(location)
            .ok_or(TransformError::OutOfBounds { location })?;
        self.cells[index].transform_to(replacement, wait_frames)
    }

    /// Starts draining the water at `location` into sand.
    pub fn drain_water(&mut self, location: Location) -> Result<bool, TransformError> {
        let index = self
            .index(location)
            .ok_or(TransformError::OutOfBounds { location })?;
        self.cells[index].transform_to_sand(&self.config.tile_set)
    }

    /// Clears the recording and starts capturing player input.
    pub fn start_recording(&mut self) {
        self.recording.start_recording();
        info!(frame = self.frame, "recording started");
    }

    /// Stops capturing or replaying input.
    pub fn stop_recording(&mut self) {
        self.recording.stop();
    }

    /// Replaces the recording with externally supplied input.
    pub fn load_recording(&mut self, inputs: Vec<RecordedInput>) -> Result<(), RecordingError> {
        self.recording.load(inputs)
    }

    /// Replays the recording instead of live input.
    ///
    /// The grid is expected to be in the state the recording started from.
    pub fn start_playback(&mut self) {
        self.recording.start_playback();
        info!(
            inputs = self.recording.inputs().len(),
            frame = self.frame,
            "playback started"
        );
    }

    /// Simulates one tick.
    ///
    /// The grid's own frame counter drives the tick, so live recording and
    /// playback agree on frame numbers whatever the host counts. A host frame
    /// that differs from [`Grid::frame`] is ignored.
    ///
    /// While playing: replayed input, the level clock and autonomous actors
    /// run first. Cells and actors animate regardless, after which the level
    /// outcome is evaluated.
    pub fn update_frame(&mut self, host_frame: u64, out_events: &mut Vec<Event>) {
        let frame = self.frame;
        if host_frame != frame {
            debug!(host_frame, frame, "host frame differs from grid frame");
        }
        if self.playing && self.status == GridStatus::InProgress {
            if self.recording.is_playing() {
                for direction in self.recording.next_inputs(frame) {
                    let _ = self.step_player(direction, false, out_events);
                }
            }
            self.tick_clock(frame, out_events);
            self.step_autonomous(frame, out_events);
        }

        self.update_cells(frame, out_events);
        for actor in &mut self.actors {
            actor.update_frame(frame);
        }

        self.frame = frame.saturating_add(1);
        out_events.push(Event::FrameAdvanced { frame });
        self.evaluate_status(frame, out_events);
    }

    pub(crate) fn set_frame(&mut self, frame: u64) {
        self.frame = frame;
    }

    pub(crate) fn index(&self, location: Location) -> Option<usize> {
        if !location.is_valid() {
            return None;
        }
        let row = u32::try_from(location.row()).ok()?;
        let column = u32::try_from(location.column()).ok()?;
        if row >= self.rows || column >= self.columns {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        Some(usize::try_from(row).ok()? * width + usize::try_from(column).ok()?)
    }

    pub(crate) fn insert_actor(&mut self, mut actor: Actor, location: Location) -> ActorId {
        let id = ActorId::new(self.next_actor_id);
        self.next_actor_id = self.next_actor_id.saturating_add(1);
        actor.attach(id, location);
        self.actors.push(actor);
        id
    }

    fn location_of(&self, index: usize) -> Location {
        let width = self.columns.max(1) as usize;
        Location::new((index / width) as i32, (index % width) as i32)
    }

    fn swap_in(&mut self, index: usize, mut cell: Cell) -> Cell {
        cell.attach(self.location_of(index));
        let mut previous = std::mem::replace(&mut self.cells[index], cell);
        previous.detach();
        previous
    }

    fn actor_index(&self, id: ActorId) -> Option<usize> {
        self.actors.iter().position(|actor| actor.id() == Some(id))
    }

    fn occupants_by_dominance(&self, mover_index: usize, destination: Location) -> Vec<usize> {
        let mover = &self.actors[mover_index];
        let mut occupants: Vec<usize> = self
            .actors
            .iter()
            .enumerate()
            .filter(|(index, actor)| {
                *index != mover_index && actor.head_location() == destination
            })
            .map(|(index, _)| index)
            .collect();
        occupants.sort_by_key(|&index| self.actors[index].dominance_level_for(Some(mover)));
        occupants
    }

    fn step_player(
        &mut self,
        direction: Direction,
        record: bool,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let Some(player) = self.player() else {
            return false;
        };
        if player.is_dying() {
            return false;
        }
        let Some(id) = player.id() else {
            return false;
        };
        if record {
            let _ = self.recording.record(self.frame, direction);
        }
        self.traverse_direction(id, direction, out_events)
    }

    fn tick_clock(&mut self, frame: u64, out_events: &mut Vec<Event>) {
        let per_second = u64::from(self.config.frames_per_second.max(1));
        if self.time_left > 0 && (frame + 1) % per_second == 0 {
            self.time_left -= 1;
            out_events.push(Event::TimeDecremented {
                time_left: self.time_left,
            });
        }
    }

    fn step_autonomous(&mut self, frame: u64, out_events: &mut Vec<Event>) {
        let cadence = u64::from(self.config.enemy_step_frames);
        if cadence == 0 || frame % cadence != 0 {
            return;
        }

        let mut movers: Vec<(Direction, ActorId, i32)> = self
            .actors
            .iter()
            .filter(|actor| actor.is_active() && !actor.is_dying())
            .filter_map(|actor| {
                let heading = actor.heading()?;
                let id = actor.id()?;
                Some((heading, id, actor.dominance_level_for(None).priority()))
            })
            .collect();
        movers.sort_by_key(|&(_, id, priority)| (priority, id));

        for (heading, id, _) in movers {
            if self.actor(id).map_or(true, Actor::is_dying) {
                continue;
            }
            if !self.traverse_direction(id, heading, out_events) {
                if let Some(index) = self.actor_index(id) {
                    self.actors[index].set_heading(heading.opposite());
                }
            }
        }
    }

    fn update_cells(&mut self, frame: u64, out_events: &mut Vec<Event>) {
        for index in 0..self.cells.len() {
            if let Some(replacement) = self.cells[index].update_frame(frame) {
                let location = self.location_of(index);
                let previous = self.swap_in(index, replacement);
                debug!(
                    %location,
                    from = ?previous.kind(),
                    to = ?self.cells[index].kind(),
                    "cell transformed"
                );
                out_events.push(Event::CellTransformed { location });
            }
        }
    }

    fn evaluate_status(&mut self, frame: u64, out_events: &mut Vec<Event>) {
        if self.status != GridStatus::InProgress {
            return;
        }
        let player = self.player();
        let outcome = if player.is_some_and(Actor::is_winner) {
            Outcome::Won
        } else if player.is_some_and(Actor::is_dead) {
            Outcome::PlayerDied
        } else if self.time_left == 0 {
            Outcome::TimeExpired
        } else if self.recording.is_finished(frame) {
            warn!(frame, "playback ran out of input before the level concluded");
            Outcome::PlaybackFinished
        } else {
            return;
        };

        self.status = GridStatus::Concluded(outcome);
        out_events.push(Event::Concluded { outcome });
        if self.playing {
            self.playing = false;
            out_events.push(Event::PlayingChanged { playing: false });
        }
        self.recording.stop();
        info!(?outcome, frame, name = %self.name, "level concluded");
    }
}

/// Borrows two distinct actors mutably.
fn pair_mut(actors: &mut [Actor], first: usize, second: usize) -> (&mut Actor, &mut Actor) {
    debug_assert_ne!(first, second);
    if first < second {
        let (head, tail) = actors.split_at_mut(second);
        (&mut head[first], &mut tail[0])
    } else {
        let (head, tail) = actors.split_at_mut(first);
        (&mut tail[0], &mut head[second])
    }
}

/// Applies the provided command to the grid, mutating state deterministically.
pub fn apply(grid: &mut Grid, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::UpdateFrame { frame } => grid.update_frame(frame, out_events),
        Command::MovePlayer { direction } => {
            let _ = grid.move_player(direction, out_events);
        }
        Command::SetPlaying { playing } => {
            let _ = grid.set_playing(playing, out_events);
        }
        Command::StartRecording => grid.start_recording(),
        Command::StopRecording => grid.stop_recording(),
        Command::StartPlayback => grid.start_playback(),
    }
}

/// Query functions that provide read-only access to the grid state.
pub mod query {
    use super::{Actor, ActorKind, Cell, CellKind, Grid, ItemKind};
    use turtle_core::{ActorId, GridStatus, Location};

    /// Render-facing description of a single actor.
    #[derive(Clone, Debug, PartialEq)]
    pub struct ActorSnapshot {
        /// Identifier of the actor.
        pub id: ActorId,
        /// Role-specific state.
        pub kind: ActorKind,
        /// Location the actor occupies.
        pub head: Location,
        /// Location the actor is moving away from.
        pub trailing: Location,
        /// Tile-set frame to draw.
        pub image_frame: u32,
        /// Fade factor between `0.0` and `1.0`.
        pub opacity: f64,
        /// Whether the actor has been killed.
        pub dying: bool,
        /// Pixels per tick to interpolate from `trailing` to `head`.
        pub move_speed: f32,
    }

    /// Render-facing description of a single cell.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CellSnapshot {
        /// Slot of the cell.
        pub location: Location,
        /// Terrain variant.
        pub kind: CellKind,
        /// Tile-set frame to draw.
        pub image_frame: u32,
        /// Frame drawn on top of the base frame, if any.
        pub overlay_frame: Option<u32>,
    }

    /// Heads-up display values.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Hud {
        /// Seconds left, or `-1` when untimed.
        pub time_left: i32,
        /// Food still required.
        pub food_remaining: u32,
        /// Items carried by the player.
        pub inventory: Vec<ItemKind>,
        /// Progress of the level.
        pub status: GridStatus,
    }

    /// Captures every attached actor in insertion order.
    #[must_use]
    pub fn actor_view(grid: &Grid) -> Vec<ActorSnapshot> {
        grid.actors()
            .iter()
            .filter_map(|actor| snapshot_actor(grid, actor))
            .collect()
    }

    /// Captures every cell in row-major order.
    #[must_use]
    pub fn cell_view(grid: &Grid) -> Vec<CellSnapshot> {
        let tile_set = &grid.config().tile_set;
        grid.cells
            .iter()
            .map(|cell: &Cell| CellSnapshot {
                location: cell.head_location(),
                kind: cell.kind(),
                image_frame: cell.image_frame(tile_set),
                overlay_frame: cell.overlay_frame(tile_set),
            })
            .collect()
    }

    /// Collects the values a heads-up display shows.
    #[must_use]
    pub fn hud(grid: &Grid) -> Hud {
        Hud {
            time_left: grid.time_left(),
            food_remaining: grid.food_requirement(),
            inventory: grid
                .player()
                .map(|player| player.inventory().to_vec())
                .unwrap_or_default(),
            status: grid.status(),
        }
    }

    fn snapshot_actor(grid: &Grid, actor: &Actor) -> Option<ActorSnapshot> {
        Some(ActorSnapshot {
            id: actor.id()?,
            kind: actor.kind().clone(),
            head: actor.head_location(),
            trailing: actor.trailing_location(),
            image_frame: actor.image_frame(&grid.config().tile_set),
            opacity: actor.opacity(),
            dying: actor.is_dying(),
            move_speed: grid.move_speed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: u32, columns: u32) -> Grid {
        Grid::new(rows, columns, GridConfig::default())
    }

    #[test]
    fn new_grid_is_grass_and_attached() {
        let grid = grid(2, 3);
        for row in 0..2 {
            for column in 0..3 {
                let location = Location::new(row, column);
                let cell = grid.cell_at(location).expect("slot exists");
                assert_eq!(cell.kind(), CellKind::Grass);
                assert_eq!(cell.head_location(), location);
                assert!(cell.is_attached());
            }
        }
        assert!(grid.cell_at(Location::new(2, 0)).is_none());
        assert!(grid.cell_at(Location::INVALID).is_none());
    }

    #[test]
    fn place_cell_returns_detached_previous() {
        let mut grid = grid(1, 1);
        let previous = grid
            .place_cell(Location::new(0, 0), Cell::new(CellKind::Wall))
            .expect("in bounds");
        assert_eq!(previous.kind(), CellKind::Grass);
        assert!(!previous.is_attached());
        assert_eq!(
            grid.place_cell(Location::new(0, 0), previous.clone()).map(|cell| cell.kind()),
            Ok(CellKind::Wall)
        );
        assert_eq!(
            grid.place_cell(Location::new(3, 0), previous),
            Err(GridError::OutOfBounds {
                location: Location::new(3, 0)
            })
        );
    }

    #[test]
    fn remove_cell_leaves_grass_behind() {
        let mut grid = grid(1, 1);
        let _ = grid
            .place_cell(Location::new(0, 0), Cell::new(CellKind::Fire))
            .expect("in bounds");
        let removed = grid.remove_cell(Location::new(0, 0)).expect("in bounds");
        assert_eq!(removed.kind(), CellKind::Fire);
        assert_eq!(
            grid.cell_at(Location::new(0, 0)).map(Cell::kind),
            Some(CellKind::Grass)
        );
    }

    #[test]
    fn identifiers_are_allocated_in_insertion_order() {
        let mut grid = grid(1, 3);
        let first = grid
            .add_actor(Actor::item(ItemKind::Food), Location::new(0, 0))
            .expect("placed");
        let second = grid
            .add_actor(Actor::player(), Location::new(0, 1))
            .expect("placed");
        assert!(first < second);
        assert_eq!(grid.player_id(), Some(second));
        assert_eq!(
            grid.add_actor(Actor::player(), Location::new(0, 2)),
            Err(GridError::DuplicatePlayer)
        );
    }

    #[test]
    fn pair_mut_returns_requested_order() {
        let mut actors = vec![Actor::player(), Actor::bird(Direction::East)];
        let (bird, player) = pair_mut(&mut actors, 1, 0);
        assert!(bird.heading().is_some());
        assert!(player.is_player());
    }

    #[test]
    fn paused_grid_ignores_player_input() {
        let mut grid = grid(1, 2);
        let _ = grid
            .add_actor(Actor::player(), Location::new(0, 0))
            .expect("placed");
        let mut events = Vec::new();
        assert!(grid.set_playing(false, &mut events));
        assert!(!grid.move_player(Direction::East, &mut events));
        assert_eq!(events, vec![Event::PlayingChanged { playing: false }]);
    }

    #[test]
    fn clock_ticks_once_per_second() {
        let mut grid = grid(1, 1);
        grid.time_left = 2;
        let mut events = Vec::new();
        for frame in 0..29 {
            grid.update_frame(frame, &mut events);
        }
        assert_eq!(grid.time_left(), 2);
        grid.update_frame(29, &mut events);
        assert_eq!(grid.time_left(), 1);
        assert!(events.contains(&Event::TimeDecremented { time_left: 1 }));
    }

    #[test]
    fn grid_frame_counter_drives_ticks() {
        let mut grid = grid(1, 1);
        let mut events = Vec::new();
        grid.update_frame(7, &mut events);
        assert_eq!(events, vec![Event::FrameAdvanced { frame: 0 }]);
        assert_eq!(grid.frame(), 1);
    }

    #[test]
    fn untimed_levels_never_expire() {
        let mut grid = grid(1, 1);
        let mut events = Vec::new();
        for frame in 0..120 {
            grid.update_frame(frame, &mut events);
        }
        assert_eq!(grid.time_left(), -1);
        assert_eq!(grid.status(), GridStatus::InProgress);
    }

    #[test]
    fn query_views_follow_grid_order() {
        let mut grid = grid(1, 2);
        let _ = grid
            .place_cell(Location::new(0, 1), Cell::new(CellKind::Wall))
            .expect("in bounds");
        let id = grid
            .add_actor(Actor::player(), Location::new(0, 0))
            .expect("placed");

        let cells = query::cell_view(&grid);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1].kind, CellKind::Wall);
        assert_eq!(cells[1].location, Location::new(0, 1));

        let actors = query::actor_view(&grid);
        assert_eq!(actors.len(), 1);
        assert_eq!(actors[0].id, id);
        assert!((actors[0].opacity - 1.0).abs() < f64::EPSILON);
        assert!((actors[0].move_speed - grid.config().move_speed).abs() < f32::EPSILON);

        let hud = query::hud(&grid);
        assert_eq!(hud.status, GridStatus::InProgress);
        assert!(hud.inventory.is_empty());
    }
}
