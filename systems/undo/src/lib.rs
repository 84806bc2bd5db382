#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bounded undo history fed by periodic grid snapshots.

use std::collections::VecDeque;

use tracing::{debug, info};
use turtle_core::{Event, GridStatus};
use turtle_world::{Grid, GridConfig, Snapshot};

/// Rolling window of snapshots, most recent first.
#[derive(Debug)]
pub struct UndoHistory {
    cadence: u64,
    capacity: usize,
    snapshots: VecDeque<Snapshot>,
}

impl UndoHistory {
    /// Creates a history that snapshots every `cadence` frames and keeps at
    /// most `capacity` snapshots.
    #[must_use]
    pub fn new(cadence: u64, capacity: usize) -> Self {
        Self {
            cadence,
            capacity,
            snapshots: VecDeque::with_capacity(capacity),
        }
    }

    /// Creates a history using the grid configuration's cadence and capacity.
    #[must_use]
    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(config.undo_cadence, config.max_undos)
    }

    /// Captures snapshots for every frame the grid reported as simulated.
    pub fn handle(&mut self, events: &[Event], grid: &Grid) {
        for event in events {
            if let Event::FrameAdvanced { frame } = event {
                let _ = self.observe(grid, *frame);
            }
        }
    }

    /// Captures a snapshot when `frame` falls on the cadence.
    ///
    /// Concluded grids are not captured. Returns whether a snapshot was taken.
    pub fn observe(&mut self, grid: &Grid, frame: u64) -> bool {
        if self.cadence == 0 || self.capacity == 0 || frame % self.cadence != 0 {
            return false;
        }
        if grid.status() != GridStatus::InProgress {
            return false;
        }

        self.snapshots.push_front(Snapshot::capture(grid, frame));
        while self.snapshots.len() > self.capacity {
            let _ = self.snapshots.pop_back();
        }
        debug!(frame, retained = self.snapshots.len(), "undo snapshot captured");
        true
    }

    /// Restores the most recent snapshot into `grid` and discards it.
    ///
    /// Refused during playback, after the level concluded, or when the
    /// history is empty.
    pub fn undo(&mut self, grid: &mut Grid) -> bool {
        if grid.recording().is_playing() || grid.status() != GridStatus::InProgress {
            return false;
        }
        let Some(snapshot) = self.snapshots.pop_front() else {
            return false;
        };
        snapshot.restore(grid);
        info!(
            frame = snapshot.frame(),
            remaining = self.snapshots.len(),
            "undo restored snapshot"
        );
        true
    }

    /// Number of retained snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no snapshot is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Frame of the snapshot the next undo would restore.
    #[must_use]
    pub fn latest_frame(&self) -> Option<u64> {
        self.snapshots.front().map(Snapshot::frame)
    }

    /// Discards every snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
