//! Deep copies of grid state used for undo and determinism checks.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use turtle_core::GridStatus;

use crate::{actor::Actor, cell::Cell, Grid};

/// Snapshot bytes could not be produced or read back.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Binary encoding failed.
    #[error("snapshot codec failure: {0}")]
    Codec(#[from] bincode::Error),
}

/// Independent copy of a grid taken at a specific frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    grid: Grid,
    frame: u64,
}

impl Snapshot {
    /// Deep-copies the grid as it stands after `frame` was simulated.
    #[must_use]
    pub fn capture(grid: &Grid, frame: u64) -> Self {
        Self {
            grid: grid.clone(),
            frame,
        }
    }

    /// Frame the snapshot was taken at.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Captured grid state.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Overwrites `target` with the captured state.
    ///
    /// Simulation resumes at the frame following the captured one. The snapshot
    /// stays usable afterwards.
    pub fn restore(&self, target: &mut Grid) {
        *target = self.grid.clone();
        target.set_frame(self.frame.saturating_add(1));
    }

    /// Encodes the snapshot with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decodes a snapshot produced by [`Snapshot::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Fingerprint of the captured board.
    pub fn fingerprint(&self) -> Result<String, SnapshotError> {
        self.grid.fingerprint()
    }
}

#[derive(Serialize)]
struct BoardState<'a> {
    cells: &'a [Cell],
    actors: &'a [Actor],
    time_left: i32,
    food_requirement: u32,
    status: GridStatus,
    frame: u64,
}

impl Grid {
    /// Hex SHA-256 digest of the board.
    ///
    /// Covers terrain, actors, clock, food requirement, status and frame but not
    /// the recording, so a recorded run and its replay agree.
    pub fn fingerprint(&self) -> Result<String, SnapshotError> {
        let board = BoardState {
            cells: &self.cells,
            actors: &self.actors,
            time_left: self.time_left,
            food_requirement: self.food_requirement,
            status: self.status,
            frame: self.frame,
        };
        let bytes = bincode::serialize(&board)?;
        let digest = Sha256::digest(&bytes);
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest.iter() {
            let _ = write!(hex, "{byte:02x}");
        }
        Ok(hex)
    }
}
