//! Capture and deterministic playback of player input.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use turtle_core::{Direction, RecordedInput};

/// Ticks playback keeps running past the last recorded input so trailing
/// animations can finish.
pub const PLAYBACK_GRACE_FRAMES: u64 = 60;

/// Whether the recording is idle, capturing or replaying.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordingMode {
    /// Neither capturing nor replaying.
    #[default]
    Idle,
    /// Appending live input.
    Recording,
    /// Feeding captured input back in place of live input.
    Playing,
}

/// Recorded inputs supplied from outside were not usable.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RecordingError {
    /// Inputs must be sorted by frame.
    #[error("recorded input {index} at frame {frame} precedes the previous input")]
    OutOfOrder {
        /// Position of the offending input.
        index: usize,
        /// Frame of the offending input.
        frame: u64,
    },
}

/// Append-only sequence of per-frame player inputs plus a replay cursor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    mode: RecordingMode,
    inputs: Vec<RecordedInput>,
    cursor: usize,
}

impl Recording {
    /// Creates an idle, empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> RecordingMode {
        self.mode
    }

    /// Reports whether live input is being captured.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.mode == RecordingMode::Recording
    }

    /// Reports whether captured input is being replayed.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.mode == RecordingMode::Playing
    }

    /// Discards captured input and starts capturing.
    pub fn start_recording(&mut self) {
        self.inputs.clear();
        self.cursor = 0;
        self.mode = RecordingMode::Recording;
    }

    /// Appends an input while capturing. Returns whether it was stored.
    pub fn record(&mut self, frame: u64, direction: Direction) -> bool {
        if !self.is_recording() {
            return false;
        }
        self.inputs.push(RecordedInput { frame, direction });
        true
    }

    /// Returns to idle, keeping the captured input.
    pub fn stop(&mut self) {
        self.mode = RecordingMode::Idle;
    }

    /// Rewinds the cursor and starts replaying.
    ///
    /// Replay assumes the owning grid is in the same initial state the
    /// recording started from.
    pub fn start_playback(&mut self) {
        self.cursor = 0;
        self.mode = RecordingMode::Playing;
    }

    /// Inputs recorded for `frame`, advancing the cursor past them.
    pub fn next_inputs(&mut self, frame: u64) -> Vec<Direction> {
        if !self.is_playing() {
            return Vec::new();
        }
        let mut directions = Vec::new();
        while let Some(input) = self.inputs.get(self.cursor) {
            if input.frame > frame {
                break;
            }
            if input.frame < frame {
                warn!(
                    recorded = input.frame,
                    frame, "skipping recorded input for a frame that already passed"
                );
            } else {
                directions.push(input.direction);
            }
            self.cursor += 1;
        }
        directions
    }

    /// Frame of the last captured input.
    #[must_use]
    pub fn last_frame(&self) -> Option<u64> {
        self.inputs.last().map(|input| input.frame)
    }

    /// Reports whether playback ran past the last input plus the grace window.
    #[must_use]
    pub fn is_finished(&self, frame: u64) -> bool {
        self.is_playing()
            && frame > self.last_frame().unwrap_or(0).saturating_add(PLAYBACK_GRACE_FRAMES)
    }

    /// Captured input in recording order.
    #[must_use]
    pub fn inputs(&self) -> &[RecordedInput] {
        &self.inputs
    }

    /// Replaces the captured input with externally supplied input.
    ///
    /// The recording becomes idle; call [`Recording::start_playback`] to replay.
    pub fn load(&mut self, inputs: Vec<RecordedInput>) -> Result<(), RecordingError> {
        if let Some(index) = inputs
            .windows(2)
            .position(|pair| pair[1].frame < pair[0].frame)
        {
            let offending = index + 1;
            return Err(RecordingError::OutOfOrder {
                index: offending,
                frame: inputs[offending].frame,
            });
        }
        self.inputs = inputs;
        self.cursor = 0;
        self.mode = RecordingMode::Idle;
        Ok(())
    }
}
