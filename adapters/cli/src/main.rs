#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays, records and replays Turtle levels headlessly.

mod level_file;
mod recording_transfer;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use turtle_core::{Command, Direction, Event, GridStatus, Outcome};
use turtle_system_undo::UndoHistory;
use turtle_world::{self as world, query, ComponentRegistry, Grid, GridConfig};

use crate::{level_file::parse_level, recording_transfer::RecordingTransfer};

/// Command-line arguments accepted by the Turtle runner.
#[derive(Debug, Parser)]
#[command(name = "turtle", about = "Headless runner for Turtle levels")]
struct Cli {
    /// Grid configuration in TOML; built-in defaults apply when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Plays a level with scripted input while recording it.
    Run {
        /// Level file to load.
        #[arg(long, value_name = "FILE")]
        level: PathBuf,
        /// One step per character: n, e, s, w move; '.' waits; z undoes.
        #[arg(long, default_value = "")]
        inputs: String,
        /// Ticks to simulate; defaults to the number of scripted steps.
        #[arg(long)]
        frames: Option<u64>,
        /// Writes the recording transfer string to this file.
        #[arg(long, value_name = "FILE")]
        record_out: Option<PathBuf>,
    },
    /// Replays a recording against a freshly loaded level.
    Replay {
        /// Level file to load.
        #[arg(long, value_name = "FILE")]
        level: PathBuf,
        /// File holding a recording transfer string.
        #[arg(long, value_name = "FILE")]
        recording: PathBuf,
        /// Upper bound on simulated ticks.
        #[arg(long, default_value_t = 100_000)]
        max_frames: u64,
        /// Fails unless the final board fingerprint matches.
        #[arg(long, value_name = "HEX")]
        expect: Option<String>,
    },
}

/// Scripted host input for a single tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Move(Direction),
    Wait,
    Undo,
}

/// Entry point for the Turtle command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.log_level);

    match cli.mode {
        Mode::Run {
            level,
            inputs,
            frames,
            record_out,
        } => run(&level, &inputs, frames, record_out.as_deref(), config),
        Mode::Replay {
            level,
            recording,
            max_frames,
            expect,
        } => replay(&level, &recording, max_frames, expect.as_deref(), config),
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<GridConfig> {
    let Some(path) = path else {
        return Ok(GridConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("could not read config {}", path.display()))?;
    GridConfig::from_toml_str(&content)
        .with_context(|| format!("could not load config {}", path.display()))
}

fn load_grid(path: &Path, config: GridConfig) -> Result<Grid> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("could not read level {}", path.display()))?;
    let spec =
        parse_level(&content).with_context(|| format!("could not parse level {}", path.display()))?;
    let grid = Grid::from_level(&spec, &ComponentRegistry::default(), config)
        .with_context(|| format!("could not build level {}", path.display()))?;
    info!(name = grid.name(), rows = grid.rows(), columns = grid.columns(), "level loaded");
    Ok(grid)
}

fn run(
    level: &Path,
    inputs: &str,
    frames: Option<u64>,
    record_out: Option<&Path>,
    config: GridConfig,
) -> Result<()> {
    let steps = parse_steps(inputs)?;
    let frames = frames.unwrap_or(steps.len() as u64);
    let mut history = UndoHistory::from_config(&config);
    let mut grid = load_grid(level, config)?;

    let mut events = Vec::new();
    world::apply(&mut grid, Command::StartRecording, &mut events);
    for index in 0..frames {
        if grid.status() != GridStatus::InProgress {
            break;
        }
        let step = usize::try_from(index)
            .ok()
            .and_then(|index| steps.get(index).copied())
            .unwrap_or(Step::Wait);
        match step {
            Step::Move(direction) => {
                world::apply(&mut grid, Command::MovePlayer { direction }, &mut events);
            }
            Step::Undo => {
                if !history.undo(&mut grid) {
                    debug!(step = index, "nothing to undo");
                }
            }
            Step::Wait => {}
        }
        log_events(&events);
        events.clear();

        let tick_events = tick(&mut grid);
        history.handle(&tick_events, &grid);
    }
    world::apply(&mut grid, Command::StopRecording, &mut events);

    let transfer = RecordingTransfer {
        level: grid.name().to_owned(),
        inputs: grid.recording().inputs().to_vec(),
    };
    let encoded = transfer
        .encode()
        .context("could not encode recording")?;

    report(&grid)?;
    println!("recording: {encoded}");
    if let Some(path) = record_out {
        fs::write(path, format!("{encoded}\n"))
            .with_context(|| format!("could not write recording {}", path.display()))?;
        info!(path = %path.display(), inputs = transfer.inputs.len(), "recording saved");
    }
    Ok(())
}

fn replay(
    level: &Path,
    recording: &Path,
    max_frames: u64,
    expect: Option<&str>,
    config: GridConfig,
) -> Result<()> {
    let mut grid = load_grid(level, config)?;
    let content = fs::read_to_string(recording)
        .with_context(|| format!("could not read recording {}", recording.display()))?;
    let transfer = RecordingTransfer::decode(&content)
        .with_context(|| format!("could not decode recording {}", recording.display()))?;
    if transfer.level != grid.name() {
        warn!(
            recorded = %transfer.level,
            level = grid.name(),
            "recording was captured on a different level"
        );
    }

    grid.load_recording(transfer.inputs)
        .context("recording inputs are not in frame order")?;
    let mut events = Vec::new();
    world::apply(&mut grid, Command::StartPlayback, &mut events);
    for _ in 0..max_frames {
        if grid.status() != GridStatus::InProgress {
            break;
        }
        let _ = tick(&mut grid);
    }

    report(&grid)?;
    if let Some(expected) = expect {
        let actual = grid.fingerprint()?;
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            bail!("fingerprint mismatch: expected {expected}, replay produced {actual}");
        }
        info!("replay fingerprint verified");
    }
    Ok(())
}

/// Simulates the grid's next frame and clears out finished actors.
fn tick(grid: &mut Grid) -> Vec<Event> {
    let mut events = Vec::new();
    let frame = grid.frame();
    world::apply(grid, Command::UpdateFrame { frame }, &mut events);
    grid.remove_dead_actors(&mut events);
    log_events(&events);
    events
}

fn log_events(events: &[Event]) {
    for event in events {
        match event {
            Event::FrameAdvanced { .. } => {}
            other => debug!(event = ?other, "grid event"),
        }
    }
}

fn report(grid: &Grid) -> Result<()> {
    let hud = query::hud(grid);
    println!("level: {}", grid.name());
    println!("status: {}", describe_status(hud.status));
    println!("frame: {}", grid.frame());
    println!("time left: {}", hud.time_left);
    println!("food remaining: {}", hud.food_remaining);
    println!("items carried: {}", hud.inventory.len());
    println!("fingerprint: {}", grid.fingerprint()?);
    Ok(())
}

fn describe_status(status: GridStatus) -> &'static str {
    match status {
        GridStatus::InProgress => "in progress",
        GridStatus::Concluded(Outcome::Won) => "won",
        GridStatus::Concluded(Outcome::PlayerDied) => "player died",
        GridStatus::Concluded(Outcome::TimeExpired) => "time expired",
        GridStatus::Concluded(Outcome::PlaybackFinished) => "playback finished",
    }
}

fn parse_steps(script: &str) -> Result<Vec<Step>> {
    script
        .chars()
        .filter(|glyph| !glyph.is_whitespace())
        .enumerate()
        .map(|(index, glyph)| {
            let step = match glyph.to_ascii_lowercase() {
                'n' => Step::Move(Direction::North),
                'e' => Step::Move(Direction::East),
                's' => Step::Move(Direction::South),
                'w' => Step::Move(Direction::West),
                '.' => Step::Wait,
                'z' => Step::Undo,
                other => bail!("unknown input '{other}' at step {index}"),
            };
            Ok(step)
        })
        .collect()
}
