use turtle_core::{Command, Direction, Event, GridStatus, Location, Outcome};
use turtle_system_undo::UndoHistory;
use turtle_world::{self as world, Actor, Cell, CellKind, Grid, GridConfig};

fn corridor() -> Grid {
    let mut grid = Grid::new(1, 5, GridConfig::default());
    let _ = grid
        .add_actor(Actor::player(), Location::new(0, 0))
        .expect("player placed");
    grid
}

fn step(grid: &mut Grid, history: &mut UndoHistory, frame: u64) {
    let mut events = Vec::new();
    world::apply(grid, Command::UpdateFrame { frame }, &mut events);
    history.handle(&events, grid);
}

fn player_location(grid: &Grid) -> Location {
    grid.player().map(Actor::head_location).expect("player present")
}

#[test]
fn undo_rewinds_to_most_recent_snapshot_first() {
    let mut grid = corridor();
    let mut history = UndoHistory::new(3, 5);

    for frame in 0..4 {
        step(&mut grid, &mut history, frame);
    }
    assert_eq!(history.len(), 2);
    assert_eq!(history.latest_frame(), Some(3));

    let mut events = Vec::new();
    world::apply(
        &mut grid,
        Command::MovePlayer {
            direction: Direction::East,
        },
        &mut events,
    );
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ActorMoved { .. })));
    step(&mut grid, &mut history, 4);
    step(&mut grid, &mut history, 5);
    assert_eq!(player_location(&grid), Location::new(0, 1));

    assert!(history.undo(&mut grid));
    assert_eq!(player_location(&grid), Location::new(0, 0));
    assert_eq!(grid.frame(), 4, "simulation resumes after the captured frame");
    assert_eq!(history.len(), 1);

    assert!(history.undo(&mut grid));
    assert_eq!(grid.frame(), 1);
    assert!(history.is_empty());
    assert!(!history.undo(&mut grid), "empty history cannot undo");
}

#[test]
fn oldest_snapshot_is_evicted_past_capacity() {
    let mut grid = corridor();
    let mut history = UndoHistory::new(1, 2);
    for frame in 0..5 {
        step(&mut grid, &mut history, frame);
    }
    assert_eq!(history.len(), 2);
    assert_eq!(history.latest_frame(), Some(4));

    assert!(history.undo(&mut grid));
    assert_eq!(history.latest_frame(), Some(3));
    history.clear();
    assert!(history.is_empty());
}

#[test]
fn undo_is_refused_during_playback() {
    let mut grid = corridor();
    let mut history = UndoHistory::new(1, 5);
    step(&mut grid, &mut history, 0);
    assert_eq!(history.len(), 1);

    grid.start_playback();
    assert!(!history.undo(&mut grid));
    assert_eq!(history.len(), 1, "refused undo keeps the snapshot");
}

#[test]
fn concluded_grids_are_neither_captured_nor_undone() {
    let mut grid = corridor();
    let _ = grid
        .place_cell(Location::new(0, 1), Cell::new(CellKind::Fire))
        .expect("in bounds");
    let mut history = UndoHistory::new(1, 50);

    step(&mut grid, &mut history, 0);
    let mut events = Vec::new();
    assert!(grid.move_player(Direction::East, &mut events));
    assert!(events.contains(&Event::ActorKilled {
        actor: grid.player_id().expect("player id"),
    }));

    let mut frame = 1;
    while grid.status() == GridStatus::InProgress {
        step(&mut grid, &mut history, frame);
        frame += 1;
        assert!(frame < 100, "player never finished dying");
    }
    assert_eq!(grid.status(), GridStatus::Concluded(Outcome::PlayerDied));

    let captured = history.len();
    assert!(!history.observe(&grid, frame));
    assert_eq!(history.len(), captured);
    assert!(!history.undo(&mut grid));
}
