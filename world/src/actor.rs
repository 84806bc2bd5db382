//! Movable, interactable and mortal grid entities.

use serde::{Deserialize, Serialize};
use turtle_core::{ActorId, ColorType, Direction, DominanceLevel, Location};

use crate::{cell::CellKind, config::TileSet};

/// Number of ticks an actor spends dying before it is dead.
pub const DYING_FRAMES: u32 = 10;

const PLAYER_FRAMES: [u32; 2] = [64, 65];
const BIRD_FRAMES: [u32; 2] = [80, 81];
const FOOD_FRAME: u32 = 54;
const KEY_OFFSET_FRAME: u32 = 45;

/// Items that can be picked up by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Counts toward the level's food requirement.
    Food,
    /// Opens doors of the same color.
    Key {
        /// Color of the key.
        color: ColorType,
    },
}

impl ItemKind {
    /// Image frame shown for the item on the grid and in inventories.
    #[must_use]
    pub const fn image_frame(self) -> u32 {
        match self {
            Self::Food => FOOD_FRAME,
            Self::Key { color } => color.image_frame(KEY_OFFSET_FRAME),
        }
    }
}

/// Role-specific state of an actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorKind {
    /// The player-controlled actor.
    Player {
        /// Set once the player passes the exit with the food requirement met.
        winner: bool,
        /// Items collected so far, in pickup order.
        inventory: Vec<ItemKind>,
    },
    /// Hostile actor that patrols along its heading.
    Bird {
        /// Direction of the next patrol step.
        heading: Direction,
    },
    /// Collectible lying on the grid.
    Item(ItemKind),
}

/// Source of a lethal effect.
#[derive(Clone, Copy, Debug)]
pub enum Attacker<'a> {
    /// A terrain effect such as water or fire.
    Cell(CellKind),
    /// Another actor.
    Actor(&'a Actor),
}

/// Outcome of an occupant reacting to an actor entering its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interaction {
    /// The mover may not enter.
    Block,
    /// The mover may enter.
    Allow,
    /// The mover may enter and the occupant leaves the grid.
    Collect,
}

/// Movable entity owned by a grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    kind: ActorKind,
    id: Option<ActorId>,
    head: Location,
    trailing: Location,
    animation_tick: u32,
    dying: bool,
    die_frame: u32,
}

impl Actor {
    /// Creates a detached actor of the provided kind.
    #[must_use]
    pub fn new(kind: ActorKind) -> Self {
        Self {
            kind,
            id: None,
            head: Location::INVALID,
            trailing: Location::INVALID,
            animation_tick: 0,
            dying: false,
            die_frame: 0,
        }
    }

    /// Creates a detached player with an empty inventory.
    #[must_use]
    pub fn player() -> Self {
        Self::new(ActorKind::Player {
            winner: false,
            inventory: Vec::new(),
        })
    }

    /// Creates a detached bird facing the provided direction.
    #[must_use]
    pub fn bird(heading: Direction) -> Self {
        Self::new(ActorKind::Bird { heading })
    }

    /// Creates a detached collectible item.
    #[must_use]
    pub fn item(item: ItemKind) -> Self {
        Self::new(ActorKind::Item(item))
    }

    /// Role-specific state.
    #[must_use]
    pub fn kind(&self) -> &ActorKind {
        &self.kind
    }

    /// Identifier allocated by the owning grid, if attached.
    #[must_use]
    pub fn id(&self) -> Option<ActorId> {
        self.id
    }

    /// Reports whether the actor belongs to a grid.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.id.is_some()
    }

    /// Location the actor occupies.
    #[must_use]
    pub fn head_location(&self) -> Location {
        self.head
    }

    /// Location the actor occupied before its latest move.
    #[must_use]
    pub fn trailing_location(&self) -> Location {
        self.trailing
    }

    /// Reports whether this is the player.
    #[must_use]
    pub fn is_player(&self) -> bool {
        matches!(self.kind, ActorKind::Player { .. })
    }

    /// Reports whether the player reached the exit.
    #[must_use]
    pub fn is_winner(&self) -> bool {
        matches!(self.kind, ActorKind::Player { winner: true, .. })
    }

    /// Items carried by the player; empty for every other actor.
    #[must_use]
    pub fn inventory(&self) -> &[ItemKind] {
        match &self.kind {
            ActorKind::Player { inventory, .. } => inventory,
            _ => &[],
        }
    }

    /// Patrol direction of autonomous actors.
    #[must_use]
    pub fn heading(&self) -> Option<Direction> {
        match self.kind {
            ActorKind::Bird { heading } => Some(heading),
            _ => None,
        }
    }

    /// Active actors move on their own or under input; items are static.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self.kind, ActorKind::Item(_))
    }

    /// Starts the dying countdown.
    ///
    /// Returns `false` without effect when the actor is already dying, when the
    /// attacker is a dying actor, or when this actor is immune to the attacker.
    pub fn die(&mut self, attacker: Attacker<'_>) -> bool {
        match (&self.kind, attacker) {
            (ActorKind::Item(_), _) => return false,
            (ActorKind::Bird { .. }, Attacker::Cell(CellKind::Water)) => return false,
            _ => {}
        }
        if self.dying {
            return false;
        }
        if let Attacker::Actor(actor) = attacker {
            if actor.is_dying() {
                return false;
            }
        }

        self.dying = true;
        self.die_frame = 0;
        true
    }

    /// Reports whether the actor has been killed.
    #[must_use]
    pub fn is_dying(&self) -> bool {
        self.dying
    }

    /// Reports whether the dying countdown completed.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.die_frame >= DYING_FRAMES
    }

    /// Ticks elapsed since the actor started dying.
    #[must_use]
    pub fn die_frame(&self) -> u32 {
        self.die_frame
    }

    /// Fade signal for renderers: `1.0` while alive, `0.0` once dead.
    #[must_use]
    pub fn opacity(&self) -> f64 {
        if !self.dying {
            return 1.0;
        }
        1.0 - f64::from(self.die_frame) / f64::from(DYING_FRAMES)
    }

    /// Dominance of this actor relative to `other`, or in general for `None`.
    #[must_use]
    pub fn dominance_level_for(&self, _other: Option<&Actor>) -> DominanceLevel {
        match self.kind {
            ActorKind::Player { .. } => DominanceLevel::PLAYER,
            ActorKind::Bird { .. } => DominanceLevel::ENEMY,
            ActorKind::Item(_) => DominanceLevel::ITEM,
        }
    }

    /// Side-effect-free preview of [`Actor::interact`].
    #[must_use]
    pub fn check_interact(&self, mover: &Actor) -> bool {
        match self.kind {
            ActorKind::Player { .. } => true,
            ActorKind::Bird { .. } => mover.is_player(),
            ActorKind::Item(ItemKind::Food) => mover.is_player(),
            ActorKind::Item(ItemKind::Key { .. }) => true,
        }
    }

    /// Reacts to `mover` entering this actor's slot.
    pub fn interact(&mut self, mover: &mut Actor) -> Interaction {
        match self.kind {
            ActorKind::Player { .. } => {
                if matches!(mover.kind, ActorKind::Bird { .. }) {
                    let _ = self.die(Attacker::Actor(mover));
                }
                Interaction::Allow
            }
            ActorKind::Bird { .. } => {
                if mover.is_player() {
                    let _ = mover.die(Attacker::Actor(self));
                    Interaction::Allow
                } else {
                    Interaction::Block
                }
            }
            ActorKind::Item(item) => {
                if mover.collect_item(item) {
                    Interaction::Collect
                } else if matches!(item, ItemKind::Food) {
                    Interaction::Block
                } else {
                    Interaction::Allow
                }
            }
        }
    }

    /// Adds an item to the player's inventory. Other actors cannot collect.
    pub fn collect_item(&mut self, item: ItemKind) -> bool {
        match &mut self.kind {
            ActorKind::Player { inventory, .. } => {
                inventory.push(item);
                true
            }
            _ => false,
        }
    }

    /// Reports whether the player carries a key of the provided color.
    #[must_use]
    pub fn has_key(&self, color: ColorType) -> bool {
        self.inventory()
            .iter()
            .any(|item| *item == ItemKind::Key { color })
    }

    /// Removes one key of the provided color from the inventory.
    pub fn take_key(&mut self, color: ColorType) -> bool {
        let ActorKind::Player { inventory, .. } = &mut self.kind else {
            return false;
        };
        let Some(position) = inventory
            .iter()
            .position(|item| *item == ItemKind::Key { color })
        else {
            return false;
        };
        let _ = inventory.remove(position);
        true
    }

    /// Image frame the actor requests from the tile set.
    #[must_use]
    pub fn image_frame(&self, tile_set: &TileSet) -> u32 {
        match self.kind {
            ActorKind::Player { .. } => tile_set.animate(&PLAYER_FRAMES, self.animation_tick),
            ActorKind::Bird { .. } => tile_set.animate(&BIRD_FRAMES, self.animation_tick),
            ActorKind::Item(item) => item.image_frame(),
        }
    }

    /// Advances animation and the dying countdown by one tick.
    pub fn update_frame(&mut self, _frame: u64) {
        self.animation_tick = self.animation_tick.wrapping_add(1);
        if self.dying && self.die_frame < DYING_FRAMES {
            self.die_frame += 1;
        }
    }

    pub(crate) fn mark_winner(&mut self) {
        if let ActorKind::Player { winner, .. } = &mut self.kind {
            *winner = true;
        }
    }

    pub(crate) fn set_heading(&mut self, direction: Direction) {
        if let ActorKind::Bird { heading } = &mut self.kind {
            *heading = direction;
        }
    }

    pub(crate) fn attach(&mut self, id: ActorId, location: Location) {
        self.id = Some(id);
        self.head = location;
        self.trailing = location;
    }

    pub(crate) fn detach(&mut self) {
        self.id = None;
    }

    pub(crate) fn relocate(&mut self, destination: Location) {
        self.trailing = self.head;
        self.head = destination;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_are_not_active() {
        assert!(Actor::player().is_active());
        assert!(Actor::bird(Direction::North).is_active());
        assert!(!Actor::item(ItemKind::Food).is_active());
    }

    #[test]
    fn die_is_idempotent_while_dying() {
        let mut player = Actor::player();
        assert!(player.die(Attacker::Cell(CellKind::Fire)));
        player.update_frame(0);
        player.update_frame(1);
        assert_eq!(player.die_frame(), 2);

        assert!(!player.die(Attacker::Cell(CellKind::Fire)));
        assert_eq!(player.die_frame(), 2, "second kill must not reset the countdown");
    }

    #[test]
    fn dying_attacker_cannot_kill() {
        let mut bird = Actor::bird(Direction::East);
        assert!(bird.die(Attacker::Cell(CellKind::Fire)));

        let mut player = Actor::player();
        assert!(!player.die(Attacker::Actor(&bird)));
        assert!(!player.is_dying());
    }

    #[test]
    fn dead_exactly_after_dying_frames() {
        let mut player = Actor::player();
        assert!(player.die(Attacker::Cell(CellKind::Water)));
        for frame in 0..u64::from(DYING_FRAMES - 1) {
            player.update_frame(frame);
            assert!(!player.is_dead(), "dead too early at tick {frame}");
        }
        player.update_frame(u64::from(DYING_FRAMES));
        assert!(player.is_dead());
        assert!(player.opacity().abs() < f64::EPSILON);

        player.update_frame(u64::from(DYING_FRAMES) + 1);
        assert_eq!(player.die_frame(), DYING_FRAMES, "countdown is capped");
    }

    #[test]
    fn opacity_fades_linearly() {
        let mut player = Actor::player();
        assert!((player.opacity() - 1.0).abs() < f64::EPSILON);
        assert!(player.die(Attacker::Cell(CellKind::Fire)));
        for frame in 0..5 {
            player.update_frame(frame);
        }
        assert!((player.opacity() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn items_and_water_birds_are_immune() {
        let mut food = Actor::item(ItemKind::Food);
        assert!(!food.die(Attacker::Cell(CellKind::Fire)));

        let mut bird = Actor::bird(Direction::North);
        assert!(!bird.die(Attacker::Cell(CellKind::Water)));
        assert!(bird.die(Attacker::Cell(CellKind::Fire)));
    }

    #[test]
    fn food_only_yields_to_the_player() {
        let mut food = Actor::item(ItemKind::Food);
        let mut bird = Actor::bird(Direction::West);
        assert!(!food.check_interact(&bird));
        assert_eq!(food.interact(&mut bird), Interaction::Block);

        let mut player = Actor::player();
        assert!(food.check_interact(&player));
        assert_eq!(food.interact(&mut player), Interaction::Collect);
        assert_eq!(player.inventory(), &[ItemKind::Food]);
    }

    #[test]
    fn keys_let_everyone_pass_but_only_players_collect() {
        let key = ItemKind::Key {
            color: ColorType::Blue,
        };
        let mut item = Actor::item(key);
        let mut bird = Actor::bird(Direction::South);
        assert_eq!(item.interact(&mut bird), Interaction::Allow);

        let mut player = Actor::player();
        assert_eq!(item.interact(&mut player), Interaction::Collect);
        assert!(player.has_key(ColorType::Blue));
        assert!(player.take_key(ColorType::Blue));
        assert!(!player.has_key(ColorType::Blue));
        assert!(!player.take_key(ColorType::Blue));
    }

    #[test]
    fn birds_kill_players_in_both_directions() {
        let mut bird = Actor::bird(Direction::East);
        let mut player = Actor::player();
        assert_eq!(bird.interact(&mut player), Interaction::Allow);
        assert!(player.is_dying());

        let mut other_bird = Actor::bird(Direction::West);
        let mut victim = Actor::player();
        assert_eq!(victim.interact(&mut other_bird), Interaction::Allow);
        assert!(victim.is_dying());

        assert_eq!(bird.interact(&mut other_bird), Interaction::Block);
    }

    #[test]
    fn dominance_follows_role() {
        assert_eq!(
            Actor::player().dominance_level_for(None),
            DominanceLevel::PLAYER
        );
        assert_eq!(
            Actor::bird(Direction::East).dominance_level_for(None),
            DominanceLevel::ENEMY
        );
        assert_eq!(
            Actor::item(ItemKind::Food).dominance_level_for(None),
            DominanceLevel::ITEM
        );
    }

    #[test]
    fn relocation_keeps_previous_head_as_trailing() {
        let mut player = Actor::player();
        player.attach(ActorId::new(0), Location::new(0, 0));
        assert_eq!(player.trailing_location(), Location::new(0, 0));
        player.relocate(Location::new(0, 1));
        assert_eq!(player.head_location(), Location::new(0, 1));
        assert_eq!(player.trailing_location(), Location::new(0, 0));
        player.detach();
        assert!(!player.is_attached());
    }
}
