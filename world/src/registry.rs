//! Generic reconstruction of components from type slots and opaque parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use turtle_core::{ColorType, Direction};

use crate::{
    actor::{Actor, ItemKind},
    cell::{Cell, CellKind},
};

/// Slot identifiers of the built-in component types.
pub mod slots {
    /// Open ground.
    pub const GRASS: u16 = 0;
    /// Impassable wall.
    pub const WALL: u16 = 1;
    /// Lethal water.
    pub const WATER: u16 = 2;
    /// Sand.
    pub const SAND: u16 = 3;
    /// Level exit.
    pub const EXIT: u16 = 4;
    /// Lethal fire.
    pub const FIRE: u16 = 5;
    /// Colored door; parameters are [`DoorParams`](super::DoorParams).
    pub const DOOR: u16 = 6;
    /// The player.
    pub const PLAYER: u16 = 7;
    /// Patrolling bird; parameters are [`BirdParams`](super::BirdParams).
    pub const BIRD: u16 = 8;
    /// Food item.
    pub const FOOD: u16 = 9;
    /// Colored key; parameters are [`KeyParams`](super::KeyParams).
    pub const KEY: u16 = 10;
}

/// Construction parameters of a door.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorParams {
    /// Color of the key that opens the door.
    pub color: ColorType,
}

/// Construction parameters of a bird.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirdParams {
    /// Initial patrol direction.
    pub heading: Direction,
}

/// Construction parameters of a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyParams {
    /// Color of the key.
    pub color: ColorType,
}

/// Freshly constructed, detached component.
#[derive(Clone, Debug, PartialEq)]
pub enum Component {
    /// Terrain for the cell layer.
    Cell(Cell),
    /// Entity for the actor layer.
    Actor(Actor),
}

/// Builds a component from its serialized parameters.
pub type Constructor = fn(&[u8]) -> Result<Component, bincode::Error>;

/// Table mapping type slots to constructors.
#[derive(Clone, Debug)]
pub struct ComponentRegistry {
    constructors: BTreeMap<u16, Constructor>,
}

impl ComponentRegistry {
    /// Creates a registry without any slots.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registers a constructor, returning the one it replaced.
    pub fn register(&mut self, slot: u16, constructor: Constructor) -> Option<Constructor> {
        self.constructors.insert(slot, constructor)
    }

    /// Reports whether the slot has a constructor.
    #[must_use]
    pub fn contains(&self, slot: u16) -> bool {
        self.constructors.contains_key(&slot)
    }

    /// Number of registered slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Reports whether no slot is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Runs the constructor registered for `slot`.
    ///
    /// Returns `None` for unknown slots.
    pub fn construct(
        &self,
        slot: u16,
        params: &[u8],
    ) -> Option<Result<Component, bincode::Error>> {
        self.constructors
            .get(&slot)
            .map(|constructor| constructor(params))
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        let builtins: [(u16, Constructor); 11] = [
            (slots::GRASS, |_| Ok(cell(CellKind::Grass))),
            (slots::WALL, |_| Ok(cell(CellKind::Wall))),
            (slots::WATER, |_| Ok(cell(CellKind::Water))),
            (slots::SAND, |_| Ok(cell(CellKind::Sand))),
            (slots::EXIT, |_| Ok(cell(CellKind::Exit))),
            (slots::FIRE, |_| Ok(cell(CellKind::Fire))),
            (slots::DOOR, |params| {
                let DoorParams { color } = bincode::deserialize(params)?;
                Ok(cell(CellKind::Door { color }))
            }),
            (slots::PLAYER, |_| Ok(Component::Actor(Actor::player()))),
            (slots::BIRD, |params| {
                let BirdParams { heading } = bincode::deserialize(params)?;
                Ok(Component::Actor(Actor::bird(heading)))
            }),
            (slots::FOOD, |_| Ok(Component::Actor(Actor::item(ItemKind::Food)))),
            (slots::KEY, |params| {
                let KeyParams { color } = bincode::deserialize(params)?;
                Ok(Component::Actor(Actor::item(ItemKind::Key { color })))
            }),
        ];
        for (slot, constructor) in builtins {
            let _ = registry.register(slot, constructor);
        }
        registry
    }
}

fn cell(kind: CellKind) -> Component {
    Component::Cell(Cell::new(kind))
}
