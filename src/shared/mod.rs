//! Shared components, resources, events, and states for Willowbrook.
//!
//! This is the type contract. Every domain plugin imports from here.
//! Only `data`, `player`, `save` and `ui` reach into `world` for the map registry.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// GAME STATE: top-level state machine
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Loading,
    Playing,
    Ending,
}

// ═══════════════════════════════════════════════════════════════════════
// GRID
// ═══════════════════════════════════════════════════════════════════════

/// A (row, column) cell on a map grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridLocation {
    pub row: i32,
    pub col: i32,
}

impl GridLocation {
    /// Sentinel for "not found". Never a valid cell.
    pub const NONE: GridLocation = GridLocation { row: -1, col: -1 };

    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn is_valid(&self) -> bool {
        let size = GRID_SIZE as i32;
        (0..size).contains(&self.row) && (0..size).contains(&self.col)
    }

    /// Cell containing a pixel-space point (origin top-left, y grows down).
    pub fn from_pixel(pos: Vec2) -> Self {
        Self {
            row: (pos.y / TILE_SIZE).floor() as i32,
            col: (pos.x / TILE_SIZE).floor() as i32,
        }
    }

    /// Pixel-space center of this cell.
    pub fn to_pixel(self) -> Vec2 {
        Vec2::new(
            (self.col as f32 + 0.5) * TILE_SIZE,
            (self.row as f32 + 0.5) * TILE_SIZE,
        )
    }
}

impl fmt::Display for GridLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Numeric map identifier. Registered maps are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapId(pub u32);

impl MapId {
    /// Registry slot for this id, `None` for id 0.
    pub fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Map{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PLAYER
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Debug, Clone)]
pub struct PlayerState {
    /// Pixel-space position of the player's feet (origin top-left of the grid).
    pub position: Vec2,
    pub location: GridLocation,
    /// Grid location at the start of the previous movement step.
    pub prev_location: GridLocation,
    /// Pixels per frame at 60 fps; set by the terrain the player stands on.
    pub speed: f32,
    pub visible: bool,
    pub cash: u32,
}

impl Default for PlayerState {
    fn default() -> Self {
        let location = GridLocation::new(0, 0);
        Self {
            position: location.to_pixel(),
            location,
            prev_location: location,
            speed: DEFAULT_SPEED,
            visible: true,
            cash: 0,
        }
    }
}

impl PlayerState {
    /// Teleport to a cell. A teleport lands settled.
    pub fn place_at(&mut self, location: GridLocation) {
        self.position = location.to_pixel();
        self.location = location;
        self.prev_location = location;
    }
}

// ═══════════════════════════════════════════════════════════════════════
// INVENTORY
// ═══════════════════════════════════════════════════════════════════════

/// Named key items are the only inventory currency of the game.
pub type ItemId = String;

pub const PRIZE_TICKET: &str = "Prize Ticket";
pub const TEDDY_BEAR: &str = "Teddy Bear";
pub const ARCADE_TOKEN: &str = "Arcade Token";
pub const RED_HEART: &str = "Red Heart";
pub const BLUE_HEART: &str = "Blue Heart";

#[derive(Resource, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub items: Vec<ItemId>,
}

impl Inventory {
    pub fn has(&self, item_id: &str) -> bool {
        self.items.iter().any(|i| i == item_id)
    }

    pub fn add(&mut self, item_id: &str) {
        self.items.push(item_id.to_string());
    }

    /// Remove one copy. Returns false if the item was not held.
    pub fn remove(&mut self, item_id: &str) -> bool {
        match self.items.iter().position(|i| i == item_id) {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// ACTOR CONTRACT
// ═══════════════════════════════════════════════════════════════════════

/// Everything the map engine may read or change about whoever is walking
/// the grid. Passed explicitly into every engine call that needs it.
pub trait ActorState {
    fn location(&self) -> GridLocation;
    fn previous_location(&self) -> GridLocation;
    fn set_location(&mut self, location: GridLocation);

    fn has_item(&self, item_id: &str) -> bool;
    fn add_item(&mut self, item_id: &str);
    fn remove_item(&mut self, item_id: &str) -> bool;

    fn cash(&self) -> u32;
    fn set_cash(&mut self, cash: u32);

    fn speed(&self) -> f32;
    fn set_speed(&mut self, speed: f32);

    fn is_visible(&self) -> bool;
    fn set_visible(&mut self, visible: bool);

    fn is_settled(&self) -> bool {
        self.location() == self.previous_location()
    }
}

/// The player's resources seen through the engine's actor contract.
pub struct PlayerActor<'a> {
    pub state: &'a mut PlayerState,
    pub inventory: &'a mut Inventory,
}

impl ActorState for PlayerActor<'_> {
    fn location(&self) -> GridLocation {
        self.state.location
    }
    fn previous_location(&self) -> GridLocation {
        self.state.prev_location
    }
    fn set_location(&mut self, location: GridLocation) {
        self.state.place_at(location);
    }
    fn has_item(&self, item_id: &str) -> bool {
        self.inventory.has(item_id)
    }
    fn add_item(&mut self, item_id: &str) {
        self.inventory.add(item_id);
    }
    fn remove_item(&mut self, item_id: &str) -> bool {
        self.inventory.remove(item_id)
    }
    fn cash(&self) -> u32 {
        self.state.cash
    }
    fn set_cash(&mut self, cash: u32) {
        self.state.cash = cash;
    }
    fn speed(&self) -> f32 {
        self.state.speed
    }
    fn set_speed(&mut self, speed: f32) {
        self.state.speed = speed;
    }
    fn is_visible(&self) -> bool {
        self.state.visible
    }
    fn set_visible(&mut self, visible: bool) {
        self.state.visible = visible;
    }
}

// ═══════════════════════════════════════════════════════════════════════
// WORLD LAYOUT
// ═══════════════════════════════════════════════════════════════════════

/// Where the story starts and where it ends.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldLayout {
    pub start_map: MapId,
    pub start_location: GridLocation,
    /// First map to thaw in the ending.
    pub epilogue_map: MapId,
    /// Second map to thaw, entered on top of the epilogue map.
    pub reunion_map: MapId,
}

impl Default for WorldLayout {
    fn default() -> Self {
        Self {
            start_map: MapId(6),
            start_location: GridLocation::new(7, 10),
            epilogue_map: MapId(1),
            reunion_map: MapId(4),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// INPUT
// ═══════════════════════════════════════════════════════════════════════

/// Game actions for the current frame, filled once in PreUpdate.
#[derive(Resource, Debug, Clone, Default)]
pub struct PlayerInput {
    pub move_axis: Vec2,
    /// Activate went down this frame.
    pub activate: bool,
    /// Activate is down this frame.
    pub activate_held: bool,
    pub cancel: bool,
    pub quicksave: bool,
    pub quickload: bool,
}

/// Narrative switch: while frozen, ambient map and NPC animation is paused.
#[derive(Resource, Debug, Clone, Copy)]
pub struct WorldFrozen(pub bool);

impl Default for WorldFrozen {
    fn default() -> Self {
        // The town starts frozen; the epilogue thaws it.
        Self(true)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS: cross-domain communication
// ═══════════════════════════════════════════════════════════════════════

#[derive(Event, Debug, Clone)]
pub struct MapTransitionEvent {
    pub from_map: MapId,
    pub to_map: MapId,
    pub arrival: GridLocation,
}

#[derive(Event, Debug, Clone)]
pub struct PlaySfxEvent {
    pub sfx_id: String,
}

/// Toast notification for player feedback.
#[derive(Event, Debug, Clone)]
pub struct ToastEvent {
    pub message: String,
    pub duration_secs: f32,
}

#[derive(Event, Debug, Clone, Default)]
pub struct SaveRequestEvent;

#[derive(Event, Debug, Clone, Default)]
pub struct LoadRequestEvent;

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

pub const GRID_SIZE: usize = 25;
pub const TILE_SIZE: f32 = 32.0;
pub const SCREEN_WIDTH: f32 = 1280.0;
pub const SCREEN_HEIGHT: f32 = 800.0;

/// World-space point for a pixel-space point. The grid is centered on the
/// origin and world y grows up.
pub fn pixel_to_world(pos: Vec2) -> Vec2 {
    let half = GRID_SIZE as f32 * TILE_SIZE / 2.0;
    Vec2::new(pos.x - half, half - pos.y)
}

pub const DEFAULT_SPEED: f32 = 4.0;
/// Speeds are tuned in pixels per frame at this rate.
pub const SPEED_FRAME_RATE: f32 = 60.0;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_location_bounds() {
        assert!(GridLocation::new(0, 0).is_valid());
        assert!(GridLocation::new(24, 24).is_valid());
        assert!(!GridLocation::new(25, 0).is_valid());
        assert!(!GridLocation::new(0, -1).is_valid());
        assert!(!GridLocation::NONE.is_valid());
    }

    #[test]
    fn test_grid_location_pixel_round_trip() {
        let loc = GridLocation::new(7, 10);
        assert_eq!(GridLocation::from_pixel(loc.to_pixel()), loc);
    }

    #[test]
    fn test_map_id_index() {
        assert_eq!(MapId(1).index(), Some(0));
        assert_eq!(MapId(6).index(), Some(5));
        assert_eq!(MapId(0).index(), None);
    }

    #[test]
    fn test_player_actor_teleport_is_settled() {
        let mut state = PlayerState::default();
        let mut inventory = Inventory::default();
        state.location = GridLocation::new(3, 3);
        let mut actor = PlayerActor {
            state: &mut state,
            inventory: &mut inventory,
        };
        actor.set_location(GridLocation::new(7, 10));
        actor.add_item(RED_HEART);
        assert!(actor.is_settled());
        assert_eq!(state.position, GridLocation::new(7, 10).to_pixel());
        assert!(inventory.has(RED_HEART));
    }

    #[test]
    fn test_inventory_remove_takes_one_copy() {
        let mut inv = Inventory::default();
        inv.add(PRIZE_TICKET);
        inv.add(PRIZE_TICKET);
        assert!(inv.remove(PRIZE_TICKET));
        assert!(inv.has(PRIZE_TICKET));
        assert!(inv.remove(PRIZE_TICKET));
        assert!(!inv.remove(PRIZE_TICKET));
        assert!(inv.items.is_empty());
    }
}
