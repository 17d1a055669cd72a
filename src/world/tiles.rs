//! Tile taxonomy and the tile-code dispatch table.
//!
//! Map files store raw integers. They are decoded once into [`TileKind`]
//! and every per-tile decision goes through [`TilePolicy::behavior`], so
//! adding a tile kind is a compile error until the table handles it.

use serde::{Deserialize, Serialize};

use crate::shared::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// Negative code; the magnitude is the destination map.
    Transition(MapId),
    Grass,
    Road,
    RoadEnd,
    Water,
    Unwalkable,
    Game,
    TiledPath,
    Npc,
    End,
    Buy,
    /// Any other code: drawn, never acted on.
    Decor(i32),
}

impl TileKind {
    pub fn from_code(code: i32) -> Self {
        match code {
            c if c < 0 => TileKind::Transition(MapId(c.unsigned_abs())),
            1 => TileKind::Grass,
            2 => TileKind::Road,
            3 => TileKind::RoadEnd,
            4 => TileKind::Water,
            5 => TileKind::Unwalkable,
            6 => TileKind::Game,
            7 => TileKind::TiledPath,
            8 => TileKind::Npc,
            9 => TileKind::End,
            10 => TileKind::Buy,
            other => TileKind::Decor(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            TileKind::Transition(id) => (-i64::from(id.0)) as i32,
            TileKind::Grass => 1,
            TileKind::Road => 2,
            TileKind::RoadEnd => 3,
            TileKind::Water => 4,
            TileKind::Unwalkable => 5,
            TileKind::Game => 6,
            TileKind::TiledPath => 7,
            TileKind::Npc => 8,
            TileKind::End => 9,
            TileKind::Buy => 10,
            TileKind::Decor(code) => code,
        }
    }

    /// Used by the mover's own collision check; the map never blocks.
    pub fn is_walkable(self) -> bool {
        !matches!(self, TileKind::Water | TileKind::Unwalkable)
    }
}

impl Default for TileKind {
    fn default() -> Self {
        TileKind::Decor(0)
    }
}

/// What standing on a tile means, after policy is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum TileBehavior {
    Transition(MapId),
    Terrain { speed: f32 },
    OpenMinigame,
    Converse,
    /// Narrative terminal, gated on the policy's key items.
    Complete,
    /// Trade the policy's cost item for its reward item.
    Exchange,
    Blocked,
    Inert,
}

/// Tunable side of the dispatch table, loaded with the world config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilePolicy {
    pub grass_speed: f32,
    pub road_speed: f32,
    pub road_end_speed: f32,
    pub tiled_path_speed: f32,
    /// All of these must be held for the end tile to complete the map.
    pub terminal_keys: Vec<ItemId>,
    pub exchange_cost: ItemId,
    pub exchange_reward: ItemId,
}

impl Default for TilePolicy {
    fn default() -> Self {
        Self {
            grass_speed: 2.5,
            road_speed: 3.5,
            road_end_speed: 3.0,
            tiled_path_speed: 4.0,
            terminal_keys: vec![RED_HEART.to_string(), BLUE_HEART.to_string()],
            exchange_cost: PRIZE_TICKET.to_string(),
            exchange_reward: TEDDY_BEAR.to_string(),
        }
    }
}

impl TilePolicy {
    pub fn behavior(&self, kind: TileKind) -> TileBehavior {
        match kind {
            TileKind::Transition(target) => TileBehavior::Transition(target),
            TileKind::Grass => TileBehavior::Terrain { speed: self.grass_speed },
            TileKind::Road => TileBehavior::Terrain { speed: self.road_speed },
            TileKind::RoadEnd => TileBehavior::Terrain { speed: self.road_end_speed },
            TileKind::TiledPath => TileBehavior::Terrain { speed: self.tiled_path_speed },
            TileKind::Game => TileBehavior::OpenMinigame,
            TileKind::Npc => TileBehavior::Converse,
            TileKind::End => TileBehavior::Complete,
            TileKind::Buy => TileBehavior::Exchange,
            TileKind::Water | TileKind::Unwalkable => TileBehavior::Blocked,
            TileKind::Decor(_) => TileBehavior::Inert,
        }
    }

    pub fn holds_terminal_keys(&self, actor: &dyn ActorState) -> bool {
        self.terminal_keys.iter().all(|key| actor.has_item(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_codes_are_transitions() {
        assert_eq!(TileKind::from_code(-3), TileKind::Transition(MapId(3)));
        assert_eq!(TileKind::from_code(-12), TileKind::Transition(MapId(12)));
    }

    #[test]
    fn test_code_round_trip_for_known_kinds() {
        for code in -6..=12 {
            assert_eq!(TileKind::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_most_negative_code_round_trips() {
        let kind = TileKind::from_code(i32::MIN);
        assert_eq!(kind, TileKind::Transition(MapId(1 << 31)));
        assert_eq!(kind.code(), i32::MIN);
    }

    #[test]
    fn test_unknown_codes_are_inert_decor() {
        let policy = TilePolicy::default();
        assert_eq!(TileKind::from_code(0), TileKind::Decor(0));
        assert_eq!(policy.behavior(TileKind::from_code(42)), TileBehavior::Inert);
    }

    #[test]
    fn test_terrain_speeds() {
        let policy = TilePolicy::default();
        assert_eq!(policy.behavior(TileKind::Grass), TileBehavior::Terrain { speed: 2.5 });
        assert_eq!(policy.behavior(TileKind::Road), TileBehavior::Terrain { speed: 3.5 });
        assert_eq!(policy.behavior(TileKind::RoadEnd), TileBehavior::Terrain { speed: 3.0 });
        assert_eq!(policy.behavior(TileKind::TiledPath), TileBehavior::Terrain { speed: 4.0 });
    }

    #[test]
    fn test_blocking_tiles() {
        assert!(!TileKind::Water.is_walkable());
        assert!(!TileKind::Unwalkable.is_walkable());
        assert!(TileKind::Npc.is_walkable());
        assert!(TileKind::Transition(MapId(2)).is_walkable());
        assert_eq!(TilePolicy::default().behavior(TileKind::Water), TileBehavior::Blocked);
    }
}
