//! A single playfield.
//!
//! Each map is a fixed 25x25 grid of tile codes read from a CSV file, the
//! transition links derived from its negative codes, and optionally one
//! embedded minigame and one NPC. All tile-driven behavior for the actor
//! standing on the map happens here.

use bevy::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::animation::AmbientAnimation;
use super::tiles::{TileBehavior, TileKind, TilePolicy};
use crate::minigames::{Minigame, MinigameKind, MinigameOutcome, MinigameView};
use crate::npcs::{Npc, NpcTrade, NpcView};
use crate::shared::*;

pub type TileGrid = [[TileKind; GRID_SIZE]; GRID_SIZE];

/// A transition tile and the map it leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionLink {
    pub location: GridLocation,
    pub target: MapId,
}

#[derive(Debug, thiserror::Error)]
pub enum MapLoadError {
    #[error("map file {} not found", path.display())]
    Missing { path: PathBuf },
    #[error("could not read map file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Something a map or the manager wants the rest of the game to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldSignal {
    /// An exchange tile handed over an item.
    Collected { item: ItemId },
    NpcTraded(NpcTrade),
    MinigameOpened(MinigameKind),
    MinigamePaid(MinigameOutcome),
    Completed { map: MapId },
    Entered { from: MapId, to: MapId, arrival: GridLocation },
    Locked { target: MapId, required: ItemId },
}

/// Parsed contents of a map file.
#[derive(Debug, Clone)]
pub struct MapContent {
    pub tiles: TileGrid,
    pub transitions: Vec<TransitionLink>,
    pub minigame: Option<MinigameKind>,
    /// Content errors that were skipped over while parsing.
    pub warnings: Vec<String>,
}

/// Parse 25 rows of comma-separated codes plus one metadata line whose
/// second field names the embedded minigame.
///
/// A malformed row is left at its default and parsing carries on.
pub fn parse_map_csv(text: &str) -> MapContent {
    let mut tiles: TileGrid = [[TileKind::default(); GRID_SIZE]; GRID_SIZE];
    let mut transitions = Vec::new();
    let mut warnings = Vec::new();
    let mut lines = text.lines();

    for (row, grid_row) in tiles.iter_mut().enumerate() {
        let Some(line) = lines.next() else {
            warnings.push(format!("expected {} rows, found {}", GRID_SIZE, row));
            break;
        };

        let codes: Result<Vec<i32>, _> =
            line.split(',').map(|cell| cell.trim().parse::<i32>()).collect();
        let codes = match codes {
            Ok(codes) => codes,
            Err(e) => {
                warnings.push(format!("row {}: {}", row, e));
                continue;
            }
        };
        if codes.len() > GRID_SIZE {
            warnings.push(format!(
                "row {}: {} columns, extra columns ignored",
                row,
                codes.len()
            ));
        }

        for (col, code) in codes.into_iter().take(GRID_SIZE).enumerate() {
            let kind = TileKind::from_code(code);
            if let TileKind::Transition(target) = kind {
                transitions.push(TransitionLink {
                    location: GridLocation::new(row as i32, col as i32),
                    target,
                });
            }
            grid_row[col] = kind;
        }
    }

    let minigame = lines.next().and_then(|meta| {
        let name = meta.split(',').nth(1)?.trim();
        if name.is_empty() {
            return None;
        }
        let kind = MinigameKind::from_metadata(name);
        if kind.is_none() {
            warnings.push(format!("unknown minigame '{}'", name));
        }
        kind
    });

    MapContent {
        tiles,
        transitions,
        minigame,
        warnings,
    }
}

/// Render-side snapshot of the active map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub id: MapId,
    pub frame: usize,
    pub prompt_visible: bool,
    pub npc: Option<NpcView>,
    pub minigame: Option<MinigameView>,
}

#[derive(Debug)]
pub struct Map {
    id: MapId,
    tiles: TileGrid,
    transitions: Vec<TransitionLink>,
    minigame: Option<Box<dyn Minigame>>,
    npc: Option<Box<dyn Npc>>,
    completed: bool,
    animation: AmbientAnimation,
    prompt_visible: bool,
    signals: Vec<WorldSignal>,
}

impl Map {
    pub fn from_content(id: MapId, content: MapContent) -> Self {
        Self {
            id,
            tiles: content.tiles,
            transitions: content.transitions,
            minigame: content.minigame.map(MinigameKind::build),
            npc: None,
            completed: false,
            animation: AmbientAnimation::default(),
            prompt_visible: false,
            signals: Vec::new(),
        }
    }

    /// Build a map from CSV text, logging any content errors.
    pub fn parse(id: MapId, text: &str) -> Self {
        let content = parse_map_csv(text);
        for warning in &content.warnings {
            warn!("[World] {}: {}", id, warning);
        }
        Self::from_content(id, content)
    }

    pub fn load(id: MapId, path: &Path) -> Result<Self, MapLoadError> {
        let text = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => MapLoadError::Missing {
                path: path.to_path_buf(),
            },
            _ => MapLoadError::Unreadable {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Ok(Self::parse(id, &text))
    }

    pub fn with_npc(mut self, npc: Box<dyn Npc>) -> Self {
        self.npc = Some(npc);
        self
    }

    pub fn set_npc(&mut self, npc: Box<dyn Npc>) {
        self.npc = Some(npc);
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    pub fn tiles(&self) -> &TileGrid {
        &self.tiles
    }

    pub fn tile(&self, location: GridLocation) -> Option<TileKind> {
        if !location.is_valid() {
            return None;
        }
        Some(self.tiles[location.row as usize][location.col as usize])
    }

    /// Off-grid cells are never walkable.
    pub fn is_walkable(&self, location: GridLocation) -> bool {
        self.tile(location).is_some_and(TileKind::is_walkable)
    }

    /// Where arrivals from `source` land, or [`GridLocation::NONE`].
    pub fn find_link(&self, source: MapId) -> GridLocation {
        self.transitions
            .iter()
            .find(|link| link.target == source)
            .map_or(GridLocation::NONE, |link| link.location)
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn npc(&self) -> Option<&dyn Npc> {
        self.npc.as_deref()
    }

    pub fn npc_done(&self) -> bool {
        self.npc.as_ref().is_some_and(|npc| npc.is_done())
    }

    /// Restore saved progress onto this map.
    pub fn restore_progress(&mut self, completed: bool, npc_done: bool) {
        self.completed = completed;
        if let Some(npc) = self.npc.as_mut() {
            npc.set_done(npc_done);
        }
    }

    /// Drop per-visit state: close an open minigame, end any conversation,
    /// hide the prompt and forget queued signals. Progress flags stay.
    pub fn reset_transient(&mut self) {
        if let Some(game) = self.minigame.as_mut() {
            if game.is_open() {
                game.close();
            }
        }
        if let Some(npc) = self.npc.as_mut() {
            npc.set_interacting(false);
        }
        self.prompt_visible = false;
        self.signals.clear();
    }

    pub fn minigame_open(&self) -> bool {
        self.minigame.as_ref().is_some_and(|game| game.is_open())
    }

    pub fn set_frozen(&mut self, frozen: bool) {
        if frozen {
            self.animation.pause();
        } else {
            self.animation.resume();
        }
        if let Some(npc) = self.npc.as_mut() {
            npc.set_frozen(frozen);
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.animation.is_paused()
    }

    pub fn drain_signals(&mut self) -> Vec<WorldSignal> {
        std::mem::take(&mut self.signals)
    }

    /// One frame of play on this map.
    ///
    /// An open minigame takes the whole frame and hides the actor. Otherwise
    /// ambient animation and the NPC advance, and tile interactions run only
    /// once the actor has settled on a cell.
    pub fn frame_update(
        &mut self,
        delta: Duration,
        actor: &mut dyn ActorState,
        input: &PlayerInput,
        policy: &TilePolicy,
    ) -> Option<MapId> {
        if let Some(game) = self.minigame.as_mut() {
            if game.is_open() {
                actor.set_visible(false);
                if let Some(outcome) = game.tick(delta, input) {
                    outcome.apply(actor);
                    self.signals.push(WorldSignal::MinigamePaid(outcome));
                }
                return None;
            }
        }

        actor.set_visible(true);
        self.ambient_update(delta);

        if let Some(npc) = self.npc.as_mut() {
            if let Some(trade) = npc.tick(actor) {
                self.signals.push(WorldSignal::NpcTraded(trade));
            }
        }

        if actor.is_settled() {
            self.process_interaction(actor, input, policy)
        } else {
            self.prompt_visible = false;
            None
        }
    }

    /// Map and NPC animation only; no interaction.
    pub fn ambient_update(&mut self, delta: Duration) {
        self.animation.tick(delta);
        if let Some(npc) = self.npc.as_mut() {
            npc.animate(delta);
        }
    }

    /// Act on the tile under the actor. Returns a destination map only when
    /// activate was pressed on a transition tile.
    pub fn process_interaction(
        &mut self,
        actor: &mut dyn ActorState,
        input: &PlayerInput,
        policy: &TilePolicy,
    ) -> Option<MapId> {
        self.prompt_visible = false;
        let kind = self.tile(actor.location())?;

        if kind != TileKind::Npc {
            if let Some(npc) = self.npc.as_mut() {
                npc.set_interacting(false);
            }
        }

        match policy.behavior(kind) {
            TileBehavior::Transition(target) => {
                self.prompt_visible = true;
                if input.activate {
                    return Some(target);
                }
            }
            TileBehavior::Terrain { speed } => actor.set_speed(speed),
            TileBehavior::OpenMinigame => {
                if let Some(game) = self.minigame.as_mut() {
                    self.prompt_visible = true;
                    if input.activate {
                        game.open();
                        self.signals.push(WorldSignal::MinigameOpened(game.kind()));
                    }
                }
            }
            TileBehavior::Converse => {
                if let Some(npc) = self.npc.as_mut() {
                    npc.set_interacting(input.activate_held);
                    self.prompt_visible = !input.activate_held;
                }
            }
            TileBehavior::Complete => {
                if policy.holds_terminal_keys(actor) {
                    self.prompt_visible = true;
                    if input.activate && !self.completed {
                        self.completed = true;
                        info!("[World] {} completed", self.id);
                        self.signals.push(WorldSignal::Completed { map: self.id });
                    }
                }
            }
            TileBehavior::Exchange => {
                if actor.has_item(&policy.exchange_cost) {
                    self.prompt_visible = true;
                    if input.activate && actor.remove_item(&policy.exchange_cost) {
                        actor.add_item(&policy.exchange_reward);
                        info!(
                            "[World] Exchanged {} for {}",
                            policy.exchange_cost, policy.exchange_reward
                        );
                        self.signals.push(WorldSignal::Collected {
                            item: policy.exchange_reward.clone(),
                        });
                    }
                }
            }
            TileBehavior::Blocked | TileBehavior::Inert => {}
        }

        None
    }

    pub fn view(&self) -> MapView {
        MapView {
            id: self.id,
            frame: self.animation.frame(),
            prompt_visible: self.prompt_visible,
            npc: self.npc.as_ref().map(|npc| npc.view()),
            minigame: self
                .minigame
                .as_ref()
                .filter(|game| game.is_open())
                .map(|game| game.view()),
        }
    }
}

/// Build CSV text for a map from a sparse list of cells; everything else
/// is grass.
#[cfg(test)]
pub(crate) fn csv_with(cells: &[(GridLocation, i32)], minigame: Option<&str>) -> String {
    let mut grid = [[TileKind::Grass.code(); GRID_SIZE]; GRID_SIZE];
    for (location, code) in cells {
        if location.is_valid() {
            grid[location.row as usize][location.col as usize] = *code;
        }
    }
    let mut text = String::new();
    for row in grid.iter() {
        let line: Vec<String> = row.iter().map(|code| code.to_string()).collect();
        text.push_str(&line.join(","));
        text.push('\n');
    }
    text.push_str("meta");
    if let Some(name) = minigame {
        text.push(',');
        text.push_str(name);
    }
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npcs::{Price, TradeNpc};
    use crate::shared::testing::MockActor;

    fn press() -> PlayerInput {
        PlayerInput {
            activate: true,
            activate_held: true,
            ..default()
        }
    }

    fn hold() -> PlayerInput {
        PlayerInput {
            activate_held: true,
            ..default()
        }
    }

    fn idle() -> PlayerInput {
        PlayerInput::default()
    }

    fn loc(row: i32, col: i32) -> GridLocation {
        GridLocation::new(row, col)
    }

    #[test]
    fn test_parse_collects_one_link_per_negative_cell() {
        let text = csv_with(&[(loc(0, 5), -2), (loc(24, 0), -3), (loc(10, 10), 6)], None);
        let content = parse_map_csv(&text);
        assert!(content.warnings.is_empty());
        assert_eq!(
            content.transitions,
            vec![
                TransitionLink { location: loc(0, 5), target: MapId(2) },
                TransitionLink { location: loc(24, 0), target: MapId(3) },
            ]
        );
        assert_eq!(content.tiles[10][10], TileKind::Game);
    }

    #[test]
    fn test_parse_reads_minigame_metadata() {
        let text = csv_with(&[], Some("Cafe Orders"));
        assert_eq!(parse_map_csv(&text).minigame, Some(MinigameKind::CafeOrders));

        let text = csv_with(&[], None);
        assert_eq!(parse_map_csv(&text).minigame, None);
    }

    #[test]
    fn test_malformed_row_is_skipped_not_fatal() {
        let text = csv_with(&[(loc(3, 0), -4), (loc(5, 0), -2)], None);
        let mut lines: Vec<String> = text.lines().map(String::from).collect();
        lines[3] = "1,1,banana,1".to_string();
        let content = parse_map_csv(&lines.join("\n"));

        assert_eq!(content.warnings.len(), 1);
        assert_eq!(content.tiles[3][0], TileKind::default());
        assert_eq!(content.tiles[4][0], TileKind::Grass);
        assert_eq!(
            content.transitions,
            vec![TransitionLink { location: loc(5, 0), target: MapId(2) }]
        );
    }

    #[test]
    fn test_short_file_warns_and_keeps_defaults() {
        let content = parse_map_csv("1,1,1\n2,2,2\n");
        assert_eq!(content.warnings.len(), 1);
        assert_eq!(content.tiles[1][2], TileKind::Road);
        assert_eq!(content.tiles[2][0], TileKind::default());
    }

    #[test]
    fn test_unknown_minigame_warns() {
        let content = parse_map_csv(&csv_with(&[], Some("Pinball")));
        assert_eq!(content.minigame, None);
        assert_eq!(content.warnings.len(), 1);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = Map::load(MapId(9), Path::new("/definitely/not/here/Map9.csv"))
            .expect_err("missing file must not produce a map");
        assert!(matches!(err, MapLoadError::Missing { .. }));
    }

    #[test]
    fn test_find_link_sentinel() {
        let map = Map::parse(MapId(1), &csv_with(&[(loc(2, 2), -4)], None));
        assert_eq!(map.find_link(MapId(4)), loc(2, 2));
        assert_eq!(map.find_link(MapId(5)), GridLocation::NONE);
    }

    #[test]
    fn test_transition_needs_press() {
        let policy = TilePolicy::default();
        let mut map = Map::parse(MapId(1), &csv_with(&[(loc(2, 2), -4)], None));
        let mut actor = MockActor::at(2, 2);

        assert_eq!(map.process_interaction(&mut actor, &hold(), &policy), None);
        assert!(map.view().prompt_visible);
        assert_eq!(map.process_interaction(&mut actor, &press(), &policy), Some(MapId(4)));
    }

    #[test]
    fn test_terrain_sets_speed() {
        let policy = TilePolicy::default();
        let mut map = Map::parse(MapId(1), &csv_with(&[(loc(0, 1), 2), (loc(0, 2), 7)], None));
        let mut actor = MockActor::at(0, 0);

        map.process_interaction(&mut actor, &idle(), &policy);
        assert_eq!(actor.speed, 2.5);
        actor.set_location(loc(0, 1));
        map.process_interaction(&mut actor, &idle(), &policy);
        assert_eq!(actor.speed, 3.5);
        actor.set_location(loc(0, 2));
        map.process_interaction(&mut actor, &idle(), &policy);
        assert_eq!(actor.speed, 4.0);
    }

    #[test]
    fn test_exchange_swaps_ticket_once() {
        let policy = TilePolicy::default();
        let mut map = Map::parse(MapId(5), &csv_with(&[(loc(4, 4), 10)], None));
        let mut actor = MockActor::at(4, 4).holding(&[PRIZE_TICKET]);

        map.process_interaction(&mut actor, &press(), &policy);
        assert_eq!(actor.inventory.items, vec![TEDDY_BEAR.to_string()]);
        assert_eq!(
            map.drain_signals(),
            vec![WorldSignal::Collected { item: TEDDY_BEAR.to_string() }]
        );

        map.process_interaction(&mut actor, &press(), &policy);
        assert_eq!(actor.inventory.items, vec![TEDDY_BEAR.to_string()]);
        assert!(map.drain_signals().is_empty());
        assert!(!map.view().prompt_visible);
    }

    #[test]
    fn test_terminal_needs_both_keys() {
        let policy = TilePolicy::default();
        let mut map = Map::parse(MapId(6), &csv_with(&[(loc(1, 1), 9)], None));
        let mut actor = MockActor::at(1, 1).holding(&[RED_HEART]);

        map.process_interaction(&mut actor, &press(), &policy);
        assert!(!map.is_completed());

        actor.add_item(BLUE_HEART);
        map.process_interaction(&mut actor, &press(), &policy);
        assert!(map.is_completed());
        assert_eq!(map.drain_signals(), vec![WorldSignal::Completed { map: MapId(6) }]);

        map.process_interaction(&mut actor, &press(), &policy);
        assert!(map.is_completed());
        assert!(map.drain_signals().is_empty());
    }

    #[test]
    fn test_npc_follows_held_input() {
        let policy = TilePolicy::default();
        let npc = TradeNpc::new("Cat", "", loc(1, 1), Price::Item(TEDDY_BEAR.into()), vec![]);
        let mut map =
            Map::parse(MapId(4), &csv_with(&[(loc(1, 1), 8)], None)).with_npc(Box::new(npc));
        let mut actor = MockActor::at(1, 1);

        map.process_interaction(&mut actor, &hold(), &policy);
        assert!(map.npc().is_some_and(|npc| npc.is_interacting()));
        assert!(!map.view().prompt_visible);

        map.process_interaction(&mut actor, &idle(), &policy);
        assert!(map.npc().is_some_and(|npc| !npc.is_interacting()));
        assert!(map.view().prompt_visible);
    }

    #[test]
    fn test_leaving_npc_tile_ends_interaction() {
        let policy = TilePolicy::default();
        let npc = TradeNpc::new("Cat", "", loc(1, 1), Price::Cash(1), vec![]);
        let mut map =
            Map::parse(MapId(4), &csv_with(&[(loc(1, 1), 8)], None)).with_npc(Box::new(npc));
        let mut actor = MockActor::at(1, 1);

        map.process_interaction(&mut actor, &hold(), &policy);
        actor.set_location(loc(1, 2));
        map.process_interaction(&mut actor, &hold(), &policy);
        assert!(map.npc().is_some_and(|npc| !npc.is_interacting()));
    }

    #[test]
    fn test_game_tile_without_minigame_is_inert() {
        let policy = TilePolicy::default();
        let mut map = Map::parse(MapId(2), &csv_with(&[(loc(3, 3), 6)], None));
        let mut actor = MockActor::at(3, 3);
        assert_eq!(map.process_interaction(&mut actor, &press(), &policy), None);
        assert!(!map.minigame_open());
        assert!(!map.view().prompt_visible);
    }

    #[test]
    fn test_moving_actor_never_interacts() {
        let policy = TilePolicy::default();
        let mut map = Map::parse(
            MapId(5),
            &csv_with(&[(loc(0, 0), 10), (loc(0, 1), 10), (loc(0, 2), -1)], None),
        );
        let mut actor = MockActor::at(0, 0).holding(&[PRIZE_TICKET]);
        let dt = Duration::from_millis(16);

        actor.step_to(0, 1);
        assert_eq!(map.frame_update(dt, &mut actor, &press(), &policy), None);
        actor.step_to(0, 2);
        assert_eq!(map.frame_update(dt, &mut actor, &press(), &policy), None);
        assert!(actor.inventory.has(PRIZE_TICKET));

        actor.settle();
        assert_eq!(map.frame_update(dt, &mut actor, &press(), &policy), Some(MapId(1)));
    }

    #[test]
    fn test_open_minigame_owns_the_frame() {
        let policy = TilePolicy::default();
        let mut map = Map::parse(MapId(3), &csv_with(&[(loc(5, 5), 6)], Some("Cafe Orders")));
        let mut actor = MockActor::at(5, 5);
        let dt = Duration::from_millis(16);

        map.frame_update(dt, &mut actor, &press(), &policy);
        assert!(map.minigame_open());
        assert_eq!(
            map.drain_signals(),
            vec![WorldSignal::MinigameOpened(MinigameKind::CafeOrders)]
        );

        // Menu -> Playing, two points, then end the round.
        map.frame_update(dt, &mut actor, &press(), &policy);
        assert!(!actor.visible);
        map.frame_update(dt, &mut actor, &press(), &policy);
        map.frame_update(dt, &mut actor, &press(), &policy);
        let cancel = PlayerInput { cancel: true, ..default() };
        map.frame_update(dt, &mut actor, &cancel, &policy);
        assert_eq!(actor.cash, 10);

        // Results screen closes; the actor comes back next frame.
        map.frame_update(dt, &mut actor, &cancel, &policy);
        assert!(!map.minigame_open());
        map.frame_update(dt, &mut actor, &idle(), &policy);
        assert!(actor.visible);
    }

    #[test]
    fn test_frozen_map_holds_animation() {
        let mut map = Map::parse(MapId(1), &csv_with(&[], None));
        map.set_frozen(true);
        map.ambient_update(Duration::from_secs(3));
        assert_eq!(map.view().frame, 0);
        assert!(map.is_frozen());

        map.set_frozen(false);
        map.ambient_update(Duration::from_millis(600));
        assert_eq!(map.view().frame, 1);
    }
}
