//! Data layer. Builds the map registry at game startup.
//!
//! This plugin runs in OnEnter(GameState::Loading): it reads the world
//! config, loads every map file into the [`MapManager`], places the NPCs,
//! pushes the start map and puts the player on the start cell, then
//! transitions the game into GameState::Playing.
//!
//! Content errors never stop the boot. A malformed row is logged by the map
//! parser; a missing file leaves that map unavailable.

pub mod config;

use bevy::prelude::*;
use std::path::{Path, PathBuf};

use crate::shared::*;
use crate::world::{Map, MapManager};

pub use config::{ConfigError, MapEntry, WorldConfig, CONFIG_FILE};

pub struct DataPlugin;

impl Plugin for DataPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DataRoot>()
            .init_resource::<MapManager>()
            .init_resource::<WorldLayout>()
            .add_systems(OnEnter(GameState::Loading), load_world);
    }
}

/// Directory holding `world.ron` and the maps directory.
#[derive(Resource, Debug, Clone)]
pub struct DataRoot(pub PathBuf);

impl Default for DataRoot {
    fn default() -> Self {
        Self(PathBuf::from("assets"))
    }
}

/// Build a registry from a config. Never fails; unloadable maps are
/// registered as unavailable.
pub fn build_manager(config: &WorldConfig, root: &Path) -> MapManager {
    let maps_dir = root.join(&config.maps_dir);
    let mut manager = MapManager::new(config.policy.clone()).with_gates(config.gates.clone());

    for entry in &config.maps {
        match Map::load(entry.id, &maps_dir.join(&entry.file)) {
            Ok(map) => manager.insert(map),
            Err(e) => {
                warn!("[Data] {} unavailable: {}", entry.id, e);
                manager.mark_unavailable(entry.id, e.to_string());
            }
        }
    }

    for spec in &config.npcs {
        match manager.map_mut(spec.map) {
            Some(map) => map.set_npc(spec.build()),
            None => warn!("[Data] No {} for NPC {}", spec.map, spec.name),
        }
    }

    manager
}

fn load_world(
    root: Res<DataRoot>,
    mut manager: ResMut<MapManager>,
    mut layout: ResMut<WorldLayout>,
    mut player: ResMut<PlayerState>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    info!("[Data] Loading world from {}", root.0.display());

    let config = WorldConfig::load_or_default(&root.0.join(CONFIG_FILE));
    *manager = build_manager(&config, &root.0);
    *layout = config.layout;

    if !manager.request_map_change(layout.start_map) {
        warn!("[Data] Start map {} could not be entered", layout.start_map);
    }
    player.place_at(layout.start_location);

    info!(
        "[Data] {} maps registered, starting on {} at {}. Transitioning to Playing.",
        manager.registered_count(),
        layout.start_map,
        layout.start_location
    );
    next_state.set(GameState::Playing);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::maps::csv_with;
    use std::fs;

    fn write_map(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).expect("write map");
    }

    #[test]
    fn test_missing_map_file_is_unavailable() {
        let root = tempfile::tempdir().expect("temp dir");
        let maps = root.path().join("maps");
        fs::create_dir_all(&maps).expect("maps dir");
        write_map(&maps, "Map1.csv", &csv_with(&[(GridLocation::new(0, 0), -2)], None));

        let config = WorldConfig {
            maps: vec![
                MapEntry { id: MapId(1), file: "Map1.csv".into() },
                MapEntry { id: MapId(2), file: "Map2.csv".into() },
            ],
            ..default()
        };
        let mut manager = build_manager(&config, root.path());

        assert_eq!(manager.registered_count(), 2);
        assert!(manager.map(MapId(1)).is_some());
        assert!(manager.map(MapId(2)).is_none());
        assert!(manager.request_map_change(MapId(1)));
        assert!(!manager.request_map_change(MapId(2)));
    }

    #[test]
    fn test_npcs_attach_to_their_maps() {
        let root = tempfile::tempdir().expect("temp dir");
        let maps = root.path().join("maps");
        fs::create_dir_all(&maps).expect("maps dir");
        for n in 1..=6 {
            write_map(&maps, &format!("Map{}.csv", n), &csv_with(&[], None));
        }

        let manager = build_manager(&WorldConfig::default(), root.path());
        assert!(manager.map(MapId(1)).and_then(Map::npc).is_some());
        assert!(manager.map(MapId(4)).and_then(Map::npc).is_some());
        assert!(manager.map(MapId(2)).and_then(Map::npc).is_none());
    }
}
