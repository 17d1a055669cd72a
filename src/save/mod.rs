use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::shared::*;
use crate::world::{MapManager, NavigationSnapshot};

// ═══════════════════════════════════════════════════════════════════════
// PUBLIC TYPES
// ═══════════════════════════════════════════════════════════════════════

pub const SAVE_VERSION: u32 = 1;
pub const SAVE_FILE: &str = "willowbrook.json";

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SavePath>().add_systems(
            Update,
            (quicksave_keybind, handle_save_request, handle_load_request)
                .chain()
                .after(crate::world::advance_active_map)
                .run_if(in_state(GameState::Playing)),
        );
    }
}

/// Where the single save file lives.
#[derive(Resource, Debug, Clone)]
pub struct SavePath(pub PathBuf);

impl Default for SavePath {
    fn default() -> Self {
        Self(saves_directory().join(SAVE_FILE))
    }
}

/// The parts of the player worth keeping. Position is rebuilt from the cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub location: GridLocation,
    pub cash: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub save_timestamp: u64,
    pub player: PlayerSnapshot,
    pub inventory: Inventory,
    pub navigation: NavigationSnapshot,
}

impl SaveData {
    pub fn capture(player: &PlayerState, inventory: &Inventory, manager: &MapManager) -> Self {
        Self {
            version: SAVE_VERSION,
            save_timestamp: current_timestamp(),
            player: PlayerSnapshot {
                location: player.location,
                cash: player.cash,
            },
            inventory: inventory.clone(),
            navigation: manager.snapshot(),
        }
    }

    /// Navigation goes first so a save naming unknown maps changes nothing.
    pub fn apply(
        self,
        player: &mut PlayerState,
        inventory: &mut Inventory,
        manager: &mut MapManager,
    ) -> Result<(), String> {
        manager.restore(&self.navigation)?;
        *player = PlayerState {
            cash: self.player.cash,
            ..default()
        };
        player.place_at(self.player.location);
        *inventory = self.inventory;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// FILESYSTEM HELPERS
// ═══════════════════════════════════════════════════════════════════════

fn saves_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    exe_dir.join("saves")
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ═══════════════════════════════════════════════════════════════════════
// SAVE / LOAD LOGIC
// ═══════════════════════════════════════════════════════════════════════

pub fn write_save(path: &Path, data: &SaveData) -> Result<(), String> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| format!("Could not create saves directory: {}", e))?;
    }

    let json =
        serde_json::to_string_pretty(data).map_err(|e| format!("Serialization failed: {}", e))?;

    // Write to a temp file first, then rename for atomicity
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &json)
        .map_err(|e| format!("Write failed for {}: {}", tmp_path.display(), e))?;
    fs::rename(&tmp_path, path).map_err(|e| format!("Rename failed: {}", e))?;

    Ok(())
}

pub fn read_save(path: &Path) -> Result<SaveData, String> {
    if !path.exists() {
        return Err(format!("No save at {}", path.display()));
    }
    let json = fs::read_to_string(path)
        .map_err(|e| format!("Read failed for {}: {}", path.display(), e))?;
    let data: SaveData =
        serde_json::from_str(&json).map_err(|e| format!("Deserialization failed: {}", e))?;

    if data.version != SAVE_VERSION {
        warn!(
            "[Save] {} has version {} but current version is {}. Attempting to load anyway.",
            path.display(),
            data.version,
            SAVE_VERSION
        );
    }

    Ok(data)
}

pub fn handle_save_request(
    mut save_events: EventReader<SaveRequestEvent>,
    mut toasts: EventWriter<ToastEvent>,
    path: Res<SavePath>,
    player: Res<PlayerState>,
    inventory: Res<Inventory>,
    manager: Res<MapManager>,
) {
    for _ in save_events.read() {
        let data = SaveData::capture(&player, &inventory, &manager);
        match write_save(&path.0, &data) {
            Ok(()) => {
                info!("[Save] Saved to {}", path.0.display());
                toasts.send(ToastEvent {
                    message: "Game saved".into(),
                    duration_secs: 2.0,
                });
            }
            Err(e) => {
                warn!("[Save] Save FAILED: {}", e);
                toasts.send(ToastEvent {
                    message: "Save failed".into(),
                    duration_secs: 2.0,
                });
            }
        }
    }
}

pub fn handle_load_request(
    mut load_events: EventReader<LoadRequestEvent>,
    mut toasts: EventWriter<ToastEvent>,
    path: Res<SavePath>,
    mut player: ResMut<PlayerState>,
    mut inventory: ResMut<Inventory>,
    mut manager: ResMut<MapManager>,
) {
    for _ in load_events.read() {
        let result = read_save(&path.0)
            .and_then(|data| data.apply(&mut player, &mut inventory, &mut manager));
        match result {
            Ok(()) => {
                info!("[Save] Loaded {}", path.0.display());
                toasts.send(ToastEvent {
                    message: "Game loaded".into(),
                    duration_secs: 2.0,
                });
            }
            Err(e) => {
                warn!("[Save] Load FAILED: {}", e);
                toasts.send(ToastEvent {
                    message: "Load failed".into(),
                    duration_secs: 2.0,
                });
            }
        }
    }
}

/// F5 = quicksave, F9 = quickload.
fn quicksave_keybind(
    player_input: Res<PlayerInput>,
    mut save_writer: EventWriter<SaveRequestEvent>,
    mut load_writer: EventWriter<LoadRequestEvent>,
) {
    if player_input.quicksave {
        save_writer.send(SaveRequestEvent);
    }
    if player_input.quickload {
        load_writer.send(LoadRequestEvent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::maps::csv_with;
    use crate::world::{Map, TilePolicy};

    fn manager() -> MapManager {
        let mut manager = MapManager::new(TilePolicy::default());
        for n in 1..=3 {
            manager.insert(Map::parse(MapId(n), &csv_with(&[], None)));
        }
        manager.request_map_change(MapId(1));
        manager.request_map_change(MapId(3));
        manager
    }

    #[test]
    fn test_save_then_load_restores_everything() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("saves").join(SAVE_FILE);

        let mut player = PlayerState::default();
        player.place_at(GridLocation::new(4, 9));
        player.cash = 35;
        let mut inventory = Inventory::default();
        inventory.add(ARCADE_TOKEN);
        let mut manager = manager();

        let data = SaveData::capture(&player, &inventory, &manager);
        write_save(&path, &data).expect("save written");

        player = PlayerState::default();
        inventory = Inventory::default();
        manager.reset_progress();

        read_save(&path)
            .expect("save read")
            .apply(&mut player, &mut inventory, &mut manager)
            .expect("save applies");

        assert_eq!(player.location, GridLocation::new(4, 9));
        assert_eq!(player.prev_location, player.location);
        assert_eq!(player.cash, 35);
        assert!(inventory.has(ARCADE_TOKEN));
        assert_eq!(manager.current_id(), Some(MapId(3)));
        assert_eq!(manager.stack().len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(read_save(&dir.path().join(SAVE_FILE)).is_err());
    }

    #[test]
    fn test_save_naming_unknown_map_changes_nothing() {
        let mut player = PlayerState::default();
        player.cash = 7;
        let mut inventory = Inventory::default();
        let mut manager = manager();

        let mut data = SaveData::capture(&player, &inventory, &manager);
        data.navigation.stack.push(MapId(9));
        data.player.cash = 500;

        assert!(data.apply(&mut player, &mut inventory, &mut manager).is_err());
        assert_eq!(player.cash, 7);
        assert_eq!(manager.current_id(), Some(MapId(3)));
    }
}
