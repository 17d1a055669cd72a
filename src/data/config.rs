//! World configuration loaded from `world.ron`.
//!
//! The defaults are the shipped town, so a missing config file still boots
//! the full game.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::npcs::{default_npcs, NpcSpec};
use crate::shared::*;
use crate::world::{EntryGate, TilePolicy};

pub const CONFIG_FILE: &str = "world.ron";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// One registered map and its CSV file, relative to `maps_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEntry {
    pub id: MapId,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Relative to the data root.
    pub maps_dir: String,
    pub maps: Vec<MapEntry>,
    pub layout: WorldLayout,
    pub gates: Vec<EntryGate>,
    pub npcs: Vec<NpcSpec>,
    pub policy: TilePolicy,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            maps_dir: "maps".to_string(),
            maps: (1..=6)
                .map(|n| MapEntry {
                    id: MapId(n),
                    file: format!("Map{}.csv", n),
                })
                .collect(),
            layout: WorldLayout::default(),
            gates: vec![EntryGate {
                map: MapId(5),
                required: ARCADE_TOKEN.to_string(),
            }],
            npcs: default_npcs(),
            policy: TilePolicy::default(),
        }
    }
}

impl WorldConfig {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Load `path`, falling back to the shipped defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("[Data] No {} found, using built-in world", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("[Data] {}; using built-in world", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_shipped_story() {
        let config = WorldConfig::default();
        assert_eq!(config.maps.len(), 6);
        assert_eq!(config.layout.start_map, MapId(6));
        assert_eq!(config.layout.start_location, GridLocation::new(7, 10));
        assert_eq!(config.layout.epilogue_map, MapId(1));
        assert_eq!(config.layout.reunion_map, MapId(4));
        assert_eq!(config.gates[0].map, MapId(5));
        assert_eq!(config.npcs.len(), 2);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let text = r#"(
            layout: (
                start_map: (2),
                start_location: (row: 3, col: 4),
                epilogue_map: (1),
            ),
        )"#;
        let config = WorldConfig::parse(text, Path::new("world.ron")).expect("valid ron");
        assert_eq!(config.layout.start_map, MapId(2));
        assert_eq!(config.layout.start_location, GridLocation::new(3, 4));
        assert_eq!(config.layout.reunion_map, MapId(4));
        assert_eq!(config.maps.len(), 6);
        assert_eq!(config.policy, TilePolicy::default());
    }

    #[test]
    fn test_bad_file_is_a_parse_error() {
        let err = WorldConfig::parse("(maps_dir: 12", Path::new("world.ron"))
            .expect_err("truncated ron");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_round_trips_through_ron() {
        let config = WorldConfig::default();
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default())
            .expect("serializable");
        let back = WorldConfig::parse(&text, Path::new("world.ron")).expect("parses back");
        assert_eq!(back, config);
    }

    #[test]
    fn test_shipped_file_is_the_built_in_world() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("assets")
            .join(CONFIG_FILE);
        let shipped = WorldConfig::load(&path).expect("shipped world.ron parses");
        assert_eq!(shipped, WorldConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = WorldConfig::load_or_default(&dir.path().join(CONFIG_FILE));
        assert_eq!(config, WorldConfig::default());
    }
}
