use bevy::prelude::*;
use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// MUSIC STATE: tracks the currently playing music entity
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource, Default)]
pub struct MusicState {
    pub current_track: Option<Entity>,
    pub current_track_id: String,
}

/// Maps SFX IDs (sent by other domains) to actual audio file paths.
fn sfx_path(sfx_id: &str) -> Option<&'static str> {
    match sfx_id {
        "door" => Some("audio/sfx/door.ogg"),
        "locked" => Some("audio/sfx/locked.ogg"),
        "collect" => Some("audio/sfx/collect.ogg"),
        _ => None,
    }
}

fn music_path(track_id: &str) -> Option<&'static str> {
    match track_id {
        "town" => Some("audio/music/town.ogg"),
        "ending" => Some("audio/music/ending.ogg"),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// Listen for PlaySfxEvent and spawn one-shot audio sources that auto-despawn.
pub fn handle_play_sfx(
    mut events: EventReader<PlaySfxEvent>,
    mut commands: Commands,
    asset_server: Res<AssetServer>,
) {
    for event in events.read() {
        match sfx_path(&event.sfx_id) {
            Some(path) => {
                commands.spawn((
                    AudioPlayer::new(asset_server.load(path)),
                    PlaybackSettings::DESPAWN,
                ));
            }
            None => debug!("[Audio] No sound for '{}'", event.sfx_id),
        }
    }
}

fn play_music(
    track_id: &str,
    commands: &mut Commands,
    asset_server: &AssetServer,
    music_state: &mut MusicState,
) {
    if music_state.current_track_id == track_id {
        return;
    }
    if let Some(entity) = music_state.current_track.take() {
        commands.entity(entity).despawn_recursive();
    }
    music_state.current_track_id = track_id.to_string();
    if let Some(path) = music_path(track_id) {
        let entity = commands
            .spawn((AudioPlayer::new(asset_server.load(path)), PlaybackSettings::LOOP))
            .id();
        music_state.current_track = Some(entity);
    }
}

pub fn start_town_music(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut music_state: ResMut<MusicState>,
) {
    play_music("town", &mut commands, &asset_server, &mut music_state);
}

pub fn start_ending_music(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut music_state: ResMut<MusicState>,
) {
    play_music("ending", &mut commands, &asset_server, &mut music_state);
}
