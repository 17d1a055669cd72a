mod audio;
mod hud;
mod toast;

use bevy::prelude::*;
use crate::shared::*;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<audio::MusicState>();

        // ─── TOASTS: always present ───
        app.add_systems(Startup, toast::spawn_toast_container);
        app.add_systems(
            Update,
            (toast::handle_toast_events, toast::update_toasts).chain(),
        );

        // ─── AUDIO ───
        app.add_systems(Update, audio::handle_play_sfx);
        app.add_systems(OnEnter(GameState::Playing), audio::start_town_music);
        app.add_systems(OnEnter(GameState::Ending), audio::start_ending_music);

        // ─── HUD: visible during Playing state ───
        app.add_systems(OnEnter(GameState::Playing), hud::spawn_hud);
        app.add_systems(OnExit(GameState::Playing), hud::despawn_hud);
        app.add_systems(
            Update,
            (
                hud::update_status,
                hud::update_npc_panel,
                hud::update_minigame_overlay,
            )
                .run_if(in_state(GameState::Playing)),
        );

        // ─── EPILOGUE ───
        app.add_systems(OnEnter(GameState::Ending), hud::spawn_epilogue_banner);
        app.add_systems(
            Update,
            (hud::update_epilogue_banner, leave_epilogue).run_if(in_state(GameState::Ending)),
        );
    }
}

/// Escape closes the game once the story is over.
fn leave_epilogue(input: Res<PlayerInput>, mut exit: EventWriter<AppExit>) {
    if input.cancel {
        info!("[Ui] Leaving the epilogue");
        exit.send(AppExit::Success);
    }
}
