//! World domain plugin for Willowbrook.
//!
//! Responsible for:
//! - The map registry and the visitation stack
//! - Per-frame tile interaction on the active map
//! - Turning engine signals into sound, toast and transition events
//! - The ending: the epilogue map and the reunion map thaw in turn, then
//!   the closing scene
//! - Drawing the active map

use bevy::prelude::*;

use crate::shared::*;

pub mod animation;
pub mod manager;
pub mod maps;
mod render;
pub mod stack;
pub mod tiles;

pub use manager::{EntryGate, MapManager, MapProgress, MapSlot, NavigationSnapshot};
pub use maps::{Map, MapLoadError, MapView, TransitionLink, WorldSignal};
pub use stack::VisitationStack;
pub use tiles::{TileBehavior, TileKind, TilePolicy};

use crate::minigames::MinigameOutcome;

/// Seconds one thaw scene of the ending lasts.
pub const THAW_SCENE_SECS: f32 = 6.5;
/// Share of a thaw scene after which the town starts moving.
const THAW_POINT: f32 = 0.3;
/// Seconds the closing scene stays up before the game quits.
pub const CLOSING_SECS: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpilogueScene {
    /// The epilogue map wakes up.
    #[default]
    FirstThaw,
    /// The reunion map wakes up.
    SecondThaw,
    /// Everyone together; the game quits when it ends.
    Together,
}

/// Where the ending is. `progress` runs 0..1 within the current scene.
#[derive(Resource, Debug, Clone, Default)]
pub struct Epilogue {
    pub scene: EpilogueScene,
    pub progress: f32,
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MapManager>()
            .init_resource::<Epilogue>()
            .init_resource::<render::RenderedMap>()
            .add_systems(
                Update,
                advance_active_map.run_if(in_state(GameState::Playing)),
            )
            .add_systems(OnEnter(GameState::Ending), begin_epilogue)
            .add_systems(
                Update,
                animate_epilogue.run_if(in_state(GameState::Ending)),
            )
            .add_systems(OnEnter(GameState::Playing), render::spawn_prompt)
            .add_systems(
                PostUpdate,
                (
                    render::sync_map_tiles,
                    render::refresh_ambient_tiles,
                    render::animate_npc_sprite,
                    render::update_prompt,
                )
                    .chain()
                    .run_if(not(in_state(GameState::Loading))),
            );
    }
}

// ═══════════════════════════════════════════════════════════════════════
// SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

/// Run the active map for one frame and publish what happened.
#[allow(clippy::too_many_arguments)]
pub fn advance_active_map(
    time: Res<Time>,
    input: Res<PlayerInput>,
    frozen: Res<WorldFrozen>,
    mut manager: ResMut<MapManager>,
    mut player: ResMut<PlayerState>,
    mut inventory: ResMut<Inventory>,
    mut sfx: EventWriter<PlaySfxEvent>,
    mut toasts: EventWriter<ToastEvent>,
    mut transitions: EventWriter<MapTransitionEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let mut actor = PlayerActor {
        state: &mut player,
        inventory: &mut inventory,
    };
    manager.advance(time.delta(), &mut actor, &input, frozen.0);

    for signal in manager.drain_signals() {
        match signal {
            WorldSignal::Entered { from, to, arrival } => {
                sfx.send(PlaySfxEvent {
                    sfx_id: "door".into(),
                });
                transitions.send(MapTransitionEvent {
                    from_map: from,
                    to_map: to,
                    arrival,
                });
            }
            WorldSignal::Locked { required, .. } => {
                sfx.send(PlaySfxEvent {
                    sfx_id: "locked".into(),
                });
                toasts.send(ToastEvent {
                    message: format!("Locked. Requires {}", required),
                    duration_secs: 2.0,
                });
            }
            WorldSignal::Collected { item } => {
                sfx.send(PlaySfxEvent {
                    sfx_id: "collect".into(),
                });
                toasts.send(ToastEvent {
                    message: format!("Received {}", item),
                    duration_secs: 2.5,
                });
            }
            WorldSignal::NpcTraded(trade) => {
                sfx.send(PlaySfxEvent {
                    sfx_id: "collect".into(),
                });
                toasts.send(ToastEvent {
                    message: format!("{} gave you {}", trade.npc_name, trade.received.join(" and ")),
                    duration_secs: 3.0,
                });
            }
            WorldSignal::MinigameOpened(kind) => {
                info!("[World] Opened {}", kind.title());
            }
            WorldSignal::MinigamePaid(outcome) => {
                sfx.send(PlaySfxEvent {
                    sfx_id: "collect".into(),
                });
                let message = match outcome {
                    MinigameOutcome::Cash(amount) => format!("Earned ${}", amount),
                    MinigameOutcome::Item(item) => format!("Won a {}", item),
                };
                toasts.send(ToastEvent {
                    message,
                    duration_secs: 2.5,
                });
            }
            WorldSignal::Completed { map } => {
                info!("[World] Story complete on {}", map);
            }
        }
    }

    // Polled rather than signalled so a restored completed map still ends.
    if manager.is_done_game() {
        next_state.set(GameState::Ending);
    }
}

/// Restart the path at the epilogue map, frozen until the first thaw.
pub fn begin_epilogue(
    layout: Res<WorldLayout>,
    mut epilogue: ResMut<Epilogue>,
    mut manager: ResMut<MapManager>,
    mut player: ResMut<PlayerState>,
    mut frozen: ResMut<WorldFrozen>,
) {
    if manager.enter_epilogue(layout.epilogue_map) {
        info!("[World] Epilogue on {}", layout.epilogue_map);
    }
    *epilogue = Epilogue::default();
    player.visible = false;
    frozen.0 = true;
}

/// Walk the ending scenes: thaw the epilogue map, move on to the reunion
/// map and thaw it, then hold the closing scene until the game quits.
pub fn animate_epilogue(
    time: Res<Time>,
    layout: Res<WorldLayout>,
    mut epilogue: ResMut<Epilogue>,
    mut manager: ResMut<MapManager>,
    mut frozen: ResMut<WorldFrozen>,
    mut exit: EventWriter<AppExit>,
) {
    let dt = time.delta_secs();

    match epilogue.scene {
        EpilogueScene::FirstThaw | EpilogueScene::SecondThaw => {
            manager.ambient_update(time.delta());
            epilogue.progress += dt / THAW_SCENE_SECS;
            if epilogue.progress >= THAW_POINT {
                frozen.0 = false;
            }

            if epilogue.progress >= 1.0 {
                epilogue.progress = 0.0;
                if epilogue.scene == EpilogueScene::FirstThaw {
                    if !manager.request_map_change(layout.reunion_map) {
                        warn!("[World] Reunion {} could not be entered", layout.reunion_map);
                    }
                    frozen.0 = true;
                    epilogue.scene = EpilogueScene::SecondThaw;
                } else {
                    epilogue.scene = EpilogueScene::Together;
                }
                info!("[World] Epilogue scene {:?}", epilogue.scene);
            }

            if let Some(map) = manager.current_mut() {
                map.set_frozen(frozen.0);
            }
        }
        EpilogueScene::Together => {
            let was_running = epilogue.progress < 1.0;
            epilogue.progress += dt / CLOSING_SECS;
            if was_running && epilogue.progress >= 1.0 {
                info!("[World] Closing scene finished");
                exit.send(AppExit::Success);
            }
        }
    }
}
