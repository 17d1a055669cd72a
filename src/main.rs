use bevy::prelude::*;
use bevy::window::{PresentMode, WindowResolution};

use willowbrook::shared::*;
use willowbrook::{data, input, player, save, ui, world};

fn main() {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Willowbrook".into(),
                        resolution: WindowResolution::new(SCREEN_WIDTH, SCREEN_HEIGHT),
                        present_mode: PresentMode::AutoVsync,
                        resizable: true,
                        ..default()
                    }),
                    ..default()
                })
                .set(ImagePlugin::default_nearest()),
        )
        // Game state
        .init_state::<GameState>()
        // Shared resources
        .init_resource::<PlayerState>()
        .init_resource::<Inventory>()
        .init_resource::<PlayerInput>()
        .init_resource::<WorldFrozen>()
        .init_resource::<WorldLayout>()
        // Events
        .add_event::<MapTransitionEvent>()
        .add_event::<PlaySfxEvent>()
        .add_event::<ToastEvent>()
        .add_event::<SaveRequestEvent>()
        .add_event::<LoadRequestEvent>()
        // Domain plugins
        .add_plugins(input::InputPlugin)
        .add_plugins(player::PlayerPlugin)
        .add_plugins(world::WorldPlugin)
        .add_plugins(ui::UiPlugin)
        .add_plugins(save::SavePlugin)
        // Data loading
        .add_plugins(data::DataPlugin)
        // Camera
        .add_systems(Startup, setup_camera)
        .run();
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}
