use bevy::prelude::*;
use crate::shared::*;

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<KeyBindings>()
            .init_resource::<InputContext>()
            .add_systems(
                PreUpdate,
                (manage_input_context, reset_and_read_input).chain(),
            );
    }
}

#[derive(Resource, Debug, Clone)]
pub struct KeyBindings {
    pub move_up: KeyCode,
    pub move_down: KeyCode,
    pub move_left: KeyCode,
    pub move_right: KeyCode,
    pub activate: KeyCode,
    pub cancel: KeyCode,
    pub quicksave: KeyCode,
    pub quickload: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_up: KeyCode::KeyW,
            move_down: KeyCode::KeyS,
            move_left: KeyCode::KeyA,
            move_right: KeyCode::KeyD,
            activate: KeyCode::KeyE,
            cancel: KeyCode::Escape,
            quicksave: KeyCode::F5,
            quickload: KeyCode::F9,
        }
    }
}

/// Which actions the keyboard may produce right now.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputContext {
    #[default]
    Disabled,
    Gameplay,
    /// The story is over; only cancel is read.
    Epilogue,
}

/// The single point where hardware input becomes game actions.
fn reset_and_read_input(
    keys: Res<ButtonInput<KeyCode>>,
    bindings: Res<KeyBindings>,
    context: Res<InputContext>,
    mut input: ResMut<PlayerInput>,
) {
    *input = PlayerInput::default();

    match *context {
        InputContext::Disabled => {}

        InputContext::Gameplay => {
            let mut axis = Vec2::ZERO;
            if keys.pressed(bindings.move_up) || keys.pressed(KeyCode::ArrowUp) {
                axis.y += 1.0;
            }
            if keys.pressed(bindings.move_down) || keys.pressed(KeyCode::ArrowDown) {
                axis.y -= 1.0;
            }
            if keys.pressed(bindings.move_left) || keys.pressed(KeyCode::ArrowLeft) {
                axis.x -= 1.0;
            }
            if keys.pressed(bindings.move_right) || keys.pressed(KeyCode::ArrowRight) {
                axis.x += 1.0;
            }
            input.move_axis = axis.normalize_or_zero();

            input.activate = keys.just_pressed(bindings.activate);
            input.activate_held = keys.pressed(bindings.activate);
            input.cancel = keys.just_pressed(bindings.cancel);

            input.quicksave = keys.just_pressed(bindings.quicksave);
            input.quickload = keys.just_pressed(bindings.quickload);
        }

        InputContext::Epilogue => {
            input.cancel = keys.just_pressed(bindings.cancel);
        }
    }
}

/// Derives InputContext from GameState. ONE system, replaces all per-domain guards.
fn manage_input_context(game_state: Res<State<GameState>>, mut context: ResMut<InputContext>) {
    *context = match *game_state.get() {
        GameState::Loading => InputContext::Disabled,
        GameState::Playing => InputContext::Gameplay,
        GameState::Ending => InputContext::Epilogue,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;

    fn app_in(state: GameState) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin));
        app.insert_state(state);
        app.init_resource::<PlayerInput>()
            .init_resource::<ButtonInput<KeyCode>>()
            .add_plugins(InputPlugin);
        app
    }

    #[test]
    fn test_activate_press_then_hold() {
        let mut app = app_in(GameState::Playing);
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyE);
        app.update();
        let input = app.world().resource::<PlayerInput>().clone();
        assert!(input.activate);
        assert!(input.activate_held);

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .clear_just_pressed(KeyCode::KeyE);
        app.update();
        let input = app.world().resource::<PlayerInput>().clone();
        assert!(!input.activate);
        assert!(input.activate_held);
    }

    #[test]
    fn test_diagonal_axis_is_normalized() {
        let mut app = app_in(GameState::Playing);
        {
            let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keys.press(KeyCode::KeyW);
            keys.press(KeyCode::KeyD);
        }
        app.update();
        let axis = app.world().resource::<PlayerInput>().move_axis;
        assert!((axis.length() - 1.0).abs() < 1e-5);
        assert!(axis.x > 0.0 && axis.y > 0.0);
    }

    #[test]
    fn test_loading_reads_nothing() {
        let mut app = app_in(GameState::Loading);
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyE);
        app.update();
        assert!(!app.world().resource::<PlayerInput>().activate_held);
    }
}
