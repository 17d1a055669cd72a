mod movement;
mod spawn;

use bevy::prelude::*;
use crate::shared::*;

pub use movement::{player_movement, step};

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        // -- Spawn player sprite when we enter Playing --
        app.add_systems(OnEnter(GameState::Playing), spawn::spawn_player);

        // -- Movement must settle before the active map reads the tile --
        app.add_systems(
            Update,
            movement::player_movement
                .before(crate::world::advance_active_map)
                .run_if(in_state(GameState::Playing)),
        );

        app.add_systems(PostUpdate, spawn::sync_player_sprite);
    }
}

/// Tag for the player's sprite entity.
#[derive(Component, Debug)]
pub struct Player;
