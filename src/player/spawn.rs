use bevy::prelude::*;
use crate::shared::*;
use super::Player;

/// Spawn the player sprite. Runs once on `OnEnter(GameState::Playing)`.
pub fn spawn_player(mut commands: Commands, existing: Query<Entity, With<Player>>, player: Res<PlayerState>) {
    // Guard: don't double-spawn if returning to Playing state.
    if !existing.is_empty() {
        return;
    }

    commands.spawn((
        Player,
        // Placeholder sprite, a blue square
        Sprite {
            color: Color::srgb(0.2, 0.5, 0.8),
            custom_size: Some(Vec2::splat(TILE_SIZE * 0.75)),
            ..default()
        },
        // Z = 10 so the player draws above terrain and NPCs.
        Transform::from_translation(pixel_to_world(player.position).extend(10.0)),
        Visibility::default(),
    ));
}

pub fn sync_player_sprite(
    player: Res<PlayerState>,
    mut query: Query<(&mut Transform, &mut Visibility), With<Player>>,
) {
    let Ok((mut transform, mut visibility)) = query.get_single_mut() else {
        return;
    };
    transform.translation = pixel_to_world(player.position).extend(10.0);
    *visibility = if player.visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
}
