use bevy::prelude::*;

use super::{MapManager, TileKind};
use crate::shared::*;

/// Which map the spawned tile sprites belong to.
#[derive(Resource, Debug, Default)]
pub struct RenderedMap {
    pub map_id: Option<MapId>,
    pub frame: usize,
}

/// Marker for every entity owned by the drawn map (for bulk despawn).
#[derive(Component, Debug)]
pub struct MapTile {
    pub kind: TileKind,
}

#[derive(Component, Debug)]
pub struct NpcSprite;

#[derive(Component, Debug)]
pub struct PromptText;

fn tile_color(kind: TileKind, frame: usize) -> Color {
    let shimmer = if frame % 2 == 0 { 0.0 } else { 0.06 };
    match kind {
        TileKind::Transition(_) => Color::srgb(0.85, 0.75, 0.35),
        TileKind::Grass => Color::srgb(0.3, 0.68, 0.3),
        TileKind::Road => Color::srgb(0.42, 0.42, 0.45),
        TileKind::RoadEnd => Color::srgb(0.5, 0.48, 0.45),
        TileKind::Water => Color::srgb(0.2 + shimmer, 0.4 + shimmer, 0.82),
        TileKind::Unwalkable => Color::srgb(0.25, 0.2, 0.18),
        TileKind::Game => Color::srgb(0.75, 0.3, 0.6),
        TileKind::TiledPath => Color::srgb(0.7, 0.65, 0.5),
        TileKind::Npc => Color::srgb(0.4, 0.62, 0.35),
        TileKind::End => Color::srgb(0.95, 0.45, 0.5),
        TileKind::Buy => Color::srgb(0.95, 0.8, 0.3),
        TileKind::Decor(_) => Color::srgb(0.08, 0.08, 0.1),
    }
}

fn cell_translation(location: GridLocation, z: f32) -> Vec3 {
    pixel_to_world(location.to_pixel()).extend(z)
}

/// Respawn tile sprites whenever the active map changes.
pub fn sync_map_tiles(
    mut commands: Commands,
    manager: Res<MapManager>,
    mut rendered: ResMut<RenderedMap>,
    tiles: Query<Entity, With<MapTile>>,
    npc_sprites: Query<Entity, With<NpcSprite>>,
) {
    let current = manager.current_id();
    if current == rendered.map_id {
        return;
    }

    for entity in tiles.iter().chain(npc_sprites.iter()) {
        commands.entity(entity).despawn_recursive();
    }
    rendered.map_id = current;
    rendered.frame = 0;

    let Some(map) = manager.current() else {
        return;
    };

    for (row, cells) in map.tiles().iter().enumerate() {
        for (col, kind) in cells.iter().enumerate() {
            let location = GridLocation::new(row as i32, col as i32);
            commands.spawn((
                Sprite {
                    color: tile_color(*kind, 0),
                    custom_size: Some(Vec2::splat(TILE_SIZE)),
                    ..default()
                },
                Transform::from_translation(cell_translation(location, 0.0)),
                MapTile { kind: *kind },
            ));
        }
    }

    if let Some(npc) = map.npc() {
        let view = npc.view();
        commands.spawn((
            Sprite {
                color: Color::srgb(0.9, 0.55, 0.2),
                custom_size: Some(Vec2::splat(TILE_SIZE * 0.8)),
                ..default()
            },
            Transform::from_translation(cell_translation(view.location, 5.0)),
            NpcSprite,
        ));
    }
}

/// Recolor animated tiles when the map's ambient frame advances.
pub fn refresh_ambient_tiles(
    manager: Res<MapManager>,
    mut rendered: ResMut<RenderedMap>,
    mut tiles: Query<(&MapTile, &mut Sprite)>,
) {
    let Some(view) = manager.current().map(|map| map.view()) else {
        return;
    };
    if view.frame == rendered.frame {
        return;
    }
    rendered.frame = view.frame;

    for (tile, mut sprite) in tiles.iter_mut() {
        if tile.kind == TileKind::Water {
            sprite.color = tile_color(tile.kind, view.frame);
        }
    }
}

pub fn animate_npc_sprite(
    manager: Res<MapManager>,
    mut sprites: Query<(&mut Sprite, &mut Transform), With<NpcSprite>>,
) {
    let Some(view) = manager.current().and_then(|map| map.npc()).map(|npc| npc.view()) else {
        return;
    };
    for (mut sprite, mut transform) in sprites.iter_mut() {
        let bob = if view.frame % 2 == 0 { 0.0 } else { 2.0 };
        transform.translation = cell_translation(view.location, 5.0) + Vec3::Y * bob;
        sprite.color = if view.interacting {
            Color::srgb(1.0, 0.75, 0.35)
        } else {
            Color::srgb(0.9, 0.55, 0.2)
        };
    }
}

pub fn spawn_prompt(mut commands: Commands, existing: Query<Entity, With<PromptText>>) {
    if !existing.is_empty() {
        return;
    }
    commands.spawn((
        Text2d::new("[E]"),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_translation(Vec3::new(0.0, 0.0, 20.0)),
        Visibility::Hidden,
        PromptText,
    ));
}

/// The [E] hint floats above the player while the tile underfoot can be used.
pub fn update_prompt(
    manager: Res<MapManager>,
    player: Res<PlayerState>,
    mut prompts: Query<(&mut Transform, &mut Visibility), With<PromptText>>,
) {
    let visible = player.visible
        && manager
            .current()
            .is_some_and(|map| map.view().prompt_visible);
    for (mut transform, mut visibility) in prompts.iter_mut() {
        *visibility = if visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
        let above = pixel_to_world(player.position) + Vec2::Y * TILE_SIZE;
        transform.translation = above.extend(20.0);
    }
}
