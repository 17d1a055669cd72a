use bevy::prelude::*;
use crate::shared::*;
use crate::world::MapManager;

/// Core movement system. While shown, records the cell the player stood on
/// at the start of the frame, then moves along the input axis at the
/// terrain speed.
///
/// Movement is continuous pixel motion; `location` is kept in sync with the
/// cell under the player's feet for tile lookups.
pub fn player_movement(
    time: Res<Time>,
    input: Res<PlayerInput>,
    manager: Res<MapManager>,
    mut player: ResMut<PlayerState>,
) {
    // Hidden while a minigame owns the screen.
    if !player.visible {
        return;
    }
    player.prev_location = player.location;

    if input.move_axis == Vec2::ZERO {
        return;
    }
    let Some(map) = manager.current() else {
        return;
    };

    let next = step(
        player.position,
        input.move_axis,
        player.speed,
        time.delta_secs(),
        |location| map.is_walkable(location),
    );
    player.position = next;
    player.location = GridLocation::from_pixel(next);
}

/// One frame of motion in pixel space. Axes are resolved separately so the
/// player slides along walls instead of sticking to them.
///
/// `axis` is screen-oriented (y up); `speed` is pixels per frame at
/// [`SPEED_FRAME_RATE`].
pub fn step(
    position: Vec2,
    axis: Vec2,
    speed: f32,
    dt_secs: f32,
    walkable: impl Fn(GridLocation) -> bool,
) -> Vec2 {
    let delta = axis * speed * SPEED_FRAME_RATE * dt_secs;
    let mut next = position;

    let candidate_x = Vec2::new(next.x + delta.x, next.y);
    if walkable(GridLocation::from_pixel(candidate_x)) {
        next = candidate_x;
    }
    let candidate_y = Vec2::new(next.x, next.y - delta.y);
    if walkable(GridLocation::from_pixel(candidate_y)) {
        next = candidate_y;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::maps::csv_with;
    use crate::world::{Map, TilePolicy};

    const FRAME: f32 = 1.0 / 60.0;

    fn open(location: GridLocation) -> bool {
        location.is_valid()
    }

    #[test]
    fn test_speed_is_pixels_per_frame() {
        let start = GridLocation::new(5, 5).to_pixel();
        let next = step(start, Vec2::X, 2.5, FRAME, open);
        assert!((next.x - start.x - 2.5).abs() < 1e-4);
        assert_eq!(next.y, start.y);
    }

    #[test]
    fn test_up_moves_toward_row_zero() {
        let start = GridLocation::new(5, 5).to_pixel();
        let next = step(start, Vec2::Y, 4.0, FRAME, open);
        assert!(next.y < start.y);
    }

    #[test]
    fn test_cannot_leave_the_grid() {
        let start = Vec2::new(1.0, 1.0);
        let next = step(start, Vec2::new(-1.0, 1.0).normalize(), 4.0, FRAME, open);
        assert_eq!(next, start);
    }

    #[test]
    fn test_slides_along_blocked_axis() {
        let wall = GridLocation::new(5, 6);
        let start = Vec2::new(6.0 * TILE_SIZE - 1.0, 5.5 * TILE_SIZE);
        let next = step(start, Vec2::new(1.0, -1.0).normalize(), 4.0, FRAME, |loc| {
            loc != wall && loc.is_valid()
        });
        assert_eq!(next.x, start.x);
        assert!(next.y > start.y);
    }

    fn movement_app(player: PlayerState) -> App {
        let mut manager = MapManager::new(TilePolicy::default());
        manager.insert(Map::parse(MapId(1), &csv_with(&[], None)));
        manager.request_map_change(MapId(1));

        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(manager)
            .insert_resource(player)
            .init_resource::<PlayerInput>()
            .add_systems(Update, player_movement);
        app
    }

    #[test]
    fn test_hidden_player_keeps_previous_cell() {
        let mut player = PlayerState::default();
        player.place_at(GridLocation::new(4, 4));
        player.location = GridLocation::new(4, 5);
        player.visible = false;

        let mut app = movement_app(player);
        app.update();
        let player = app.world().resource::<PlayerState>();
        assert_eq!(player.prev_location, GridLocation::new(4, 4));
        assert_eq!(player.location, GridLocation::new(4, 5));
    }

    #[test]
    fn test_shown_player_settles_without_input() {
        let mut player = PlayerState::default();
        player.place_at(GridLocation::new(4, 4));
        player.location = GridLocation::new(4, 5);

        let mut app = movement_app(player);
        app.update();
        let player = app.world().resource::<PlayerState>();
        assert_eq!(player.prev_location, GridLocation::new(4, 5));
    }
}
