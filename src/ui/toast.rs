use bevy::prelude::*;
use crate::shared::*;

/// Most toasts on screen at once.
const MAX_TOASTS: usize = 3;
const FADE_SECS: f32 = 0.5;

// ═══════════════════════════════════════════════════════════════════════
// COMPONENTS
// ═══════════════════════════════════════════════════════════════════════

/// Marker for the toast container node (top-center of screen).
#[derive(Component)]
pub struct ToastContainer;

#[derive(Component)]
pub struct ToastItem {
    pub timer: Timer,
    pub fade_timer: Option<Timer>,
}

pub fn spawn_toast_container(mut commands: Commands) {
    commands.spawn((
        ToastContainer,
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(60.0),
            left: Val::Percent(50.0),
            width: Val::Px(320.0),
            // Shift left by half of the width to center the column.
            margin: UiRect {
                left: Val::Px(-160.0),
                ..default()
            },
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(6.0),
            align_items: AlignItems::Center,
            ..default()
        },
    ));
}

/// Spawn a child node per ToastEvent.
pub fn handle_toast_events(
    mut commands: Commands,
    mut events: EventReader<ToastEvent>,
    container_query: Query<Entity, With<ToastContainer>>,
    existing_toasts: Query<Entity, With<ToastItem>>,
) {
    let Ok(container) = container_query.get_single() else {
        return;
    };

    let mut visible: Vec<Entity> = existing_toasts.iter().collect();
    for event in events.read() {
        if visible.len() >= MAX_TOASTS {
            let oldest = visible.remove(0);
            commands.entity(oldest).despawn_recursive();
        }

        let toast_entity = commands
            .spawn((
                ToastItem {
                    timer: Timer::from_seconds(event.duration_secs, TimerMode::Once),
                    fade_timer: None,
                },
                Node {
                    padding: UiRect::axes(Val::Px(12.0), Val::Px(5.0)),
                    border: UiRect::all(Val::Px(1.0)),
                    ..default()
                },
                BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.75)),
                BorderColor(Color::srgba(0.5, 0.5, 0.5, 0.5)),
            ))
            .with_children(|parent| {
                parent.spawn((
                    Text::new(event.message.clone()),
                    TextFont {
                        font_size: 14.0,
                        ..default()
                    },
                    TextColor(Color::WHITE),
                ));
            })
            .id();

        commands.entity(container).add_child(toast_entity);
        visible.push(toast_entity);
    }
}

/// Tick timers, fade out, despawn.
pub fn update_toasts(
    mut commands: Commands,
    time: Res<Time>,
    mut toast_query: Query<(Entity, &mut ToastItem, &mut BackgroundColor, &Children)>,
    mut text_color_query: Query<&mut TextColor>,
) {
    for (entity, mut toast, mut bg_color, children) in &mut toast_query {
        let ToastItem { timer, fade_timer } = &mut *toast;

        if fade_timer.is_none() {
            timer.tick(time.delta());
            if timer.just_finished() {
                *fade_timer = Some(Timer::from_seconds(FADE_SECS, TimerMode::Once));
            }
            continue;
        }
        let Some(fade) = fade_timer.as_mut() else {
            continue;
        };

        fade.tick(time.delta());
        if fade.finished() {
            commands.entity(entity).despawn_recursive();
            continue;
        }

        let alpha = 1.0 - fade.fraction();
        bg_color.0 = Color::srgba(0.0, 0.0, 0.0, 0.75 * alpha);
        for &child in children.iter() {
            if let Ok(mut text_color) = text_color_query.get_mut(child) {
                text_color.0 = Color::srgba(1.0, 1.0, 1.0, alpha);
            }
        }
    }
}
