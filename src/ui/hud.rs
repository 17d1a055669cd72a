use bevy::prelude::*;
use crate::minigames::{MinigamePhase, MinigameView};
use crate::shared::*;
use crate::world::{Epilogue, EpilogueScene, MapManager};

// ═══════════════════════════════════════════════════════════════════════
// MARKER COMPONENTS: used to query and update HUD elements
// ═══════════════════════════════════════════════════════════════════════

#[derive(Component)]
pub struct HudRoot;

#[derive(Component)]
pub struct HudCashText;

#[derive(Component)]
pub struct HudInventoryText;

#[derive(Component)]
pub struct HudMapName;

/// Right-hand panel describing the NPC on this map.
#[derive(Component)]
pub struct NpcPanel;

#[derive(Component)]
pub struct NpcPanelText;

/// Centered panel drawn over the map while a minigame is open.
#[derive(Component)]
pub struct MinigameOverlay;

#[derive(Component)]
pub struct MinigameOverlayText;

/// The closing scene: everyone together and a thank-you.
#[derive(Component)]
pub struct EpilogueBanner;

#[derive(Component)]
pub struct EpilogueBannerText;

fn panel_node() -> Node {
    Node {
        padding: UiRect::all(Val::Px(10.0)),
        border: UiRect::all(Val::Px(2.0)),
        flex_direction: FlexDirection::Column,
        ..default()
    }
}

fn label(text: impl Into<String>, size: f32) -> (Text, TextFont, TextColor) {
    (
        Text::new(text),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(Color::WHITE),
    )
}

// ═══════════════════════════════════════════════════════════════════════
// SPAWN / DESPAWN
// ═══════════════════════════════════════════════════════════════════════

pub fn spawn_hud(mut commands: Commands, existing: Query<Entity, With<HudRoot>>) {
    if !existing.is_empty() {
        return;
    }

    commands
        .spawn((
            HudRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::SpaceBetween,
                ..default()
            },
        ))
        .with_children(|parent| {
            // ─── LEFT COLUMN: status ───
            parent
                .spawn((
                    panel_node(),
                    BackgroundColor(Color::srgba(0.05, 0.05, 0.1, 0.8)),
                    BorderColor(Color::srgb(0.4, 0.4, 0.5)),
                ))
                .with_children(|col| {
                    col.spawn((HudMapName, label("", 18.0)));
                    col.spawn((HudCashText, label("Cash: $0", 16.0)));
                    col.spawn(label("Items:", 16.0));
                    col.spawn((HudInventoryText, label("(none)", 14.0)));
                });

            // ─── RIGHT COLUMN: npc ───
            parent
                .spawn((
                    NpcPanel,
                    Node {
                        width: Val::Px(220.0),
                        ..panel_node()
                    },
                    BackgroundColor(Color::srgba(0.1, 0.08, 0.05, 0.8)),
                    BorderColor(Color::srgb(0.6, 0.5, 0.3)),
                    Visibility::Hidden,
                ))
                .with_children(|col| {
                    col.spawn((NpcPanelText, label("", 15.0)));
                });
        });

    commands
        .spawn((
            MinigameOverlay,
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            Visibility::Hidden,
        ))
        .with_children(|parent| {
            parent
                .spawn((
                    Node {
                        width: Val::Px(420.0),
                        ..panel_node()
                    },
                    BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.85)),
                    BorderColor(Color::srgb(0.8, 0.7, 0.3)),
                ))
                .with_children(|panel| {
                    panel.spawn((MinigameOverlayText, label("", 20.0)));
                });
        });
}

pub fn despawn_hud(
    mut commands: Commands,
    roots: Query<Entity, Or<(With<HudRoot>, With<MinigameOverlay>)>>,
) {
    for entity in &roots {
        commands.entity(entity).despawn_recursive();
    }
}

pub fn spawn_epilogue_banner(mut commands: Commands, existing: Query<Entity, With<EpilogueBanner>>) {
    if !existing.is_empty() {
        return;
    }

    commands
        .spawn((
            EpilogueBanner,
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(Color::srgba(0.02, 0.02, 0.05, 0.0)),
            Visibility::Hidden,
        ))
        .with_children(|parent| {
            parent.spawn((EpilogueBannerText, label("Thank You!", 48.0)));
        });
}

// ═══════════════════════════════════════════════════════════════════════
// UPDATE
// ═══════════════════════════════════════════════════════════════════════

pub fn update_status(
    player: Res<PlayerState>,
    inventory: Res<Inventory>,
    manager: Res<MapManager>,
    mut cash_text: Query<&mut Text, (With<HudCashText>, Without<HudInventoryText>, Without<HudMapName>)>,
    mut items_text: Query<&mut Text, (With<HudInventoryText>, Without<HudCashText>, Without<HudMapName>)>,
    mut map_text: Query<&mut Text, (With<HudMapName>, Without<HudCashText>, Without<HudInventoryText>)>,
) {
    if let Ok(mut text) = cash_text.get_single_mut() {
        text.0 = format!("Cash: ${}", player.cash);
    }
    if let Ok(mut text) = items_text.get_single_mut() {
        text.0 = if inventory.items.is_empty() {
            "(none)".to_string()
        } else {
            inventory.items.join("\n")
        };
    }
    if let Ok(mut text) = map_text.get_single_mut() {
        text.0 = manager
            .current_id()
            .map_or_else(String::new, |id| id.to_string());
    }
}

/// Show the NPC's description while talking to it, or its hint after a trade.
pub fn update_npc_panel(
    manager: Res<MapManager>,
    mut panel: Query<&mut Visibility, With<NpcPanel>>,
    mut text: Query<&mut Text, With<NpcPanelText>>,
) {
    let view = manager
        .current()
        .and_then(|map| map.npc())
        .map(|npc| npc.view());

    let content = view.and_then(|view| match (view.interacting, view.hint) {
        (_, Some(hint)) => Some(format!("{}\n\n{}", view.name, hint)),
        (true, None) => Some(format!("{}\n\n{}", view.name, view.description)),
        (false, None) => None,
    });

    if let Ok(mut visibility) = panel.get_single_mut() {
        *visibility = if content.is_some() {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
    if let (Some(content), Ok(mut text)) = (content, text.get_single_mut()) {
        text.0 = content;
    }
}

fn minigame_text(view: &MinigameView) -> String {
    match view.phase {
        MinigamePhase::Menu => format!("{}\n\n[E] Start    [Esc] Leave", view.title),
        MinigamePhase::Playing => format!("{}\n\nScore: {}\n\n[E] Score    [Esc] Finish", view.title, view.score),
        MinigamePhase::Over => format!("{}\n\nFinal score: {}\n\n[E] Continue", view.title, view.score),
    }
}

pub fn update_minigame_overlay(
    manager: Res<MapManager>,
    mut overlay: Query<&mut Visibility, With<MinigameOverlay>>,
    mut text: Query<&mut Text, With<MinigameOverlayText>>,
) {
    let view = manager.current().and_then(|map| map.view().minigame);

    if let Ok(mut visibility) = overlay.get_single_mut() {
        *visibility = if view.is_some() {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
    if let (Some(view), Ok(mut text)) = (view, text.get_single_mut()) {
        text.0 = minigame_text(&view);
    }
}

/// Fade the closing card in over the first half of the closing scene.
pub fn update_epilogue_banner(
    epilogue: Res<Epilogue>,
    mut banner: Query<(&mut Visibility, &mut BackgroundColor), With<EpilogueBanner>>,
    mut text: Query<&mut TextColor, With<EpilogueBannerText>>,
) {
    let Ok((mut visibility, mut background)) = banner.get_single_mut() else {
        return;
    };
    if epilogue.scene != EpilogueScene::Together {
        *visibility = Visibility::Hidden;
        return;
    }

    let alpha = (epilogue.progress * 2.0).min(1.0);
    *visibility = Visibility::Inherited;
    background.0 = Color::srgba(0.02, 0.02, 0.05, 0.9 * alpha);
    if let Ok(mut color) = text.get_single_mut() {
        color.0 = Color::srgba(1.0, 1.0, 1.0, alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minigame_text_shows_score_while_playing() {
        let view = MinigameView {
            title: "Cafe Orders",
            phase: MinigamePhase::Playing,
            score: 4,
        };
        assert!(minigame_text(&view).contains("Score: 4"));
    }
}
