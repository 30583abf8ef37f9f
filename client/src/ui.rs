//! Model selection buttons and the loading indicator.

use bevy::prelude::*;
use viewer_shared::loader::display_name;

use crate::viewer::{SelectModel, Session, ViewerSystems};

const BUTTON_IDLE: Color = Color::srgba(0.1, 0.1, 0.1, 0.7);
const BUTTON_HOVERED: Color = Color::srgba(0.25, 0.25, 0.25, 0.8);
const BUTTON_ACTIVE: Color = Color::srgba(0.2, 0.45, 0.9, 0.9);
const OVERLAY: Color = Color::srgba(0.0, 0.0, 0.0, 0.6);

#[derive(Component)]
struct ModelButtonList;

#[derive(Component, Clone, Copy)]
struct ModelButton(usize);

#[derive(Component)]
struct LoadingOverlay;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_overlay);
    app.add_systems(Update, click_model_buttons.in_set(ViewerSystems::Input));
    app.add_systems(
        Update,
        (rebuild_model_buttons, style_model_buttons, show_loading)
            .chain()
            .in_set(ViewerSystems::Present),
    );
}

fn spawn_overlay(mut commands: Commands) {
    commands.spawn((
        ModelButtonList,
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(6.0),
            ..default()
        },
    ));

    commands
        .spawn((
            LoadingOverlay,
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(OVERLAY),
            GlobalZIndex(10),
            Visibility::Hidden,
        ))
        .with_children(|overlay| {
            overlay.spawn((
                Text::new("Loading..."),
                TextFont {
                    font_size: 32.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}

/// One button per catalog entry, rebuilt whenever the catalog changes.
fn rebuild_model_buttons(
    mut commands: Commands,
    session: Res<Session>,
    list: Single<Entity, With<ModelButtonList>>,
    mut shown: Local<Vec<String>>,
) {
    let ids = session.catalog().ids();
    if shown.as_slice() == ids {
        return;
    }
    *shown = ids.to_vec();

    commands
        .entity(*list)
        .despawn_related::<Children>()
        .with_children(|list| {
            for (index, id) in ids.iter().enumerate() {
                list.spawn((
                    ModelButton(index),
                    Button,
                    Node {
                        padding: UiRect::axes(Val::Px(12.0), Val::Px(6.0)),
                        ..default()
                    },
                    BackgroundColor(BUTTON_IDLE),
                ))
                .with_child((
                    Text::new(format!("{} {}", index + 1, display_name(id))),
                    TextFont {
                        font_size: 16.0,
                        ..default()
                    },
                    TextColor(Color::WHITE),
                ));
            }
        });
}

fn click_model_buttons(
    buttons: Query<(&Interaction, &ModelButton), Changed<Interaction>>,
    mut select: MessageWriter<SelectModel>,
) {
    for (interaction, button) in &buttons {
        if *interaction == Interaction::Pressed {
            select.write(SelectModel(button.0));
        }
    }
}

fn style_model_buttons(
    session: Res<Session>,
    mut buttons: Query<(&Interaction, &ModelButton, &mut BackgroundColor)>,
) {
    let active = session.active_model();
    for (interaction, button, mut background) in &mut buttons {
        let color = if active == Some(button.0) {
            BUTTON_ACTIVE
        } else if *interaction == Interaction::Hovered {
            BUTTON_HOVERED
        } else {
            BUTTON_IDLE
        };
        background.set_if_neq(BackgroundColor(color));
    }
}

fn show_loading(session: Res<Session>, mut overlay: Single<&mut Visibility, With<LoadingOverlay>>) {
    let shown = if session.backend().loading {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    overlay.set_if_neq(shown);
}
