//! On-screen controls for narrow portrait viewports.
//!
//! The left half of the screen is the movement joystick, the right half drags the view.
//! Both zones stay hidden and inert on desktop-sized windows.

use bevy::{input::touch::Touches, prelude::*, window::PrimaryWindow};
use viewer_shared::{
    constants::{MOBILE_MAX_WIDTH_PX, TOUCH_LOOK_SCALE},
    input::{TouchLook, is_mobile_viewport},
};

use crate::{
    math::sim_vec2,
    viewer::{Session, ViewerSystems},
};

#[derive(Resource, Default, Debug)]
struct TouchControls {
    /// Touch id driving the joystick and where it went down.
    joystick: Option<(u64, Vec2)>,
    look: Option<u64>,
    look_tracker: TouchLook,
}

#[derive(Component)]
struct JoystickZone;

#[derive(Component)]
struct LookZone;

const ZONE_COLOR: Color = Color::srgba(1.0, 1.0, 1.0, 0.08);

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<TouchControls>();
    app.add_systems(Startup, spawn_zones);
    app.add_systems(
        Update,
        (show_zones, drive_touch_controls)
            .chain()
            .in_set(ViewerSystems::Input),
    );
}

fn spawn_zones(mut commands: Commands) {
    let zone = |left: Val| Node {
        position_type: PositionType::Absolute,
        left,
        bottom: Val::Px(0.0),
        width: Val::Percent(50.0),
        height: Val::Percent(40.0),
        ..default()
    };
    commands.spawn((
        JoystickZone,
        zone(Val::Percent(0.0)),
        BackgroundColor(ZONE_COLOR),
        Visibility::Hidden,
    ));
    commands.spawn((
        LookZone,
        zone(Val::Percent(50.0)),
        BackgroundColor(ZONE_COLOR),
        Visibility::Hidden,
    ));
}

fn mobile(window: &Window) -> bool {
    is_mobile_viewport(window.width(), window.height(), MOBILE_MAX_WIDTH_PX)
}

fn show_zones(
    window: Single<&Window, With<PrimaryWindow>>,
    mut zones: Query<&mut Visibility, Or<(With<JoystickZone>, With<LookZone>)>>,
) {
    let shown = if mobile(&window) {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut v in &mut zones {
        v.set_if_neq(shown);
    }
}

fn drive_touch_controls(
    mut session: ResMut<Session>,
    mut controls: ResMut<TouchControls>,
    touches: Res<Touches>,
    window: Single<&Window, With<PrimaryWindow>>,
) {
    if !mobile(&window) {
        if controls.joystick.take().is_some() {
            session.joystick_released();
        }
        controls.look = None;
        controls.look_tracker.end();
        return;
    }

    let split = window.width() * 0.5;
    for touch in touches.iter_just_pressed() {
        let at = touch.position();
        if at.x < split {
            if controls.joystick.is_none() {
                controls.joystick = Some((touch.id(), at));
            }
        } else if controls.look.is_none() {
            controls.look = Some(touch.id());
            controls.look_tracker.begin(sim_vec2(at));
        }
    }

    if let Some((id, origin)) = controls.joystick {
        match touches.get_pressed(id) {
            Some(touch) => session.joystick_moved(sim_vec2(touch.position() - origin)),
            None => {
                controls.joystick = None;
                session.joystick_released();
            }
        }
    }

    if let Some(id) = controls.look {
        match touches.get_pressed(id) {
            Some(touch) => {
                let delta = controls
                    .look_tracker
                    .moved(sim_vec2(touch.position()), TOUCH_LOOK_SCALE);
                session.input_mut().add_touch_delta(delta);
            }
            None => {
                controls.look = None;
                controls.look_tracker.end();
            }
        }
    }
}
