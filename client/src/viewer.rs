//! Hosts the [`ViewerSession`] inside the Bevy app and drives it once per `Update`.

use bevy::{
    app::AppExit,
    prelude::*,
    window::{PrimaryWindow, WindowResized},
};
use leafwing_input_manager::prelude::*;
use viewer_shared::{FrameOutcome, FrameSkip, ViewerSession};

use crate::{config::Settings, input::ViewerAction, world::BevyBackend};

/// The one viewer session of this app.
#[derive(Resource, Deref, DerefMut)]
pub struct Session(pub ViewerSession<BevyBackend>);

/// Ask for a catalog entry to be loaded (digit keys, overlay buttons).
#[derive(Message, Clone, Copy, Debug)]
pub struct SelectModel(pub usize);

/// Ordering inside `Update`: gather input, run the session frame, then push its output to
/// entities.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerSystems {
    Input,
    Frame,
    Present,
}

pub(super) fn plugin(app: &mut App) {
    let config = app.world().resource::<Settings>().0.clone();
    app.insert_resource(Session(ViewerSession::new(config, BevyBackend::default())));
    app.add_message::<SelectModel>();

    app.configure_sets(
        Update,
        (
            ViewerSystems::Input,
            ViewerSystems::Frame,
            ViewerSystems::Present,
        )
            .chain(),
    );

    app.add_systems(Startup, start_session);
    app.add_systems(
        Update,
        (keyboard_moves, keyboard_commands, forward_resize).in_set(ViewerSystems::Input),
    );
    app.add_systems(Update, run_frame.in_set(ViewerSystems::Frame));
    app.add_systems(Last, dispose_on_exit);
}

fn start_session(mut session: ResMut<Session>, window: Single<&Window, With<PrimaryWindow>>) {
    if let Err(err) = session.start() {
        error!("viewer session did not start: {err}");
        return;
    }
    session.resize(window.width(), window.height());
}

/// Movement keys only report edges so that the touch joystick can own the same flags.
fn keyboard_moves(mut session: ResMut<Session>, actions: Res<ActionState<ViewerAction>>) {
    for (action, flag) in ViewerAction::MOVES {
        if actions.just_pressed(&action) {
            session.input_mut().set_move(flag, true);
        }
        if actions.just_released(&action) {
            session.input_mut().set_move(flag, false);
        }
    }
}

fn keyboard_commands(
    mut session: ResMut<Session>,
    actions: Res<ActionState<ViewerAction>>,
    mut select: MessageWriter<SelectModel>,
) {
    if actions.just_pressed(&ViewerAction::ToggleDebug) {
        session.toggle_debug();
        info!("collider debug meshes visible: {}", session.debug_visible());
    }

    for slot in 0..9u8 {
        if actions.just_pressed(&ViewerAction::Select(slot)) {
            let index = usize::from(slot);
            if index < session.catalog().len() {
                select.write(SelectModel(index));
            }
        }
    }
}

fn forward_resize(mut session: ResMut<Session>, mut resized: MessageReader<WindowResized>) {
    if let Some(last) = resized.read().last() {
        session.resize(last.width, last.height);
    }
}

fn run_frame(mut session: ResMut<Session>, time: Res<Time>) {
    match session.frame(time.elapsed_secs()) {
        FrameOutcome::Rendered { .. } => {}
        FrameOutcome::Skipped(FrameSkip::NotRunning) => {}
        FrameOutcome::Skipped(FrameSkip::Render(err)) => trace!("frame skipped: {err}"),
    }
}

fn dispose_on_exit(mut session: ResMut<Session>, mut exit: MessageReader<AppExit>) {
    if exit.read().next().is_some() {
        session.dispose();
    }
}
