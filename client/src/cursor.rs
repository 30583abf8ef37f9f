//! Pointer capture for mouse look.
//!
//! A click on the viewport asks the window to lock and hide the cursor; Escape or losing focus
//! releases it. The session's input state only accepts mouse deltas while captured.
//!
//! The grab is confirmed at the start of the next frame, after the window backend has applied
//! it. When the platform refuses, the backend puts the previous grab mode back, and the request
//! is reported as a capture failure.

use bevy::{
    input::mouse::AccumulatedMouseMotion,
    prelude::*,
    window::{CursorGrabMode, CursorOptions, PrimaryWindow, WindowFocused},
};
use leafwing_input_manager::prelude::*;
use viewer_shared::LookCapture;

use crate::{
    input::ViewerAction,
    math::sim_vec2,
    viewer::{Session, ViewerSystems},
};

/// Set while a grab has been asked of the window but not yet confirmed.
#[derive(Resource, Default)]
struct CaptureRequest(bool);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CaptureEvent {
    Granted,
    Refused,
    Released,
}

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<CaptureRequest>();
    app.add_systems(First, confirm_capture);
    app.add_systems(
        Update,
        (request_capture, release_capture, release_on_blur, mouse_look)
            .chain()
            .in_set(ViewerSystems::Input),
    );
}

fn set_captured(cursor: &mut CursorOptions, captured: bool) {
    if captured {
        cursor.grab_mode = CursorGrabMode::Locked;
        cursor.visible = false;
    } else {
        cursor.grab_mode = CursorGrabMode::None;
        cursor.visible = true;
    }
}

fn request_capture(
    mut session: ResMut<Session>,
    mut request: ResMut<CaptureRequest>,
    actions: Res<ActionState<ViewerAction>>,
    window: Option<Single<&mut CursorOptions, With<PrimaryWindow>>>,
    buttons: Query<&Interaction, With<Button>>,
) {
    if !actions.just_pressed(&ViewerAction::Capture)
        || session.input().capture() == LookCapture::Captured
    {
        return;
    }
    // Clicks on the overlay are not viewport clicks.
    if buttons.iter().any(|i| *i != Interaction::None) {
        return;
    }
    match window {
        Some(mut cursor) => {
            set_captured(&mut cursor, true);
            request.0 = true;
        }
        None => session.input_mut().capture_failed("no primary window"),
    }
}

fn release_capture(
    mut session: ResMut<Session>,
    mut request: ResMut<CaptureRequest>,
    actions: Res<ActionState<ViewerAction>>,
    mut cursor: Single<&mut CursorOptions, With<PrimaryWindow>>,
) {
    if actions.just_pressed(&ViewerAction::Release) {
        set_captured(&mut cursor, false);
        request.0 = false;
        session.input_mut().capture_lost();
    }
}

fn release_on_blur(
    mut session: ResMut<Session>,
    mut request: ResMut<CaptureRequest>,
    mut messages: MessageReader<WindowFocused>,
    mut cursor: Single<&mut CursorOptions, With<PrimaryWindow>>,
) {
    for message in messages.read() {
        if !message.focused {
            set_captured(&mut cursor, false);
            request.0 = false;
            session.input_mut().capture_lost();
        }
    }
}

fn capture_event(
    grab: CursorGrabMode,
    requested: bool,
    current: LookCapture,
) -> Option<CaptureEvent> {
    match (grab, requested, current) {
        (CursorGrabMode::Locked, true, _) => Some(CaptureEvent::Granted),
        (_, true, _) => Some(CaptureEvent::Refused),
        (CursorGrabMode::None, false, LookCapture::Captured) => Some(CaptureEvent::Released),
        _ => None,
    }
}

/// Mirror the grab the window holds into the session.
fn confirm_capture(
    mut session: ResMut<Session>,
    mut request: ResMut<CaptureRequest>,
    cursor: Single<Ref<CursorOptions>, With<PrimaryWindow>>,
) {
    if !request.0 && !cursor.is_changed() {
        return;
    }
    let requested = std::mem::take(&mut request.0);
    match capture_event(cursor.grab_mode, requested, session.input().capture()) {
        Some(CaptureEvent::Granted) => session.input_mut().capture_granted(),
        Some(CaptureEvent::Refused) => session
            .input_mut()
            .capture_failed("the window refused the pointer grab"),
        Some(CaptureEvent::Released) => session.input_mut().capture_lost(),
        None => {}
    }
}

fn mouse_look(mut session: ResMut<Session>, motion: Res<AccumulatedMouseMotion>) {
    if motion.delta != Vec2::ZERO {
        session.input_mut().add_mouse_delta(sim_vec2(motion.delta));
    }
}
