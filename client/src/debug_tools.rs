//! Performance overlay for native dev builds, shown together with the collider debug meshes.

use bevy::diagnostic::{
    EntityCountDiagnosticsPlugin, FrameTimeDiagnosticsPlugin, SystemInformationDiagnosticsPlugin,
};
use bevy::prelude::*;
use bevy::render::diagnostic::RenderDiagnosticsPlugin;
use iyes_perf_ui::prelude::*;

use crate::viewer::{Session, ViewerSystems};

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        EntityCountDiagnosticsPlugin::default(),
        SystemInformationDiagnosticsPlugin::default(),
        RenderDiagnosticsPlugin,
        PerfUiPlugin,
    ));

    app.add_systems(Startup, spawn_perf_ui);
    app.add_systems(Update, follow_debug_toggle.in_set(ViewerSystems::Present));
}

fn spawn_perf_ui(mut commands: Commands) {
    commands.spawn(PerfUiAllEntries::default());
}

fn follow_debug_toggle(
    session: Res<Session>,
    mut perf_ui: Query<&mut Visibility, With<PerfUiRoot>>,
) {
    let shown = if session.debug_visible() {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut v in &mut perf_ui {
        v.set_if_neq(shown);
    }
}
