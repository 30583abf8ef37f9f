use bevy::{
    camera::Exposure,
    core_pipeline::{Skybox, tonemapping::Tonemapping},
    light::EnvironmentMapLight,
    prelude::*,
};
use viewer_shared::{CameraRig, LightingMode};

use crate::{
    config::Settings,
    math::{quat, vec3},
    viewer::{Session, ViewerSystems},
};

/// The first-person camera driven by the session's rig.
#[derive(Component)]
pub struct ViewerCamera;

const ENVIRONMENT_INTENSITY: f32 = 1_500.0;
const SKYBOX_BRIGHTNESS: f32 = 1_000.0;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, add_camera);
    app.add_systems(Update, follow_rig.in_set(ViewerSystems::Present));
}

fn add_camera(mut commands: Commands, asset_server: Res<AssetServer>, settings: Res<Settings>) {
    let mut camera = commands.spawn((
        ViewerCamera,
        Camera3d::default(),
        Projection::from(PerspectiveProjection {
            fov: 75.0_f32.to_radians(),
            near: 0.1,
            far: 1_000.0,
            ..default()
        }),
        Tonemapping::AcesFitted,
        Exposure::default(),
        rig_transform(&CameraRig::new(settings.pitch_limit_rad())),
    ));

    if settings.lighting == LightingMode::Hdr {
        let paths = &settings.assets;
        let specular: Handle<Image> = asset_server.load(paths.environment_specular.clone());
        camera.insert((
            Skybox {
                image: specular.clone(),
                brightness: SKYBOX_BRIGHTNESS,
                rotation: Quat::IDENTITY,
            },
            EnvironmentMapLight {
                diffuse_map: asset_server.load(paths.environment_diffuse.clone()),
                specular_map: specular,
                intensity: ENVIRONMENT_INTENSITY,
                ..default()
            },
        ));
    }
}

fn rig_transform(rig: &CameraRig) -> Transform {
    Transform {
        translation: vec3(&rig.position),
        rotation: quat(&rig.camera_rotation()),
        scale: Vec3::ONE,
    }
}

fn follow_rig(session: Res<Session>, mut camera: Single<&mut Transform, With<ViewerCamera>>) {
    if let Some(rig) = &session.backend().camera {
        **camera = rig_transform(rig);
    }
}
