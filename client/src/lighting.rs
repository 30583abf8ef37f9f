//! Sun and ambient light. In day-night mode they follow the session's lighting state every
//! frame; in HDR mode the environment map does most of the work and the sun stays put.

use bevy::{light::light_consts::lux, prelude::*};
use viewer_shared::{LightingMode, LightingState, Rgb};

use crate::{
    config::Settings,
    math::vec3,
    viewer::{Session, ViewerSystems},
};

#[derive(Component)]
pub struct Sun;

/// Illuminance of the sun at intensity 1.
const SUN_LUX: f32 = lux::AMBIENT_DAYLIGHT;
/// Ambient brightness at intensity 1 (ambient plus hemisphere fill).
const AMBIENT_BRIGHTNESS: f32 = 400.0;

const HDR_SUN_POSITION: Vec3 = Vec3::new(50.0, 100.0, 50.0);

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, add_lights);

    let day_night = app.world().resource::<Settings>().lighting == LightingMode::DayNight;
    if day_night {
        app.add_systems(Update, follow_lighting.in_set(ViewerSystems::Present));
    }
}

fn add_lights(mut commands: Commands, settings: Res<Settings>) {
    let (position, illuminance) = match settings.lighting {
        LightingMode::DayNight => (Vec3::new(0.0, 200.0, 0.0), SUN_LUX),
        LightingMode::Hdr => (HDR_SUN_POSITION, SUN_LUX * 0.5),
    };
    commands.spawn((
        Sun,
        DirectionalLight {
            illuminance,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_translation(position).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: AMBIENT_BRIGHTNESS * 0.5,
        affects_lightmapped_meshes: true,
    });
}

fn color(rgb: Rgb) -> Color {
    let [r, g, b] = rgb.0;
    Color::srgb(r, g, b)
}

fn follow_lighting(
    session: Res<Session>,
    mut sun: Single<(&mut DirectionalLight, &mut Transform), With<Sun>>,
    mut ambient: ResMut<AmbientLight>,
    mut clear: ResMut<ClearColor>,
) {
    let Some(LightingState {
        sun_position,
        sun_color,
        sky_color,
        sun_intensity,
        ambient_intensity,
        hemisphere_intensity,
    }) = session.backend().lighting
    else {
        return;
    };

    let (light, transform) = &mut *sun;
    light.color = color(sun_color);
    light.illuminance = SUN_LUX * sun_intensity;
    **transform = Transform::from_translation(vec3(&sun_position)).looking_at(Vec3::ZERO, Vec3::Y);

    ambient.color = color(sky_color);
    ambient.brightness = AMBIENT_BRIGHTNESS * (ambient_intensity + hemisphere_intensity);
    clear.0 = color(sky_color);
}
