/*!
Day-night cycle.

A simulated clock advances by a fixed number of hours per rendered frame and wraps at 24. Every
frame the sun's orbit position, its color, the sky color and the sun/ambient/hemisphere
intensities are derived from the clock alone, so the result is a pure function of the hour.

Phases
- `[5, 6)` dawn → sunrise
- `[6, 8)` sunrise → noon
- `[8, 17)` noon
- `[17, 19)` noon → sunset
- `[19, 20)` sunset → dusk
- otherwise night (midnight color, dimmed sun and ambient)

Notes
- The orbit is phased so the sun rises at 06:00, peaks at 12:00 and sets at 18:00.
*/

use std::f32::consts::TAU;

use crate::{
    constants::{SUN_DISTANCE, SUN_ORBIT_LIFT},
    types::Vec3,
};

/// Linear RGB color, components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub const fn from_hex(hex: u32) -> Self {
        Self([
            ((hex >> 16) & 0xff) as f32 / 255.0,
            ((hex >> 8) & 0xff) as f32 / 255.0,
            (hex & 0xff) as f32 / 255.0,
        ])
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let [a, b, c] = self.0;
        let [x, y, z] = other.0;
        Rgb([a + (x - a) * t, b + (y - b) * t, c + (z - c) * t])
    }
}

pub mod sky {
    use super::Rgb;

    pub const MIDNIGHT: Rgb = Rgb::from_hex(0x00001a);
    pub const DAWN: Rgb = Rgb::from_hex(0x8c5b9a);
    pub const SUNRISE: Rgb = Rgb::from_hex(0xff6b6b);
    pub const NOON: Rgb = Rgb::from_hex(0x87ceeb);
    pub const SUNSET: Rgb = Rgb::from_hex(0xff4500);
    pub const DUSK: Rgb = Rgb::from_hex(0x483d8b);
}

const DAY_AMBIENT: f32 = 0.3;
const NIGHT_AMBIENT: f32 = 0.1;
const DAY_SUN: f32 = 1.0;
const NIGHT_SUN: f32 = 0.1;
const HEMISPHERE: f32 = 0.3;

/// Lighting derived for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightingState {
    pub sun_position: Vec3,
    pub sun_color: Rgb,
    pub sky_color: Rgb,
    pub sun_intensity: f32,
    pub ambient_intensity: f32,
    pub hemisphere_intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DayNightCycle {
    hour: f32,
    pub hours_per_frame: f32,
}

impl DayNightCycle {
    pub fn new(start_hour: f32, hours_per_frame: f32) -> Self {
        Self {
            hour: start_hour.rem_euclid(24.0),
            hours_per_frame,
        }
    }

    /// Current time of day in `[0, 24)`.
    #[inline]
    pub fn hour(&self) -> f32 {
        self.hour
    }

    /// Advance one frame and return the lighting for the new time.
    pub fn advance(&mut self) -> LightingState {
        self.hour = (self.hour + self.hours_per_frame).rem_euclid(24.0);
        Self::lighting_at(self.hour)
    }

    /// Sky/sun color and base intensities for an hour.
    fn phase(hour: f32) -> (Rgb, f32, f32) {
        use sky::*;
        let day = |c| (c, DAY_SUN, DAY_AMBIENT);
        match hour {
            h if (5.0..6.0).contains(&h) => day(DAWN.lerp(SUNRISE, h - 5.0)),
            h if (6.0..8.0).contains(&h) => day(SUNRISE.lerp(NOON, (h - 6.0) / 2.0)),
            h if (8.0..17.0).contains(&h) => day(NOON),
            h if (17.0..19.0).contains(&h) => day(NOON.lerp(SUNSET, (h - 17.0) / 2.0)),
            h if (19.0..20.0).contains(&h) => day(SUNSET.lerp(DUSK, h - 19.0)),
            _ => (MIDNIGHT, NIGHT_SUN, NIGHT_AMBIENT),
        }
    }

    pub fn lighting_at(hour: f32) -> LightingState {
        let hour = hour.rem_euclid(24.0);
        let angle = (hour - 6.0) / 24.0 * TAU;
        let sun_position = Vec3::new(
            angle.cos() * SUN_DISTANCE,
            angle.sin() * SUN_DISTANCE + SUN_ORBIT_LIFT,
            (angle * 0.5).sin() * SUN_DISTANCE,
        );

        let (color, sun, ambient) = Self::phase(hour);
        let height = angle.sin().max(0.0);

        LightingState {
            sun_position,
            sun_color: color,
            sky_color: color,
            sun_intensity: sun * height,
            ambient_intensity: ambient * (0.5 + 0.5 * height),
            hemisphere_intensity: HEMISPHERE * height,
        }
    }
}
