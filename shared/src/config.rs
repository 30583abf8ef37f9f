//! Viewer configuration.
//!
//! The viewer evolved through several variants (flat ground vs. procedural terrain vs. walled
//! courtyard; day-night vs. HDR lighting; box vs. trimesh colliders). They are all one viewer
//! with a versioned configuration; [`ViewerConfig::default`] is the walled courtyard with HDR
//! lighting, trimesh colliders and collider debug meshes.
//!
//! Configs are stored as RON. Every field has a default, so a config file only needs the
//! fields it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        DAY_NIGHT_HOURS_PER_FRAME, DAY_NIGHT_START_HOUR, EYE_OFFSET, FIXED_DELTA,
        JOYSTICK_DEAD_ZONE_PX, JOYSTICK_RADIUS_PX, LOOK_SENSITIVITY, MAX_SUBSTEPS,
        PITCH_LIMIT_DEG, WALK_SPEED_MPS, deg_to_rad,
    },
    error::ConfigError,
};

/// Static ground geometry built at world initialization.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum GroundLayout {
    /// A single infinite ground plane.
    Flat,
    /// A heightfield of gentle hills with seeded random variation.
    Terrain { seed: u64 },
    /// Ground plane enclosed by four walls, a paved path and gate posts.
    Courtyard,
}

/// How the scene is lit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum LightingMode {
    /// Sun orbit + ambient light driven by a simulated clock.
    DayNight,
    /// Static equirectangular HDR environment map (background + ambient).
    Hdr,
}

/// How loaded model meshes are turned into colliders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColliderStrategy {
    /// One box per mesh, sized to the mesh's local bounding box.
    BoundingBox,
    /// One triangle-mesh collider per mesh, built from its vertex/index buffers.
    TriMesh,
}

/// Representation used for the on-screen movement joystick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoystickMode {
    /// Four cardinal flags, like the keyboard path.
    Discrete,
    /// Continuous 2D vector derived from the stick displacement.
    Analog,
}

/// Relative paths of the external assets the viewer consumes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    /// JSON array of model identifiers.
    pub model_list: String,
    /// Directory the identifiers are resolved against.
    pub models_dir: String,
    /// Pre-filtered diffuse half of the HDR environment map (KTX2 cubemap).
    pub environment_diffuse: String,
    /// Pre-filtered specular half of the HDR environment map, also drawn as the skybox.
    pub environment_specular: String,
    pub ground_texture: String,
    pub wall_texture: String,
    pub path_texture: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            model_list: "models/houses/index.json".into(),
            models_dir: "models/houses".into(),
            environment_diffuse: "textures/environment_diffuse.ktx2".into(),
            environment_specular: "textures/environment_specular.ktx2".into(),
            ground_texture: "textures/grass.jpg".into(),
            wall_texture: "textures/brick.jpg".into(),
            path_texture: "textures/cobblestone.jpg".into(),
        }
    }
}

/// Which meshes of a loaded model produce colliders.
///
/// An explicit per-mesh `collidable` tag (authored into the asset) always wins. The name
/// markers are only consulted for untagged meshes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionFilter {
    /// Case-insensitive substrings marking a mesh as decorative / passable.
    pub passable_markers: Vec<String>,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            passable_markers: ["interior", "furniture", "window", "door"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Complete viewer configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub assets: AssetPaths,
    pub ground: GroundLayout,
    pub lighting: LightingMode,
    pub colliders: ColliderStrategy,
    pub collision_filter: CollisionFilter,
    /// Whether collider debug meshes start visible.
    pub debug_colliders: bool,

    pub walk_speed: f32,
    pub eye_offset: f32,
    pub look_sensitivity: f32,
    pub pitch_limit_deg: f32,

    pub fixed_delta: f32,
    pub max_substeps: u32,

    pub joystick: JoystickMode,
    pub joystick_dead_zone: f32,
    pub joystick_radius: f32,

    pub day_start_hour: f32,
    pub day_hours_per_frame: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            assets: AssetPaths::default(),
            ground: GroundLayout::Courtyard,
            lighting: LightingMode::Hdr,
            colliders: ColliderStrategy::TriMesh,
            collision_filter: CollisionFilter::default(),
            debug_colliders: true,
            walk_speed: WALK_SPEED_MPS,
            eye_offset: EYE_OFFSET,
            look_sensitivity: LOOK_SENSITIVITY,
            pitch_limit_deg: PITCH_LIMIT_DEG,
            fixed_delta: FIXED_DELTA,
            max_substeps: MAX_SUBSTEPS,
            joystick: JoystickMode::Discrete,
            joystick_dead_zone: JOYSTICK_DEAD_ZONE_PX,
            joystick_radius: JOYSTICK_RADIUS_PX,
            day_start_hour: DAY_NIGHT_START_HOUR,
            day_hours_per_frame: DAY_NIGHT_HOURS_PER_FRAME,
        }
    }
}

impl ViewerConfig {
    /// Parse a config from RON text. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str::<Self>(text)?.sanitized())
    }

    /// Read and parse a RON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Pitch clamp in radians.
    #[inline]
    pub fn pitch_limit_rad(&self) -> f32 {
        deg_to_rad(self.pitch_limit_deg)
    }

    /// Clamp values that would break the simulation back into a usable range.
    fn sanitized(mut self) -> Self {
        if !(self.fixed_delta.is_finite() && self.fixed_delta > 0.0) {
            log::warn!(
                "fixed_delta {} is not a positive number; using {FIXED_DELTA}",
                self.fixed_delta
            );
            self.fixed_delta = FIXED_DELTA;
        }
        self.max_substeps = self.max_substeps.max(1);
        if !self.pitch_limit_deg.is_finite() {
            log::warn!(
                "pitch_limit_deg {} is not a number; using {PITCH_LIMIT_DEG}",
                self.pitch_limit_deg
            );
            self.pitch_limit_deg = PITCH_LIMIT_DEG;
        }
        self.pitch_limit_deg = self.pitch_limit_deg.clamp(0.0, 90.0);
        self.walk_speed = self.walk_speed.max(0.0);
        self.joystick_dead_zone = self.joystick_dead_zone.max(0.0);
        self.joystick_radius = self.joystick_radius.max(self.joystick_dead_zone + 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = ViewerConfig::from_ron_str("()").unwrap();
        assert_eq!(cfg, ViewerConfig::default());
    }

    #[test]
    fn defaults_survive_ron_round_trip() {
        let text = ViewerConfig::default().to_ron_string().unwrap();
        let back = ViewerConfig::from_ron_str(&text).unwrap();
        assert_eq!(back, ViewerConfig::default());
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let cfg = ViewerConfig::from_ron_str(
            "(ground: Terrain(seed: 7), lighting: DayNight, colliders: BoundingBox, pitch_limit_deg: 90.0)",
        )
        .unwrap();

        assert_eq!(cfg.ground, GroundLayout::Terrain { seed: 7 });
        assert_eq!(cfg.lighting, LightingMode::DayNight);
        assert_eq!(cfg.colliders, ColliderStrategy::BoundingBox);
        assert_eq!(cfg.pitch_limit_deg, 90.0);
        assert_eq!(cfg.walk_speed, WALK_SPEED_MPS);
    }

    #[test]
    fn nonsense_values_are_sanitized() {
        let cfg = ViewerConfig::from_ron_str(
            "(fixed_delta: -1.0, max_substeps: 0, pitch_limit_deg: 400.0)",
        )
        .unwrap();

        assert_eq!(cfg.fixed_delta, FIXED_DELTA);
        assert_eq!(cfg.max_substeps, 1);
        assert_eq!(cfg.pitch_limit_deg, 90.0);
    }

    #[test]
    fn non_finite_pitch_limit_falls_back_to_default() {
        let cfg = ViewerConfig::from_ron_str("(pitch_limit_deg: NaN)").unwrap();
        assert_eq!(cfg.pitch_limit_deg, PITCH_LIMIT_DEG);

        let cfg = ViewerConfig {
            pitch_limit_deg: f32::INFINITY,
            ..ViewerConfig::default()
        }
        .sanitized();
        assert_eq!(cfg.pitch_limit_deg, PITCH_LIMIT_DEG);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(matches!(
            ViewerConfig::from_ron_str("(ground: Moon)"),
            Err(ConfigError::Parse(_))
        ));
    }
}
