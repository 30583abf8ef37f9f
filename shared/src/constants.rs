use std::f32::consts::PI;

/// Gravity vector Y component (meters per second squared).
///
/// Applied as `(0, GRAVITY_Y, 0)`; negative is down.
pub const GRAVITY_Y: f32 = -9.82;

/// Fixed internal physics step (seconds).
pub const FIXED_DELTA: f32 = 1.0 / 60.0;

/// Maximum number of internal physics steps taken in one frame while catching up to wall-clock
/// time. Any backlog past this is dropped.
pub const MAX_SUBSTEPS: u32 = 10;

/// Horizontal walk speed of the player (meters per second).
///
/// Roughly a human walking pace.
pub const WALK_SPEED_MPS: f32 = 1.4;

/// Radius of the player's collision sphere (meters).
pub const PLAYER_RADIUS: f32 = 0.5;

/// Mass of the player body (kilograms).
pub const PLAYER_MASS: f32 = 5.0;

/// Linear damping applied to the player body. Limits sliding once horizontal input stops.
pub const PLAYER_LINEAR_DAMPING: f32 = 0.9;

/// Where the player spawns (sphere center, meters).
pub const PLAYER_SPAWN: [f32; 3] = [0.0, 5.0, 10.0];

/// Vertical offset from the player sphere center to the eye (meters).
///
/// With the sphere resting on the ground the eye sits at `PLAYER_RADIUS + EYE_OFFSET` ≈ 1.7m.
pub const EYE_OFFSET: f32 = 1.2;

/// Radians of rotation per pixel of look delta.
pub const LOOK_SENSITIVITY: f32 = 0.002;

/// Pitch clamp, in degrees either side of the horizon.
pub const PITCH_LIMIT_DEG: f32 = 45.0;

/// Pitch clamp used before it was tightened; kept for configs that want the wider range.
pub const WIDE_PITCH_LIMIT_DEG: f32 = 90.0;

/// Joystick displacement (logical pixels) below which no direction registers.
pub const JOYSTICK_DEAD_ZONE_PX: f32 = 20.0;

/// Joystick displacement (logical pixels) that maps to full analog deflection.
pub const JOYSTICK_RADIUS_PX: f32 = 64.0;

/// Scale applied to raw touch movement before it is fed in as look delta.
pub const TOUCH_LOOK_SCALE: f32 = 1.0;

/// Viewports at most this wide (logical pixels) count as mobile-sized.
pub const MOBILE_MAX_WIDTH_PX: f32 = 768.0;

/// Default contact friction when no explicit material pair applies.
pub const DEFAULT_FRICTION: f32 = 0.5;

/// Default contact restitution when no explicit material pair applies.
pub const DEFAULT_RESTITUTION: f32 = 0.1;

/// Hours of simulated day advanced per rendered frame.
pub const DAY_NIGHT_HOURS_PER_FRAME: f32 = 0.01;

/// Time of day the cycle starts at (hours).
pub const DAY_NIGHT_START_HOUR: f32 = 12.0;

/// Distance of the sun light from the scene origin (meters).
pub const SUN_DISTANCE: f32 = 200.0;

/// Vertical lift applied to the sun orbit so it clears the horizon at noon (meters).
pub const SUN_ORBIT_LIFT: f32 = 50.0;

/// Side length of the square ground (meters).
pub const GROUND_SIZE: f32 = 100.0;

/// Courtyard wall height and thickness (meters).
pub const WALL_HEIGHT: f32 = 3.0;
pub const WALL_THICKNESS: f32 = 0.5;

/// Width of the paved path running from the gate to the house (meters).
pub const PATH_WIDTH: f32 = 3.0;

/// Gate post dimensions (meters).
pub const POST_SIZE: f32 = 0.6;
pub const POST_HEIGHT: f32 = 3.5;

/// Gap left in the front wall for the gate (meters).
pub const GATE_WIDTH: f32 = 4.0;

/// Procedural terrain: vertices per side and peak amplitude (meters).
pub const TERRAIN_SEGMENTS: usize = 64;
pub const TERRAIN_AMPLITUDE: f32 = 2.0;

/// Meters of surface covered by one texture tile.
pub const TEXTURE_TILE_METERS: f32 = 4.0;

/// Degrees → radians helper usable in const contexts.
#[inline]
pub const fn deg_to_rad(deg: f32) -> f32 {
    deg * (PI / 180.0)
}
