//! Two-node first-person camera rig.
//!
//! The yaw node sits at the player's eye and only rotates about +Y. The pitch node is its
//! child and only rotates about its local +X. The render camera hangs off the pitch node, so
//! horizontal look never introduces roll and pitch never leaks into movement direction.

use std::f32::consts::TAU;

use crate::{
    constants::{PITCH_LIMIT_DEG, deg_to_rad},
    types::{Quat, Vec2, Vec3},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    /// Yaw node position (player center + eye offset).
    pub position: Vec3,
    /// Radians about +Y, wrapped to `[0, 2π)`.
    yaw: f32,
    /// Radians about the yaw node's +X, clamped to `±pitch_limit`.
    pitch: f32,
    pitch_limit: f32,
}

impl CameraRig {
    /// A non-finite `pitch_limit` falls back to the default limit.
    pub fn new(pitch_limit: f32) -> Self {
        let pitch_limit = if pitch_limit.is_finite() {
            pitch_limit.abs()
        } else {
            deg_to_rad(PITCH_LIMIT_DEG)
        };
        Self {
            position: Vec3::zeros(),
            yaw: 0.0,
            pitch: 0.0,
            pitch_limit,
        }
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[inline]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    #[inline]
    pub fn pitch_limit(&self) -> f32 {
        self.pitch_limit
    }

    /// Apply a look delta (pixels) scaled by `sensitivity` (radians per pixel).
    ///
    /// Moving right turns right; moving down looks down.
    pub fn apply_look(&mut self, delta: Vec2, sensitivity: f32) {
        self.set_yaw(self.yaw - delta.x * sensitivity);
        self.set_pitch(self.pitch - delta.y * sensitivity);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        if yaw.is_finite() {
            self.yaw = yaw.rem_euclid(TAU);
        }
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        if pitch.is_finite() {
            self.pitch = pitch.clamp(-self.pitch_limit, self.pitch_limit);
        }
    }

    /// Place the yaw node at the player's eye.
    #[inline]
    pub fn follow(&mut self, player_center: Vec3, eye_offset: f32) {
        self.position = player_center + Vec3::new(0.0, eye_offset, 0.0);
    }

    /// Local rotation of the yaw node.
    #[inline]
    pub fn yaw_rotation(&self) -> Quat {
        Quat::from_axis_angle(&Vec3::y_axis(), self.yaw)
    }

    /// Local rotation of the pitch node relative to the yaw node.
    #[inline]
    pub fn pitch_rotation(&self) -> Quat {
        Quat::from_axis_angle(&Vec3::x_axis(), self.pitch)
    }

    /// World rotation of the camera (yaw then pitch).
    #[inline]
    pub fn camera_rotation(&self) -> Quat {
        self.yaw_rotation() * self.pitch_rotation()
    }

    /// Direction the camera looks along (-Z of the camera).
    #[inline]
    pub fn look_direction(&self) -> Vec3 {
        self.camera_rotation() * Vec3::new(0.0, 0.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::LOOK_SENSITIVITY;

    fn rig() -> CameraRig {
        CameraRig::new(deg_to_rad(PITCH_LIMIT_DEG))
    }

    #[test]
    fn pitch_is_clamped_both_ways() {
        let mut rig = rig();
        rig.apply_look(Vec2::new(0.0, -100_000.0), LOOK_SENSITIVITY);
        assert!((rig.pitch() - rig.pitch_limit()).abs() < 1.0e-6);
        rig.apply_look(Vec2::new(0.0, 100_000.0), LOOK_SENSITIVITY);
        assert!((rig.pitch() + rig.pitch_limit()).abs() < 1.0e-6);
    }

    #[test]
    fn non_finite_pitch_limit_uses_default() {
        let mut rig = CameraRig::new(f32::NAN);
        assert_eq!(rig.pitch_limit(), deg_to_rad(PITCH_LIMIT_DEG));
        rig.apply_look(Vec2::new(1.0, 1.0), LOOK_SENSITIVITY);
        assert!(rig.pitch().is_finite());
    }

    #[test]
    fn yaw_wraps_and_is_never_clamped() {
        let mut rig = rig();
        // 1.5 full turns to the left.
        let pixels = 1.5 * TAU / LOOK_SENSITIVITY;
        rig.apply_look(Vec2::new(-pixels, 0.0), LOOK_SENSITIVITY);
        assert!(rig.yaw() >= 0.0 && rig.yaw() < TAU);
        assert!((rig.yaw() - TAU * 0.5).abs() < 1.0e-3);

        rig.apply_look(Vec2::new(pixels, 0.0), LOOK_SENSITIVITY);
        let wrapped = rig.yaw().min(TAU - rig.yaw());
        assert!(wrapped < 1.0e-3);
    }

    #[test]
    fn moving_mouse_right_turns_right() {
        let mut rig = rig();
        rig.apply_look(Vec2::new(100.0, 0.0), LOOK_SENSITIVITY);
        // Facing -Z, a right turn swings the view toward +X.
        assert!(rig.look_direction().x > 0.0);
    }

    #[test]
    fn pitch_does_not_tilt_yaw_node() {
        let mut rig = rig();
        rig.apply_look(Vec2::new(0.0, -200.0), LOOK_SENSITIVITY);
        let yaw_forward = rig.yaw_rotation() * Vec3::new(0.0, 0.0, -1.0);
        assert!(yaw_forward.y.abs() < 1.0e-6);
        assert!(rig.look_direction().y > 0.0);
    }

    #[test]
    fn follow_places_node_at_eye() {
        let mut rig = rig();
        rig.follow(Vec3::new(1.0, 0.5, 2.0), 1.2);
        assert!((rig.position - Vec3::new(1.0, 1.7, 2.0)).norm() < 1.0e-6);
    }
}
