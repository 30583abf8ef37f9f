/*!
Math aliases shared by every module in this crate.

nalgebra is reached through `rapier3d::na` so the vector/quaternion types handed to Rapier are
always the exact version Rapier was built against.
*/

pub use rapier3d::na;

/// Common math aliases for clarity and consistency.
pub type Vec2 = na::Vector2<f32>;
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;
pub type Point3 = na::Point3<f32>;

/// A rigid transform (isometry) with an extra non-uniform scale, as carried by scene nodes.
///
/// Physics never sees the scale directly: it is baked into vertex positions / half-extents
/// when colliders are derived from meshes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    #[inline]
    pub fn identity() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::repeat(1.0),
        }
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    #[inline]
    pub fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            scale: Vec3::repeat(1.0),
        }
    }

    /// Compose `self` (parent) with `child`, yielding the child's transform in the parent's frame.
    ///
    /// Matches the usual TRS hierarchy: `world = parent.T * parent.R * parent.S * child`.
    /// Non-uniform parent scale combined with a rotated child is approximated (no shear).
    #[inline]
    pub fn mul_transform(&self, child: &Transform) -> Transform {
        Transform {
            translation: self.transform_point(&child.translation),
            rotation: self.rotation * child.rotation,
            scale: self.scale.component_mul(&child.scale),
        }
    }

    /// Apply scale, rotation and translation (in that order) to a point.
    #[inline]
    pub fn transform_point(&self, p: &Vec3) -> Vec3 {
        self.rotation * p.component_mul(&self.scale) + self.translation
    }

    /// Rigid part of the transform (scale dropped).
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(na::Translation3::from(self.translation), self.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_composition_is_neutral() {
        let t = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Transform::identity().mul_transform(&t), t);
        assert_eq!(t.mul_transform(&Transform::identity()), t);
    }

    #[test]
    fn child_offset_is_rotated_and_scaled_by_parent() {
        let parent = Transform {
            translation: Vec3::new(10.0, 0.0, 0.0),
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_2),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        let child = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let world = parent.mul_transform(&child);

        // +X rotated 90° about +Y lands on -Z; scaled by 2.
        assert!((world.translation - Vec3::new(10.0, 0.0, -2.0)).norm() < 1.0e-5);
        assert!((world.scale - Vec3::new(2.0, 2.0, 2.0)).norm() < 1.0e-6);
    }
}
