//! Conversions between the simulation's nalgebra types and Bevy's glam types.

use bevy::prelude::*;
use viewer_shared::types as sim;

#[inline]
pub fn vec3(v: &sim::Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
pub fn sim_vec2(v: Vec2) -> sim::Vec2 {
    sim::Vec2::new(v.x, v.y)
}

#[inline]
pub fn sim_vec3(v: Vec3) -> sim::Vec3 {
    sim::Vec3::new(v.x, v.y, v.z)
}

#[inline]
pub fn quat(q: &sim::Quat) -> Quat {
    let q = q.quaternion();
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

pub fn sim_quat(q: Quat) -> sim::Quat {
    sim::Quat::from_quaternion(sim::na::Quaternion::new(q.w, q.x, q.y, q.z))
}

pub fn transform_from_iso(iso: &sim::Iso) -> Transform {
    Transform {
        translation: vec3(&iso.translation.vector),
        rotation: quat(&iso.rotation),
        scale: Vec3::ONE,
    }
}

/// Scene-node transform carried into the simulation, scale included.
pub fn sim_transform(t: &Transform) -> sim::Transform {
    sim::Transform {
        translation: sim_vec3(t.translation),
        rotation: sim_quat(t.rotation),
        scale: sim_vec3(t.scale),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotations_survive_the_round_trip() {
        let q = Quat::from_euler(EulerRot::YXZ, 0.7, -0.3, 0.1);
        let back = quat(&sim_quat(q));
        assert!(q.angle_between(back) < 1e-5);
    }

    #[test]
    fn iso_maps_onto_transform() {
        let iso = sim::Iso::new(sim::Vec3::new(1.0, 2.0, 3.0), sim::Vec3::y() * std::f32::consts::FRAC_PI_2);
        let t = transform_from_iso(&iso);
        assert_eq!(t.translation, Vec3::new(1.0, 2.0, 3.0));
        let forward = t.rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::NEG_X).length() < 1e-5);
    }
}
