//! Rigid-body simulation for the viewer.
//!
//! Design
//! - One Rapier pipeline holding every static collider (ground, walls, path, posts, model
//!   colliders) plus exactly one dynamic player sphere.
//! - Stepping is fixed-size. [`PhysicsWorld::step`] turns a wall-clock frame duration into at
//!   most `max_substeps` internal steps through a [`FixedTimestep`].
//! - The player is velocity-driven: every frame the horizontal velocity is overwritten from the
//!   movement intent, the vertical velocity is left to gravity and contacts.
//!
//! Notes
//! - Per-pair friction/restitution is applied by [`SurfaceContactHooks`] during the step.
//! - Removing a body also removes its colliders; the narrow phase drops their contact pairs on
//!   the next step.

use rapier3d::prelude::*;

use crate::{
    constants::{GRAVITY_Y, PLAYER_LINEAR_DAMPING, PLAYER_MASS, PLAYER_RADIUS},
    error::GeometryError,
    materials::{ContactMaterialTable, SurfaceContactHooks, SurfaceMaterial},
    rapier::{ColliderShapeDef, StaticColliderDef, collider_from_def},
    timestep::FixedTimestep,
    types::{Iso, Quat, Vec2, Vec3, na},
};

/// Handle of a body in the [`PhysicsWorld`].
pub type BodyHandle = RigidBodyHandle;

pub struct PhysicsWorld {
    gravity: Vector<f32>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    hooks: SurfaceContactHooks,
    timestep: FixedTimestep,
    player: Option<BodyHandle>,
}

impl PhysicsWorld {
    /// Empty world with standard gravity and the viewer's contact material rules.
    pub fn new(fixed_delta: f32, max_substeps: u32) -> Self {
        let params = IntegrationParameters {
            dt: fixed_delta,
            ..IntegrationParameters::default()
        };

        Self {
            gravity: Vector::new(0.0, GRAVITY_Y, 0.0),
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            hooks: SurfaceContactHooks {
                table: ContactMaterialTable::viewer_defaults(),
            },
            timestep: FixedTimestep::new(fixed_delta, max_substeps),
            player: None,
        }
    }

    #[inline]
    pub fn fixed_delta(&self) -> f32 {
        self.params.dt
    }

    #[inline]
    pub fn contact_materials(&self) -> &ContactMaterialTable {
        &self.hooks.table
    }

    /// Insert a fixed body carrying the collider described by `def`.
    pub fn add_static(&mut self, def: &StaticColliderDef) -> Result<BodyHandle, GeometryError> {
        let collider = collider_from_def(def)?;
        let iso = def.iso();
        let handle = self.bodies.insert(RigidBodyBuilder::fixed().pose(iso).build());
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        Ok(handle)
    }

    /// Insert the player sphere at `spawn`. A previous player body is removed first.
    pub fn add_player(&mut self, spawn: Vec3) -> Result<BodyHandle, GeometryError> {
        if let Some(old) = self.player.take() {
            self.remove_body(old);
        }

        let def = StaticColliderDef::new(
            spawn,
            ColliderShapeDef::Sphere {
                radius: PLAYER_RADIUS,
            },
            SurfaceMaterial::Player,
        );
        let mut collider = collider_from_def(&def)?;
        collider.set_mass(PLAYER_MASS);

        let body = RigidBodyBuilder::dynamic()
            .translation(spawn)
            .linear_damping(PLAYER_LINEAR_DAMPING)
            .lock_rotations()
            .ccd_enabled(true)
            .build();
        let handle = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        self.player = Some(handle);
        Ok(handle)
    }

    /// Remove a body and its colliders. Returns whether the body existed.
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        if self.player == Some(handle) {
            self.player = None;
        }
        self.bodies
            .remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    #[inline]
    pub fn player(&self) -> Option<BodyHandle> {
        self.player
    }

    #[inline]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    #[inline]
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Number of fixed (infinite-mass) bodies.
    pub fn static_body_count(&self) -> usize {
        self.bodies.iter().filter(|(_, b)| b.is_fixed()).count()
    }

    /// World pose of a body, if it exists.
    pub fn body_pose(&self, handle: BodyHandle) -> Option<Iso> {
        self.bodies.get(handle).map(|b| {
            Iso::from_parts(na::Translation3::from(*b.translation()), *b.rotation())
        })
    }

    /// Player sphere center.
    pub fn player_position(&self) -> Option<Vec3> {
        self.player
            .and_then(|h| self.bodies.get(h))
            .map(|b| *b.translation())
    }

    pub fn player_velocity(&self) -> Option<Vec3> {
        self.player
            .and_then(|h| self.bodies.get(h))
            .map(|b| *b.linvel())
    }

    /// Overwrite the player's horizontal velocity from a movement intent.
    ///
    /// `intent.x` is strafe (+right), `intent.y` is forward. The intent is rotated by the
    /// camera `yaw` (radians about +Y, forward at zero yaw is -Z) and scaled by `walk_speed`.
    /// The vertical component is kept as-is.
    pub fn apply_player_motion(&mut self, intent: Vec2, yaw: f32, walk_speed: f32) {
        let Some(body) = self.player.and_then(|h| self.bodies.get_mut(h)) else {
            return;
        };

        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), yaw);
        let forward = rotation * Vec3::new(0.0, 0.0, -1.0);
        let right = rotation * Vec3::new(1.0, 0.0, 0.0);
        let horizontal = (right * intent.x + forward * intent.y) * walk_speed;

        let vertical = body.linvel().y;
        let wake = horizontal.norm_squared() > 0.0;
        body.set_linvel(Vector::new(horizontal.x, vertical, horizontal.z), wake);
    }

    /// Take exactly one internal step of `fixed_delta`.
    pub fn step_once(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            &self.hooks,
            &(),
        );
    }

    /// Advance by a wall-clock frame duration, returning the number of internal steps taken.
    pub fn step(&mut self, frame_delta: f32) -> u32 {
        let steps = self.timestep.advance(frame_delta);
        for _ in 0..steps {
            self.step_once();
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FIXED_DELTA, MAX_SUBSTEPS, WALK_SPEED_MPS};

    fn ground_plane() -> StaticColliderDef {
        StaticColliderDef::new(
            Vec3::zeros(),
            ColliderShapeDef::Plane {
                offset_along_normal: 0.0,
            },
            SurfaceMaterial::Ground,
        )
    }

    fn world_with_ground() -> PhysicsWorld {
        let mut world = PhysicsWorld::new(FIXED_DELTA, MAX_SUBSTEPS);
        world.add_static(&ground_plane()).unwrap();
        world
    }

    #[test]
    fn static_bodies_never_move() {
        let mut world = world_with_ground();
        let wall = world
            .add_static(&StaticColliderDef::new(
                Vec3::new(3.0, 1.5, 0.0),
                ColliderShapeDef::Cuboid {
                    half_extents: Vec3::new(0.25, 1.5, 5.0),
                },
                SurfaceMaterial::Wall,
            ))
            .unwrap();
        world.add_player(Vec3::new(2.0, 0.6, 0.0)).unwrap();

        let before = world.body_pose(wall).unwrap();
        for _ in 0..120 {
            world.apply_player_motion(Vec2::new(1.0, 0.0), 0.0, WALK_SPEED_MPS);
            world.step_once();
        }
        assert_eq!(world.body_pose(wall).unwrap(), before);
    }

    #[test]
    fn sphere_falls_and_comes_to_rest_on_ground() {
        let mut world = world_with_ground();
        world.add_player(Vec3::new(0.0, 5.0, 0.0)).unwrap();

        let mut last_y = 5.0;
        for _ in 0..120 {
            world.step_once();
            let p = world.player_position().unwrap();
            // Restitution 0.1 allows only a tiny bounce.
            assert!(p.y <= last_y + 0.05, "rose from {last_y} to {}", p.y);
            assert!(p.x.abs() < 1.0e-4 && p.z.abs() < 1.0e-4);
            last_y = p.y;
        }
        assert!(
            (last_y - PLAYER_RADIUS).abs() < 0.05,
            "expected rest at {PLAYER_RADIUS}, got {last_y}"
        );
    }

    #[test]
    fn commanded_horizontal_speed_is_walk_speed_without_accumulation() {
        let mut world = world_with_ground();
        world.add_player(Vec3::new(0.0, 3.0, 0.0)).unwrap();
        world.step_once();
        let vy = world.player_velocity().unwrap().y;

        for _ in 0..3 {
            world.apply_player_motion(Vec2::new(0.0, 1.0), 0.7, WALK_SPEED_MPS);
            let v = world.player_velocity().unwrap();
            let horizontal = Vec2::new(v.x, v.z).norm();
            assert!((horizontal - WALK_SPEED_MPS).abs() < 1.0e-5);
            assert_eq!(v.y, vy);
        }
    }

    #[test]
    fn zero_intent_stops_horizontal_motion() {
        let mut world = world_with_ground();
        world.add_player(Vec3::new(0.0, 0.5, 0.0)).unwrap();
        world.apply_player_motion(Vec2::new(1.0, 1.0), 0.0, WALK_SPEED_MPS);
        world.apply_player_motion(Vec2::zeros(), 0.0, WALK_SPEED_MPS);
        let v = world.player_velocity().unwrap();
        assert_eq!((v.x, v.z), (0.0, 0.0));
    }

    #[test]
    fn forward_walk_for_one_second_covers_walk_speed() {
        let mut world = world_with_ground();
        world.add_player(Vec3::new(0.0, PLAYER_RADIUS, 0.0)).unwrap();
        let start = world.player_position().unwrap();

        for _ in 0..60 {
            world.apply_player_motion(Vec2::new(0.0, 1.0), 0.0, WALK_SPEED_MPS);
            world.step_once();
        }

        let moved = world.player_position().unwrap() - start;
        // Forward at zero yaw is -Z. Linear damping shaves a little off each step.
        assert!((-moved.z - WALK_SPEED_MPS).abs() < 0.05, "moved {moved:?}");
        assert!(moved.x.abs() < 1.0e-3);
    }

    #[test]
    fn removing_a_body_in_contact_is_clean() {
        let mut world = world_with_ground();
        let block = world
            .add_static(&StaticColliderDef::new(
                Vec3::new(0.0, 0.5, 0.0),
                ColliderShapeDef::Cuboid {
                    half_extents: Vec3::new(1.0, 0.5, 1.0),
                },
                SurfaceMaterial::Model,
            ))
            .unwrap();
        world.add_player(Vec3::new(0.0, 1.5, 0.0)).unwrap();
        for _ in 0..30 {
            world.step_once();
        }

        let bodies = world.body_count();
        assert!(world.remove_body(block));
        assert!(!world.remove_body(block));
        assert_eq!(world.body_count(), bodies - 1);

        // The player drops onto the ground once the block is gone.
        for _ in 0..120 {
            world.step_once();
        }
        let y = world.player_position().unwrap().y;
        assert!((y - PLAYER_RADIUS).abs() < 0.05, "player at {y}");
    }

    #[test]
    fn wall_clock_step_respects_substep_budget() {
        let mut world = world_with_ground();
        assert_eq!(world.step(FIXED_DELTA), 1);
        assert_eq!(world.step(10.0), MAX_SUBSTEPS);
    }

    #[test]
    fn readding_player_replaces_previous_body() {
        let mut world = world_with_ground();
        let first = world.add_player(Vec3::new(0.0, 1.0, 0.0)).unwrap();
        let second = world.add_player(Vec3::new(0.0, 2.0, 0.0)).unwrap();
        assert_ne!(first, second);
        assert_eq!(world.player(), Some(second));
        assert_eq!(world.body_count(), 2);
        assert_eq!(world.static_body_count(), 1);
    }
}
