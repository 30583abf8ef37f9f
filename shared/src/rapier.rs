use rapier3d::prelude::*;

use crate::{
    constants::{DEFAULT_FRICTION, DEFAULT_RESTITUTION},
    error::GeometryError,
    materials::SurfaceMaterial,
    types::{Iso, Point3, Quat, Vec3, na},
};

/// Canonical, engine-agnostic definition of an immutable world collider.
///
/// Base geometry (ground, walls, path, posts) and model-derived colliders are both described
/// this way before they ever reach the physics world, so tests can inspect the shapes a build
/// produced without stepping a simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticColliderDef {
    /// World-space translation.
    pub translation: Vec3,
    /// World-space rotation (unit quaternion).
    pub rotation: Quat,
    /// Collider shape parameters.
    pub shape: ColliderShapeDef,
    /// Contact material tag stored on the collider.
    pub material: SurfaceMaterial,
}

impl StaticColliderDef {
    pub fn new(translation: Vec3, shape: ColliderShapeDef, material: SurfaceMaterial) -> Self {
        Self {
            translation,
            rotation: Quat::identity(),
            shape,
            material,
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// World pose of the owning body.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(na::Translation3::from(self.translation), self.rotation)
    }
}

/// Supported static collider shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space).
    ///
    /// The plane normal is derived from the pose as `rotation * +Y`; any visible size of the
    /// ground is a rendering concern only.
    Plane {
        /// Offset along the plane normal (meters).
        offset_along_normal: f32,
    },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vec3 },

    /// Sphere/ball (meters).
    Sphere { radius: f32 },

    /// Triangle mesh. Vertices are already scaled into the pose's frame.
    TriMesh {
        vertices: Vec<Point3>,
        indices: Vec<[u32; 3]>,
    },

    /// Regular grid of heights centered on the pose.
    ///
    /// `heights` is row-major with `rows` samples along Z and `cols` samples along X; `size`
    /// is the total X/Z extent in meters.
    HeightField {
        rows: usize,
        cols: usize,
        heights: Vec<f32>,
        size: f32,
    },
}

/// Discriminant of [`ColliderShapeDef`], used to compare collider sets by shape distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    Plane,
    Cuboid,
    Sphere,
    TriMesh,
    HeightField,
}

impl ColliderShapeDef {
    #[inline]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Plane { .. } => ShapeKind::Plane,
            Self::Cuboid { .. } => ShapeKind::Cuboid,
            Self::Sphere { .. } => ShapeKind::Sphere,
            Self::TriMesh { .. } => ShapeKind::TriMesh,
            Self::HeightField { .. } => ShapeKind::HeightField,
        }
    }
}

/// Build a Rapier collider from a [`StaticColliderDef`].
///
/// The pose lives on the parent rigid body, so every shape except the plane is created with an
/// identity local transform. The material is written into `user_data` and the collider opts
/// into solver-contact modification so per-pair materials apply.
pub fn collider_from_def(def: &StaticColliderDef) -> Result<Collider, GeometryError> {
    let builder = match &def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => {
            // Plane is expressed in the body's local frame: n = +Y, dist = offset.
            let unit_n = UnitVector::new_normalize(Vector::y());
            ColliderBuilder::new(SharedShape::new(HalfSpace::new(unit_n)))
                .translation(unit_n.into_inner() * *offset_along_normal)
        }

        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }

        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),

        ColliderShapeDef::TriMesh { vertices, indices } => {
            ColliderBuilder::trimesh(vertices.clone(), indices.clone())
                .map_err(|e| GeometryError::TriMesh(format!("{e:?}")))?
        }

        ColliderShapeDef::HeightField {
            rows,
            cols,
            heights,
            size,
        } => {
            if *rows < 2 || *cols < 2 || heights.len() != rows * cols {
                return Err(GeometryError::HeightField {
                    rows: *rows,
                    cols: *cols,
                    samples: heights.len(),
                });
            }
            let matrix = na::DMatrix::from_row_slice(*rows, *cols, heights);
            ColliderBuilder::heightfield(matrix, Vector::new(*size, 1.0, *size))
        }
    };

    Ok(builder
        .friction(DEFAULT_FRICTION)
        .restitution(DEFAULT_RESTITUTION)
        .user_data(def.material.to_user_data())
        .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS)
        .build())
}
