//! Derives static collision shapes from a loaded model.
//!
//! Every mesh reachable from the model root is classified as solid or passable, then turned
//! into a cuboid (bounding-box strategy) or a world-space triangle mesh (trimesh strategy).
//! Malformed meshes are skipped with a warning and the walk continues.

use crate::{
    config::{ColliderStrategy, CollisionFilter},
    error::GeometryError,
    materials::SurfaceMaterial,
    rapier::{ColliderShapeDef, ShapeKind, StaticColliderDef},
    scene::{GroupNode, MeshNode, ModelScene, SceneVisitor},
    types::{Point3, Transform, Vec3},
};

/// Smallest half-extent given to a bounding box (flat meshes such as floors).
const MIN_HALF_EXTENT: f32 = 0.01;

#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    /// Tagged or named as decorative.
    Passable,
    Malformed(GeometryError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkippedMesh {
    pub name: String,
    pub reason: SkipReason,
}

/// Outcome of [`build_model_colliders`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColliderBuildReport {
    pub defs: Vec<StaticColliderDef>,
    pub skipped: Vec<SkippedMesh>,
}

impl ColliderBuildReport {
    /// Sorted shape kinds of the produced colliders.
    pub fn shape_distribution(&self) -> Vec<ShapeKind> {
        let mut kinds: Vec<_> = self.defs.iter().map(|d| d.shape.kind()).collect();
        kinds.sort();
        kinds
    }
}

/// Case-insensitive marker match against a node name.
pub fn has_passable_marker(name: &str, filter: &CollisionFilter) -> bool {
    let name = name.to_lowercase();
    filter
        .passable_markers
        .iter()
        .any(|m| !m.is_empty() && name.contains(&m.to_lowercase()))
}

/// Whether a mesh blocks the player.
///
/// An authored tag wins. Untagged meshes are passable when their own name, or the name of an
/// enclosing group (`inside_passable_group`), carries a marker.
pub fn is_solid(mesh: &MeshNode, filter: &CollisionFilter, inside_passable_group: bool) -> bool {
    match mesh.collidable {
        Some(tag) => tag,
        None => !inside_passable_group && !has_passable_marker(&mesh.name, filter),
    }
}

struct Builder<'a> {
    strategy: ColliderStrategy,
    filter: &'a CollisionFilter,
    report: ColliderBuildReport,
    /// One entry per enclosing group: whether that group's name is marked passable.
    groups: Vec<bool>,
}

impl SceneVisitor for Builder<'_> {
    fn visit_group(&mut self, group: &GroupNode, _world: &Transform) {
        self.groups
            .push(has_passable_marker(&group.name, self.filter));
    }

    fn leave_group(&mut self, _group: &GroupNode) {
        self.groups.pop();
    }

    fn visit_mesh(&mut self, mesh: &MeshNode, world: &Transform) {
        let inside_passable = self.groups.iter().any(|&g| g);
        if !is_solid(mesh, self.filter, inside_passable) {
            self.report.skipped.push(SkippedMesh {
                name: mesh.name.clone(),
                reason: SkipReason::Passable,
            });
            return;
        }

        let def = match self.strategy {
            ColliderStrategy::BoundingBox => bounding_box_def(mesh, world),
            ColliderStrategy::TriMesh => trimesh_def(mesh, world),
        };

        match def {
            Ok(def) => self.report.defs.push(def),
            Err(err) => {
                log::warn!("skipping mesh `{}`: {err}", mesh.name);
                self.report.skipped.push(SkippedMesh {
                    name: mesh.name.clone(),
                    reason: SkipReason::Malformed(err),
                });
            }
        }
    }
}

fn bounding_box_def(mesh: &MeshNode, world: &Transform) -> Result<StaticColliderDef, GeometryError> {
    // Validate the same way the trimesh path does so both strategies skip the same meshes.
    mesh.geometry.triangles()?;
    let (min, max) = mesh
        .geometry
        .local_aabb()
        .ok_or(GeometryError::MissingPositions)?;

    let center = (min + max) * 0.5;
    let half_extents = ((max - min) * 0.5)
        .component_mul(&world.scale.abs())
        .map(|h| h.max(MIN_HALF_EXTENT));

    Ok(StaticColliderDef::new(
        world.transform_point(&center),
        ColliderShapeDef::Cuboid { half_extents },
        SurfaceMaterial::Model,
    )
    .with_rotation(world.rotation))
}

fn trimesh_def(mesh: &MeshNode, world: &Transform) -> Result<StaticColliderDef, GeometryError> {
    let indices = mesh.geometry.triangles()?;
    let vertices = mesh
        .geometry
        .positions
        .iter()
        .map(|p| Point3::from(world.transform_point(p)))
        .collect();

    Ok(StaticColliderDef::new(
        Vec3::zeros(),
        ColliderShapeDef::TriMesh { vertices, indices },
        SurfaceMaterial::Model,
    ))
}

/// Collider definitions for every solid mesh of `scene`.
pub fn build_model_colliders(
    scene: &ModelScene,
    strategy: ColliderStrategy,
    filter: &CollisionFilter,
) -> ColliderBuildReport {
    let mut builder = Builder {
        strategy,
        filter,
        report: ColliderBuildReport::default(),
        groups: Vec::new(),
    };
    scene.root.walk(&Transform::identity(), &mut builder);

    let report = builder.report;
    log::info!(
        "model `{}`: {} colliders, {} meshes skipped",
        scene.id,
        report.defs.len(),
        report.skipped.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MeshGeometry, SceneNode, test_scenes::*};
    use std::sync::Arc;

    fn names(skipped: &[SkippedMesh]) -> Vec<&str> {
        skipped.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn name_markers_skip_decor_but_tags_win() {
        let report = build_model_colliders(
            &house("a.glb"),
            ColliderStrategy::TriMesh,
            &CollisionFilter::default(),
        );

        // Walls + roof + the table, tagged solid inside the passable interior group.
        assert_eq!(report.defs.len(), 4);
        assert_eq!(names(&report.skipped), vec!["Sofa", "Window_Front"]);
    }

    #[test]
    fn markers_match_case_insensitively() {
        let filter = CollisionFilter {
            passable_markers: vec!["ROOF".into()],
        };
        let report = build_model_colliders(&house("a.glb"), ColliderStrategy::BoundingBox, &filter);
        assert_eq!(names(&report.skipped), vec!["Roof"]);
    }

    #[test]
    fn bounding_boxes_sit_at_mesh_world_position() {
        let report = build_model_colliders(
            &house("a.glb"),
            ColliderStrategy::BoundingBox,
            &CollisionFilter::default(),
        );
        let roof = &report.defs[2];
        assert!((roof.translation - Vec3::new(0.0, 4.0, -10.0)).norm() < 1.0e-5);
        assert_eq!(
            roof.shape,
            ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(2.0, 2.0, 2.0)
            }
        );
        assert!(report.defs.iter().all(|d| d.material == SurfaceMaterial::Model));
    }

    #[test]
    fn off_center_bounds_apply_offset_in_mesh_space() {
        let geometry = MeshGeometry {
            positions: vec![
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(3.0, 0.0, 0.0),
                Vec3::new(3.0, 2.0, 0.0),
            ],
            indices: None,
        };
        let scene = ModelScene {
            id: "m".into(),
            root: SceneNode::Mesh(MeshNode {
                name: "Slab".into(),
                transform: Transform {
                    scale: Vec3::new(2.0, 2.0, 2.0),
                    ..Transform::from_translation(Vec3::new(0.0, 0.0, 5.0))
                },
                geometry: Arc::new(geometry),
                collidable: None,
            }),
        };

        let report =
            build_model_colliders(&scene, ColliderStrategy::BoundingBox, &CollisionFilter::default());
        let def = &report.defs[0];
        // Local center (2, 1, 0) scaled by 2, then moved to z = 5.
        assert!((def.translation - Vec3::new(4.0, 2.0, 5.0)).norm() < 1.0e-5);
        assert_eq!(
            def.shape,
            ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(2.0, 2.0, MIN_HALF_EXTENT)
            }
        );
    }

    #[test]
    fn trimesh_vertices_are_in_world_space() {
        let report = build_model_colliders(
            &house("a.glb"),
            ColliderStrategy::TriMesh,
            &CollisionFilter::default(),
        );
        let ColliderShapeDef::TriMesh { vertices, indices } = &report.defs[0].shape else {
            panic!("expected trimesh");
        };
        assert_eq!(indices.len(), 12);
        // Wall_North is centered at (0, 1.5, -13) with half-size 1.5.
        assert!(vertices.iter().all(|v| (v.z + 13.0).abs() <= 1.5 + 1.0e-5));
    }

    #[test]
    fn malformed_mesh_is_skipped_and_walk_continues() {
        let broken = SceneNode::Mesh(MeshNode {
            name: "Broken".into(),
            transform: Transform::identity(),
            geometry: Arc::new(MeshGeometry {
                positions: vec![Vec3::zeros(); 2],
                indices: None,
            }),
            collidable: None,
        });
        let scene = ModelScene {
            id: "m".into(),
            root: SceneNode::Group(GroupNode {
                name: "Root".into(),
                transform: Transform::identity(),
                children: vec![broken, mesh("Wall", Vec3::zeros(), 1.0, None)],
            }),
        };

        for strategy in [ColliderStrategy::BoundingBox, ColliderStrategy::TriMesh] {
            let report = build_model_colliders(&scene, strategy, &CollisionFilter::default());
            assert_eq!(report.defs.len(), 1);
            assert_eq!(
                report.skipped,
                vec![SkippedMesh {
                    name: "Broken".into(),
                    reason: SkipReason::Malformed(GeometryError::IncompleteTriangles(2)),
                }]
            );
        }
    }
}
