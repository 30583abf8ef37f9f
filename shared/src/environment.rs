/*!
Static environment: base geometry built once per session and the currently loaded model.

Design
- Base geometry depends only on the [`GroundLayout`] and never changes after start-up.
- A [`LoadedEnvironment`] owns the model visual plus one body (and debug mesh) per derived
  collider. [`LoadedEnvironment::teardown`] releases all of them; the session always tears the
  previous one down before installing the next, inside one call.
*/

use crate::{
    colliders::ColliderBuildReport,
    config::GroundLayout,
    constants::{
        GATE_WIDTH, GROUND_SIZE, PATH_WIDTH, PLAYER_RADIUS, PLAYER_SPAWN, POST_HEIGHT, POST_SIZE,
        TERRAIN_AMPLITUDE, TERRAIN_SEGMENTS, TEXTURE_TILE_METERS, WALL_HEIGHT, WALL_THICKNESS,
    },
    materials::SurfaceMaterial,
    physics::{BodyHandle, PhysicsWorld},
    rapier::{ColliderShapeDef, ShapeKind, StaticColliderDef},
    render::{RenderBackend, VisualId, VisualIds},
    scene::ModelScene,
    terrain::Heightmap,
    types::{Iso, Vec3},
};

/// Thickness of the paved path slab (meters).
const PATH_THICKNESS: f32 = 0.02;

/// One piece of base geometry: its collider plus how its texture tiles.
#[derive(Clone, Debug, PartialEq)]
pub struct BaseSurface {
    pub def: StaticColliderDef,
    /// Texture repeats along the surface's two visible axes.
    pub uv_repeat: [f32; 2],
}

impl BaseSurface {
    fn new(def: StaticColliderDef, width: f32, length: f32) -> Self {
        Self {
            def,
            uv_repeat: [
                (width / TEXTURE_TILE_METERS).max(1.0),
                (length / TEXTURE_TILE_METERS).max(1.0),
            ],
        }
    }

    fn slab(center: Vec3, half_extents: Vec3, material: SurfaceMaterial) -> Self {
        let def = StaticColliderDef::new(center, ColliderShapeDef::Cuboid { half_extents }, material);
        // Walls tile along their long side and height; path and posts along X/Z.
        let (w, l) = match material {
            SurfaceMaterial::Wall => (half_extents.x.max(half_extents.z) * 2.0, half_extents.y * 2.0),
            _ => (half_extents.x * 2.0, half_extents.z * 2.0),
        };
        Self::new(def, w, l)
    }
}

/// Base geometry for a ground layout.
pub fn base_geometry(layout: GroundLayout) -> Vec<BaseSurface> {
    let ground_plane = || {
        BaseSurface::new(
            StaticColliderDef::new(
                Vec3::zeros(),
                ColliderShapeDef::Plane {
                    offset_along_normal: 0.0,
                },
                SurfaceMaterial::Ground,
            ),
            GROUND_SIZE,
            GROUND_SIZE,
        )
    };

    match layout {
        GroundLayout::Flat => vec![ground_plane()],

        GroundLayout::Terrain { seed } => {
            let map = Heightmap::generate(seed, TERRAIN_SEGMENTS, GROUND_SIZE, TERRAIN_AMPLITUDE);
            vec![BaseSurface::new(
                StaticColliderDef::new(Vec3::zeros(), map.shape(), SurfaceMaterial::Ground),
                GROUND_SIZE,
                GROUND_SIZE,
            )]
        }

        GroundLayout::Courtyard => {
            let half = GROUND_SIZE * 0.5;
            let wall_y = WALL_HEIGHT * 0.5;
            let t = WALL_THICKNESS * 0.5;
            let gate_half = GATE_WIDTH * 0.5;
            // Front wall is split around the gate.
            let segment_half = (half - gate_half) * 0.5;
            let segment_x = gate_half + segment_half;
            let post_x = gate_half + POST_SIZE * 0.5;

            vec![
                ground_plane(),
                // Back, left and right walls.
                BaseSurface::slab(
                    Vec3::new(0.0, wall_y, -half),
                    Vec3::new(half, wall_y, t),
                    SurfaceMaterial::Wall,
                ),
                BaseSurface::slab(
                    Vec3::new(-half, wall_y, 0.0),
                    Vec3::new(t, wall_y, half),
                    SurfaceMaterial::Wall,
                ),
                BaseSurface::slab(
                    Vec3::new(half, wall_y, 0.0),
                    Vec3::new(t, wall_y, half),
                    SurfaceMaterial::Wall,
                ),
                // Front wall either side of the gate.
                BaseSurface::slab(
                    Vec3::new(-segment_x, wall_y, half),
                    Vec3::new(segment_half, wall_y, t),
                    SurfaceMaterial::Wall,
                ),
                BaseSurface::slab(
                    Vec3::new(segment_x, wall_y, half),
                    Vec3::new(segment_half, wall_y, t),
                    SurfaceMaterial::Wall,
                ),
                // Gate posts.
                BaseSurface::slab(
                    Vec3::new(-post_x, POST_HEIGHT * 0.5, half),
                    Vec3::new(POST_SIZE * 0.5, POST_HEIGHT * 0.5, POST_SIZE * 0.5),
                    SurfaceMaterial::Post,
                ),
                BaseSurface::slab(
                    Vec3::new(post_x, POST_HEIGHT * 0.5, half),
                    Vec3::new(POST_SIZE * 0.5, POST_HEIGHT * 0.5, POST_SIZE * 0.5),
                    SurfaceMaterial::Post,
                ),
                // Path from the gate to the house at the center.
                BaseSurface::slab(
                    Vec3::new(0.0, PATH_THICKNESS * 0.5, half * 0.5),
                    Vec3::new(PATH_WIDTH * 0.5, PATH_THICKNESS * 0.5, half * 0.5),
                    SurfaceMaterial::Path,
                ),
            ]
        }
    }
}

/// Player spawn point for a ground layout: high enough to clear any terrain.
pub fn player_spawn(layout: GroundLayout) -> Vec3 {
    let spawn = Vec3::from(PLAYER_SPAWN);
    match layout {
        GroundLayout::Terrain { seed } => {
            let map = Heightmap::generate(seed, TERRAIN_SEGMENTS, GROUND_SIZE, TERRAIN_AMPLITUDE);
            let clear = map.height_at(spawn.x, spawn.z) + PLAYER_RADIUS + 1.0;
            Vec3::new(spawn.x, spawn.y.max(clear), spawn.z)
        }
        GroundLayout::Flat | GroundLayout::Courtyard => spawn,
    }
}

/// A static body created from a model collider, plus its debug mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColliderEntry {
    pub body: BodyHandle,
    pub shape: ShapeKind,
    pub debug_mesh: VisualId,
}

/// The active model and everything derived from it.
#[derive(Debug)]
pub struct LoadedEnvironment {
    pub model_index: usize,
    pub model_id: String,
    pub visual: VisualId,
    pub colliders: Vec<ColliderEntry>,
}

impl LoadedEnvironment {
    /// Spawn the model visual and insert one static body per collider definition.
    ///
    /// A definition Rapier rejects (degenerate triangle mesh) is skipped with a warning.
    pub fn install(
        scene: &ModelScene,
        model_index: usize,
        report: &ColliderBuildReport,
        world: &mut PhysicsWorld,
        backend: &mut dyn RenderBackend,
        ids: &mut VisualIds,
    ) -> Self {
        let visual = ids.allocate();
        backend.spawn_model(visual, scene);

        let mut colliders = Vec::with_capacity(report.defs.len());
        for def in &report.defs {
            match world.add_static(def) {
                Ok(body) => {
                    let debug_mesh = ids.allocate();
                    let pose = world.body_pose(body).unwrap_or_else(Iso::identity);
                    backend.spawn_debug_mesh(debug_mesh, &def.shape, pose);
                    colliders.push(ColliderEntry {
                        body,
                        shape: def.shape.kind(),
                        debug_mesh,
                    });
                }
                Err(err) => log::warn!("model `{}`: collider rejected: {err}", scene.id),
            }
        }

        log::info!(
            "installed model `{}` with {} static bodies",
            scene.id,
            colliders.len()
        );
        Self {
            model_index,
            model_id: scene.id.clone(),
            visual,
            colliders,
        }
    }

    /// Remove every body and debug mesh, then the model visual.
    pub fn teardown(self, world: &mut PhysicsWorld, backend: &mut dyn RenderBackend) {
        for entry in &self.colliders {
            if !world.remove_body(entry.body) {
                log::warn!("model `{}`: body already gone", self.model_id);
            }
            backend.despawn(entry.debug_mesh);
        }
        backend.despawn(self.visual);
        log::info!("released model `{}`", self.model_id);
    }

    /// Copy body poses onto debug meshes.
    pub fn sync_debug_meshes(&self, world: &PhysicsWorld, backend: &mut dyn RenderBackend) {
        for entry in &self.colliders {
            if let Some(pose) = world.body_pose(entry.body) {
                backend.set_pose(entry.debug_mesh, pose);
            }
        }
    }

    /// Sorted shape kinds of the installed colliders.
    pub fn shape_distribution(&self) -> Vec<ShapeKind> {
        let mut kinds: Vec<_> = self.colliders.iter().map(|c| c.shape).collect();
        kinds.sort();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        colliders::build_model_colliders,
        config::{ColliderStrategy, CollisionFilter},
        constants::{FIXED_DELTA, MAX_SUBSTEPS},
        render::recording::RecordingBackend,
        scene::test_scenes::house,
    };

    #[test]
    fn courtyard_has_ground_walls_posts_and_path() {
        let surfaces = base_geometry(GroundLayout::Courtyard);
        let count = |m| surfaces.iter().filter(|s| s.def.material == m).count();
        assert_eq!(count(SurfaceMaterial::Ground), 1);
        assert_eq!(count(SurfaceMaterial::Wall), 5);
        assert_eq!(count(SurfaceMaterial::Post), 2);
        assert_eq!(count(SurfaceMaterial::Path), 1);
    }

    #[test]
    fn gate_gap_is_left_open() {
        let surfaces = base_geometry(GroundLayout::Courtyard);
        let half = GROUND_SIZE * 0.5;
        for s in surfaces
            .iter()
            .filter(|s| s.def.material == SurfaceMaterial::Wall && s.def.translation.z == half)
        {
            let ColliderShapeDef::Cuboid { half_extents } = s.def.shape else {
                panic!("walls are cuboids");
            };
            let inner_edge = s.def.translation.x.abs() - half_extents.x;
            assert!((inner_edge - GATE_WIDTH * 0.5).abs() < 1.0e-4);
        }
    }

    #[test]
    fn texture_repeat_scales_with_size() {
        let surfaces = base_geometry(GroundLayout::Flat);
        assert_eq!(surfaces.len(), 1);
        assert_eq!(surfaces[0].uv_repeat, [GROUND_SIZE / TEXTURE_TILE_METERS; 2]);
    }

    #[test]
    fn terrain_layout_is_one_heightfield() {
        let surfaces = base_geometry(GroundLayout::Terrain { seed: 9 });
        assert_eq!(surfaces.len(), 1);
        assert_eq!(surfaces[0].def.shape.kind(), ShapeKind::HeightField);
        assert_eq!(surfaces, base_geometry(GroundLayout::Terrain { seed: 9 }));
    }

    #[test]
    fn terrain_spawn_clears_the_ground() {
        let layout = GroundLayout::Terrain { seed: 5 };
        let map = Heightmap::generate(5, TERRAIN_SEGMENTS, GROUND_SIZE, TERRAIN_AMPLITUDE);
        let spawn = player_spawn(layout);
        assert!(spawn.y > map.height_at(spawn.x, spawn.z) + PLAYER_RADIUS);
        assert_eq!(player_spawn(GroundLayout::Flat), Vec3::from(PLAYER_SPAWN));
    }

    #[test]
    fn teardown_releases_bodies_and_visuals() {
        let mut world = PhysicsWorld::new(FIXED_DELTA, MAX_SUBSTEPS);
        let mut backend = RecordingBackend::default();
        let mut ids = VisualIds::default();
        let scene = house("a.glb");
        let report =
            build_model_colliders(&scene, ColliderStrategy::TriMesh, &CollisionFilter::default());

        let env = LoadedEnvironment::install(&scene, 0, &report, &mut world, &mut backend, &mut ids);
        assert_eq!(world.body_count(), report.defs.len());
        assert_eq!(backend.live.len(), report.defs.len() + 1);

        env.sync_debug_meshes(&world, &mut backend);
        env.teardown(&mut world, &mut backend);
        assert_eq!(world.body_count(), 0);
        assert!(backend.live.is_empty());
    }
}
