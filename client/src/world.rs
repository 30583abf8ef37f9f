//! Bevy side of the render seam.
//!
//! [`BevyBackend`] lives inside the session and only records what the session asks for. The
//! `apply_visual_commands` system then turns those records into entities, keyed by
//! [`VisualId`].

use std::collections::HashMap;

use bevy::{
    asset::RenderAssetUsages,
    image::{ImageAddressMode, ImageLoaderSettings, ImageSampler, ImageSamplerDescriptor},
    math::Affine2,
    mesh::{Indices, PrimitiveTopology},
    prelude::*,
};
use viewer_shared::{
    BaseSurface, CameraRig, ColliderShapeDef, LightingState, ModelScene, RenderBackend,
    SurfaceMaterial, VisualId, constants::GROUND_SIZE, error::RenderError, types::Iso,
};

use crate::{
    config::Settings,
    math::transform_from_iso,
    viewer::{Session, ViewerSystems},
};

#[derive(Clone, Debug)]
pub enum VisualCommand {
    Surface { id: VisualId, surface: BaseSurface },
    Model { id: VisualId, model_id: String },
    DebugMesh {
        id: VisualId,
        shape: ColliderShapeDef,
        pose: Iso,
    },
    Despawn(VisualId),
    Pose { id: VisualId, pose: Iso },
}

/// [`RenderBackend`] that buffers commands for the ECS and keeps the latest view state.
#[derive(Debug, Default)]
pub struct BevyBackend {
    commands: Vec<VisualCommand>,
    pub debug_visible: bool,
    pub camera: Option<CameraRig>,
    pub lighting: Option<LightingState>,
    pub loading: bool,
    /// Last reported window size; a zero-area surface cannot be drawn to.
    surface: Option<(f32, f32)>,
}

impl BevyBackend {
    pub fn take_commands(&mut self) -> Vec<VisualCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl RenderBackend for BevyBackend {
    fn spawn_surface(&mut self, id: VisualId, surface: &BaseSurface) {
        self.commands.push(VisualCommand::Surface {
            id,
            surface: surface.clone(),
        });
    }

    fn spawn_model(&mut self, id: VisualId, scene: &ModelScene) {
        self.commands.push(VisualCommand::Model {
            id,
            model_id: scene.id.clone(),
        });
    }

    fn spawn_debug_mesh(&mut self, id: VisualId, shape: &ColliderShapeDef, pose: Iso) {
        self.commands.push(VisualCommand::DebugMesh {
            id,
            shape: shape.clone(),
            pose,
        });
    }

    fn despawn(&mut self, id: VisualId) {
        self.commands.push(VisualCommand::Despawn(id));
    }

    fn set_pose(&mut self, id: VisualId, pose: Iso) {
        self.commands.push(VisualCommand::Pose { id, pose });
    }

    fn set_debug_visible(&mut self, visible: bool) {
        self.debug_visible = visible;
    }

    fn set_camera(&mut self, rig: &CameraRig) {
        self.camera = Some(*rig);
    }

    fn set_lighting(&mut self, lighting: &LightingState) {
        self.lighting = Some(*lighting);
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.surface = Some((width, height));
    }

    fn draw(&mut self) -> Result<(), RenderError> {
        match self.surface {
            Some((w, h)) if w <= 0.0 || h <= 0.0 => Err(RenderError::SurfaceLost),
            _ => Ok(()),
        }
    }
}

/// Entity spawned for each live [`VisualId`].
#[derive(Resource, Default, Debug)]
pub struct VisualEntities(HashMap<VisualId, Entity>);

/// Finished glTF scenes waiting for the session to place them, by model identifier.
///
/// Only held until the next visual pass. The spawned `SceneRoot` keeps the sole strong handle,
/// so despawning the model visual frees its meshes and textures.
#[derive(Resource, Default, Debug)]
pub struct LoadedScenes(HashMap<String, Handle<Scene>>);

impl LoadedScenes {
    pub fn insert(&mut self, model_id: String, scene: Handle<Scene>) {
        self.0.insert(model_id, scene);
    }

    fn take(&mut self, model_id: &str) -> Option<Handle<Scene>> {
        self.0.remove(model_id)
    }

    /// Drop scenes the session never placed (stale or superseded loads).
    fn discard_unclaimed(&mut self) {
        for model_id in self.0.drain().map(|(id, _)| id) {
            debug!("releasing unplaced scene `{model_id}`");
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Component)]
pub struct DebugMesh;

#[derive(Component)]
pub struct ModelVisual;

#[derive(Resource)]
struct SurfaceTextures {
    ground: Handle<Image>,
    wall: Handle<Image>,
    path: Handle<Image>,
}

#[derive(Resource)]
struct DebugMaterial(Handle<StandardMaterial>);

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<VisualEntities>();
    app.init_resource::<LoadedScenes>();
    app.add_systems(Startup, load_surface_assets);
    app.add_systems(
        Update,
        (apply_visual_commands, apply_debug_visibility)
            .chain()
            .in_set(ViewerSystems::Present),
    );
}

fn repeating(settings: &mut ImageLoaderSettings) {
    settings.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
        address_mode_u: ImageAddressMode::Repeat,
        address_mode_v: ImageAddressMode::Repeat,
        ..ImageSamplerDescriptor::linear()
    });
}

fn load_surface_assets(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Res<Settings>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let paths = &settings.assets;
    commands.insert_resource(SurfaceTextures {
        ground: asset_server.load_with_settings(paths.ground_texture.clone(), repeating),
        wall: asset_server.load_with_settings(paths.wall_texture.clone(), repeating),
        path: asset_server.load_with_settings(paths.path_texture.clone(), repeating),
    });
    commands.insert_resource(DebugMaterial(materials.add(StandardMaterial {
        base_color: Color::srgba(0.0, 1.0, 0.0, 0.3),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        cull_mode: None,
        ..default()
    })));
}

fn apply_visual_commands(
    mut commands: Commands,
    mut session: ResMut<Session>,
    mut visuals: ResMut<VisualEntities>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    textures: Res<SurfaceTextures>,
    debug_material: Res<DebugMaterial>,
    mut scenes: ResMut<LoadedScenes>,
    mut transforms: Query<&mut Transform>,
) {
    let debug_visible = session.backend().debug_visible;
    for command in session.backend_mut().take_commands() {
        match command {
            VisualCommand::Surface { id, surface } => {
                let texture = match surface.def.material {
                    SurfaceMaterial::Ground => Some(&textures.ground),
                    SurfaceMaterial::Wall | SurfaceMaterial::Post => Some(&textures.wall),
                    SurfaceMaterial::Path => Some(&textures.path),
                    SurfaceMaterial::Player | SurfaceMaterial::Model => None,
                };
                let material = materials.add(StandardMaterial {
                    base_color_texture: texture.cloned(),
                    uv_transform: Affine2::from_scale(Vec2::from(surface.uv_repeat)),
                    perceptual_roughness: 0.9,
                    ..default()
                });
                let pose = surface.def.iso();
                let entity = commands
                    .spawn((
                        Mesh3d(meshes.add(shape_mesh(&surface.def.shape))),
                        MeshMaterial3d(material),
                        shape_transform(&surface.def.shape, &pose),
                    ))
                    .id();
                visuals.0.insert(id, entity);
            }
            VisualCommand::Model { id, model_id } => {
                let Some(scene) = scenes.take(&model_id) else {
                    warn!("no scene loaded for model `{model_id}`");
                    continue;
                };
                let entity = commands
                    .spawn((ModelVisual, SceneRoot(scene), Transform::default()))
                    .id();
                visuals.0.insert(id, entity);
            }
            VisualCommand::DebugMesh { id, shape, pose } => {
                let entity = commands
                    .spawn((
                        DebugMesh,
                        Mesh3d(meshes.add(shape_mesh(&shape))),
                        MeshMaterial3d(debug_material.0.clone()),
                        shape_transform(&shape, &pose),
                        visibility(debug_visible),
                    ))
                    .id();
                visuals.0.insert(id, entity);
            }
            VisualCommand::Despawn(id) => {
                if let Some(entity) = visuals.0.remove(&id) {
                    commands.entity(entity).despawn();
                }
            }
            VisualCommand::Pose { id, pose } => {
                let Some(&entity) = visuals.0.get(&id) else {
                    continue;
                };
                let target = transform_from_iso(&pose);
                match transforms.get_mut(entity) {
                    Ok(mut transform) => {
                        transform.translation = target.translation;
                        transform.rotation = target.rotation;
                    }
                    // Spawned this frame; the command queue has not run yet.
                    Err(_) => {
                        commands.entity(entity).insert(target);
                    }
                }
            }
        }
    }
    scenes.discard_unclaimed();
}

fn apply_debug_visibility(
    session: Res<Session>,
    mut applied: Local<Option<bool>>,
    mut debug_meshes: Query<&mut Visibility, With<DebugMesh>>,
) {
    let visible = session.backend().debug_visible;
    if *applied == Some(visible) {
        return;
    }
    *applied = Some(visible);
    for mut v in &mut debug_meshes {
        *v = visibility(visible);
    }
}

fn visibility(visible: bool) -> Visibility {
    if visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

/// Pose of the visual for a collider. Planes sit at their offset along the normal.
fn shape_transform(shape: &ColliderShapeDef, pose: &Iso) -> Transform {
    let mut transform = transform_from_iso(pose);
    if let ColliderShapeDef::Plane {
        offset_along_normal,
    } = shape
    {
        transform.translation += transform.rotation * Vec3::Y * *offset_along_normal;
    }
    transform
}

/// Render mesh mirroring a collider shape.
pub fn shape_mesh(shape: &ColliderShapeDef) -> Mesh {
    match shape {
        ColliderShapeDef::Plane { .. } => Plane3d::default()
            .mesh()
            .size(GROUND_SIZE, GROUND_SIZE)
            .build(),
        ColliderShapeDef::Cuboid { half_extents } => Cuboid::new(
            half_extents.x * 2.0,
            half_extents.y * 2.0,
            half_extents.z * 2.0,
        )
        .mesh()
        .build(),
        ColliderShapeDef::Sphere { radius } => Sphere::new(*radius).mesh().uv(24, 16),
        ColliderShapeDef::TriMesh { vertices, indices } => {
            let positions: Vec<[f32; 3]> = vertices.iter().map(|p| [p.x, p.y, p.z]).collect();
            let indices: Vec<u32> = indices.iter().flatten().copied().collect();
            indexed_mesh(positions, None, indices)
        }
        ColliderShapeDef::HeightField {
            rows,
            cols,
            heights,
            size,
        } => heightfield_mesh(*rows, *cols, heights, *size),
    }
}

/// Grid mesh for a heightfield centered on its pose: `rows` along Z, `cols` along X.
fn heightfield_mesh(rows: usize, cols: usize, heights: &[f32], size: f32) -> Mesh {
    let step = |n: usize, i: usize| {
        if n > 1 {
            i as f32 / (n - 1) as f32
        } else {
            0.5
        }
    };

    let mut positions = Vec::with_capacity(rows * cols);
    let mut uvs = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let (u, v) = (step(cols, c), step(rows, r));
            let y = heights.get(r * cols + c).copied().unwrap_or(0.0);
            positions.push([(u - 0.5) * size, y, (v - 0.5) * size]);
            uvs.push([u, v]);
        }
    }

    let mut indices = Vec::with_capacity(rows.saturating_sub(1) * cols.saturating_sub(1) * 6);
    for r in 0..rows.saturating_sub(1) {
        for c in 0..cols.saturating_sub(1) {
            let i = (r * cols + c) as u32;
            let below = i + cols as u32;
            indices.extend_from_slice(&[i, below, i + 1, i + 1, below, below + 1]);
        }
    }

    indexed_mesh(positions, Some(uvs), indices)
}

fn indexed_mesh(positions: Vec<[f32; 3]>, uvs: Option<Vec<[f32; 2]>>, indices: Vec<u32>) -> Mesh {
    let uvs = uvs.unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh.compute_normals();
    mesh
}

#[cfg(test)]
mod tests {
    use viewer_shared::types::Point3;

    use super::*;

    #[test]
    fn backend_buffers_commands_until_taken() {
        let mut backend = BevyBackend::default();
        backend.despawn(VisualId(3));
        backend.set_pose(VisualId(4), Iso::identity());
        assert_eq!(backend.take_commands().len(), 2);
        assert!(backend.take_commands().is_empty());
    }

    #[test]
    fn placed_and_stale_scenes_are_not_retained() {
        let mut scenes = LoadedScenes::default();
        scenes.insert("a.glb".into(), Handle::default());
        scenes.insert("b.glb".into(), Handle::default());

        assert!(scenes.take("a.glb").is_some());
        assert!(scenes.take("a.glb").is_none());
        assert_eq!(scenes.len(), 1);

        scenes.discard_unclaimed();
        assert_eq!(scenes.len(), 0);
    }

    #[test]
    fn zero_sized_surface_skips_draw() {
        let mut backend = BevyBackend::default();
        assert!(backend.draw().is_ok());
        backend.resize(0.0, 600.0);
        assert_eq!(backend.draw(), Err(RenderError::SurfaceLost));
        backend.resize(800.0, 600.0);
        assert!(backend.draw().is_ok());
    }

    #[test]
    fn heightfield_mesh_spans_its_size() {
        let mesh = heightfield_mesh(3, 3, &[0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0], 10.0);
        assert_eq!(mesh.count_vertices(), 9);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(24));

        let Some(bevy::mesh::VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("positions missing");
        };
        assert_eq!(positions[0], [-5.0, 0.0, -5.0]);
        assert_eq!(positions[4], [0.0, 2.0, 0.0]);
        assert_eq!(positions[8], [5.0, 0.0, 5.0]);
    }

    #[test]
    fn trimesh_debug_mesh_keeps_triangles() {
        let shape = ColliderShapeDef::TriMesh {
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            indices: vec![[0, 2, 1]],
        };
        let mesh = shape_mesh(&shape);
        assert_eq!(mesh.count_vertices(), 3);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(3));
    }

    #[test]
    fn raised_plane_visual_moves_along_normal() {
        let shape = ColliderShapeDef::Plane {
            offset_along_normal: 2.0,
        };
        let t = shape_transform(&shape, &Iso::translation(0.0, 1.0, 0.0));
        assert_eq!(t.translation, Vec3::new(0.0, 3.0, 0.0));
    }
}
