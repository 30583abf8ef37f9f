//! Model list and model scenes, fetched through the `AssetServer`.
//!
//! The list is a small JSON asset. Each selection becomes a glTF scene load; once the scene and
//! all of its meshes are in, its world is converted into a [`ModelScene`] and handed back to
//! the session through the request's completer.

use std::sync::Arc;

use bevy::{
    asset::{AssetLoader, LoadContext, LoadState, RecursiveDependencyLoadState, io::Reader},
    gltf::{GltfAssetLabel, GltfExtras},
    mesh::{PrimitiveTopology, VertexAttributeValues},
    prelude::*,
};
use viewer_shared::{
    LoadRequest, ModelCatalog, ModelScene, SceneNode,
    error::AssetError,
    scene::{CameraNode, GroupNode, LightKind, LightNode, MeshGeometry, MeshNode},
    types::{self as sim, Transform as SimTransform},
};

use crate::{
    config::Settings,
    math::sim_transform,
    viewer::{SelectModel, Session, ViewerSystems},
    world::LoadedScenes,
};

/// Parsed model list.
#[derive(Asset, TypePath, Debug)]
pub struct ModelList(pub ModelCatalog);

#[derive(Default, TypePath)]
struct ModelListLoader;

impl AssetLoader for ModelListLoader {
    type Asset = ModelList;
    type Settings = ();
    type Error = AssetError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &(),
        load_context: &mut LoadContext<'_>,
    ) -> Result<ModelList, AssetError> {
        let path = load_context.asset_path().to_string();
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .await
            .map_err(|err| AssetError::Fetch {
                path: path.clone(),
                reason: err.to_string(),
            })?;
        let catalog = ModelCatalog::from_json(&path, &String::from_utf8_lossy(&bytes))?;
        Ok(ModelList(catalog))
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }
}

#[derive(Resource)]
struct ModelListHandle(Handle<ModelList>);

struct PendingLoad {
    scene: Handle<Scene>,
    request: LoadRequest,
}

/// Scene loads in flight, oldest first.
#[derive(Resource, Default)]
struct PendingLoads(Vec<PendingLoad>);

impl PendingLoads {
    fn start(&mut self, asset_server: &AssetServer, request: LoadRequest) {
        let scene = asset_server.load(GltfAssetLabel::Scene(0).from_asset(request.path.clone()));
        self.0.push(PendingLoad { scene, request });
    }
}

pub(super) fn plugin(app: &mut App) {
    app.init_asset::<ModelList>();
    app.init_asset_loader::<ModelListLoader>();
    app.init_resource::<PendingLoads>();

    app.add_systems(Startup, request_model_list);
    app.add_systems(
        Update,
        (receive_model_list, start_selected_loads, finish_scene_loads)
            .chain()
            .in_set(ViewerSystems::Input),
    );
}

fn request_model_list(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Res<Settings>,
) {
    let handle = asset_server.load(settings.assets.model_list.clone());
    commands.insert_resource(ModelListHandle(handle));
}

fn receive_model_list(
    mut commands: Commands,
    handle: Option<Res<ModelListHandle>>,
    lists: Res<Assets<ModelList>>,
    asset_server: Res<AssetServer>,
    mut session: ResMut<Session>,
    mut pending: ResMut<PendingLoads>,
) {
    let Some(handle) = handle else {
        return;
    };

    if let Some(list) = lists.get(&handle.0) {
        info!("model list has {} entries", list.0.len());
        if let Some(request) = session.set_catalog(list.0.clone()) {
            pending.start(&asset_server, request);
        }
        commands.remove_resource::<ModelListHandle>();
    } else if let Some(LoadState::Failed(err)) = asset_server.get_load_state(&handle.0) {
        error!("model list unavailable: {err}");
        commands.remove_resource::<ModelListHandle>();
    }
}

fn start_selected_loads(
    mut selections: MessageReader<SelectModel>,
    mut session: ResMut<Session>,
    mut pending: ResMut<PendingLoads>,
    asset_server: Res<AssetServer>,
) {
    for SelectModel(index) in selections.read() {
        match session.select_model(*index) {
            Ok(request) => pending.start(&asset_server, request),
            Err(err) => warn!("cannot select model {index}: {err}"),
        }
    }
}

fn finish_scene_loads(
    mut pending: ResMut<PendingLoads>,
    asset_server: Res<AssetServer>,
    scenes: Res<Assets<Scene>>,
    meshes: Res<Assets<Mesh>>,
    mut loaded: ResMut<LoadedScenes>,
) {
    let mut waiting = Vec::new();
    for load in pending.0.drain(..) {
        let state = asset_server.get_recursive_dependency_load_state(&load.scene);
        let PendingLoad { scene, request } = load;
        match state {
            Some(RecursiveDependencyLoadState::Loaded) => {
                let id = request.completer.ticket().model_id.clone();
                let result = match scenes.get(&scene) {
                    Some(asset) => {
                        loaded.insert(id.clone(), scene.clone());
                        Ok(convert_scene(&id, asset, &meshes))
                    }
                    None => Err(AssetError::Decode {
                        id,
                        reason: "scene asset was unloaded".into(),
                    }),
                };
                request.completer.complete(result);
            }
            Some(RecursiveDependencyLoadState::Failed(err)) => {
                request.completer.complete(Err(AssetError::Fetch {
                    path: request.path,
                    reason: err.to_string(),
                }));
            }
            _ => waiting.push(PendingLoad { scene, request }),
        }
    }
    pending.0 = waiting;
}

/// Authored `collidable` flag from a node's glTF extras, e.g. `{"collidable": false}`.
fn collidable_tag(extras: &str) -> Option<bool> {
    serde_json::from_str::<serde_json::Value>(extras)
        .ok()?
        .get("collidable")?
        .as_bool()
}

/// Local-space geometry of a render mesh. Non-triangle primitives carry no solid surface.
fn mesh_geometry(mesh: &Mesh) -> Option<MeshGeometry> {
    if mesh.primitive_topology() != PrimitiveTopology::TriangleList {
        return None;
    }
    let positions = match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
        Some(VertexAttributeValues::Float32x3(positions)) => positions
            .iter()
            .map(|p| sim::Vec3::new(p[0], p[1], p[2]))
            .collect(),
        _ => Vec::new(),
    };
    let indices = mesh
        .indices()
        .map(|indices| indices.iter().map(|i| i as u32).collect());
    Some(MeshGeometry { positions, indices })
}

struct SceneConverter<'a> {
    world: &'a World,
    meshes: &'a Assets<Mesh>,
}

impl SceneConverter<'_> {
    fn node(&self, entity: Entity, inherited_tag: Option<bool>) -> Option<SceneNode> {
        let e = self.world.get_entity(entity).ok()?;
        let name = e
            .get::<Name>()
            .map(|n| n.as_str().to_owned())
            .unwrap_or_default();
        let transform = e.get::<Transform>().map(sim_transform).unwrap_or_default();
        let tag = e
            .get::<GltfExtras>()
            .and_then(|extras| collidable_tag(&extras.value))
            .or(inherited_tag);

        if e.contains::<Camera>() {
            return Some(SceneNode::Camera(CameraNode { name, transform }));
        }
        let light = if let Some(l) = e.get::<DirectionalLight>() {
            Some((LightKind::Directional, l.illuminance))
        } else if let Some(l) = e.get::<PointLight>() {
            Some((LightKind::Point, l.intensity))
        } else {
            e.get::<SpotLight>().map(|l| (LightKind::Spot, l.intensity))
        };
        if let Some((kind, intensity)) = light {
            return Some(SceneNode::Light(LightNode {
                name,
                transform,
                kind,
                intensity,
            }));
        }

        let geometry = e
            .get::<Mesh3d>()
            .and_then(|m| self.meshes.get(&m.0))
            .and_then(mesh_geometry)
            .map(Arc::new);
        let mut children: Vec<SceneNode> = match e.get::<Children>() {
            Some(kids) => {
                let kids: &[Entity] = kids;
                kids.iter()
                    .filter_map(|&child| self.node(child, tag))
                    .collect()
            }
            None => Vec::new(),
        };

        Some(match geometry {
            Some(geometry) if children.is_empty() => SceneNode::Mesh(MeshNode {
                name,
                transform,
                geometry,
                collidable: tag,
            }),
            Some(geometry) => {
                children.insert(
                    0,
                    SceneNode::Mesh(MeshNode {
                        name: name.clone(),
                        transform: SimTransform::identity(),
                        geometry,
                        collidable: tag,
                    }),
                );
                SceneNode::Group(GroupNode {
                    name,
                    transform,
                    children,
                })
            }
            None => SceneNode::Group(GroupNode {
                name,
                transform,
                children,
            }),
        })
    }
}

/// Convert a loaded glTF scene world into the session's scene tree.
pub fn convert_scene(id: &str, scene: &Scene, meshes: &Assets<Mesh>) -> ModelScene {
    let world = &scene.world;
    let converter = SceneConverter { world, meshes };

    let mut roots = Vec::new();
    #[allow(deprecated)]
    for entity_ref in world.iter_entities() {
        if !entity_ref.contains::<ChildOf>() {
            roots.push(entity_ref.id());
        }
    }
    roots.sort();

    let children = roots
        .into_iter()
        .filter_map(|root| converter.node(root, None))
        .collect();

    ModelScene {
        id: id.to_owned(),
        root: SceneNode::Group(GroupNode {
            name: id.to_owned(),
            transform: SimTransform::identity(),
            children,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use viewer_shared::{
        ColliderStrategy, build_model_colliders, config::CollisionFilter, scene::SceneVisitor,
    };

    use super::*;

    /// How often each node name occurs in the tree.
    fn names(scene: &ModelScene) -> HashMap<String, usize> {
        #[derive(Default)]
        struct Count(HashMap<String, usize>);
        impl SceneVisitor for Count {
            fn visit_mesh(&mut self, mesh: &MeshNode, _world: &SimTransform) {
                *self.0.entry(mesh.name.clone()).or_default() += 1;
            }
            fn visit_group(&mut self, group: &GroupNode, _world: &SimTransform) {
                *self.0.entry(group.name.clone()).or_default() += 1;
            }
            fn visit_light(&mut self, light: &LightNode, _world: &SimTransform) {
                *self.0.entry(light.name.clone()).or_default() += 1;
            }
        }
        let mut count = Count::default();
        scene.root.walk(&SimTransform::identity(), &mut count);
        count.0
    }

    fn house_scene(meshes: &mut Assets<Mesh>) -> Scene {
        let cube = meshes.add(Cuboid::new(2.0, 2.0, 2.0).mesh().build());
        let mut world = World::new();
        world
            .spawn((Name::new("House"), Transform::from_xyz(0.0, 0.0, -10.0)))
            .with_children(|house| {
                house.spawn((
                    Name::new("Wall_North"),
                    Transform::from_xyz(0.0, 1.0, -4.0),
                    Mesh3d(cube.clone()),
                ));
                house
                    .spawn((Name::new("Interior"), Transform::default()))
                    .with_children(|interior| {
                        interior.spawn((
                            Name::new("Sofa"),
                            Transform::default(),
                            Mesh3d(cube.clone()),
                        ));
                    });
                house.spawn((
                    Name::new("Statue"),
                    Transform::from_xyz(3.0, 0.0, 0.0),
                    GltfExtras {
                        value: r#"{"collidable": false}"#.into(),
                    },
                    Mesh3d(cube.clone()),
                ));
                house.spawn((
                    Name::new("Lamp"),
                    Transform::from_xyz(0.0, 2.5, 0.0),
                    PointLight::default(),
                ));
            });
        Scene::new(world)
    }

    #[test]
    fn scene_world_becomes_node_tree() {
        let mut meshes = Assets::<Mesh>::default();
        let scene = convert_scene("cottage.glb", &house_scene(&mut meshes), &meshes);

        assert_eq!(scene.id, "cottage.glb");
        assert_eq!(scene.root.mesh_count(), 3);
        let names = names(&scene);
        for expected in ["House", "Wall_North", "Interior", "Sofa", "Statue", "Lamp"] {
            assert_eq!(names.get(expected), Some(&1), "{expected}");
        }
    }

    #[test]
    fn converted_scene_yields_solid_colliders_only() {
        let mut meshes = Assets::<Mesh>::default();
        let scene = convert_scene("cottage.glb", &house_scene(&mut meshes), &meshes);

        let report = build_model_colliders(
            &scene,
            ColliderStrategy::BoundingBox,
            &CollisionFilter::default(),
        );
        // Sofa sits in the passable interior group; the statue is tagged off.
        assert_eq!(report.defs.len(), 1);
        assert_eq!(report.skipped.len(), 2);
        let wall = &report.defs[0];
        assert!((wall.translation - sim::Vec3::new(0.0, 1.0, -14.0)).norm() < 1e-4);
    }

    #[test]
    fn extras_tag_parses_booleans_only() {
        assert_eq!(collidable_tag(r#"{"collidable": true}"#), Some(true));
        assert_eq!(collidable_tag(r#"{"collidable": "yes"}"#), None);
        assert_eq!(collidable_tag("not json"), None);
        assert_eq!(collidable_tag("{}"), None);
    }

    #[test]
    fn line_meshes_have_no_geometry() {
        let lines = Mesh::new(
            PrimitiveTopology::LineList,
            bevy::asset::RenderAssetUsages::default(),
        );
        assert!(mesh_geometry(&lines).is_none());
    }
}
