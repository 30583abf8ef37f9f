//! Engine-agnostic scene graph of a loaded model.
//!
//! The host converts whatever its asset pipeline produced (a glTF scene in the Bevy client) into
//! this closed set of node variants. Collision building and tests only ever walk this tree.

use std::sync::Arc;

use crate::{
    error::GeometryError,
    types::{Transform, Vec3},
};

/// Vertex/index buffers of one mesh, in the mesh's local space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshGeometry {
    pub positions: Vec<Vec3>,
    /// Triangle-list indices. `None` means the positions are a non-indexed triangle list.
    pub indices: Option<Vec<u32>>,
}

impl MeshGeometry {
    /// Local axis-aligned bounds as `(min, max)`. `None` for an empty mesh.
    pub fn local_aabb(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        }))
    }

    /// Validated triangles.
    pub fn triangles(&self) -> Result<Vec<[u32; 3]>, GeometryError> {
        let vertex_count = self.positions.len();
        if vertex_count == 0 {
            return Err(GeometryError::MissingPositions);
        }

        match &self.indices {
            Some(indices) => {
                if indices.len() % 3 != 0 {
                    return Err(GeometryError::IncompleteTriangles(indices.len()));
                }
                if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                    return Err(GeometryError::IndexOutOfRange {
                        index,
                        vertex_count,
                    });
                }
                Ok(indices
                    .chunks_exact(3)
                    .map(|t| [t[0], t[1], t[2]])
                    .collect())
            }
            None => {
                if vertex_count % 3 != 0 {
                    return Err(GeometryError::IncompleteTriangles(vertex_count));
                }
                let count = vertex_count as u32;
                Ok((0..count)
                    .step_by(3)
                    .map(|i| [i, i + 1, i + 2])
                    .collect())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshNode {
    pub name: String,
    pub transform: Transform,
    pub geometry: Arc<MeshGeometry>,
    /// Authored solidity tag. Takes precedence over name markers when present.
    pub collidable: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupNode {
    pub name: String,
    pub transform: Transform,
    pub children: Vec<SceneNode>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LightNode {
    pub name: String,
    pub transform: Transform,
    pub kind: LightKind,
    pub intensity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraNode {
    pub name: String,
    pub transform: Transform,
}

/// A node of a model's scene graph.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneNode {
    Mesh(MeshNode),
    Group(GroupNode),
    Light(LightNode),
    Camera(CameraNode),
}

/// Callbacks for [`SceneNode::walk`]. Every callback receives the node's world transform.
pub trait SceneVisitor {
    fn visit_mesh(&mut self, _mesh: &MeshNode, _world: &Transform) {}
    fn visit_group(&mut self, _group: &GroupNode, _world: &Transform) {}
    /// Called after all children of a group were walked.
    fn leave_group(&mut self, _group: &GroupNode) {}
    fn visit_light(&mut self, _light: &LightNode, _world: &Transform) {}
    fn visit_camera(&mut self, _camera: &CameraNode, _world: &Transform) {}
}

impl SceneNode {
    pub fn name(&self) -> &str {
        match self {
            Self::Mesh(n) => &n.name,
            Self::Group(n) => &n.name,
            Self::Light(n) => &n.name,
            Self::Camera(n) => &n.name,
        }
    }

    pub fn local_transform(&self) -> &Transform {
        match self {
            Self::Mesh(n) => &n.transform,
            Self::Group(n) => &n.transform,
            Self::Light(n) => &n.transform,
            Self::Camera(n) => &n.transform,
        }
    }

    /// Depth-first, parent before children.
    pub fn walk<V: SceneVisitor + ?Sized>(&self, parent: &Transform, visitor: &mut V) {
        let world = parent.mul_transform(self.local_transform());
        match self {
            Self::Mesh(n) => visitor.visit_mesh(n, &world),
            Self::Light(n) => visitor.visit_light(n, &world),
            Self::Camera(n) => visitor.visit_camera(n, &world),
            Self::Group(n) => {
                visitor.visit_group(n, &world);
                for child in &n.children {
                    child.walk(&world, visitor);
                }
                visitor.leave_group(n);
            }
        }
    }

    pub fn mesh_count(&self) -> usize {
        struct Count(usize);
        impl SceneVisitor for Count {
            fn visit_mesh(&mut self, _: &MeshNode, _: &Transform) {
                self.0 += 1;
            }
        }
        let mut count = Count(0);
        self.walk(&Transform::identity(), &mut count);
        count.0
    }
}

/// A loaded model: its identifier plus scene root.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelScene {
    pub id: String,
    pub root: SceneNode,
}
