//! Seam between the viewer session and whatever draws the scene.
//!
//! The session never touches engine objects. It allocates [`VisualId`]s and issues commands
//! against them; a backend maps ids to its own resources (Bevy entities in the client, a call
//! log in tests).

use crate::{
    camera_rig::CameraRig,
    environment::BaseSurface,
    error::RenderError,
    lighting::LightingState,
    rapier::ColliderShapeDef,
    scene::ModelScene,
    types::Iso,
};

/// Opaque id of something the backend renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualId(pub u64);

/// Monotonic [`VisualId`] allocator.
#[derive(Clone, Debug, Default)]
pub struct VisualIds {
    next: u64,
}

impl VisualIds {
    pub fn allocate(&mut self) -> VisualId {
        self.next += 1;
        VisualId(self.next)
    }
}

pub trait RenderBackend {
    /// Textured base geometry (ground, walls, path, posts, terrain).
    fn spawn_surface(&mut self, id: VisualId, surface: &BaseSurface);

    /// Visual model of a loaded scene.
    fn spawn_model(&mut self, id: VisualId, scene: &ModelScene);

    /// Wireframe-style mesh mirroring a collider or the player sphere.
    fn spawn_debug_mesh(&mut self, id: VisualId, shape: &ColliderShapeDef, pose: Iso);

    /// Release everything created for `id`.
    fn despawn(&mut self, id: VisualId);

    fn set_pose(&mut self, id: VisualId, pose: Iso);

    fn set_debug_visible(&mut self, visible: bool);

    fn set_camera(&mut self, rig: &CameraRig);

    fn set_lighting(&mut self, lighting: &LightingState);

    /// Full-viewport loading indicator.
    fn set_loading(&mut self, loading: bool);

    fn resize(&mut self, width: f32, height: f32);

    /// Present the frame. Called once per rendered frame.
    fn draw(&mut self) -> Result<(), RenderError>;
}

#[cfg(test)]
pub(crate) mod recording {
    use std::collections::BTreeSet;

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub enum RenderCall {
        SpawnSurface(VisualId),
        SpawnModel(VisualId, String),
        SpawnDebugMesh(VisualId),
        Despawn(VisualId),
        SetPose(VisualId),
        SetDebugVisible(bool),
        SetCamera,
        SetLighting,
        SetLoading(bool),
        Resize(f32, f32),
        Draw,
    }

    /// Test double logging every command and tracking which ids are alive.
    #[derive(Debug, Default)]
    pub struct RecordingBackend {
        pub calls: Vec<RenderCall>,
        pub live: BTreeSet<VisualId>,
        pub draws: usize,
        /// Number of upcoming draws that fail.
        pub failing_draws: usize,
        pub loading: bool,
        pub last_camera: Option<CameraRig>,
    }

    impl RecordingBackend {
        pub fn live_models(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, RenderCall::SpawnModel(id, _) if self.live.contains(id)))
                .count()
        }

        pub fn clear_calls(&mut self) {
            self.calls.clear();
        }
    }

    impl RenderBackend for RecordingBackend {
        fn spawn_surface(&mut self, id: VisualId, _surface: &BaseSurface) {
            self.live.insert(id);
            self.calls.push(RenderCall::SpawnSurface(id));
        }

        fn spawn_model(&mut self, id: VisualId, scene: &ModelScene) {
            self.live.insert(id);
            self.calls.push(RenderCall::SpawnModel(id, scene.id.clone()));
        }

        fn spawn_debug_mesh(&mut self, id: VisualId, _shape: &ColliderShapeDef, _pose: Iso) {
            self.live.insert(id);
            self.calls.push(RenderCall::SpawnDebugMesh(id));
        }

        fn despawn(&mut self, id: VisualId) {
            assert!(self.live.remove(&id), "despawn of unknown visual {id:?}");
            self.calls.push(RenderCall::Despawn(id));
        }

        fn set_pose(&mut self, id: VisualId, _pose: Iso) {
            assert!(self.live.contains(&id), "pose for unknown visual {id:?}");
            self.calls.push(RenderCall::SetPose(id));
        }

        fn set_debug_visible(&mut self, visible: bool) {
            self.calls.push(RenderCall::SetDebugVisible(visible));
        }

        fn set_camera(&mut self, rig: &CameraRig) {
            self.last_camera = Some(*rig);
            self.calls.push(RenderCall::SetCamera);
        }

        fn set_lighting(&mut self, _lighting: &LightingState) {
            self.calls.push(RenderCall::SetLighting);
        }

        fn set_loading(&mut self, loading: bool) {
            self.loading = loading;
            self.calls.push(RenderCall::SetLoading(loading));
        }

        fn resize(&mut self, width: f32, height: f32) {
            self.calls.push(RenderCall::Resize(width, height));
        }

        fn draw(&mut self) -> Result<(), RenderError> {
            if self.failing_draws > 0 {
                self.failing_draws -= 1;
                return Err(RenderError::SurfaceLost);
            }
            self.draws += 1;
            self.calls.push(RenderCall::Draw);
            Ok(())
        }
    }
}
