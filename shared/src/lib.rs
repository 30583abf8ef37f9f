pub mod bitmask_flags;
pub mod camera_rig;
pub mod colliders;
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod input;
pub mod lighting;
pub mod loader;
pub mod materials;
pub mod physics;
pub mod rapier;
pub mod render;
pub mod scene;
pub mod session;
pub mod terrain;
pub mod timestep;
pub mod types;

pub use rapier3d;

pub use camera_rig::CameraRig;
pub use colliders::{ColliderBuildReport, build_model_colliders};
pub use config::{ColliderStrategy, GroundLayout, JoystickMode, LightingMode, ViewerConfig};
pub use environment::BaseSurface;
pub use error::{AssetError, ConfigError, GeometryError, RenderError, SessionError};
pub use input::{InputState, LookCapture, MoveFlag};
pub use lighting::{LightingState, Rgb};
pub use loader::{LoadCompleter, LoadRequest, ModelCatalog};
pub use materials::SurfaceMaterial;
pub use physics::PhysicsWorld;
pub use rapier::{ColliderShapeDef, StaticColliderDef, collider_from_def};
pub use render::{RenderBackend, VisualId};
pub use scene::{MeshGeometry, ModelScene, SceneNode};
pub use session::{FrameOutcome, FrameSkip, SessionState, ViewerSession};
