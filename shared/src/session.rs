/*!
The viewer session: owner of the physics world, camera rig, input, lighting, render backend and
the loaded environment.

Lifecycle: `Uninitialized` → [`ViewerSession::start`] → `Running` → [`ViewerSession::dispose`]
→ `Disposed`. A disposed session never runs again.

Per frame ([`ViewerSession::frame`])
1. drain finished loads and apply the current one
2. read the movement intent and overwrite the player's horizontal velocity
3. step physics (bounded substeps)
4. move the yaw node to the player's eye
5. apply the look delta, then zero it
6. copy body poses onto debug meshes when they are visible
7. advance lighting (day-night mode), push the camera, draw

Nothing inside a frame propagates an error. A failed draw skips the frame; the host keeps
calling `frame` on its own schedule.
*/

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    camera_rig::CameraRig,
    colliders::build_model_colliders,
    config::{LightingMode, ViewerConfig},
    constants::PLAYER_RADIUS,
    environment::{LoadedEnvironment, base_geometry, player_spawn},
    error::{RenderError, SessionError},
    input::{InputState, Joystick},
    lighting::DayNightCycle,
    loader::{LoadCompletion, LoadInbox, LoadRequest, LoadTicket, ModelCatalog, model_path},
    physics::{BodyHandle, PhysicsWorld},
    rapier::ColliderShapeDef,
    render::{RenderBackend, VisualId, VisualIds},
    types::{Iso, Vec2, Vec3},
};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Running,
    Disposed,
}

/// Why a frame did nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameSkip {
    NotRunning,
    Render(RenderError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Rendered { substeps: u32 },
    Skipped(FrameSkip),
}

pub struct ViewerSession<B: RenderBackend> {
    id: u64,
    config: ViewerConfig,
    state: SessionState,
    backend: B,
    world: PhysicsWorld,
    rig: CameraRig,
    input: InputState,
    joystick: Joystick,
    day_night: Option<DayNightCycle>,
    catalog: ModelCatalog,
    environment: Option<LoadedEnvironment>,
    /// Base geometry bodies and their visuals.
    base: Vec<(BodyHandle, VisualId)>,
    player_debug: Option<VisualId>,
    ids: VisualIds,
    inbox: LoadInbox,
    generation: u64,
    pending: Option<LoadTicket>,
    debug_visible: bool,
    last_elapsed: Option<f32>,
}

impl<B: RenderBackend> ViewerSession<B> {
    pub fn new(config: ViewerConfig, backend: B) -> Self {
        let world = PhysicsWorld::new(config.fixed_delta, config.max_substeps);
        let rig = CameraRig::new(config.pitch_limit_rad());
        let joystick = Joystick {
            mode: config.joystick,
            dead_zone: config.joystick_dead_zone,
            radius: config.joystick_radius,
        };
        let day_night = match config.lighting {
            LightingMode::DayNight => Some(DayNightCycle::new(
                config.day_start_hour,
                config.day_hours_per_frame,
            )),
            LightingMode::Hdr => None,
        };

        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            debug_visible: config.debug_colliders,
            config,
            state: SessionState::Uninitialized,
            backend,
            world,
            rig,
            input: InputState::default(),
            joystick,
            day_night,
            catalog: ModelCatalog::default(),
            environment: None,
            base: Vec::new(),
            player_debug: None,
            ids: VisualIds::default(),
            inbox: LoadInbox::default(),
            generation: 0,
            pending: None,
            last_elapsed: None,
        }
    }

    /// Build base geometry and the player, then start accepting frames.
    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Running => return Ok(()),
            SessionState::Disposed => return Err(SessionError::Disposed),
            SessionState::Uninitialized => {}
        }

        for surface in base_geometry(self.config.ground) {
            match self.world.add_static(&surface.def) {
                Ok(body) => {
                    let visual = self.ids.allocate();
                    self.backend.spawn_surface(visual, &surface);
                    self.base.push((body, visual));
                }
                Err(err) => log::error!("base geometry rejected: {err}"),
            }
        }

        let spawn = player_spawn(self.config.ground);
        match self.world.add_player(spawn) {
            Ok(body) => {
                let visual = self.ids.allocate();
                let pose = self.world.body_pose(body).unwrap_or_else(Iso::identity);
                self.backend.spawn_debug_mesh(
                    visual,
                    &ColliderShapeDef::Sphere {
                        radius: PLAYER_RADIUS,
                    },
                    pose,
                );
                self.player_debug = Some(visual);
            }
            Err(err) => log::error!("player body rejected: {err}"),
        }
        self.rig.follow(spawn, self.config.eye_offset);

        self.backend.set_debug_visible(self.debug_visible);
        if let Some(cycle) = &self.day_night {
            self.backend
                .set_lighting(&DayNightCycle::lighting_at(cycle.hour()));
        }
        self.backend.set_camera(&self.rig);

        self.state = SessionState::Running;
        log::info!(
            "viewer session {} started ({:?}, {:?}, {:?})",
            self.id,
            self.config.ground,
            self.config.lighting,
            self.config.colliders
        );
        Ok(())
    }

    /// Replace the model list. Selects the first model when nothing is loaded yet.
    pub fn set_catalog(&mut self, catalog: ModelCatalog) -> Option<LoadRequest> {
        self.catalog = catalog;
        if self.catalog.is_empty() {
            log::info!("model list is empty; nothing to load");
            return None;
        }
        if self.environment.is_some() || self.pending.is_some() {
            return None;
        }
        self.select_model(0).ok()
    }

    /// Issue a load for `index`. Any earlier in-flight load becomes stale.
    pub fn select_model(&mut self, index: usize) -> Result<LoadRequest, SessionError> {
        if self.state == SessionState::Disposed {
            return Err(SessionError::Disposed);
        }
        let id = self
            .catalog
            .get(index)
            .ok_or(SessionError::NoSuchModel {
                index,
                len: self.catalog.len(),
            })?
            .to_owned();

        self.generation += 1;
        let ticket = LoadTicket {
            session: self.id,
            generation: self.generation,
            model_index: index,
            model_id: id.clone(),
        };
        self.pending = Some(ticket.clone());
        self.backend.set_loading(true);
        log::info!("loading model `{id}` (generation {})", self.generation);

        Ok(LoadRequest {
            path: model_path(&self.config.assets.models_dir, &id),
            completer: self.inbox.completer(ticket),
        })
    }

    /// Run one frame at absolute time `elapsed` (seconds).
    pub fn frame(&mut self, elapsed: f32) -> FrameOutcome {
        if self.state != SessionState::Running {
            return FrameOutcome::Skipped(FrameSkip::NotRunning);
        }

        for completion in self.inbox.drain() {
            self.apply_completion(completion);
        }

        let delta = match self.last_elapsed.replace(elapsed) {
            Some(prev) => elapsed - prev,
            None => 0.0,
        };

        let intent = self.input.movement_intent();
        self.world
            .apply_player_motion(intent, self.rig.yaw(), self.config.walk_speed);
        let substeps = self.world.step(delta);

        if let Some(center) = self.world.player_position() {
            self.rig.follow(center, self.config.eye_offset);
        }

        let look = self.input.take_look_delta();
        self.rig.apply_look(look, self.config.look_sensitivity);

        if self.debug_visible {
            self.sync_debug_meshes();
        }

        if let Some(cycle) = &mut self.day_night {
            let lighting = cycle.advance();
            self.backend.set_lighting(&lighting);
        }
        self.backend.set_camera(&self.rig);

        match self.backend.draw() {
            Ok(()) => FrameOutcome::Rendered { substeps },
            Err(err) => {
                log::debug!("frame skipped: {err}");
                FrameOutcome::Skipped(FrameSkip::Render(err))
            }
        }
    }

    fn sync_debug_meshes(&mut self) {
        if let Some(env) = &self.environment {
            env.sync_debug_meshes(&self.world, &mut self.backend);
        }
        if let (Some(visual), Some(body)) = (self.player_debug, self.world.player()) {
            if let Some(pose) = self.world.body_pose(body) {
                self.backend.set_pose(visual, pose);
            }
        }
    }

    fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.session == self.id
            && ticket.generation == self.generation
            && self.pending.as_ref() == Some(ticket)
    }

    fn apply_completion(&mut self, completion: LoadCompletion) {
        let LoadCompletion { ticket, result } = completion;
        if self.state != SessionState::Running || !self.is_current(&ticket) {
            log::debug!(
                "discarding stale load of `{}` (session {}, generation {})",
                ticket.model_id,
                ticket.session,
                ticket.generation
            );
            return;
        }

        self.pending = None;
        self.backend.set_loading(false);

        let scene = match result {
            Ok(scene) => scene,
            Err(err) => {
                log::error!("failed to load `{}`: {err}", ticket.model_id);
                return;
            }
        };

        let report = build_model_colliders(
            &scene,
            self.config.colliders,
            &self.config.collision_filter,
        );

        if let Some(previous) = self.environment.take() {
            previous.teardown(&mut self.world, &mut self.backend);
        }
        self.environment = Some(LoadedEnvironment::install(
            &scene,
            ticket.model_index,
            &report,
            &mut self.world,
            &mut self.backend,
            &mut self.ids,
        ));
    }

    pub fn set_debug_visible(&mut self, visible: bool) {
        if self.debug_visible != visible {
            self.debug_visible = visible;
            self.backend.set_debug_visible(visible);
        }
    }

    pub fn toggle_debug(&mut self) {
        self.set_debug_visible(!self.debug_visible);
    }

    /// Forward a viewport resize. Ignored unless running.
    pub fn resize(&mut self, width: f32, height: f32) {
        if self.state == SessionState::Running {
            self.backend.resize(width, height);
        }
    }

    /// Route a movement-joystick drag through the configured joystick mode.
    pub fn joystick_moved(&mut self, displacement: Vec2) {
        let stick = self.joystick;
        self.input.apply_joystick(&stick, displacement);
    }

    pub fn joystick_released(&mut self) {
        self.input.release_all_moves();
    }

    /// Release the environment, base geometry and player. Idempotent.
    pub fn dispose(&mut self) {
        if self.state == SessionState::Disposed {
            return;
        }

        if let Some(env) = self.environment.take() {
            env.teardown(&mut self.world, &mut self.backend);
        }
        for (body, visual) in self.base.drain(..) {
            self.world.remove_body(body);
            self.backend.despawn(visual);
        }
        if let Some(body) = self.world.player() {
            self.world.remove_body(body);
        }
        if let Some(visual) = self.player_debug.take() {
            self.backend.despawn(visual);
        }
        if self.pending.take().is_some() {
            self.backend.set_loading(false);
        }

        self.state = SessionState::Disposed;
        log::info!("viewer session {} disposed", self.id);
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[inline]
    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    #[inline]
    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    #[inline]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    #[inline]
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    #[inline]
    pub fn environment(&self) -> Option<&LoadedEnvironment> {
        self.environment.as_ref()
    }

    /// Index of the model currently installed.
    pub fn active_model(&self) -> Option<usize> {
        self.environment.as_ref().map(|e| e.model_index)
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    #[inline]
    pub fn debug_visible(&self) -> bool {
        self.debug_visible
    }

    /// Number of base geometry bodies.
    #[inline]
    pub fn base_body_count(&self) -> usize {
        self.base.len()
    }

    pub fn player_position(&self) -> Option<Vec3> {
        self.world.player_position()
    }
}
