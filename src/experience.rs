//! The experience: load, assemble, animate, draw.
//!
//! One [`Experience`] owns every resource of the scene through its
//! [`ResourceCache`]. It is constructed once by the event loop application
//! and driven from there:
//!
//! 1. [`Experience::initialize`] loads all assets, assembles the scene and,
//!    when a window is given, creates the renderer. It runs at most once.
//! 2. [`Experience::tick`] is called every redraw: it advances the clock,
//!    the sequences and the orbit controls, resolves what the camera looks
//!    at and draws a frame.
//! 3. The trip commands ([`start_engine`](Experience::start_engine),
//!    [`fly_aircraft`](Experience::fly_aircraft),
//!    [`end_flight_trip`](Experience::end_flight_trip)) are forwarded to the
//!    [`FlightSequencer`].
//!
//! Without a window the experience runs headless: everything but drawing
//! happens.

use std::sync::Arc;

use futures::StreamExt;
use instant::Instant;
use winit::window::Window;

use crate::{
    animation::Stage,
    assembler::{self, AircraftParts},
    cache::ResourceCache,
    camera::LookAt,
    config::Config,
    error::{SceneError, SceneResult},
    render::{FrameDraws, GpuScene, MaterialTextures},
    resources::{AssetId, AssetLoader, Fetch, LoadEvent, LoadedAssets},
    sequencer::{FlightSequencer, Rig, TripState},
    ui::{LoadingScreen, Overlay},
};

/// A trip command from the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    StartEngine,
    Fly,
    EndTrip,
}

/// Monotonic frame clock.
#[derive(Debug)]
pub struct Clock {
    last: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }

    /// Seconds since the previous call.
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;
        dt.as_secs_f32()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Experience {
    config: Config,
    fetch: Box<dyn Fetch>,
    overlay: Box<dyn Overlay>,
    cache: ResourceCache,
    loading: LoadingScreen,
    parts: Option<AircraftParts>,
    sequencer: Option<FlightSequencer>,
    gpu: Option<GpuScene>,
    clock: Clock,
    started: bool,
    ready: bool,
}

impl Experience {
    pub fn new(config: Config, fetch: Box<dyn Fetch>, overlay: Box<dyn Overlay>) -> Self {
        Self {
            config,
            fetch,
            overlay,
            cache: ResourceCache::new(),
            loading: LoadingScreen::new(),
            parts: None,
            sequencer: None,
            gpu: None,
            clock: Clock::new(),
            started: false,
            ready: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ResourceCache {
        &mut self.cache
    }

    pub fn parts(&self) -> Option<AircraftParts> {
        self.parts
    }

    pub fn sequencer(&self) -> Option<&FlightSequencer> {
        self.sequencer.as_ref()
    }

    pub fn trip_state(&self) -> TripState {
        self.sequencer.as_ref().map_or(TripState::Idle, FlightSequencer::state)
    }

    /// Assets are in the scene and the trip commands are live.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Loads and assembles everything. Only the first call does any work.
    ///
    /// Any error leaves the experience not ready for good; there are no retries.
    pub async fn initialize(&mut self, window: Option<Arc<Window>>) -> SceneResult<()> {
        if self.started {
            log::debug!("Experience already initialized");
            return Ok(());
        }
        self.started = true;

        let sizes = match &window {
            Some(window) => {
                let scale_factor = window.scale_factor();
                let size = window.inner_size().to_logical::<u32>(scale_factor);
                self.cache.sizes(size.width, size.height, scale_factor)
            }
            None => {
                let (width, height) = self.config.viewport;
                self.cache.sizes(width, height, 1.0)
            }
        };
        if let Some(window) = &window {
            self.cache.surface(Some(window.clone()))?;
        }
        self.cache.scene();
        self.cache.camera(&self.config.camera, sizes);
        self.cache.controls(&self.config.controls);

        let assets = self.load_assets().await?;
        let LoadedAssets {
            model,
            header_text,
            banner_text,
            baked,
            matcap,
            env_map,
        } = *assets;

        let scene = self.cache.scene();
        let parts = assembler::assemble(model, scene, &self.config.model)?;
        let header = assembler::place_text(header_text, scene, &self.config.header_text);
        let banner = assembler::place_text(banner_text, scene, &self.config.banner_text);
        scene.update_world_transforms();
        let rig = Rig {
            main: parts.main,
            fan: parts.fan,
            header,
            banner,
        };
        self.sequencer = Some(FlightSequencer::new(rig, scene));
        self.parts = Some(parts);

        match window {
            Some(window) => {
                self.cache
                    .renderer(Some(window), self.config.clear_colour)
                    .await?;
                let textures = MaterialTextures {
                    baked: &baked,
                    matcap: &matcap,
                    env_map: &env_map,
                };
                self.cache.materials(&textures, self.config.glass_tint)?;
                if let Some(render) = self.cache.render_parts() {
                    self.gpu = Some(GpuScene::new(render.renderer, render.scene));
                }
            }
            None => log::info!("No surface given, running headless"),
        }

        self.loading.reveal(self.overlay.as_mut());
        self.ready = true;
        log::info!("Experience ready");
        Ok(())
    }

    async fn load_assets(&mut self) -> SceneResult<Box<LoadedAssets>> {
        let loader = AssetLoader::new(self.fetch.as_ref(), &self.config.assets);
        let mut events = std::pin::pin!(loader.load_all());
        let mut complete = None;
        while let Some(event) = events.next().await {
            match event? {
                LoadEvent::Progress(progress) => self.loading.report(&progress, self.overlay.as_mut()),
                LoadEvent::Complete(assets) => complete = Some(assets),
            }
        }
        complete.ok_or_else(|| SceneError::AssetLoad {
            asset_id: AssetId::Model,
            cause: anyhow::anyhow!("asset stream ended without completing"),
        })
    }

    pub fn command(&mut self, command: Command) -> bool {
        match command {
            Command::StartEngine => self.start_engine(),
            Command::Fly => self.fly_aircraft(),
            Command::EndTrip => self.end_flight_trip(),
        }
    }

    pub fn start_engine(&mut self) -> bool {
        match self.sequencer.as_mut() {
            Some(sequencer) if self.ready => sequencer.start_engine(),
            _ => {
                log::debug!("Ignoring start engine before the experience is ready");
                false
            }
        }
    }

    pub fn fly_aircraft(&mut self) -> bool {
        let ready = self.ready;
        match (self.sequencer.as_mut(), self.cache.stage_parts()) {
            (Some(sequencer), Some((scene, _, _))) if ready => sequencer.fly(scene),
            _ => {
                log::debug!("Ignoring fly before the experience is ready");
                false
            }
        }
    }

    pub fn end_flight_trip(&mut self) -> bool {
        let ready = self.ready;
        match (self.sequencer.as_mut(), self.cache.stage_parts()) {
            (Some(sequencer), Some((scene, camera, _))) if ready => sequencer.end_trip(scene, camera),
            _ => {
                log::debug!("Ignoring end trip before the experience is ready");
                false
            }
        }
    }

    /// Moves the scene forward by `dt` seconds without drawing.
    ///
    /// Sequences run first, then the orbit controls, then the camera is
    /// pointed at its current look-at target.
    pub fn advance(&mut self, dt: f32) {
        if !self.ready {
            return;
        }
        let Some((scene, camera, controls)) = self.cache.stage_parts() else {
            return;
        };
        if let Some(sequencer) = self.sequencer.as_mut() {
            let mut stage = Stage {
                scene,
                camera,
                overlay: self.overlay.as_mut(),
            };
            sequencer.advance(dt, &mut stage);
        }
        controls.update(camera);
        scene.update_world_transforms();

        let followed = self.sequencer.as_ref().map(|sequencer| {
            let rig = sequencer.rig();
            match camera.looks_at {
                LookAt::Aircraft => rig.main,
                LookAt::Text => rig.banner,
            }
        });
        if let Some(target) = followed.and_then(|id| scene.world_position(id)) {
            camera.target = target;
        }
    }

    /// One frame: advance by the time since the last tick, then draw.
    pub fn tick(&mut self) -> Result<(), wgpu::SurfaceError> {
        let dt = self.clock.delta();
        self.advance(dt);
        self.draw()
    }

    fn draw(&mut self) -> Result<(), wgpu::SurfaceError> {
        let (Some(gpu), Some(render)) = (self.gpu.as_mut(), self.cache.render_parts()) else {
            return Ok(());
        };
        render.renderer.camera.write(&render.renderer.queue, render.camera);
        let frame = FrameDraws::collect(render.scene, render.camera.position);
        match gpu.render(render.renderer, render.materials, &frame) {
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {}
            result => return result,
        }
        if let Some(window) = self.window().cloned() {
            let size = window.inner_size();
            self.resize(size.width, size.height, window.scale_factor());
        }
        Ok(())
    }

    /// Viewport change in physical pixels. The pixel ratio is capped by the cache.
    pub fn resize(&mut self, width: u32, height: u32, scale_factor: f64) {
        let size = winit::dpi::PhysicalSize::new(width, height).to_logical::<u32>(scale_factor);
        self.cache.resize(size.width, size.height, scale_factor);
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.cache.window()
    }

    pub fn handle_window_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        match self.cache.stage_parts() {
            Some((_, _, controls)) => controls.handle_window_events(event),
            None => false,
        }
    }
}
