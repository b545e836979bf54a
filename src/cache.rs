//! Lazily constructed, memoized scene resources.
//!
//! Every accessor builds its resource on the first call and returns the same
//! instance afterwards; arguments passed to later calls are ignored. The only
//! way to change a cached resource is [`ResourceCache::resize`].

use std::sync::Arc;

use winit::window::Window;

use crate::{
    camera::{Camera, OrbitControls},
    config::{CameraConfig, ControlsConfig},
    context::Context,
    data_structures::scene_graph::Scene,
    error::{SceneError, SceneResult},
    render::{MaterialTextures, Materials},
};

/// Upper bound on the device pixel ratio the surface renders at.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Viewport in logical pixels plus the capped device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sizes {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl Sizes {
    pub fn new(width: u32, height: u32, scale_factor: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio: scale_factor.clamp(f64::EPSILON, MAX_PIXEL_RATIO),
        }
    }

    /// Surface size in physical pixels.
    pub fn physical(&self) -> (u32, u32) {
        (
            (self.width as f64 * self.pixel_ratio).round() as u32,
            (self.height as f64 * self.pixel_ratio).round() as u32,
        )
    }
}

/// Render-side borrows for one frame.
pub struct RenderParts<'a> {
    pub scene: &'a Scene,
    pub camera: &'a Camera,
    pub renderer: &'a mut Context,
    pub materials: &'a Materials,
}

#[derive(Default)]
pub struct ResourceCache {
    sizes: Option<Sizes>,
    scene: Option<Scene>,
    camera: Option<Camera>,
    controls: Option<OrbitControls>,
    window: Option<Arc<Window>>,
    renderer: Option<Context>,
    materials: Option<Materials>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sizes(&mut self, width: u32, height: u32, scale_factor: f64) -> Sizes {
        *self
            .sizes
            .get_or_insert_with(|| Sizes::new(width, height, scale_factor))
    }

    pub fn scene(&mut self) -> &mut Scene {
        self.scene.get_or_insert_with(Scene::new)
    }

    pub fn camera(&mut self, config: &CameraConfig, sizes: Sizes) -> &mut Camera {
        self.camera
            .get_or_insert_with(|| Camera::new(config, sizes.width, sizes.height))
    }

    pub fn controls(&mut self, config: &ControlsConfig) -> &mut OrbitControls {
        let height = self.sizes.map(|sizes| sizes.physical().1);
        self.controls.get_or_insert_with(|| {
            let mut controls = OrbitControls::new(config);
            if let Some(height) = height {
                controls.set_viewport_height(height);
            }
            controls
        })
    }

    /// The window or canvas everything is drawn into.
    pub fn surface(&mut self, window: Option<Arc<Window>>) -> SceneResult<Arc<Window>> {
        if self.window.is_none() {
            self.window = window;
        }
        self.window.clone().ok_or(SceneError::MissingSurface)
    }

    /// The GPU context, created against the cached surface on first use.
    pub async fn renderer(
        &mut self,
        window: Option<Arc<Window>>,
        clear_colour: wgpu::Color,
    ) -> SceneResult<&mut Context> {
        if self.renderer.is_none() {
            let window = self.surface(window)?;
            let scale_factor = window.scale_factor();
            let size = window.inner_size().to_logical::<u32>(scale_factor);
            let sizes = self.sizes(size.width, size.height, scale_factor);
            let camera = match &self.camera {
                Some(camera) => camera.clone(),
                None => Camera::new(&CameraConfig::default(), sizes.width, sizes.height),
            };
            let ctx = Context::new(window, sizes.physical(), &camera, clear_colour)
                .await
                .map_err(SceneError::Gpu)?;
            self.renderer = Some(ctx);
        }
        self.renderer.as_mut().ok_or(SceneError::MissingSurface)
    }

    /// Material bind groups; needs the renderer.
    pub fn materials(&mut self, textures: &MaterialTextures<'_>, glass_tint: [f32; 4]) -> SceneResult<&mut Materials> {
        if self.materials.is_none() {
            let ctx = self.renderer.as_ref().ok_or(SceneError::MissingSurface)?;
            let materials = Materials::new(ctx, textures, glass_tint).map_err(SceneError::Gpu)?;
            self.materials = Some(materials);
        }
        self.materials.as_mut().ok_or(SceneError::MissingSurface)
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn current_sizes(&self) -> Option<Sizes> {
        self.sizes
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.window.as_ref()
    }

    /// Applies a new viewport in logical pixels. Zero-sized viewports are ignored.
    pub fn resize(&mut self, width: u32, height: u32, scale_factor: f64) {
        if width == 0 || height == 0 {
            return;
        }
        let sizes = Sizes::new(width, height, scale_factor);
        self.sizes = Some(sizes);
        let (physical_width, physical_height) = sizes.physical();
        if let Some(camera) = &mut self.camera {
            camera.projection.resize(width, height);
        }
        if let Some(controls) = &mut self.controls {
            controls.set_viewport_height(physical_height);
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(physical_width, physical_height);
        }
    }

    /// Scene, camera and controls at once, if all three exist.
    pub fn stage_parts(&mut self) -> Option<(&mut Scene, &mut Camera, &mut OrbitControls)> {
        match (&mut self.scene, &mut self.camera, &mut self.controls) {
            (Some(scene), Some(camera), Some(controls)) => Some((scene, camera, controls)),
            _ => None,
        }
    }

    pub fn render_parts(&mut self) -> Option<RenderParts<'_>> {
        match (&self.scene, &self.camera, &mut self.renderer, &self.materials) {
            (Some(scene), Some(camera), Some(renderer), Some(materials)) => Some(RenderParts {
                scene,
                camera,
                renderer,
                materials,
            }),
            _ => None,
        }
    }
}
