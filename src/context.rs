//! GPU and window context: device, queue, surface, depth buffer and pipelines.

use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources},
    data_structures::texture,
    pipelines::Pipelines,
    resources::texture::{cube_layout, material_layout},
};

#[derive(Debug)]
pub struct Layouts {
    pub material: wgpu::BindGroupLayout,
    pub environment: wgpu::BindGroupLayout,
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub layouts: Layouts,
    pub pipelines: Pipelines,
    pub clear_colour: wgpu::Color,
    is_surface_configured: bool,
}

impl Context {
    /// Creates the surface for `window` at `size` physical pixels.
    pub async fn new(
        window: Arc<Window>,
        size: (u32, u32),
        camera: &Camera,
        clear_colour: wgpu::Color,
    ) -> anyhow::Result<Self> {
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating the window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no graphics adapter can present to this surface")?;

        log::info!("Device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                ..Default::default()
            })
            .await
            .context("requesting a device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders write linear colour and rely on an sRGB surface to encode it
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface supports no texture format")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.0.max(1),
            height: size.1.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera = CameraResources::new(&device, camera);
        let layouts = Layouts {
            material: material_layout(&device),
            environment: cube_layout(&device),
        };
        let pipelines = Pipelines::new(
            &device,
            &config,
            &layouts.material,
            &layouts.environment,
            &camera.bind_group_layout,
        );
        let depth_texture =
            texture::Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        let mut ctx = Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            layouts,
            pipelines,
            clear_colour,
            is_surface_configured: false,
        };
        ctx.resize(size.0, size.1);
        Ok(ctx)
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn is_surface_configured(&self) -> bool {
        self.is_surface_configured
    }

    /// Reconfigures the surface and depth buffer. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            texture::Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
        self.is_surface_configured = true;
    }
}
