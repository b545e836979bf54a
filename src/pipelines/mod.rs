//! Render pipelines.
//!
//! - `basic` draws opaque surfaces and holds the shared pipeline builder
//! - `transparent` draws glass and faded surfaces with alpha blending
//! - `skybox` draws the environment cube map behind everything

pub mod basic;
pub mod skybox;
pub mod transparent;

#[derive(Debug)]
pub struct Pipelines {
    pub basic: wgpu::RenderPipeline,
    pub transparent: wgpu::RenderPipeline,
    pub skybox: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        material_layout: &wgpu::BindGroupLayout,
        environment_layout: &wgpu::BindGroupLayout,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            basic: basic::mk_basic_pipeline(device, config, material_layout, camera_layout),
            transparent: transparent::mk_transparent_pipeline(device, config, material_layout, camera_layout),
            skybox: skybox::mk_skybox_pipeline(device, config, environment_layout, camera_layout),
        }
    }
}
