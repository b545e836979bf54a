use crate::{
    data_structures::texture::Texture,
    pipelines::basic::{RasterOptions, mk_render_pipeline},
};

/// Full-screen triangle sampling the environment cube map.
///
/// Drawn first with depth writes off, so everything else covers it.
pub fn mk_skybox_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    environment_bind_group_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Skybox Pipeline Layout"),
        bind_group_layouts: &[environment_bind_group_layout, camera_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Skybox Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("skybox.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &render_pipeline_layout,
        config.format,
        None,
        Some(Texture::DEPTH_FORMAT),
        &[],
        shader,
        RasterOptions {
            cull_mode: None,
            depth_write_enabled: false,
        },
    )
}
