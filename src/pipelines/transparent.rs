use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::basic::{RasterOptions, mk_render_pipeline},
};

/**
 * Same shader as the basic pipeline, alpha blended.
 *
 * Used for the glass parts and for anything faded below full opacity (the
 * header text while it disappears). Both faces are drawn and depth is tested
 * but not written, so draws must be issued back to front.
 */
pub fn mk_transparent_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    material_bind_group_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Transparent Pipeline Layout"),
        bind_group_layouts: &[material_bind_group_layout, camera_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Transparent Surface Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("surface.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &render_pipeline_layout,
        config.format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        Some(Texture::DEPTH_FORMAT),
        &[ModelVertex::desc(), InstanceRaw::desc()],
        shader,
        RasterOptions {
            cull_mode: None,
            depth_write_enabled: false,
        },
    )
}
