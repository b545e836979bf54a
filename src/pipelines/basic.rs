use crate::data_structures::{
    instance::InstanceRaw,
    model::{self, Vertex},
    texture::Texture,
};

/// Opaque surfaces: baked and matcap materials.
pub fn mk_basic_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    material_bind_group_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Surface Pipeline Layout"),
        bind_group_layouts: &[material_bind_group_layout, camera_bind_group_layout],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Surface Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("surface.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        &render_pipeline_layout,
        config.format,
        Some(wgpu::BlendState {
            alpha: wgpu::BlendComponent::REPLACE,
            color: wgpu::BlendComponent::REPLACE,
        }),
        Some(Texture::DEPTH_FORMAT),
        &[model::ModelVertex::desc(), InstanceRaw::desc()],
        shader,
        RasterOptions::default(),
    )
}

/// Culling and depth writes, the knobs that differ between the pipelines.
#[derive(Clone, Copy, Debug)]
pub struct RasterOptions {
    pub cull_mode: Option<wgpu::Face>,
    pub depth_write_enabled: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            cull_mode: Some(wgpu::Face::Back),
            depth_write_enabled: true,
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_format: Option<wgpu::TextureFormat>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: wgpu::ShaderModuleDescriptor,
    raster: RasterOptions,
) -> wgpu::RenderPipeline {
    let label = shader.label;
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label,
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: raster.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: raster.depth_write_enabled,
            // The sky sits exactly on the far plane
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
