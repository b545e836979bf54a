//! Frame composition and draw batching.
//!
//! Each frame the scene is flattened into [`Draw`]s: one per visible node
//! with a mesh, in two batches. Opaque draws come first; transparent draws
//! follow sorted back to front. All instance data of a frame lives in one
//! instance buffer, each draw addresses its slot by instance range.
//!
//! # Key types
//!
//! - [`Materials`] holds the bind groups for baked, glass and matcap surfaces and the sky
//! - [`GpuScene`] holds uploaded meshes and the per-frame instance buffer
//! - [`FrameDraws`] is the CPU-side result of batching, independent of the GPU

use std::iter;

use cgmath::{MetricSpace, Point3};
use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        instance::InstanceRaw,
        model::{DrawModel, Mesh},
        scene_graph::{MaterialKind, Scene},
        texture::Texture,
    },
};

const MODE_BAKED: u32 = 0;
const MODE_MATCAP: u32 = 1;
const MODE_TINT: u32 = 2;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
    tint: [f32; 4],
    mode: u32,
    _padding: [u32; 3],
}

#[derive(Debug)]
pub struct MaterialBinding {
    pub bind_group: wgpu::BindGroup,
    #[allow(unused)]
    texture: Texture,
    #[allow(unused)]
    uniform: wgpu::Buffer,
}

impl MaterialBinding {
    fn new(ctx: &Context, label: &str, texture: Texture, tint: [f32; 4], mode: u32) -> Self {
        let uniform = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[MaterialUniform {
                tint,
                mode,
                _padding: [0; 3],
            }]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let sampler = texture
            .sampler
            .clone()
            .unwrap_or_else(|| crate::data_structures::texture::create_default_sampler(&ctx.device));
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &ctx.layouts.material,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform.as_entire_binding(),
                },
            ],
            label: Some(label),
        });
        Self {
            bind_group,
            texture,
            uniform,
        }
    }
}

/// Decoded images the materials are built from.
pub struct MaterialTextures<'a> {
    pub baked: &'a RgbaImage,
    pub matcap: &'a RgbaImage,
    pub env_map: &'a [RgbaImage; 6],
}

#[derive(Debug)]
pub struct Materials {
    pub baked: MaterialBinding,
    pub glass: MaterialBinding,
    pub matcap: MaterialBinding,
    pub environment: wgpu::BindGroup,
    #[allow(unused)]
    environment_texture: Texture,
}

impl Materials {
    pub fn new(ctx: &Context, textures: &MaterialTextures<'_>, glass_tint: [f32; 4]) -> anyhow::Result<Self> {
        let baked = Texture::from_image(&ctx.device, &ctx.queue, textures.baked, Some("baked"), false);
        let matcap = Texture::from_image(&ctx.device, &ctx.queue, textures.matcap, Some("matcap"), false);
        let white = Texture::solid(&ctx.device, &ctx.queue, [255; 4]);
        let environment_texture = Texture::cube(&ctx.device, &ctx.queue, textures.env_map, "environment")?;
        let env_sampler = environment_texture
            .sampler
            .clone()
            .unwrap_or_else(|| crate::data_structures::texture::create_default_sampler(&ctx.device));

        let environment = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &ctx.layouts.environment,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&environment_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&env_sampler),
                },
            ],
            label: Some("environment_bind_group"),
        });

        Ok(Self {
            baked: MaterialBinding::new(ctx, "baked material", baked, [1.0; 4], MODE_BAKED),
            glass: MaterialBinding::new(ctx, "glass material", white, glass_tint, MODE_TINT),
            matcap: MaterialBinding::new(ctx, "matcap material", matcap, [1.0; 4], MODE_MATCAP),
            environment,
            environment_texture,
        })
    }

    pub fn get(&self, kind: MaterialKind) -> &MaterialBinding {
        match kind {
            MaterialKind::Baked => &self.baked,
            MaterialKind::Glass => &self.glass,
            MaterialKind::Matcap => &self.matcap,
        }
    }
}

/// One mesh draw with its slot in the frame's instance buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Draw {
    pub mesh: usize,
    pub material: MaterialKind,
    pub instance: u32,
}

#[derive(Debug, Default)]
pub struct FrameDraws {
    pub opaque: Vec<Draw>,
    /// Farthest first.
    pub transparent: Vec<Draw>,
    pub instances: Vec<InstanceRaw>,
}

impl FrameDraws {
    /// Batches every visible mesh node of `scene` as seen from `eye`.
    ///
    /// Expects world transforms to be current. Nodes faded to zero are skipped.
    pub fn collect(scene: &Scene, eye: Point3<f32>) -> Self {
        let mut frame = FrameDraws::default();
        let mut transparent = Vec::new();
        for (_, node) in scene.nodes() {
            let Some(mesh) = node.mesh else {
                continue;
            };
            if node.world_opacity() <= 0.0 || scene.meshes().get(mesh).is_none_or(|m| m.is_empty()) {
                continue;
            }
            let draw = Draw {
                mesh,
                material: node.material,
                instance: frame.instances.len() as u32,
            };
            frame.instances.push(InstanceRaw::new(node.world(), node.world_opacity()));
            if node.is_transparent() {
                transparent.push((eye.distance2(node.world_position()), draw));
            } else {
                frame.opaque.push(draw);
            }
        }
        transparent.sort_by(|(a, _), (b, _)| b.total_cmp(a));
        frame.transparent = transparent.into_iter().map(|(_, draw)| draw).collect();
        frame
    }
}

/// Meshes on the GPU plus the growable instance buffer.
#[derive(Debug)]
pub struct GpuScene {
    meshes: Vec<Mesh>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
}

impl GpuScene {
    pub fn new(ctx: &Context, scene: &Scene) -> Self {
        let meshes = scene.meshes().iter().map(|data| Mesh::upload(&ctx.device, data)).collect();
        let instance_capacity = scene.len().max(1);
        Self {
            meshes,
            instance_buffer: Self::mk_instance_buffer(&ctx.device, instance_capacity),
            instance_capacity,
        }
    }

    fn mk_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Draws sky, opaque and transparent batches into the next surface texture.
    pub fn render(
        &mut self,
        ctx: &Context,
        materials: &Materials,
        frame: &FrameDraws,
    ) -> Result<(), wgpu::SurfaceError> {
        // Rendering requires the surface to be configured
        if !ctx.is_surface_configured() {
            return Ok(());
        }
        if frame.instances.len() > self.instance_capacity {
            self.instance_capacity = frame.instances.len().next_power_of_two();
            self.instance_buffer = Self::mk_instance_buffer(&ctx.device, self.instance_capacity);
        }
        if !frame.instances.is_empty() {
            ctx.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&frame.instances));
        }

        let output = ctx.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&ctx.pipelines.skybox);
            render_pass.set_bind_group(0, &materials.environment, &[]);
            render_pass.set_bind_group(1, &ctx.camera.bind_group, &[]);
            render_pass.draw(0..3, 0..1);

            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for (pipeline, draws) in [
                (&ctx.pipelines.basic, &frame.opaque),
                (&ctx.pipelines.transparent, &frame.transparent),
            ] {
                render_pass.set_pipeline(pipeline);
                for draw in draws {
                    let Some(mesh) = self.meshes.get(draw.mesh) else {
                        log::warn!("Draw references mesh {} which was never uploaded", draw.mesh);
                        continue;
                    };
                    render_pass.draw_mesh_instanced(
                        mesh,
                        &materials.get(draw.material).bind_group,
                        &ctx.camera.bind_group,
                        draw.instance..draw.instance + 1,
                    );
                }
            }
        }

        ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
