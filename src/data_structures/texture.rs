//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU GPU texture resources,
//! and helper methods for creating depth textures, solid colour fallbacks, cube
//! maps and textures from decoded images.

use anyhow::*;
use image::RgbaImage;

/// A GPU texture with a view and optional sampler.
///
/// Used for the baked lighting map, the matcap, the environment cube and depth.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Depth attachment of `size` (`[width, height]`), at least 1x1.
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// A 1x1 texture of a single colour, bound where a material samples nothing.
    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4]) -> Texture {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
        Self::from_image(device, queue, &img, Some("solid colour"), true)
    }

    /// Upload a decoded image.
    ///
    /// `is_linear` toggles between sRGB (false, colour data) and linear (true) storage.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &RgbaImage,
        label: Option<&str>,
        is_linear: bool,
    ) -> Self {
        let dimensions = img.dimensions();
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let format = if is_linear {
            wgpu::TextureFormat::Rgba8Unorm
        } else {
            wgpu::TextureFormat::Rgba8UnormSrgb
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        write_layer(queue, &texture, img, 0);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_default_sampler(device));

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Upload six square faces (`+x, -x, +y, -y, +z, -z`) as a cube map.
    pub fn cube(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[RgbaImage; 6],
        label: &str,
    ) -> Result<Self> {
        let (width, height) = faces[0].dimensions();
        ensure!(width == height, "cube map faces must be square, got {width}x{height}");
        if let Some(face) = faces.iter().position(|face| face.dimensions() != (width, height)) {
            bail!("cube map face {face} differs in size from face 0 ({width}x{height})");
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 6,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, face) in faces.iter().enumerate() {
            write_layer(queue, &texture, face, layer as u32);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = Some(create_default_sampler(device));

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

/// Copies `img` into array layer `layer` of `texture`.
fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, img: &RgbaImage, layer: u32) {
    let (width, height) = img.dimensions();
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
            aspect: wgpu::TextureAspect::All,
        },
        img,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}
