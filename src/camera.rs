//! Camera, projection and the orbit controls that move it.
//!
//! The camera keeps a [`LookAt`] mode; the experience resolves it into a
//! world-space target every frame. [`OrbitControls`] only ever moves the
//! camera position on a sphere around the origin.

use std::f32::consts::PI;

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use crate::config::{CameraConfig, ControlsConfig};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Which part of the scene the camera follows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LookAt {
    #[default]
    Aircraft,
    Text,
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub looks_at: LookAt,
    pub projection: Projection,
}

impl Camera {
    pub fn new(config: &CameraConfig, width: u32, height: u32) -> Self {
        Self {
            position: config.position.into(),
            target: Point3::origin(),
            up: Vector3::unit_y(),
            looks_at: LookAt::default(),
            projection: Projection::new(width, height, config.fovy, config.znear, config.zfar),
        }
    }

    pub fn calc_view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection.calc_matrix() * self.calc_view()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> Rad<f32> {
        self.fovy
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    inv_proj: [[f32; 4]; 4],
    inv_view: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            inv_proj: Matrix4::identity().into(),
            inv_view: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera) {
        let view = camera.calc_view();
        let proj = camera.projection.calc_matrix();
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (proj * view).into();
        // The sky pass reconstructs view rays from these
        self.inv_proj = proj.invert().unwrap_or_else(Matrix4::identity).into();
        self.inv_view = view.invert().unwrap_or_else(Matrix4::identity).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Uniform buffer and bind group the shaders read the camera from.
#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: &Camera) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(camera);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, camera: &Camera) {
        self.uniform.update_view_proj(camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

const POLE_EPSILON: f32 = 1e-6;

/// Radius, polar angle from +y (`phi`) and azimuth around +y (`theta`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Spherical {
    radius: f32,
    phi: f32,
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// Damped orbiting around a fixed target.
///
/// Input accumulates into a pending rotation delta; every [`update`](Self::update)
/// applies a `damping_factor` share of it and decays the rest, so the camera
/// keeps gliding for a few frames after the pointer stops.
#[derive(Clone, Debug)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    config: ControlsConfig,
    pending: Spherical,
    scale: f32,
    rotating: bool,
    cursor: Option<PhysicalPosition<f64>>,
    viewport_height: f32,
}

impl OrbitControls {
    pub fn new(config: &ControlsConfig) -> Self {
        Self {
            target: Point3::origin(),
            config: config.clone(),
            pending: Spherical::default(),
            scale: 1.0,
            rotating: false,
            cursor: None,
            viewport_height: 1.0,
        }
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    /// Queues a rotation for a pointer drag of `(dx, dy)` physical pixels.
    pub fn rotate_by_pixels(&mut self, dx: f64, dy: f64) {
        let full_turn = 2.0 * PI * self.config.rotate_speed / self.viewport_height;
        self.pending.theta -= dx as f32 * full_turn;
        self.pending.phi -= dy as f32 * full_turn;
    }

    /// Positive `lines` moves closer.
    pub fn dolly(&mut self, lines: f32) {
        let step = 0.95f32.powf(self.config.zoom_speed);
        self.scale *= step.powf(lines);
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.rotating = *state == ElementState::Pressed;
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace(*position);
                match previous {
                    Some(previous) if self.rotating => {
                        self.rotate_by_pixels(position.x - previous.x, position.y - previous.y);
                        true
                    }
                    _ => false,
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.rotating = false;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y.signum() as f32,
                };
                self.dolly(lines);
                true
            }
            _ => false,
        }
    }

    /// Moves `camera.position` by one damping step. Returns whether it moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(offset);
        let damping = self.config.damping_factor;

        spherical.theta += self.pending.theta * damping;
        spherical.phi = (spherical.phi + self.pending.phi * damping).clamp(POLE_EPSILON, PI - POLE_EPSILON);
        spherical.radius = (spherical.radius * self.scale)
            .clamp(self.config.min_distance, self.config.max_distance);

        self.pending.theta *= 1.0 - damping;
        self.pending.phi *= 1.0 - damping;
        self.scale = 1.0;

        let position = self.target + spherical.to_offset();
        let moved = (position - camera.position).magnitude2() > POLE_EPSILON;
        camera.position = position;
        moved
    }
}
