//! Node transforms and their GPU representation.
//!
//! An [`Instance`] is the local transform of a scene node. Rotation is kept as
//! Euler angles (XYZ order, radians) so timelines can interpolate a single
//! axis the way the authored sequences describe them ("rotate z by 0.5").
//! The world matrix of a node is packed into an [`InstanceRaw`] and handed to
//! the vertex shader as a per-instance vertex buffer.

use cgmath::{Matrix, Matrix3, Matrix4, Quaternion, Rad, SquareMatrix, Vector3};

use crate::data_structures::model;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instance {
    pub position: Vector3<f32>,
    /// Euler angles in radians, applied as `Rx * Ry * Rz`.
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Instance {
    /// Identity transform.
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Builds a transform from a glTF-style decomposition (quaternion as `[x, y, z, w]`).
    pub fn from_decomposed(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        let [x, y, z, w] = rotation;
        Self {
            position: translation.into(),
            rotation: euler_from_quaternion(Quaternion::new(w, x, y, z)),
            scale: scale.into(),
        }
    }

    pub fn rotation_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z))
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * self.rotation_matrix()
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vector3<f32>> for Instance {
    fn from(position: Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

/// XYZ Euler angles of a unit quaternion.
fn euler_from_quaternion(q: Quaternion<f32>) -> Vector3<f32> {
    // columns: m.x = first column, so m13 (row 1, col 3) is m.z.x
    let m = Matrix3::from(q);
    let m13 = m.z.x.clamp(-1.0, 1.0);
    let y = m13.asin();
    if m13.abs() < 0.999_999_9 {
        Vector3::new((-m.z.y).atan2(m.z.z), y, (-m.y.x).atan2(m.x.x))
    } else {
        Vector3::new(m.y.z.atan2(m.y.y), y, 0.0)
    }
}

/**
 * The raw instance is the actual data stored on the GPU
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
    opacity: f32,
}

impl InstanceRaw {
    pub fn new(world: Matrix4<f32>, opacity: f32) -> Self {
        let linear = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
        // Inverse transpose keeps normals perpendicular under non-uniform scale
        let normal = linear.invert().map_or(linear, |inverse| inverse.transpose());
        Self {
            model: world.into(),
            normal: normal.into(),
            opacity,
        }
    }
}

/**
 * As we store vertex data directly in the GPU memory we need to tell what the bytes refer to:
 *
 * Stride layout here: world matrix as four vec4 slots, normal matrix as three vec3 slots
 * followed by the node opacity.
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Shaders only advance to the next entry when a new instance starts
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 25]>() as wgpu::BufferAddress,
                    shader_location: 12,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Rotation3};

    use super::*;

    #[test]
    fn should_recover_single_axis_rotation_from_quaternion() {
        let q = Quaternion::from_angle_z(Rad(0.5f32));
        let instance = Instance::from_decomposed([1.0, 2.0, 3.0], [q.v.x, q.v.y, q.v.z, q.s], [1.0; 3]);
        assert!((instance.rotation.z - 0.5).abs() < 1e-5);
        assert!(instance.rotation.x.abs() < 1e-5);
        assert!(instance.rotation.y.abs() < 1e-5);
        assert_eq!(instance.position, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn should_match_quaternion_matrix_for_combined_rotation() {
        let q = Quaternion::from_axis_angle(Vector3::new(1.0f32, 2.0, 0.5).normalize(), Rad(0.8));
        let instance = Instance::from_decomposed([0.0; 3], [q.v.x, q.v.y, q.v.z, q.s], [1.0; 3]);
        let expected = Matrix4::from(q);
        let actual = instance.rotation_matrix();
        for col in 0..4 {
            for row in 0..4 {
                assert!((expected[col][row] - actual[col][row]).abs() < 1e-4);
            }
        }
    }
}
