//! Tunables for the experience.
//!
//! Everything has an engine default matching the authored scene; callers
//! override individual fields before handing the config to
//! [`crate::flow::run`] or [`crate::experience::Experience::new`].

use cgmath::Deg;

#[derive(Clone, Debug)]
pub struct Config {
    pub assets: AssetManifest,
    /// Used when no window is available to ask for its size.
    pub viewport: (u32, u32),
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub model: ModelConfig,
    pub header_text: TextConfig,
    pub banner_text: TextConfig,
    /// RGBA tint of the glass parts; alpha is the glass opacity.
    pub glass_tint: [f32; 4],
    pub clear_colour: wgpu::Color,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assets: AssetManifest::default(),
            viewport: (1280, 720),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            model: ModelConfig::default(),
            header_text: TextConfig {
                content: "The Sky Is Your Limit".to_string(),
                size: 1.0,
                extrusion: 0.2,
                position: [-9.0, 4.0, -4.0],
                rotation: [0.0; 3],
                center: false,
            },
            banner_text: TextConfig {
                content: "TO INFINITY AND BEYOUND".to_string(),
                size: 1.5,
                extrusion: 0.2,
                position: [0.0, 0.0, 200.0],
                rotation: [0.0, std::f32::consts::FRAC_PI_2, 0.0],
                center: true,
            },
            glass_tint: [1.0, 1.0, 1.0, 0.2],
            clear_colour: wgpu::Color::BLACK,
        }
    }
}

/// Paths relative to the asset root (`./assets` natively, `<origin>/assets` on the web).
#[derive(Clone, Debug)]
pub struct AssetManifest {
    pub model: String,
    pub baked_texture: String,
    pub matcap_texture: String,
    /// Faces in `+x, -x, +y, -y, +z, -z` order.
    pub env_map: [String; 6],
    pub header_text: String,
    pub banner_text: String,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            model: "aircraft.glb".to_string(),
            baked_texture: "baked.jpg".to_string(),
            matcap_texture: "matCap/matCap.png".to_string(),
            env_map: ["px", "nx", "py", "ny", "pz", "nz"].map(|face| format!("envMap/{face}.png")),
            header_text: "fonts/header_text.glb".to_string(),
            banner_text: "fonts/banner_text.glb".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub fovy: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [9.0, 3.609, 12.287],
            fovy: Deg(75.0),
            znear: 0.1,
            zfar: 500.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ControlsConfig {
    pub min_distance: f32,
    pub max_distance: f32,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            min_distance: 4.0,
            max_distance: 10.0,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ModelConfig {
    /// Uniform scale of the model's top-level transform node.
    pub scale: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { scale: 0.2 }
    }
}

/// A pre-extruded text mesh and where it goes.
///
/// Text assets are authored at size 1 with an extrusion depth of
/// [`TextConfig::AUTHORED_EXTRUSION`]; `size` and `extrusion` are applied as
/// scale on top of that.
#[derive(Clone, Debug)]
pub struct TextConfig {
    pub content: String,
    pub size: f32,
    pub extrusion: f32,
    pub position: [f32; 3],
    /// Euler XYZ in radians.
    pub rotation: [f32; 3],
    /// Centre the text meshes on their bounding box.
    pub center: bool,
}

impl TextConfig {
    pub const AUTHORED_EXTRUSION: f32 = 0.2;

    pub fn scale(&self) -> [f32; 3] {
        [
            self.size,
            self.size,
            self.extrusion / Self::AUTHORED_EXTRUSION,
        ]
    }
}
