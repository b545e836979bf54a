//! sky-king
//!
//! An interactive aircraft scene for native and WASM targets. A glTF aircraft,
//! two 3D text meshes and an environment map are loaded with progress
//! reporting, assembled into a scene graph, and then animated by scripted
//! sequences (start engine, fly, end trip) while the user orbits the camera.
//!
//! High-level modules
//! - `animation`: eased property tracks and cue timelines on one clock
//! - `assembler`: places the aircraft and the text meshes into the scene
//! - `cache`: lazily built, memoized scene resources (sizes, camera, renderer)
//! - `camera`: camera, projection, uniforms and orbit controls
//! - `config`: asset manifest and scene constants
//! - `context`: GPU and window context that owns device/queue/pipelines
//! - `data_structures`: meshes, instances, textures and the scene graph
//! - `experience`: the owned context object tying everything together
//! - `flow`: the winit event loop application
//! - `pipelines`: render pipelines (sky, opaque, transparent)
//! - `resources`: asset fetching, decoding and progress
//! - `render`: materials, draw lists and frame submission
//! - `sequencer`: the engine, flight and homing sequences
//! - `ui`: loading screen and overlay
//!

pub mod animation;
pub mod assembler;
pub mod cache;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod experience;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod sequencer;
pub mod ui;

// Re-exports commonly used types for convenience in downstream code.
pub use config::Config;
pub use error::{SceneError, SceneResult};
pub use experience::{Command, Experience};
pub use sequencer::TripState;
pub use winit::event::WindowEvent;
