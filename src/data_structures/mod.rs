//! Engine data structures: meshes, textures, scene graph and transforms.
//!
//! - `model` contains mesh vertex layouts, decoded mesh data and uploaded meshes
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds node transforms and the per-instance GPU layout
//! - `scene_graph` enables hierarchical scene organization with tagged parts

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
