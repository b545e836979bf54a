//! Error taxonomy for the experience lifecycle.
//!
//! Every variant is fatal to initialization: there is no retry policy and a
//! failed experience has to be constructed again from scratch. Invalid trip
//! transitions (flying before the engine runs and the like) are not errors,
//! the sequencer treats them as no-ops.

use thiserror::Error;

use crate::{data_structures::scene_graph::PartTag, resources::AssetId};

#[derive(Debug, Error)]
pub enum SceneError {
    /// No window or canvas exists to render into.
    #[error("no display surface available to render into")]
    MissingSurface,

    /// A single declared asset failed; loading stops at the first failure.
    #[error("failed to load asset `{asset_id}`: {cause}")]
    AssetLoad {
        asset_id: AssetId,
        #[source]
        cause: anyhow::Error,
    },

    /// The model lacks a part the sequencer animates.
    #[error("model has no node marked as {0:?}")]
    MissingNamedPart(PartTag),

    /// Adapter, device or surface creation failed.
    #[error("graphics backend failed: {0}")]
    Gpu(#[source] anyhow::Error),
}

pub type SceneResult<T> = Result<T, SceneError>;
