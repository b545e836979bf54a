//! Declarative, cancellable animation timelines.
//!
//! - `ease` contains the progress curves
//! - `timeline` contains tracks, cues and the timeline that plays them

pub mod ease;
pub mod timeline;

pub use ease::Ease;
pub use timeline::{Change, Cue, CueAt, Property, Repeat, Stage, Timeline, Track};
