//! Tracks and cues played against one clock.
//!
//! A [`Timeline`] owns its clock: every offset of every [`Track`] and
//! [`CueAt`] is measured from the moment the timeline was created, not from
//! the end of the previous entry. Tracks are evaluated in list order each
//! advance, so when two tracks animate the same property at the same time the
//! later one wins.

use crate::{
    animation::ease::Ease,
    camera::{Camera, LookAt},
    data_structures::scene_graph::{Node, NodeId, Scene},
    ui::Overlay,
};

const DEFAULT_DURATION: f32 = 0.5;

/// A single animatable scalar of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    PositionX,
    PositionY,
    PositionZ,
    RotationX,
    RotationY,
    RotationZ,
    Opacity,
}

impl Property {
    pub fn get(self, node: &Node) -> f32 {
        match self {
            Property::PositionX => node.local.position.x,
            Property::PositionY => node.local.position.y,
            Property::PositionZ => node.local.position.z,
            Property::RotationX => node.local.rotation.x,
            Property::RotationY => node.local.rotation.y,
            Property::RotationZ => node.local.rotation.z,
            Property::Opacity => node.opacity,
        }
    }

    pub fn set(self, node: &mut Node, value: f32) {
        match self {
            Property::PositionX => node.local.position.x = value,
            Property::PositionY => node.local.position.y = value,
            Property::PositionZ => node.local.position.z = value,
            Property::RotationX => node.local.rotation.x = value,
            Property::RotationY => node.local.rotation.y = value,
            Property::RotationZ => node.local.rotation.z = value,
            Property::Opacity => node.opacity = value,
        }
    }
}

/// Where a track ends, relative to the value it finds when it becomes active.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Change {
    By(f32),
    To(f32),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Repeat {
    #[default]
    Once,
    /// Restart from the start value every cycle.
    Forever,
    /// Play forwards, then backwards, forever.
    Yoyo,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub target: NodeId,
    pub property: Property,
    pub change: Change,
    /// Offset from the timeline start, in seconds.
    pub start: f32,
    pub duration: f32,
    pub ease: Ease,
    pub repeat: Repeat,
}

impl Track {
    pub fn new(target: NodeId, property: Property, change: Change) -> Self {
        Self {
            target,
            property,
            change,
            start: 0.0,
            duration: DEFAULT_DURATION,
            ease: Ease::default(),
            repeat: Repeat::Once,
        }
    }

    pub fn at(mut self, start: f32) -> Self {
        self.start = start;
        self
    }

    pub fn over(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn end(&self) -> Option<f32> {
        match self.repeat {
            Repeat::Once => Some(self.start + self.duration.max(0.0)),
            Repeat::Forever | Repeat::Yoyo => None,
        }
    }

    /// Eased progress `local` seconds after the track became active.
    pub fn progress(&self, local: f32) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        let cycles = local / self.duration;
        let phase = match self.repeat {
            Repeat::Once => cycles.min(1.0),
            Repeat::Forever => cycles.fract(),
            Repeat::Yoyo => {
                let phase = cycles.fract();
                if cycles as u64 % 2 == 1 {
                    1.0 - phase
                } else {
                    phase
                }
            }
        };
        self.ease.apply(phase)
    }
}

/// A discrete effect fired once when the clock passes its offset.
#[derive(Clone, Debug, PartialEq)]
pub enum Cue {
    Set {
        target: NodeId,
        property: Property,
        value: f32,
    },
    LookAt(LookAt),
    /// Show or hide the end-trip affordance.
    EndTrip(bool),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CueAt {
    pub at: f32,
    pub cue: Cue,
}

impl CueAt {
    pub fn new(at: f32, cue: Cue) -> Self {
        Self { at, cue }
    }
}

/// Everything a timeline may touch while advancing.
pub struct Stage<'a> {
    pub scene: &'a mut Scene,
    pub camera: &'a mut Camera,
    pub overlay: &'a mut dyn Overlay,
}

#[derive(Debug)]
struct ActiveTrack {
    track: Track,
    from: Option<f32>,
    done: bool,
}

#[derive(Debug)]
pub struct Timeline {
    name: &'static str,
    tracks: Vec<ActiveTrack>,
    cues: Vec<(CueAt, bool)>,
    elapsed: f32,
    cancelled: bool,
}

impl Timeline {
    pub fn new(name: &'static str, tracks: Vec<Track>, cues: Vec<CueAt>) -> Self {
        Self {
            name,
            tracks: tracks
                .into_iter()
                .map(|track| ActiveTrack {
                    track,
                    from: None,
                    done: false,
                })
                .collect(),
            cues: cues.into_iter().map(|cue| (cue, false)).collect(),
            elapsed: 0.0,
            cancelled: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Stops the timeline where it is. Values already written stay.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            log::debug!("Cancelled timeline {} at {:.2}s", self.name, self.elapsed);
        }
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Cancelled, or every track and cue has played out. Repeating tracks never do.
    pub fn is_finished(&self) -> bool {
        self.cancelled
            || (self.tracks.iter().all(|active| active.done) && self.cues.iter().all(|(_, fired)| *fired))
    }

    /// Moves the clock by `dt` seconds and writes the resulting values.
    pub fn advance(&mut self, dt: f32, stage: &mut Stage<'_>) {
        if self.cancelled {
            return;
        }
        self.elapsed += dt.max(0.0);
        let elapsed = self.elapsed;

        for active in self.tracks.iter_mut().filter(|active| !active.done) {
            let track = &active.track;
            if elapsed < track.start {
                continue;
            }
            let Some(node) = stage.scene.node_mut(track.target) else {
                log::warn!("Timeline {} animates missing node {:?}", self.name, track.target);
                active.done = true;
                continue;
            };
            let from = *active.from.get_or_insert_with(|| track.property.get(node));
            let to = match track.change {
                Change::By(delta) => from + delta,
                Change::To(value) => value,
            };
            let local = elapsed - track.start;
            track.property.set(node, from + (to - from) * track.progress(local));
            if track.end().is_some_and(|end| elapsed >= end) {
                active.done = true;
            }
        }

        for (cue_at, fired) in self.cues.iter_mut().filter(|(_, fired)| !*fired) {
            if elapsed < cue_at.at {
                continue;
            }
            *fired = true;
            match cue_at.cue {
                Cue::Set {
                    target,
                    property,
                    value,
                } => {
                    if let Some(node) = stage.scene.node_mut(target) {
                        property.set(node, value);
                    }
                }
                Cue::LookAt(looks_at) => stage.camera.looks_at = looks_at,
                Cue::EndTrip(visible) => stage.overlay.set_end_trip_visible(visible),
            }
        }
    }
}
