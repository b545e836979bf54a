//! The trip state machine: start engine, fly, end trip.
//!
//! ```text
//! Idle --start_engine--> EngineRunning --fly--> Flying
//!   ^                         |                   |
//!   +--------end_trip---------+-------------------+
//! ```
//!
//! Every transition outside this graph is a logged no-op returning `false`.

use std::f32::consts::PI;

use crate::{
    animation::{Change, Cue, CueAt, Ease, Property, Repeat, Stage, Timeline, Track},
    camera::{Camera, LookAt},
    data_structures::{
        instance::Instance,
        scene_graph::{NodeId, Scene},
    },
};

/// How far behind its authored position the aircraft re-enters after a trip.
pub const RETURN_OFFSET: f32 = 91.0;
pub const HOMING_DURATION: f32 = 2.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TripState {
    #[default]
    Idle,
    EngineRunning,
    Flying,
}

/// The nodes the sequences animate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rig {
    pub main: NodeId,
    pub fan: NodeId,
    pub header: NodeId,
    pub banner: NodeId,
}

#[derive(Clone, Copy, Debug)]
struct AuthoredPose {
    main: Instance,
    banner: Instance,
    header_opacity: f32,
}

#[derive(Debug)]
pub struct FlightSequencer {
    rig: Rig,
    authored: AuthoredPose,
    state: TripState,
    engine: Option<Timeline>,
    flight: Option<Timeline>,
    homing: Option<Timeline>,
}

impl FlightSequencer {
    /// Snapshots the current pose of the rig as the pose `end_trip` restores.
    pub fn new(rig: Rig, scene: &Scene) -> Self {
        let local = |id| scene.node(id).map(|node| node.local).unwrap_or_default();
        let authored = AuthoredPose {
            main: local(rig.main),
            banner: local(rig.banner),
            header_opacity: scene.node(rig.header).map_or(1.0, |node| node.opacity),
        };
        Self {
            rig,
            authored,
            state: TripState::Idle,
            engine: None,
            flight: None,
            homing: None,
        }
    }

    pub fn state(&self) -> TripState {
        self.state
    }

    pub fn rig(&self) -> Rig {
        self.rig
    }

    /// Timelines that still have something to play.
    pub fn active_jobs(&self) -> usize {
        [&self.engine, &self.flight, &self.homing]
            .into_iter()
            .flatten()
            .filter(|timeline| !timeline.is_finished())
            .count()
    }

    pub fn start_engine(&mut self) -> bool {
        if self.state != TripState::Idle {
            log::debug!("Ignoring start engine while {:?}", self.state);
            return false;
        }
        let spin = Track::new(self.rig.fan, Property::RotationZ, Change::By(200.0)).repeat(Repeat::Forever);
        self.engine = Some(Timeline::new("engine", vec![spin], Vec::new()));
        self.state = TripState::EngineRunning;
        log::info!("Engine started");
        true
    }

    /// Takes off. A homing slide still in progress is cut short at the authored position first.
    pub fn fly(&mut self, scene: &mut Scene) -> bool {
        if self.state != TripState::EngineRunning {
            log::debug!("Ignoring fly while {:?}", self.state);
            return false;
        }
        self.settle_homing(scene);
        let Rig {
            main, header, banner, ..
        } = self.rig;
        let tracks = vec![
            Track::new(main, Property::PositionZ, Change::By(500.0))
                .over(20.0)
                .ease(Ease::Power2In),
            Track::new(main, Property::RotationZ, Change::By(-0.5)).at(3.0).over(2.0),
            Track::new(main, Property::RotationZ, Change::By(1.0))
                .at(4.0)
                .over(3.0)
                .ease(Ease::Linear)
                .repeat(Repeat::Yoyo),
            Track::new(banner, Property::PositionZ, Change::To(30.0))
                .at(10.0)
                .over(3.0)
                .ease(Ease::Power2Out),
            Track::new(banner, Property::PositionX, Change::To(-65.0))
                .at(10.0)
                .over(3.0)
                .ease(Ease::Power2Out),
            Track::new(banner, Property::RotationY, Change::To(PI)).at(11.0).over(1.0),
            Track::new(banner, Property::PositionX, Change::To(-6.0)).at(11.0).over(2.0),
        ];
        let cues = vec![
            CueAt::new(13.0, Cue::LookAt(LookAt::Text)),
            CueAt::new(
                13.0,
                Cue::Set {
                    target: header,
                    property: Property::Opacity,
                    value: 0.0,
                },
            ),
            // After the climb, the last track that ends
            CueAt::new(20.0, Cue::EndTrip(true)),
        ];
        self.flight = Some(Timeline::new("flight", tracks, cues));
        self.state = TripState::Flying;
        log::info!("Taking off");
        true
    }

    /// Stops every sequence, restores the authored pose and flies the aircraft back in.
    pub fn end_trip(&mut self, scene: &mut Scene, camera: &mut Camera) -> bool {
        if self.state == TripState::Idle {
            log::debug!("Ignoring end trip while idle");
            return false;
        }
        for timeline in [&mut self.engine, &mut self.flight, &mut self.homing] {
            if let Some(mut timeline) = timeline.take() {
                timeline.cancel();
            }
        }

        let authored = self.authored;
        if let Some(main) = scene.node_mut(self.rig.main) {
            main.local.rotation = authored.main.rotation;
            main.local.position = authored.main.position;
            main.local.position.z -= RETURN_OFFSET;
        }
        if let Some(banner) = scene.node_mut(self.rig.banner) {
            banner.local.position = authored.banner.position;
            banner.local.rotation = authored.banner.rotation;
        }
        if let Some(header) = scene.node_mut(self.rig.header) {
            header.opacity = authored.header_opacity;
        }
        camera.looks_at = LookAt::Aircraft;

        let home = Track::new(
            self.rig.main,
            Property::PositionZ,
            Change::To(authored.main.position.z),
        )
        .over(HOMING_DURATION);
        self.homing = Some(Timeline::new(
            "homing",
            vec![home],
            vec![CueAt::new(0.2, Cue::EndTrip(false))],
        ));
        self.state = TripState::Idle;
        log::info!("Trip ended, returning to the start");
        true
    }

    // The flight's relative climb captures main z, so nothing else may still be writing it
    fn settle_homing(&mut self, scene: &mut Scene) {
        let Some(mut homing) = self.homing.take() else {
            return;
        };
        if homing.is_finished() {
            return;
        }
        homing.cancel();
        if let Some(main) = scene.node_mut(self.rig.main) {
            main.local.position.z = self.authored.main.position.z;
        }
        log::debug!("Homing cut short by a new flight");
    }

    pub fn advance(&mut self, dt: f32, stage: &mut Stage<'_>) {
        for timeline in [&mut self.engine, &mut self.flight, &mut self.homing]
            .into_iter()
            .flatten()
        {
            timeline.advance(dt, stage);
        }
        if self.homing.as_ref().is_some_and(Timeline::is_finished) {
            self.homing = None;
        }
    }
}
