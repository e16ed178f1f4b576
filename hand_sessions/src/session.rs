//! Hand session registry.
//!
//! The registry owns one [`HandSession`] per sensor hand ID and reconciles
//! them against every incoming [`Frame`]:
//!
//! | Sensor reports this ID…            | Registry does                       |
//! |---|---|
//! | for the first time                 | create session, emit `Detected`     |
//! | again, same handedness             | update session in place             |
//! | again, different handedness        | emit `Lost`, create, emit `Detected`|
//! | not at all this frame              | remove session, emit `Lost`         |
//!
//! A changed handedness means a different physical hand took over the sensor
//! slot, so it never silently mutates an existing session.
//!
//! Sessions live in a table keyed by sensor ID and are updated in place;
//! collaborators only ever see [`HandSnapshot`] copies.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::config::TrackingConfig;
use crate::event::{HandEvent, HandEventSink};
use crate::joint::{JointTable, JointType, Pose};
use crate::mapper::map_hand;
use crate::mesh::HandMesh;
use crate::pinch::PinchDetector;
use crate::ray::{compute_pointer, is_in_pointing_pose, palm_normal, RayStabilizer, ShoulderRay, Viewpoint};
use crate::record::{Frame, Handedness, RawHandRecord, SensorHandId};

// ════════════════════════════════════════════════════════════════════════════
// SessionId
// ════════════════════════════════════════════════════════════════════════════

/// Locally assigned, never reused within one registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

impl SessionId {
    pub fn get(self) -> u64 { self.0 }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hand#{}", self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandSession
// ════════════════════════════════════════════════════════════════════════════

/// One physically tracked hand across frames.
pub struct HandSession {
    id:             SessionId,
    sensor_id:      SensorHandId,
    handedness:     Handedness,
    joints:         JointTable,
    pinch:          PinchDetector,
    ray:            Box<dyn RayStabilizer>,
    pointer_pose:   Pose,
    grip_pose:      Pose,
    index_pose:     Pose,
    in_pointing:    bool,
    last_seen_tick: u64,
}

impl HandSession {
    pub fn id(&self) -> SessionId { self.id }
    pub fn sensor_id(&self) -> SensorHandId { self.sensor_id }
    pub fn handedness(&self) -> Handedness { self.handedness }
    pub fn joints(&self) -> &JointTable { &self.joints }
    pub fn is_pinching(&self) -> bool { self.pinch.is_pinching() }
    pub fn pointer_pose(&self) -> Pose { self.pointer_pose }
    pub fn last_seen_tick(&self) -> u64 { self.last_seen_tick }

    pub fn snapshot(&self) -> HandSnapshot {
        HandSnapshot {
            id:               self.id,
            sensor_id:        self.sensor_id,
            handedness:       self.handedness,
            joints:           self.joints.clone(),
            is_pinching:      self.pinch.is_pinching(),
            pointer_pose:     self.pointer_pose,
            grip_pose:        self.grip_pose,
            index_pose:       self.index_pose,
            in_pointing_pose: self.in_pointing,
            last_seen_tick:   self.last_seen_tick,
        }
    }

    /// Map, detect, and derive for one record; emit what changed.
    fn update<S: HandEventSink + ?Sized>(
        &mut self,
        record: &RawHandRecord,
        viewpoint: &Viewpoint,
        config: &TrackingConfig,
        tick: u64,
        sink: &mut S,
    ) {
        self.last_seen_tick = tick;

        map_hand(record, &mut self.joints);
        sink.emit(HandEvent::JointsUpdated {
            session:    self.id,
            handedness: self.handedness,
            joints:     self.joints.clone(),
        });

        let was_pinching = self.pinch.is_pinching();
        let pinching = self.pinch.update(&self.joints);

        if let Some(update) = compute_pointer(&self.joints, viewpoint, self.handedness, self.ray.as_mut()) {
            if update.grip != self.grip_pose {
                self.grip_pose = update.grip;
                sink.emit(HandEvent::PoseChanged { session: self.id, grip: update.grip });
            }
            if update.pointer != self.pointer_pose {
                self.pointer_pose = update.pointer;
                sink.emit(HandEvent::PointerChanged {
                    session:    self.id,
                    handedness: self.handedness,
                    pointer:    update.pointer,
                });
            }
            if let Some(index) = self.joints.get(JointType::IndexTip) {
                if index != self.index_pose {
                    self.index_pose = index;
                    sink.emit(HandEvent::IndexFingerChanged {
                        session:    self.id,
                        handedness: self.handedness,
                        pose:       index,
                    });
                }
            }
        }

        self.in_pointing = palm_normal(&self.joints)
            .map(|n| is_in_pointing_pose(&n, viewpoint, &config.pointing))
            .unwrap_or(false);

        if pinching != was_pinching {
            debug!(session = %self.id, pinching, "select changed");
            sink.emit(HandEvent::SelectChanged { session: self.id, pressed: pinching });
            sink.emit(HandEvent::TriggerChanged { session: self.id, pressed: pinching });
        }
    }
}

impl fmt::Debug for HandSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandSession")
            .field("id", &self.id)
            .field("sensor_id", &self.sensor_id)
            .field("handedness", &self.handedness)
            .field("joints", &self.joints.len())
            .field("pinching", &self.pinch.is_pinching())
            .field("last_seen_tick", &self.last_seen_tick)
            .finish()
    }
}

/// Read-only copy of a session taken at the end of a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct HandSnapshot {
    pub id:               SessionId,
    pub sensor_id:        SensorHandId,
    pub handedness:       Handedness,
    pub joints:           JointTable,
    pub is_pinching:      bool,
    pub pointer_pose:     Pose,
    pub grip_pose:        Pose,
    pub index_pose:       Pose,
    pub in_pointing_pose: bool,
    pub last_seen_tick:   u64,
}

// ════════════════════════════════════════════════════════════════════════════
// HandRegistry
// ════════════════════════════════════════════════════════════════════════════

type RayFactory = Box<dyn Fn(&TrackingConfig) -> Box<dyn RayStabilizer> + Send>;

/// Owner of every live [`HandSession`].
pub struct HandRegistry {
    config:       TrackingConfig,
    sessions:     BTreeMap<SensorHandId, HandSession>,
    next_id:      u64,
    tick:         u64,
    make_ray:     RayFactory,
}

impl HandRegistry {
    /// Registry using the default [`ShoulderRay`] strategy.
    pub fn new(config: TrackingConfig) -> Self {
        Self::with_ray_strategy(config, |cfg| Box::new(ShoulderRay::new(cfg.ray)))
    }

    /// Registry whose sessions each get a ray stabilizer from `make_ray`.
    pub fn with_ray_strategy<F>(config: TrackingConfig, make_ray: F) -> Self
    where
        F: Fn(&TrackingConfig) -> Box<dyn RayStabilizer> + Send + 'static,
    {
        HandRegistry {
            config,
            sessions: BTreeMap::new(),
            next_id:  1,
            tick:     0,
            make_ray: Box::new(make_ray),
        }
    }

    pub fn config(&self) -> &TrackingConfig { &self.config }

    /// Number of frames processed so far.
    pub fn tick(&self) -> u64 { self.tick }

    pub fn len(&self) -> usize { self.sessions.len() }
    pub fn is_empty(&self) -> bool { self.sessions.is_empty() }

    pub fn session(&self, sensor_id: SensorHandId) -> Option<&HandSession> {
        self.sessions.get(&sensor_id)
    }

    /// Copies of every live session, ordered by sensor ID.
    pub fn snapshots(&self) -> Vec<HandSnapshot> {
        self.sessions.values().map(HandSession::snapshot).collect()
    }

    // ── per-tick reconciliation ──────────────────────────────────────────

    /// Reconcile one sensor frame.  Runs to completion; never fails.
    pub fn on_frame<S: HandEventSink + ?Sized>(
        &mut self,
        frame: &Frame,
        viewpoint: &Viewpoint,
        sink: &mut S,
    ) {
        self.tick += 1;
        let tick = self.tick;

        for record in &frame.hands {
            self.reconcile(record, sink);
            if let Some(session) = self.sessions.get_mut(&record.sensor_id) {
                session.update(record, viewpoint, &self.config, tick, sink);
            }
        }

        let lost: Vec<SensorHandId> = self
            .sessions
            .keys()
            .copied()
            .filter(|id| !frame.contains(*id))
            .collect();
        for sensor_id in lost {
            self.remove(sensor_id, sink);
        }
    }

    /// Make sure a session with the record's handedness exists for its
    /// sensor ID.
    fn reconcile<S: HandEventSink + ?Sized>(&mut self, record: &RawHandRecord, sink: &mut S) {
        let handedness = record.handedness();
        match self.sessions.get(&record.sensor_id) {
            Some(existing) if existing.handedness == handedness => return,
            Some(existing) => {
                warn!(
                    sensor_id = record.sensor_id,
                    session = %existing.id,
                    from = existing.handedness.as_str(),
                    to = handedness.as_str(),
                    "handedness changed; replacing session"
                );
                self.remove(record.sensor_id, sink);
            }
            None => {}
        }
        self.create(record.sensor_id, handedness, sink);
    }

    fn create<S: HandEventSink + ?Sized>(
        &mut self,
        sensor_id: SensorHandId,
        handedness: Handedness,
        sink: &mut S,
    ) {
        let id = SessionId(self.next_id);
        self.next_id += 1;

        let session = HandSession {
            id,
            sensor_id,
            handedness,
            joints:         JointTable::new(),
            pinch:          PinchDetector::new(self.config.pinch),
            ray:            (self.make_ray)(&self.config),
            pointer_pose:   Pose::identity(),
            grip_pose:      Pose::identity(),
            index_pose:     Pose::identity(),
            in_pointing:    false,
            last_seen_tick: self.tick,
        };
        self.sessions.insert(sensor_id, session);

        info!(session = %id, sensor_id, handedness = handedness.as_str(), "hand detected");
        sink.emit(HandEvent::Detected { session: id, handedness });
    }

    /// Tear down the session for `sensor_id`.  Unknown IDs are ignored.
    pub fn remove<S: HandEventSink + ?Sized>(&mut self, sensor_id: SensorHandId, sink: &mut S) -> bool {
        let Some(session) = self.sessions.remove(&sensor_id) else {
            return false;
        };
        info!(
            session = %session.id,
            sensor_id,
            handedness = session.handedness.as_str(),
            "hand lost"
        );
        sink.emit(HandEvent::Lost { session: session.id, handedness: session.handedness });
        true
    }

    /// Remove every session, emitting `Lost` for each.
    pub fn clear<S: HandEventSink + ?Sized>(&mut self, sink: &mut S) {
        let ids: Vec<SensorHandId> = self.sessions.keys().copied().collect();
        for sensor_id in ids {
            self.remove(sensor_id, sink);
        }
    }

    /// Forward a renderer-baked mesh for `sensor_id`.  Empty meshes and
    /// unknown hands are dropped.  Returns whether anything was emitted.
    pub fn relay_mesh<S: HandEventSink + ?Sized>(
        &self,
        sensor_id: SensorHandId,
        mesh: HandMesh,
        sink: &mut S,
    ) -> bool {
        if mesh.is_empty() {
            return false;
        }
        match self.sessions.get(&sensor_id) {
            Some(session) => {
                sink.emit(HandEvent::MeshUpdated {
                    session:    session.id,
                    handedness: session.handedness,
                    mesh,
                });
                true
            }
            None => false,
        }
    }
}

impl Default for HandRegistry {
    fn default() -> Self { HandRegistry::new(TrackingConfig::default()) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
