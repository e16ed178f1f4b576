//! Output events and sinks.
//!
//! The registry reports everything it does as [`HandEvent`]s pushed into a
//! [`HandEventSink`].  Consumers don't need to know whether anyone is
//! listening: [`NullSink`] drops everything, a `Vec` records, and an `mpsc`
//! sender forwards to another thread.

use std::sync::mpsc::Sender;

use crate::joint::{JointTable, Pose};
use crate::mesh::HandMesh;
use crate::record::Handedness;
use crate::session::SessionId;

/// Something that happened to a hand session during a tick.
#[derive(Clone, Debug, PartialEq)]
pub enum HandEvent {
    /// A new session was created.
    Detected { session: SessionId, handedness: Handedness },

    /// A session was torn down.
    Lost { session: SessionId, handedness: Handedness },

    /// The session's joint table was refreshed (every tick it is seen).
    JointsUpdated { session: SessionId, handedness: Handedness, joints: JointTable },

    /// The grip (raw palm) pose changed.
    PoseChanged { session: SessionId, grip: Pose },

    /// The pointer pose changed.
    PointerChanged { session: SessionId, handedness: Handedness, pointer: Pose },

    /// The index fingertip pose changed.
    IndexFingerChanged { session: SessionId, handedness: Handedness, pose: Pose },

    /// Pinch began (`pressed`) or ended.
    SelectChanged { session: SessionId, pressed: bool },

    /// Mirrors `SelectChanged` for consumers mapped to a trigger.
    TriggerChanged { session: SessionId, pressed: bool },

    /// Mesh relayed from the renderer.
    MeshUpdated { session: SessionId, handedness: Handedness, mesh: HandMesh },
}

impl HandEvent {
    pub fn session(&self) -> SessionId {
        match self {
            HandEvent::Detected { session, .. }
            | HandEvent::Lost { session, .. }
            | HandEvent::JointsUpdated { session, .. }
            | HandEvent::PoseChanged { session, .. }
            | HandEvent::PointerChanged { session, .. }
            | HandEvent::IndexFingerChanged { session, .. }
            | HandEvent::SelectChanged { session, .. }
            | HandEvent::TriggerChanged { session, .. }
            | HandEvent::MeshUpdated { session, .. } => *session,
        }
    }
}

/// Receiver of [`HandEvent`]s.
pub trait HandEventSink {
    fn emit(&mut self, event: HandEvent);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl HandEventSink for NullSink {
    fn emit(&mut self, _event: HandEvent) {}
}

impl HandEventSink for Vec<HandEvent> {
    fn emit(&mut self, event: HandEvent) {
        self.push(event);
    }
}

/// A disconnected receiver is not an error for the producer.
impl HandEventSink for Sender<HandEvent> {
    fn emit(&mut self, event: HandEvent) {
        let _ = self.send(event);
    }
}

impl<S: HandEventSink + ?Sized> HandEventSink for &mut S {
    fn emit(&mut self, event: HandEvent) {
        (**self).emit(event);
    }
}
