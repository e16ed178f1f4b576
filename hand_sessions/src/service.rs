//! Tracking service — frame source + registry + event sink.
//!
//! Consumers don't need to know whether frames came from real hardware or a
//! simulator: anything implementing [`FrameSource`] can drive the registry.

use std::collections::VecDeque;

use tracing::{error, info};

use crate::config::TrackingConfig;
use crate::error::{Result, TrackingError};
use crate::event::HandEventSink;
use crate::mesh::HandMesh;
use crate::ray::Viewpoint;
use crate::record::{Frame, SensorHandId};
use crate::session::{HandRegistry, HandSnapshot};

// ════════════════════════════════════════════════════════════════════════════
// FrameSource trait — unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver sensor [`Frame`]s.
pub trait FrameSource {
    /// Connect to the sensor.  Fails with
    /// [`TrackingError::SourceUnavailable`](crate::TrackingError::SourceUnavailable)
    /// when there is nothing to connect to.
    fn open(&mut self) -> Result<()>;

    /// Newest frame since the last call, if any.  Must not block.
    fn poll(&mut self) -> Option<Frame>;

    fn name(&self) -> &str;
}

// ════════════════════════════════════════════════════════════════════════════
// HandTrackingService
// ════════════════════════════════════════════════════════════════════════════

pub struct HandTrackingService<S, K> {
    source:   S,
    sink:     K,
    registry: HandRegistry,
    enabled:  bool,
}

impl<S: FrameSource, K: HandEventSink> HandTrackingService<S, K> {
    pub fn new(source: S, sink: K, config: TrackingConfig) -> Self {
        Self::with_registry(source, sink, HandRegistry::new(config))
    }

    pub fn with_registry(source: S, sink: K, registry: HandRegistry) -> Self {
        HandTrackingService { source, sink, registry, enabled: false }
    }

    pub fn is_enabled(&self) -> bool { self.enabled }
    pub fn registry(&self) -> &HandRegistry { &self.registry }
    pub fn source(&self) -> &S { &self.source }
    pub fn sink(&self) -> &K { &self.sink }
    pub fn sink_mut(&mut self) -> &mut K { &mut self.sink }

    pub fn snapshots(&self) -> Vec<HandSnapshot> { self.registry.snapshots() }

    /// Open the frame source.  On failure the service stays disabled and
    /// every later `tick` does nothing.
    pub fn enable(&mut self) -> Result<()> {
        if self.enabled {
            return Ok(());
        }
        if let Err(e) = self.source.open() {
            error!(source = self.source.name(), error = %e, "frame source unavailable");
            return Err(e);
        }
        self.enabled = true;
        info!(source = self.source.name(), "hand tracking enabled");
        Ok(())
    }

    /// Process at most one pending frame.  Returns whether a frame was
    /// consumed.
    pub fn tick(&mut self, viewpoint: &Viewpoint) -> bool {
        if !self.enabled {
            return false;
        }
        match self.source.poll() {
            Some(frame) => {
                self.registry.on_frame(&frame, viewpoint, &mut self.sink);
                true
            }
            None => false,
        }
    }

    /// Forward a renderer mesh for a tracked hand.
    pub fn relay_mesh(&mut self, sensor_id: SensorHandId, mesh: HandMesh) -> bool {
        self.enabled && self.registry.relay_mesh(sensor_id, mesh, &mut self.sink)
    }

    /// Stop processing and report every live hand as lost.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        let n = self.registry.len();
        self.registry.clear(&mut self.sink);
        info!(source = self.source.name(), flushed = n, "hand tracking disabled");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ScriptedSource — replays a fixed frame list
// ════════════════════════════════════════════════════════════════════════════

/// Frame source that hands out a prepared list, one per poll.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    frames:      VecDeque<Frame>,
    unavailable: bool,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        ScriptedSource { frames: frames.into_iter().collect(), unavailable: false }
    }

    /// A source whose `open` always fails.
    pub fn unavailable() -> Self {
        ScriptedSource { frames: Default::default(), unavailable: true }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push_back(frame);
    }

    pub fn remaining(&self) -> usize { self.frames.len() }
}

impl FrameSource for ScriptedSource {
    fn open(&mut self) -> Result<()> {
        if self.unavailable {
            return Err(TrackingError::source_unavailable("scripted source has no device"));
        }
        Ok(())
    }

    fn poll(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }

    fn name(&self) -> &str { "scripted" }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::HandEvent;
    use crate::synthetic::SyntheticHand;

    fn two_frames() -> Vec<Frame> {
        vec![
            Frame::new(1, vec![SyntheticHand::left(1).build()]),
            Frame::new(2, vec![SyntheticHand::left(1).build(), SyntheticHand::right(2).build()]),
        ]
    }

    #[test]
    fn disabled_service_ignores_frames() {
        let mut svc = HandTrackingService::new(ScriptedSource::new(two_frames()), Vec::new(), TrackingConfig::default());
        assert!(!svc.tick(&Viewpoint::default()));
        assert_eq!(svc.source().remaining(), 2);
        assert!(svc.sink().is_empty());
    }

    #[test]
    fn enable_then_tick_processes_one_frame_each() {
        let mut svc = HandTrackingService::new(ScriptedSource::new(two_frames()), Vec::new(), TrackingConfig::default());
        svc.enable().unwrap();
        assert!(svc.is_enabled());
        assert!(svc.tick(&Viewpoint::default()));
        assert_eq!(svc.registry().len(), 1);
        assert!(svc.tick(&Viewpoint::default()));
        assert_eq!(svc.registry().len(), 2);
        assert!(!svc.tick(&Viewpoint::default()));
        assert_eq!(svc.registry().tick(), 2);
    }

    #[test]
    fn failed_enable_leaves_registry_idle() {
        let mut src = ScriptedSource::unavailable();
        src.push(Frame::new(1, vec![SyntheticHand::left(1).build()]));
        let mut svc = HandTrackingService::new(src, Vec::new(), TrackingConfig::default());

        let err = svc.enable().unwrap_err();
        assert!(matches!(err, TrackingError::SourceUnavailable(_)));
        assert!(!svc.is_enabled());
        assert!(!svc.tick(&Viewpoint::default()));
        assert!(svc.registry().is_empty());
        assert!(svc.sink().is_empty());
    }

    #[test]
    fn disable_flushes_lost_for_every_hand() {
        let mut svc = HandTrackingService::new(ScriptedSource::new(two_frames()), Vec::new(), TrackingConfig::default());
        svc.enable().unwrap();
        svc.tick(&Viewpoint::default());
        svc.tick(&Viewpoint::default());
        svc.sink_mut().clear();

        svc.disable();
        assert!(!svc.is_enabled());
        assert!(svc.registry().is_empty());
        let lost = svc.sink().iter().filter(|e| matches!(e, HandEvent::Lost { .. })).count();
        assert_eq!(lost, 2);

        // second disable is a no-op
        svc.disable();
        assert_eq!(svc.sink().len(), 2);
    }

    #[test]
    fn mesh_relay_requires_enabled() {
        use nalgebra::{Vector2, Vector3};
        let mesh = HandMesh::new(vec![Vector3::zeros()], vec![Vector3::z()], vec![], vec![Vector2::zeros()]);
        let mut svc = HandTrackingService::new(ScriptedSource::new(two_frames()), Vec::new(), TrackingConfig::default());
        assert!(!svc.relay_mesh(1, mesh.clone()));
        svc.enable().unwrap();
        svc.tick(&Viewpoint::default());
        assert!(svc.relay_mesh(1, mesh));
    }
}
