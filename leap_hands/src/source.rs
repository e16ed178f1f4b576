//! Frame sources — LeapMotion hardware and keyboard simulation.
//!
//! Both implement [`FrameSource`], so the tracking service doesn't need to
//! know whether frames came from real hardware or the keyboard simulator.

use std::sync::mpsc::{Receiver, TryRecvError};

use hand_sessions::{
    Frame, FrameSource, Handedness, RawHandRecord, Result, SensorHandId, SyntheticHand,
};
use nalgebra::Vector3;
use tracing::{debug, info};

// ════════════════════════════════════════════════════════════════════════════
// Simulation input
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    KeyDown(SimKey),
    KeyUp(SimKey),
    /// Move the hand in `slot` by `delta` metres.
    Nudge { slot: Slot, delta: Vector3<f32> },
}

/// Simulated key codes (mapped from minifb Key).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    ToggleHand(Slot), // 1 / 2
    Pinch(Slot),      // Z / M (held)
    SwapHandedness,   // H
    FlipPalms,        // P
    Quit,             // Q
}

/// Which of the two simulated hands an input addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    fn index(self) -> usize {
        match self {
            Slot::First => 0,
            Slot::Second => 1,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimRig — the pretend sensor's view of the world
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
struct SimHand {
    sensor_id:   SensorHandId,
    handedness:  Handedness,
    palm:        Vector3<f32>,
    pinching:    bool,
    palm_facing: bool,
}

impl SimHand {
    fn record(&self) -> RawHandRecord {
        let mut hand = SyntheticHand::new(self.sensor_id, self.handedness).palm_at(self.palm);
        if self.palm_facing {
            hand = hand.facing(Vector3::z(), Vector3::y());
        }
        if self.pinching {
            hand = hand.pinch_gap(0.01);
        }
        hand.build()
    }
}

/// Two hand slots.  A hand entering the view gets a fresh sensor ID, the
/// way the real sensor hands them out.
#[derive(Clone, Debug, Default)]
pub struct SimRig {
    hands:      [Option<SimHand>; 2],
    next_id:    SensorHandId,
    frame_id:   i64,
}

impl SimRig {
    pub fn new() -> Self { Self::default() }

    pub fn apply(&mut self, input: &SimInput) {
        match *input {
            SimInput::KeyDown(SimKey::ToggleHand(slot)) => self.toggle(slot),
            SimInput::KeyDown(SimKey::Pinch(slot)) => self.set_pinch(slot, true),
            SimInput::KeyUp(SimKey::Pinch(slot)) => self.set_pinch(slot, false),
            SimInput::KeyDown(SimKey::SwapHandedness) => {
                for hand in self.hands.iter_mut().flatten() {
                    hand.handedness = match hand.handedness {
                        Handedness::Left => Handedness::Right,
                        Handedness::Right => Handedness::Left,
                        Handedness::Other => Handedness::Other,
                    };
                }
            }
            SimInput::KeyDown(SimKey::FlipPalms) => {
                for hand in self.hands.iter_mut().flatten() {
                    hand.palm_facing = !hand.palm_facing;
                }
            }
            SimInput::Nudge { slot, delta } => {
                if let Some(hand) = self.hands[slot.index()].as_mut() {
                    hand.palm += delta;
                }
            }
            _ => {}
        }
    }

    fn toggle(&mut self, slot: Slot) {
        let entry = &mut self.hands[slot.index()];
        if entry.take().is_some() {
            return;
        }
        self.next_id += 1;
        let handedness = match slot {
            Slot::First => Handedness::Left,
            Slot::Second => Handedness::Right,
        };
        let side = if slot == Slot::First { -0.12 } else { 0.12 };
        *entry = Some(SimHand {
            sensor_id:   self.next_id,
            handedness,
            palm:        Vector3::new(side, 0.20, -0.30),
            pinching:    false,
            palm_facing: false,
        });
    }

    fn set_pinch(&mut self, slot: Slot, pinching: bool) {
        if let Some(hand) = self.hands[slot.index()].as_mut() {
            hand.pinching = pinching;
        }
    }

    /// Present hands as the sensor would report them this frame.
    pub fn frame(&mut self) -> Frame {
        self.frame_id += 1;
        let hands = self.hands.iter().flatten().map(SimHand::record).collect();
        Frame::new(self.frame_id, hands)
    }

    pub fn visible(&self) -> usize {
        self.hands.iter().flatten().count()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimFrameSource — keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Frame source driven by [`SimInput`] events from the visualizer's window.
///
/// Produces one frame per poll, like a sensor streaming at the render rate.
pub struct SimFrameSource {
    rx:     Receiver<SimInput>,
    rig:    SimRig,
    closed: bool,
}

impl SimFrameSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimFrameSource { rx, rig: SimRig::new(), closed: false }
    }

    pub fn rig(&self) -> &SimRig { &self.rig }

    /// True once the window asked to quit or went away.
    pub fn is_closed(&self) -> bool { self.closed }

    fn drain(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(SimInput::KeyDown(SimKey::Quit)) => {
                    self.closed = true;
                    return;
                }
                Ok(input) => {
                    debug!(?input, "sim input");
                    self.rig.apply(&input);
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    return;
                }
            }
        }
    }
}

impl FrameSource for SimFrameSource {
    fn open(&mut self) -> Result<()> {
        info!("keyboard simulation ready");
        Ok(())
    }

    fn poll(&mut self) -> Option<Frame> {
        if self.closed {
            return None;
        }
        self.drain();
        if self.closed {
            return None;
        }
        Some(self.rig.frame())
    }

    fn name(&self) -> &str { "simulation" }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapFrameSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Frame source backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// LeapC's poll blocks, so it runs on its own thread and hands converted
/// frames over a channel; [`FrameSource::poll`] keeps only the newest.
/// The sensor streams faster than the viewer ticks, so a hand that leaves
/// and re-enters between two ticks keeps its session and no Lost/Detected
/// pair is seen.
///
/// Disabling the service leaves the LeapC thread running; it exits on its
/// next tracking event after this source is dropped.
///
/// LeapC reports millimetres; everything is converted to metres here.
#[cfg(feature = "leap")]
pub struct LeapFrameSource {
    rx: Option<Receiver<Frame>>,
}

#[cfg(feature = "leap")]
impl LeapFrameSource {
    pub fn new() -> Self { LeapFrameSource { rx: None } }
}

#[cfg(feature = "leap")]
impl Default for LeapFrameSource {
    fn default() -> Self { Self::new() }
}

#[cfg(feature = "leap")]
impl FrameSource for LeapFrameSource {
    fn open(&mut self) -> Result<()> {
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        use hand_sessions::TrackingError;

        let (ready_tx, ready_rx) = mpsc::channel::<std::result::Result<(), String>>();
        let (frame_tx, frame_rx) = mpsc::channel();

        thread::spawn(move || leap::poll_loop(ready_tx, frame_tx));

        match ready_rx.recv_timeout(Duration::from_secs(3)) {
            Ok(Ok(())) => {
                self.rx = Some(frame_rx);
                Ok(())
            }
            Ok(Err(reason)) => Err(TrackingError::source_unavailable(reason)),
            Err(_) => Err(TrackingError::source_unavailable("LeapC did not respond")),
        }
    }

    fn poll(&mut self) -> Option<Frame> {
        let rx = self.rx.as_ref()?;
        let mut newest = None;
        while let Ok(frame) = rx.try_recv() {
            newest = Some(frame);
        }
        newest
    }

    fn name(&self) -> &str { "leapmotion" }
}

#[cfg(feature = "leap")]
mod leap {
    use std::sync::mpsc::Sender;

    use hand_sessions::{BoneType, FingerType, Frame, RawBone, RawFinger, RawHandRecord};
    use leaprs::*;
    use nalgebra::{Quaternion, UnitQuaternion, Vector3};
    use tracing::warn;

    const MM: f32 = 0.001;

    fn metres(x: f32, y: f32, z: f32) -> Vector3<f32> {
        Vector3::new(x, y, z) * MM
    }

    pub(super) fn poll_loop(
        ready: Sender<std::result::Result<(), String>>,
        frames: Sender<Frame>,
    ) {
        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c) => c,
            Err(e) => {
                let _ = ready.send(Err(format!("LeapC connection: {e:?}")));
                return;
            }
        };
        if let Err(e) = connection.open() {
            let _ = ready.send(Err(format!("LeapMotion device: {e:?}")));
            return;
        }
        let _ = ready.send(Ok(()));

        let mut frame_id = 0i64;
        loop {
            let msg = match connection.poll(100) {
                Ok(m) => m,
                Err(_) => continue,
            };
            if let Event::Tracking(tracking) = msg.event() {
                frame_id += 1;
                let hands = tracking.hands().into_iter().map(|h| convert_hand(&h)).collect();
                if frames.send(Frame::new(frame_id, hands)).is_err() {
                    warn!("frame receiver dropped; stopping LeapC poll");
                    return;
                }
            }
        }
    }

    fn convert_hand(hand: &HandRef) -> RawHandRecord {
        let palm = hand.palm();
        let p = palm.position();
        let n = palm.normal();
        let d = palm.direction();
        let w = hand.arm().next_joint();

        let fingers = hand
            .digits()
            .into_iter()
            .zip(FingerType::ALL)
            .map(|(digit, finger_type)| RawFinger {
                finger_type,
                bones: vec![
                    convert_bone(BoneType::Metacarpal, &digit.metacarpal()),
                    convert_bone(BoneType::Proximal, &digit.proximal()),
                    convert_bone(BoneType::Intermediate, &digit.intermediate()),
                    convert_bone(BoneType::Distal, &digit.distal()),
                ],
            })
            .collect();

        RawHandRecord {
            sensor_id:      hand.id as i32,
            is_left:        hand.hand_type() == HandType::Left,
            is_right:       hand.hand_type() == HandType::Right,
            palm_position:  metres(p.x, p.y, p.z),
            palm_normal:    Vector3::new(n.x, n.y, n.z),
            direction:      Vector3::new(d.x, d.y, d.z),
            wrist_position: metres(w.x, w.y, w.z),
            fingers,
        }
    }

    fn convert_bone(bone_type: BoneType, bone: &BoneRef) -> RawBone {
        let s = bone.prev_joint();
        let e = bone.next_joint();
        let q = bone.rotation();
        RawBone {
            bone_type,
            rotation: UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z)),
            start:    metres(s.x, s.y, s.z),
            end:      metres(e.x, e.y, e.z),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn empty_rig_reports_no_hands() {
        let mut rig = SimRig::new();
        assert!(rig.frame().hands.is_empty());
    }

    #[test]
    fn toggling_twice_removes_the_hand() {
        let mut rig = SimRig::new();
        rig.apply(&SimInput::KeyDown(SimKey::ToggleHand(Slot::First)));
        assert_eq!(rig.visible(), 1);
        rig.apply(&SimInput::KeyDown(SimKey::ToggleHand(Slot::First)));
        assert_eq!(rig.visible(), 0);
    }

    #[test]
    fn reentering_hand_gets_new_sensor_id() {
        let mut rig = SimRig::new();
        let toggle = SimInput::KeyDown(SimKey::ToggleHand(Slot::Second));
        rig.apply(&toggle);
        let first = rig.frame().hands[0].sensor_id;
        rig.apply(&toggle);
        rig.apply(&toggle);
        let second = rig.frame().hands[0].sensor_id;
        assert_ne!(first, second);
    }

    #[test]
    fn slots_default_to_left_and_right() {
        let mut rig = SimRig::new();
        rig.apply(&SimInput::KeyDown(SimKey::ToggleHand(Slot::First)));
        rig.apply(&SimInput::KeyDown(SimKey::ToggleHand(Slot::Second)));
        let frame = rig.frame();
        assert_eq!(frame.hands[0].handedness(), Handedness::Left);
        assert_eq!(frame.hands[1].handedness(), Handedness::Right);
    }

    #[test]
    fn swap_keeps_sensor_id() {
        let mut rig = SimRig::new();
        rig.apply(&SimInput::KeyDown(SimKey::ToggleHand(Slot::First)));
        let before = rig.frame().hands[0].clone();
        rig.apply(&SimInput::KeyDown(SimKey::SwapHandedness));
        let after = rig.frame().hands[0].clone();
        assert_eq!(before.sensor_id, after.sensor_id);
        assert_eq!(after.handedness(), Handedness::Right);
    }

    #[test]
    fn nudge_moves_palm() {
        let mut rig = SimRig::new();
        rig.apply(&SimInput::KeyDown(SimKey::ToggleHand(Slot::First)));
        let before = rig.frame().hands[0].palm_position;
        rig.apply(&SimInput::Nudge { slot: Slot::First, delta: Vector3::new(0.0, 0.0, -0.05) });
        let after = rig.frame().hands[0].palm_position;
        approx::assert_relative_eq!(after - before, Vector3::new(0.0, 0.0, -0.05), epsilon = 1e-6);
    }

    #[test]
    fn source_applies_inputs_before_framing() {
        let (tx, rx) = mpsc::channel();
        let mut src = SimFrameSource::new(rx);
        src.open().unwrap();
        tx.send(SimInput::KeyDown(SimKey::ToggleHand(Slot::First))).unwrap();
        tx.send(SimInput::KeyDown(SimKey::Pinch(Slot::First))).unwrap();

        let frame = src.poll().unwrap();
        assert_eq!(frame.hands.len(), 1);
        assert!(src.rig().visible() == 1);
    }

    #[test]
    fn quit_closes_source() {
        let (tx, rx) = mpsc::channel();
        let mut src = SimFrameSource::new(rx);
        tx.send(SimInput::KeyDown(SimKey::Quit)).unwrap();
        assert!(src.poll().is_none());
        assert!(src.is_closed());
    }

    #[test]
    fn dropped_window_closes_source() {
        let (tx, rx) = mpsc::channel::<SimInput>();
        let mut src = SimFrameSource::new(rx);
        drop(tx);
        assert!(src.poll().is_none());
        assert!(src.is_closed());
    }
}
