//! End-to-end session lifecycle through the public API.

use hand_sessions::{
    Frame, HandEvent, HandRegistry, HandTrackingService, Handedness, JointType, NullSink,
    ScriptedSource, SessionId, SyntheticHand, TrackingConfig, Viewpoint,
};
use nalgebra::Vector3;

fn detected(events: &[HandEvent]) -> Vec<SessionId> {
    events
        .iter()
        .filter_map(|e| match e {
            HandEvent::Detected { session, .. } => Some(*session),
            _ => None,
        })
        .collect()
}

fn lost(events: &[HandEvent]) -> Vec<SessionId> {
    events
        .iter()
        .filter_map(|e| match e {
            HandEvent::Lost { session, .. } => Some(*session),
            _ => None,
        })
        .collect()
}

#[test]
fn hand_leaving_and_returning_gets_a_new_session() {
    let mut reg = HandRegistry::new(TrackingConfig::default());
    let v = Viewpoint::default();
    let mut events = Vec::new();

    for tick in 1..=5 {
        let hands = if tick == 4 { vec![] } else { vec![SyntheticHand::right(42).build()] };
        reg.on_frame(&Frame::new(tick, hands), &v, &mut events);
    }

    let d = detected(&events);
    let l = lost(&events);
    assert_eq!(d.len(), 2);
    assert_eq!(l, vec![d[0]]);
    assert_ne!(d[0], d[1]);
    assert_eq!(reg.session(42).map(|s| s.id()), Some(d[1]));
}

#[test]
fn swapped_handedness_is_a_new_hand() {
    let mut reg = HandRegistry::new(TrackingConfig::default());
    let v = Viewpoint::default();
    let mut events = Vec::new();

    reg.on_frame(&Frame::new(1, vec![SyntheticHand::left(3).build()]), &v, &mut events);
    events.clear();
    reg.on_frame(&Frame::new(2, vec![SyntheticHand::right(3).build()]), &v, &mut events);

    let kinds: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            HandEvent::Lost { handedness: Handedness::Left, .. } => Some("lost-left"),
            HandEvent::Detected { handedness: Handedness::Right, .. } => Some("detected-right"),
            HandEvent::Lost { .. } | HandEvent::Detected { .. } => Some("other"),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec!["lost-left", "detected-right"]);
}

#[test]
fn identical_frames_give_identical_joints() {
    let mut reg = HandRegistry::new(TrackingConfig::default());
    let v = Viewpoint::default();
    let rec = SyntheticHand::left(1).pinch_gap(0.03).build();

    reg.on_frame(&Frame::new(1, vec![rec.clone()]), &v, &mut NullSink);
    let first = reg.snapshots()[0].joints.clone();
    reg.on_frame(&Frame::new(2, vec![rec]), &v, &mut NullSink);
    assert_eq!(reg.snapshots()[0].joints, first);
}

#[test]
fn pinch_follows_hysteresis_across_frames() {
    let mut reg = HandRegistry::new(TrackingConfig::default());
    let v = Viewpoint::default();
    let gaps = [0.03, 0.045, 0.06, 0.045, 0.03];
    let mut states = Vec::new();

    for (i, gap) in gaps.iter().enumerate() {
        let frame = Frame::new(i as i64, vec![SyntheticHand::right(1).pinch_gap(*gap).build()]);
        reg.on_frame(&frame, &v, &mut NullSink);
        states.push(reg.snapshots()[0].is_pinching);
    }
    assert_eq!(states, vec![true, true, false, false, true]);
}

#[test]
fn palm_facing_viewer_disables_pointing() {
    let mut reg = HandRegistry::new(TrackingConfig::default());
    let v = Viewpoint::new(Vector3::zeros(), -Vector3::z());

    // normal = −forward: the palm faces the viewer
    let facing_viewer = SyntheticHand::right(1).facing(Vector3::z(), Vector3::y());
    reg.on_frame(&Frame::new(1, vec![facing_viewer.build()]), &v, &mut NullSink);
    assert!(!reg.snapshots()[0].in_pointing_pose);

    let sideways = SyntheticHand::right(1).facing(Vector3::x(), -Vector3::z());
    reg.on_frame(&Frame::new(2, vec![sideways.build()]), &v, &mut NullSink);
    assert!(reg.snapshots()[0].in_pointing_pose);
}

#[test]
fn grip_and_index_follow_the_skeleton() {
    let mut reg = HandRegistry::new(TrackingConfig::default());
    reg.on_frame(
        &Frame::new(1, vec![SyntheticHand::left(1).build()]),
        &Viewpoint::default(),
        &mut NullSink,
    );
    let s = &reg.snapshots()[0];
    assert_eq!(Some(s.grip_pose), s.joints.get(JointType::Palm));
    assert_eq!(Some(s.index_pose), s.joints.get(JointType::IndexTip));
}

#[test]
fn service_round_trip_over_channel() {
    let frames = vec![
        Frame::new(1, vec![SyntheticHand::left(1).build(), SyntheticHand::right(2).build()]),
        Frame::new(2, vec![SyntheticHand::right(2).build()]),
    ];
    let (tx, rx) = std::sync::mpsc::channel();
    let mut svc = HandTrackingService::new(ScriptedSource::new(frames), tx, TrackingConfig::default());

    svc.enable().unwrap();
    while svc.tick(&Viewpoint::default()) {}
    svc.disable();
    drop(svc);

    let events: Vec<HandEvent> = rx.iter().collect();
    assert_eq!(detected(&events).len(), 2);
    assert_eq!(lost(&events).len(), 2);
}

#[test]
fn unavailable_source_never_produces_events() {
    let mut src = ScriptedSource::unavailable();
    src.push(Frame::new(1, vec![SyntheticHand::left(1).build()]));
    let mut svc = HandTrackingService::new(src, Vec::new(), TrackingConfig::default());

    assert!(svc.enable().is_err());
    for _ in 0..3 {
        svc.tick(&Viewpoint::default());
    }
    svc.disable();
    assert!(svc.sink().is_empty());
}
