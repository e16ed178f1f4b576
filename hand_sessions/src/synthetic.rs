//! Synthetic hand records.
//!
//! Builds anatomically plausible [`RawHandRecord`]s without a sensor.  The
//! simulated frame source in `leap_hands` drives these from the keyboard, and
//! the tests use them as fixtures.
//!
//! All distances are in metres.

use nalgebra::Vector3;

use crate::joint::{look_rotation, BoneType, FingerType};
use crate::record::{Handedness, RawBone, RawFinger, RawHandRecord, SensorHandId};

// Lateral offset of each finger's knuckle towards the thumb side.
const KNUCKLE_SPREAD: [f32; 4] = [0.024, 0.007, -0.010, -0.026];
// Proximal, intermediate and distal lengths for index..pinky.
const PHALANGES: [[f32; 3]; 4] = [
    [0.040, 0.024, 0.019],
    [0.045, 0.028, 0.020],
    [0.042, 0.027, 0.019],
    [0.033, 0.019, 0.017],
];
const PALM_TO_KNUCKLE: f32 = 0.035;

/// Builder for one synthetic hand.
#[derive(Clone, Debug)]
pub struct SyntheticHand {
    sensor_id:  SensorHandId,
    handedness: Handedness,
    palm:       Vector3<f32>,
    normal:     Vector3<f32>,
    direction:  Vector3<f32>,
    pinch_gap:  Option<f32>,
    missing:    Vec<FingerType>,
}

impl SyntheticHand {
    /// Palm down, fingers pointing away from the viewer (−Z), 20 cm up.
    pub fn new(sensor_id: SensorHandId, handedness: Handedness) -> Self {
        let side = match handedness {
            Handedness::Left  => -0.12,
            Handedness::Right => 0.12,
            Handedness::Other => 0.0,
        };
        SyntheticHand {
            sensor_id,
            handedness,
            palm:      Vector3::new(side, 0.20, -0.30),
            normal:    Vector3::new(0.0, -1.0, 0.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
            pinch_gap: None,
            missing:   Vec::new(),
        }
    }

    pub fn left(sensor_id: SensorHandId) -> Self { Self::new(sensor_id, Handedness::Left) }
    pub fn right(sensor_id: SensorHandId) -> Self { Self::new(sensor_id, Handedness::Right) }

    pub fn palm_at(mut self, palm: Vector3<f32>) -> Self {
        self.palm = palm;
        self
    }

    /// Orient the hand.  Both vectors are normalised; they should be
    /// roughly perpendicular.
    pub fn facing(mut self, normal: Vector3<f32>, direction: Vector3<f32>) -> Self {
        self.normal = normal.normalize();
        self.direction = direction.normalize();
        self
    }

    /// Place the thumb tip exactly `gap` metres from the index tip.
    pub fn pinch_gap(mut self, gap: f32) -> Self {
        self.pinch_gap = Some(gap.max(0.0));
        self
    }

    pub fn without_finger(mut self, finger: FingerType) -> Self {
        self.missing.push(finger);
        self
    }

    pub fn build(&self) -> RawHandRecord {
        let fwd = self.direction;
        let up = -self.normal;
        let lateral = fwd.cross(&self.normal).normalize();
        let thumb_side = match self.handedness {
            Handedness::Right => lateral,
            _ => -lateral,
        };
        let wrist = self.palm - fwd * 0.06;

        let mut fingers: Vec<RawFinger> = FingerType::ALL
            .iter()
            .filter(|f| !self.missing.contains(*f))
            .map(|&finger| match finger {
                FingerType::Thumb => self.thumb(wrist, fwd, up, thumb_side),
                _ => self.finger(finger, wrist, fwd, up, thumb_side),
            })
            .collect();

        if let Some(gap) = self.pinch_gap {
            close_pinch(&mut fingers, gap, up);
        }

        RawHandRecord {
            sensor_id:      self.sensor_id,
            is_left:        self.handedness == Handedness::Left,
            is_right:       self.handedness == Handedness::Right,
            palm_position:  self.palm,
            palm_normal:    self.normal,
            direction:      fwd,
            wrist_position: wrist,
            fingers,
        }
    }

    fn finger(
        &self,
        finger: FingerType,
        wrist: Vector3<f32>,
        fwd: Vector3<f32>,
        up: Vector3<f32>,
        thumb_side: Vector3<f32>,
    ) -> RawFinger {
        let k = finger as usize - 1;
        let spread = thumb_side * KNUCKLE_SPREAD[k];
        let knuckle = self.palm + fwd * PALM_TO_KNUCKLE + spread;
        let base = wrist + spread * 0.4;

        let mut bones = vec![segment(BoneType::Metacarpal, base, knuckle, up)];
        let mut at = knuckle;
        for (bone_type, len) in [BoneType::Proximal, BoneType::Intermediate, BoneType::Distal]
            .into_iter()
            .zip(PHALANGES[k])
        {
            let next = at + fwd * len;
            bones.push(segment(bone_type, at, next, up));
            at = next;
        }
        RawFinger { finger_type: finger, bones }
    }

    fn thumb(
        &self,
        wrist: Vector3<f32>,
        fwd: Vector3<f32>,
        up: Vector3<f32>,
        thumb_side: Vector3<f32>,
    ) -> RawFinger {
        let out = (fwd + thumb_side * 1.2).normalize();
        let base = wrist + thumb_side * 0.015;
        let mut at = base + out * 0.035;
        let mut bones = vec![segment(BoneType::Metacarpal, base, at, up)];
        for (bone_type, len) in [
            (BoneType::Proximal, 0.032),
            (BoneType::Intermediate, 0.028),
            (BoneType::Distal, 0.022),
        ] {
            let next = at + out * len;
            bones.push(segment(bone_type, at, next, up));
            at = next;
        }
        RawFinger { finger_type: FingerType::Thumb, bones }
    }
}

fn segment(bone_type: BoneType, start: Vector3<f32>, end: Vector3<f32>, up: Vector3<f32>) -> RawBone {
    RawBone {
        bone_type,
        rotation: look_rotation(&(end - start), &up),
        start,
        end,
    }
}

fn distal_mut(fingers: &mut [RawFinger], finger: FingerType) -> Option<&mut RawBone> {
    fingers
        .iter_mut()
        .find(|f| f.finger_type == finger)?
        .bones
        .iter_mut()
        .find(|b| b.bone_type == BoneType::Distal)
}

/// Drag the thumb tip to sit `gap` from the index tip, keeping its approach
/// direction.
fn close_pinch(fingers: &mut [RawFinger], gap: f32, up: Vector3<f32>) {
    let Some(index_tip) = distal_mut(fingers, FingerType::Index).map(|b| b.end) else {
        return;
    };
    if let Some(thumb) = distal_mut(fingers, FingerType::Thumb) {
        let toward = thumb.end - index_tip;
        let dir = toward.try_normalize(1e-9).unwrap_or_else(Vector3::x);
        thumb.end = index_tip + dir * gap;
        thumb.rotation = look_rotation(&(thumb.end - thumb.start), &up);
    }
}
