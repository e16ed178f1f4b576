//! Canonical joint vocabulary and the per-hand pose table.
//!
//! [`JointType`] names every landmark a hand session can report.  A
//! [`JointTable`] holds the most recent [`Pose`] seen for each of them.

use nalgebra::{UnitQuaternion, Vector3};

// ════════════════════════════════════════════════════════════════════════════
// Fingers and bones (sensor vocabulary)
// ════════════════════════════════════════════════════════════════════════════

/// Finger identity as reported by the sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FingerType {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl FingerType {
    pub const ALL: [FingerType; 5] = [
        FingerType::Thumb,
        FingerType::Index,
        FingerType::Middle,
        FingerType::Ring,
        FingerType::Pinky,
    ];
}

/// Bone identity within a finger, ordered from the wrist outwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoneType {
    Metacarpal,
    Proximal,
    Intermediate,
    Distal,
}

impl BoneType {
    pub const ALL: [BoneType; 4] = [
        BoneType::Metacarpal,
        BoneType::Proximal,
        BoneType::Intermediate,
        BoneType::Distal,
    ];
}

// ════════════════════════════════════════════════════════════════════════════
// JointType — canonical landmark vocabulary
// ════════════════════════════════════════════════════════════════════════════

/// The 26 canonical joint names.  `None` means "no mapping" and is never
/// stored in a [`JointTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JointType {
    None,
    Wrist,
    Palm,
    ThumbMetacarpalJoint,
    ThumbProximalJoint,
    ThumbDistalJoint,
    ThumbTip,
    IndexMetacarpal,
    IndexKnuckle,
    IndexMiddleJoint,
    IndexDistalJoint,
    IndexTip,
    MiddleMetacarpal,
    MiddleKnuckle,
    MiddleMiddleJoint,
    MiddleDistalJoint,
    MiddleTip,
    RingMetacarpal,
    RingKnuckle,
    RingMiddleJoint,
    RingDistalJoint,
    RingTip,
    PinkyMetacarpal,
    PinkyKnuckle,
    PinkyMiddleJoint,
    PinkyDistalJoint,
    PinkyTip,
}

/// Number of storable joints (everything except `None`).
pub const JOINT_COUNT: usize = 26;

impl JointType {
    /// Every storable joint, in table order.
    pub const ALL: [JointType; JOINT_COUNT] = [
        JointType::Wrist,
        JointType::Palm,
        JointType::ThumbMetacarpalJoint,
        JointType::ThumbProximalJoint,
        JointType::ThumbDistalJoint,
        JointType::ThumbTip,
        JointType::IndexMetacarpal,
        JointType::IndexKnuckle,
        JointType::IndexMiddleJoint,
        JointType::IndexDistalJoint,
        JointType::IndexTip,
        JointType::MiddleMetacarpal,
        JointType::MiddleKnuckle,
        JointType::MiddleMiddleJoint,
        JointType::MiddleDistalJoint,
        JointType::MiddleTip,
        JointType::RingMetacarpal,
        JointType::RingKnuckle,
        JointType::RingMiddleJoint,
        JointType::RingDistalJoint,
        JointType::RingTip,
        JointType::PinkyMetacarpal,
        JointType::PinkyKnuckle,
        JointType::PinkyMiddleJoint,
        JointType::PinkyDistalJoint,
        JointType::PinkyTip,
    ];

    /// Slot in a [`JointTable`]; `None` for [`JointType::None`].
    fn slot(self) -> Option<usize> {
        match self {
            JointType::None => None,
            other => Some(other as usize - 1),
        }
    }

    /// Fingertip joint of `finger`.
    pub fn tip_of(finger: FingerType) -> JointType {
        match finger {
            FingerType::Thumb  => JointType::ThumbTip,
            FingerType::Index  => JointType::IndexTip,
            FingerType::Middle => JointType::MiddleTip,
            FingerType::Ring   => JointType::RingTip,
            FingerType::Pinky  => JointType::PinkyTip,
        }
    }

    pub fn is_tip(self) -> bool {
        FingerType::ALL.iter().any(|&f| JointType::tip_of(f) == self)
    }

    /// Kebab-case name, stable for logs and the viewer.
    pub fn name(self) -> &'static str {
        match self {
            JointType::None                 => "none",
            JointType::Wrist                => "wrist",
            JointType::Palm                 => "palm",
            JointType::ThumbMetacarpalJoint => "thumb-metacarpal-joint",
            JointType::ThumbProximalJoint   => "thumb-proximal-joint",
            JointType::ThumbDistalJoint     => "thumb-distal-joint",
            JointType::ThumbTip             => "thumb-tip",
            JointType::IndexMetacarpal      => "index-metacarpal",
            JointType::IndexKnuckle         => "index-knuckle",
            JointType::IndexMiddleJoint     => "index-middle-joint",
            JointType::IndexDistalJoint     => "index-distal-joint",
            JointType::IndexTip             => "index-tip",
            JointType::MiddleMetacarpal     => "middle-metacarpal",
            JointType::MiddleKnuckle        => "middle-knuckle",
            JointType::MiddleMiddleJoint    => "middle-middle-joint",
            JointType::MiddleDistalJoint    => "middle-distal-joint",
            JointType::MiddleTip            => "middle-tip",
            JointType::RingMetacarpal       => "ring-metacarpal",
            JointType::RingKnuckle          => "ring-knuckle",
            JointType::RingMiddleJoint      => "ring-middle-joint",
            JointType::RingDistalJoint      => "ring-distal-joint",
            JointType::RingTip              => "ring-tip",
            JointType::PinkyMetacarpal      => "pinky-metacarpal",
            JointType::PinkyKnuckle         => "pinky-knuckle",
            JointType::PinkyMiddleJoint     => "pinky-middle-joint",
            JointType::PinkyDistalJoint     => "pinky-distal-joint",
            JointType::PinkyTip             => "pinky-tip",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Pose
// ════════════════════════════════════════════════════════════════════════════

/// Position plus orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl Pose {
    /// Zero position, identity rotation.
    pub fn identity() -> Self {
        Pose { position: Vector3::zeros(), rotation: UnitQuaternion::identity() }
    }

    pub fn new(position: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Pose { position, rotation }
    }

    /// Local +Z axis in world space.
    pub fn forward(&self) -> Vector3<f32> {
        self.rotation * Vector3::z()
    }

    /// Local +Y axis in world space.
    pub fn up(&self) -> Vector3<f32> {
        self.rotation * Vector3::y()
    }
}

impl Default for Pose {
    fn default() -> Self { Pose::identity() }
}

const LOOK_EPSILON: f32 = 1e-6;

/// Rotation whose local +Z points along `forward` and whose local +Y leans
/// towards `up`.
///
/// A zero `forward` gives the identity.  When `forward` and `up` are
/// colinear the roll is arbitrary and the shortest arc from +Z is used.
pub fn look_rotation(forward: &Vector3<f32>, up: &Vector3<f32>) -> UnitQuaternion<f32> {
    if forward.norm_squared() < LOOK_EPSILON {
        return UnitQuaternion::identity();
    }
    if up.cross(forward).norm_squared() < LOOK_EPSILON {
        return UnitQuaternion::rotation_between(&Vector3::z(), forward).unwrap_or_else(|| {
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f32::consts::PI)
        });
    }
    UnitQuaternion::face_towards(forward, up)
}

// ════════════════════════════════════════════════════════════════════════════
// JointTable
// ════════════════════════════════════════════════════════════════════════════

/// Most recent pose per joint for one hand.
///
/// Keys are present only for joints that have been observed at least once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JointTable {
    slots: [Option<Pose>; JOINT_COUNT],
}

impl JointTable {
    pub fn new() -> Self { Self::default() }

    /// Insert or overwrite.  `JointType::None` is ignored.
    pub fn set(&mut self, joint: JointType, pose: Pose) {
        if let Some(i) = joint.slot() {
            self.slots[i] = Some(pose);
        }
    }

    pub fn get(&self, joint: JointType) -> Option<Pose> {
        joint.slot().and_then(|i| self.slots[i])
    }

    pub fn contains(&self, joint: JointType) -> bool {
        self.get(joint).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn clear(&mut self) {
        self.slots = [None; JOINT_COUNT];
    }

    /// Observed joints in vocabulary order.
    pub fn iter(&self) -> impl Iterator<Item = (JointType, Pose)> + '_ {
        JointType::ALL
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(&j, p)| p.map(|p| (j, p)))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
