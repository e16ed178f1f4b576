//! Skeletal joint mapper — raw bone chains → canonical [`JointTable`].
//!
//! # Algorithm
//!
//! * Each `(finger, bone)` pair is looked up in a fixed table.  The bone's
//!   *start* point and rotation become that joint's pose.
//! * A distal bone additionally writes the fingertip, using the bone's *end*
//!   point and the same rotation.
//! * `Palm` and `Wrist` share one rotation: look along the hand direction
//!   with the negated palm normal as up.
//!
//! The table is updated in place.  Joints whose bone is missing this frame
//! keep their previous pose.

use tracing::trace;

use crate::joint::{look_rotation, BoneType, FingerType, JointTable, JointType, Pose};
use crate::record::{RawBone, RawHandRecord};

/// Canonical joint for a bone's start point.
///
/// The thumb has no metacarpal joint of its own: its proximal bone starts at
/// `ThumbMetacarpalJoint`, so every thumb mapping sits one level further out.
pub fn joint_for_bone(finger: FingerType, bone: BoneType) -> JointType {
    use BoneType::*;
    use JointType as J;

    match (finger, bone) {
        (FingerType::Thumb, Metacarpal)   => J::None,
        (FingerType::Thumb, Proximal)     => J::ThumbMetacarpalJoint,
        (FingerType::Thumb, Intermediate) => J::ThumbProximalJoint,
        (FingerType::Thumb, Distal)       => J::ThumbDistalJoint,

        (FingerType::Index, Metacarpal)   => J::IndexMetacarpal,
        (FingerType::Index, Proximal)     => J::IndexKnuckle,
        (FingerType::Index, Intermediate) => J::IndexMiddleJoint,
        (FingerType::Index, Distal)       => J::IndexDistalJoint,

        (FingerType::Middle, Metacarpal)   => J::MiddleMetacarpal,
        (FingerType::Middle, Proximal)     => J::MiddleKnuckle,
        (FingerType::Middle, Intermediate) => J::MiddleMiddleJoint,
        (FingerType::Middle, Distal)       => J::MiddleDistalJoint,

        (FingerType::Ring, Metacarpal)   => J::RingMetacarpal,
        (FingerType::Ring, Proximal)     => J::RingKnuckle,
        (FingerType::Ring, Intermediate) => J::RingMiddleJoint,
        (FingerType::Ring, Distal)       => J::RingDistalJoint,

        (FingerType::Pinky, Metacarpal)   => J::PinkyMetacarpal,
        (FingerType::Pinky, Proximal)     => J::PinkyKnuckle,
        (FingerType::Pinky, Intermediate) => J::PinkyMiddleJoint,
        (FingerType::Pinky, Distal)       => J::PinkyDistalJoint,
    }
}

fn map_bone(joints: &mut JointTable, finger: FingerType, bone: &RawBone) {
    let joint = joint_for_bone(finger, bone.bone_type);
    if joint == JointType::None {
        return;
    }
    joints.set(joint, Pose::new(bone.start, bone.rotation));

    if bone.bone_type == BoneType::Distal {
        joints.set(JointType::tip_of(finger), Pose::new(bone.end, bone.rotation));
    }
}

/// Update `joints` from one raw hand record.
pub fn map_hand(record: &RawHandRecord, joints: &mut JointTable) {
    for finger in &record.fingers {
        for bone in &finger.bones {
            map_bone(joints, finger.finger_type, bone);
        }
    }

    let palm_rotation = look_rotation(&record.direction, &-record.palm_normal);
    joints.set(JointType::Palm,  Pose::new(record.palm_position,  palm_rotation));
    joints.set(JointType::Wrist, Pose::new(record.wrist_position, palm_rotation));

    trace!(
        sensor_id = record.sensor_id,
        fingers = record.fingers.len(),
        joints = joints.len(),
        "mapped hand skeleton"
    );
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
