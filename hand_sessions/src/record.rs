//! Raw per-frame input as delivered by the sensor.
//!
//! These types mirror what a skeletal hand sensor reports: one record per
//! visible hand, each with five fingers of up to four bones.  Nothing here is
//! validated; the mapper copes with whatever subset arrives.

use nalgebra::{UnitQuaternion, Vector3};

use crate::joint::{BoneType, FingerType};

/// Sensor-assigned hand identifier.  Volatile: the sensor may reuse it for a
/// different physical hand after an occlusion.
pub type SensorHandId = i32;

/// Which hand a record or session represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
    Other,
}

impl Handedness {
    /// Classify from the sensor's left/right flags.  Left wins if both are
    /// set; neither set is `Other`.
    pub fn from_flags(is_left: bool, is_right: bool) -> Self {
        if is_left {
            Handedness::Left
        } else if is_right {
            Handedness::Right
        } else {
            Handedness::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Handedness::Left  => "left",
            Handedness::Right => "right",
            Handedness::Other => "other",
        }
    }
}

/// One bone of a finger.
#[derive(Clone, Debug, PartialEq)]
pub struct RawBone {
    pub bone_type: BoneType,
    pub rotation:  UnitQuaternion<f32>,
    /// Joint nearer the wrist.
    pub start:     Vector3<f32>,
    /// Joint nearer the fingertip.
    pub end:       Vector3<f32>,
}

/// One finger: bones ordered from the wrist outwards.
#[derive(Clone, Debug, PartialEq)]
pub struct RawFinger {
    pub finger_type: FingerType,
    pub bones:       Vec<RawBone>,
}

/// One hand as reported in a single sensor frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RawHandRecord {
    pub sensor_id:      SensorHandId,
    pub is_left:        bool,
    pub is_right:       bool,
    pub palm_position:  Vector3<f32>,
    pub palm_normal:    Vector3<f32>,
    /// Direction from the palm towards the fingers.
    pub direction:      Vector3<f32>,
    pub wrist_position: Vector3<f32>,
    pub fingers:        Vec<RawFinger>,
}

impl RawHandRecord {
    pub fn handedness(&self) -> Handedness {
        Handedness::from_flags(self.is_left, self.is_right)
    }
}

/// Everything the sensor reported in one update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub id:    i64,
    pub hands: Vec<RawHandRecord>,
}

impl Frame {
    pub fn new(id: i64, hands: Vec<RawHandRecord>) -> Self {
        Frame { id, hands }
    }

    pub fn contains(&self, sensor_id: SensorHandId) -> bool {
        self.hands.iter().any(|h| h.sensor_id == sensor_id)
    }
}
