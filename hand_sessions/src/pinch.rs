//! Pinch gesture detector.
//!
//! Two thresholds with a dead zone between them: a hand starts pinching when
//! the thumb and index tips come closer than `start_distance` and stops only
//! once they separate beyond `stop_distance`.  Anything in between keeps the
//! previous state, so a hand hovering near the boundary does not chatter.

use crate::config::PinchConfig;
use crate::joint::{JointTable, JointType};

/// Per-session pinch state with hysteresis memory.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchDetector {
    is_pinching:    bool,
    start_distance: f32,
    stop_distance:  f32,
}

impl PinchDetector {
    pub fn new(config: PinchConfig) -> Self {
        PinchDetector {
            is_pinching:    false,
            start_distance: config.start_distance,
            stop_distance:  config.stop_distance,
        }
    }

    pub fn is_pinching(&self) -> bool { self.is_pinching }

    /// Distance between thumb and index tips, if both are known.
    pub fn tip_distance(joints: &JointTable) -> Option<f32> {
        let thumb = joints.get(JointType::ThumbTip)?;
        let index = joints.get(JointType::IndexTip)?;
        Some((thumb.position - index.position).norm())
    }

    /// Evaluate once per tick against the current joint table.
    pub fn update(&mut self, joints: &JointTable) -> bool {
        self.update_distance(Self::tip_distance(joints))
    }

    /// Feed a raw tip distance; `None` means a landmark is missing and
    /// forces the gesture off.
    pub fn update_distance(&mut self, distance: Option<f32>) -> bool {
        match distance {
            None => self.is_pinching = false,
            Some(d) if self.is_pinching && d > self.stop_distance => self.is_pinching = false,
            Some(d) if !self.is_pinching && d < self.start_distance => self.is_pinching = true,
            Some(_) => {}
        }
        self.is_pinching
    }

    pub fn reset(&mut self) {
        self.is_pinching = false;
    }
}

impl Default for PinchDetector {
    fn default() -> Self { PinchDetector::new(PinchConfig::default()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::Pose;
    use nalgebra::{UnitQuaternion, Vector3};

    fn tips(gap: f32) -> JointTable {
        let mut t = JointTable::new();
        t.set(JointType::ThumbTip, Pose::new(Vector3::zeros(), UnitQuaternion::identity()));
        t.set(JointType::IndexTip, Pose::new(Vector3::new(gap, 0.0, 0.0), UnitQuaternion::identity()));
        t
    }

    #[test]
    fn starts_not_pinching() {
        assert!(!PinchDetector::default().is_pinching());
    }

    #[test]
    fn hysteresis_sequence() {
        let mut p = PinchDetector::default();
        let out: Vec<bool> = [0.03, 0.045, 0.06, 0.045, 0.03]
            .iter()
            .map(|&d| p.update_distance(Some(d)))
            .collect();
        assert_eq!(out, vec![true, true, false, false, true]);
    }

    #[test]
    fn dead_zone_does_not_start() {
        let mut p = PinchDetector::default();
        for _ in 0..10 {
            assert!(!p.update_distance(Some(0.045)));
        }
    }

    #[test]
    fn thresholds_are_exclusive() {
        let mut p = PinchDetector::default();
        assert!(!p.update_distance(Some(0.04)));
        assert!(p.update_distance(Some(0.039)));
        assert!(p.update_distance(Some(0.05)));
        assert!(!p.update_distance(Some(0.051)));
    }

    #[test]
    fn missing_landmark_forces_release() {
        let mut p = PinchDetector::default();
        assert!(p.update(&tips(0.01)));
        let mut no_index = JointTable::new();
        no_index.set(JointType::ThumbTip, Pose::default());
        assert!(!p.update(&no_index));
        assert!(!p.update(&JointTable::new()));
    }

    #[test]
    fn update_from_joint_table() {
        let mut p = PinchDetector::default();
        assert!(!p.update(&tips(0.08)));
        assert!(p.update(&tips(0.02)));
        assert!(p.update(&tips(0.048)));
        assert!(!p.update(&tips(0.052)));
    }

    #[test]
    fn custom_thresholds() {
        let mut p = PinchDetector::new(PinchConfig { start_distance: 0.01, stop_distance: 0.02 });
        assert!(!p.update_distance(Some(0.015)));
        assert!(p.update_distance(Some(0.005)));
        assert!(p.update_distance(Some(0.015)));
        p.reset();
        assert!(!p.is_pinching());
    }
}
