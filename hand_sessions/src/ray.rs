//! Pointer ray calculator.
//!
//! The pointer ray starts at the palm and points away from an estimated
//! shoulder pivot, so small wrist rotations don't swing the ray wildly.  The
//! ray strategy sits behind [`RayStabilizer`]; [`ShoulderRay`] is the
//! default.
//!
//! [`is_in_pointing_pose`] decides whether a hand is held in a way that
//! should show a far pointer at all: not with the palm facing the viewer,
//! and not with the palm turned up.

use nalgebra::Vector3;

use crate::config::{PointingConfig, RayConfig};
use crate::joint::{look_rotation, JointTable, JointType, Pose};
use crate::record::Handedness;

// ════════════════════════════════════════════════════════════════════════════
// Viewpoint and Ray
// ════════════════════════════════════════════════════════════════════════════

/// The observing head or camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewpoint {
    pub position: Vector3<f32>,
    /// Unit view direction.
    pub forward:  Vector3<f32>,
    /// Unit up direction of the head.
    pub up:       Vector3<f32>,
}

impl Viewpoint {
    /// Normalises `forward`; up is world +Y.
    pub fn new(position: Vector3<f32>, forward: Vector3<f32>) -> Self {
        Viewpoint {
            position,
            forward: forward.try_normalize(f32::EPSILON).unwrap_or_else(|| -Vector3::z()),
            up: Vector3::y(),
        }
    }

    /// Head-right, perpendicular to forward and up.
    pub fn right(&self) -> Vector3<f32> {
        self.forward
            .cross(&self.up)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::x)
    }
}

impl Default for Viewpoint {
    /// At the origin looking down −Z.
    fn default() -> Self {
        Viewpoint::new(Vector3::zeros(), -Vector3::z())
    }
}

/// A half-line with a unit direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin:    Vector3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    /// Pose at the origin looking along the ray.
    pub fn pose(&self) -> Pose {
        Pose::new(self.origin, look_rotation(&self.direction, &Vector3::y()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RayStabilizer — replaceable ray strategy
// ════════════════════════════════════════════════════════════════════════════

/// Turns a palm position into a smoothed pointer ray.  One instance per
/// hand session; implementations may keep history between calls.
pub trait RayStabilizer: Send {
    /// `reference_direction` is the palm normal.  The returned direction must
    /// be unit length.
    fn update(
        &mut self,
        origin: Vector3<f32>,
        reference_direction: Vector3<f32>,
        viewpoint: &Viewpoint,
        handedness: Handedness,
    ) -> Ray;

    /// Forget smoothing history.
    fn reset(&mut self);
}

/// Default ray strategy: direction from an estimated shoulder through the
/// palm, smoothed with a distance-dependent exponential decay.
#[derive(Clone, Debug)]
pub struct ShoulderRay {
    config: RayConfig,
    state:  Option<Ray>,
}

impl ShoulderRay {
    pub fn new(config: RayConfig) -> Self {
        ShoulderRay { config, state: None }
    }

    /// Estimated shoulder joint for `handedness` below and beside the head.
    pub fn pivot(&self, viewpoint: &Viewpoint, handedness: Handedness) -> Vector3<f32> {
        let neck = viewpoint.position - viewpoint.up * self.config.neck_drop;
        let side = match handedness {
            Handedness::Left  => -1.0,
            Handedness::Right => 1.0,
            Handedness::Other => 0.0,
        };
        neck + viewpoint.right() * (side * self.config.shoulder_offset)
    }
}

impl Default for ShoulderRay {
    fn default() -> Self { ShoulderRay::new(RayConfig::default()) }
}

/// Blend factor that moves further the further the sample jumped:
/// `1 − 0.5^(delta / half_life)`.
pub fn decay_coefficient(half_life: f32, delta: f32) -> f32 {
    if half_life <= 0.0 {
        return 1.0;
    }
    1.0 - 0.5_f32.powf(delta / half_life)
}

fn decay_towards(from: Vector3<f32>, to: Vector3<f32>, half_life: f32) -> Vector3<f32> {
    let t = decay_coefficient(half_life, (to - from).norm());
    from.lerp(&to, t)
}

impl RayStabilizer for ShoulderRay {
    fn update(
        &mut self,
        origin: Vector3<f32>,
        reference_direction: Vector3<f32>,
        viewpoint: &Viewpoint,
        handedness: Handedness,
    ) -> Ray {
        let direction = (origin - self.pivot(viewpoint, handedness))
            .try_normalize(f32::EPSILON)
            .or_else(|| reference_direction.try_normalize(f32::EPSILON))
            .unwrap_or(viewpoint.forward);

        let ray = match self.state {
            None => Ray { origin, direction },
            Some(prev) => {
                let o = decay_towards(prev.origin, origin, self.config.position_half_life);
                let d = decay_towards(prev.direction, direction, self.config.direction_half_life);
                Ray {
                    origin: o,
                    // A half-way blend of opposite directions can vanish.
                    direction: d.try_normalize(f32::EPSILON).unwrap_or(direction),
                }
            }
        };
        self.state = Some(ray);
        ray
    }

    fn reset(&mut self) {
        self.state = None;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Palm geometry
// ════════════════════════════════════════════════════════════════════════════

/// Palm normal recovered from the palm joint: the palm's local down axis.
///
/// The mapper builds the palm rotation with the negated sensor normal as up,
/// so this returns the sensor's palm normal.
pub fn palm_normal(joints: &JointTable) -> Option<Vector3<f32>> {
    joints.get(JointType::Palm).map(|p| -p.up())
}

/// True unless the palm faces the viewer or faces up, within the configured
/// cosine bounds.  A negative bound disables that check.
///
/// Both the normal and the view direction are normalised first.  A zero
/// normal has no facing, so neither check can reject it.
pub fn is_in_pointing_pose(
    palm_normal: &Vector3<f32>,
    viewpoint: &Viewpoint,
    config: &PointingConfig,
) -> bool {
    let Some(n) = palm_normal.try_normalize(f32::EPSILON) else {
        return true;
    };
    if config.backward_tolerance_cosine >= 0.0 {
        let backward = -viewpoint
            .forward
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| -Vector3::z());
        if n.dot(&backward) > config.backward_tolerance_cosine {
            return false;
        }
    }
    if config.up_tolerance_cosine >= 0.0 && n.dot(&Vector3::y()) > config.up_tolerance_cosine {
        return false;
    }
    true
}

/// Pointer and grip poses for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerUpdate {
    pub pointer: Pose,
    pub grip:    Pose,
    pub ray:     Ray,
}

/// Derive pointer and grip from the current joints.
///
/// Returns `None` when the palm is unknown or sits exactly at the origin,
/// which the sensor uses for "no position".
pub fn compute_pointer(
    joints: &JointTable,
    viewpoint: &Viewpoint,
    handedness: Handedness,
    stabilizer: &mut dyn RayStabilizer,
) -> Option<PointerUpdate> {
    let palm = joints.get(JointType::Palm)?;
    if palm.position == Vector3::zeros() {
        return None;
    }
    let normal = palm_normal(joints)?;
    let ray = stabilizer.update(palm.position, normal, viewpoint, handedness);
    Some(PointerUpdate { pointer: ray.pose(), grip: palm, ray })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::map_hand;
    use crate::synthetic::SyntheticHand;
    use approx::assert_relative_eq;

    fn head() -> Viewpoint {
        Viewpoint::new(Vector3::new(0.0, 0.0, 0.0), -Vector3::z())
    }

    #[test]
    fn palm_facing_viewer_is_not_pointing() {
        let v = head();
        let n = -v.forward;
        assert!(!is_in_pointing_pose(&n, &v, &PointingConfig::default()));
    }

    #[test]
    fn palm_perpendicular_to_view_is_pointing() {
        let v = head();
        let n = Vector3::x();
        assert!(is_in_pointing_pose(&n, &v, &PointingConfig::default()));
    }

    #[test]
    fn palm_down_is_pointing() {
        let n = -Vector3::y();
        assert!(is_in_pointing_pose(&n, &head(), &PointingConfig::default()));
    }

    #[test]
    fn palm_up_is_not_pointing() {
        let n = Vector3::y();
        assert!(!is_in_pointing_pose(&n, &head(), &PointingConfig::default()));
    }

    #[test]
    fn negative_tolerance_disables_check() {
        let v = head();
        let cfg = PointingConfig { backward_tolerance_cosine: -1.0, up_tolerance_cosine: -1.0 };
        assert!(is_in_pointing_pose(&-v.forward, &v, &cfg));
        assert!(is_in_pointing_pose(&Vector3::y(), &v, &cfg));
    }

    #[test]
    fn each_check_can_be_disabled_alone() {
        let v = head();
        let no_backward = PointingConfig { backward_tolerance_cosine: -1.0, ..PointingConfig::default() };
        assert!(is_in_pointing_pose(&-v.forward, &v, &no_backward));
        assert!(!is_in_pointing_pose(&Vector3::y(), &v, &no_backward));

        let no_up = PointingConfig { up_tolerance_cosine: -1.0, ..PointingConfig::default() };
        assert!(is_in_pointing_pose(&Vector3::y(), &v, &no_up));
        assert!(!is_in_pointing_pose(&-v.forward, &v, &no_up));
    }

    #[test]
    fn zero_normal_passes_both_checks() {
        assert!(is_in_pointing_pose(&Vector3::zeros(), &head(), &PointingConfig::default()));
    }

    #[test]
    fn scaled_view_direction_gives_same_answer() {
        let unit = head();
        let scaled = Viewpoint { forward: Vector3::new(0.0, 0.0, -3.0), ..unit };
        // cos to backward is 0.436, under the 0.5 bound
        let n = Vector3::new(0.9, 0.0, 0.436);
        let cfg = PointingConfig::default();
        assert!(is_in_pointing_pose(&n, &unit, &cfg));
        assert_eq!(is_in_pointing_pose(&n, &scaled, &cfg), is_in_pointing_pose(&n, &unit, &cfg));
    }

    #[test]
    fn normal_is_normalised_before_checks() {
        let v = head();
        // 45° between palm normal and backward, scaled up: cos 0.707 > 0.5
        let n = Vector3::new(3.0, 0.0, 3.0);
        assert!(!is_in_pointing_pose(&n, &v, &PointingConfig::default()));
    }

    #[test]
    fn decay_coefficient_limits() {
        assert_eq!(decay_coefficient(0.0, 1.0), 1.0);
        assert_eq!(decay_coefficient(0.01, 0.0), 0.0);
        assert_relative_eq!(decay_coefficient(0.01, 0.01), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn first_ray_points_from_shoulder_through_palm() {
        let mut s = ShoulderRay::default();
        let v = head();
        let palm = Vector3::new(0.3, -0.2, -0.4);
        let ray = s.update(palm, -Vector3::y(), &v, Handedness::Right);
        let expected = (palm - s.pivot(&v, Handedness::Right)).normalize();
        assert_eq!(ray.origin, palm);
        assert_relative_eq!(ray.direction, expected, epsilon = 1e-6);
        assert_relative_eq!(ray.direction.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn shoulders_sit_on_the_hand_side() {
        let s = ShoulderRay::default();
        let v = head();
        assert!(s.pivot(&v, Handedness::Right).x > 0.0);
        assert!(s.pivot(&v, Handedness::Left).x < 0.0);
        assert_eq!(s.pivot(&v, Handedness::Other).x, 0.0);
        assert!(s.pivot(&v, Handedness::Other).y < 0.0);
    }

    #[test]
    fn small_jitter_is_damped() {
        let mut s = ShoulderRay::default();
        let v = head();
        let palm = Vector3::new(0.2, -0.2, -0.4);
        s.update(palm, -Vector3::y(), &v, Handedness::Right);
        let jitter = palm + Vector3::new(0.002, 0.0, 0.0);
        let ray = s.update(jitter, -Vector3::y(), &v, Handedness::Right);
        assert!(ray.origin.x > palm.x && ray.origin.x < jitter.x);
    }

    #[test]
    fn large_jump_is_followed() {
        let mut s = ShoulderRay::default();
        let v = head();
        s.update(Vector3::new(0.2, -0.2, -0.4), -Vector3::y(), &v, Handedness::Right);
        let far = Vector3::new(-0.3, 0.1, -0.5);
        let ray = s.update(far, -Vector3::y(), &v, Handedness::Right);
        assert_relative_eq!(ray.origin, far, epsilon = 1e-3);
    }

    #[test]
    fn degenerate_pivot_falls_back_to_reference() {
        let mut s = ShoulderRay::new(RayConfig { neck_drop: 0.0, shoulder_offset: 0.0, ..RayConfig::default() });
        let v = head();
        let ray = s.update(Vector3::zeros(), Vector3::new(0.0, -2.0, 0.0), &v, Handedness::Other);
        assert_relative_eq!(ray.direction, -Vector3::y(), epsilon = 1e-6);
    }

    #[test]
    fn reset_forgets_history() {
        let mut s = ShoulderRay::default();
        let v = head();
        s.update(Vector3::new(0.2, -0.2, -0.4), -Vector3::y(), &v, Handedness::Right);
        s.reset();
        let p = Vector3::new(0.201, -0.2, -0.4);
        assert_eq!(s.update(p, -Vector3::y(), &v, Handedness::Right).origin, p);
    }

    #[test]
    fn palm_normal_round_trips_through_mapper() {
        let normal = Vector3::new(0.0, -1.0, 0.0);
        let rec = SyntheticHand::right(1).facing(normal, -Vector3::z()).build();
        let mut joints = JointTable::new();
        map_hand(&rec, &mut joints);
        assert_relative_eq!(palm_normal(&joints).unwrap(), normal, epsilon = 1e-5);
    }

    #[test]
    fn pointer_needs_a_palm() {
        let mut s = ShoulderRay::default();
        assert!(compute_pointer(&JointTable::new(), &head(), Handedness::Left, &mut s).is_none());

        let mut zero = JointTable::new();
        zero.set(JointType::Palm, Pose::identity());
        assert!(compute_pointer(&zero, &head(), Handedness::Left, &mut s).is_none());
    }

    #[test]
    fn grip_is_raw_palm_and_pointer_looks_along_ray() {
        let rec = SyntheticHand::left(1).build();
        let mut joints = JointTable::new();
        map_hand(&rec, &mut joints);
        let mut s = ShoulderRay::default();

        let up = compute_pointer(&joints, &head(), Handedness::Left, &mut s).unwrap();
        assert_eq!(up.grip, joints.get(JointType::Palm).unwrap());
        assert_eq!(up.pointer.position, up.ray.origin);
        assert_relative_eq!(up.pointer.forward(), up.ray.direction, epsilon = 1e-5);
    }
}
