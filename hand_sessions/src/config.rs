//! Tracking configuration.
//!
//! Every knob has a default and can be overridden on its own, either from a
//! TOML file (missing keys fall back to the defaults) or with the `with_*`
//! builders.
//!
//! ```toml
//! [pinch]
//! start_distance = 0.035
//!
//! [pointing]
//! up_tolerance_cosine = -1.0   # disable the palm-up check
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, TrackingError};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub pinch:    PinchConfig,
    #[serde(default)]
    pub pointing: PointingConfig,
    #[serde(default)]
    pub ray:      RayConfig,
}

/// Pinch hysteresis thresholds, in metres between thumb and index tips.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PinchConfig {
    /// Start pinching below this distance.
    #[serde(default = "default_start_distance")]
    pub start_distance: f32,
    /// Stop pinching above this distance.
    #[serde(default = "default_stop_distance")]
    pub stop_distance:  f32,
}

/// Cosine bounds for the pointing-pose check.  Negative disables a check.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PointingConfig {
    #[serde(default = "default_backward_tolerance")]
    pub backward_tolerance_cosine: f32,
    #[serde(default = "default_up_tolerance")]
    pub up_tolerance_cosine:       f32,
}

/// Shoulder-pivot ray geometry and smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RayConfig {
    /// Distance (m) over which origin jitter is halved.  0 disables smoothing.
    #[serde(default = "default_half_life")]
    pub position_half_life:  f32,
    /// Same for the (unit) direction.
    #[serde(default = "default_half_life")]
    pub direction_half_life: f32,
    /// Neck drop below the viewpoint (m).
    #[serde(default = "default_neck_drop")]
    pub neck_drop:           f32,
    /// Lateral shoulder offset from the neck (m).
    #[serde(default = "default_shoulder_offset")]
    pub shoulder_offset:     f32,
}

fn default_start_distance() -> f32 { 0.04 }
fn default_stop_distance() -> f32 { 0.05 }
fn default_backward_tolerance() -> f32 { 0.5 }
fn default_up_tolerance() -> f32 { 0.8 }
fn default_half_life() -> f32 { 0.01 }
fn default_neck_drop() -> f32 { 0.15 }
fn default_shoulder_offset() -> f32 { 0.18 }

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            start_distance: default_start_distance(),
            stop_distance:  default_stop_distance(),
        }
    }
}

impl Default for PointingConfig {
    fn default() -> Self {
        Self {
            backward_tolerance_cosine: default_backward_tolerance(),
            up_tolerance_cosine:       default_up_tolerance(),
        }
    }
}

impl Default for RayConfig {
    fn default() -> Self {
        Self {
            position_half_life:  default_half_life(),
            direction_half_life: default_half_life(),
            neck_drop:           default_neck_drop(),
            shoulder_offset:     default_shoulder_offset(),
        }
    }
}

impl TrackingConfig {
    /// Load and validate a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), ?config, "loaded tracking configuration");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TrackingConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let values = [
            ("pinch.start_distance", self.pinch.start_distance),
            ("pinch.stop_distance", self.pinch.stop_distance),
            ("pointing.backward_tolerance_cosine", self.pointing.backward_tolerance_cosine),
            ("pointing.up_tolerance_cosine", self.pointing.up_tolerance_cosine),
            ("ray.position_half_life", self.ray.position_half_life),
            ("ray.direction_half_life", self.ray.direction_half_life),
            ("ray.neck_drop", self.ray.neck_drop),
            ("ray.shoulder_offset", self.ray.shoulder_offset),
        ];
        if let Some((name, v)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(TrackingError::invalid_config(format!("{name} is not finite ({v})")));
        }
        if self.pinch.start_distance < 0.0 {
            return Err(TrackingError::invalid_config("pinch.start_distance must be >= 0"));
        }
        if self.pinch.start_distance > self.pinch.stop_distance {
            return Err(TrackingError::invalid_config(format!(
                "pinch.start_distance ({}) exceeds pinch.stop_distance ({})",
                self.pinch.start_distance, self.pinch.stop_distance
            )));
        }
        if self.ray.position_half_life < 0.0 || self.ray.direction_half_life < 0.0 {
            return Err(TrackingError::invalid_config("ray half-lives must be >= 0"));
        }
        Ok(())
    }

    pub fn with_start_pinch_distance(mut self, d: f32) -> Self {
        self.pinch.start_distance = d;
        self
    }

    pub fn with_stop_pinch_distance(mut self, d: f32) -> Self {
        self.pinch.stop_distance = d;
        self
    }

    pub fn with_backward_tolerance_cosine(mut self, c: f32) -> Self {
        self.pointing.backward_tolerance_cosine = c;
        self
    }

    pub fn with_up_tolerance_cosine(mut self, c: f32) -> Self {
        self.pointing.up_tolerance_cosine = c;
        self
    }

    pub fn with_ray(mut self, ray: RayConfig) -> Self {
        self.ray = ray;
        self
    }
}
