//! # hand_sessions
//!
//! Per-frame hand session tracking for skeletal hand sensors.
//!
//! A sensor reports each visible hand with a transient ID, a handedness
//! flag and a chain of bones per finger.  This crate turns that stream into
//! long-lived logical hand *sessions*, each with a canonical joint table, a
//! pinch state and a stabilized pointer ray.
//!
//! ## Pipeline
//!
//! | Stage | Module | Output |
//! |---|---|---|
//! | Frame arrives | [`service`] | one [`Frame`] per tick |
//! | Identity reconciliation | [`session`] | create / reuse / replace / remove |
//! | Bone chains → joints | [`mapper`] | [`JointTable`] (26 joints) |
//! | Thumb–index distance | [`pinch`] | select / trigger state |
//! | Palm + viewpoint | [`ray`] | pointer pose, grip pose, pointing flag |
//! | Changes | [`event`] | [`HandEvent`]s into a [`HandEventSink`] |
//!
//! ## Example
//!
//! ```
//! use hand_sessions::{Frame, HandEvent, HandRegistry, SyntheticHand, TrackingConfig, Viewpoint};
//!
//! let mut registry = HandRegistry::new(TrackingConfig::default());
//! let mut events: Vec<HandEvent> = Vec::new();
//!
//! let frame = Frame::new(1, vec![SyntheticHand::left(7).pinch_gap(0.01).build()]);
//! registry.on_frame(&frame, &Viewpoint::default(), &mut events);
//!
//! let hand = &registry.snapshots()[0];
//! assert!(hand.is_pinching);
//! assert!(matches!(events[0], HandEvent::Detected { .. }));
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod joint;
pub mod mapper;
pub mod mesh;
pub mod pinch;
pub mod ray;
pub mod record;
pub mod service;
pub mod session;
pub mod synthetic;

pub use config::{PinchConfig, PointingConfig, RayConfig, TrackingConfig};
pub use error::{Result, TrackingError};
pub use event::{HandEvent, HandEventSink, NullSink};
pub use joint::{BoneType, FingerType, JointTable, JointType, Pose, JOINT_COUNT};
pub use mesh::HandMesh;
pub use pinch::PinchDetector;
pub use ray::{Ray, RayStabilizer, ShoulderRay, Viewpoint};
pub use record::{Frame, Handedness, RawBone, RawFinger, RawHandRecord, SensorHandId};
pub use service::{FrameSource, HandTrackingService, ScriptedSource};
pub use session::{HandRegistry, HandSession, HandSnapshot, SessionId};
pub use synthetic::SyntheticHand;
