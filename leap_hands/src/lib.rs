//! # leap_hands
//!
//! Host for [`hand_sessions`]: pulls frames from a LeapMotion controller (or
//! a keyboard simulation of one), runs them through the session registry and
//! draws every tracked hand in a top-down viewer.
//!
//! ## What the viewer shows
//!
//! | Mark | Meaning |
//! |---|---|
//! | small squares | joints of each session (blue = left, orange = right) |
//! | large square | palm |
//! | gold diamonds | thumb and index tips while pinching |
//! | green line | pointer ray while the hand is in a pointing pose |
//! | white diamond | viewpoint used for pointer rays |
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: keyboard shortcuts drive two hands.
//! * `leap` — **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Effect |
//! |---|---|
//! | `1` / `2` | Bring the first / second hand into view, or take it away |
//! | `W A S D` | Move the first hand |
//! | `I J K L` | Move the second hand |
//! | `Z` / `M` (hold) | Pinch with the first / second hand |
//! | `H` | Swap handedness of every visible hand |
//! | `P` | Turn palms towards the viewer and back |
//! | `Q` / `Escape` | Quit |
//!
//! Re-entering a hand hands out a new sensor ID and therefore a new session;
//! `H` keeps the sensor ID but changes handedness, which the registry treats
//! as a different hand.

pub mod app;
pub mod source;
pub mod visualizer;
