//! Top-level application state machine.
//!
//! `AppState` digests the [`HandEvent`]s produced each tick into a status
//! line, a rolling event log and a few counters; `run` wires the frame
//! source, the tracking service and the visualizer together.

use std::collections::VecDeque;
use std::sync::mpsc;

use anyhow::Context;
use hand_sessions::{
    FrameSource, HandEvent, HandTrackingService, Handedness, TrackingConfig, Viewpoint,
};
use nalgebra::Vector3;
use tracing::{info, warn};

use crate::source::{SimFrameSource, SimInput};
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Where frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Simulation,
    #[cfg(feature = "leap")]
    Leap,
}

/// Configuration for the full application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tracking:   TrackingConfig,
    pub source:     SourceKind,
    /// Head pose used for pointer rays.  The sensor sits on the desk, so
    /// the default viewer is above and behind it looking forward.
    pub viewpoint:  Viewpoint,
    /// Lines kept in the on-screen event log.
    pub log_lines:  usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            tracking:  TrackingConfig::default(),
            source:    SourceKind::Simulation,
            viewpoint: Viewpoint::new(Vector3::new(0.0, 0.45, 0.10), Vector3::new(0.0, -0.3, -1.0)),
            log_lines: 40,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    pub status:  String,
    log:         VecDeque<String>,
    log_lines:   usize,
    detected:    u64,
    lost:        u64,
    selects:     u64,
    meshes:      u64,
}

impl AppState {
    pub fn new(cfg: &AppConfig) -> Self {
        AppState {
            status:    "Ready: press 1 or 2 to bring a hand into view".to_string(),
            log:       VecDeque::with_capacity(cfg.log_lines),
            log_lines: cfg.log_lines,
            detected:  0,
            lost:      0,
            selects:   0,
            meshes:    0,
        }
    }

    // ── process one HandEvent ────────────────────────────────────────────

    pub fn handle_event(&mut self, event: &HandEvent) {
        let line = match event {
            HandEvent::Detected { session, handedness } => {
                self.detected += 1;
                self.status = format!("DETECTED {} ({})", session, handedness.as_str());
                Some(format!("+ {} {}", session, side_label(*handedness)))
            }
            HandEvent::Lost { session, handedness } => {
                self.lost += 1;
                self.status = format!("LOST {} ({})", session, handedness.as_str());
                Some(format!("- {} {}", session, side_label(*handedness)))
            }
            HandEvent::SelectChanged { session, pressed } => {
                if *pressed {
                    self.selects += 1;
                }
                self.status = format!(
                    "{} {}",
                    session,
                    if *pressed { "PINCH: select pressed" } else { "release: select up" }
                );
                Some(format!("  {} select {}", session, if *pressed { "down" } else { "up" }))
            }
            HandEvent::MeshUpdated { session, mesh, .. } => {
                self.meshes += 1;
                Some(format!("  {} mesh {} verts", session, mesh.vertices.len()))
            }
            // Per-tick pose traffic is too chatty for the log.
            HandEvent::JointsUpdated { .. }
            | HandEvent::PoseChanged { .. }
            | HandEvent::PointerChanged { .. }
            | HandEvent::IndexFingerChanged { .. }
            | HandEvent::TriggerChanged { .. } => None,
        };

        if let Some(line) = line {
            while self.log.len() >= self.log_lines.max(1) {
                self.log.pop_front();
            }
            self.log.push_back(line);
        }
    }

    // ── Accessors for the render loop ────────────────────────────────────

    pub fn log(&self) -> Vec<String> { self.log.iter().cloned().collect() }
    pub fn detected(&self) -> u64    { self.detected }
    pub fn lost(&self) -> u64        { self.lost }
    pub fn selects(&self) -> u64     { self.selects }
    pub fn meshes(&self) -> u64      { self.meshes }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It creates the visualizer
/// and the frame source (simulation by default, hardware with
/// `--features leap --leap`), enables tracking and drives the
/// event/render loop at ~60 fps.
pub fn run(cfg: AppConfig) -> anyhow::Result<()> {
    // ── Sim input channel ────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();

    // ── Visualizer (owns the window and the sim input sender) ───────────
    let vis = Visualizer::new(sim_tx).context("opening viewer window")?;

    match cfg.source {
        SourceKind::Simulation => drive(cfg, SimFrameSource::new(sim_rx), vis),
        #[cfg(feature = "leap")]
        SourceKind::Leap => {
            drop(sim_rx);
            drive(cfg, crate::source::LeapFrameSource::new(), vis)
        }
    }
}

fn drive<S: FrameSource>(cfg: AppConfig, source: S, mut vis: Visualizer) -> anyhow::Result<()> {
    let mut app = AppState::new(&cfg);
    let mut service = HandTrackingService::new(source, Vec::new(), cfg.tracking.clone());
    service.enable().context("enabling hand tracking")?;

    // ── Main loop ────────────────────────────────────────────────────────
    while vis.is_open() {
        // 1. Poll window input → SimInput
        if !vis.poll_input() { break; }

        // 2. One sensor frame through the registry
        service.tick(&cfg.viewpoint);

        // 3. Drain hand events
        for event in service.sink_mut().drain(..) {
            app.handle_event(&event);
        }

        // 4. Render
        let hands = service.snapshots();
        vis.render(&hands, &cfg.viewpoint, &app.status, &app.log());
    }

    service.disable();
    for event in service.sink_mut().drain(..) {
        app.handle_event(&event);
    }
    if app.detected() != app.lost() {
        warn!(detected = app.detected(), lost = app.lost(), "unbalanced session events");
    }
    info!(
        detected = app.detected(),
        selects = app.selects(),
        "viewer closed"
    );
    Ok(())
}

fn side_label(handedness: Handedness) -> &'static str {
    match handedness {
        Handedness::Left  => "L",
        Handedness::Right => "R",
        Handedness::Other => "?",
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_sessions::{Frame, HandRegistry, SyntheticHand};

    fn make_app() -> AppState {
        AppState::new(&AppConfig::default())
    }

    /// Run frames through a registry and feed the events to the app.
    fn feed(app: &mut AppState, reg: &mut HandRegistry, frames: Vec<Frame>) {
        let v = AppConfig::default().viewpoint;
        for frame in frames {
            let mut events = Vec::new();
            reg.on_frame(&frame, &v, &mut events);
            for e in &events {
                app.handle_event(e);
            }
        }
    }

    #[test]
    fn detection_updates_status_and_log() {
        let mut app = make_app();
        let mut reg = HandRegistry::default();
        feed(&mut app, &mut reg, vec![Frame::new(1, vec![SyntheticHand::left(1).build()])]);
        assert_eq!(app.detected(), 1);
        assert!(app.status.starts_with("DETECTED"));
        assert_eq!(app.log().len(), 1);
    }

    #[test]
    fn pose_traffic_stays_out_of_log() {
        let mut app = make_app();
        let mut reg = HandRegistry::default();
        let frames = (1..=10).map(|i| Frame::new(i, vec![SyntheticHand::right(1).build()])).collect();
        feed(&mut app, &mut reg, frames);
        assert_eq!(app.log().len(), 1);
    }

    #[test]
    fn pinch_counts_selects() {
        let mut app = make_app();
        let mut reg = HandRegistry::default();
        feed(
            &mut app,
            &mut reg,
            vec![
                Frame::new(1, vec![SyntheticHand::right(1).build()]),
                Frame::new(2, vec![SyntheticHand::right(1).pinch_gap(0.01).build()]),
                Frame::new(3, vec![SyntheticHand::right(1).build()]),
                Frame::new(4, vec![SyntheticHand::right(1).pinch_gap(0.01).build()]),
            ],
        );
        assert_eq!(app.selects(), 2);
        assert!(app.status.contains("PINCH"));
    }

    #[test]
    fn handedness_swap_shows_lost_then_detected() {
        let mut app = make_app();
        let mut reg = HandRegistry::default();
        feed(
            &mut app,
            &mut reg,
            vec![
                Frame::new(1, vec![SyntheticHand::left(4).build()]),
                Frame::new(2, vec![SyntheticHand::right(4).build()]),
            ],
        );
        assert_eq!(app.detected(), 2);
        assert_eq!(app.lost(), 1);
        let log = app.log();
        assert!(log[1].starts_with("- "));
        assert!(log[2].starts_with("+ "));
    }

    #[test]
    fn log_is_bounded() {
        let mut app = AppState::new(&AppConfig { log_lines: 3, ..AppConfig::default() });
        let mut reg = HandRegistry::default();
        let frames = (1..=6)
            .map(|i| {
                let hands = if i % 2 == 1 { vec![SyntheticHand::left(i as i32).build()] } else { vec![] };
                Frame::new(i, hands)
            })
            .collect();
        feed(&mut app, &mut reg, frames);
        assert_eq!(app.log().len(), 3);
        assert_eq!(app.detected(), 3);
        assert_eq!(app.lost(), 3);
    }

    #[test]
    fn zero_log_lines_keeps_latest_only() {
        let mut app = AppState::new(&AppConfig { log_lines: 0, ..AppConfig::default() });
        let mut reg = HandRegistry::default();
        let frames = (1..=4)
            .map(|i| Frame::new(i, vec![SyntheticHand::left(i as i32).build()]))
            .collect();
        feed(&mut app, &mut reg, frames);
        assert_eq!(app.log().len(), 1);
        assert!(app.log()[0].starts_with("+ "));
    }

    #[test]
    fn default_viewpoint_sees_sim_hands_as_pointing() {
        let mut reg = HandRegistry::default();
        let v = AppConfig::default().viewpoint;
        reg.on_frame(&Frame::new(1, vec![SyntheticHand::left(1).build()]), &v, &mut Vec::new());
        assert!(reg.snapshots()[0].in_pointing_pose);
    }
}
