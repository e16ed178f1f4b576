//! Software-rendered top-down hand viewer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┬───────────────┐
//! │                 far (−Z)                     │  SESSIONS     │
//! │                                              │               │
//! │      · · ·  left joints     right joints · · │  hand#1 left  │
//! │       ╲ pointer ray                          │  hand#2 right │
//! │                                              │               │
//! │                 near (+Z)   ◆ viewpoint      │  event log    │
//! │  status bar                                  │               │
//! └──────────────────────────────────────────────┴───────────────┘
//! ```
//!
//! World X maps to screen X and world Z to screen Y; height is dropped.

use std::sync::mpsc::Sender;

use hand_sessions::{Handedness, HandSnapshot, JointType, Viewpoint};
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use nalgebra::Vector3;

use crate::source::{SimInput, SimKey, Slot};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:      usize = 1000;
pub const WIN_H:      usize = 620;
const PANEL_W:        usize = 260;
const PLOT_W:         usize = WIN_W - PANEL_W;
const STATUS_Y:       usize = WIN_H - 36;
/// Pixels per metre in the plot.
const SCALE:          f32   = 900.0;
/// World Z shown at the vertical centre of the plot.
const CENTER_Z:       f32   = -0.25;
const RAY_LENGTH:     f32   = 0.30;
const NUDGE:          f32   = 0.01;

const BG_COLOR:       u32   = 0xFF101820;
const PANEL_BG:       u32   = 0xFF16213E;
const TEXT_BG:        u32   = 0xFF0F3460;
const GRID_COLOR:     u32   = 0xFF1E2A38;
const LEFT_COLOR:     u32   = 0xFF4FC3F7;
const RIGHT_COLOR:    u32   = 0xFFFF8A65;
const OTHER_COLOR:    u32   = 0xFFB0B0B0;
const PINCH_COLOR:    u32   = 0xFFFFD700;
const RAY_COLOR:      u32   = 0xFF81C784;
const RAY_IDLE_COLOR: u32   = 0xFF4E5D4F;
const VIEW_COLOR:     u32   = 0xFFFFFFFF;

fn hand_color(handedness: Handedness) -> u32 {
    match handedness {
        Handedness::Left  => LEFT_COLOR,
        Handedness::Right => RIGHT_COLOR,
        Handedness::Other => OTHER_COLOR,
    }
}

/// World point → plot pixel, or `None` when off-plot.
pub fn project(p: &Vector3<f32>) -> Option<(usize, usize)> {
    let x = PLOT_W as f32 / 2.0 + p.x * SCALE;
    let y = STATUS_Y as f32 / 2.0 + (p.z - CENTER_Z) * SCALE;
    if x < 0.0 || y < 0.0 || x >= PLOT_W as f32 || y >= STATUS_Y as f32 {
        return None;
    }
    Some((x as usize, y as usize))
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    sim_tx: Sender<SimInput>,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>) -> Result<Self, minifb::Error> {
        let mut window = Window::new(
            "Leap Hands — session viewer",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll keyboard inputs and translate to SimInput events.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() { return false; }

        let mut out = Vec::new();

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);
        let released = |k: Key| self.window.is_key_released(k);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            let _ = self.sim_tx.send(SimInput::KeyDown(SimKey::Quit));
            return false;
        }
        if one_shot(Key::Key1) { out.push(SimInput::KeyDown(SimKey::ToggleHand(Slot::First))); }
        if one_shot(Key::Key2) { out.push(SimInput::KeyDown(SimKey::ToggleHand(Slot::Second))); }
        if one_shot(Key::H)    { out.push(SimInput::KeyDown(SimKey::SwapHandedness)); }
        if one_shot(Key::P)    { out.push(SimInput::KeyDown(SimKey::FlipPalms)); }

        for (key, slot) in [(Key::Z, Slot::First), (Key::M, Slot::Second)] {
            if one_shot(key) { out.push(SimInput::KeyDown(SimKey::Pinch(slot))); }
            if released(key) { out.push(SimInput::KeyUp(SimKey::Pinch(slot))); }
        }

        // W/A/S/D moves the first hand, I/J/K/L the second
        let moves = [
            (Key::W, Slot::First,  Vector3::new(0.0, 0.0, -NUDGE)),
            (Key::S, Slot::First,  Vector3::new(0.0, 0.0,  NUDGE)),
            (Key::A, Slot::First,  Vector3::new(-NUDGE, 0.0, 0.0)),
            (Key::D, Slot::First,  Vector3::new( NUDGE, 0.0, 0.0)),
            (Key::I, Slot::Second, Vector3::new(0.0, 0.0, -NUDGE)),
            (Key::K, Slot::Second, Vector3::new(0.0, 0.0,  NUDGE)),
            (Key::J, Slot::Second, Vector3::new(-NUDGE, 0.0, 0.0)),
            (Key::L, Slot::Second, Vector3::new( NUDGE, 0.0, 0.0)),
        ];
        for (key, slot, delta) in moves {
            if held(key) { out.push(SimInput::Nudge { slot, delta }); }
        }

        for input in out {
            let _ = self.sim_tx.send(input);
        }
        true
    }

    /// Render one frame.
    pub fn render(
        &mut self,
        hands:     &[HandSnapshot],
        viewpoint: &Viewpoint,
        status:    &str,
        log:       &[String],
    ) {
        self.buf.fill(BG_COLOR);
        self.draw_grid();

        // ── Viewpoint marker ─────────────────────────────────────────────
        if let Some((x, y)) = project(&viewpoint.position) {
            self.draw_diamond(x, y, 5, VIEW_COLOR);
        }

        // ── Hands ────────────────────────────────────────────────────────
        for hand in hands {
            self.draw_hand(hand);
        }

        // ── Session panel ────────────────────────────────────────────────
        self.fill_rect(PLOT_W, 0, PANEL_W, WIN_H, PANEL_BG);
        self.draw_label("SESSIONS", PLOT_W + 10, 10, PINCH_COLOR);
        let mut y = 30;
        for hand in hands {
            let line = format!(
                "{} {} id {}{}{}",
                hand.id,
                hand.handedness.as_str(),
                hand.sensor_id,
                if hand.is_pinching { " pinch" } else { "" },
                if hand.in_pointing_pose { " point" } else { "" },
            );
            self.draw_label(&line, PLOT_W + 10, y, hand_color(hand.handedness));
            y += 10;
        }

        self.draw_label("EVENTS", PLOT_W + 10, y + 16, PINCH_COLOR);
        let mut ey = y + 32;
        for line in log {
            if ey + 10 > WIN_H { break; }
            self.draw_label(line, PLOT_W + 10, ey, 0xFFCCCCCC);
            ey += 9;
        }

        // ── Status bar ───────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, PLOT_W, WIN_H - STATUS_Y, TEXT_BG);
        self.draw_label(status, 10, STATUS_Y + 10, 0xFFEEEEEE);

        // ── Key legend ───────────────────────────────────────────────────
        self.draw_label(
            "1/2=hand  WASD/IJKL=move  Z/M=pinch  H=swap  P=palm  Q=quit",
            10, WIN_H - 16, 0xFF888888,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Hand ─────────────────────────────────────────────────────────────

    fn draw_hand(&mut self, hand: &HandSnapshot) {
        let color = hand_color(hand.handedness);

        // Pointer ray first so joints draw over it.
        let ray_color = if hand.in_pointing_pose { RAY_COLOR } else { RAY_IDLE_COLOR };
        let origin = hand.pointer_pose.position;
        let end = origin + hand.pointer_pose.forward() * RAY_LENGTH;
        if let (Some(a), Some(b)) = (project(&origin), project(&end)) {
            self.draw_line(a, b, ray_color);
        }

        for (joint, pose) in hand.joints.iter() {
            let Some((x, y)) = project(&pose.position) else { continue };
            let pinch_tip = hand.is_pinching
                && (joint == JointType::ThumbTip || joint == JointType::IndexTip);
            if pinch_tip {
                self.draw_diamond(x, y, 4, PINCH_COLOR);
            } else if joint == JointType::Palm {
                self.draw_square(x, y, 3, color);
            } else {
                self.draw_square(x, y, 1, color);
            }
        }
    }

    fn draw_grid(&mut self) {
        // 10 cm spacing
        let step = (SCALE * 0.1) as usize;
        let cx = PLOT_W / 2;
        let mut x = cx % step;
        while x < PLOT_W {
            for y in 0..STATUS_Y { self.set_pixel(x, y, GRID_COLOR); }
            x += step;
        }
        let mut y = (STATUS_Y / 2) % step;
        while y < STATUS_Y {
            for x in 0..PLOT_W { self.set_pixel(x, y, GRID_COLOR); }
            y += step;
        }
    }

    // ── Primitive drawing helpers ────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            let start = row * WIN_W + x.min(WIN_W);
            let end = row * WIN_W + (x + w).min(WIN_W);
            self.buf[start..end].fill(color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn draw_square(&mut self, cx: usize, cy: usize, r: usize, color: u32) {
        self.fill_rect(cx.saturating_sub(r), cy.saturating_sub(r), 2 * r + 1, 2 * r + 1, color);
    }

    fn draw_diamond(&mut self, cx: usize, cy: usize, r: usize, color: u32) {
        let r = r as isize;
        for dy in -r..=r {
            let span = r - dy.abs();
            for dx in -span..=span {
                let (x, y) = (cx as isize + dx, cy as isize + dy);
                if x >= 0 && y >= 0 {
                    self.set_pixel(x as usize, y as usize, color);
                }
            }
        }
    }

    fn draw_line(&mut self, a: (usize, usize), b: (usize, usize), color: u32) {
        let (x0, y0) = (a.0 as f32, a.1 as f32);
        let (x1, y1) = (b.0 as f32, b.1 as f32);
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = x0 + (x1 - x0) * t;
            let y = y0 + (y1 - y0) * t;
            self.set_pixel(x.round() as usize, y.round() as usize, color);
        }
    }

    /// 3×5 bitmap text.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            for (row, bits) in glyph(ch).iter().enumerate() {
                for col in 0..3usize {
                    if bits & (0b100 >> col) != 0 {
                        self.set_pixel(cx + col, y + row, color);
                    }
                }
            }
            cx += 4;
            if cx + 4 > WIN_W { break; }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 font: five rows of three bits, MSB on the left
// ────────────────────────────────────────────────────────────────────────────

const DIGITS: [[u8; 5]; 10] = [
    [7, 5, 5, 5, 7], [2, 6, 2, 2, 7], [7, 1, 7, 4, 7], [7, 1, 7, 1, 7], [5, 5, 7, 1, 1],
    [7, 4, 7, 1, 7], [7, 4, 7, 5, 7], [7, 1, 1, 1, 1], [7, 5, 7, 5, 7], [7, 5, 7, 1, 7],
];

const LETTERS: [[u8; 5]; 26] = [
    [7, 5, 7, 5, 5], [6, 5, 6, 5, 6], [7, 4, 4, 4, 7], [6, 5, 5, 5, 6], [7, 4, 7, 4, 7],
    [7, 4, 7, 4, 4], [7, 4, 5, 5, 7], [5, 5, 7, 5, 5], [7, 2, 2, 2, 7], [1, 1, 1, 5, 7],
    [5, 5, 6, 5, 5], [4, 4, 4, 4, 7], [5, 7, 5, 5, 5], [7, 5, 5, 5, 5], [7, 5, 5, 5, 7],
    [7, 5, 7, 4, 4], [7, 5, 5, 7, 1], [6, 5, 6, 5, 5], [7, 4, 7, 1, 7], [7, 2, 2, 2, 2],
    [5, 5, 5, 5, 7], [5, 5, 5, 2, 2], [5, 5, 5, 7, 5], [5, 5, 2, 5, 5], [5, 5, 7, 2, 2],
    [7, 1, 2, 4, 7],
];

fn glyph(c: char) -> [u8; 5] {
    match c {
        '0'..='9' => DIGITS[c as usize - '0' as usize],
        'a'..='z' => LETTERS[c as usize - 'a' as usize],
        'A'..='Z' => LETTERS[c as usize - 'A' as usize],
        '#' => [5, 7, 5, 7, 5],
        '/' => [1, 1, 2, 4, 4],
        '-' => [0, 0, 7, 0, 0],
        '.' => [0, 0, 0, 0, 2],
        ',' => [0, 0, 0, 2, 4],
        ':' => [0, 2, 0, 2, 0],
        '=' => [0, 7, 0, 7, 0],
        '(' => [1, 2, 2, 2, 1],
        ')' => [4, 2, 2, 2, 4],
        ' ' => [0, 0, 0, 0, 0],
        _   => [0, 0, 2, 0, 0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_centre_maps_to_middle() {
        let (x, y) = project(&Vector3::new(0.0, 0.5, CENTER_Z)).unwrap();
        assert_eq!(x, PLOT_W / 2);
        assert_eq!(y, STATUS_Y / 2);
    }

    #[test]
    fn farther_points_draw_higher() {
        let (_, near) = project(&Vector3::new(0.0, 0.0, -0.1)).unwrap();
        let (_, far) = project(&Vector3::new(0.0, 0.0, -0.4)).unwrap();
        assert!(far < near);
    }

    #[test]
    fn off_plot_points_are_dropped() {
        assert!(project(&Vector3::new(5.0, 0.0, 0.0)).is_none());
        assert!(project(&Vector3::new(0.0, 0.0, -5.0)).is_none());
    }

    #[test]
    fn glyphs_are_case_insensitive() {
        assert_eq!(glyph('h'), glyph('H'));
        assert_eq!(glyph('7'), [7, 1, 1, 1, 1]);
    }
}
