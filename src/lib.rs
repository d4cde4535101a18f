//! Zipbeat - A rhythm-scored 2D platformer core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (music timing, scoring, player, ziplines)
//! - `persistence`: Key-value configuration store and what lives in it
//! - `platform`: Input oracle and browser/native storage differences
//! - `settings`: Player preferences (volume, FPS cap, vsync)

pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use settings::{AudioChannel, FpsCap, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default music tempo
    pub const DEFAULT_BPM: f32 = 120.0;
    /// Fastest tempo accepted; keeps beat boundaries representable in f32
    pub const MAX_BPM: f32 = 6000.0;
    /// Beat events reported for a single step at most
    pub const MAX_BEATS_PER_STEP: u32 = 64;
    /// Lead time before an action deadline at which the warning fires (seconds)
    pub const DEADLINE_WARNING_LEAD: f32 = 0.5;

    /// Scoring tier thresholds (in judged time units)
    pub const TOO_LATE_DELAY: f32 = -10.0;
    pub const PERFECT_WINDOW: f32 = 30.0;
    pub const GOOD_WINDOW: f32 = 70.0;
    pub const BAD_WINDOW: f32 = 120.0;
    /// Streak multiplier bounds and increments
    pub const MAX_MULTIPLIER: f32 = 4.0;
    pub const PERFECT_MULTIPLIER_STEP: f32 = 0.3;
    pub const GOOD_MULTIPLIER_STEP: f32 = 0.1;
    /// How long a judgement popup stays on screen (seconds)
    pub const POPUP_DURATION: f32 = 1.0;

    /// Blink matching threshold (seconds)
    pub const BLINK_THRESHOLD: f32 = 0.05;
    pub const BLINK_HOLD: f32 = 0.15;
    pub const BLINK_FADE: f32 = 0.1;

    /// Player movement
    pub const RUN_SPEED: f32 = 6.0;
    pub const JUMP_SPEED: f32 = 12.0;
    pub const COYOTE_TIME: f32 = 0.15;
    pub const JUMP_BUFFER_TIME: f32 = 0.1;
    pub const ROLL_DISTANCE: f32 = 4.0;
    pub const ROLL_DURATION: f32 = 0.4;
    pub const ATTACK_DURATION: f32 = 0.25;
    pub const STOMP_SPEED: f32 = 20.0;
    pub const PLAYER_WIDTH: f32 = 1.0;
    pub const PLAYER_HEIGHT: f32 = 2.0;

    /// Zipline defaults
    pub const ZIPLINE_SPEED: f32 = 8.0;
    pub const ZIPLINE_RESOLUTION: usize = 32;
    pub const ZIPLINE_REENTRY_COOLDOWN: f32 = 0.5;
    pub const ZIPLINE_JUMP_IMPULSE: f32 = 10.0;
    /// Below this length a path is treated as degenerate
    pub const MIN_PATH_LENGTH: f32 = 1e-4;

    /// Pre-start countdown (seconds)
    pub const COUNTDOWN_SECONDS: f32 = 3.0;
}

/// Closest point on segment `a..b` to `p`, as the clamped segment parameter
/// and the squared distance. Zero-length segments return parameter 0.
#[inline]
pub fn closest_on_segment(p: Vec2, a: Vec2, b: Vec2) -> (f32, f32) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    let s = if len_sq <= f32::EPSILON {
        0.0
    } else {
        ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
    };
    let closest = a + ab * s;
    (s, (p - closest).length_squared())
}

/// Move `value` toward zero by `amount`, never crossing it
#[inline]
pub fn decay_toward_zero(value: f32, amount: f32) -> f32 {
    (value - amount).max(0.0)
}
