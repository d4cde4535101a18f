//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Time comes from the step's `dt` and an injected clock only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod blink;
pub mod clock;
pub mod effects;
pub mod hostile;
pub mod player;
pub mod rhythm;
pub mod scoring;
pub mod state;
pub mod tick;
pub mod zipline;

pub use blink::{BlinkConfig, BlinkEvent, BlinkSchedule};
pub use clock::{ClockSource, PlaybackClock};
pub use effects::{EffectHandle, EffectKind, EffectRegistry, EffectSpec, EffectTarget};
pub use hostile::Hostile;
pub use player::{AttackKind, JumpAssist, MotionState, PlayerConfig, PlayerController, PlayerEvent, PlayerInput};
pub use rhythm::{ActionTimer, BeatSchedule, RhythmConfig, RhythmEvent, RhythmTimer};
pub use scoring::{JudgeOutcome, Judgement, ScoreState, ScoringConfig, ScoringEngine};
pub use state::{GameEvent, GamePhase, LevelConfig, LevelState, SessionState};
pub use tick::{TickInput, tick};
pub use zipline::{ExitReason, RideStep, RiderProgress, Zipline, ZiplineConfig, ZiplinePath};
