//! Level state and core simulation types
//!
//! Everything the step function mutates lives in [`LevelState`]; nothing is
//! reached through globals.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::blink::{BlinkConfig, BlinkEvent, BlinkSchedule};
use super::effects::{EffectRegistry, EffectSpec, EffectTarget};
use super::hostile::Hostile;
use super::player::{PlayerConfig, PlayerController, PlayerEvent};
use super::rhythm::{ActionTimer, RhythmConfig, RhythmTimer};
use super::scoring::{JudgeOutcome, ScoringConfig, ScoringEngine};
use super::zipline::{ExitReason, Zipline, ZiplineConfig};
use crate::consts::*;

/// Current phase of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Pre-start countdown, music not yet playing
    Countdown,
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// The track played to its end
    Finished,
    /// The player died
    Dead,
}

/// Session-wide flags shared by menus and gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Countdown finished and the run is live
    pub started: bool,
    /// Pause input is honoured
    pub pause_allowed: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            started: false,
            pause_allowed: true,
        }
    }
}

/// Things that happened during a step, drained by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PhaseChanged(GamePhase),
    Beat { index: u32 },
    DeadlineApproaching { deadline: f32 },
    Judged(JudgeOutcome),
    Blink(BlinkEvent),
    Player(PlayerEvent),
    ZiplineEntered { id: u32 },
    ZiplineExited { id: u32, reason: ExitReason },
    HostileDefeated { id: u32 },
}

/// Level tunables, loadable from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub player: PlayerConfig,
    pub scoring: ScoringConfig,
    pub rhythm: RhythmConfig,
    pub blink: BlinkConfig,
    pub zipline: ZiplineConfig,
    /// Seconds the action timer warns ahead of a deadline
    pub warning_lead: f32,
    /// Times (seconds) at which rhythm actions are expected
    pub action_deadlines: Vec<f32>,
    /// Transition played after each judged action (seconds)
    pub action_transition: f32,
    /// Seconds -> judged units (the tier table is in milliseconds)
    pub judge_time_scale: f32,
    pub blink_timestamps: Vec<f32>,
    pub countdown_seconds: f32,
    pub spawn: Vec2,
    /// Flat ground height standing in for level collision
    pub floor_y: f32,
    pub gravity: f32,
    /// How close the player must pass to a cable to grab it
    pub zipline_grab_radius: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            scoring: ScoringConfig::default(),
            rhythm: RhythmConfig::default(),
            blink: BlinkConfig::default(),
            zipline: ZiplineConfig::default(),
            warning_lead: DEADLINE_WARNING_LEAD,
            action_deadlines: Vec::new(),
            action_transition: 0.0,
            judge_time_scale: 1000.0,
            blink_timestamps: Vec::new(),
            countdown_seconds: COUNTDOWN_SECONDS,
            spawn: Vec2::ZERO,
            floor_y: 0.0,
            gravity: 30.0,
            zipline_grab_radius: 0.5,
        }
    }
}

/// Complete level state
#[derive(Debug, Clone)]
pub struct LevelState {
    pub config: LevelConfig,
    pub phase: GamePhase,
    pub session: SessionState,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulated seconds since the level was created (sum of step `dt`s)
    pub elapsed: f32,
    pub player: PlayerController,
    pub ziplines: Vec<Zipline>,
    pub hostiles: Vec<Hostile>,
    pub rhythm: RhythmTimer,
    pub action_timer: ActionTimer,
    pub scoring: ScoringEngine,
    pub blinks: BlinkSchedule,
    pub effects: EffectRegistry,
    /// Expected action times not yet judged (seconds, ascending)
    pub pending_deadlines: VecDeque<f32>,
    /// Events raised since the caller last drained them
    pub events: Vec<GameEvent>,
    /// Index into `ziplines` of the cable being ridden
    pub riding: Option<usize>,
    next_id: u32,
}

impl LevelState {
    pub fn new(config: LevelConfig) -> Self {
        let mut deadlines = config.action_deadlines.clone();
        deadlines.retain(|d| d.is_finite());
        deadlines.sort_by(|a, b| a.total_cmp(b));

        let mut action_timer = ActionTimer::new(config.warning_lead);
        if let Some(&first) = deadlines.first() {
            action_timer.reset(first);
        }

        let mut effects = EffectRegistry::new();
        effects.start(
            EffectTarget::CountdownLabel,
            EffectSpec::Countdown {
                from: config.countdown_seconds,
            },
            config.countdown_seconds,
            true,
        );

        Self {
            phase: GamePhase::Countdown,
            session: SessionState::default(),
            time_ticks: 0,
            elapsed: 0.0,
            player: PlayerController::new(config.player, config.spawn),
            ziplines: Vec::new(),
            hostiles: Vec::new(),
            rhythm: RhythmTimer::new(config.rhythm),
            action_timer,
            scoring: ScoringEngine::new(config.scoring),
            blinks: BlinkSchedule::new(config.blink, config.blink_timestamps.clone()),
            effects,
            pending_deadlines: deadlines.into(),
            events: Vec::new(),
            riding: None,
            next_id: 1,
            config,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add a zipline using the level's default cable tuning
    pub fn add_zipline(&mut self, start: Vec2, end: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.ziplines
            .push(Zipline::new(id, start, end, self.config.zipline));
        id
    }

    pub fn add_hostile(&mut self, pos: Vec2, patrol: (f32, f32), speed: f32) -> u32 {
        let id = self.next_entity_id();
        self.hostiles.push(Hostile::new(id, pos, patrol, speed));
        id
    }

    /// Change phase, recording the transition
    pub fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            log::info!("Phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
            self.events.push(GameEvent::PhaseChanged(phase));
        }
    }

    /// Take all events raised so far
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_level_starts_in_countdown() {
        let config = LevelConfig {
            action_deadlines: vec![4.0, 2.0],
            ..Default::default()
        };
        let level = LevelState::new(config);
        assert_eq!(level.phase, GamePhase::Countdown);
        assert_eq!(level.pending_deadlines, VecDeque::from(vec![2.0, 4.0]));
        assert_eq!(level.action_timer.target_deadline, Some(2.0));
        assert!(!level.session.started);
    }

    #[test]
    fn test_entity_ids_are_unique() {
        let mut level = LevelState::new(LevelConfig::default());
        let a = level.add_zipline(Vec2::ZERO, Vec2::new(5.0, 0.0));
        let b = level.add_hostile(Vec2::ZERO, (0.0, 1.0), 1.0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_level_config_from_partial_json() {
        let config: LevelConfig =
            serde_json::from_str(r#"{ "action_deadlines": [1.5], "gravity": 20.0 }"#).unwrap();
        assert_eq!(config.action_deadlines, vec![1.5]);
        assert_eq!(config.gravity, 20.0);
        assert_eq!(config.judge_time_scale, 1000.0);
    }
}
