//! Timing judgement and score keeping
//!
//! Every player action is judged against the deadline it was meant to hit.
//! The tier table is evaluated top to bottom and the first match wins, so
//! each possible delay lands in exactly one tier.

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Timing judgement tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Judgement {
    TooLate,
    Perfect,
    Good,
    Bad,
    Miss,
}

impl Judgement {
    pub fn label(&self) -> &'static str {
        match self {
            Judgement::TooLate => "Too Late",
            Judgement::Perfect => "Perfect",
            Judgement::Good => "Good",
            Judgement::Bad => "Bad",
            Judgement::Miss => "Miss",
        }
    }

    /// Points before the multiplier is applied
    pub fn base_points(&self) -> f32 {
        match self {
            Judgement::TooLate => 300.0,
            Judgement::Perfect => 1000.0,
            Judgement::Good => 700.0,
            Judgement::Bad => 500.0,
            Judgement::Miss => 300.0,
        }
    }

    /// Popup colour (RGBA)
    pub fn color(&self) -> Vec4 {
        match self {
            Judgement::TooLate => Vec4::new(0.6, 0.6, 0.6, 1.0),
            Judgement::Perfect => Vec4::new(1.0, 0.84, 0.0, 1.0),
            Judgement::Good => Vec4::new(0.3, 0.9, 0.3, 1.0),
            Judgement::Bad => Vec4::new(1.0, 0.55, 0.1, 1.0),
            Judgement::Miss => Vec4::new(0.9, 0.2, 0.2, 1.0),
        }
    }
}

/// Tier thresholds and multiplier policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Signed delay below which an action is "Too Late"
    pub too_late_delay: f32,
    pub perfect_window: f32,
    pub good_window: f32,
    pub bad_window: f32,
    pub max_multiplier: f32,
    pub perfect_step: f32,
    pub good_step: f32,
    pub popup_duration: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            too_late_delay: TOO_LATE_DELAY,
            perfect_window: PERFECT_WINDOW,
            good_window: GOOD_WINDOW,
            bad_window: BAD_WINDOW,
            max_multiplier: MAX_MULTIPLIER,
            perfect_step: PERFECT_MULTIPLIER_STEP,
            good_step: GOOD_MULTIPLIER_STEP,
            popup_duration: POPUP_DURATION,
        }
    }
}

impl ScoringConfig {
    /// Select the tier for a signed delay
    pub fn classify(&self, delay: f32) -> Judgement {
        let error = delay.abs();
        if delay < self.too_late_delay {
            Judgement::TooLate
        } else if error <= self.perfect_window {
            Judgement::Perfect
        } else if error <= self.good_window {
            Judgement::Good
        } else if error <= self.bad_window {
            Judgement::Bad
        } else {
            Judgement::Miss
        }
    }
}

/// Running score and streak multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub score: f32,
    pub multiplier: f32,
}

impl Default for ScoreState {
    fn default() -> Self {
        Self {
            score: 0.0,
            multiplier: 1.0,
        }
    }
}

/// Transient judgement label that fades out linearly
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub label: &'static str,
    pub color: Vec4,
    pub remaining: f32,
    pub duration: f32,
}

impl Popup {
    pub fn opacity(&self) -> f32 {
        if self.duration <= 0.0 {
            0.0
        } else {
            (self.remaining / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// Result of one judged action
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgeOutcome {
    pub judgement: Judgement,
    pub delay: f32,
    /// Points awarded after the multiplier
    pub points: f32,
    /// Multiplier after this judgement
    pub multiplier: f32,
}

/// Scoring engine: judges actions, accumulates score, drives the popup
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    pub config: ScoringConfig,
    state: ScoreState,
    popup: Option<Popup>,
    score_text: String,
    multiplier_text: String,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        let mut engine = Self {
            config,
            state: ScoreState::default(),
            popup: None,
            score_text: String::new(),
            multiplier_text: String::new(),
        };
        engine.refresh_readouts();
        engine
    }

    pub fn state(&self) -> ScoreState {
        self.state
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    /// Integer-rounded score readout
    pub fn score_text(&self) -> &str {
        &self.score_text
    }

    /// Multiplier readout, e.g. "X1.3"
    pub fn multiplier_text(&self) -> &str {
        &self.multiplier_text
    }

    /// Judge an action performed at `current_time` against `expected_time`.
    ///
    /// `transition_duration` (seconds) is the transition that plays out after
    /// the action; the popup holds at full opacity through it before fading.
    pub fn judge_action(
        &mut self,
        current_time: f32,
        expected_time: f32,
        transition_duration: f32,
    ) -> JudgeOutcome {
        let delay = current_time - expected_time;
        let judgement = self.config.classify(delay);

        self.state.multiplier = match judgement {
            Judgement::Perfect => {
                (self.state.multiplier + self.config.perfect_step).min(self.config.max_multiplier)
            }
            Judgement::Good => {
                (self.state.multiplier + self.config.good_step).min(self.config.max_multiplier)
            }
            Judgement::TooLate | Judgement::Bad | Judgement::Miss => 1.0,
        };

        let points = judgement.base_points() * self.state.multiplier;
        self.state.score += points;

        // A new judgement replaces any popup still fading
        self.popup = Some(Popup {
            label: judgement.label(),
            color: judgement.color(),
            remaining: self.config.popup_duration + transition_duration.max(0.0),
            duration: self.config.popup_duration,
        });
        self.refresh_readouts();

        log::debug!(
            "Judged {} (delay {:.2}): +{:.0} at X{:.1}",
            judgement.label(),
            delay,
            points,
            self.state.multiplier
        );

        JudgeOutcome {
            judgement,
            delay,
            points,
            multiplier: self.state.multiplier,
        }
    }

    /// Advance the popup fade
    pub fn step(&mut self, dt: f32) {
        if let Some(popup) = &mut self.popup {
            popup.remaining -= dt;
            if popup.remaining <= 0.0 {
                self.popup = None;
            }
        }
    }

    /// Back to zero score and X1.0
    pub fn reset(&mut self) {
        self.state = ScoreState::default();
        self.popup = None;
        self.refresh_readouts();
    }

    fn refresh_readouts(&mut self) {
        self.score_text = format!("{}", self.state.score.round() as i64);
        self.multiplier_text = format!("X{:.1}", self.state.multiplier);
    }
}
