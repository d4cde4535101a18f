//! Step-driven timed effects (fades, pulses, countdowns)
//!
//! Each effect is an explicit progress value advanced from the central tick.
//! At most one effect of a given kind runs on a given target: starting a new
//! one cancels the old instance first.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What an effect drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectTarget {
    BlinkOverlay,
    ScoreLabel,
    CountdownLabel,
    Custom(u32),
}

/// Effect family, one slot per target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Fade,
    Pulse,
    Countdown,
}

/// Effect parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EffectSpec {
    /// Linear opacity change
    Fade { from: f32, to: f32 },
    /// Scale bump: 1 -> 1 + amplitude -> 1
    Pulse { amplitude: f32 },
    /// Whole seconds left, counting down from `from`
    Countdown { from: f32 },
}

impl EffectSpec {
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectSpec::Fade { .. } => EffectKind::Fade,
            EffectSpec::Pulse { .. } => EffectKind::Pulse,
            EffectSpec::Countdown { .. } => EffectKind::Countdown,
        }
    }

    /// Output value at `progress` in [0, 1]
    fn sample(&self, progress: f32) -> f32 {
        let p = progress.clamp(0.0, 1.0);
        match *self {
            EffectSpec::Fade { from, to } => from + (to - from) * p,
            EffectSpec::Pulse { amplitude } => 1.0 + amplitude * (std::f32::consts::PI * p).sin(),
            EffectSpec::Countdown { from } => (from * (1.0 - p)).ceil(),
        }
    }
}

/// Handle to a running effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectHandle(u32);

/// An effect that ran to completion this step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectFinished {
    pub handle: EffectHandle,
    pub target: EffectTarget,
    pub kind: EffectKind,
}

#[derive(Debug, Clone)]
struct ActiveEffect {
    handle: EffectHandle,
    target: EffectTarget,
    spec: EffectSpec,
    duration: f32,
    elapsed: f32,
    /// Jump to the final value if stopped early
    snap_on_cancel: bool,
}

impl ActiveEffect {
    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            self.elapsed / self.duration
        }
    }
}

/// Registry of running effects keyed by (target, kind)
#[derive(Debug, Clone, Default)]
pub struct EffectRegistry {
    active: Vec<ActiveEffect>,
    /// Last value written per slot; survives completion and cancellation
    values: BTreeMap<(EffectTarget, EffectKind), f32>,
    next_handle: u32,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an effect, replacing any effect of the same kind on `target`
    pub fn start(
        &mut self,
        target: EffectTarget,
        spec: EffectSpec,
        duration: f32,
        snap_on_cancel: bool,
    ) -> EffectHandle {
        let kind = spec.kind();
        if let Some(idx) = self
            .active
            .iter()
            .position(|e| e.target == target && e.spec.kind() == kind)
        {
            let old = self.active.remove(idx);
            self.finish_cancelled(&old);
        }

        let handle = EffectHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.values.insert((target, kind), spec.sample(0.0));
        self.active.push(ActiveEffect {
            handle,
            target,
            spec,
            duration: duration.max(0.0),
            elapsed: 0.0,
            snap_on_cancel,
        });
        handle
    }

    /// Stop an in-flight effect. Returns false if it already finished.
    pub fn stop(&mut self, handle: EffectHandle) -> bool {
        let Some(idx) = self.active.iter().position(|e| e.handle == handle) else {
            return false;
        };
        let old = self.active.remove(idx);
        self.finish_cancelled(&old);
        true
    }

    pub fn is_running(&self, handle: EffectHandle) -> bool {
        self.active.iter().any(|e| e.handle == handle)
    }

    /// Whether any effect of `kind` is running on `target`
    pub fn is_active(&self, target: EffectTarget, kind: EffectKind) -> bool {
        self.active
            .iter()
            .any(|e| e.target == target && e.spec.kind() == kind)
    }

    /// Current output for a slot, if anything ever wrote it
    pub fn value(&self, target: EffectTarget, kind: EffectKind) -> Option<f32> {
        self.values.get(&(target, kind)).copied()
    }

    /// Advance every effect by `dt`, returning those that completed
    pub fn step(&mut self, dt: f32) -> Vec<EffectFinished> {
        let mut finished = Vec::new();
        for effect in &mut self.active {
            effect.elapsed += dt;
            let progress = effect.progress();
            self.values
                .insert((effect.target, effect.spec.kind()), effect.spec.sample(progress));
            if progress >= 1.0 {
                finished.push(EffectFinished {
                    handle: effect.handle,
                    target: effect.target,
                    kind: effect.spec.kind(),
                });
            }
        }
        self.active.retain(|e| e.progress() < 1.0);
        finished
    }

    fn finish_cancelled(&mut self, effect: &ActiveEffect) {
        if effect.snap_on_cancel {
            self.values
                .insert((effect.target, effect.spec.kind()), effect.spec.sample(1.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_progresses_linearly() {
        let mut fx = EffectRegistry::new();
        fx.start(EffectTarget::BlinkOverlay, EffectSpec::Fade { from: 0.0, to: 1.0 }, 1.0, false);
        fx.step(0.25);
        let v = fx.value(EffectTarget::BlinkOverlay, EffectKind::Fade).unwrap();
        assert!((v - 0.25).abs() < 1e-5);

        let done = fx.step(1.0);
        assert_eq!(done.len(), 1);
        assert_eq!(fx.value(EffectTarget::BlinkOverlay, EffectKind::Fade), Some(1.0));
        assert!(!fx.is_active(EffectTarget::BlinkOverlay, EffectKind::Fade));
    }

    #[test]
    fn test_same_kind_same_target_replaces() {
        let mut fx = EffectRegistry::new();
        let first = fx.start(EffectTarget::ScoreLabel, EffectSpec::Fade { from: 1.0, to: 0.0 }, 1.0, false);
        fx.step(0.5);
        let second = fx.start(EffectTarget::ScoreLabel, EffectSpec::Fade { from: 0.0, to: 1.0 }, 1.0, false);

        assert!(!fx.is_running(first));
        assert!(fx.is_running(second));
        assert_eq!(fx.value(EffectTarget::ScoreLabel, EffectKind::Fade), Some(0.0));
    }

    #[test]
    fn test_different_kinds_run_independently() {
        let mut fx = EffectRegistry::new();
        let fade = fx.start(EffectTarget::ScoreLabel, EffectSpec::Fade { from: 1.0, to: 0.0 }, 1.0, false);
        let pulse = fx.start(EffectTarget::ScoreLabel, EffectSpec::Pulse { amplitude: 0.2 }, 0.5, false);
        fx.step(0.25);
        assert!(fx.is_running(fade));
        assert!(fx.is_running(pulse));
        let scale = fx.value(EffectTarget::ScoreLabel, EffectKind::Pulse).unwrap();
        assert!((scale - 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_stop_leaves_midpoint_unless_snapping() {
        let mut fx = EffectRegistry::new();
        let h = fx.start(EffectTarget::Custom(1), EffectSpec::Fade { from: 0.0, to: 1.0 }, 1.0, false);
        fx.step(0.5);
        assert!(fx.stop(h));
        let v = fx.value(EffectTarget::Custom(1), EffectKind::Fade).unwrap();
        assert!((v - 0.5).abs() < 1e-5);
        assert!(!fx.stop(h));

        let h = fx.start(EffectTarget::Custom(2), EffectSpec::Fade { from: 0.0, to: 1.0 }, 1.0, true);
        fx.step(0.5);
        fx.stop(h);
        assert_eq!(fx.value(EffectTarget::Custom(2), EffectKind::Fade), Some(1.0));
    }

    #[test]
    fn test_countdown_values() {
        let mut fx = EffectRegistry::new();
        fx.start(EffectTarget::CountdownLabel, EffectSpec::Countdown { from: 3.0 }, 3.0, false);
        assert_eq!(fx.value(EffectTarget::CountdownLabel, EffectKind::Countdown), Some(3.0));
        fx.step(1.5);
        assert_eq!(fx.value(EffectTarget::CountdownLabel, EffectKind::Countdown), Some(2.0));
        let done = fx.step(1.5);
        assert_eq!(done[0].kind, EffectKind::Countdown);
        assert_eq!(fx.value(EffectTarget::CountdownLabel, EffectKind::Countdown), Some(0.0));
    }

    #[test]
    fn test_zero_duration_completes_on_next_step() {
        let mut fx = EffectRegistry::new();
        fx.start(EffectTarget::Custom(0), EffectSpec::Fade { from: 1.0, to: 0.0 }, 0.0, false);
        let done = fx.step(0.0);
        assert_eq!(done.len(), 1);
        assert_eq!(fx.value(EffectTarget::Custom(0), EffectKind::Fade), Some(0.0));
    }
}
