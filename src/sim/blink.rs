//! Beat-synchronised blink overlay
//!
//! Timestamps are consumed once when the music passes within `threshold` of
//! them. Overlapping blinks share one overlay: it fades in on the first and
//! fades out after the last one ends.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::effects::{EffectKind, EffectRegistry, EffectSpec, EffectTarget};
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlinkConfig {
    /// Max distance between music time and a timestamp to count as a hit
    pub threshold: f32,
    /// How long a single blink stays lit
    pub hold: f32,
    /// Fade in/out duration
    pub fade: f32,
    /// Leave the overlay lit after the final scheduled blink
    pub keep_last_opaque: bool,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            threshold: BLINK_THRESHOLD,
            hold: BLINK_HOLD,
            fade: BLINK_FADE,
            keep_last_opaque: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlinkEvent {
    Triggered { timestamp: f32 },
    /// Passed without ever being within threshold; never retried
    Missed { timestamp: f32 },
}

#[derive(Debug, Clone, Copy)]
struct LitBlink {
    ends_at: f32,
    is_final: bool,
}

#[derive(Debug, Clone)]
pub struct BlinkSchedule {
    pub config: BlinkConfig,
    pending: VecDeque<f32>,
    final_timestamp: Option<f32>,
    lit: Vec<LitBlink>,
}

impl BlinkSchedule {
    pub fn new(config: BlinkConfig, mut timestamps: Vec<f32>) -> Self {
        timestamps.retain(|t| t.is_finite());
        timestamps.sort_by(|a, b| a.total_cmp(b));
        timestamps.dedup();
        let final_timestamp = timestamps.last().copied();
        Self {
            config,
            pending: timestamps.into(),
            final_timestamp,
            lit: Vec::new(),
        }
    }

    /// Number of blinks currently lit
    pub fn active_count(&self) -> usize {
        self.lit.len()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Consume due timestamps and retire expired blinks
    pub fn step(&mut self, current_time: f32, effects: &mut EffectRegistry) -> Vec<BlinkEvent> {
        let mut events = Vec::new();
        let threshold = self.config.threshold;

        while let Some(&ts) = self.pending.front() {
            if (current_time - ts).abs() <= threshold {
                self.pending.pop_front();
                self.light(ts, current_time, effects);
                events.push(BlinkEvent::Triggered { timestamp: ts });
            } else if current_time - ts > threshold {
                self.pending.pop_front();
                log::debug!("Blink at {:.3}s missed (now {:.3}s)", ts, current_time);
                events.push(BlinkEvent::Missed { timestamp: ts });
            } else {
                // Sorted: everything after this one is further in the future
                break;
            }
        }

        let before = self.lit.len();
        let mut final_expired = false;
        self.lit.retain(|b| {
            let alive = b.ends_at > current_time;
            if !alive && b.is_final {
                final_expired = true;
            }
            alive
        });
        if before > 0 && self.lit.is_empty() {
            if final_expired && self.config.keep_last_opaque {
                log::debug!("Final blink held opaque");
            } else {
                let from = effects
                    .value(EffectTarget::BlinkOverlay, EffectKind::Fade)
                    .unwrap_or(1.0);
                effects.start(
                    EffectTarget::BlinkOverlay,
                    EffectSpec::Fade { from, to: 0.0 },
                    self.config.fade,
                    true,
                );
            }
        }

        events
    }

    fn light(&mut self, timestamp: f32, now: f32, effects: &mut EffectRegistry) {
        if self.lit.is_empty() {
            let from = effects
                .value(EffectTarget::BlinkOverlay, EffectKind::Fade)
                .unwrap_or(0.0);
            effects.start(
                EffectTarget::BlinkOverlay,
                EffectSpec::Fade { from, to: 1.0 },
                self.config.fade,
                true,
            );
        }
        self.lit.push(LitBlink {
            ends_at: now + self.config.hold,
            is_final: Some(timestamp) == self.final_timestamp,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(fx: &EffectRegistry) -> f32 {
        fx.value(EffectTarget::BlinkOverlay, EffectKind::Fade).unwrap_or(0.0)
    }

    #[test]
    fn test_blink_triggers_within_threshold() {
        let mut fx = EffectRegistry::new();
        let mut blinks = BlinkSchedule::new(BlinkConfig::default(), vec![1.0]);

        assert!(blinks.step(0.9, &mut fx).is_empty());
        let events = blinks.step(0.98, &mut fx);
        assert_eq!(events, vec![BlinkEvent::Triggered { timestamp: 1.0 }]);
        assert_eq!(blinks.active_count(), 1);
        assert!(fx.is_active(EffectTarget::BlinkOverlay, EffectKind::Fade));
    }

    #[test]
    fn test_late_timestamp_is_discarded_without_blink() {
        let mut fx = EffectRegistry::new();
        let mut blinks = BlinkSchedule::new(BlinkConfig::default(), vec![1.0, 2.0]);

        let events = blinks.step(1.5, &mut fx);
        assert_eq!(events, vec![BlinkEvent::Missed { timestamp: 1.0 }]);
        assert_eq!(blinks.active_count(), 0);
        assert_eq!(blinks.pending(), 1);
        assert!(fx.value(EffectTarget::BlinkOverlay, EffectKind::Fade).is_none());

        // Never retried, even if time is rewound
        assert!(blinks.step(1.0, &mut fx).is_empty());
    }

    #[test]
    fn test_overlapping_blinks_are_reference_counted() {
        let config = BlinkConfig {
            threshold: 0.05,
            hold: 0.3,
            fade: 0.1,
            keep_last_opaque: false,
        };
        let mut fx = EffectRegistry::new();
        let mut blinks = BlinkSchedule::new(config, vec![1.0, 1.2, 3.0]);

        blinks.step(1.0, &mut fx);
        fx.step(0.2);
        assert_eq!(overlay(&fx), 1.0);

        blinks.step(1.2, &mut fx);
        assert_eq!(blinks.active_count(), 2);

        // First blink expires, second still lit: no fade-out
        blinks.step(1.35, &mut fx);
        assert_eq!(blinks.active_count(), 1);
        assert!(!fx.is_active(EffectTarget::BlinkOverlay, EffectKind::Fade));

        blinks.step(1.6, &mut fx);
        assert_eq!(blinks.active_count(), 0);
        assert!(fx.is_active(EffectTarget::BlinkOverlay, EffectKind::Fade));
        fx.step(0.2);
        assert_eq!(overlay(&fx), 0.0);
    }

    #[test]
    fn test_keep_last_blink_opaque() {
        let config = BlinkConfig {
            keep_last_opaque: true,
            ..Default::default()
        };
        let mut fx = EffectRegistry::new();
        let mut blinks = BlinkSchedule::new(config, vec![2.0]);

        blinks.step(2.0, &mut fx);
        fx.step(1.0);
        blinks.step(3.0, &mut fx);
        assert_eq!(blinks.active_count(), 0);
        assert!(!fx.is_active(EffectTarget::BlinkOverlay, EffectKind::Fade));
        assert_eq!(overlay(&fx), 1.0);
    }

    #[test]
    fn test_unsorted_input_is_ordered() {
        let mut fx = EffectRegistry::new();
        let mut blinks = BlinkSchedule::new(BlinkConfig::default(), vec![3.0, 1.0, 2.0]);
        let events = blinks.step(2.0, &mut fx);
        assert_eq!(
            events,
            vec![
                BlinkEvent::Missed { timestamp: 1.0 },
                BlinkEvent::Triggered { timestamp: 2.0 }
            ]
        );
    }
}
