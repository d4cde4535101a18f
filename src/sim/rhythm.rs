//! Rhythm timing: beat boundaries and action deadlines
//!
//! Both timers read the music clock once per step. Beat boundaries are
//! scheduled by fixed addition so rounding never accumulates into drift.

use serde::{Deserialize, Serialize};

use super::clock::ClockSource;
use crate::consts::*;

/// Tempo configuration for a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RhythmConfig {
    /// Beats per minute (must be > 0)
    pub bpm: f32,
    /// Time of the first beat (seconds)
    #[serde(default)]
    pub first_beat: f32,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            first_beat: 0.0,
        }
    }
}

/// Upcoming beat boundary bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatSchedule {
    pub bpm: f32,
    pub beat_interval: f32,
    pub next_beat_time: f32,
    /// Index of the beat at `next_beat_time`
    pub next_beat_index: u32,
}

impl BeatSchedule {
    pub fn new(config: RhythmConfig) -> Self {
        // Non-positive tempo would never advance; fall back to the default
        let bpm = if config.bpm.is_nan() || config.bpm <= 0.0 {
            log::warn!("Invalid bpm {}, using {}", config.bpm, DEFAULT_BPM);
            DEFAULT_BPM
        } else if config.bpm > MAX_BPM {
            log::warn!("bpm {} too fast, clamping to {}", config.bpm, MAX_BPM);
            MAX_BPM
        } else {
            config.bpm
        };
        Self {
            bpm,
            beat_interval: 60.0 / bpm,
            next_beat_time: config.first_beat,
            next_beat_index: 0,
        }
    }

    /// Boundaries at or before `time` not yet consumed
    fn crossed_by(&self, time: f32) -> u32 {
        if time < self.next_beat_time {
            return 0;
        }
        let span = (time as f64 - self.next_beat_time as f64) / self.beat_interval as f64;
        (span.floor() + 1.0).min(u32::MAX as f64) as u32
    }

    /// Jump over `beats` boundaries without reporting them
    fn skip(&mut self, beats: u32) {
        let target = self.next_beat_time as f64 + beats as f64 * self.beat_interval as f64;
        self.next_beat_time = target as f32;
        self.next_beat_index = self.next_beat_index.saturating_add(beats);
    }

    /// Consume every boundary at or before `time`.
    ///
    /// At most `MAX_BEATS_PER_STEP` of the latest boundaries are reported;
    /// older ones in a huge jump are skipped.
    fn consume_until(&mut self, time: f32, out: &mut Vec<RhythmEvent>) {
        let crossed = self.crossed_by(time);
        if crossed > MAX_BEATS_PER_STEP {
            let dropped = crossed - MAX_BEATS_PER_STEP;
            log::warn!("Step crossed {} beats, dropping the oldest {}", crossed, dropped);
            self.skip(dropped);
        }

        let mut emitted = 0;
        while time >= self.next_beat_time && emitted < MAX_BEATS_PER_STEP {
            out.push(RhythmEvent::Beat {
                index: self.next_beat_index,
                time: self.next_beat_time,
            });
            emitted += 1;
            let before = self.next_beat_time;
            self.next_beat_time += self.beat_interval;
            self.next_beat_index = self.next_beat_index.saturating_add(1);
            if self.next_beat_time <= before {
                log::warn!("Beat interval lost to rounding at {:.3}s", before);
                break;
            }
        }
    }

    /// Pass over boundaries strictly before `time` without reporting them
    fn skip_before(&mut self, time: f32) {
        if time <= self.next_beat_time {
            return;
        }
        let span = (time as f64 - self.next_beat_time as f64) / self.beat_interval as f64;
        self.skip(span.ceil().min(u32::MAX as f64) as u32);
    }
}

/// Discrete notifications raised by the rhythm engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RhythmEvent {
    /// A beat boundary was crossed
    Beat { index: u32, time: f32 },
    /// The current action deadline is within the warning lead
    DeadlineApproaching { deadline: f32 },
}

/// Music-synchronised timer (current time, duration, beat events)
#[derive(Debug, Clone)]
pub struct RhythmTimer {
    config: RhythmConfig,
    schedule: BeatSchedule,
    current_time: f32,
    total_duration: f32,
    /// Set once a missing clock has been reported
    warned_missing_clock: bool,
}

impl RhythmTimer {
    pub fn new(config: RhythmConfig) -> Self {
        Self {
            config,
            schedule: BeatSchedule::new(config),
            current_time: 0.0,
            total_duration: 0.0,
            warned_missing_clock: false,
        }
    }

    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    pub fn total_duration(&self) -> f32 {
        self.total_duration
    }

    pub fn schedule(&self) -> &BeatSchedule {
        &self.schedule
    }

    /// Sample the clock and append any crossed beats to `out`.
    ///
    /// A missing clock leaves the timer inert. A clock that moved backwards
    /// was restarted, so the beat schedule starts over.
    pub fn step(&mut self, clock: Option<&dyn ClockSource>, out: &mut Vec<RhythmEvent>) {
        let Some(clock) = clock else {
            if !self.warned_missing_clock {
                log::warn!("Rhythm timer has no clock source - beats disabled");
                self.warned_missing_clock = true;
            }
            return;
        };

        self.total_duration = clock.total_duration();
        let now = clock.current_time();
        if now < self.current_time {
            log::debug!("Clock rewound {:.3}s -> {:.3}s, resetting beats", self.current_time, now);
            self.schedule = BeatSchedule::new(self.config);
        }
        self.current_time = now;

        // A stopped clock may still be moved (seeks); its beats pass silently
        if clock.is_playing() {
            self.schedule.consume_until(now, out);
        } else {
            self.schedule.skip_before(now);
        }
    }
}

/// One-shot "deadline approaching" notifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionTimer {
    pub target_deadline: Option<f32>,
    pub warning_lead: f32,
    fired: bool,
}

impl Default for ActionTimer {
    fn default() -> Self {
        Self::new(DEADLINE_WARNING_LEAD)
    }
}

impl ActionTimer {
    pub fn new(warning_lead: f32) -> Self {
        Self {
            target_deadline: None,
            warning_lead: warning_lead.max(0.0),
            fired: false,
        }
    }

    /// Arm the timer for a new deadline
    pub fn reset(&mut self, deadline: f32) {
        self.target_deadline = Some(deadline);
        self.fired = false;
    }

    /// Disarm without a new deadline
    pub fn clear(&mut self) {
        self.target_deadline = None;
        self.fired = false;
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Seconds left until the deadline (never negative)
    pub fn remaining(&self, now: f32) -> Option<f32> {
        self.target_deadline.map(|d| (d - now).max(0.0))
    }

    /// Fire at most once per armed deadline, and only while the clock plays
    pub fn step(&mut self, clock: Option<&dyn ClockSource>, out: &mut Vec<RhythmEvent>) {
        let (Some(clock), Some(deadline)) = (clock, self.target_deadline) else {
            return;
        };
        if self.fired || !clock.is_playing() {
            return;
        }
        if clock.current_time() >= deadline - self.warning_lead {
            self.fired = true;
            out.push(RhythmEvent::DeadlineApproaching { deadline });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::clock::PlaybackClock;

    fn beats(events: &[RhythmEvent]) -> Vec<u32> {
        events
            .iter()
            .filter_map(|e| match e {
                RhythmEvent::Beat { index, .. } => Some(*index),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_beats_fire_on_boundaries() {
        let mut clock = PlaybackClock::new(10.0);
        clock.play();
        let mut timer = RhythmTimer::new(RhythmConfig::default()); // 0.5s interval
        let mut events = Vec::new();

        // First step at t=0 crosses beat 0
        timer.step(Some(&clock), &mut events);
        assert_eq!(beats(&events), vec![0]);

        events.clear();
        clock.advance(0.25);
        timer.step(Some(&clock), &mut events);
        assert!(events.is_empty());

        clock.advance(0.25);
        timer.step(Some(&clock), &mut events);
        assert_eq!(beats(&events), vec![1]);
        assert!((timer.schedule().next_beat_time - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_large_step_fires_every_crossed_beat() {
        let mut clock = PlaybackClock::new(10.0);
        clock.play();
        let mut timer = RhythmTimer::new(RhythmConfig::default());
        let mut events = Vec::new();

        clock.advance(1.6);
        timer.step(Some(&clock), &mut events);
        assert_eq!(beats(&events), vec![0, 1, 2, 3]);
        assert!(timer.schedule().next_beat_time >= timer.current_time());
    }

    #[test]
    fn test_no_beats_when_paused() {
        let clock = PlaybackClock::new(10.0);
        let mut timer = RhythmTimer::new(RhythmConfig::default());
        let mut events = Vec::new();
        timer.step(Some(&clock), &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_missing_clock_is_inert() {
        let mut timer = RhythmTimer::new(RhythmConfig::default());
        let mut events = Vec::new();
        timer.step(None, &mut events);
        timer.step(None, &mut events);
        assert!(events.is_empty());
        assert_eq!(timer.current_time(), 0.0);
    }

    #[test]
    fn test_restart_reseeds_schedule() {
        let mut clock = PlaybackClock::new(10.0);
        clock.play();
        let mut timer = RhythmTimer::new(RhythmConfig::default());
        let mut events = Vec::new();
        clock.advance(2.1);
        timer.step(Some(&clock), &mut events);

        clock.restart();
        events.clear();
        timer.step(Some(&clock), &mut events);
        assert_eq!(beats(&events), vec![0]);
    }

    /// Clock frozen at a fixed reading
    struct FixedClock {
        time: f32,
        playing: bool,
    }

    impl ClockSource for FixedClock {
        fn current_time(&self) -> f32 {
            self.time
        }

        fn total_duration(&self) -> f32 {
            1000.0
        }

        fn is_playing(&self) -> bool {
            self.playing
        }
    }

    #[test]
    fn test_extreme_tempo_step_completes() {
        let mut timer = RhythmTimer::new(RhythmConfig {
            bpm: 1e7,
            first_beat: 150.0,
        });
        assert_eq!(timer.schedule().bpm, MAX_BPM);

        let clock = FixedClock {
            time: 200.0,
            playing: true,
        };
        let mut events = Vec::new();
        timer.step(Some(&clock), &mut events);
        assert!(!events.is_empty());
        assert!(events.len() as u32 <= MAX_BEATS_PER_STEP);
        // Only the most recent boundaries are reported
        assert!(beats(&events).iter().all(|i| *i > 4900));
        assert!(timer.schedule().next_beat_time > 199.9);
    }

    #[test]
    fn test_unrepresentable_interval_stops_instead_of_spinning() {
        let mut schedule = BeatSchedule::new(RhythmConfig {
            bpm: 60.0,
            first_beat: 150.0,
        });
        // Far below the f32 spacing around 200s
        schedule.beat_interval = 1e-6;
        let mut events = Vec::new();
        schedule.consume_until(200.0, &mut events);
        assert!(!events.is_empty());
        assert!(events.len() as u32 <= MAX_BEATS_PER_STEP);
    }

    #[test]
    fn test_beats_passed_while_stopped_are_skipped() {
        let mut timer = RhythmTimer::new(RhythmConfig::default()); // 0.5s interval
        let mut events = Vec::new();
        let mut clock = FixedClock {
            time: 5.0,
            playing: false,
        };
        timer.step(Some(&clock), &mut events);
        assert!(events.is_empty());
        assert!(timer.schedule().next_beat_time >= timer.current_time());

        // The boundary at the current reading still fires once playing
        clock.playing = true;
        timer.step(Some(&clock), &mut events);
        assert_eq!(beats(&events), vec![10]);
    }

    #[test]
    fn test_invalid_bpm_falls_back() {
        let schedule = BeatSchedule::new(RhythmConfig {
            bpm: 0.0,
            first_beat: 0.0,
        });
        assert_eq!(schedule.bpm, DEFAULT_BPM);
    }

    #[test]
    fn test_deadline_warning_fires_once() {
        let mut clock = PlaybackClock::new(10.0);
        clock.play();
        let mut action = ActionTimer::new(0.5);
        action.reset(2.0);
        let mut events = Vec::new();

        clock.advance(1.4);
        action.step(Some(&clock), &mut events);
        assert!(events.is_empty());

        clock.advance(0.2);
        action.step(Some(&clock), &mut events);
        assert_eq!(events, vec![RhythmEvent::DeadlineApproaching { deadline: 2.0 }]);

        clock.advance(0.3);
        action.step(Some(&clock), &mut events);
        assert_eq!(events.len(), 1);

        // Re-arming allows one more notification
        action.reset(4.0);
        clock.advance(1.7);
        action.step(Some(&clock), &mut events);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_deadline_silent_when_not_playing() {
        let clock = PlaybackClock::new(10.0);
        let mut action = ActionTimer::new(0.5);
        action.reset(0.0);
        let mut events = Vec::new();
        action.step(Some(&clock), &mut events);
        assert!(events.is_empty());
        assert!(!action.has_fired());
    }
}
