//! Music playback clock
//!
//! The audio engine owns the real track; the simulation only ever sees its
//! playback position through [`ClockSource`].

use serde::{Deserialize, Serialize};

/// Read-only view of a playing music track
pub trait ClockSource {
    /// Current playback position in seconds
    fn current_time(&self) -> f32;
    /// Length of the track in seconds
    fn total_duration(&self) -> f32;
    /// Whether the track is currently advancing
    fn is_playing(&self) -> bool;
}

/// A stepped playback clock, used when no audio backend drives time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackClock {
    current_time: f32,
    total_duration: f32,
    is_playing: bool,
}

impl PlaybackClock {
    pub fn new(total_duration: f32) -> Self {
        Self {
            current_time: 0.0,
            total_duration: total_duration.max(0.0),
            is_playing: false,
        }
    }

    pub fn play(&mut self) {
        if self.current_time < self.total_duration {
            self.is_playing = true;
        }
    }

    pub fn pause(&mut self) {
        self.is_playing = false;
    }

    /// Rewind to zero and start playing again
    pub fn restart(&mut self) {
        self.current_time = 0.0;
        self.is_playing = self.total_duration > 0.0;
    }

    /// Advance by one step; stops at the end of the track
    pub fn advance(&mut self, dt: f32) {
        if !self.is_playing {
            return;
        }
        self.current_time += dt.max(0.0);
        if self.current_time >= self.total_duration {
            self.current_time = self.total_duration;
            self.is_playing = false;
            log::debug!("Track finished at {:.2}s", self.total_duration);
        }
    }

    /// Whether the track played through to its end
    pub fn finished(&self) -> bool {
        !self.is_playing && self.total_duration > 0.0 && self.current_time >= self.total_duration
    }
}

impl ClockSource for PlaybackClock {
    fn current_time(&self) -> f32 {
        self.current_time
    }

    fn total_duration(&self) -> f32 {
        self.total_duration
    }

    fn is_playing(&self) -> bool {
        self.is_playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_only_advances_while_playing() {
        let mut clock = PlaybackClock::new(10.0);
        clock.advance(1.0);
        assert_eq!(clock.current_time(), 0.0);

        clock.play();
        clock.advance(1.0);
        assert!((clock.current_time() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_clock_stops_at_end() {
        let mut clock = PlaybackClock::new(2.0);
        clock.play();
        clock.advance(5.0);
        assert_eq!(clock.current_time(), 2.0);
        assert!(!clock.is_playing());
        assert!(clock.finished());
    }

    #[test]
    fn test_restart_resets_time() {
        let mut clock = PlaybackClock::new(5.0);
        clock.play();
        clock.advance(3.0);
        clock.restart();
        assert_eq!(clock.current_time(), 0.0);
        assert!(clock.is_playing());
    }
}
