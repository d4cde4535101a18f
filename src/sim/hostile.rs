//! Hostile actors
//!
//! Simple patrolling walkers. Touching one kills the player unless the
//! walker lets rolling players pass through.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A walker pacing between two x bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hostile {
    pub id: u32,
    pub pos: Vec2,
    pub half_extents: Vec2,
    /// Patrol bounds (min_x, max_x)
    pub patrol: (f32, f32),
    pub speed: f32,
    /// +1 walking right, -1 walking left
    pub heading: f32,
    /// Rolling players pass through without dying
    pub ignores_rolling: bool,
    /// Knocked out by a player attack
    #[serde(default)]
    pub defeated: bool,
}

impl Hostile {
    pub fn new(id: u32, pos: Vec2, patrol: (f32, f32), speed: f32) -> Self {
        let (a, b) = patrol;
        Self {
            id,
            pos,
            half_extents: Vec2::new(0.5, 0.5),
            patrol: (a.min(b), a.max(b)),
            speed: speed.abs(),
            heading: 1.0,
            ignores_rolling: true,
            defeated: false,
        }
    }

    /// Walk toward the current bound, turning around on arrival
    pub fn patrol(&mut self, dt: f32) {
        if self.defeated {
            return;
        }
        let (min_x, max_x) = self.patrol;
        self.pos.x += self.heading * self.speed * dt;
        if self.pos.x >= max_x {
            self.pos.x = max_x;
            self.heading = -1.0;
        } else if self.pos.x <= min_x {
            self.pos.x = min_x;
            self.heading = 1.0;
        }
    }

    pub fn bounds(&self) -> (Vec2, Vec2) {
        (self.pos - self.half_extents, self.pos + self.half_extents)
    }

    /// AABB overlap test against another (min, max) box
    pub fn overlaps(&self, other: (Vec2, Vec2)) -> bool {
        if self.defeated {
            return false;
        }
        let (min, max) = self.bounds();
        min.x < other.1.x && max.x > other.0.x && min.y < other.1.y && max.y > other.0.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patrol_turns_at_bounds() {
        let mut h = Hostile::new(1, Vec2::new(0.0, 0.0), (-1.0, 1.0), 2.0);
        h.patrol(0.75);
        assert_eq!(h.pos.x, 1.0);
        assert_eq!(h.heading, -1.0);
        h.patrol(0.5);
        assert_eq!(h.pos.x, 0.0);
        h.patrol(1.0);
        assert_eq!(h.pos.x, -1.0);
        assert_eq!(h.heading, 1.0);
    }

    #[test]
    fn test_overlap() {
        let h = Hostile::new(1, Vec2::ZERO, (-5.0, 5.0), 1.0);
        assert!(h.overlaps((Vec2::new(0.4, -1.0), Vec2::new(1.4, 1.0))));
        assert!(!h.overlaps((Vec2::new(0.6, -1.0), Vec2::new(1.6, 1.0))));
    }

    #[test]
    fn test_defeated_hostile_is_harmless() {
        let mut h = Hostile::new(1, Vec2::ZERO, (-5.0, 5.0), 1.0);
        h.defeated = true;
        h.patrol(1.0);
        assert_eq!(h.pos, Vec2::ZERO);
        assert!(!h.overlaps((Vec2::splat(-1.0), Vec2::splat(1.0))));
    }
}
