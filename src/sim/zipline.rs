//! Zipline path riding
//!
//! The cable is a quadratic Bezier sagging below the midpoint of its two
//! anchors. It is sampled once into a polyline with a cumulative arc-length
//! table; riders then move along arc length at constant speed.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::closest_on_segment;
use crate::consts::*;

/// Sampled cable geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZiplinePath {
    pub start: Vec2,
    pub end: Vec2,
    pub curve_height: f32,
    points: Vec<Vec2>,
    /// cumulative[i] = arc length from points[0] to points[i]
    cumulative: Vec<f32>,
}

/// Closest point on the path to some position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoint {
    /// Normalized arc-length position in [0, 1]
    pub t: f32,
    pub segment: usize,
    pub distance: f32,
}

impl ZiplinePath {
    /// Sample `resolution + 1` points of the sagging curve
    pub fn build(start: Vec2, end: Vec2, curve_height: f32, resolution: usize) -> Self {
        let resolution = resolution.max(1);
        let control = (start + end) / 2.0 - Vec2::Y * curve_height;

        let points: Vec<Vec2> = (0..=resolution)
            .map(|i| {
                let u = i as f32 / resolution as f32;
                let inv = 1.0 - u;
                start * (inv * inv) + control * (2.0 * inv * u) + end * (u * u)
            })
            .collect();

        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        cumulative.push(0.0);
        for pair in points.windows(2) {
            total += pair[0].distance(pair[1]);
            cumulative.push(total);
        }

        Self {
            start,
            end,
            curve_height,
            points,
            cumulative,
        }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Total arc length
    pub fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn is_degenerate(&self) -> bool {
        self.length() < MIN_PATH_LENGTH
    }

    /// Segment index and local fraction for a normalized arc position
    fn locate(&self, t: f32) -> (usize, f32) {
        let last_segment = self.points.len().saturating_sub(2);
        let length = self.length();
        if length <= 0.0 {
            return (0, 0.0);
        }
        let target = t.clamp(0.0, 1.0) * length;
        // First cumulative entry >= target marks the segment's far end
        let upper = self.cumulative.partition_point(|&c| c < target);
        let segment = upper.saturating_sub(1).min(last_segment);
        let seg_len = self.cumulative[segment + 1] - self.cumulative[segment];
        let local = if seg_len > 0.0 {
            ((target - self.cumulative[segment]) / seg_len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (segment, local)
    }

    /// World position at normalized arc position `t`
    pub fn point_at(&self, t: f32) -> Vec2 {
        if self.points.len() < 2 {
            return self.start;
        }
        let (segment, local) = self.locate(t);
        self.points[segment].lerp(self.points[segment + 1], local)
    }

    /// Unit direction of travel (start -> end) at `t`
    pub fn tangent_at(&self, t: f32) -> Vec2 {
        if self.points.len() < 2 {
            return Vec2::ZERO;
        }
        let (segment, _) = self.locate(t);
        (self.points[segment + 1] - self.points[segment]).normalize_or_zero()
    }

    /// Linear scan for the nearest segment. Ties keep the first segment.
    pub fn closest(&self, position: Vec2) -> Option<ClosestPoint> {
        let length = self.length();
        let mut best: Option<(usize, f32, f32)> = None;
        for (i, pair) in self.points.windows(2).enumerate() {
            let (s, dist_sq) = closest_on_segment(position, pair[0], pair[1]);
            if best.is_none_or(|(_, _, d)| dist_sq < d) {
                best = Some((i, s, dist_sq));
            }
        }
        best.map(|(segment, s, dist_sq)| {
            let seg_len = self.cumulative[segment + 1] - self.cumulative[segment];
            let t = if length > 0.0 {
                ((self.cumulative[segment] + s * seg_len) / length).clamp(0.0, 1.0)
            } else {
                0.0
            };
            ClosestPoint {
                t,
                segment,
                distance: dist_sq.sqrt(),
            }
        })
    }

    fn segment_direction(&self, segment: usize) -> Vec2 {
        match (self.points.get(segment), self.points.get(segment + 1)) {
            (Some(a), Some(b)) => *b - *a,
            _ => Vec2::ZERO,
        }
    }
}

/// Zipline tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZiplineConfig {
    /// Ride speed along the cable (units/s)
    pub speed: f32,
    pub curve_height: f32,
    pub resolution: usize,
    /// Seconds after an exit before the same zipline accepts the rider again
    pub reentry_cooldown: f32,
    /// Only grab the cable while falling
    pub require_downward: bool,
    /// Speed given along the tangent when jumping off
    pub jump_impulse: f32,
}

impl Default for ZiplineConfig {
    fn default() -> Self {
        Self {
            speed: ZIPLINE_SPEED,
            curve_height: 1.0,
            resolution: ZIPLINE_RESOLUTION,
            reentry_cooldown: ZIPLINE_REENTRY_COOLDOWN,
            require_downward: true,
            jump_impulse: ZIPLINE_JUMP_IMPULSE,
        }
    }
}

/// Where a rider is on the cable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiderProgress {
    pub t: f32,
    /// +1 toward `end`, -1 toward `start`
    pub direction: f32,
}

/// Why entry was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRefusal {
    AlreadyRiding,
    NotFalling,
    Cooldown,
    DegeneratePath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    ReachedEnd,
    Jumped,
    DegeneratePath,
}

/// Outcome of one ride step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RideStep {
    Riding { position: Vec2, tangent: Vec2 },
    Exited { position: Vec2, velocity: Vec2, reason: ExitReason },
}

/// A zipline and its (single) rider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zipline {
    pub id: u32,
    pub config: ZiplineConfig,
    path: ZiplinePath,
    ride: Option<RiderProgress>,
    last_exit: Option<f32>,
}

impl Zipline {
    pub fn new(id: u32, start: Vec2, end: Vec2, config: ZiplineConfig) -> Self {
        Self {
            id,
            config,
            path: ZiplinePath::build(start, end, config.curve_height, config.resolution),
            ride: None,
            last_exit: None,
        }
    }

    pub fn path(&self) -> &ZiplinePath {
        &self.path
    }

    pub fn progress(&self) -> Option<RiderProgress> {
        self.ride
    }

    pub fn is_riding(&self) -> bool {
        self.ride.is_some()
    }

    /// Move the anchors; the path is resampled only if geometry changed
    pub fn set_geometry(&mut self, start: Vec2, end: Vec2, curve_height: f32) {
        if self.path.start == start && self.path.end == end && self.path.curve_height == curve_height {
            return;
        }
        self.config.curve_height = curve_height;
        self.path = ZiplinePath::build(start, end, curve_height, self.config.resolution);
    }

    /// Attach an actor at the closest point of the cable
    pub fn try_enter(
        &mut self,
        actor_pos: Vec2,
        actor_vel: Vec2,
        now: f32,
    ) -> Result<RiderProgress, EntryRefusal> {
        if self.ride.is_some() {
            return Err(EntryRefusal::AlreadyRiding);
        }
        if self.config.require_downward && actor_vel.y >= 0.0 {
            return Err(EntryRefusal::NotFalling);
        }
        if self
            .last_exit
            .is_some_and(|exit| now - exit < self.config.reentry_cooldown)
        {
            return Err(EntryRefusal::Cooldown);
        }
        if self.path.is_degenerate() {
            log::debug!("Zipline {} has no length, ignoring entry", self.id);
            return Err(EntryRefusal::DegeneratePath);
        }
        let Some(closest) = self.path.closest(actor_pos) else {
            return Err(EntryRefusal::DegeneratePath);
        };

        // Slide downhill; on a flat stretch keep the actor's horizontal sense
        let seg = self.path.segment_direction(closest.segment);
        let direction = if seg.y < -f32::EPSILON {
            1.0
        } else if seg.y > f32::EPSILON {
            -1.0
        } else if actor_vel.dot(seg) < 0.0 {
            -1.0
        } else {
            1.0
        };

        let progress = RiderProgress {
            t: closest.t,
            direction,
        };
        log::info!(
            "Zipline {} entered at t={:.3} heading {}",
            self.id,
            progress.t,
            if direction > 0.0 { "to end" } else { "to start" }
        );
        self.ride = Some(progress);
        Ok(progress)
    }

    /// Advance the rider. Returns `None` when nobody is riding.
    pub fn tick(&mut self, dt: f32, jump_pressed: bool, now: f32) -> Option<RideStep> {
        let mut ride = self.ride?;

        if self.path.is_degenerate() {
            return Some(self.exit(ride, Vec2::ZERO, ExitReason::DegeneratePath, now));
        }

        let tangent = self.path.tangent_at(ride.t) * ride.direction;
        if jump_pressed {
            let velocity = tangent * self.config.jump_impulse;
            return Some(self.exit(ride, velocity, ExitReason::Jumped, now));
        }

        ride.t += self.config.speed / self.path.length() * ride.direction * dt;
        ride.t = ride.t.clamp(0.0, 1.0);
        let tangent = self.path.tangent_at(ride.t) * ride.direction;

        if ride.t <= 0.0 || ride.t >= 1.0 {
            let velocity = tangent * self.config.speed.abs();
            return Some(self.exit(ride, velocity, ExitReason::ReachedEnd, now));
        }

        self.ride = Some(ride);
        Some(RideStep::Riding {
            position: self.path.point_at(ride.t),
            tangent,
        })
    }

    fn exit(&mut self, ride: RiderProgress, velocity: Vec2, reason: ExitReason, now: f32) -> RideStep {
        self.ride = None;
        self.last_exit = Some(now);
        log::info!("Zipline {} exited ({:?}) at t={:.3}", self.id, reason, ride.t);
        RideStep::Exited {
            position: self.path.point_at(ride.t),
            velocity,
            reason,
        }
    }
}
