//! Player motion state machine
//!
//! Converts sampled input into run/jump/crouch/roll/attack behaviour.
//! Rolling, attacking and crouching are "locked" states: while one is active
//! the others cannot start, except that rolls and attacks cancel a crouch.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::decay_toward_zero;

/// Attack variants, each with its own hitbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackKind {
    Punch,
    Kick,
    Uppercut,
    Stomp,
}

/// Current motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MotionState {
    #[default]
    Idle,
    Running,
    /// Airborne after a jump; not a locked state
    Jumping,
    Crouching,
    Rolling,
    Attacking(AttackKind),
    /// Terminal
    Dead,
}

impl MotionState {
    pub fn is_locked(&self) -> bool {
        matches!(
            self,
            MotionState::Crouching | MotionState::Rolling | MotionState::Attacking(_)
        )
    }
}

/// Movement tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub run_speed: f32,
    pub jump_speed: f32,
    pub coyote_time: f32,
    pub jump_buffer_time: f32,
    pub roll_distance: f32,
    pub roll_duration: f32,
    pub attack_duration: f32,
    pub stomp_speed: f32,
    pub size: Vec2,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            run_speed: RUN_SPEED,
            jump_speed: JUMP_SPEED,
            coyote_time: COYOTE_TIME,
            jump_buffer_time: JUMP_BUFFER_TIME,
            roll_distance: ROLL_DISTANCE,
            roll_duration: ROLL_DURATION,
            attack_duration: ATTACK_DURATION,
            stomp_speed: STOMP_SPEED,
            size: Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
        }
    }
}

/// Input sampled for one step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    /// Signed horizontal axis in [-1, 1]
    pub horizontal: f32,
    /// Jump key went down this step
    pub jump_pressed: bool,
    pub crouch_held: bool,
    pub punch_pressed: bool,
    pub kick_pressed: bool,
    pub uppercut_pressed: bool,
    pub stomp_pressed: bool,
    pub roll_pressed: bool,
}

/// Coyote time and jump buffer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JumpAssist {
    pub coyote_remaining: f32,
    pub buffer_remaining: f32,
}

impl JumpAssist {
    /// Refill or decay both counters for one step
    pub fn update(&mut self, grounded: bool, jump_pressed: bool, dt: f32, config: &PlayerConfig) {
        self.coyote_remaining = if grounded {
            config.coyote_time
        } else {
            decay_toward_zero(self.coyote_remaining, dt)
        };
        self.buffer_remaining = if jump_pressed {
            config.jump_buffer_time
        } else {
            decay_toward_zero(self.buffer_remaining, dt)
        };
    }

    pub fn can_jump(&self) -> bool {
        self.coyote_remaining > 0.0 && self.buffer_remaining > 0.0
    }

    /// Consume both counters if a jump is allowed
    pub fn try_consume(&mut self) -> bool {
        if !self.can_jump() {
            return false;
        }
        self.coyote_remaining = 0.0;
        self.buffer_remaining = 0.0;
        true
    }
}

/// Axis-aligned collision box relative to the player's position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub size: Vec2,
    pub offset: Vec2,
}

impl Collider {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            offset: Vec2::ZERO,
        }
    }

    /// Half height, bottom edge unchanged
    pub fn shrunk(&self) -> Self {
        let size = Vec2::new(self.size.x, self.size.y / 2.0);
        let offset = Vec2::new(self.offset.x, self.offset.y - self.size.y / 4.0);
        Self { size, offset }
    }

    pub fn bottom(&self) -> f32 {
        self.offset.y - self.size.y / 2.0
    }

    /// World-space (min, max) corners
    pub fn bounds(&self, position: Vec2) -> (Vec2, Vec2) {
        let center = position + self.offset;
        let half = self.size / 2.0;
        (center - half, center + half)
    }
}

/// State changes reported by a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    Jumped,
    Landed,
    CrouchStarted,
    CrouchEnded,
    RollStarted,
    RollEnded,
    AttackStarted(AttackKind),
    AttackEnded(AttackKind),
    Died,
}

/// The player's motion controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerController {
    pub config: PlayerConfig,
    pub state: MotionState,
    pub position: Vec2,
    pub velocity: Vec2,
    /// +1 facing right, -1 facing left
    pub facing: f32,
    pub grounded: bool,
    pub assist: JumpAssist,
    pub collider: Collider,
    /// Hitbox currently enabled, if any
    pub active_hitbox: Option<AttackKind>,
    /// 1.0 normally, 0.0 while riding a zipline
    pub gravity_scale: f32,
    base_collider: Collider,
    /// Seconds left in the current roll or attack
    lock_timer: f32,
}

impl PlayerController {
    pub fn new(config: PlayerConfig, position: Vec2) -> Self {
        let collider = Collider::new(config.size);
        Self {
            config,
            state: MotionState::Idle,
            position,
            velocity: Vec2::ZERO,
            facing: 1.0,
            grounded: false,
            assist: JumpAssist::default(),
            collider,
            active_hitbox: None,
            gravity_scale: 1.0,
            base_collider: collider,
            lock_timer: 0.0,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.state == MotionState::Dead
    }

    /// Advance the state machine by one step
    pub fn step(&mut self, input: &PlayerInput, grounded: bool, dt: f32) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        if self.is_dead() {
            return events;
        }

        let was_grounded = self.grounded;
        self.grounded = grounded;
        if grounded && !was_grounded {
            events.push(PlayerEvent::Landed);
        }

        self.advance_timed_lock(dt, grounded, &mut events);
        self.assist.update(grounded, input.jump_pressed, dt, &self.config);

        let rolling = self.state == MotionState::Rolling;
        let attacking = matches!(self.state, MotionState::Attacking(_));
        if input.roll_pressed && grounded && !rolling && !attacking {
            self.start_roll(&mut events);
        } else if !rolling && !attacking {
            if let Some(kind) = self.requested_attack(input, grounded) {
                self.start_attack(kind, &mut events);
            }
        }

        if self.state == MotionState::Crouching && (!input.crouch_held || !grounded) {
            self.end_crouch(&mut events);
        }
        if input.crouch_held && grounded && !self.state.is_locked() {
            self.collider = self.base_collider.shrunk();
            self.velocity.x = 0.0;
            self.state = MotionState::Crouching;
            events.push(PlayerEvent::CrouchStarted);
        }

        if !self.state.is_locked() {
            self.velocity.x = input.horizontal.clamp(-1.0, 1.0) * self.config.run_speed;
            if input.horizontal > 0.0 {
                self.facing = 1.0;
            } else if input.horizontal < 0.0 {
                self.facing = -1.0;
            }

            if self.assist.try_consume() {
                self.velocity.y = self.config.jump_speed;
                self.state = MotionState::Jumping;
                events.push(PlayerEvent::Jumped);
            } else if self.state == MotionState::Jumping {
                if grounded && self.velocity.y <= 0.0 {
                    self.state = self.ground_state();
                }
            } else {
                self.state = self.ground_state();
            }
        }

        events
    }

    /// Apply contact with a hostile actor. Returns true if the player died.
    pub fn on_hostile_contact(&mut self, ignores_rolling: bool) -> bool {
        if self.is_dead() {
            return false;
        }
        if self.state == MotionState::Rolling && ignores_rolling {
            return false;
        }
        self.kill();
        true
    }

    /// External damage; enters the terminal Dead state
    pub fn kill(&mut self) {
        if self.is_dead() {
            return;
        }
        log::info!("Player died at ({:.2}, {:.2})", self.position.x, self.position.y);
        self.state = MotionState::Dead;
        self.velocity = Vec2::ZERO;
        self.active_hitbox = None;
        self.collider = self.base_collider;
        self.lock_timer = 0.0;
    }

    fn ground_state(&self) -> MotionState {
        if self.velocity.x.abs() > f32::EPSILON {
            MotionState::Running
        } else {
            MotionState::Idle
        }
    }

    fn requested_attack(&self, input: &PlayerInput, grounded: bool) -> Option<AttackKind> {
        if input.uppercut_pressed && grounded {
            Some(AttackKind::Uppercut)
        } else if input.stomp_pressed && !grounded && input.crouch_held {
            Some(AttackKind::Stomp)
        } else if input.punch_pressed {
            Some(AttackKind::Punch)
        } else if input.kick_pressed {
            Some(AttackKind::Kick)
        } else {
            None
        }
    }

    fn advance_timed_lock(&mut self, dt: f32, grounded: bool, events: &mut Vec<PlayerEvent>) {
        // A lock that runs out mid-air hands back to the airborne state
        let released = if grounded {
            MotionState::Idle
        } else {
            MotionState::Jumping
        };
        match self.state {
            MotionState::Rolling => {
                self.lock_timer -= dt;
                if self.lock_timer <= 0.0 {
                    self.collider = self.base_collider;
                    self.velocity.x = 0.0;
                    self.state = released;
                    events.push(PlayerEvent::RollEnded);
                }
            }
            MotionState::Attacking(kind) => {
                self.lock_timer -= dt;
                if self.lock_timer <= 0.0 {
                    self.active_hitbox = None;
                    self.state = released;
                    events.push(PlayerEvent::AttackEnded(kind));
                } else if kind == AttackKind::Stomp {
                    self.velocity.y = -self.config.stomp_speed;
                }
            }
            _ => {}
        }
    }

    fn start_roll(&mut self, events: &mut Vec<PlayerEvent>) {
        if self.state == MotionState::Crouching {
            self.end_crouch(events);
        }
        self.collider = self.base_collider.shrunk();
        let duration = self.config.roll_duration.max(f32::EPSILON);
        self.velocity.x = self.facing * self.config.roll_distance / duration;
        self.lock_timer = self.config.roll_duration;
        self.state = MotionState::Rolling;
        events.push(PlayerEvent::RollStarted);
    }

    fn start_attack(&mut self, kind: AttackKind, events: &mut Vec<PlayerEvent>) {
        if self.state == MotionState::Crouching {
            self.end_crouch(events);
        }
        if kind == AttackKind::Stomp {
            self.velocity = Vec2::new(0.0, -self.config.stomp_speed);
        }
        self.active_hitbox = Some(kind);
        self.lock_timer = self.config.attack_duration;
        self.state = MotionState::Attacking(kind);
        events.push(PlayerEvent::AttackStarted(kind));
    }

    fn end_crouch(&mut self, events: &mut Vec<PlayerEvent>) {
        self.collider = self.base_collider;
        self.state = MotionState::Idle;
        events.push(PlayerEvent::CrouchEnded);
    }
}
