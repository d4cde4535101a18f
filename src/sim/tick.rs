//! Simulation step
//!
//! Advances the whole level by one step. This is the only place level state
//! is mutated during play, and it never fails: problems degrade to no-ops
//! and are reported through events and logging.

use glam::Vec2;

use super::clock::ClockSource;
use super::effects::EffectKind;
use super::player::{MotionState, PlayerEvent, PlayerInput};
use super::rhythm::RhythmEvent;
use super::state::{GameEvent, GamePhase, LevelState};
use super::zipline::RideStep;

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub player: PlayerInput,
    /// Rhythm action key went down this step
    pub rhythm_action: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the level by one step of `dt` seconds
pub fn tick(state: &mut LevelState, input: &TickInput, clock: Option<&dyn ClockSource>, dt: f32) {
    // Handle pause toggle
    if input.pause && state.session.pause_allowed {
        match state.phase {
            GamePhase::Playing => {
                state.set_phase(GamePhase::Paused);
                return;
            }
            GamePhase::Paused => state.set_phase(GamePhase::Playing),
            _ => {}
        }
    }

    // Don't tick if paused or over
    match state.phase {
        GamePhase::Paused | GamePhase::Finished | GamePhase::Dead => return,
        _ => {}
    }

    state.time_ticks += 1;
    state.elapsed += dt;

    let finished = state.effects.step(dt);
    if state.phase == GamePhase::Countdown {
        let countdown_done = finished.iter().any(|f| f.kind == EffectKind::Countdown);
        if countdown_done {
            state.session.started = true;
            state.set_phase(GamePhase::Playing);
        }
        return;
    }

    step_rhythm(state, input, clock, dt);
    step_player(state, &input.player, dt);
    step_hostiles(state, dt);

    if state.player.is_dead() {
        state.session.pause_allowed = false;
        state.set_phase(GamePhase::Dead);
        return;
    }

    if clock.is_some_and(track_ended) {
        state.session.pause_allowed = false;
        state.set_phase(GamePhase::Finished);
    }
}

fn track_ended(clock: &dyn ClockSource) -> bool {
    let total = clock.total_duration();
    !clock.is_playing() && total > 0.0 && clock.current_time() >= total
}

/// Beats, deadline warnings, judgements, blinks and popup fade
fn step_rhythm(state: &mut LevelState, input: &TickInput, clock: Option<&dyn ClockSource>, dt: f32) {
    let mut rhythm_events = Vec::new();
    state.rhythm.step(clock, &mut rhythm_events);
    state.action_timer.step(clock, &mut rhythm_events);
    for event in rhythm_events {
        state.events.push(match event {
            RhythmEvent::Beat { index, .. } => GameEvent::Beat { index },
            RhythmEvent::DeadlineApproaching { deadline } => GameEvent::DeadlineApproaching { deadline },
        });
    }

    state.scoring.step(dt);

    // Without a clock there is no music time to judge or blink against
    if clock.is_none() {
        return;
    }
    let now = state.rhythm.current_time();

    let blink_events = state.blinks.step(now, &mut state.effects);
    state
        .events
        .extend(blink_events.into_iter().map(GameEvent::Blink));

    let scale = state.config.judge_time_scale;
    let transition = state.config.action_transition;
    if input.rhythm_action {
        if let Some(expected) = state.pending_deadlines.pop_front() {
            judge(state, now, expected, transition, scale);
        } else {
            log::debug!("Rhythm action at {:.3}s with nothing to judge", now);
        }
    }

    // Deadlines that slid out of every window are judged as they expire
    let bad_window = state.scoring.config.bad_window;
    while let Some(&expected) = state.pending_deadlines.front() {
        if (now - expected) * scale <= bad_window {
            break;
        }
        state.pending_deadlines.pop_front();
        judge(state, now, expected, transition, scale);
    }
}

fn judge(state: &mut LevelState, now: f32, expected: f32, transition: f32, scale: f32) {
    let outcome = state
        .scoring
        .judge_action(now * scale, expected * scale, transition);
    state.events.push(GameEvent::Judged(outcome));
    match state.pending_deadlines.front() {
        Some(&next) => state.action_timer.reset(next),
        None => state.action_timer.clear(),
    }
}

/// Zipline riding or free movement, then cable grabs
fn step_player(state: &mut LevelState, input: &PlayerInput, dt: f32) {
    let now = state.elapsed;

    if let Some(idx) = state.riding {
        let Some(zipline) = state.ziplines.get_mut(idx) else {
            log::warn!("Ridden zipline {} vanished, releasing player", idx);
            state.riding = None;
            state.player.gravity_scale = 1.0;
            return;
        };
        let id = zipline.id;
        let speed = zipline.config.speed.abs();
        match zipline.tick(dt, input.jump_pressed, now) {
            Some(RideStep::Riding { position, tangent }) => {
                state.player.position = position;
                state.player.velocity = tangent * speed;
            }
            Some(RideStep::Exited {
                position,
                velocity,
                reason,
            }) => {
                state.player.position = position;
                state.player.velocity = velocity;
                state.player.gravity_scale = 1.0;
                state.riding = None;
                state.events.push(GameEvent::ZiplineExited { id, reason });
            }
            None => {
                state.player.gravity_scale = 1.0;
                state.riding = None;
            }
        }
        return;
    }

    let floor = state.config.floor_y;
    let grounded = state.player.position.y <= floor + 1e-4 && state.player.velocity.y <= 0.0;
    let player_events = state.player.step(input, grounded, dt);
    state
        .events
        .extend(player_events.into_iter().map(GameEvent::Player));

    integrate(state, dt);
    try_grab_zipline(state, now);
}

/// Stand-in for engine physics: gravity plus a flat floor
fn integrate(state: &mut LevelState, dt: f32) {
    let player = &mut state.player;
    player.velocity.y -= state.config.gravity * player.gravity_scale * dt;
    player.position += player.velocity * dt;
    if player.position.y < state.config.floor_y {
        player.position.y = state.config.floor_y;
        player.velocity.y = player.velocity.y.max(0.0);
    }
}

fn try_grab_zipline(state: &mut LevelState, now: f32) {
    if state.player.state.is_locked() || state.player.is_dead() {
        return;
    }
    let pos = state.player.position;
    let vel = state.player.velocity;
    let radius = state.config.zipline_grab_radius;

    for (idx, zipline) in state.ziplines.iter_mut().enumerate() {
        let near = zipline
            .path()
            .closest(pos)
            .is_some_and(|c| c.distance <= radius);
        if !near {
            continue;
        }
        if zipline.try_enter(pos, vel, now).is_ok() {
            state.riding = Some(idx);
            state.player.gravity_scale = 0.0;
            state.player.velocity = Vec2::ZERO;
            if state.player.state == MotionState::Jumping {
                state.player.state = MotionState::Idle;
            }
            state.events.push(GameEvent::ZiplineEntered { id: zipline.id });
            break;
        }
    }
}

/// Patrol, then resolve contacts against the player's current collider
fn step_hostiles(state: &mut LevelState, dt: f32) {
    let player_box = state.player.collider.bounds(state.player.position);
    for hostile in &mut state.hostiles {
        hostile.patrol(dt);
        if !hostile.overlaps(player_box) {
            continue;
        }
        if state.player.active_hitbox.is_some() {
            hostile.defeated = true;
            state.events.push(GameEvent::HostileDefeated { id: hostile.id });
        } else if state.player.on_hostile_contact(hostile.ignores_rolling) {
            state.events.push(GameEvent::Player(PlayerEvent::Died));
            break;
        }
    }
}
