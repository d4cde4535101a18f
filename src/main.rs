//! Zipbeat entry point
//!
//! Runs a short scripted session headlessly: the level, a stepped playback
//! clock, and a key script fed through the input sampler. Settings and
//! bindings come from the platform's config store.

use std::collections::BTreeSet;

use glam::Vec2;

use zipbeat::consts::*;
use zipbeat::persistence::{ConfigStore, ControlLayout, Keybindings};
use zipbeat::platform::{Action, InputSampler};
use zipbeat::sim::{
    ClockSource, GameEvent, GamePhase, LevelConfig, LevelState, PlaybackClock, PlayerEvent, tick,
};
use zipbeat::{AudioChannel, Settings};

/// Length of the demo track (seconds)
const DEMO_TRACK_SECONDS: f32 = 8.0;
/// Wall-clock frame length the demo pretends to render at
const DEMO_FRAME: f32 = 1.0 / 50.0;

/// A held-key interval on the track timeline
struct ScriptedPress {
    action: Action,
    from: f32,
    until: f32,
}

fn demo_level() -> LevelConfig {
    LevelConfig {
        action_deadlines: vec![1.0, 2.5, 4.0, 5.5],
        blink_timestamps: vec![2.0, 3.0, 6.0],
        spawn: Vec2::new(0.0, 0.0),
        ..Default::default()
    }
}

fn demo_script() -> Vec<ScriptedPress> {
    let tap = |action, at: f32| ScriptedPress {
        action,
        from: at,
        until: at + 0.05,
    };
    vec![
        ScriptedPress {
            action: Action::MoveRight,
            from: 0.0,
            until: 6.0,
        },
        tap(Action::RhythmAction, 1.01),
        tap(Action::Jump, 1.8),
        tap(Action::RhythmAction, 2.56),
        tap(Action::Punch, 3.2),
        tap(Action::Roll, 4.6),
        // Deadline at 5.5 is left unanswered and auto-judged
    ]
}

/// Play the scripted session against `store`, returning the final score text
fn run_session(store: &mut dyn ConfigStore) -> String {
    let settings = Settings::load(&*store);
    let bindings = Keybindings::load(store);
    let layout = ControlLayout::load(store);
    log::info!(
        "Music at {:.1} dB, FPS cap {}, {} touch widgets",
        settings.decibels(AudioChannel::Music),
        settings.fps_cap.label(),
        layout.widgets.len()
    );

    let mut level = LevelState::new(demo_level());
    level.add_zipline(Vec2::new(8.0, 6.0), Vec2::new(18.0, 2.0));
    level.add_hostile(Vec2::new(12.0, 0.5), (10.0, 14.0), 1.5);

    let mut clock = PlaybackClock::new(DEMO_TRACK_SECONDS);
    let mut sampler = InputSampler::new();
    let script = demo_script();
    let mut held = BTreeSet::new();

    let mut accumulator = 0.0;
    let mut elapsed = 0.0;
    // Generous upper bound so a stuck phase can't spin forever
    let max_frames = ((DEMO_TRACK_SECONDS + level.config.countdown_seconds) / DEMO_FRAME) as u32 * 2;

    for _ in 0..max_frames {
        accumulator += DEMO_FRAME;
        elapsed += DEMO_FRAME;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            held.clear();
            let now = clock.current_time();
            for press in script.iter().filter(|p| now >= p.from && now < p.until) {
                held.insert(bindings.key_for(press.action));
            }
            let input = sampler.sample(&held, &bindings);

            clock.advance(SIM_DT);
            tick(&mut level, &input, Some(&clock), SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;

            for event in level.drain_events() {
                report(&event, &mut clock);
            }
        }

        if matches!(level.phase, GamePhase::Finished | GamePhase::Dead) {
            break;
        }
    }

    log::info!(
        "Session over after {:.1}s: {:?}, score {} ({})",
        elapsed,
        level.phase,
        level.scoring.score_text(),
        level.scoring.multiplier_text()
    );
    level.scoring.score_text().to_string()
}

/// Log notable events and keep the clock in step with the phase
fn report(event: &GameEvent, clock: &mut PlaybackClock) {
    match event {
        GameEvent::PhaseChanged(GamePhase::Playing) => clock.play(),
        GameEvent::PhaseChanged(GamePhase::Paused) => clock.pause(),
        GameEvent::PhaseChanged(phase) => log::info!("Phase: {:?}", phase),
        GameEvent::Judged(outcome) => log::info!(
            "{} ({:+.0}ms) +{:.0}",
            outcome.judgement.label(),
            outcome.delay,
            outcome.points
        ),
        GameEvent::Player(PlayerEvent::Died) => log::warn!("Player died"),
        GameEvent::ZiplineEntered { id } => log::info!("Grabbed zipline {}", id),
        GameEvent::ZiplineExited { id, reason } => {
            log::info!("Left zipline {} ({:?})", id, reason)
        }
        GameEvent::HostileDefeated { id } => log::info!("Defeated hostile {}", id),
        other => log::debug!("{:?}", other),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use zipbeat::persistence::JsonFileStore;

    env_logger::init();
    log::info!("Zipbeat (native) starting...");

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "zipbeat-config.json".to_string());
    let mut store = JsonFileStore::open(path);
    let score = run_session(&mut store);
    println!("Final score: {}", score);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn wasm_main() {
    use zipbeat::platform::LocalStorageStore;

    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        return;
    }
    log::info!("Zipbeat starting...");

    let mut store = LocalStorageStore::open();
    run_session(&mut store);
}
