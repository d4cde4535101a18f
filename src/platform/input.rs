//! Keyboard input sampling
//!
//! The engine only answers "is this key down right now?". The sampler turns
//! that into per-step commands, with edge detection for one-shot actions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::persistence::Keybindings;
use crate::sim::{PlayerInput, TickInput};

macro_rules! key_codes {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Physical keys that can be bound to actions
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum KeyCode {
            $($variant),*
        }

        impl KeyCode {
            /// Every key, in declaration order
            pub const ALL: &'static [KeyCode] = &[$(KeyCode::$variant),*];

            /// Persisted identifier
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(KeyCode::$variant => $name),*
                }
            }

            /// Inverse of [`KeyCode::as_str`] (exact match)
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(KeyCode::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

key_codes! {
    A => "A", B => "B", C => "C", D => "D", E => "E", F => "F", G => "G",
    H => "H", I => "I", J => "J", K => "K", L => "L", M => "M", N => "N",
    O => "O", P => "P", Q => "Q", R => "R", S => "S", T => "T", U => "U",
    V => "V", W => "W", X => "X", Y => "Y", Z => "Z",
    Alpha0 => "Alpha0", Alpha1 => "Alpha1", Alpha2 => "Alpha2", Alpha3 => "Alpha3",
    Alpha4 => "Alpha4", Alpha5 => "Alpha5", Alpha6 => "Alpha6", Alpha7 => "Alpha7",
    Alpha8 => "Alpha8", Alpha9 => "Alpha9",
    Space => "Space",
    Return => "Return",
    Escape => "Escape",
    Tab => "Tab",
    Backspace => "Backspace",
    LeftShift => "LeftShift",
    RightShift => "RightShift",
    LeftControl => "LeftControl",
    RightControl => "RightControl",
    LeftAlt => "LeftAlt",
    RightAlt => "RightAlt",
    UpArrow => "UpArrow",
    DownArrow => "DownArrow",
    LeftArrow => "LeftArrow",
    RightArrow => "RightArrow",
}

/// Bindable game actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
    Crouch,
    Punch,
    Kick,
    Uppercut,
    Stomp,
    Roll,
    RhythmAction,
    Pause,
}

impl Action {
    pub const ALL: &'static [Action] = &[
        Action::MoveLeft,
        Action::MoveRight,
        Action::Jump,
        Action::Crouch,
        Action::Punch,
        Action::Kick,
        Action::Uppercut,
        Action::Stomp,
        Action::Roll,
        Action::RhythmAction,
        Action::Pause,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::MoveLeft => "MoveLeft",
            Action::MoveRight => "MoveRight",
            Action::Jump => "Jump",
            Action::Crouch => "Crouch",
            Action::Punch => "Punch",
            Action::Kick => "Kick",
            Action::Uppercut => "Uppercut",
            Action::Stomp => "Stomp",
            Action::Roll => "Roll",
            Action::RhythmAction => "RhythmAction",
            Action::Pause => "Pause",
        }
    }

    /// Key used when nothing valid is persisted
    pub fn default_key(&self) -> KeyCode {
        match self {
            Action::MoveLeft => KeyCode::A,
            Action::MoveRight => KeyCode::D,
            Action::Jump => KeyCode::Space,
            Action::Crouch => KeyCode::S,
            Action::Punch => KeyCode::J,
            Action::Kick => KeyCode::K,
            Action::Uppercut => KeyCode::U,
            Action::Stomp => KeyCode::L,
            Action::Roll => KeyCode::LeftShift,
            Action::RhythmAction => KeyCode::Return,
            Action::Pause => KeyCode::Escape,
        }
    }
}

/// Engine-side key state
pub trait InputOracle {
    fn is_down(&self, key: KeyCode) -> bool;
}

/// Set of held keys; handy for tests and scripted demos
impl InputOracle for BTreeSet<KeyCode> {
    fn is_down(&self, key: KeyCode) -> bool {
        self.contains(&key)
    }
}

/// Builds a [`TickInput`] per step from held keys
#[derive(Debug, Clone, Default)]
pub struct InputSampler {
    held_last_step: BTreeSet<Action>,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&mut self, oracle: &dyn InputOracle, bindings: &Keybindings) -> TickInput {
        let held: BTreeSet<Action> = Action::ALL
            .iter()
            .copied()
            .filter(|a| oracle.is_down(bindings.key_for(*a)))
            .collect();
        let pressed = |a: Action| held.contains(&a) && !self.held_last_step.contains(&a);

        let mut horizontal = 0.0;
        if held.contains(&Action::MoveLeft) {
            horizontal -= 1.0;
        }
        if held.contains(&Action::MoveRight) {
            horizontal += 1.0;
        }

        let input = TickInput {
            player: PlayerInput {
                horizontal,
                jump_pressed: pressed(Action::Jump),
                crouch_held: held.contains(&Action::Crouch),
                punch_pressed: pressed(Action::Punch),
                kick_pressed: pressed(Action::Kick),
                uppercut_pressed: pressed(Action::Uppercut),
                stomp_pressed: pressed(Action::Stomp),
                roll_pressed: pressed(Action::Roll),
            },
            rhythm_action: pressed(Action::RhythmAction),
            pause: pressed(Action::Pause),
        };
        self.held_last_step = held;
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_round_trip_and_are_unique() {
        let mut seen = BTreeSet::new();
        for key in KeyCode::ALL {
            assert!(seen.insert(key.as_str()), "duplicate name {}", key.as_str());
            assert_eq!(KeyCode::from_name(key.as_str()), Some(*key));
        }
        assert_eq!(KeyCode::from_name("NotAKey"), None);
        assert_eq!(KeyCode::from_name("space"), None);
    }

    #[test]
    fn test_default_keys_are_distinct() {
        let keys: BTreeSet<KeyCode> = Action::ALL.iter().map(|a| a.default_key()).collect();
        assert_eq!(keys.len(), Action::ALL.len());
    }

    #[test]
    fn test_sampler_detects_press_edges() {
        let bindings = Keybindings::default();
        let mut sampler = InputSampler::new();
        let mut keys = BTreeSet::new();
        keys.insert(KeyCode::Space);
        keys.insert(KeyCode::D);

        let first = sampler.sample(&keys, &bindings);
        assert!(first.player.jump_pressed);
        assert_eq!(first.player.horizontal, 1.0);

        // Still held: no new press
        let second = sampler.sample(&keys, &bindings);
        assert!(!second.player.jump_pressed);
        assert_eq!(second.player.horizontal, 1.0);

        keys.clear();
        sampler.sample(&keys, &bindings);
        keys.insert(KeyCode::Space);
        assert!(sampler.sample(&keys, &bindings).player.jump_pressed);
    }

    #[test]
    fn test_opposing_directions_cancel() {
        let bindings = Keybindings::default();
        let mut sampler = InputSampler::new();
        let keys: BTreeSet<KeyCode> = [KeyCode::A, KeyCode::D, KeyCode::S].into_iter().collect();
        let input = sampler.sample(&keys, &bindings);
        assert_eq!(input.player.horizontal, 0.0);
        assert!(input.player.crouch_held);
    }
}
