//! Action -> key bindings
//!
//! Stored one entry per action under `key_<Action>`, valued with the key's
//! persisted name. Anything unreadable falls back to the action's default
//! and is written back.

use std::collections::BTreeMap;

use super::store::ConfigStore;
use crate::platform::input::{Action, KeyCode};

fn storage_key(action: Action) -> String {
    format!("key_{}", action.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keybindings {
    bindings: BTreeMap<Action, KeyCode>,
}

impl Default for Keybindings {
    fn default() -> Self {
        Self {
            bindings: Action::ALL.iter().map(|a| (*a, a.default_key())).collect(),
        }
    }
}

impl Keybindings {
    pub fn key_for(&self, action: Action) -> KeyCode {
        self.bindings
            .get(&action)
            .copied()
            .unwrap_or_else(|| action.default_key())
    }

    /// Action bound to `key`, if any
    pub fn action_for(&self, key: KeyCode) -> Option<Action> {
        self.bindings
            .iter()
            .find_map(|(action, bound)| (*bound == key).then_some(*action))
    }

    /// Bind `key` to `action`; an action already using `key` takes over the
    /// old key so no two actions share one.
    pub fn rebind(&mut self, action: Action, key: KeyCode) {
        let previous = self.key_for(action);
        if let Some(other) = self.action_for(key).filter(|other| *other != action) {
            self.bindings.insert(other, previous);
        }
        self.bindings.insert(action, key);
    }

    pub fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }

    /// Load bindings, repairing invalid or conflicting entries.
    ///
    /// Stored keys are placed first. Actions left without a key get their
    /// default, or the first free key when the default is already claimed.
    pub fn load(store: &mut dyn ConfigStore) -> Self {
        let mut bindings = BTreeMap::new();
        let mut unbound = Vec::new();

        for &action in Action::ALL {
            let raw = store.read(&storage_key(action));
            let parsed = raw.as_deref().and_then(|raw| {
                let code = KeyCode::from_name(raw.trim());
                if code.is_none() {
                    log::warn!("Unknown key '{}' for {}, using default", raw, action.as_str());
                }
                code
            });
            match parsed {
                Some(code) if !bindings.values().any(|k| *k == code) => {
                    bindings.insert(action, code);
                }
                Some(code) => {
                    log::warn!(
                        "Key {} bound twice, resetting {} to default",
                        code.as_str(),
                        action.as_str()
                    );
                    unbound.push(action);
                }
                None => unbound.push(action),
            }
        }

        for &action in &unbound {
            let taken = |key: &KeyCode| bindings.values().any(|k| k == key);
            let default = action.default_key();
            let code = if !taken(&default) {
                Some(default)
            } else {
                KeyCode::ALL.iter().copied().find(|k| !taken(k))
            };
            match code {
                Some(code) => {
                    if code != default {
                        log::warn!(
                            "Default key {} for {} is taken, using {}",
                            default.as_str(),
                            action.as_str(),
                            code.as_str()
                        );
                    }
                    bindings.insert(action, code);
                }
                None => log::warn!("No free key left for {}", action.as_str()),
            }
        }

        let loaded = Self { bindings };
        for action in unbound {
            if let Some(code) = loaded.bindings.get(&action) {
                store.save(&storage_key(action), code.as_str());
            }
        }
        loaded
    }

    pub fn save(&self, store: &mut dyn ConfigStore) {
        for (action, key) in &self.bindings {
            store.save(&storage_key(*action), key.as_str());
        }
        log::info!("Keybindings saved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_empty_store_gets_defaults_written() {
        let mut store = MemoryStore::new();
        let bindings = Keybindings::load(&mut store);
        assert_eq!(bindings, Keybindings::default());
        assert_eq!(store.read("key_Jump").as_deref(), Some("Space"));
        assert_eq!(store.len(), Action::ALL.len());
    }

    #[test]
    fn test_invalid_value_falls_back() {
        let mut store = MemoryStore::new();
        store.save("key_Jump", "Banana");
        store.save("key_Punch", "P");
        let bindings = Keybindings::load(&mut store);
        assert_eq!(bindings.key_for(Action::Jump), KeyCode::Space);
        assert_eq!(bindings.key_for(Action::Punch), KeyCode::P);
        assert_eq!(store.read("key_Jump").as_deref(), Some("Space"));
    }

    fn assert_unique(bindings: &Keybindings) {
        let keys: std::collections::BTreeSet<KeyCode> =
            Action::ALL.iter().map(|a| bindings.key_for(*a)).collect();
        assert_eq!(keys.len(), Action::ALL.len(), "two actions share one key");
    }

    #[test]
    fn test_duplicate_stored_binding_is_repaired() {
        let mut store = MemoryStore::new();
        store.save("key_MoveLeft", "Q");
        store.save("key_Jump", "Q");
        let bindings = Keybindings::load(&mut store);
        assert_eq!(bindings.key_for(Action::MoveLeft), KeyCode::Q);
        assert_eq!(bindings.key_for(Action::Jump), KeyCode::Space);
        assert_eq!(store.read("key_Jump").as_deref(), Some("Space"));
        assert_unique(&bindings);
    }

    #[test]
    fn test_stored_key_claiming_a_later_default() {
        let mut store = MemoryStore::new();
        // MoveLeft takes Jump's default before Jump is loaded
        store.save("key_MoveLeft", "Space");
        let bindings = Keybindings::load(&mut store);
        assert_eq!(bindings.key_for(Action::MoveLeft), KeyCode::Space);
        assert_ne!(bindings.key_for(Action::Jump), KeyCode::Space);
        assert_unique(&bindings);

        // The substitute was persisted, so a reload is stable
        let jump_key = bindings.key_for(Action::Jump);
        assert_eq!(store.read("key_Jump").as_deref(), Some(jump_key.as_str()));
        assert_eq!(Keybindings::load(&mut store), bindings);
    }

    #[test]
    fn test_rebind_swaps_conflicts() {
        let mut bindings = Keybindings::default();
        bindings.rebind(Action::Jump, KeyCode::J);
        assert_eq!(bindings.key_for(Action::Jump), KeyCode::J);
        assert_eq!(bindings.key_for(Action::Punch), KeyCode::Space);
        assert_eq!(bindings.action_for(KeyCode::J), Some(Action::Jump));
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut bindings = Keybindings::default();
        bindings.rebind(Action::Roll, KeyCode::R);
        bindings.save(&mut store);
        assert_eq!(Keybindings::load(&mut store), bindings);
    }
}
