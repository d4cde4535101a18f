//! On-screen touch control layout
//!
//! Persisted as a JSON list of widget records under a single config key.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::store::ConfigStore;

/// Config key holding the layout list
pub const LAYOUT_KEY: &str = "controlLayout";

/// Placement of one touch widget (normalized screen units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetLayout {
    pub name: String,
    pub position: Vec2,
    pub size: Vec2,
}

impl WidgetLayout {
    fn new(name: &str, position: Vec2, size: Vec2) -> Self {
        Self {
            name: name.to_string(),
            position,
            size,
        }
    }
}

/// Complete touch control layout
#[derive(Debug, Clone, PartialEq)]
pub struct ControlLayout {
    pub widgets: Vec<WidgetLayout>,
}

impl Default for ControlLayout {
    fn default() -> Self {
        let pad = Vec2::splat(0.12);
        Self {
            widgets: vec![
                WidgetLayout::new("left", Vec2::new(0.08, 0.12), pad),
                WidgetLayout::new("right", Vec2::new(0.22, 0.12), pad),
                WidgetLayout::new("crouch", Vec2::new(0.15, 0.28), pad),
                WidgetLayout::new("jump", Vec2::new(0.90, 0.14), Vec2::splat(0.15)),
                WidgetLayout::new("attack", Vec2::new(0.76, 0.14), pad),
                WidgetLayout::new("roll", Vec2::new(0.83, 0.32), pad),
                WidgetLayout::new("pause", Vec2::new(0.95, 0.92), Vec2::splat(0.06)),
            ],
        }
    }
}

impl ControlLayout {
    pub fn widget(&self, name: &str) -> Option<&WidgetLayout> {
        self.widgets.iter().find(|w| w.name == name)
    }

    /// Move/resize a known widget. Returns false for unknown names.
    pub fn set_widget(&mut self, name: &str, position: Vec2, size: Vec2) -> bool {
        match self.widgets.iter_mut().find(|w| w.name == name) {
            Some(widget) => {
                widget.position = position;
                widget.size = size;
                true
            }
            None => false,
        }
    }

    /// Load the stored layout merged over the defaults.
    ///
    /// Stored entries override defaults by name, unknown names are dropped,
    /// and any repair is written back immediately.
    pub fn load(store: &mut dyn ConfigStore) -> Self {
        let mut layout = Self::default();
        let stored: Vec<WidgetLayout> = match store.read(LAYOUT_KEY) {
            Some(json) => match serde_json::from_str(&json) {
                Ok(list) => list,
                Err(e) => {
                    log::warn!("Control layout is corrupt ({}), using defaults", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let mut applied = 0;
        for entry in &stored {
            if layout.set_widget(&entry.name, entry.position, entry.size) {
                applied += 1;
            } else {
                log::warn!("Dropping unknown control widget '{}'", entry.name);
            }
        }

        if applied != layout.widgets.len() || stored.len() != applied {
            log::info!(
                "Control layout repaired ({} of {} widgets stored)",
                applied,
                layout.widgets.len()
            );
            layout.save(store);
        }
        layout
    }

    pub fn save(&self, store: &mut dyn ConfigStore) {
        match serde_json::to_string(&self.widgets) {
            Ok(json) => store.save(LAYOUT_KEY, &json),
            Err(e) => log::warn!("Failed to serialize control layout: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_absent_layout_writes_defaults() {
        let mut store = MemoryStore::new();
        let layout = ControlLayout::load(&mut store);
        assert_eq!(layout, ControlLayout::default());
        let saved: Vec<WidgetLayout> =
            serde_json::from_str(&store.read(LAYOUT_KEY).unwrap()).unwrap();
        assert_eq!(saved.len(), layout.widgets.len());
    }

    #[test]
    fn test_partial_layout_is_merged() {
        let mut store = MemoryStore::new();
        store.save(
            LAYOUT_KEY,
            r#"[{"name":"jump","position":[0.5,0.5],"size":[0.2,0.2]},
                {"name":"laser","position":[0.1,0.1],"size":[0.1,0.1]}]"#,
        );
        let layout = ControlLayout::load(&mut store);
        assert_eq!(layout.widget("jump").unwrap().position, Vec2::new(0.5, 0.5));
        assert!(layout.widget("laser").is_none());
        assert!(layout.widget("left").is_some());

        // Repaired list was written back
        let saved: Vec<WidgetLayout> =
            serde_json::from_str(&store.read(LAYOUT_KEY).unwrap()).unwrap();
        assert_eq!(saved.len(), ControlLayout::default().widgets.len());
        assert!(saved.iter().all(|w| w.name != "laser"));
    }

    #[test]
    fn test_corrupt_layout_falls_back() {
        let mut store = MemoryStore::new();
        store.save(LAYOUT_KEY, "not json");
        let layout = ControlLayout::load(&mut store);
        assert_eq!(layout, ControlLayout::default());
        assert_ne!(store.read(LAYOUT_KEY).as_deref(), Some("not json"));
    }

    #[test]
    fn test_complete_layout_round_trips_untouched() {
        let mut store = MemoryStore::new();
        let mut layout = ControlLayout::default();
        assert!(layout.set_widget("pause", Vec2::new(0.5, 0.9), Vec2::splat(0.1)));
        layout.save(&mut store);
        let before = store.read(LAYOUT_KEY);
        assert_eq!(ControlLayout::load(&mut store), layout);
        assert_eq!(store.read(LAYOUT_KEY), before);
    }
}
