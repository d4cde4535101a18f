//! Persistent configuration
//!
//! Everything durable is a flat string key-value entry:
//! - `store`: the [`ConfigStore`] seam plus in-memory and JSON file backends
//! - `keybindings`: action to key mapping (`key_<Action>`)
//! - `layout`: touch control placement (`controlLayout`)

pub mod keybindings;
pub mod layout;
pub mod store;

pub use keybindings::Keybindings;
pub use layout::{ControlLayout, WidgetLayout};
pub use store::{ConfigStore, JsonFileStore, MemoryStore, PersistenceError};
